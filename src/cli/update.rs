use anyhow::{anyhow, Result};
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use super::show::parse_id;
use super::UpdateArgs;
use crate::db::ContactRepository;
use crate::models::{ContactChanges, ContactDto};
use crate::services::row_parser::{parse_bool, parse_date, parse_decimal};
use crate::services::validation::validate_changes;
use crate::services::ContactService;

/// Merge the provided flags over the current values; returns the change list for display
pub fn merge_changes(current: &ContactDto, args: &UpdateArgs) -> Result<(ContactChanges, Vec<String>)> {
    let mut updated = ContactChanges::from(current);
    let mut changes = Vec::new();

    if let Some(ref name) = args.name {
        updated.name = name.clone();
        changes.push(format!("name -> {}", name.trim()));
    }
    if let Some(ref dob) = args.dob {
        updated.date_of_birth =
            parse_date(dob).ok_or_else(|| anyhow!("Invalid date of birth: {}", dob))?;
        changes.push(format!("date of birth -> {}", updated.date_of_birth));
    }
    if let Some(ref married) = args.married {
        updated.married =
            parse_bool(married).ok_or_else(|| anyhow!("Invalid married value: {}", married))?;
        changes.push(format!("married -> {}", updated.married));
    }
    if let Some(ref phone) = args.phone {
        updated.phone = phone.clone();
        changes.push(format!("phone -> {}", phone.trim()));
    }
    if let Some(ref salary) = args.salary {
        updated.salary =
            parse_decimal(salary).ok_or_else(|| anyhow!("Invalid salary: {}", salary))?;
        changes.push(format!("salary -> {}", updated.salary));
    }

    Ok((updated, changes))
}

/// Execute the update command
pub async fn run_update<R: ContactRepository>(
    service: &ContactService<R>,
    args: &UpdateArgs,
    cancel: &CancellationToken,
) -> Result<()> {
    let id = parse_id(&args.id)?;

    // Check if any updates provided
    if args.name.is_none()
        && args.dob.is_none()
        && args.married.is_none()
        && args.phone.is_none()
        && args.salary.is_none()
    {
        return Err(anyhow!("No updates provided. Use -n, -d, -m, -p, or -s to specify changes."));
    }

    let current = match service.get_by_id(id, cancel).await? {
        Some(c) => c,
        None => {
            println!("No contact found with ID: {}", id);
            return Ok(());
        }
    };

    let (updated, changes) = merge_changes(&current, args)?;
    if let Err(errors) = validate_changes(&updated, Utc::now().date_naive()) {
        return Err(anyhow!(errors.join("\n")));
    }

    if !service.update(id, &updated, cancel).await? {
        // Deleted between the read and the write
        println!("No contact found with ID: {}", id);
        return Ok(());
    }

    println!("Updated: {}", updated.name.trim());
    for change in changes {
        println!("  - {}", change);
    }

    Ok(())
}
