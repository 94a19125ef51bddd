use anyhow::Result;
use inquire::Confirm;
use tokio_util::sync::CancellationToken;

use super::display::print_contact;
use super::show::parse_id;
use crate::db::ContactRepository;
use crate::services::ContactService;

/// Execute the delete command
pub async fn run_delete<R: ContactRepository>(
    service: &ContactService<R>,
    identifier: &str,
    force: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let id = parse_id(identifier)?;

    let contact = match service.get_by_id(id, cancel).await? {
        Some(c) => c,
        None => {
            println!("No contact found with ID: {}", id);
            return Ok(());
        }
    };

    if !force {
        print_contact(&contact);
        println!();

        let confirmed = Confirm::new(&format!("Delete {}?", contact.name))
            .with_default(false)
            .prompt()
            .unwrap_or(false);

        if !confirmed {
            return Ok(());
        }
    }

    if service.delete(id, cancel).await? {
        println!("Deleted.");
    } else {
        eprintln!("Error: failed to delete {}", contact.name);
    }

    Ok(())
}
