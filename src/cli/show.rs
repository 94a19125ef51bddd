use anyhow::{anyhow, Result};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::display::print_contact;
use crate::db::ContactRepository;
use crate::services::ContactService;

/// Parse a contact identifier given on the command line
pub fn parse_id(identifier: &str) -> Result<Uuid> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(anyhow!("Identifier cannot be empty."));
    }
    Uuid::parse_str(identifier).map_err(|_| anyhow!("Not a contact ID: {}", identifier))
}

/// Execute the show command
pub async fn run_show<R: ContactRepository>(
    service: &ContactService<R>,
    identifier: &str,
    json: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let id = parse_id(identifier)?;

    match service.get_by_id(id, cancel).await? {
        Some(contact) if json => println!("{}", serde_json::to_string_pretty(&contact)?),
        Some(contact) => print_contact(&contact),
        None => println!("No contact found with ID: {}", id),
    }

    Ok(())
}
