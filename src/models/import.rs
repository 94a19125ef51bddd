use serde::{Deserialize, Serialize};

use super::Contact;

/// Result of one CSV import call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub imported: u64,
    pub failed: u64,
    pub errors: Vec<String>,
}

impl ImportOutcome {
    /// Upload refused before any row was read.
    pub fn rejected(message: &str) -> Self {
        Self {
            imported: 0,
            failed: 0,
            errors: vec![message.to_string()],
        }
    }
}

/// In-memory output of the import engine: parsed contacts and row errors in file order.
#[derive(Debug, Default)]
pub struct ParsedImport {
    pub contacts: Vec<Contact>,
    pub errors: Vec<String>,
}

impl ParsedImport {
    pub fn outcome(&self) -> ImportOutcome {
        ImportOutcome {
            imported: self.contacts.len() as u64,
            failed: self.errors.len() as u64,
            errors: self.errors.clone(),
        }
    }
}
