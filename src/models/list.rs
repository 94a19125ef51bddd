use serde::{Deserialize, Serialize};

use super::ContactDto;

/// A paging/sort/search request as sent by a data-table client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListRequest {
    /// Opaque token echoed back unchanged.
    pub draw: i64,
    pub start: i64,
    pub length: i64,
    pub search_value: Option<String>,
    pub order: Vec<SortDirective>,
    pub columns: Vec<ColumnDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDirective {
    pub column: i64,
    #[serde(default = "default_dir")]
    pub dir: String,
}

fn default_dir() -> String {
    "asc".to_string()
}

impl SortDirective {
    pub fn new(column: i64, dir: &str) -> Self {
        Self {
            column,
            dir: dir.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub data: Option<String>,
    pub name: Option<String>,
}

impl ColumnDescriptor {
    pub fn data(data: &str) -> Self {
        Self {
            data: Some(data.to_string()),
            name: Some(data.to_string()),
        }
    }

    /// Logical field this column refers to: `data`, falling back to `name`.
    pub fn field(&self) -> Option<&str> {
        [self.data.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub draw: i64,
    pub records_total: u64,
    pub records_filtered: u64,
    pub data: Vec<ContactDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ListResponse {
    /// Zero-count response for a request that failed validation.
    pub fn rejected(draw: i64, error: &str) -> Self {
        Self {
            draw,
            records_total: 0,
            records_filtered: 0,
            data: Vec::new(),
            error: Some(error.to_string()),
        }
    }
}
