use anyhow::{anyhow, Context, Result};
use tokio_util::sync::CancellationToken;

use super::display::print_contact_table;
use super::ListArgs;
use crate::db::ContactRepository;
use crate::models::{ColumnDescriptor, ListRequest, SortDirective};
use crate::services::ContactService;

/// Columns offered to the list query, in table order
pub const LIST_COLUMNS: [&str; 5] = ["name", "dateOfBirth", "married", "phone", "salary"];

/// Build a list request the way a data-table client would send it
pub fn build_request(args: &ListArgs) -> Result<ListRequest> {
    if let Some(path) = &args.request {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return serde_json::from_str(&raw).context("Invalid list request JSON");
    }

    let order = match &args.sort {
        Some(sort) => {
            let index = LIST_COLUMNS
                .iter()
                .position(|c| c.eq_ignore_ascii_case(sort.trim()))
                .ok_or_else(|| {
                    anyhow!("Unknown sort column \"{}\". Use one of: {}", sort, LIST_COLUMNS.join(", "))
                })?;
            vec![SortDirective::new(index as i64, &args.order)]
        }
        None => Vec::new(),
    };

    Ok(ListRequest {
        draw: args.draw,
        start: args.start,
        length: args.length,
        search_value: args.search.clone(),
        order,
        columns: LIST_COLUMNS.into_iter().map(ColumnDescriptor::data).collect(),
    })
}

/// Execute the list command
pub async fn run_list<R: ContactRepository>(
    service: &ContactService<R>,
    args: &ListArgs,
    cancel: &CancellationToken,
) -> Result<()> {
    let request = build_request(args)?;
    let response = service.list(&request, cancel).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    if let Some(error) = &response.error {
        return Err(anyhow!("{}", error));
    }

    print_contact_table(&response, u64::try_from(request.start).unwrap_or(0));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ListArgs {
        ListArgs {
            start: 5,
            length: 20,
            search: Some("ann".to_string()),
            sort: None,
            order: "asc".to_string(),
            draw: 3,
            request: None,
            json: false,
        }
    }

    #[test]
    fn test_build_request_from_flags() {
        let mut a = args();
        a.sort = Some("Salary".to_string());
        a.order = "desc".to_string();

        let req = build_request(&a).unwrap();
        assert_eq!(req.draw, 3);
        assert_eq!(req.start, 5);
        assert_eq!(req.length, 20);
        assert_eq!(req.order, vec![SortDirective::new(4, "desc")]);
        assert_eq!(req.columns.len(), LIST_COLUMNS.len());
    }

    #[test]
    fn test_unknown_sort_column() {
        let mut a = args();
        a.sort = Some("createdAt".to_string());
        assert!(build_request(&a).is_err());
    }

    #[test]
    fn test_build_request_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("req.json");
        std::fs::write(&path, r#"{"draw": 9, "length": 3, "order": [{"column": 0, "dir": "asc"}], "columns": [{"data": "name"}]}"#).unwrap();

        let mut a = args();
        a.request = Some(path);
        let req = build_request(&a).unwrap();
        assert_eq!(req.draw, 9);
        assert_eq!(req.start, 0);
        assert_eq!(req.columns[0].field(), Some("name"));
    }
}
