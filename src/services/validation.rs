//! Structural checks for list requests and for interactive contact edits.

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use std::sync::OnceLock;

use super::query::{SortOrder, MAX_PAGE_SIZE};
use crate::models::{ContactChanges, ListRequest, NAME_MAX_LEN};

/// Longest accepted column `data`/`name` value.
const COLUMN_NAME_MAX_LEN: usize = 64;

const EDIT_NAME_MIN_LEN: usize = 2;
const EDIT_SALARY_MAX: i64 = 1_000_000_000;

static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();

/// Phone pattern enforced by the edit form (imports only check length).
fn phone_regex() -> &'static Regex {
    PHONE_REGEX.get_or_init(|| {
        Regex::new(r"^\+?[0-9\s\-\(\)]{7,50}$").expect("Invalid phone regex")
    })
}

/// Check a list request before it reaches storage.
///
/// A non-positive `length` is not an error; the planner falls back to the
/// default page size.
pub fn validate_list_request(request: &ListRequest) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if request.start < 0 {
        errors.push("Start must be zero or greater.".to_string());
    }
    if request.length > MAX_PAGE_SIZE {
        errors.push(format!("Length must not exceed {}.", MAX_PAGE_SIZE));
    }

    for (i, directive) in request.order.iter().enumerate() {
        let in_range = usize::try_from(directive.column)
            .map(|c| c < request.columns.len())
            .unwrap_or(false);
        if !in_range {
            errors.push("Order column index is out of range.".to_string());
        }
        if SortOrder::parse(&directive.dir).is_none() {
            errors.push(format!("Order {}: sort direction must be 'asc' or 'desc'.", i));
        }
    }

    for (i, column) in request.columns.iter().enumerate() {
        let too_long = [&column.data, &column.name]
            .into_iter()
            .flatten()
            .any(|v| v.chars().count() > COLUMN_NAME_MAX_LEN);
        if too_long {
            errors.push(format!(
                "Column {}: data and name must be at most {} characters.",
                i, COLUMN_NAME_MAX_LEN
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Rules of the interactive edit form. `today` bounds the date of birth.
pub fn validate_changes(changes: &ContactChanges, today: NaiveDate) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    let name_len = changes.name.trim().chars().count();
    if !(EDIT_NAME_MIN_LEN..=NAME_MAX_LEN).contains(&name_len) {
        errors.push(format!(
            "Name must be between {} and {} characters.",
            EDIT_NAME_MIN_LEN, NAME_MAX_LEN
        ));
    }

    if changes.date_of_birth > today {
        errors.push("Date of birth cannot be in the future.".to_string());
    }
    if NaiveDate::from_ymd_opt(1900, 1, 1).map_or(false, |min| changes.date_of_birth < min) {
        errors.push("Date of birth is too old.".to_string());
    }

    if !phone_regex().is_match(changes.phone.trim()) {
        errors.push("Phone number format is invalid.".to_string());
    }

    if changes.salary < Decimal::ZERO || changes.salary > Decimal::from(EDIT_SALARY_MAX) {
        errors.push(format!("Salary must be between 0 and {}.", EDIT_SALARY_MAX));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnDescriptor, SortDirective};
    use std::str::FromStr;

    fn request() -> ListRequest {
        ListRequest {
            draw: 1,
            start: 0,
            length: 10,
            columns: vec![ColumnDescriptor::data("name"), ColumnDescriptor::data("phone")],
            ..Default::default()
        }
    }

    fn changes() -> ContactChanges {
        ContactChanges {
            name: "Ann Lee".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1980, 5, 5).unwrap(),
            married: false,
            phone: "+1 (555) 010-0000".to_string(),
            salary: Decimal::from_str("50000.00").unwrap(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_valid_request() {
        let mut req = request();
        req.order = vec![SortDirective::new(1, "DESC")];
        assert!(validate_list_request(&req).is_ok());
    }

    #[test]
    fn test_non_positive_length_is_allowed() {
        let mut req = request();
        req.length = 0;
        assert!(validate_list_request(&req).is_ok());
        req.length = -1;
        assert!(validate_list_request(&req).is_ok());
    }

    #[test]
    fn test_out_of_range_order_column() {
        for column in [2, -1, 99] {
            let mut req = request();
            req.order = vec![SortDirective::new(column, "asc")];
            let errors = validate_list_request(&req).unwrap_err();
            assert_eq!(errors, vec!["Order column index is out of range.".to_string()]);
        }
    }

    #[test]
    fn test_out_of_range_in_later_directive_still_rejected() {
        let mut req = request();
        req.order = vec![SortDirective::new(0, "asc"), SortDirective::new(5, "asc")];
        assert!(validate_list_request(&req).is_err());
    }

    #[test]
    fn test_other_structural_errors() {
        let mut req = request();
        req.start = -1;
        req.length = MAX_PAGE_SIZE + 1;
        req.order = vec![SortDirective::new(0, "sideways")];
        req.columns[0].data = Some("x".repeat(65));
        assert_eq!(validate_list_request(&req).unwrap_err().len(), 4);
    }

    #[test]
    fn test_valid_changes() {
        assert!(validate_changes(&changes(), today()).is_ok());
    }

    #[test]
    fn test_edit_form_phone_is_strict() {
        let mut c = changes();
        c.phone = "call me".to_string();
        assert_eq!(
            validate_changes(&c, today()).unwrap_err(),
            vec!["Phone number format is invalid.".to_string()]
        );

        c.phone = "12345".to_string();
        assert!(validate_changes(&c, today()).is_err());
    }

    #[test]
    fn test_edit_form_ranges() {
        let mut c = changes();
        c.name = " A ".to_string();
        c.date_of_birth = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        c.salary = Decimal::from(-1);
        assert_eq!(validate_changes(&c, today()).unwrap_err().len(), 3);

        let mut c = changes();
        c.date_of_birth = NaiveDate::from_ymd_opt(1899, 12, 31).unwrap();
        c.salary = Decimal::from(EDIT_SALARY_MAX + 1);
        assert_eq!(validate_changes(&c, today()).unwrap_err().len(), 2);
    }
}
