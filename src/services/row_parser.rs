//! Conversion of one CSV record into a [`Contact`].
//!
//! Rules run in a fixed order (name, phone, date of birth, married, salary)
//! and the first failure is the reported reason. Malformed input is an
//! expected outcome, so everything here returns `Result` and never panics.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

use crate::models::{salary_to_cents, Contact, NAME_MAX_LEN, PHONE_MAX_LEN};

/// Explicit date layouts tried after ISO, in order.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d.%m.%Y", "%m/%d/%Y", "%d/%m/%Y"];

const MONTH_PREFIXES: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Raw, untrimmed column values of one CSV record. Missing columns are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub name: String,
    pub date_of_birth: String,
    pub married: String,
    pub phone: String,
    pub salary: String,
}

/// Why a row was rejected. The display text is what ends up in the report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("Invalid Name (required, max 200).")]
    Name,
    #[error("Invalid Phone (required, max 32).")]
    Phone,
    #[error("Invalid Date of birth (expected date).")]
    DateOfBirth,
    #[error("Invalid Married (expected true/false or 1/0 or yes/no).")]
    Married,
    #[error("Invalid Salary (expected decimal).")]
    Salary,
    #[error("Malformed row ({0}).")]
    Malformed(String),
}

/// Validate a row and build a new, never-updated contact from it.
pub fn parse_row(row: &RawRow) -> Result<Contact, RowError> {
    let name = row.name.trim();
    if name.is_empty() || name.chars().count() > NAME_MAX_LEN {
        return Err(RowError::Name);
    }

    // Length only; the stricter phone pattern belongs to the edit form.
    let phone = row.phone.trim();
    if phone.is_empty() || phone.chars().count() > PHONE_MAX_LEN {
        return Err(RowError::Phone);
    }

    let date_of_birth = parse_date(&row.date_of_birth).ok_or(RowError::DateOfBirth)?;
    let married = parse_bool(&row.married).ok_or(RowError::Married)?;
    let salary = parse_decimal(&row.salary)
        .filter(|salary| salary_to_cents(*salary).is_some())
        .ok_or(RowError::Salary)?;

    Ok(Contact::new(name, date_of_birth, married, phone, salary))
}

/// Parse a calendar date.
///
/// Tries ISO and the explicit layouts first (month-first before day-first for
/// slashed dates), then a free-form parse. Input without a date part never
/// reaches the free-form parser: bare digits would be read as epoch timestamps
/// and a lone time of day as today.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
    {
        return Some(date);
    }

    if !has_date_part(value) {
        return None;
    }

    dateparser::parse_with_timezone(value, &Utc)
        .ok()
        .map(|dt| dt.date_naive())
}

/// A digit-separator-digit run (`-`, `/`, `.`) or a month name.
fn has_date_part(value: &str) -> bool {
    let chars: Vec<char> = value.chars().collect();
    let separated = chars.windows(3).any(|w| {
        w[0].is_ascii_digit() && matches!(w[1], '-' | '/' | '.') && w[2].is_ascii_digit()
    });

    separated
        || value
            .split(|c: char| !c.is_alphabetic())
            .filter(|word| word.len() >= 3)
            .any(|word| {
                let word = word.to_lowercase();
                MONTH_PREFIXES.iter().any(|month| word.starts_with(month))
            })
}

/// Parse a boolean flag, case-insensitively.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "t" => Some(true),
        "false" | "0" | "no" | "n" | "f" => Some(false),
        _ => None,
    }
}

/// Parse a decimal number.
///
/// The invariant form (`1,234.56`) is tried first, then the comma-decimal form
/// (`1.234,56`, `1 234,56`).
pub fn parse_decimal(value: &str) -> Option<Decimal> {
    let value = value.trim();
    parse_number(value, &[','], '.').or_else(|| parse_number(value, &['.', ' ', '\u{a0}'], ','))
}

/// Parse digits with optional sign, thousands groups and a fractional part.
///
/// Group separators are only accepted between well-formed groups of three.
fn parse_number(value: &str, group_separators: &[char], decimal_separator: char) -> Option<Decimal> {
    let (negative, body) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };

    let (integer, fraction) = match body.split_once(decimal_separator) {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (body, None),
    };

    if let Some(fraction) = fraction {
        if !fraction.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
    }

    let groups: Vec<&str> = integer.split(|c| group_separators.contains(&c)).collect();
    let digits = match groups.as_slice() {
        [single] => {
            if !single.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            single.to_string()
        }
        [first, rest @ ..] => {
            let first_ok = (1..=3).contains(&first.len()) && first.chars().all(|c| c.is_ascii_digit());
            let rest_ok = rest
                .iter()
                .all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()));
            if !first_ok || !rest_ok {
                return None;
            }
            groups.concat()
        }
        [] => return None,
    };

    let fraction = fraction.unwrap_or("");
    if digits.is_empty() && fraction.is_empty() {
        return None;
    }

    let mut normalized = String::with_capacity(digits.len() + fraction.len() + 3);
    if negative {
        normalized.push('-');
    }
    normalized.push_str(if digits.is_empty() { "0" } else { &digits });
    if !fraction.is_empty() {
        normalized.push('.');
        normalized.push_str(fraction);
    }

    Decimal::from_str(&normalized).ok()
}
