use chrono::{DateTime, Duration, NaiveDate, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const NAME_MAX_LEN: usize = 200;
pub const PHONE_MAX_LEN: usize = 32;

/// Fractional digits kept for salaries.
pub const SALARY_SCALE: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub married: bool,
    pub phone: String,
    pub salary: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Contact {
    /// Build a fresh, never-modified contact. String fields are trimmed.
    pub fn new(
        name: &str,
        date_of_birth: NaiveDate,
        married: bool,
        phone: &str,
        salary: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            date_of_birth,
            married,
            phone: phone.trim().to_string(),
            salary: normalize_salary(salary),
            created_at: now_utc(),
            updated_at: None,
        }
    }

    /// Overwrite the mutable fields and stamp the update time.
    ///
    /// The stamp is kept strictly greater than both the creation time and the
    /// previous update, even when the clock has not advanced.
    pub fn apply_changes(&mut self, changes: &ContactChanges) {
        self.name = changes.name.trim().to_string();
        self.phone = changes.phone.trim().to_string();
        self.date_of_birth = changes.date_of_birth;
        self.married = changes.married;
        self.salary = normalize_salary(changes.salary);

        let floor = self.updated_at.unwrap_or(self.created_at) + Duration::microseconds(1);
        self.updated_at = Some(now_utc().max(floor));
    }

    /// Lowercased name used for case-insensitive search.
    pub fn search_name(&self) -> String {
        self.name.to_lowercase()
    }

    /// Lowercased phone used for case-insensitive search.
    pub fn search_phone(&self) -> String {
        self.phone.to_lowercase()
    }

    pub fn to_dto(&self) -> ContactDto {
        ContactDto {
            id: self.id,
            name: self.name.clone(),
            date_of_birth: self.date_of_birth,
            married: self.married,
            phone: self.phone.clone(),
            salary: self.salary,
        }
    }
}

/// External projection of a contact (no audit timestamps).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDto {
    pub id: Uuid,
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub married: bool,
    pub phone: String,
    pub salary: Decimal,
}

/// Replacement values for the mutable fields of a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactChanges {
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub married: bool,
    pub phone: String,
    pub salary: Decimal,
}

impl From<&ContactDto> for ContactChanges {
    fn from(dto: &ContactDto) -> Self {
        Self {
            name: dto.name.clone(),
            date_of_birth: dto.date_of_birth,
            married: dto.married,
            phone: dto.phone.clone(),
            salary: dto.salary,
        }
    }
}

/// Current time truncated to the precision the store keeps (microseconds).
pub fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Round a salary to exactly two decimals, half away from zero.
pub fn normalize_salary(salary: Decimal) -> Decimal {
    let mut rounded = salary
        .round_dp_with_strategy(SALARY_SCALE, rust_decimal::RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(SALARY_SCALE);
    rounded
}

/// Salary as whole cents, or `None` if it does not fit the stored column.
pub fn salary_to_cents(salary: Decimal) -> Option<i64> {
    i64::try_from(normalize_salary(salary).mantissa()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sample() -> Contact {
        Contact::new(
            "  Ada Lovelace ",
            NaiveDate::from_ymd_opt(1815, 12, 10).unwrap(),
            true,
            " +44 20 7946 0000 ",
            Decimal::from_str("1234.567").unwrap(),
        )
    }

    #[test]
    fn test_new_contact_is_unmodified() {
        let contact = sample();
        assert_eq!(contact.name, "Ada Lovelace");
        assert_eq!(contact.phone, "+44 20 7946 0000");
        assert_eq!(contact.salary, Decimal::from_str("1234.57").unwrap());
        assert!(contact.updated_at.is_none());
    }

    #[test]
    fn test_salary_keeps_two_decimals() {
        assert_eq!(normalize_salary(Decimal::new(10, 0)).to_string(), "10.00");
        assert_eq!(normalize_salary(Decimal::from_str("0.125").unwrap()).to_string(), "0.13");
        assert_eq!(normalize_salary(Decimal::from_str("-2.345").unwrap()).to_string(), "-2.35");
    }

    #[test]
    fn test_salary_to_cents() {
        assert_eq!(salary_to_cents(Decimal::from_str("12.5").unwrap()), Some(1250));
        assert_eq!(salary_to_cents(Decimal::from_str("-0.005").unwrap()), Some(-1));
        assert_eq!(salary_to_cents(Decimal::from(i64::MAX)), None);
    }

    #[test]
    fn test_apply_changes_stamps_strictly_increasing() {
        let mut contact = sample();
        let changes = ContactChanges {
            name: " Ada King ".to_string(),
            date_of_birth: contact.date_of_birth,
            married: false,
            phone: "555-0100".to_string(),
            salary: Decimal::from_str("10").unwrap(),
        };

        contact.apply_changes(&changes);
        let first = contact.updated_at.unwrap();
        assert!(first > contact.created_at);
        assert_eq!(contact.name, "Ada King");
        assert!(!contact.married);

        contact.apply_changes(&changes);
        let second = contact.updated_at.unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_dto_drops_timestamps() {
        let contact = sample();
        let json = serde_json::to_value(contact.to_dto()).unwrap();
        assert!(json.get("createdAt").is_none());
        assert_eq!(json["dateOfBirth"], "1815-12-10");
        assert_eq!(json["salary"], "1234.57");
    }
}
