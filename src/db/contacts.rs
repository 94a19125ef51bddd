use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Row, ToSql};
use rust_decimal::Decimal;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::repository::{ensure_active, ChangeSet, ContactRepository, PendingChange};
use super::Database;
use crate::models::{salary_to_cents, Contact, SALARY_SCALE};
use crate::services::query::{QueryPage, QueryPlan};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Helper to convert UUID parse errors to rusqlite errors
fn parse_uuid(s: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_timestamp(s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn parse_date(s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Fixed-width so that text order is chronological.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn salary_cents(salary: Decimal) -> Result<i64> {
    salary_to_cents(salary).ok_or_else(|| anyhow!("salary {} out of storable range", salary))
}

impl Database {
    // ==================== CONTACT WRITE ====================

    pub fn insert_contact(&self, contact: &Contact) -> Result<()> {
        self.conn.execute(
            r#"INSERT INTO contacts (
                id, name, date_of_birth, married, phone, salary_cents,
                search_name, search_phone, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                contact.id.to_string(),
                contact.name,
                contact.date_of_birth.format(DATE_FORMAT).to_string(),
                contact.married as i32,
                contact.phone,
                salary_cents(contact.salary)?,
                contact.search_name(),
                contact.search_phone(),
                format_timestamp(&contact.created_at),
                contact.updated_at.as_ref().map(format_timestamp),
            ],
        )?;
        Ok(())
    }

    /// Overwrite the mutable columns. Returns false if the row is gone.
    pub fn update_contact(&self, contact: &Contact) -> Result<bool> {
        let rows = self.conn.execute(
            r#"UPDATE contacts SET
                name = ?, date_of_birth = ?, married = ?, phone = ?, salary_cents = ?,
                search_name = ?, search_phone = ?, updated_at = ?
               WHERE id = ?"#,
            params![
                contact.name,
                contact.date_of_birth.format(DATE_FORMAT).to_string(),
                contact.married as i32,
                contact.phone,
                salary_cents(contact.salary)?,
                contact.search_name(),
                contact.search_phone(),
                contact.updated_at.as_ref().map(format_timestamp),
                contact.id.to_string(),
            ],
        )?;
        Ok(rows > 0)
    }

    pub fn delete_contact(&self, id: Uuid) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM contacts WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    /// Apply staged changes in one transaction. Any failure rolls back all of them.
    pub fn apply_changes(&self, changes: &[PendingChange]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for change in changes {
            match change {
                PendingChange::Insert(contact) => self.insert_contact(contact)?,
                PendingChange::Update(contact) => {
                    if !self.update_contact(contact)? {
                        bail!("contact {} no longer exists", contact.id);
                    }
                }
                PendingChange::Delete(id) => {
                    if !self.delete_contact(*id)? {
                        bail!("contact {} no longer exists", id);
                    }
                }
            }
        }
        tx.commit()?;
        Ok(changes.len())
    }

    // ==================== CONTACT READ ====================

    pub fn get_contact_by_id(&self, id: Uuid) -> Result<Option<Contact>> {
        let mut stmt = self.conn.prepare("SELECT * FROM contacts WHERE id = ?")?;

        let result = stmt.query_row([id.to_string()], Self::row_to_contact);

        match result {
            Ok(contact) => Ok(Some(contact)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_contacts(&self) -> Result<Vec<Contact>> {
        let mut stmt = self.conn.prepare("SELECT * FROM contacts")?;

        let contacts = stmt
            .query_map([], Self::row_to_contact)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(contacts)
    }

    pub fn count_contacts(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Run a list plan inside SQLite.
    ///
    /// The search compares against the stored lowercase keys, which keeps it
    /// identical to [`QueryPlan::matches`].
    pub fn query_contacts(&self, plan: &QueryPlan) -> Result<QueryPage> {
        let records_total = self.count_contacts()?;

        let filter = "WHERE instr(search_name, ?1) > 0 OR instr(search_phone, ?1) > 0";
        let needle = plan.search.as_deref();

        let records_filtered = match needle {
            Some(needle) => {
                let count: i64 = self.conn.query_row(
                    &format!("SELECT COUNT(*) FROM contacts {}", filter),
                    [needle],
                    |row| row.get(0),
                )?;
                count as u64
            }
            None => records_total,
        };

        let limit = i64::try_from(plan.limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(plan.offset).unwrap_or(i64::MAX);

        let (sql, args): (String, Vec<&dyn ToSql>) = match &needle {
            Some(needle) => (
                format!(
                    "SELECT * FROM contacts {} ORDER BY {} LIMIT ?2 OFFSET ?3",
                    filter,
                    plan.order.to_sql()
                ),
                vec![needle as &dyn ToSql, &limit, &offset],
            ),
            None => (
                format!(
                    "SELECT * FROM contacts ORDER BY {} LIMIT ?1 OFFSET ?2",
                    plan.order.to_sql()
                ),
                vec![&limit as &dyn ToSql, &offset],
            ),
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(args.as_slice(), Self::row_to_contact)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(QueryPage {
            records_total,
            records_filtered,
            rows,
        })
    }

    fn row_to_contact(row: &Row) -> rusqlite::Result<Contact> {
        let id: String = row.get("id")?;
        let date_of_birth: String = row.get("date_of_birth")?;
        let created_at: String = row.get("created_at")?;
        let updated_at: Option<String> = row.get("updated_at")?;

        Ok(Contact {
            id: parse_uuid(&id)?,
            name: row.get("name")?,
            date_of_birth: parse_date(&date_of_birth)?,
            married: row.get::<_, i32>("married")? == 1,
            phone: row.get("phone")?,
            salary: Decimal::new(row.get("salary_cents")?, SALARY_SCALE),
            created_at: parse_timestamp(&created_at)?,
            updated_at: updated_at.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

/// SQLite-backed [`ContactRepository`].
pub struct SqliteContactRepository {
    db: Mutex<Database>,
    changes: ChangeSet,
}

impl SqliteContactRepository {
    pub fn new(db: Database) -> Self {
        Self {
            db: Mutex::new(db),
            changes: ChangeSet::default(),
        }
    }

    fn db(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ContactRepository for SqliteContactRepository {
    async fn get_by_id(&self, id: Uuid, cancel: &CancellationToken) -> Result<Option<Contact>> {
        ensure_active(cancel)?;
        self.db().get_contact_by_id(id)
    }

    async fn query_all(&self, cancel: &CancellationToken) -> Result<Vec<Contact>> {
        ensure_active(cancel)?;
        self.db().list_contacts()
    }

    async fn add_range(&self, contacts: Vec<Contact>, cancel: &CancellationToken) -> Result<()> {
        ensure_active(cancel)?;
        self.changes
            .extend(contacts.into_iter().map(PendingChange::Insert));
        Ok(())
    }

    fn update(&self, contact: Contact) {
        self.changes.push(PendingChange::Update(contact));
    }

    fn remove(&self, contact: Contact) {
        self.changes.push(PendingChange::Delete(contact.id));
    }

    fn discard_changes(&self) {
        self.changes.clear();
    }

    async fn save_changes(&self, cancel: &CancellationToken) -> Result<usize> {
        ensure_active(cancel)?;
        let changes = self.changes.take();
        if changes.is_empty() {
            return Ok(0);
        }
        self.db().apply_changes(&changes)
    }

    async fn query(&self, plan: &QueryPlan, cancel: &CancellationToken) -> Result<QueryPage> {
        ensure_active(cancel)?;
        self.db().query_contacts(plan)
    }
}
