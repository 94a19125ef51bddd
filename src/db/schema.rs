pub const SCHEMA_VERSION: i32 = 1;

pub const SCHEMA_V1: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY,
    version INTEGER NOT NULL
);

-- Contacts. Salary is stored in cents, timestamps as fixed-width RFC 3339 (UTC, microseconds)
-- so that text ordering matches chronological ordering.
CREATE TABLE IF NOT EXISTS contacts (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL CHECK (length(name) BETWEEN 1 AND 200),
    date_of_birth TEXT NOT NULL,
    married INTEGER NOT NULL,
    phone TEXT NOT NULL CHECK (length(phone) BETWEEN 1 AND 32),
    salary_cents INTEGER NOT NULL,
    search_name TEXT NOT NULL,
    search_phone TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_contacts_name ON contacts(name);
CREATE INDEX IF NOT EXISTS idx_contacts_phone ON contacts(phone);
CREATE INDEX IF NOT EXISTS idx_contacts_date_of_birth ON contacts(date_of_birth);
CREATE INDEX IF NOT EXISTS idx_contacts_salary ON contacts(salary_cents);
CREATE INDEX IF NOT EXISTS idx_contacts_created_at ON contacts(created_at);
"#;
