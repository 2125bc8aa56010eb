//! SQLite schema definition.

/// Complete database schema for rema.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Health Plans (read-only reference table)
-- ============================================================================

CREATE TABLE IF NOT EXISTS health_plans (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

INSERT OR IGNORE INTO health_plans (id, name) VALUES
    (1, 'Fonasa A'),
    (2, 'Fonasa B'),
    (3, 'Fonasa C'),
    (4, 'Fonasa D'),
    (5, 'Isapre'),
    (6, 'Particular');

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    national_id TEXT NOT NULL,
    check_digit TEXT NOT NULL,
    birth_date TEXT,
    paternal_surname TEXT,
    maternal_surname TEXT,
    first_name TEXT,
    middle_name TEXT,
    sex TEXT NOT NULL DEFAULT 'F' CHECK (sex IN ('M', 'F')),
    address TEXT,
    next_of_kin TEXT,
    phone TEXT,
    phone_alt TEXT,
    health_plan_id INTEGER REFERENCES health_plans(id),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (national_id, check_digit)
);

CREATE INDEX IF NOT EXISTS idx_patients_national_id ON patients(national_id);

-- ============================================================================
-- Transport Records
-- ============================================================================

CREATE TABLE IF NOT EXISTS transport_records (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    patient_id TEXT REFERENCES patients(id),
    status TEXT NOT NULL DEFAULT 'draft' CHECK (status IN ('draft', 'created')),
    call_time TEXT,
    departure_time TEXT,
    arrival_time TEXT,
    dispatch_code TEXT,
    origin TEXT,
    destination TEXT,
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_records_user ON transport_records(user_id);
CREATE INDEX IF NOT EXISTS idx_records_status ON transport_records(status);
CREATE INDEX IF NOT EXISTS idx_records_call_time ON transport_records(call_time);

-- At most one draft per user. Store/update never write the draft status,
-- so this only gates the find-or-create path.
CREATE UNIQUE INDEX IF NOT EXISTS idx_records_user_draft
    ON transport_records(user_id) WHERE status = 'draft';
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM health_plans", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 6);
    }

    #[test]
    fn test_identity_key_unique() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute(
            "INSERT INTO patients (id, national_id, check_digit) VALUES ('p1', '12345678', '5')",
            [],
        )
        .unwrap();

        // Same identity key must be rejected
        let result = conn.execute(
            "INSERT INTO patients (id, national_id, check_digit) VALUES ('p2', '12345678', '5')",
            [],
        );
        assert!(result.is_err());

        // Same number with a different check digit is a different identity
        let result = conn.execute(
            "INSERT INTO patients (id, national_id, check_digit) VALUES ('p3', '12345678', 'K')",
            [],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_one_draft_per_user() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute(
            "INSERT INTO transport_records (id, user_id, status) VALUES ('r1', 'u1', 'draft')",
            [],
        )
        .unwrap();

        // Second draft for the same user must be rejected
        let result = conn.execute(
            "INSERT INTO transport_records (id, user_id, status) VALUES ('r2', 'u1', 'draft')",
            [],
        );
        assert!(result.is_err());

        // A created record for the same user is fine
        conn.execute(
            "INSERT INTO transport_records (id, user_id, status) VALUES ('r3', 'u1', 'created')",
            [],
        )
        .unwrap();

        // Another user's draft is fine
        conn.execute(
            "INSERT INTO transport_records (id, user_id, status) VALUES ('r4', 'u2', 'draft')",
            [],
        )
        .unwrap();
    }

    #[test]
    fn test_health_plan_foreign_key() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO patients (id, national_id, check_digit, health_plan_id)
             VALUES ('p1', '12345678', '5', 999)",
            [],
        );
        assert!(result.is_err());
    }
}
