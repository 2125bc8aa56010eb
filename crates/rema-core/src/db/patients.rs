//! Patient database operations.
//!
//! Functions take a plain [`rusqlite::Connection`] so the same operations
//! serve both direct reads and the transactional store/update flows (a
//! `Transaction` derefs to `Connection`).

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use super::{DbError, DbResult};
use crate::models::{Patient, PatientIdentity, Sex};

/// Insert a new patient.
pub fn insert(conn: &Connection, patient: &Patient) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO patients (
            id, national_id, check_digit, birth_date, paternal_surname,
            maternal_surname, first_name, middle_name, sex, address,
            next_of_kin, phone, phone_alt, health_plan_id, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
        "#,
        params![
            patient.id,
            patient.national_id,
            patient.check_digit,
            patient.birth_date.map(|d| d.to_string()),
            patient.paternal_surname,
            patient.maternal_surname,
            patient.first_name,
            patient.middle_name,
            patient.sex.as_str(),
            patient.address,
            patient.next_of_kin,
            patient.phone,
            patient.phone_alt,
            patient.health_plan_id,
            patient.created_at,
            patient.updated_at,
        ],
    )?;
    Ok(())
}

/// Overwrite an existing patient's fields.
pub fn update(conn: &Connection, patient: &Patient) -> DbResult<bool> {
    let rows_affected = conn.execute(
        r#"
        UPDATE patients SET
            national_id = ?2,
            check_digit = ?3,
            birth_date = ?4,
            paternal_surname = ?5,
            maternal_surname = ?6,
            first_name = ?7,
            middle_name = ?8,
            sex = ?9,
            address = ?10,
            next_of_kin = ?11,
            phone = ?12,
            phone_alt = ?13,
            health_plan_id = ?14,
            updated_at = datetime('now')
        WHERE id = ?1
        "#,
        params![
            patient.id,
            patient.national_id,
            patient.check_digit,
            patient.birth_date.map(|d| d.to_string()),
            patient.paternal_surname,
            patient.maternal_surname,
            patient.first_name,
            patient.middle_name,
            patient.sex.as_str(),
            patient.address,
            patient.next_of_kin,
            patient.phone,
            patient.phone_alt,
            patient.health_plan_id,
        ],
    )?;
    Ok(rows_affected > 0)
}

/// Get a patient by id.
pub fn get(conn: &Connection, id: &str) -> DbResult<Option<Patient>> {
    conn.query_row(
        r#"
        SELECT id, national_id, check_digit, birth_date, paternal_surname,
               maternal_surname, first_name, middle_name, sex, address,
               next_of_kin, phone, phone_alt, health_plan_id, created_at, updated_at
        FROM patients
        WHERE id = ?
        "#,
        [id],
        read_row,
    )
    .optional()?
    .map(|row| row.try_into())
    .transpose()
}

/// Find a patient by identity key.
pub fn find_by_identity(
    conn: &Connection,
    identity: &PatientIdentity,
) -> DbResult<Option<Patient>> {
    conn.query_row(
        r#"
        SELECT id, national_id, check_digit, birth_date, paternal_surname,
               maternal_surname, first_name, middle_name, sex, address,
               next_of_kin, phone, phone_alt, health_plan_id, created_at, updated_at
        FROM patients
        WHERE national_id = ? AND check_digit = ?
        "#,
        [&identity.national_id, &identity.check_digit],
        read_row,
    )
    .optional()?
    .map(|row| row.try_into())
    .transpose()
}

/// Find a patient by national ID alone. Drives the form's prefill search,
/// which submits the number without its check digit.
pub fn find_by_national_id(conn: &Connection, national_id: &str) -> DbResult<Option<Patient>> {
    conn.query_row(
        r#"
        SELECT id, national_id, check_digit, birth_date, paternal_surname,
               maternal_surname, first_name, middle_name, sex, address,
               next_of_kin, phone, phone_alt, health_plan_id, created_at, updated_at
        FROM patients
        WHERE national_id = ?
        "#,
        [national_id],
        read_row,
    )
    .optional()?
    .map(|row| row.try_into())
    .transpose()
}

/// Intermediate row struct for database mapping.
struct PatientRow {
    id: String,
    national_id: String,
    check_digit: String,
    birth_date: Option<String>,
    paternal_surname: Option<String>,
    maternal_surname: Option<String>,
    first_name: Option<String>,
    middle_name: Option<String>,
    sex: String,
    address: Option<String>,
    next_of_kin: Option<String>,
    phone: Option<String>,
    phone_alt: Option<String>,
    health_plan_id: Option<i64>,
    created_at: String,
    updated_at: String,
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PatientRow> {
    Ok(PatientRow {
        id: row.get(0)?,
        national_id: row.get(1)?,
        check_digit: row.get(2)?,
        birth_date: row.get(3)?,
        paternal_surname: row.get(4)?,
        maternal_surname: row.get(5)?,
        first_name: row.get(6)?,
        middle_name: row.get(7)?,
        sex: row.get(8)?,
        address: row.get(9)?,
        next_of_kin: row.get(10)?,
        phone: row.get(11)?,
        phone_alt: row.get(12)?,
        health_plan_id: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

impl TryFrom<PatientRow> for Patient {
    type Error = DbError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        Ok(Patient {
            id: row.id,
            national_id: row.national_id,
            check_digit: row.check_digit,
            birth_date: row.birth_date.map(|s| parse_date(&s)).transpose()?,
            paternal_surname: row.paternal_surname,
            maternal_surname: row.maternal_surname,
            first_name: row.first_name,
            middle_name: row.middle_name,
            sex: string_to_sex(&row.sex)?,
            address: row.address,
            next_of_kin: row.next_of_kin,
            phone: row.phone,
            phone_alt: row.phone_alt,
            health_plan_id: row.health_plan_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| DbError::Constraint(format!("Bad date '{}': {}", s, e)))
}

fn string_to_sex(s: &str) -> Result<Sex, DbError> {
    match s {
        "M" => Ok(Sex::Male),
        "F" => Ok(Sex::Female),
        _ => Err(DbError::Constraint(format!("Unknown sex code: {}", s))),
    }
}
