//! Transport record database operations.

use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use super::{DbError, DbResult};
use crate::models::{RecordPage, RecordQuery, RecordStatus, TransportRecord};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Insert a new record.
pub fn insert(conn: &Connection, record: &TransportRecord) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO transport_records (
            id, user_id, patient_id, status, call_time, departure_time,
            arrival_time, dispatch_code, origin, destination, notes,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
        params![
            record.id,
            record.user_id,
            record.patient_id,
            status_to_string(&record.status),
            record.call_time.map(datetime_to_string),
            record.departure_time.map(datetime_to_string),
            record.arrival_time.map(datetime_to_string),
            record.dispatch_code,
            record.origin,
            record.destination,
            record.notes,
            record.created_at,
            record.updated_at,
        ],
    )?;
    Ok(())
}

/// Overwrite an existing record.
pub fn update(conn: &Connection, record: &TransportRecord) -> DbResult<bool> {
    let rows_affected = conn.execute(
        r#"
        UPDATE transport_records SET
            user_id = ?2,
            patient_id = ?3,
            status = ?4,
            call_time = ?5,
            departure_time = ?6,
            arrival_time = ?7,
            dispatch_code = ?8,
            origin = ?9,
            destination = ?10,
            notes = ?11,
            updated_at = datetime('now')
        WHERE id = ?1
        "#,
        params![
            record.id,
            record.user_id,
            record.patient_id,
            status_to_string(&record.status),
            record.call_time.map(datetime_to_string),
            record.departure_time.map(datetime_to_string),
            record.arrival_time.map(datetime_to_string),
            record.dispatch_code,
            record.origin,
            record.destination,
            record.notes,
        ],
    )?;
    Ok(rows_affected > 0)
}

/// Get a record by id.
pub fn get(conn: &Connection, id: &str) -> DbResult<Option<TransportRecord>> {
    conn.query_row(
        r#"
        SELECT id, user_id, patient_id, status, call_time, departure_time,
               arrival_time, dispatch_code, origin, destination, notes,
               created_at, updated_at
        FROM transport_records
        WHERE id = ?
        "#,
        [id],
        read_row,
    )
    .optional()?
    .map(|row| row.try_into())
    .transpose()
}

/// Find the user's draft record, if any. At most one exists.
pub fn find_draft_for_user(conn: &Connection, user_id: &str) -> DbResult<Option<TransportRecord>> {
    conn.query_row(
        r#"
        SELECT id, user_id, patient_id, status, call_time, departure_time,
               arrival_time, dispatch_code, origin, destination, notes,
               created_at, updated_at
        FROM transport_records
        WHERE user_id = ? AND status = 'draft'
        "#,
        [user_id],
        read_row,
    )
    .optional()?
    .map(|row| row.try_into())
    .transpose()
}

/// List records filtered by the query's call-date range, newest first,
/// one page at a time.
pub fn list(conn: &Connection, query: &RecordQuery) -> DbResult<RecordPage> {
    let mut clauses: Vec<&str> = Vec::new();
    let mut args: Vec<Value> = Vec::new();

    if let Some(from) = query.from {
        clauses.push("call_time >= ?");
        args.push(Value::from(format!("{} 00:00:00", from)));
    }
    if let Some(to) = query.to {
        clauses.push("call_time <= ?");
        args.push(Value::from(format!("{} 23:59:59", to)));
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM transport_records {}", where_sql),
        params_from_iter(args.iter()),
        |row| row.get(0),
    )?;

    let page = query.page.max(1);
    let offset = (page - 1) as i64 * query.per_page as i64;
    args.push(Value::from(query.per_page as i64));
    args.push(Value::from(offset));

    let mut stmt = conn.prepare(&format!(
        r#"
        SELECT id, user_id, patient_id, status, call_time, departure_time,
               arrival_time, dispatch_code, origin, destination, notes,
               created_at, updated_at
        FROM transport_records
        {}
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    ))?;

    let rows = stmt.query_map(params_from_iter(args.iter()), read_row)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(row?.try_into()?);
    }

    Ok(RecordPage {
        records,
        total: total as u64,
        page,
        per_page: query.per_page,
    })
}

/// Delete a record.
pub fn delete(conn: &Connection, id: &str) -> DbResult<bool> {
    let rows_affected = conn.execute("DELETE FROM transport_records WHERE id = ?", [id])?;
    Ok(rows_affected > 0)
}

/// Intermediate row struct for database mapping.
struct RecordRow {
    id: String,
    user_id: String,
    patient_id: Option<String>,
    status: String,
    call_time: Option<String>,
    departure_time: Option<String>,
    arrival_time: Option<String>,
    dispatch_code: Option<String>,
    origin: Option<String>,
    destination: Option<String>,
    notes: Option<String>,
    created_at: String,
    updated_at: String,
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RecordRow> {
    Ok(RecordRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        patient_id: row.get(2)?,
        status: row.get(3)?,
        call_time: row.get(4)?,
        departure_time: row.get(5)?,
        arrival_time: row.get(6)?,
        dispatch_code: row.get(7)?,
        origin: row.get(8)?,
        destination: row.get(9)?,
        notes: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

impl TryFrom<RecordRow> for TransportRecord {
    type Error = DbError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        Ok(TransportRecord {
            id: row.id,
            user_id: row.user_id,
            patient_id: row.patient_id,
            status: string_to_status(&row.status)?,
            call_time: row.call_time.map(|s| parse_datetime(&s)).transpose()?,
            departure_time: row.departure_time.map(|s| parse_datetime(&s)).transpose()?,
            arrival_time: row.arrival_time.map(|s| parse_datetime(&s)).transpose()?,
            dispatch_code: row.dispatch_code,
            origin: row.origin,
            destination: row.destination,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn datetime_to_string(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

fn parse_datetime(s: &str) -> Result<NaiveDateTime, DbError> {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .map_err(|e| DbError::Constraint(format!("Bad datetime '{}': {}", s, e)))
}

fn status_to_string(status: &RecordStatus) -> &'static str {
    match status {
        RecordStatus::Draft => "draft",
        RecordStatus::Created => "created",
    }
}

fn string_to_status(s: &str) -> Result<RecordStatus, DbError> {
    match s {
        "draft" => Ok(RecordStatus::Draft),
        "created" => Ok(RecordStatus::Created),
        _ => Err(DbError::Constraint(format!("Unknown record status: {}", s))),
    }
}
