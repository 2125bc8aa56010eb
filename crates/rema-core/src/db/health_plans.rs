//! Health-plan reference lookups. The table is read-only in this module's
//! scope; rows are seeded by the schema.

use rusqlite::{Connection, OptionalExtension};

use super::DbResult;
use crate::models::HealthPlan;

/// List the health-plan options offered by the intake form.
pub fn list(conn: &Connection) -> DbResult<Vec<HealthPlan>> {
    let mut stmt = conn.prepare("SELECT id, name FROM health_plans ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok(HealthPlan {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })?;

    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Get a single plan by id.
pub fn get(conn: &Connection, id: i64) -> DbResult<Option<HealthPlan>> {
    conn.query_row("SELECT id, name FROM health_plans WHERE id = ?", [id], |row| {
        Ok(HealthPlan {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })
    .optional()
    .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_seeded_plans() {
        let db = Database::open_in_memory().unwrap();

        let plans = list(db.conn()).unwrap();
        assert_eq!(plans.len(), 6);
        assert_eq!(plans[0].name, "Fonasa A");

        let plan = get(db.conn(), 5).unwrap().unwrap();
        assert_eq!(plan.name, "Isapre");

        assert!(get(db.conn(), 999).unwrap().is_none());
    }
}
