//! Patient resolution: find-or-create by national identity.

use rusqlite::Connection;

use crate::db::{patients, DbResult};
use crate::models::{Patient, PatientSubmission};

/// Resolves submitted identity fields to a single patient row.
///
/// Patients are deduplicated by their identity key, never by a surrogate id
/// supplied by the caller. After a call exactly one row exists for the
/// submission's key.
pub struct PatientResolver<'a> {
    conn: &'a Connection,
}

impl<'a> PatientResolver<'a> {
    /// Create a new resolver over the given connection. Pass the active
    /// transaction to make the upsert part of a larger atomic write.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Find the patient for the submission's identity key, creating one on
    /// first encounter. On a match every demographic field is overwritten
    /// with the submitted values.
    pub fn resolve_and_merge(&self, submission: &PatientSubmission) -> DbResult<Patient> {
        match patients::find_by_identity(self.conn, &submission.identity())? {
            Some(mut patient) => {
                patient.apply_submission(submission);
                patients::update(self.conn, &patient)?;
                tracing::debug!(patient_id = %patient.id, "merged demographics into existing patient");
                Ok(patient)
            }
            None => {
                let patient = Patient::from_submission(submission);
                patients::insert(self.conn, &patient)?;
                tracing::debug!(patient_id = %patient.id, "created patient for new identity");
                Ok(patient)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, DbError};
    use crate::models::Sex;
    use proptest::prelude::*;

    fn make_submission() -> PatientSubmission {
        PatientSubmission {
            national_id: "12345678".into(),
            check_digit: "5".into(),
            paternal_surname: Some("Rojas".into()),
            first_name: Some("Ana".into()),
            male: true,
            health_plan_id: Some(2),
            ..PatientSubmission::default()
        }
    }

    fn patient_count(db: &Database) -> i64 {
        db.conn()
            .query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_creates_on_first_encounter() {
        let db = Database::open_in_memory().unwrap();

        let patient = PatientResolver::new(db.conn())
            .resolve_and_merge(&make_submission())
            .unwrap();

        assert_eq!(patient.sex, Sex::Male);
        assert_eq!(patient_count(&db), 1);
    }

    #[test]
    fn test_merges_on_known_identity() {
        let db = Database::open_in_memory().unwrap();
        let resolver = PatientResolver::new(db.conn());

        let first = resolver.resolve_and_merge(&make_submission()).unwrap();

        let mut changed = make_submission();
        changed.first_name = Some("Carla".into());
        changed.male = false;
        let second = resolver.resolve_and_merge(&changed).unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.first_name, Some("Carla".into()));
        assert_eq!(second.sex, Sex::Female);
        assert_eq!(patient_count(&db), 1);
    }

    #[test]
    fn test_different_check_digit_is_a_new_patient() {
        let db = Database::open_in_memory().unwrap();
        let resolver = PatientResolver::new(db.conn());

        let first = resolver.resolve_and_merge(&make_submission()).unwrap();

        let mut other = make_submission();
        other.check_digit = "K".into();
        let second = resolver.resolve_and_merge(&other).unwrap();

        assert_ne!(second.id, first.id);
        assert_eq!(patient_count(&db), 2);
    }

    #[test]
    fn test_merge_rolled_back_on_transaction_failure() {
        let mut db = Database::open_in_memory().unwrap();

        let original = PatientResolver::new(db.conn())
            .resolve_and_merge(&make_submission())
            .unwrap();

        let result: DbResult<()> = db.with_transaction(|tx| {
            let mut changed = make_submission();
            changed.first_name = Some("Carla".into());
            PatientResolver::new(tx).resolve_and_merge(&changed)?;
            Err(DbError::Constraint("record write failed".into()))
        });
        assert!(result.is_err());

        // The merge happened inside the failed transaction and must not be
        // observable afterwards
        let after = patients::get(db.conn(), &original.id).unwrap().unwrap();
        assert_eq!(after.first_name, Some("Ana".into()));
    }

    proptest! {
        #[test]
        fn resolve_never_duplicates_identity(names in proptest::collection::vec("[A-Za-z]{1,12}", 1..8)) {
            let db = Database::open_in_memory().unwrap();
            let resolver = PatientResolver::new(db.conn());

            for name in &names {
                let mut submission = make_submission();
                submission.first_name = Some(name.clone());
                resolver.resolve_and_merge(&submission).unwrap();
            }

            prop_assert_eq!(patient_count(&db), 1);
        }
    }
}
