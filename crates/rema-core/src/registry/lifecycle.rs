//! Transport record lifecycle: draft auto-vivification and the
//! transactional store/update/delete flows.

use chrono::NaiveDate;

use crate::db::{patients, records, Database, DbResult};
use crate::models::{RecordForm, TransportRecord};

use super::PatientResolver;

/// Manages a transport record from its draft placeholder to the final
/// Created state.
pub struct RecordLifecycle<'a> {
    db: &'a mut Database,
}

impl<'a> RecordLifecycle<'a> {
    /// Create a new lifecycle manager.
    pub fn new(db: &'a mut Database) -> Self {
        Self { db }
    }

    /// Return the user's draft record, creating it on first call. Repeated
    /// calls return the same record until it changes state; the partial
    /// unique index on (user, draft) backs this against races.
    pub fn ensure_draft_for_user(&mut self, user_id: &str) -> DbResult<TransportRecord> {
        self.db.with_transaction(|tx| {
            if let Some(draft) = records::find_draft_for_user(tx, user_id)? {
                return Ok(draft);
            }

            let draft = TransportRecord::draft(user_id.to_string());
            records::insert(tx, &draft)?;
            tracing::info!(record_id = %draft.id, user_id, "auto-created draft record");
            Ok(draft)
        })
    }

    /// Persist a completed form as a new Created record owned by `user_id`.
    ///
    /// The patient upsert and the record insert run in one transaction; a
    /// failure in either step leaves no trace of the other.
    /// `reference_date` supplies the date component for the submitted
    /// time-of-day fields.
    pub fn store(
        &mut self,
        user_id: &str,
        form: &RecordForm,
        reference_date: NaiveDate,
    ) -> DbResult<TransportRecord> {
        self.db.with_transaction(|tx| {
            let patient = PatientResolver::new(tx).resolve_and_merge(&form.patient)?;
            let record =
                TransportRecord::from_form(user_id.to_string(), form, patient.id, reference_date);
            records::insert(tx, &record)?;
            tracing::info!(record_id = %record.id, "stored transport record");
            Ok(record)
        })
    }

    /// Overwrite an existing record with a resubmitted form, re-resolving
    /// the patient and resetting the status to Created. Returns `Ok(None)`
    /// when the id does not exist.
    pub fn update(
        &mut self,
        record_id: &str,
        form: &RecordForm,
        reference_date: NaiveDate,
    ) -> DbResult<Option<TransportRecord>> {
        let mut record = match records::get(self.db.conn(), record_id)? {
            Some(record) => record,
            None => return Ok(None),
        };

        self.db.with_transaction(|tx| {
            let patient = PatientResolver::new(tx).resolve_and_merge(&form.patient)?;
            record.apply_form(form, patient.id, reference_date);
            records::update(tx, &record)?;
            tracing::info!(record_id = %record.id, "updated transport record");
            Ok(())
        })?;

        Ok(Some(record))
    }

    /// Remove a record. The linked patient is never deleted.
    pub fn delete(&mut self, record_id: &str) -> DbResult<bool> {
        let deleted = records::delete(self.db.conn(), record_id)?;
        if deleted {
            tracing::info!(record_id, "deleted transport record");
        }
        Ok(deleted)
    }

    /// Build the pre-populated edit form for a record: times mapped back to
    /// time-of-day, demographics filled in from the linked patient. A draft
    /// without a patient yields an empty patient section.
    pub fn edit_form(&self, record_id: &str) -> DbResult<Option<RecordForm>> {
        let record = match records::get(self.db.conn(), record_id)? {
            Some(record) => record,
            None => return Ok(None),
        };

        let patient = match &record.patient_id {
            Some(patient_id) => patients::get(self.db.conn(), patient_id)?,
            None => None,
        };

        Ok(Some(RecordForm {
            patient: patient.map(|p| p.to_submission()).unwrap_or_default(),
            call_time: record.call_time.map(|dt| dt.time()),
            departure_time: record.departure_time.map(|dt| dt.time()),
            arrival_time: record.arrival_time.map(|dt| dt.time()),
            dispatch_code: record.dispatch_code,
            origin: record.origin,
            destination: record.destination,
            notes: record.notes,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PatientSubmission, RecordStatus};
    use chrono::NaiveTime;

    fn reference_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn make_form() -> RecordForm {
        RecordForm {
            patient: PatientSubmission {
                national_id: "12345678".into(),
                check_digit: "5".into(),
                first_name: Some("Ana".into()),
                male: true,
                ..PatientSubmission::default()
            },
            call_time: NaiveTime::from_hms_opt(14, 30, 0),
            departure_time: NaiveTime::from_hms_opt(14, 45, 0),
            arrival_time: NaiveTime::from_hms_opt(15, 10, 0),
            dispatch_code: Some("R-17".into()),
            origin: Some("Hospital Regional".into()),
            destination: Some("CESFAM Norte".into()),
            notes: None,
        }
    }

    #[test]
    fn test_ensure_draft_is_idempotent() {
        let mut db = Database::open_in_memory().unwrap();
        let mut lifecycle = RecordLifecycle::new(&mut db);

        let first = lifecycle.ensure_draft_for_user("user-1").unwrap();
        let second = lifecycle.ensure_draft_for_user("user-1").unwrap();
        assert_eq!(first.id, second.id);

        let other = lifecycle.ensure_draft_for_user("user-2").unwrap();
        assert_ne!(first.id, other.id);
    }

    #[test]
    fn test_store_links_resolved_patient() {
        let mut db = Database::open_in_memory().unwrap();
        let mut lifecycle = RecordLifecycle::new(&mut db);

        let record = lifecycle
            .store("user-1", &make_form(), reference_date())
            .unwrap();
        assert_eq!(record.status, RecordStatus::Created);

        let patient_id = record.patient_id.unwrap();
        let patient = patients::get(db.conn(), &patient_id).unwrap().unwrap();
        assert_eq!(patient.national_id, "12345678");
    }

    #[test]
    fn test_update_finalizes_draft() {
        let mut db = Database::open_in_memory().unwrap();
        let mut lifecycle = RecordLifecycle::new(&mut db);

        let draft = lifecycle.ensure_draft_for_user("user-1").unwrap();
        let updated = lifecycle
            .update(&draft.id, &make_form(), reference_date())
            .unwrap()
            .unwrap();

        assert_eq!(updated.id, draft.id);
        assert_eq!(updated.status, RecordStatus::Created);

        // The draft slot is free again
        let next = lifecycle.ensure_draft_for_user("user-1").unwrap();
        assert_ne!(next.id, draft.id);
    }

    #[test]
    fn test_edit_form_prefills_from_record() {
        let mut db = Database::open_in_memory().unwrap();
        let mut lifecycle = RecordLifecycle::new(&mut db);

        let record = lifecycle
            .store("user-1", &make_form(), reference_date())
            .unwrap();

        let form = lifecycle.edit_form(&record.id).unwrap().unwrap();
        assert_eq!(form.call_time, NaiveTime::from_hms_opt(14, 30, 0));
        assert_eq!(form.patient.national_id, "12345678");
        assert!(form.patient.male);
        assert_eq!(form.dispatch_code, Some("R-17".into()));
    }

    #[test]
    fn test_edit_form_for_draft_is_empty() {
        let mut db = Database::open_in_memory().unwrap();
        let mut lifecycle = RecordLifecycle::new(&mut db);

        let draft = lifecycle.ensure_draft_for_user("user-1").unwrap();
        let form = lifecycle.edit_form(&draft.id).unwrap().unwrap();

        assert_eq!(form.patient, PatientSubmission::default());
        assert!(form.call_time.is_none());
    }
}
