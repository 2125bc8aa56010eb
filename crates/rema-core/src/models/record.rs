//! Transport record models.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::patient::PatientSubmission;

/// Transport record status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    /// Placeholder auto-created per user before form completion
    Draft,
    /// Finalized after a full form submission
    Created,
}

/// A patient transport record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransportRecord {
    /// Unique record ID
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Resolved patient; empty while the record is a draft
    pub patient_id: Option<String>,
    pub status: RecordStatus,
    pub call_time: Option<NaiveDateTime>,
    pub departure_time: Option<NaiveDateTime>,
    pub arrival_time: Option<NaiveDateTime>,
    pub dispatch_code: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub notes: Option<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl TransportRecord {
    /// Create the per-user draft placeholder with no other fields populated.
    pub fn draft(user_id: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            patient_id: None,
            status: RecordStatus::Draft,
            call_time: None,
            departure_time: None,
            arrival_time: None,
            dispatch_code: None,
            origin: None,
            destination: None,
            notes: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Build a new record from a completed form.
    pub fn from_form(
        user_id: String,
        form: &RecordForm,
        patient_id: String,
        reference_date: NaiveDate,
    ) -> Self {
        let mut record = Self::draft(user_id);
        record.apply_form(form, patient_id, reference_date);
        record
    }

    /// Overwrite all fields with the submitted values and stamp the
    /// computed ones. The three time-of-day fields are combined with
    /// `reference_date`; status always lands on Created, even when the
    /// record already was.
    pub fn apply_form(
        &mut self,
        form: &RecordForm,
        patient_id: String,
        reference_date: NaiveDate,
    ) {
        self.patient_id = Some(patient_id);
        self.status = RecordStatus::Created;
        self.call_time = form.call_time.map(|t| reference_date.and_time(t));
        self.departure_time = form.departure_time.map(|t| reference_date.and_time(t));
        self.arrival_time = form.arrival_time.map(|t| reference_date.and_time(t));
        self.dispatch_code = form.dispatch_code.clone();
        self.origin = form.origin.clone();
        self.destination = form.destination.clone();
        self.notes = form.notes.clone();
        self.touch();
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

/// A submitted create/update form: patient identity plus demographics and
/// the transport fields, times still as time-of-day.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecordForm {
    pub patient: PatientSubmission,
    pub call_time: Option<NaiveTime>,
    pub departure_time: Option<NaiveTime>,
    pub arrival_time: Option<NaiveTime>,
    pub dispatch_code: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub notes: Option<String>,
}

/// Date-range filter and paging for the record listing.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordQuery {
    /// Inclusive lower bound on the call date
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the call date
    pub to: Option<NaiveDate>,
    /// 1-based page number
    pub page: u32,
    pub per_page: u32,
}

impl Default for RecordQuery {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            page: 1,
            per_page: 25,
        }
    }
}

/// One page of the filtered record listing.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordPage {
    pub records: Vec<TransportRecord>,
    /// Total matching records across all pages
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}
