//! Rema Core Library
//!
//! Patient-transport dispatch record keeping for an administrative web
//! application.
//!
//! # Architecture
//!
//! ```text
//! form submission
//!       │
//!       ▼
//! PatientResolver ──── find-or-create by (national id, check digit);
//!       │              demographics overwritten on every match
//!       ▼
//! RecordLifecycle ──── stamps owning user, patient id, call/departure/
//!       │              arrival date-times, status
//!       ▼
//! ┌─────────────────────────────────────────────┐
//! │ one SQLite transaction:                     │
//! │ patient upsert + transport record write     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Records start as a per-user DRAFT placeholder (auto-created when the
//! user opens the create screen) and become CREATED on a full form
//! submission. Not-found conditions are signals (`Ok(None)` / `Ok(false)`),
//! never errors.
//!
//! # Modules
//!
//! - [`db`]: SQLite persistence layer
//! - [`models`]: domain types (Patient, TransportRecord, forms)
//! - [`registry`]: patient resolver and record lifecycle workflows

pub mod db;
pub mod models;
pub mod registry;

// Re-export commonly used types
pub use db::Database;
pub use models::{
    HealthPlan, Patient, PatientIdentity, PatientSubmission, RecordForm, RecordPage, RecordQuery,
    RecordStatus, Sex, TransportRecord,
};
pub use registry::{PatientResolver, RecordLifecycle};

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use chrono::NaiveDate;

// =========================================================================
// Error Type
// =========================================================================

/// Failures surfaced by [`TransportRegistry`] operations.
///
/// A storage failure during store/update means the whole transaction was
/// rolled back; the original cause stays attached.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("storage error: {0}")]
    Storage(#[from] db::DbError),

    #[error("registry lock poisoned")]
    LockPoisoned,
}

impl<T> From<PoisonError<T>> for RegistryError {
    fn from(_: PoisonError<T>) -> Self {
        RegistryError::LockPoisoned
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;

// =========================================================================
// Main API Object
// =========================================================================

/// Service facade exposing the transport-record operations the outer web
/// layers call.
pub struct TransportRegistry {
    db: Mutex<Database>,
}

impl TransportRegistry {
    /// Open or create the registry database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> RegistryResult<Self> {
        Ok(Self {
            db: Mutex::new(Database::open(path)?),
        })
    }

    /// Create an in-memory registry (for testing).
    pub fn open_in_memory() -> RegistryResult<Self> {
        Ok(Self {
            db: Mutex::new(Database::open_in_memory()?),
        })
    }

    // =====================================================================
    // Record Operations
    // =====================================================================

    /// List records, filtered by the query's call-date range and paged.
    pub fn list_records(&self, query: &RecordQuery) -> RegistryResult<RecordPage> {
        let db = self.db.lock()?;
        Ok(db::records::list(db.conn(), query)?)
    }

    /// Return the caller's draft record, creating it on first use. The
    /// create screen redirects to this record's edit form.
    pub fn begin_record(&self, user_id: &str) -> RegistryResult<TransportRecord> {
        let mut db = self.db.lock()?;
        Ok(RecordLifecycle::new(&mut db).ensure_draft_for_user(user_id)?)
    }

    /// Persist a completed form as a new CREATED record owned by `user_id`.
    ///
    /// `reference_date` supplies the date component for the submitted
    /// time-of-day fields.
    pub fn store_record(
        &self,
        user_id: &str,
        form: &RecordForm,
        reference_date: NaiveDate,
    ) -> RegistryResult<TransportRecord> {
        let mut db = self.db.lock()?;
        Ok(RecordLifecycle::new(&mut db).store(user_id, form, reference_date)?)
    }

    /// Fetch a record by id.
    pub fn get_record(&self, record_id: &str) -> RegistryResult<Option<TransportRecord>> {
        let db = self.db.lock()?;
        Ok(db::records::get(db.conn(), record_id)?)
    }

    /// Build the pre-populated edit form for a record.
    pub fn edit_record(&self, record_id: &str) -> RegistryResult<Option<RecordForm>> {
        let mut db = self.db.lock()?;
        Ok(RecordLifecycle::new(&mut db).edit_form(record_id)?)
    }

    /// Overwrite a record with a resubmitted form; the status is reset to
    /// CREATED regardless of where it was.
    pub fn update_record(
        &self,
        record_id: &str,
        form: &RecordForm,
        reference_date: NaiveDate,
    ) -> RegistryResult<Option<TransportRecord>> {
        let mut db = self.db.lock()?;
        Ok(RecordLifecycle::new(&mut db).update(record_id, form, reference_date)?)
    }

    /// Delete a record. Linked patients are kept.
    pub fn delete_record(&self, record_id: &str) -> RegistryResult<bool> {
        let mut db = self.db.lock()?;
        Ok(RecordLifecycle::new(&mut db).delete(record_id)?)
    }

    // =====================================================================
    // Patient Operations
    // =====================================================================

    /// Look up a patient by national ID for the form's prefill search.
    pub fn lookup_patient(&self, national_id: &str) -> RegistryResult<Option<Patient>> {
        let db = self.db.lock()?;
        Ok(db::patients::find_by_national_id(db.conn(), national_id)?)
    }

    /// The health-plan options the form's select renders.
    pub fn list_health_plans(&self) -> RegistryResult<Vec<HealthPlan>> {
        let db = self.db.lock()?;
        Ok(db::health_plans::list(db.conn())?)
    }
}
