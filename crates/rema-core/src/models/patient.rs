//! Patient models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identity key used to deduplicate patients across transport records:
/// national ID number plus its verification digit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientIdentity {
    pub national_id: String,
    pub check_digit: String,
}

/// Administrative sex as captured by the intake form toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Sex {
    /// Map the form's boolean toggle: `true` is male.
    pub fn from_flag(male: bool) -> Self {
        if male {
            Sex::Male
        } else {
            Sex::Female
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
        }
    }

    pub fn is_male(&self) -> bool {
        matches!(self, Sex::Male)
    }
}

/// A patient profile, deduplicated by identity key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Local UUID, generated on first encounter of the identity key
    pub id: String,
    /// National ID number
    pub national_id: String,
    /// Verification digit for the national ID
    pub check_digit: String,
    pub birth_date: Option<NaiveDate>,
    pub paternal_surname: Option<String>,
    pub maternal_surname: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub sex: Sex,
    pub address: Option<String>,
    /// Family member responsible for the patient
    pub next_of_kin: Option<String>,
    pub phone: Option<String>,
    pub phone_alt: Option<String>,
    /// Reference into the health_plans table
    pub health_plan_id: Option<i64>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

/// Demographic fields as submitted by the create/update form, identity key
/// included.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PatientSubmission {
    pub national_id: String,
    pub check_digit: String,
    pub birth_date: Option<NaiveDate>,
    pub paternal_surname: Option<String>,
    pub maternal_surname: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    /// Form toggle; `true` maps to 'M', `false` to 'F'
    pub male: bool,
    pub address: Option<String>,
    pub next_of_kin: Option<String>,
    pub phone: Option<String>,
    pub phone_alt: Option<String>,
    pub health_plan_id: Option<i64>,
}

impl PatientSubmission {
    /// The identity key carried by this submission.
    pub fn identity(&self) -> PatientIdentity {
        PatientIdentity {
            national_id: self.national_id.clone(),
            check_digit: self.check_digit.clone(),
        }
    }
}

impl Patient {
    /// Create a new patient from a form submission.
    pub fn from_submission(submission: &PatientSubmission) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            national_id: submission.national_id.clone(),
            check_digit: submission.check_digit.clone(),
            birth_date: submission.birth_date,
            paternal_surname: submission.paternal_surname.clone(),
            maternal_surname: submission.maternal_surname.clone(),
            first_name: submission.first_name.clone(),
            middle_name: submission.middle_name.clone(),
            sex: Sex::from_flag(submission.male),
            address: submission.address.clone(),
            next_of_kin: submission.next_of_kin.clone(),
            phone: submission.phone.clone(),
            phone_alt: submission.phone_alt.clone(),
            health_plan_id: submission.health_plan_id,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Overwrite every demographic field with the submitted values. The id
    /// and creation timestamp are kept; this is a full overwrite, not a
    /// partial merge.
    pub fn apply_submission(&mut self, submission: &PatientSubmission) {
        self.national_id = submission.national_id.clone();
        self.check_digit = submission.check_digit.clone();
        self.birth_date = submission.birth_date;
        self.paternal_surname = submission.paternal_surname.clone();
        self.maternal_surname = submission.maternal_surname.clone();
        self.first_name = submission.first_name.clone();
        self.middle_name = submission.middle_name.clone();
        self.sex = Sex::from_flag(submission.male);
        self.address = submission.address.clone();
        self.next_of_kin = submission.next_of_kin.clone();
        self.phone = submission.phone.clone();
        self.phone_alt = submission.phone_alt.clone();
        self.health_plan_id = submission.health_plan_id;
        self.touch();
    }

    /// Map back to the form representation for edit-screen prefill.
    pub fn to_submission(&self) -> PatientSubmission {
        PatientSubmission {
            national_id: self.national_id.clone(),
            check_digit: self.check_digit.clone(),
            birth_date: self.birth_date,
            paternal_surname: self.paternal_surname.clone(),
            maternal_surname: self.maternal_surname.clone(),
            first_name: self.first_name.clone(),
            middle_name: self.middle_name.clone(),
            male: self.sex.is_male(),
            address: self.address.clone(),
            next_of_kin: self.next_of_kin.clone(),
            phone: self.phone.clone(),
            phone_alt: self.phone_alt.clone(),
            health_plan_id: self.health_plan_id,
        }
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

/// A row of the read-only health-plan reference table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthPlan {
    pub id: i64,
    pub name: String,
}
