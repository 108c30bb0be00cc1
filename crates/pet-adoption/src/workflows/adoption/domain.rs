use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::access::UserId;
use crate::workflows::catalog::domain::{
    looks_like_email, optional_text, require_text, Pet, PetId,
};

const MAX_CONTACT_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 100;
const MAX_PHONE_LEN: usize = 20;
const MAX_ADDRESS_LEN: usize = 200;
const MAX_NOTES_LEN: usize = 1000;

/// Identifier wrapper for adoption applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub u64);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "application-{}", self.0)
    }
}

/// Lifecycle of an application. `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Approved | ApplicationStatus::Rejected
        )
    }
}

/// How the shelter can reach the applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantContact {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl ApplicantContact {
    pub fn validate(&self) -> Result<(), String> {
        require_text("applicant name", &self.name, MAX_CONTACT_NAME_LEN)?;
        validate_email(&self.email)?;
        require_text("applicant phone", &self.phone, MAX_PHONE_LEN)?;
        require_text("applicant address", &self.address, MAX_ADDRESS_LEN)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdoptionApplication {
    pub id: ApplicationId,
    pub pet_id: PetId,
    pub applicant_id: UserId,
    pub contact: ApplicantContact,
    pub notes: Option<String>,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl AdoptionApplication {
    pub fn is_pending(&self) -> bool {
        self.status == ApplicationStatus::Pending
    }
}

/// Intake payload. The applicant is derived from the caller unless an admin files on someone's
/// behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    pub pet_id: PetId,
    #[serde(default)]
    pub applicant_id: Option<UserId>,
    pub contact: ApplicantContact,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ApplicationSubmission {
    pub fn validate(&self) -> Result<(), String> {
        self.contact.validate()?;
        optional_text("notes", self.notes.as_deref(), MAX_NOTES_LEN)
    }
}

/// Partial edit of contact details and notes. Never carries a status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationChanges {
    #[serde(default)]
    pub applicant_name: Option<String>,
    #[serde(default)]
    pub applicant_email: Option<String>,
    #[serde(default)]
    pub applicant_phone: Option<String>,
    #[serde(default)]
    pub applicant_address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ApplicationChanges {
    pub fn is_empty(&self) -> bool {
        self.applicant_name.is_none()
            && self.applicant_email.is_none()
            && self.applicant_phone.is_none()
            && self.applicant_address.is_none()
            && self.notes.is_none()
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.applicant_name {
            require_text("applicant name", name, MAX_CONTACT_NAME_LEN)?;
        }
        if let Some(email) = &self.applicant_email {
            validate_email(email)?;
        }
        if let Some(phone) = &self.applicant_phone {
            require_text("applicant phone", phone, MAX_PHONE_LEN)?;
        }
        if let Some(address) = &self.applicant_address {
            require_text("applicant address", address, MAX_ADDRESS_LEN)?;
        }
        optional_text("notes", self.notes.as_deref(), MAX_NOTES_LEN)
    }

    pub fn apply_to(self, application: &mut AdoptionApplication) {
        if let Some(name) = self.applicant_name {
            application.contact.name = name;
        }
        if let Some(email) = self.applicant_email {
            application.contact.email = email;
        }
        if let Some(phone) = self.applicant_phone {
            application.contact.phone = phone;
        }
        if let Some(address) = self.applicant_address {
            application.contact.address = address;
        }
        if let Some(notes) = self.notes {
            application.notes = Some(notes);
        }
    }
}

/// Combined edit accepted by the update endpoint: field changes plus an optional decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRevision {
    #[serde(flatten)]
    pub changes: ApplicationChanges,
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
}

/// Optional narrowing applied on top of the caller's visibility scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationFilter {
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
    #[serde(default)]
    pub pet_id: Option<u64>,
    #[serde(default)]
    pub applicant_id: Option<u64>,
}

impl ApplicationFilter {
    pub fn matches(&self, application: &AdoptionApplication) -> bool {
        self.status.map_or(true, |status| application.status == status)
            && self
                .pet_id
                .map_or(true, |pet| application.pet_id == PetId(pet))
            && self
                .applicant_id
                .map_or(true, |user| application.applicant_id == UserId(user))
    }
}

/// Application as returned to callers, with the pet's display name attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationView {
    pub id: ApplicationId,
    pub pet_id: PetId,
    pub pet_name: String,
    pub applicant_id: UserId,
    pub contact: ApplicantContact,
    pub notes: Option<String>,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl ApplicationView {
    pub fn new(application: AdoptionApplication, pet: Option<&Pet>) -> Self {
        Self {
            id: application.id,
            pet_id: application.pet_id,
            pet_name: pet.map(|pet| pet.name.clone()).unwrap_or_default(),
            applicant_id: application.applicant_id,
            contact: application.contact,
            notes: application.notes,
            status: application.status,
            submitted_at: application.submitted_at,
            last_modified: application.last_modified,
        }
    }
}

fn validate_email(email: &str) -> Result<(), String> {
    require_text("applicant email", email, MAX_EMAIL_LEN)?;
    if !looks_like_email(email) {
        return Err(format!("'{email}' is not an email address"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(!ApplicationStatus::Pending.is_terminal());
        assert!(ApplicationStatus::Approved.is_terminal());
        assert!(ApplicationStatus::Rejected.is_terminal());
    }

    #[test]
    fn revision_deserializes_flat_fields_and_status() {
        let revision: ApplicationRevision = serde_json::from_value(serde_json::json!({
            "applicant_phone": "555-0100",
            "status": "Approved"
        }))
        .expect("revision parses");
        assert_eq!(revision.changes.applicant_phone.as_deref(), Some("555-0100"));
        assert!(revision.changes.applicant_name.is_none());
        assert_eq!(revision.status, Some(ApplicationStatus::Approved));
    }

    #[test]
    fn contact_validation_rejects_bad_email() {
        let contact = ApplicantContact {
            name: "Jordan Reyes".to_string(),
            email: "jordan.example.com".to_string(),
            phone: "555-0100".to_string(),
            address: "12 Elm St".to_string(),
        };
        let err = contact.validate().expect_err("email rejected");
        assert!(err.contains("email"));
    }

    #[test]
    fn empty_changes_are_detected() {
        assert!(ApplicationChanges::default().is_empty());
        let changes = ApplicationChanges {
            notes: Some("Has a fenced yard".to_string()),
            ..ApplicationChanges::default()
        };
        assert!(!changes.is_empty());
    }
}
