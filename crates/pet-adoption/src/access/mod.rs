//! Caller identities and the authorization rules every workflow consults.
//!
//! Identity is resolved upstream (token issuance and password hashing live elsewhere); this
//! module only models the resolved claims as a single tagged [`Caller`] so that visibility and
//! decision rules are expressed once instead of per endpoint.

pub mod identity;
pub mod visibility;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::catalog::domain::ShelterId;

pub use identity::IdentityRejection;
pub use visibility::{can_access, can_decide, can_delete, submission_applicant, ApplicationScope};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    Admin,
    ShelterStaff,
    Adopter,
}

impl UserRole {
    pub const fn label(self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::ShelterStaff => "shelter_staff",
            UserRole::Adopter => "adopter",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace(&['_', '-', ' '][..], "").as_str() {
            "admin" => Some(UserRole::Admin),
            "shelterstaff" | "staff" => Some(UserRole::ShelterStaff),
            "adopter" => Some(UserRole::Adopter),
            _ => None,
        }
    }
}

/// Account known to the entity store. Credentials stay with the authentication service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub shelter_id: Option<ShelterId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDraft {
    pub username: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub shelter_id: Option<ShelterId>,
}

/// Resolved identity of whoever issued the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Caller {
    Admin {
        user_id: UserId,
    },
    ShelterStaff {
        user_id: UserId,
        shelter_id: Option<ShelterId>,
    },
    Adopter {
        user_id: UserId,
    },
    /// Authenticated, but carrying a role this service does not know. Never granted anything.
    Unrecognized {
        user_id: UserId,
    },
}

impl Caller {
    pub fn from_claims(role: &str, user_id: UserId, shelter_id: Option<ShelterId>) -> Self {
        match UserRole::parse(role) {
            Some(UserRole::Admin) => Caller::Admin { user_id },
            Some(UserRole::ShelterStaff) => Caller::ShelterStaff {
                user_id,
                shelter_id,
            },
            Some(UserRole::Adopter) => Caller::Adopter { user_id },
            None => Caller::Unrecognized { user_id },
        }
    }

    pub fn for_user(user: &User) -> Self {
        match user.role {
            UserRole::Admin => Caller::Admin { user_id: user.id },
            UserRole::ShelterStaff => Caller::ShelterStaff {
                user_id: user.id,
                shelter_id: user.shelter_id,
            },
            UserRole::Adopter => Caller::Adopter { user_id: user.id },
        }
    }

    pub fn user_id(&self) -> UserId {
        match self {
            Caller::Admin { user_id }
            | Caller::ShelterStaff { user_id, .. }
            | Caller::Adopter { user_id }
            | Caller::Unrecognized { user_id } => *user_id,
        }
    }

    pub fn role(&self) -> Option<UserRole> {
        match self {
            Caller::Admin { .. } => Some(UserRole::Admin),
            Caller::ShelterStaff { .. } => Some(UserRole::ShelterStaff),
            Caller::Adopter { .. } => Some(UserRole::Adopter),
            Caller::Unrecognized { .. } => None,
        }
    }

    /// Admins and shelter staff may maintain the pet catalog.
    pub fn can_manage_pets(&self) -> bool {
        matches!(self, Caller::Admin { .. } | Caller::ShelterStaff { .. })
    }

    pub fn can_manage_shelters(&self) -> bool {
        matches!(self, Caller::Admin { .. })
    }
}
