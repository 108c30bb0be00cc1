//! Which applications a caller may see, and who may decide on them.
//!
//! Every rule fails closed: a caller without a recognised role, or shelter staff without a
//! shelter, is granted nothing rather than an error or a wider view.

use super::{Caller, UserId};
use crate::workflows::adoption::domain::AdoptionApplication;
use crate::workflows::catalog::domain::{Pet, ShelterId};

/// Query restriction derived from a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationScope {
    Unrestricted,
    Shelter(ShelterId),
    Applicant(UserId),
    Nothing,
}

impl ApplicationScope {
    pub fn for_caller(caller: &Caller) -> Self {
        match caller {
            Caller::Admin { .. } => ApplicationScope::Unrestricted,
            Caller::ShelterStaff {
                shelter_id: Some(shelter_id),
                ..
            } => ApplicationScope::Shelter(*shelter_id),
            Caller::ShelterStaff {
                shelter_id: None, ..
            } => ApplicationScope::Nothing,
            Caller::Adopter { user_id } => ApplicationScope::Applicant(*user_id),
            Caller::Unrecognized { .. } => ApplicationScope::Nothing,
        }
    }

    /// Evaluate the restriction against one application and the shelter of its pet.
    pub fn admits(&self, application: &AdoptionApplication, pet_shelter: Option<ShelterId>) -> bool {
        match self {
            ApplicationScope::Unrestricted => true,
            ApplicationScope::Shelter(shelter_id) => pet_shelter == Some(*shelter_id),
            ApplicationScope::Applicant(user_id) => application.applicant_id == *user_id,
            ApplicationScope::Nothing => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ApplicationScope::Nothing)
    }
}

/// Single-record form of [`ApplicationScope::admits`].
pub fn can_access(caller: &Caller, application: &AdoptionApplication, pet: Option<&Pet>) -> bool {
    ApplicationScope::for_caller(caller).admits(application, pet.and_then(|pet| pet.shelter_id))
}

/// Admins, or staff of the shelter that lists the pet, may approve or reject.
pub fn can_decide(caller: &Caller, pet: &Pet) -> bool {
    match caller {
        Caller::Admin { .. } => true,
        Caller::ShelterStaff {
            shelter_id: Some(shelter_id),
            ..
        } => pet.shelter_id == Some(*shelter_id),
        _ => false,
    }
}

pub fn can_delete(caller: &Caller) -> bool {
    matches!(caller, Caller::Admin { .. })
}

/// Resolve the applicant for a new submission. Adopters always apply as themselves; admins must
/// name the applicant explicitly.
pub fn submission_applicant(caller: &Caller, requested: Option<UserId>) -> Option<UserId> {
    match caller {
        Caller::Adopter { user_id } => Some(*user_id),
        Caller::Admin { .. } => requested,
        Caller::ShelterStaff { .. } | Caller::Unrecognized { .. } => None,
    }
}
