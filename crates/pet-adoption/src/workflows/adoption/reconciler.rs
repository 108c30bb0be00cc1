//! Keeps a pet's availability consistent with the applications filed against it.
//!
//! Every function here takes the caller's [`UnitOfWork`] so its writes commit or roll back
//! together with the transition that triggered them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::domain::{AdoptionApplication, ApplicationId, ApplicationStatus};
use crate::store::{StoreError, UnitOfWork};
use crate::workflows::catalog::domain::{Pet, PetId, PetStatus};

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub pet_id: PetId,
    pub previous: PetStatus,
    pub current: PetStatus,
}

impl Reconciliation {
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// Status a pet should hold given its applications. Adoption is final.
pub fn derive_status(current: PetStatus, applications: &[AdoptionApplication]) -> PetStatus {
    if current == PetStatus::Adopted {
        return PetStatus::Adopted;
    }
    if applications.iter().any(AdoptionApplication::is_pending) {
        PetStatus::Pending
    } else {
        PetStatus::Available
    }
}

/// Recompute and persist the pet's status. Running it twice writes nothing the second time.
/// Returns `None` when the pet no longer exists.
pub fn reconcile(
    unit: &mut dyn UnitOfWork,
    pet_id: PetId,
) -> Result<Option<Reconciliation>, StoreError> {
    let Some(pet) = unit.pet(pet_id)? else {
        return Ok(None);
    };
    let applications = unit.applications_for_pet(pet_id)?;
    let target = derive_status(pet.status, &applications);
    set_status(unit, pet, target).map(Some)
}

/// Mark the pet adopted and reject every other pending application for it.
pub fn settle_adoption(
    unit: &mut dyn UnitOfWork,
    pet: Pet,
    winner: ApplicationId,
    at: DateTime<Utc>,
) -> Result<(Reconciliation, Vec<ApplicationId>), StoreError> {
    let mut rejected = Vec::new();
    for mut competitor in unit.applications_for_pet(pet.id)? {
        if competitor.id == winner || !competitor.is_pending() {
            continue;
        }
        competitor.status = ApplicationStatus::Rejected;
        competitor.last_modified = Some(at);
        rejected.push(competitor.id);
        unit.put_application(competitor)?;
    }

    let reconciliation = set_status(unit, pet, PetStatus::Adopted)?;
    Ok((reconciliation, rejected))
}

fn set_status(
    unit: &mut dyn UnitOfWork,
    mut pet: Pet,
    target: PetStatus,
) -> Result<Reconciliation, StoreError> {
    let reconciliation = Reconciliation {
        pet_id: pet.id,
        previous: pet.status,
        current: target,
    };
    if reconciliation.changed() {
        debug!(
            pet = %pet.id,
            from = pet.status.label(),
            to = target.label(),
            "pet availability reconciled"
        );
        pet.status = target;
        unit.put_pet(pet)?;
    }
    Ok(reconciliation)
}
