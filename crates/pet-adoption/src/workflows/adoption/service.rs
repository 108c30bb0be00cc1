use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::domain::{
    AdoptionApplication, ApplicationChanges, ApplicationFilter, ApplicationId, ApplicationRevision,
    ApplicationStatus, ApplicationSubmission, ApplicationView,
};
use super::reconciler::{self, Reconciliation};
use crate::access::{can_access, can_decide, can_delete, submission_applicant, ApplicationScope, Caller};
use crate::cache::{ReadThroughCache, ResourceKind};
use crate::store::{EntityKind, EntityReader, EntityStore, Resource, StoreError, UnitOfWork};
use crate::workflows::catalog::domain::{Pet, PetId, PetStatus};

/// Application lifecycle: intake, edits, decisions and withdrawal.
///
/// Each command runs inside one store transaction together with its availability
/// reconciliation. The workflow never reads through the cache; it only invalidates pet
/// snapshots after a commit that changed a pet's status.
pub struct AdoptionWorkflow<S> {
    store: Arc<S>,
    cache: Arc<ReadThroughCache>,
}

/// Result of an approve or reject command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub application: ApplicationView,
    pub pet: Reconciliation,
    /// Competing applications closed by an approval.
    pub rejected: Vec<ApplicationId>,
}

impl<S> AdoptionWorkflow<S>
where
    S: EntityStore + 'static,
{
    pub fn new(store: Arc<S>, cache: Arc<ReadThroughCache>) -> Self {
        Self { store, cache }
    }

    /// File a new application against an available pet and move the pet to pending.
    pub fn submit(
        &self,
        caller: &Caller,
        submission: ApplicationSubmission,
    ) -> Result<ApplicationView, AdoptionError> {
        let applicant = submission_applicant(caller, submission.applicant_id)
            .ok_or(AdoptionError::Forbidden)?;
        submission.validate().map_err(AdoptionError::Validation)?;

        let (view, reconciliation) = self.store.transaction(|unit| {
            let pet = unit
                .pet(submission.pet_id)?
                .ok_or(AdoptionError::NotFound(Resource::Pet(submission.pet_id)))?;
            if unit.user(applicant)?.is_none() {
                return Err(AdoptionError::NotFound(Resource::User(applicant)));
            }
            if pet.status != PetStatus::Available {
                return Err(AdoptionError::Conflict(format!(
                    "{} is {} and not accepting applications",
                    pet.id,
                    pet.status.label()
                )));
            }

            let application = AdoptionApplication {
                id: ApplicationId(unit.allocate_id(EntityKind::Application)?),
                pet_id: pet.id,
                applicant_id: applicant,
                contact: submission.contact,
                notes: submission.notes,
                status: ApplicationStatus::Pending,
                submitted_at: Utc::now(),
                last_modified: None,
            };
            unit.put_application(application.clone())?;
            let reconciliation = reconciler::reconcile(unit, pet.id)?;
            Ok((ApplicationView::new(application, Some(&pet)), reconciliation))
        })?;

        info!(
            application = %view.id,
            pet = %view.pet_id,
            applicant = %view.applicant_id,
            "adoption application submitted"
        );
        self.invalidate(reconciliation.as_ref());
        Ok(view)
    }

    pub fn get(&self, caller: &Caller, id: ApplicationId) -> Result<ApplicationView, AdoptionError> {
        self.store.read(|reader| {
            let (application, pet) = load(reader, id)?;
            if !can_access(caller, &application, Some(&pet)) {
                return Err(AdoptionError::Forbidden);
            }
            Ok(ApplicationView::new(application, Some(&pet)))
        })
    }

    /// Every application the caller may see, narrowed by `filter`.
    pub fn list(
        &self,
        caller: &Caller,
        filter: &ApplicationFilter,
    ) -> Result<Vec<ApplicationView>, AdoptionError> {
        let scope = ApplicationScope::for_caller(caller);
        if scope.is_empty() {
            return Ok(Vec::new());
        }

        self.store.read(|reader| {
            let pets: HashMap<PetId, Pet> = reader
                .pets()?
                .into_iter()
                .map(|pet| (pet.id, pet))
                .collect();
            Ok(reader
                .applications()?
                .into_iter()
                .filter(|application| filter.matches(application))
                .filter(|application| {
                    let shelter = pets
                        .get(&application.pet_id)
                        .and_then(|pet| pet.shelter_id);
                    scope.admits(application, shelter)
                })
                .map(|application| {
                    let pet = pets.get(&application.pet_id);
                    ApplicationView::new(application, pet)
                })
                .collect())
        })
    }

    pub fn list_by_status(
        &self,
        caller: &Caller,
        status: ApplicationStatus,
    ) -> Result<Vec<ApplicationView>, AdoptionError> {
        let filter = ApplicationFilter {
            status: Some(status),
            ..ApplicationFilter::default()
        };
        self.list(caller, &filter)
    }

    /// Applications the caller filed themselves.
    pub fn list_mine(&self, caller: &Caller) -> Result<Vec<ApplicationView>, AdoptionError> {
        let filter = ApplicationFilter {
            applicant_id: Some(caller.user_id().0),
            ..ApplicationFilter::default()
        };
        self.list(caller, &filter)
    }

    /// Applications filed against one pet. Limited to callers who may decide on them.
    pub fn list_for_pet(
        &self,
        caller: &Caller,
        pet_id: PetId,
    ) -> Result<Vec<ApplicationView>, AdoptionError> {
        self.store.read(|reader| {
            let pet = reader
                .pet(pet_id)?
                .ok_or(AdoptionError::NotFound(Resource::Pet(pet_id)))?;
            if !can_decide(caller, &pet) {
                return Err(AdoptionError::Forbidden);
            }
            Ok(reader
                .applications_for_pet(pet_id)?
                .into_iter()
                .map(|application| ApplicationView::new(application, Some(&pet)))
                .collect())
        })
    }

    /// Whether the caller holds decision authority over the application's pet.
    pub fn may_decide(&self, caller: &Caller, id: ApplicationId) -> Result<bool, AdoptionError> {
        self.store.read(|reader| {
            let (_, pet) = load(reader, id)?;
            Ok(can_decide(caller, &pet))
        })
    }

    /// Edit contact details or notes. Never changes the status.
    pub fn update_fields(
        &self,
        caller: &Caller,
        id: ApplicationId,
        changes: ApplicationChanges,
    ) -> Result<ApplicationView, AdoptionError> {
        self.revise(
            caller,
            id,
            ApplicationRevision {
                changes,
                status: None,
            },
        )
    }

    /// Field edits plus an optional decision, committed as one unit.
    pub fn revise(
        &self,
        caller: &Caller,
        id: ApplicationId,
        revision: ApplicationRevision,
    ) -> Result<ApplicationView, AdoptionError> {
        revision.changes.validate().map_err(AdoptionError::Validation)?;

        let (view, reconciliation) = self.store.transaction(|unit| {
            let (mut application, pet) = load(&*unit, id)?;
            if !can_access(caller, &application, Some(&pet)) {
                return Err(AdoptionError::Forbidden);
            }
            let now = Utc::now();
            revision.changes.apply_to(&mut application);
            application.last_modified = Some(now);

            match revision.status {
                None => {
                    unit.put_application(application.clone())?;
                    Ok((ApplicationView::new(application, Some(&pet)), None))
                }
                Some(ApplicationStatus::Pending) => {
                    if application.status.is_terminal() {
                        return Err(AdoptionError::InvalidTransition {
                            id,
                            from: application.status,
                            to: ApplicationStatus::Pending,
                        });
                    }
                    unit.put_application(application.clone())?;
                    Ok((ApplicationView::new(application, Some(&pet)), None))
                }
                Some(target) => {
                    let decision = apply_decision(unit, caller, application, pet, target, now)?;
                    Ok((decision.application, Some(decision.pet)))
                }
            }
        })?;

        info!(application = %id, status = view.status.label(), "adoption application revised");
        self.invalidate(reconciliation.as_ref());
        Ok(view)
    }

    /// Approve one application, adopt the pet out and close every competing application.
    pub fn approve(&self, caller: &Caller, id: ApplicationId) -> Result<Decision, AdoptionError> {
        self.decide(caller, id, ApplicationStatus::Approved)
    }

    /// Reject one application and release the pet if nothing else is pending.
    pub fn reject(&self, caller: &Caller, id: ApplicationId) -> Result<Decision, AdoptionError> {
        self.decide(caller, id, ApplicationStatus::Rejected)
    }

    fn decide(
        &self,
        caller: &Caller,
        id: ApplicationId,
        target: ApplicationStatus,
    ) -> Result<Decision, AdoptionError> {
        let decision = self.store.transaction(|unit| {
            let (application, pet) = load(&*unit, id)?;
            apply_decision(unit, caller, application, pet, target, Utc::now())
        })?;

        info!(
            application = %id,
            decision = target.label(),
            pet = %decision.pet.pet_id,
            pet_status = decision.pet.current.label(),
            closed = decision.rejected.len(),
            "adoption application decided"
        );
        self.invalidate(Some(&decision.pet));
        Ok(decision)
    }

    /// Remove an application outright. Withdrawing the last pending application frees the pet.
    pub fn delete(
        &self,
        caller: &Caller,
        id: ApplicationId,
    ) -> Result<Option<Reconciliation>, AdoptionError> {
        if !can_delete(caller) {
            return Err(AdoptionError::Forbidden);
        }

        let reconciliation = self.store.transaction(|unit| {
            let removed = unit
                .remove_application(id)?
                .ok_or(AdoptionError::NotFound(Resource::Application(id)))?;
            if !removed.is_pending() {
                return Ok::<_, AdoptionError>(None);
            }
            Ok(reconciler::reconcile(unit, removed.pet_id)?)
        })?;

        info!(application = %id, "adoption application deleted");
        self.invalidate(reconciliation.as_ref());
        Ok(reconciliation)
    }

    /// Re-derive a pet's availability from its applications.
    pub fn reconcile(&self, pet_id: PetId) -> Result<Reconciliation, AdoptionError> {
        let reconciliation = self.store.transaction(|unit| {
            reconciler::reconcile(unit, pet_id)?
                .ok_or(AdoptionError::NotFound(Resource::Pet(pet_id)))
        })?;
        self.invalidate(Some(&reconciliation));
        Ok(reconciliation)
    }

    fn invalidate(&self, reconciliation: Option<&Reconciliation>) {
        if let Some(reconciliation) = reconciliation.filter(|r| r.changed()) {
            self.cache
                .invalidate_entity(ResourceKind::Pet, reconciliation.pet_id.0);
            self.cache.invalidate_listings(ResourceKind::Pet);
        }
    }
}

fn load<R>(reader: &R, id: ApplicationId) -> Result<(AdoptionApplication, Pet), AdoptionError>
where
    R: EntityReader + ?Sized,
{
    let application = reader
        .application(id)?
        .ok_or(AdoptionError::NotFound(Resource::Application(id)))?;
    let pet = reader
        .pet(application.pet_id)?
        .ok_or(AdoptionError::NotFound(Resource::Pet(application.pet_id)))?;
    Ok((application, pet))
}

fn apply_decision(
    unit: &mut dyn UnitOfWork,
    caller: &Caller,
    mut application: AdoptionApplication,
    pet: Pet,
    target: ApplicationStatus,
    at: DateTime<Utc>,
) -> Result<Decision, AdoptionError> {
    if !can_decide(caller, &pet) {
        return Err(AdoptionError::Forbidden);
    }
    if application.status.is_terminal() {
        return Err(AdoptionError::InvalidTransition {
            id: application.id,
            from: application.status,
            to: target,
        });
    }

    application.status = target;
    application.last_modified = Some(at);
    unit.put_application(application.clone())?;

    let (reconciliation, rejected) = match target {
        ApplicationStatus::Approved => {
            reconciler::settle_adoption(unit, pet.clone(), application.id, at)?
        }
        _ => {
            let reconciliation = reconciler::reconcile(unit, pet.id)?
                .ok_or(AdoptionError::NotFound(Resource::Pet(pet.id)))?;
            (reconciliation, Vec::new())
        }
    };

    Ok(Decision {
        application: ApplicationView::new(application, Some(&pet)),
        pet: reconciliation,
        rejected,
    })
}

/// Error raised by the adoption workflow.
#[derive(Debug, thiserror::Error)]
pub enum AdoptionError {
    #[error("{0} not found")]
    NotFound(Resource),
    #[error("{0}")]
    Conflict(String),
    #[error("{id} is {} and cannot become {}", .from.label(), .to.label())]
    InvalidTransition {
        id: ApplicationId,
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
    #[error("caller may not perform this action on the application")]
    Forbidden,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}
