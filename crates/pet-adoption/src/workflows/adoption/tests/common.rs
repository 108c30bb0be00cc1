use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::access::identity::{ROLE_HEADER, SHELTER_ID_HEADER, USER_ID_HEADER};
use crate::access::{Caller, User, UserDraft, UserId, UserRole};
use crate::cache::ReadThroughCache;
use crate::config::PagingConfig;
use crate::store::{
    register_user, EntityKind, EntityReader, EntityStore, MemoryStore, StoreError, UnitOfWork,
};
use crate::workflows::adoption::domain::{
    AdoptionApplication, ApplicantContact, ApplicationId, ApplicationStatus,
    ApplicationSubmission,
};
use crate::workflows::adoption::reconciler;
use crate::workflows::adoption::AdoptionWorkflow;
use crate::workflows::catalog::domain::{
    Pet, PetDraft, PetId, PetKind, PetStatus, Shelter, ShelterDraft, ShelterId,
};
use crate::workflows::catalog::{PetCatalog, ShelterDirectory};

/// A shelter with one listed pet, a second shelter, and a workflow over a shared cache.
pub(super) struct Fixture<S> {
    pub(super) store: Arc<S>,
    pub(super) cache: Arc<ReadThroughCache>,
    pub(super) workflow: Arc<AdoptionWorkflow<S>>,
    pub(super) catalog: Arc<PetCatalog<S>>,
    pub(super) shelter: ShelterId,
    pub(super) other_shelter: ShelterId,
    pub(super) pet: PetId,
}

pub(super) fn fixture() -> Fixture<MemoryStore> {
    fixture_with(MemoryStore::new())
}

pub(super) fn fixture_with<S>(store: S) -> Fixture<S>
where
    S: EntityStore + 'static,
{
    let store = Arc::new(store);
    let cache = Arc::new(ReadThroughCache::new());
    let shelters = ShelterDirectory::new(store.clone(), cache.clone());
    let catalog = Arc::new(PetCatalog::new(
        store.clone(),
        cache.clone(),
        PagingConfig::default(),
    ));

    let shelter = shelters
        .create(ShelterDraft {
            name: "Harbor Rescue".to_string(),
            address: "200 Harbor Way".to_string(),
            phone: None,
            email: None,
        })
        .expect("shelter created")
        .id;
    let other_shelter = shelters
        .create(ShelterDraft {
            name: "Hillside Humane".to_string(),
            address: "5 Ridge Rd".to_string(),
            phone: None,
            email: None,
        })
        .expect("shelter created")
        .id;
    let pet = catalog
        .create(PetDraft {
            name: "Biscuit".to_string(),
            kind: PetKind::Dog,
            breed: "Beagle".to_string(),
            age: 3,
            description: None,
            shelter_id: Some(shelter),
        })
        .expect("pet created")
        .id;

    Fixture {
        workflow: Arc::new(AdoptionWorkflow::new(store.clone(), cache.clone())),
        store,
        cache,
        catalog,
        shelter,
        other_shelter,
        pet,
    }
}

impl<S> Fixture<S>
where
    S: EntityStore + 'static,
{
    pub(super) fn register(&self, username: &str, role: UserRole, shelter: Option<ShelterId>) -> User {
        register_user(
            self.store.as_ref(),
            UserDraft {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                role,
                shelter_id: shelter,
            },
        )
        .expect("user registered")
    }

    pub(super) fn adopter(&self, username: &str) -> Caller {
        Caller::for_user(&self.register(username, UserRole::Adopter, None))
    }

    pub(super) fn staff(&self) -> Caller {
        Caller::for_user(&self.register("harbor-staff", UserRole::ShelterStaff, Some(self.shelter)))
    }

    pub(super) fn outside_staff(&self) -> Caller {
        Caller::for_user(&self.register(
            "hillside-staff",
            UserRole::ShelterStaff,
            Some(self.other_shelter),
        ))
    }

    pub(super) fn admin(&self) -> Caller {
        Caller::for_user(&self.register("admin", UserRole::Admin, None))
    }

    pub(super) fn pet(&self) -> Pet {
        self.store
            .read(|reader| reader.pet(self.pet))
            .expect("read")
            .expect("pet present")
    }

    pub(super) fn pet_status(&self) -> PetStatus {
        self.pet().status
    }

    pub(super) fn stored(&self, id: ApplicationId) -> AdoptionApplication {
        self.store
            .read(|reader| reader.application(id))
            .expect("read")
            .expect("application present")
    }

    /// Insert pending applications directly, bypassing intake's availability check, the way
    /// several concurrent intakes would have left the pet.
    pub(super) fn seed_pending(&self, applicants: &[&Caller]) -> Vec<ApplicationId> {
        self.store
            .transaction(|unit| {
                let mut ids = Vec::new();
                for applicant in applicants {
                    let id = ApplicationId(unit.allocate_id(EntityKind::Application)?);
                    unit.put_application(pending_application(id, self.pet, applicant.user_id()))?;
                    ids.push(id);
                }
                reconciler::reconcile(unit, self.pet)?;
                Ok::<_, StoreError>(ids)
            })
            .expect("seeded")
    }
}

pub(super) fn contact(name: &str) -> ApplicantContact {
    ApplicantContact {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        phone: "555-0142".to_string(),
        address: "18 Willow Ln".to_string(),
    }
}

pub(super) fn submission(pet: PetId) -> ApplicationSubmission {
    ApplicationSubmission {
        pet_id: pet,
        applicant_id: None,
        contact: contact("Dana Cruz"),
        notes: Some("Fenced yard, works from home".to_string()),
    }
}

pub(super) fn pending_application(
    id: ApplicationId,
    pet: PetId,
    applicant: UserId,
) -> AdoptionApplication {
    AdoptionApplication {
        id,
        pet_id: pet,
        applicant_id: applicant,
        contact: contact("Dana Cruz"),
        notes: None,
        status: ApplicationStatus::Pending,
        submitted_at: Utc::now(),
        last_modified: None,
    }
}

/// Memory store whose units refuse pet writes once armed, to exercise rollback of a
/// decision whose reconciliation fails.
#[derive(Default)]
pub(super) struct PetWriteFailureStore {
    inner: MemoryStore,
    armed: AtomicBool,
}

impl PetWriteFailureStore {
    pub(super) fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

impl EntityStore for PetWriteFailureStore {
    fn read<T, E>(&self, query: impl FnOnce(&dyn EntityReader) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        self.inner.read(query)
    }

    fn transaction<T, E>(
        &self,
        work: impl FnOnce(&mut dyn UnitOfWork) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let armed = self.armed.load(Ordering::SeqCst);
        self.inner.transaction(|unit| {
            if !armed {
                return work(unit);
            }
            let mut guarded = RefusePetWrites { inner: unit };
            work(&mut guarded)
        })
    }
}

struct RefusePetWrites<'a> {
    inner: &'a mut dyn UnitOfWork,
}

impl EntityReader for RefusePetWrites<'_> {
    fn pet(&self, id: PetId) -> Result<Option<Pet>, StoreError> {
        self.inner.pet(id)
    }

    fn pets(&self) -> Result<Vec<Pet>, StoreError> {
        self.inner.pets()
    }

    fn shelter(&self, id: ShelterId) -> Result<Option<Shelter>, StoreError> {
        self.inner.shelter(id)
    }

    fn shelters(&self) -> Result<Vec<Shelter>, StoreError> {
        self.inner.shelters()
    }

    fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.inner.user(id)
    }

    fn application(&self, id: ApplicationId) -> Result<Option<AdoptionApplication>, StoreError> {
        self.inner.application(id)
    }

    fn applications(&self) -> Result<Vec<AdoptionApplication>, StoreError> {
        self.inner.applications()
    }

    fn applications_for_pet(
        &self,
        pet_id: PetId,
    ) -> Result<Vec<AdoptionApplication>, StoreError> {
        self.inner.applications_for_pet(pet_id)
    }
}

impl UnitOfWork for RefusePetWrites<'_> {
    fn allocate_id(&mut self, kind: EntityKind) -> Result<u64, StoreError> {
        self.inner.allocate_id(kind)
    }

    fn put_pet(&mut self, _pet: Pet) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("pet table locked".to_string()))
    }

    fn remove_pet(&mut self, id: PetId) -> Result<Option<Pet>, StoreError> {
        self.inner.remove_pet(id)
    }

    fn put_shelter(&mut self, shelter: Shelter) -> Result<(), StoreError> {
        self.inner.put_shelter(shelter)
    }

    fn remove_shelter(&mut self, id: ShelterId) -> Result<Option<Shelter>, StoreError> {
        self.inner.remove_shelter(id)
    }

    fn put_user(&mut self, user: User) -> Result<(), StoreError> {
        self.inner.put_user(user)
    }

    fn put_application(&mut self, application: AdoptionApplication) -> Result<(), StoreError> {
        self.inner.put_application(application)
    }

    fn remove_application(
        &mut self,
        id: ApplicationId,
    ) -> Result<Option<AdoptionApplication>, StoreError> {
        self.inner.remove_application(id)
    }
}

pub(super) fn request(method: &str, uri: &str, caller: Option<&Caller>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        builder = builder.header(USER_ID_HEADER, caller.user_id().0.to_string());
        if let Some(role) = caller.role() {
            builder = builder.header(ROLE_HEADER, role.label());
        }
        if let Caller::ShelterStaff {
            shelter_id: Some(shelter_id),
            ..
        } = caller
        {
            builder = builder.header(SHELTER_ID_HEADER, shelter_id.0.to_string());
        }
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
