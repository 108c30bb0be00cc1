//! Entity storage seam shared by the catalog and adoption workflows.
//!
//! Reads go through [`EntityReader`]; writes happen inside [`EntityStore::transaction`], whose
//! closure receives a [`UnitOfWork`]. Everything written through one unit commits together or
//! not at all, and implementations must serialize units that touch the same pet.

pub mod memory;

use std::fmt;

use chrono::Utc;

use crate::access::{User, UserDraft, UserId};
use crate::workflows::adoption::domain::{AdoptionApplication, ApplicationId};
use crate::workflows::catalog::domain::{Pet, PetId, Shelter, ShelterId};

pub use memory::MemoryStore;

/// Error enumeration for storage failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists: {0}")]
    Conflict(String),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Tables that draw identifiers from the store's sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Pet,
    Shelter,
    User,
    Application,
}

/// Reference to a concrete row, used in not-found outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Pet(PetId),
    Shelter(ShelterId),
    User(UserId),
    Application(ApplicationId),
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Pet(id) => write!(f, "{id}"),
            Resource::Shelter(id) => write!(f, "{id}"),
            Resource::User(id) => write!(f, "{id}"),
            Resource::Application(id) => write!(f, "{id}"),
        }
    }
}

pub trait EntityReader {
    fn pet(&self, id: PetId) -> Result<Option<Pet>, StoreError>;
    fn pets(&self) -> Result<Vec<Pet>, StoreError>;
    fn shelter(&self, id: ShelterId) -> Result<Option<Shelter>, StoreError>;
    fn shelters(&self) -> Result<Vec<Shelter>, StoreError>;
    fn user(&self, id: UserId) -> Result<Option<User>, StoreError>;
    fn application(&self, id: ApplicationId) -> Result<Option<AdoptionApplication>, StoreError>;
    fn applications(&self) -> Result<Vec<AdoptionApplication>, StoreError>;
    fn applications_for_pet(&self, pet_id: PetId)
        -> Result<Vec<AdoptionApplication>, StoreError>;
}

/// Mutable view handed to a transaction body.
pub trait UnitOfWork: EntityReader {
    fn allocate_id(&mut self, kind: EntityKind) -> Result<u64, StoreError>;
    fn put_pet(&mut self, pet: Pet) -> Result<(), StoreError>;
    /// Removes the pet together with every application filed against it.
    fn remove_pet(&mut self, id: PetId) -> Result<Option<Pet>, StoreError>;
    fn put_shelter(&mut self, shelter: Shelter) -> Result<(), StoreError>;
    /// Removes the shelter and clears the shelter reference of the pets it listed.
    fn remove_shelter(&mut self, id: ShelterId) -> Result<Option<Shelter>, StoreError>;
    fn put_user(&mut self, user: User) -> Result<(), StoreError>;
    fn put_application(&mut self, application: AdoptionApplication) -> Result<(), StoreError>;
    fn remove_application(
        &mut self,
        id: ApplicationId,
    ) -> Result<Option<AdoptionApplication>, StoreError>;
}

/// Storage abstraction so workflows can be exercised against any transactional backend.
pub trait EntityStore: Send + Sync {
    fn read<T, E>(&self, query: impl FnOnce(&dyn EntityReader) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>;

    /// Run `work` atomically. An `Err` from the closure discards every write it made.
    fn transaction<T, E>(
        &self,
        work: impl FnOnce(&mut dyn UnitOfWork) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>;
}

/// Persist an account handed over by the authentication service.
pub fn register_user<S>(store: &S, draft: UserDraft) -> Result<User, StoreError>
where
    S: EntityStore,
{
    store.transaction(|unit| {
        if let Some(shelter_id) = draft.shelter_id {
            if unit.shelter(shelter_id)?.is_none() {
                return Err(StoreError::NotFound(shelter_id.to_string()));
            }
        }
        let user = User {
            id: UserId(unit.allocate_id(EntityKind::User)?),
            username: draft.username,
            email: draft.email,
            role: draft.role,
            shelter_id: draft.shelter_id,
            created_at: Utc::now(),
        };
        unit.put_user(user.clone())?;
        Ok(user)
    })
}
