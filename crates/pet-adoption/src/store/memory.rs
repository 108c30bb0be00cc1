use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::{EntityKind, EntityReader, EntityStore, StoreError, UnitOfWork};
use crate::access::{User, UserId};
use crate::workflows::adoption::domain::{AdoptionApplication, ApplicationId};
use crate::workflows::catalog::domain::{Pet, PetId, Shelter, ShelterId};

#[derive(Debug, Clone, Default)]
struct Sequences {
    pets: u64,
    shelters: u64,
    users: u64,
    applications: u64,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    pets: BTreeMap<PetId, Pet>,
    shelters: BTreeMap<ShelterId, Shelter>,
    users: BTreeMap<UserId, User>,
    applications: BTreeMap<ApplicationId, AdoptionApplication>,
    sequences: Sequences,
}

/// Process-local store. Transactions are serialized on a single lock and applied to a working
/// copy that replaces the committed tables only when the body succeeds.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl EntityStore for MemoryStore {
    fn read<T, E>(&self, query: impl FnOnce(&dyn EntityReader) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let guard = self.lock()?;
        query(&*guard)
    }

    fn transaction<T, E>(
        &self,
        work: impl FnOnce(&mut dyn UnitOfWork) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let mut guard = self.lock()?;
        let mut working = guard.clone();
        let outcome = work(&mut working)?;
        *guard = working;
        Ok(outcome)
    }
}

impl EntityReader for Tables {
    fn pet(&self, id: PetId) -> Result<Option<Pet>, StoreError> {
        Ok(self.pets.get(&id).cloned())
    }

    fn pets(&self) -> Result<Vec<Pet>, StoreError> {
        Ok(self.pets.values().cloned().collect())
    }

    fn shelter(&self, id: ShelterId) -> Result<Option<Shelter>, StoreError> {
        Ok(self.shelters.get(&id).cloned())
    }

    fn shelters(&self) -> Result<Vec<Shelter>, StoreError> {
        Ok(self.shelters.values().cloned().collect())
    }

    fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(&id).cloned())
    }

    fn application(&self, id: ApplicationId) -> Result<Option<AdoptionApplication>, StoreError> {
        Ok(self.applications.get(&id).cloned())
    }

    fn applications(&self) -> Result<Vec<AdoptionApplication>, StoreError> {
        Ok(self.applications.values().cloned().collect())
    }

    fn applications_for_pet(
        &self,
        pet_id: PetId,
    ) -> Result<Vec<AdoptionApplication>, StoreError> {
        Ok(self
            .applications
            .values()
            .filter(|application| application.pet_id == pet_id)
            .cloned()
            .collect())
    }
}

impl UnitOfWork for Tables {
    fn allocate_id(&mut self, kind: EntityKind) -> Result<u64, StoreError> {
        let sequence = match kind {
            EntityKind::Pet => &mut self.sequences.pets,
            EntityKind::Shelter => &mut self.sequences.shelters,
            EntityKind::User => &mut self.sequences.users,
            EntityKind::Application => &mut self.sequences.applications,
        };
        *sequence = sequence
            .checked_add(1)
            .ok_or_else(|| StoreError::Unavailable(format!("{kind:?} sequence exhausted")))?;
        Ok(*sequence)
    }

    fn put_pet(&mut self, pet: Pet) -> Result<(), StoreError> {
        self.pets.insert(pet.id, pet);
        Ok(())
    }

    fn remove_pet(&mut self, id: PetId) -> Result<Option<Pet>, StoreError> {
        let removed = self.pets.remove(&id);
        if removed.is_some() {
            self.applications
                .retain(|_, application| application.pet_id != id);
        }
        Ok(removed)
    }

    fn put_shelter(&mut self, shelter: Shelter) -> Result<(), StoreError> {
        self.shelters.insert(shelter.id, shelter);
        Ok(())
    }

    fn remove_shelter(&mut self, id: ShelterId) -> Result<Option<Shelter>, StoreError> {
        let removed = self.shelters.remove(&id);
        if removed.is_some() {
            for pet in self.pets.values_mut() {
                if pet.shelter_id == Some(id) {
                    pet.shelter_id = None;
                }
            }
        }
        Ok(removed)
    }

    fn put_user(&mut self, user: User) -> Result<(), StoreError> {
        self.users.insert(user.id, user);
        Ok(())
    }

    fn put_application(&mut self, application: AdoptionApplication) -> Result<(), StoreError> {
        if !self.pets.contains_key(&application.pet_id) {
            return Err(StoreError::NotFound(application.pet_id.to_string()));
        }
        self.applications.insert(application.id, application);
        Ok(())
    }

    fn remove_application(
        &mut self,
        id: ApplicationId,
    ) -> Result<Option<AdoptionApplication>, StoreError> {
        Ok(self.applications.remove(&id))
    }
}
