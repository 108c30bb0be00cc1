use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{
    Page, Pet, PetChanges, PetDraft, PetId, PetQuery, PetStatus, PetView, Shelter, ShelterChanges,
    ShelterDraft, ShelterId, ShelterView,
};
use crate::cache::{CacheKey, ReadThroughCache, ResourceKind};
use crate::config::PagingConfig;
use crate::store::{EntityKind, EntityReader, EntityStore, Resource, StoreError, UnitOfWork};

const SHELTER_LISTING: &str = "all";

/// Pet listings and maintenance, served through the read-through cache.
pub struct PetCatalog<S> {
    store: Arc<S>,
    cache: Arc<ReadThroughCache>,
    paging: PagingConfig,
}

impl<S> PetCatalog<S>
where
    S: EntityStore + 'static,
{
    pub fn new(store: Arc<S>, cache: Arc<ReadThroughCache>, paging: PagingConfig) -> Self {
        Self {
            store,
            cache,
            paging,
        }
    }

    pub fn list(&self, query: &PetQuery) -> Result<Page<PetView>, CatalogError> {
        let page = query.page(&self.paging);
        let key = CacheKey::Listing(ResourceKind::Pet, query.signature(page));
        self.cache.read_through(key, || {
            self.store.read(|reader| {
                let shelters = shelter_index(reader)?;
                let matching = reader
                    .pets()?
                    .into_iter()
                    .filter(|pet| query.matches(pet))
                    .map(|pet| {
                        let shelter = pet.shelter_id.and_then(|id| shelters.get(&id));
                        PetView::new(pet, shelter)
                    })
                    .collect();
                Ok(Page::slice(matching, page))
            })
        })
    }

    pub fn get(&self, id: PetId) -> Result<PetView, CatalogError> {
        self.cache
            .read_through(CacheKey::Entity(ResourceKind::Pet, id.0), || {
                self.store.read(|reader| pet_view(reader, id))
            })
    }

    /// List a new pet. The status always starts out `Available`.
    pub fn create(&self, draft: PetDraft) -> Result<PetView, CatalogError> {
        draft.validate().map_err(CatalogError::Validation)?;

        let view = self.store.transaction(|unit| {
            let shelter = known_shelter(&*unit, draft.shelter_id)?;
            let pet = Pet {
                id: PetId(unit.allocate_id(EntityKind::Pet)?),
                name: draft.name,
                kind: draft.kind,
                breed: draft.breed,
                age: draft.age,
                description: draft.description,
                status: PetStatus::Available,
                shelter_id: draft.shelter_id,
                created_at: Utc::now(),
            };
            unit.put_pet(pet.clone())?;
            Ok::<_, CatalogError>(PetView::new(pet, shelter.as_ref()))
        })?;

        info!(pet = %view.id, kind = view.kind.label(), "pet listed");
        self.invalidate_pet(view.id);
        Ok(view)
    }

    /// Apply a partial update. An omitted shelter keeps the current one.
    pub fn update(&self, id: PetId, changes: PetChanges) -> Result<PetView, CatalogError> {
        changes.validate().map_err(CatalogError::Validation)?;

        let view = self.store.transaction(|unit| {
            let mut pet = unit
                .pet(id)?
                .ok_or(CatalogError::NotFound(Resource::Pet(id)))?;
            if changes.shelter_id.is_some() {
                known_shelter(&*unit, changes.shelter_id)?;
            }
            changes.apply_to(&mut pet);
            let shelter = match pet.shelter_id {
                Some(shelter_id) => unit.shelter(shelter_id)?,
                None => None,
            };
            unit.put_pet(pet.clone())?;
            Ok::<_, CatalogError>(PetView::new(pet, shelter.as_ref()))
        })?;

        info!(pet = %id, "pet updated");
        self.invalidate_pet(id);
        Ok(view)
    }

    /// Remove a pet together with every application filed against it.
    pub fn delete(&self, id: PetId) -> Result<(), CatalogError> {
        self.store.transaction(|unit| {
            unit.remove_pet(id)?
                .map(|_| ())
                .ok_or(CatalogError::NotFound(Resource::Pet(id)))
        })?;

        info!(pet = %id, "pet removed");
        self.invalidate_pet(id);
        Ok(())
    }

    fn invalidate_pet(&self, id: PetId) {
        self.cache.invalidate_entity(ResourceKind::Pet, id.0);
        self.cache.invalidate_listings(ResourceKind::Pet);
        // Shelter snapshots carry pet counts.
        self.cache.invalidate_kind(ResourceKind::Shelter);
    }
}

/// Shelter maintenance, served through the same cache as the pet catalog.
pub struct ShelterDirectory<S> {
    store: Arc<S>,
    cache: Arc<ReadThroughCache>,
}

impl<S> ShelterDirectory<S>
where
    S: EntityStore + 'static,
{
    pub fn new(store: Arc<S>, cache: Arc<ReadThroughCache>) -> Self {
        Self { store, cache }
    }

    pub fn list(&self) -> Result<Vec<ShelterView>, CatalogError> {
        let key = CacheKey::Listing(ResourceKind::Shelter, SHELTER_LISTING.to_string());
        self.cache.read_through(key, || {
            self.store.read(|reader| {
                let counts = pet_counts(reader)?;
                Ok(reader
                    .shelters()?
                    .into_iter()
                    .map(|shelter| {
                        let count = counts.get(&shelter.id).copied().unwrap_or(0);
                        ShelterView::new(shelter, count)
                    })
                    .collect())
            })
        })
    }

    pub fn get(&self, id: ShelterId) -> Result<ShelterView, CatalogError> {
        self.cache
            .read_through(CacheKey::Entity(ResourceKind::Shelter, id.0), || {
                self.store.read(|reader| {
                    let shelter = reader
                        .shelter(id)?
                        .ok_or(CatalogError::NotFound(Resource::Shelter(id)))?;
                    let count = pet_counts(reader)?.get(&id).copied().unwrap_or(0);
                    Ok(ShelterView::new(shelter, count))
                })
            })
    }

    pub fn create(&self, draft: ShelterDraft) -> Result<ShelterView, CatalogError> {
        draft.validate().map_err(CatalogError::Validation)?;

        let shelter = self.store.transaction(|unit| {
            let shelter = Shelter {
                id: ShelterId(unit.allocate_id(EntityKind::Shelter)?),
                name: draft.name,
                address: draft.address,
                phone: draft.phone,
                email: draft.email,
            };
            unit.put_shelter(shelter.clone())?;
            Ok::<_, CatalogError>(shelter)
        })?;

        info!(shelter = %shelter.id, "shelter registered");
        self.invalidate_shelter(shelter.id);
        Ok(ShelterView::new(shelter, 0))
    }

    pub fn update(&self, id: ShelterId, changes: ShelterChanges) -> Result<ShelterView, CatalogError> {
        changes.validate().map_err(CatalogError::Validation)?;

        let view = self.store.transaction(|unit| {
            let mut shelter = unit
                .shelter(id)?
                .ok_or(CatalogError::NotFound(Resource::Shelter(id)))?;
            changes.apply_to(&mut shelter);
            unit.put_shelter(shelter.clone())?;
            let count = pet_counts(&*unit)?.get(&id).copied().unwrap_or(0);
            Ok::<_, CatalogError>(ShelterView::new(shelter, count))
        })?;

        info!(shelter = %id, "shelter updated");
        self.invalidate_shelter(id);
        Ok(view)
    }

    /// Remove a shelter. Its pets stay listed without a shelter.
    pub fn delete(&self, id: ShelterId) -> Result<(), CatalogError> {
        self.store.transaction(|unit| {
            unit.remove_shelter(id)?
                .map(|_| ())
                .ok_or(CatalogError::NotFound(Resource::Shelter(id)))
        })?;

        info!(shelter = %id, "shelter removed");
        self.invalidate_shelter(id);
        Ok(())
    }

    fn invalidate_shelter(&self, id: ShelterId) {
        self.cache.invalidate_entity(ResourceKind::Shelter, id.0);
        self.cache.invalidate_listings(ResourceKind::Shelter);
        // Pet snapshots embed the shelter name.
        self.cache.invalidate_kind(ResourceKind::Pet);
    }
}

fn pet_view<R>(reader: &R, id: PetId) -> Result<PetView, CatalogError>
where
    R: EntityReader + ?Sized,
{
    let pet = reader
        .pet(id)?
        .ok_or(CatalogError::NotFound(Resource::Pet(id)))?;
    let shelter = match pet.shelter_id {
        Some(shelter_id) => reader.shelter(shelter_id)?,
        None => None,
    };
    Ok(PetView::new(pet, shelter.as_ref()))
}

fn known_shelter<R>(reader: &R, shelter_id: Option<ShelterId>) -> Result<Option<Shelter>, CatalogError>
where
    R: EntityReader + ?Sized,
{
    match shelter_id {
        Some(id) => reader
            .shelter(id)?
            .map(Some)
            .ok_or_else(|| CatalogError::Validation(format!("{id} does not exist"))),
        None => Ok(None),
    }
}

fn shelter_index<R>(reader: &R) -> Result<HashMap<ShelterId, Shelter>, StoreError>
where
    R: EntityReader + ?Sized,
{
    Ok(reader
        .shelters()?
        .into_iter()
        .map(|shelter| (shelter.id, shelter))
        .collect())
}

fn pet_counts<R>(reader: &R) -> Result<HashMap<ShelterId, u64>, StoreError>
where
    R: EntityReader + ?Sized,
{
    let mut counts = HashMap::new();
    for pet in reader.pets()? {
        if let Some(shelter_id) = pet.shelter_id {
            *counts.entry(shelter_id).or_insert(0) += 1;
        }
    }
    Ok(counts)
}

/// Error raised by the pet catalog and shelter directory.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{0} not found")]
    NotFound(Resource),
    #[error("{0}")]
    Validation(String),
    #[error("caller may not modify the catalog")]
    Forbidden,
    #[error(transparent)]
    Store(#[from] StoreError),
}
