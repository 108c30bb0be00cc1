use metrics_exporter_prometheus::PrometheusHandle;
use pet_adoption::access::{User, UserDraft, UserRole};
use pet_adoption::cache::ReadThroughCache;
use pet_adoption::config::{CacheConfig, PagingConfig};
use pet_adoption::error::AppError;
use pet_adoption::store::{register_user, EntityStore, MemoryStore};
use pet_adoption::workflows::adoption::AdoptionWorkflow;
use pet_adoption::workflows::catalog::{
    PetCatalog, PetDraft, PetKind, PetView, ShelterDirectory, ShelterDraft, ShelterView,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// The services behind the public routers, sharing one store and one cache.
pub(crate) struct Marketplace<S> {
    pub(crate) store: Arc<S>,
    pub(crate) cache: Arc<ReadThroughCache>,
    pub(crate) pets: Arc<PetCatalog<S>>,
    pub(crate) shelters: Arc<ShelterDirectory<S>>,
    pub(crate) applications: Arc<AdoptionWorkflow<S>>,
}

impl<S> Marketplace<S>
where
    S: EntityStore + 'static,
{
    pub(crate) fn new(store: S, cache: ReadThroughCache, paging: PagingConfig) -> Self {
        let store = Arc::new(store);
        let cache = Arc::new(cache);
        Self {
            pets: Arc::new(PetCatalog::new(store.clone(), cache.clone(), paging)),
            shelters: Arc::new(ShelterDirectory::new(store.clone(), cache.clone())),
            applications: Arc::new(AdoptionWorkflow::new(store.clone(), cache.clone())),
            store,
            cache,
        }
    }
}

pub(crate) fn in_memory_marketplace(
    cache: &CacheConfig,
    paging: PagingConfig,
) -> Marketplace<MemoryStore> {
    Marketplace::new(
        MemoryStore::new(),
        ReadThroughCache::from_config(cache),
        paging,
    )
}

/// Accounts and listings created by [`seed_demo_data`].
pub(crate) struct DemoSeed {
    pub(crate) admin: User,
    pub(crate) staff: User,
    pub(crate) adopters: Vec<User>,
    pub(crate) shelter: ShelterView,
    pub(crate) pets: Vec<PetView>,
}

const DEMO_ADOPTERS: [&str; 3] = ["dana", "riley", "sam"];

pub(crate) fn seed_demo_data<S>(marketplace: &Marketplace<S>) -> Result<DemoSeed, AppError>
where
    S: EntityStore + 'static,
{
    let shelter = marketplace.shelters.create(ShelterDraft {
        name: "Harbor Rescue".to_string(),
        address: "200 Harbor Way".to_string(),
        phone: Some("555-0100".to_string()),
        email: Some("hello@harborrescue.example".to_string()),
    })?;

    let admin = account(marketplace, "admin", UserRole::Admin, None)?;
    let staff = account(marketplace, "harbor-staff", UserRole::ShelterStaff, Some(&shelter))?;
    let adopters = DEMO_ADOPTERS
        .iter()
        .map(|name| account(marketplace, name, UserRole::Adopter, None))
        .collect::<Result<Vec<_>, _>>()?;

    let listings = [
        ("Biscuit", PetKind::Dog, "Beagle", 3, "Loves long walks"),
        ("Juniper", PetKind::Cat, "Tabby", 2, "Quiet lap cat"),
        ("Clover", PetKind::Rabbit, "Lop", 1, "Litter trained"),
    ];
    let pets = listings
        .into_iter()
        .map(|(name, kind, breed, age, description)| {
            marketplace.pets.create(PetDraft {
                name: name.to_string(),
                kind,
                breed: breed.to_string(),
                age,
                description: Some(description.to_string()),
                shelter_id: Some(shelter.id),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        shelter = %shelter.id,
        pets = pets.len(),
        adopters = adopters.len(),
        "seeded demo marketplace"
    );

    Ok(DemoSeed {
        admin,
        staff,
        adopters,
        shelter,
        pets,
    })
}

fn account<S>(
    marketplace: &Marketplace<S>,
    username: &str,
    role: UserRole,
    shelter: Option<&ShelterView>,
) -> Result<User, AppError>
where
    S: EntityStore + 'static,
{
    let user = register_user(
        marketplace.store.as_ref(),
        UserDraft {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            role,
            shelter_id: shelter.map(|shelter| shelter.id),
        },
    )?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pet_adoption::workflows::catalog::{PetQuery, PetStatus};

    #[test]
    fn demo_seed_lists_available_pets_at_one_shelter() {
        let marketplace = in_memory_marketplace(&CacheConfig::default(), PagingConfig::default());
        let seed = seed_demo_data(&marketplace).expect("seeded");

        assert_eq!(seed.adopters.len(), DEMO_ADOPTERS.len());
        assert_eq!(seed.staff.shelter_id, Some(seed.shelter.id));
        assert_eq!(seed.admin.role, UserRole::Admin);

        let listing = marketplace
            .pets
            .list(&PetQuery {
                status: Some(PetStatus::Available),
                ..PetQuery::default()
            })
            .expect("listing");
        assert_eq!(listing.total_count, seed.pets.len() as u64);

        let shelter = marketplace.shelters.get(seed.shelter.id).expect("shelter");
        assert_eq!(shelter.pet_count, 3);
    }
}
