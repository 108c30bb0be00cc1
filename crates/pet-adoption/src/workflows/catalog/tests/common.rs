use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use serde_json::Value;

use crate::access::identity::{ROLE_HEADER, SHELTER_ID_HEADER, USER_ID_HEADER};
use crate::cache::ReadThroughCache;
use crate::config::PagingConfig;
use crate::store::{EntityReader, EntityStore, MemoryStore, StoreError, UnitOfWork};
use crate::workflows::catalog::domain::{PetDraft, PetKind, ShelterDraft, ShelterId};
use crate::workflows::catalog::{PetCatalog, ShelterDirectory};

pub(super) fn paging() -> PagingConfig {
    PagingConfig {
        default_page_size: 2,
        max_page_size: 5,
    }
}

pub(super) struct Catalog<S> {
    pub(super) pets: Arc<PetCatalog<S>>,
    pub(super) shelters: Arc<ShelterDirectory<S>>,
    pub(super) store: Arc<S>,
    pub(super) cache: Arc<ReadThroughCache>,
}

pub(super) fn build_catalog_with<S>(store: S, cache: ReadThroughCache) -> Catalog<S>
where
    S: EntityStore + 'static,
{
    let store = Arc::new(store);
    let cache = Arc::new(cache);
    Catalog {
        pets: Arc::new(PetCatalog::new(store.clone(), cache.clone(), paging())),
        shelters: Arc::new(ShelterDirectory::new(store.clone(), cache.clone())),
        store,
        cache,
    }
}

pub(super) fn build_catalog() -> Catalog<MemoryStore> {
    build_catalog_with(MemoryStore::new(), ReadThroughCache::new())
}

pub(super) fn shelter_draft(name: &str) -> ShelterDraft {
    ShelterDraft {
        name: name.to_string(),
        address: "200 Harbor Way".to_string(),
        phone: Some("555-0170".to_string()),
        email: Some("intake@harbor.example.org".to_string()),
    }
}

pub(super) fn pet_draft(name: &str, kind: PetKind, shelter_id: Option<ShelterId>) -> PetDraft {
    PetDraft {
        name: name.to_string(),
        kind,
        breed: "Mixed".to_string(),
        age: 3,
        description: Some("Friendly and crate trained".to_string()),
        shelter_id,
    }
}

/// Counts store reads so tests can tell cache hits from read-throughs.
#[derive(Default)]
pub(super) struct CountingStore {
    inner: MemoryStore,
    reads: AtomicUsize,
}

impl CountingStore {
    pub(super) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl EntityStore for CountingStore {
    fn read<T, E>(&self, query: impl FnOnce(&dyn EntityReader) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read(query)
    }

    fn transaction<T, E>(
        &self,
        work: impl FnOnce(&mut dyn UnitOfWork) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        self.inner.transaction(work)
    }
}

pub(super) struct UnavailableStore;

impl EntityStore for UnavailableStore {
    fn read<T, E>(&self, _query: impl FnOnce(&dyn EntityReader) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        Err(StoreError::Unavailable("database offline".to_string()).into())
    }

    fn transaction<T, E>(
        &self,
        _work: impl FnOnce(&mut dyn UnitOfWork) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        Err(StoreError::Unavailable("database offline".to_string()).into())
    }
}

pub(super) fn request(
    method: &str,
    uri: &str,
    identity: Option<(u64, &str, Option<u64>)>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((user_id, role, shelter_id)) = identity {
        builder = builder
            .header(USER_ID_HEADER, user_id.to_string())
            .header(ROLE_HEADER, role);
        if let Some(shelter_id) = shelter_id {
            builder = builder.header(SHELTER_ID_HEADER, shelter_id.to_string());
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
