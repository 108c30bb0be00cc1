use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use super::domain::{PetChanges, PetDraft, PetId, PetQuery, ShelterChanges, ShelterDraft, ShelterId};
use super::service::{CatalogError, PetCatalog, ShelterDirectory};
use crate::access::Caller;
use crate::error::{error_response, store_status};
use crate::store::EntityStore;

/// Router exposing the public pet listing and staff-only maintenance endpoints.
pub fn pet_router<S>(catalog: Arc<PetCatalog<S>>) -> Router
where
    S: EntityStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/pets",
            get(list_pets_handler::<S>).post(create_pet_handler::<S>),
        )
        .route(
            "/api/v1/pets/:pet_id",
            get(get_pet_handler::<S>)
                .put(update_pet_handler::<S>)
                .delete(delete_pet_handler::<S>),
        )
        .with_state(catalog)
}

/// Router exposing the shelter directory. Mutations are restricted to admins.
pub fn shelter_router<S>(directory: Arc<ShelterDirectory<S>>) -> Router
where
    S: EntityStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/shelters",
            get(list_shelters_handler::<S>).post(create_shelter_handler::<S>),
        )
        .route(
            "/api/v1/shelters/:shelter_id",
            get(get_shelter_handler::<S>)
                .put(update_shelter_handler::<S>)
                .delete(delete_shelter_handler::<S>),
        )
        .with_state(directory)
}

pub(crate) async fn list_pets_handler<S>(
    State(catalog): State<Arc<PetCatalog<S>>>,
    Query(query): Query<PetQuery>,
) -> Response
where
    S: EntityStore + 'static,
{
    match catalog.list(&query) {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn get_pet_handler<S>(
    State(catalog): State<Arc<PetCatalog<S>>>,
    Path(pet_id): Path<u64>,
) -> Response
where
    S: EntityStore + 'static,
{
    match catalog.get(PetId(pet_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn create_pet_handler<S>(
    State(catalog): State<Arc<PetCatalog<S>>>,
    caller: Caller,
    Json(draft): Json<PetDraft>,
) -> Response
where
    S: EntityStore + 'static,
{
    if !caller.can_manage_pets() {
        return CatalogError::Forbidden.into_response();
    }
    match catalog.create(draft) {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn update_pet_handler<S>(
    State(catalog): State<Arc<PetCatalog<S>>>,
    caller: Caller,
    Path(pet_id): Path<u64>,
    Json(changes): Json<PetChanges>,
) -> Response
where
    S: EntityStore + 'static,
{
    if !caller.can_manage_pets() {
        return CatalogError::Forbidden.into_response();
    }
    match catalog.update(PetId(pet_id), changes) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn delete_pet_handler<S>(
    State(catalog): State<Arc<PetCatalog<S>>>,
    caller: Caller,
    Path(pet_id): Path<u64>,
) -> Response
where
    S: EntityStore + 'static,
{
    if !caller.can_manage_pets() {
        return CatalogError::Forbidden.into_response();
    }
    match catalog.delete(PetId(pet_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn list_shelters_handler<S>(
    State(directory): State<Arc<ShelterDirectory<S>>>,
) -> Response
where
    S: EntityStore + 'static,
{
    match directory.list() {
        Ok(shelters) => (StatusCode::OK, Json(shelters)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn get_shelter_handler<S>(
    State(directory): State<Arc<ShelterDirectory<S>>>,
    Path(shelter_id): Path<u64>,
) -> Response
where
    S: EntityStore + 'static,
{
    match directory.get(ShelterId(shelter_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn create_shelter_handler<S>(
    State(directory): State<Arc<ShelterDirectory<S>>>,
    caller: Caller,
    Json(draft): Json<ShelterDraft>,
) -> Response
where
    S: EntityStore + 'static,
{
    if !caller.can_manage_shelters() {
        return CatalogError::Forbidden.into_response();
    }
    match directory.create(draft) {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn update_shelter_handler<S>(
    State(directory): State<Arc<ShelterDirectory<S>>>,
    caller: Caller,
    Path(shelter_id): Path<u64>,
    Json(changes): Json<ShelterChanges>,
) -> Response
where
    S: EntityStore + 'static,
{
    if !caller.can_manage_shelters() {
        return CatalogError::Forbidden.into_response();
    }
    match directory.update(ShelterId(shelter_id), changes) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn delete_shelter_handler<S>(
    State(directory): State<Arc<ShelterDirectory<S>>>,
    caller: Caller,
    Path(shelter_id): Path<u64>,
) -> Response
where
    S: EntityStore + 'static,
{
    if !caller.can_manage_shelters() {
        return CatalogError::Forbidden.into_response();
    }
    match directory.delete(ShelterId(shelter_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error.into_response(),
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let status = match &self {
            CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
            CatalogError::Forbidden => StatusCode::FORBIDDEN,
            CatalogError::Store(error) => store_status(error),
        };
        error_response(status, &self)
    }
}
