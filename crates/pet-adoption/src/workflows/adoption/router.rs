use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use super::domain::{ApplicationFilter, ApplicationId, ApplicationRevision, ApplicationSubmission};
use super::service::{AdoptionError, AdoptionWorkflow};
use crate::access::Caller;
use crate::error::{error_response, store_status};
use crate::store::EntityStore;
use crate::workflows::catalog::domain::PetId;

/// Router builder exposing intake, review and decision endpoints for adoption applications.
pub fn application_router<S>(workflow: Arc<AdoptionWorkflow<S>>) -> Router
where
    S: EntityStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/applications",
            get(list_handler::<S>).post(submit_handler::<S>),
        )
        .route("/api/v1/applications/mine", get(mine_handler::<S>))
        .route(
            "/api/v1/applications/:application_id",
            get(get_handler::<S>)
                .put(revise_handler::<S>)
                .delete(delete_handler::<S>),
        )
        .route(
            "/api/v1/applications/:application_id/approve",
            post(approve_handler::<S>),
        )
        .route(
            "/api/v1/applications/:application_id/reject",
            post(reject_handler::<S>),
        )
        .route(
            "/api/v1/pets/:pet_id/applications",
            get(pet_applications_handler::<S>),
        )
        .with_state(workflow)
}

pub(crate) async fn submit_handler<S>(
    State(workflow): State<Arc<AdoptionWorkflow<S>>>,
    caller: Caller,
    Json(submission): Json<ApplicationSubmission>,
) -> Response
where
    S: EntityStore + 'static,
{
    match workflow.submit(&caller, submission) {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn list_handler<S>(
    State(workflow): State<Arc<AdoptionWorkflow<S>>>,
    caller: Caller,
    Query(filter): Query<ApplicationFilter>,
) -> Response
where
    S: EntityStore + 'static,
{
    match workflow.list(&caller, &filter) {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn mine_handler<S>(
    State(workflow): State<Arc<AdoptionWorkflow<S>>>,
    caller: Caller,
) -> Response
where
    S: EntityStore + 'static,
{
    match workflow.list_mine(&caller) {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn get_handler<S>(
    State(workflow): State<Arc<AdoptionWorkflow<S>>>,
    caller: Caller,
    Path(application_id): Path<u64>,
) -> Response
where
    S: EntityStore + 'static,
{
    match workflow.get(&caller, ApplicationId(application_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Field edits with an optional status. A status from a caller without decision authority is
/// dropped rather than rejected, so the remaining edits still apply.
pub(crate) async fn revise_handler<S>(
    State(workflow): State<Arc<AdoptionWorkflow<S>>>,
    caller: Caller,
    Path(application_id): Path<u64>,
    Json(mut revision): Json<ApplicationRevision>,
) -> Response
where
    S: EntityStore + 'static,
{
    let id = ApplicationId(application_id);
    if revision.status.is_some() {
        match workflow.may_decide(&caller, id) {
            Ok(true) => {}
            Ok(false) => revision.status = None,
            Err(error) => return error.into_response(),
        }
    }

    match workflow.revise(&caller, id, revision) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn approve_handler<S>(
    State(workflow): State<Arc<AdoptionWorkflow<S>>>,
    caller: Caller,
    Path(application_id): Path<u64>,
) -> Response
where
    S: EntityStore + 'static,
{
    match workflow.approve(&caller, ApplicationId(application_id)) {
        Ok(decision) => (StatusCode::OK, Json(decision)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn reject_handler<S>(
    State(workflow): State<Arc<AdoptionWorkflow<S>>>,
    caller: Caller,
    Path(application_id): Path<u64>,
) -> Response
where
    S: EntityStore + 'static,
{
    match workflow.reject(&caller, ApplicationId(application_id)) {
        Ok(decision) => (StatusCode::OK, Json(decision)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn delete_handler<S>(
    State(workflow): State<Arc<AdoptionWorkflow<S>>>,
    caller: Caller,
    Path(application_id): Path<u64>,
) -> Response
where
    S: EntityStore + 'static,
{
    match workflow.delete(&caller, ApplicationId(application_id)) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn pet_applications_handler<S>(
    State(workflow): State<Arc<AdoptionWorkflow<S>>>,
    caller: Caller,
    Path(pet_id): Path<u64>,
) -> Response
where
    S: EntityStore + 'static,
{
    match workflow.list_for_pet(&caller, PetId(pet_id)) {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(error) => error.into_response(),
    }
}

impl IntoResponse for AdoptionError {
    fn into_response(self) -> Response {
        let status = match &self {
            AdoptionError::NotFound(_) => StatusCode::NOT_FOUND,
            AdoptionError::Conflict(_) | AdoptionError::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            AdoptionError::Forbidden => StatusCode::FORBIDDEN,
            AdoptionError::Validation(_) => StatusCode::BAD_REQUEST,
            AdoptionError::Store(error) => store_status(error),
        };
        error_response(status, &self)
    }
}
