use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use super::clients::{AdminCatalog, UserDirectory};
use super::domain::{ApplicationId, LoanApplicationUpdate, NewLoanApplication, PatchSet};
use super::repository::LoanApplicationStore;
use super::service::{LoanApplicationService, ServiceError};

/// Router builder exposing the loan application endpoints.
pub fn loan_router<S, U, C>(service: Arc<LoanApplicationService<S, U, C>>) -> Router
where
    S: LoanApplicationStore + 'static,
    U: UserDirectory + 'static,
    C: AdminCatalog + 'static,
{
    Router::new()
        .route(
            "/api/v1/loan-applications",
            get(list_handler::<S, U, C>).post(create_handler::<S, U, C>),
        )
        .route(
            "/api/v1/loan-applications/:id",
            get(get_handler::<S, U, C>)
                .put(update_handler::<S, U, C>)
                .patch(patch_handler::<S, U, C>)
                .delete(delete_handler::<S, U, C>),
        )
        .route(
            "/api/v1/loan-applications/:id/status",
            put(status_handler::<S, U, C>),
        )
        .route("/api/v1/loan-products", get(products_handler::<S, U, C>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusUpdateRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductNameQuery {
    #[serde(default)]
    pub name: String,
}

fn error_response(err: ServiceError) -> Response {
    let status = match &err {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::MissingReference { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
        ServiceError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        ServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = Json(json!({ "error": err.to_string() }));
    (status, body).into_response()
}

pub(crate) async fn list_handler<S, U, C>(
    State(service): State<Arc<LoanApplicationService<S, U, C>>>,
) -> Response
where
    S: LoanApplicationStore + 'static,
    U: UserDirectory + 'static,
    C: AdminCatalog + 'static,
{
    match service.list() {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_handler<S, U, C>(
    State(service): State<Arc<LoanApplicationService<S, U, C>>>,
    Path(id): Path<u64>,
) -> Response
where
    S: LoanApplicationStore + 'static,
    U: UserDirectory + 'static,
    C: AdminCatalog + 'static,
{
    match service.get(ApplicationId(id)) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn create_handler<S, U, C>(
    State(service): State<Arc<LoanApplicationService<S, U, C>>>,
    Json(submission): Json<NewLoanApplication>,
) -> Response
where
    S: LoanApplicationStore + 'static,
    U: UserDirectory + 'static,
    C: AdminCatalog + 'static,
{
    match service.create(submission).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_handler<S, U, C>(
    State(service): State<Arc<LoanApplicationService<S, U, C>>>,
    Path(id): Path<u64>,
    Json(update): Json<LoanApplicationUpdate>,
) -> Response
where
    S: LoanApplicationStore + 'static,
    U: UserDirectory + 'static,
    C: AdminCatalog + 'static,
{
    match service.update(ApplicationId(id), update).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn patch_handler<S, U, C>(
    State(service): State<Arc<LoanApplicationService<S, U, C>>>,
    Path(id): Path<u64>,
    Json(patch): Json<PatchSet>,
) -> Response
where
    S: LoanApplicationStore + 'static,
    U: UserDirectory + 'static,
    C: AdminCatalog + 'static,
{
    match service.apply_patch(ApplicationId(id), patch) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_handler<S, U, C>(
    State(service): State<Arc<LoanApplicationService<S, U, C>>>,
    Path(id): Path<u64>,
) -> Response
where
    S: LoanApplicationStore + 'static,
    U: UserDirectory + 'static,
    C: AdminCatalog + 'static,
{
    match service.delete(ApplicationId(id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<S, U, C>(
    State(service): State<Arc<LoanApplicationService<S, U, C>>>,
    Path(id): Path<u64>,
    Json(request): Json<StatusUpdateRequest>,
) -> Response
where
    S: LoanApplicationStore + 'static,
    U: UserDirectory + 'static,
    C: AdminCatalog + 'static,
{
    match service.update_status(ApplicationId(id), &request.status) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn products_handler<S, U, C>(
    State(service): State<Arc<LoanApplicationService<S, U, C>>>,
    Query(query): Query<ProductNameQuery>,
) -> Response
where
    S: LoanApplicationStore + 'static,
    U: UserDirectory + 'static,
    C: AdminCatalog + 'static,
{
    match service.products_by_name(&query.name).await {
        Ok(products) => (StatusCode::OK, Json(products)).into_response(),
        Err(err) => error_response(err),
    }
}
