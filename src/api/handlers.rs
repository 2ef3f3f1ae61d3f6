//! HTTP request handlers for the holiday ledger API.
//!
//! Store calls block on SQLite, so every handler runs them on the blocking
//! pool via [`tokio::task::spawn_blocking`].

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::identity::Identifier;
use crate::models::NewShift;
use crate::store::{NewStaff, SqliteStore};

use super::request::{IdentifyRequest, IdentifyResponse, RecalculateRequest, TermsRequest};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/identify", post(identify_handler))
        .route("/staff", post(create_staff_handler))
        .route("/staff/:name", delete(delete_staff_handler))
        .route("/staff/:name/terms", patch(update_terms_handler))
        .route("/staff/:name/recalculate", post(recalculate_handler))
        .route("/staff/:name/entitlement", get(entitlement_handler))
        .route("/shifts", post(upsert_shift_handler))
        .route(
            "/shifts/:id",
            put(update_shift_handler).delete(delete_shift_handler),
        )
        .with_state(state)
}

/// Handler for POST /identify.
///
/// Derives an identifier under the store's namespace without touching the
/// store itself.
async fn identify_handler(
    State(state): State<AppState>,
    payload: Result<Json<IdentifyRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let store = state.store();
    let generator = store.generator();
    let response = IdentifyResponse {
        entity_type: request.entity_type,
        identifier: generator.identify_fields(request.entity_type, &request.fields),
        namespace_version: generator.namespace().version(),
    };
    info!(
        correlation_id = %correlation_id,
        entity_type = request.entity_type.tag(),
        identifier = %response.identifier,
        "Identifier derived"
    );
    json_response(StatusCode::OK, &response)
}

/// Handler for POST /staff.
async fn create_staff_handler(
    State(state): State<AppState>,
    payload: Result<Json<NewStaff>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let new = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let result = run_blocking(&state, move |store| store.create_staff(new)).await;
    respond(correlation_id, "create_staff", StatusCode::CREATED, result)
}

/// Handler for DELETE /staff/:name.
async fn delete_staff_handler(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    let correlation_id = Uuid::new_v4();
    let result = run_blocking(&state, move |store| store.delete_staff(&name)).await;
    respond(correlation_id, "delete_staff", StatusCode::OK, result)
}

/// Handler for PATCH /staff/:name/terms.
async fn update_terms_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: Result<Json<TermsRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let result = run_blocking(&state, move |store| {
        store.update_staff_terms(&name, request.into())
    })
    .await;
    respond(correlation_id, "update_staff_terms", StatusCode::OK, result)
}

/// Handler for POST /staff/:name/recalculate.
///
/// The body may be omitted entirely.
async fn recalculate_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: Result<Json<RecalculateRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(JsonRejection::MissingJsonContentType(_)) => RecalculateRequest::default(),
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let result = run_blocking(&state, move |store| {
        store.recalculate(&name, request.employment_end_override)
    })
    .await;
    respond(correlation_id, "recalculate", StatusCode::OK, result)
}

/// Handler for GET /staff/:name/entitlement.
async fn entitlement_handler(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    let correlation_id = Uuid::new_v4();
    let result = run_blocking(&state, move |store| {
        store.entitlement(&name)?.ok_or(EngineError::NotFound {
            entity: "entitlement".to_string(),
            key: name,
        })
    })
    .await;
    respond(correlation_id, "entitlement", StatusCode::OK, result)
}

/// Handler for POST /shifts.
async fn upsert_shift_handler(
    State(state): State<AppState>,
    payload: Result<Json<NewShift>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let new = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let result = run_blocking(&state, move |store| store.upsert_shift(new)).await;
    respond(correlation_id, "upsert_shift", StatusCode::OK, result)
}

/// Handler for PUT /shifts/:id.
async fn update_shift_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<NewShift>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let shift_id = match parse_shift_id(correlation_id, &id) {
        Ok(shift_id) => shift_id,
        Err(response) => return response,
    };
    let new = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let result = run_blocking(&state, move |store| store.update_shift(shift_id, new)).await;
    respond(correlation_id, "update_shift", StatusCode::OK, result)
}

/// Handler for DELETE /shifts/:id.
async fn delete_shift_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let correlation_id = Uuid::new_v4();
    let shift_id = match parse_shift_id(correlation_id, &id) {
        Ok(shift_id) => shift_id,
        Err(response) => return response,
    };

    let result = run_blocking(&state, move |store| store.delete_shift(shift_id)).await;
    respond(correlation_id, "delete_shift", StatusCode::OK, result)
}

/// Runs a store operation on the blocking pool.
async fn run_blocking<T, F>(state: &AppState, work: F) -> Result<T, ApiErrorResponse>
where
    T: Send + 'static,
    F: FnOnce(&SqliteStore) -> EngineResult<T> + Send + 'static,
{
    let store = state.store();
    match tokio::task::spawn_blocking(move || work(store.as_ref())).await {
        Ok(result) => result.map_err(Into::into),
        Err(err) => Err(ApiErrorResponse::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::with_details("INTERNAL_ERROR", "Store task failed", err.to_string()),
        )),
    }
}

fn parse_shift_id(correlation_id: Uuid, raw: &str) -> Result<Identifier, Response> {
    raw.parse::<Identifier>().map_err(|err| {
        warn!(correlation_id = %correlation_id, shift_id = raw, "Malformed shift id");
        error_response(ApiErrorResponse::new(
            StatusCode::BAD_REQUEST,
            ApiError::validation_error(format!("Invalid shift id '{}': {}", raw, err)),
        ))
    })
}

fn respond<T: Serialize>(
    correlation_id: Uuid,
    operation: &'static str,
    status: StatusCode,
    result: Result<T, ApiErrorResponse>,
) -> Response {
    match result {
        Ok(body) => {
            info!(correlation_id = %correlation_id, operation, "Request completed");
            json_response(status, &body)
        }
        Err(api_error) => {
            warn!(
                correlation_id = %correlation_id,
                operation,
                status = api_error.status.as_u16(),
                code = %api_error.error.code,
                error = %api_error.error.message,
                "Request failed"
            );
            error_response(api_error)
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

fn error_response(api_error: ApiErrorResponse) -> Response {
    json_response(api_error.status, &api_error.error)
}

fn rejection_response(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // The body text carries serde's detailed message
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    error_response(ApiErrorResponse::new(StatusCode::BAD_REQUEST, error))
}
