//! HTTP endpoints of the identity server.
//!
//! Thin handlers over [`IdentityService`]: each POST route parses the body,
//! runs the signed-action pipeline, and serializes the outcome; each GET
//! route runs a read-only query. Anything that is not a route answers
//! 404 with an empty JSON object.
//!
//! Error mapping: `BadRequest` 400, `BadSignature` 401, `NotAllowed` 403,
//! `NotFound` 404, `NonceConsumed` 409, `InvariantViolation` 422,
//! `Internal` 500.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;

use crate::proto::{ActionRequest, IdtResponse, IsAdminResponse, IsModeratorResponse};
use crate::service::{ApiError, IdentityService};

pub fn routes() -> Router<Arc<IdentityService>> {
    Router::new()
        .route("/vouch/{user}", post(post_vouch))
        .route("/idt/{user}", get(get_idt))
        .route("/proof/{user}", post(post_proof))
        .route("/punish/{user}", post(post_punish))
        .route("/is_moderator/{user}", get(get_is_moderator))
        .route("/moderators", get(get_moderators))
        .route("/add_moderator/{user}", post(post_add_moderator))
        .route("/remove_moderator/{user}", post(post_remove_moderator))
        .route("/is_admin/{user}", get(get_is_admin))
        .route("/admins", get(get_admins))
        .route("/add_admin/{user}", post(post_add_admin))
        .route("/remove_admin/{user}", post(post_remove_admin))
        .fallback(fallback)
}

/// Parses a mutating request body, surfacing deserialization failures as
/// [`ApiError::BadRequest`] rather than the extractor's default rejection.
fn parse_request(body: serde_json::Value) -> Result<ActionRequest, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// Serializes an action outcome, logging the rejection reason on failure.
fn respond<T: Serialize>(action: &'static str, result: Result<T, ApiError>) -> Response {
    match result {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(error) => {
            tracing::warn!(error = %error, action, "request rejected");
            error.into_response()
        }
    }
}

#[instrument(skip_all)]
async fn post_vouch(
    State(service): State<Arc<IdentityService>>,
    Path(user): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    respond(
        "vouch",
        parse_request(body).and_then(|request| service.vouch(&user, &request)),
    )
}

#[instrument(skip_all)]
async fn get_idt(
    State(service): State<Arc<IdentityService>>,
    Path(user): Path<String>,
) -> Response {
    respond("idt", service.idt(&user).map(|idt| IdtResponse { idt }))
}

#[instrument(skip_all)]
async fn post_proof(
    State(service): State<Arc<IdentityService>>,
    Path(user): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    respond(
        "proof",
        parse_request(body).and_then(|request| service.set_proof(&user, &request)),
    )
}

#[instrument(skip_all)]
async fn post_punish(
    State(service): State<Arc<IdentityService>>,
    Path(user): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    respond(
        "punish",
        parse_request(body).and_then(|request| service.punish(&user, &request)),
    )
}

#[instrument(skip_all)]
async fn get_is_moderator(
    State(service): State<Arc<IdentityService>>,
    Path(user): Path<String>,
) -> Response {
    respond(
        "is_moderator",
        service
            .is_moderator(&user)
            .map(|is_moderator| IsModeratorResponse { is_moderator }),
    )
}

#[instrument(skip_all)]
async fn get_moderators(State(service): State<Arc<IdentityService>>) -> Response {
    respond("moderators", service.list_moderators())
}

#[instrument(skip_all)]
async fn post_add_moderator(
    State(service): State<Arc<IdentityService>>,
    Path(user): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    respond(
        "add_moderator",
        parse_request(body).and_then(|request| service.add_moderator(&user, &request)),
    )
}

#[instrument(skip_all)]
async fn post_remove_moderator(
    State(service): State<Arc<IdentityService>>,
    Path(user): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    respond(
        "remove_moderator",
        parse_request(body).and_then(|request| service.remove_moderator(&user, &request)),
    )
}

#[instrument(skip_all)]
async fn get_is_admin(
    State(service): State<Arc<IdentityService>>,
    Path(user): Path<String>,
) -> Response {
    respond(
        "is_admin",
        service.is_admin(&user).map(|is_admin| IsAdminResponse { is_admin }),
    )
}

#[instrument(skip_all)]
async fn get_admins(State(service): State<Arc<IdentityService>>) -> Response {
    respond("admins", service.list_admins())
}

#[instrument(skip_all)]
async fn post_add_admin(
    State(service): State<Arc<IdentityService>>,
    Path(user): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    respond(
        "add_admin",
        parse_request(body).and_then(|request| service.add_admin(&user, &request)),
    )
}

#[instrument(skip_all)]
async fn post_remove_admin(
    State(service): State<Arc<IdentityService>>,
    Path(user): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    respond(
        "remove_admin",
        parse_request(body).and_then(|request| service.remove_admin(&user, &request)),
    )
}

/// Everything off the route table is 404 with an empty object body.
async fn fallback() -> Response {
    ApiError::NotFound.into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorBody {
            error: String,
        }

        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::BadSignature => StatusCode::UNAUTHORIZED,
            ApiError::NotAllowed => StatusCode::FORBIDDEN,
            ApiError::NotFound => {
                return (StatusCode::NOT_FOUND, Json(json!({}))).into_response();
            }
            ApiError::NonceConsumed => StatusCode::CONFLICT,
            ApiError::InvariantViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
