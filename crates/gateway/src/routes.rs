//! Route handlers and the JSON error envelope.
//!
//! Endpoints:
//!
//! - `POST   /users/register`    — Create a user
//! - `POST   /users/login`       — Authenticate, receive a session token
//! - `POST   /chat/`             — Send a message, get a reply (Bearer)
//! - `GET    /admin/users`       — List users (Bearer)
//! - `DELETE /admin/users/{id}`  — Delete a user (Bearer)
//! - `GET    /test/endpoints`    — Smoke check
//! - `GET    /health`            — Liveness

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use axum::routing::{delete, get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use supportdesk_core::error::{AuthError, BackendError, Error, PromptError};
use supportdesk_core::user::{SessionClaims, UserSummary};
use tracing::error;
use uuid::Uuid;

use crate::SharedState;

pub fn api_router(state: SharedState) -> Router {
    Router::new()
        .route("/users/register", post(register_handler))
        .route("/users/login", post(login_handler))
        .route("/chat/", post(chat_handler))
        .route("/admin/users", get(list_users_handler))
        .route("/admin/users/{id}", delete(delete_user_handler))
        .route("/test/endpoints", get(test_endpoints_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

// ── Error envelope ────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Map a domain error to a wire status + message.
///
/// Internal faults are logged with full detail; the caller only ever sees
/// a short generic message.
fn map_error(err: Error) -> ApiError {
    match err {
        Error::Auth(AuthError::InvalidInput) => {
            api_error(StatusCode::BAD_REQUEST, "Email and credential are required.")
        }
        Error::Auth(AuthError::DuplicateUser) => {
            api_error(StatusCode::CONFLICT, "User already exists.")
        }
        Error::Auth(AuthError::InvalidCredentials) => {
            api_error(StatusCode::UNAUTHORIZED, "Invalid email or credential.")
        }
        Error::Auth(AuthError::UserNotFound(_)) => {
            api_error(StatusCode::NOT_FOUND, "User not found.")
        }
        Error::Prompt(PromptError::TooLong { .. }) => api_error(
            StatusCode::BAD_REQUEST,
            "Your message is too long for the model. Please shorten your input.",
        ),
        Error::Backend(BackendError::ResourceExhausted) => api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Server is overloaded. Please try again later.",
        ),
        Error::Backend(BackendError::RateLimited { .. }) => api_error(
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded. Please try again later.",
        ),
        other => {
            error!(error = %other, "Internal error while handling request");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Unexpected error.")
        }
    }
}

/// Validate the bearer session token; 401 with a fixed message otherwise.
/// The response never says whether the token was missing, malformed, or expired.
fn require_session(state: &SharedState, headers: &HeaderMap) -> Result<SessionClaims, ApiError> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|header| state.signer.validate_bearer(header))
        .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, "Authentication required."))
}

// ── Users ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CredentialsRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    credential: String,
}

#[derive(Serialize)]
struct RegisterResponse {
    message: String,
    id: Uuid,
}

async fn register_handler(
    State(state): State<SharedState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let id = state
        .directory
        .register(&payload.email, &payload.credential)
        .map_err(|e| map_error(e.into()))?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully.".into(),
            id,
        }),
    ))
}

#[derive(Serialize)]
struct LoginResponse {
    message: String,
    token: String,
    id: Uuid,
}

async fn login_handler(
    State(state): State<SharedState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .directory
        .authenticate(&payload.email, &payload.credential)
        .map_err(|e| map_error(e.into()))?;

    let token = state.signer.issue(&user);
    Ok(Json(LoginResponse {
        message: "User logged in successfully.".into(),
        token,
        id: user.id,
    }))
}

// ── Chat ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: String,
}

async fn chat_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<supportdesk_chat::ChatReply>, ApiError> {
    require_session(&state, &headers)?;

    if payload.message.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Message is required."));
    }

    let reply = state
        .pipeline
        .respond(&payload.message)
        .await
        .map_err(map_error)?;

    Ok(Json(reply))
}

// ── Admin ─────────────────────────────────────────────────────────────────
//
// Admin routes require a valid session token like every other protected
// route. Listing accounts and deleting users is never an anonymous action.

#[derive(Serialize)]
struct UserListResponse {
    users: Vec<UserSummary>,
}

async fn list_users_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<UserListResponse>, ApiError> {
    require_session(&state, &headers)?;
    Ok(Json(UserListResponse {
        users: state.directory.list(),
    }))
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

async fn delete_user_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_session(&state, &headers)?;

    // A non-UUID id cannot name a live user.
    let id: Uuid = id
        .parse()
        .map_err(|_| api_error(StatusCode::NOT_FOUND, "User not found."))?;

    state.directory.delete(id).map_err(|e| map_error(e.into()))?;
    Ok(Json(MessageResponse {
        message: format!("User {id} deleted."),
    }))
}

// ── Health & smoke ────────────────────────────────────────────────────────

async fn test_endpoints_handler() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "All endpoints are working.".into(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
