//! HTTP API gateway for supportdesk.
//!
//! Exposes user registration/login, the token-gated chat endpoint, admin
//! user management, and health/smoke routes.
//!
//! Built on Axum for high performance async HTTP.

pub mod routes;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::{Json, Router};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use supportdesk_auth::{SessionSigner, UserDirectory};
use supportdesk_chat::ChatPipeline;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Shared application state, passed explicitly through every handler —
/// no process-wide singletons.
pub struct AppState {
    pub directory: Arc<UserDirectory>,
    pub signer: Arc<SessionSigner>,
    pub pipeline: Arc<ChatPipeline>,
}

pub type SharedState = Arc<AppState>;

/// Build the full router with all middleware layers.
///
/// Security layers applied:
/// - Signed bearer-token authentication on chat and admin routes
/// - CORS restricted to explicit methods/headers
/// - Request body size limit (1 MB)
/// - In-memory rate limiting per client
/// - HTTP trace logging
pub fn build_router(state: SharedState, rate_limit_per_minute: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .max_age(Duration::from_secs(3600));

    let rate_limiter = Arc::new(RateLimiter::new(
        rate_limit_per_minute,
        Duration::from_secs(60),
    ));

    routes::api_router(state)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(axum::middleware::from_fn(move |req, next| {
            let limiter = rate_limiter.clone();
            rate_limit_middleware(limiter, req, next)
        }))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
///
/// Builds the knowledge store, backend, signer, and pipeline ONCE and
/// shares them via Arc — the generation backend in particular is a
/// heavyweight singleton that must never be reinitialized per request.
pub async fn start(config: supportdesk_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let store = Arc::new(match &config.kb.path {
        Some(path) => supportdesk_kb::FaqStore::load_from(path)?,
        None => supportdesk_kb::FaqStore::builtin(),
    });

    let backend = Arc::new(supportdesk_backend::LocalBackend::new(
        &config.backend.model,
        config.backend.context_window,
    ));

    let signer = Arc::new(
        SessionSigner::new(&config.auth.signing_key)
            .with_ttl(chrono::Duration::seconds(config.auth.token_ttl_secs)),
    );

    let pipeline = Arc::new(ChatPipeline::new(
        store,
        backend,
        &config.persona,
        Duration::from_secs(config.backend.queue_timeout_secs),
    ));

    let state = Arc::new(AppState {
        directory: Arc::new(UserDirectory::new()),
        signer,
        pipeline,
    });

    let app = build_router(state, config.gateway.rate_limit_per_minute);

    info!(addr = %addr, model = %config.backend.model, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Rate Limiter ---

/// Simple in-memory sliding-window rate limiter.
///
/// Tracks request timestamps per client key (bearer token or "anonymous").
/// Thread-safe via `std::sync::Mutex` (non-async, held briefly).
struct RateLimiter {
    max_requests: usize,
    window: Duration,
    clients: std::sync::Mutex<HashMap<String, Vec<std::time::Instant>>>,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Check if the client is within rate limits. Returns `true` if allowed.
    fn check(&self, client_key: &str) -> bool {
        let now = std::time::Instant::now();
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());

        // Periodic cleanup: if map grows too large, evict stale entries
        if clients.len() > 10_000 {
            clients.retain(|_, timestamps| {
                timestamps
                    .last()
                    .is_some_and(|t| now.duration_since(*t) < self.window)
            });
        }

        let timestamps = clients.entry(client_key.to_string()).or_default();
        timestamps.retain(|t| now.duration_since(*t) < self.window);

        if timestamps.len() >= self.max_requests {
            return false;
        }

        timestamps.push(now);
        true
    }
}

/// Rate limiting middleware — keys on the Authorization header, falling
/// back to "anonymous". Returns 429 with the standard error envelope when
/// exceeded. `/health` is exempt so monitoring can poll it freely.
async fn rate_limit_middleware(
    limiter: Arc<RateLimiter>,
    req: axum::extract::Request,
    next: Next,
) -> axum::response::Response {
    if req.uri().path() == "/health" {
        return next.run(req).await;
    }

    let client_key = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    if !limiter.check(&client_key) {
        warn!(client = %client_key.chars().take(20).collect::<String>(), "Rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(routes::ErrorResponse {
                error: "Rate limit exceeded. Please try again later.".into(),
            }),
        )
            .into_response();
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limiter_allows_up_to_the_cap() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        assert!(limiter.check("k"));
        assert!(limiter.check("k"));
        assert!(limiter.check("k"));
        assert!(!limiter.check("k"));
    }

    #[test]
    fn rate_limiter_keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check("a"));
        assert!(limiter.check("b"));
        assert!(!limiter.check("a"));
    }
}
