//! HTTP surface of the restore service.

mod handlers;
mod middleware;

pub use handlers::*;
pub use middleware::{access_log_middleware, rate_limit_middleware, request_span, RateLimitState};

use crate::router::{Router, DEFAULT_MAX_BODY_BYTES};
use crate::template::TemplateEngine;
use axum::middleware as axum_middleware;
use notifier::Notifier;
use phone_vault::EncryptedRepository;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Encrypted client store; writers hold the lock across add and save
    pub vault: Arc<RwLock<EncryptedRepository>>,
    /// Page renderer
    pub templates: Arc<TemplateEngine>,
    /// Restore notification channel
    pub notifier: Arc<dyn Notifier>,
    /// Whether store error text is shown to the user
    pub disclose_errors: bool,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        vault: EncryptedRepository,
        templates: TemplateEngine,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            vault: Arc::new(RwLock::new(vault)),
            templates: Arc::new(templates),
            notifier,
            disclose_errors: true,
        }
    }

    /// Set whether store error text appears in alerts.
    pub fn with_error_disclosure(mut self, disclose: bool) -> Self {
        self.disclose_errors = disclose;
        self
    }
}

/// The service's routing table.
pub fn routes(max_body_bytes: usize) -> Router<AppState> {
    let mut router = Router::new().max_body_bytes(max_body_bytes);
    router
        .get("/", handlers::add_form)
        .post("/add", handlers::add_client)
        .get("/restore", handlers::restore_form)
        .post("/restore", handlers::restore_client);
    router
}

/// Create the service with default limits.
pub fn create_router(state: AppState) -> axum::Router {
    create_router_with_limits(state, RateLimitState::new(60), DEFAULT_MAX_BODY_BYTES)
}

/// Create the service with custom rate and body limits.
pub fn create_router_with_limits(
    state: AppState,
    rate_limit: RateLimitState,
    max_body_bytes: usize,
) -> axum::Router {
    routes(max_body_bytes)
        .into_service(state)
        .layer(axum_middleware::from_fn_with_state(
            rate_limit,
            rate_limit_middleware,
        ))
        .layer(axum_middleware::from_fn(access_log_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
}
