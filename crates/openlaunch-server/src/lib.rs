//! OpenLaunch server library logic.
//!
//! The binary in `main.rs` only resolves the configuration path; everything
//! else (application factory, startup checks, serving, shutdown) lives here
//! so integration tests can drive it.

pub mod api_docs;
pub mod api_health;
pub mod config;
pub mod error;
pub mod extract;
pub mod lifecycle;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::get,
    Extension, Router,
};
use config::Settings;
use openlaunch_db::DbPool;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub use error::ApiError;
pub use extract::{ValidatedJson, ValidatedQuery};
pub use lifecycle::{serve, serve_with_listener, shutdown, startup, ServerError};

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Loaded settings.
    pub settings: Arc<Settings>,
    /// Database connection pool.
    pub pool: DbPool,
}

impl AppState {
    /// Bundles settings and pool.
    pub fn new(settings: Settings, pool: DbPool) -> Self {
        Self {
            settings: Arc::new(settings),
            pool,
        }
    }
}

/// Maximum request body size (2 MiB). Protects against OOM from oversized payloads.
const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Builds the application router with the built-in routes, error
/// fallbacks and middleware.
///
/// The API description at [`api_docs::OPENAPI_PATH`] is only mounted
/// outside production.
pub fn create_application(state: AppState) -> Router {
    create_application_with_routes(state, Router::new())
}

/// Like [`create_application`], merging `routes` in before the middleware
/// is applied so they share error handling, tracing and CORS.
///
/// Handlers in `routes` read the state through `Extension<Arc<AppState>>`.
pub fn create_application_with_routes(state: AppState, routes: Router) -> Router {
    let mut router = routes
        .route("/health", get(api_health::health_handler))
        .route("/health/ready", get(api_health::readiness_handler));

    if state.settings.is_production() {
        tracing::info!("production environment, API description disabled");
    } else {
        router = router.route(api_docs::OPENAPI_PATH, get(api_docs::openapi_handler));
    }

    let trace = TraceLayer::new_for_http()
        .make_span_with(
            DefaultMakeSpan::new()
                .level(Level::INFO)
                .include_headers(state.settings.app.debug),
        )
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    router
        .fallback(error::not_found)
        .method_not_allowed_fallback(error::method_not_allowed)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(CatchPanicLayer::custom(error::handle_panic))
        .layer(trace)
        .layer(cors_layer(&state.settings.app.allowed_origins))
        .layer(Extension(Arc::new(state)))
}

/// CORS restricted to the configured origins. A `*` entry allows any
/// origin; unparseable origins are skipped with a warning.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.iter().any(|origin| origin.trim() == "*") {
        return layer.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}
