//! API module
//!
//! HTTP API endpoints and middleware.

pub mod middleware;
pub mod routes;

pub use routes::{create_router, AppState};

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::store::LedgerStore;

/// Build the application router over any ledger store
pub fn build_router<S>(store: S) -> Router
where
    S: LedgerStore + Clone,
{
    // Layers run last-added first: request user -> logging -> handler
    let wallet_routes = create_router::<S>()
        .layer(axum::middleware::from_fn(middleware::logging_middleware))
        .layer(axum::middleware::from_fn(
            middleware::request_user_middleware,
        ));

    Router::new()
        // Health check (no caller identity)
        .route("/health", get(routes::health_check))
        .nest("/api/v1", wallet_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(store))
}
