//! REST API for ZIP referral routing
//!
//! Lookups for callers plus the snapshot/submit pair used by the map editor.

pub mod handlers;
pub mod service;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::store::LocationStore;
pub use service::LocationService;

pub fn create_rest_router<S: LocationStore + 'static>(service: Arc<LocationService<S>>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/api/v1/health", get(handlers::health))
        // Lookups
        .route("/api/v1/locations/by-zip", get(handlers::get_location_by_zip_query::<S>))
        .route("/api/v1/locations/by-zip/:zip", get(handlers::get_location_by_zip::<S>))
        // Map editor
        .route("/api/v1/zip-map", get(handlers::get_zip_map::<S>))
        .route("/api/v1/zip-assignments", post(handlers::post_zip_assignments::<S>))
        // State and middleware
        .with_state(service)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
