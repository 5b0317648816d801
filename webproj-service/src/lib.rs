//! webproj Service Library
//!
//! HTTP handlers, routing and OpenAPI description for the coordinate
//! transformation service. Used by the webproj-service binary and by the
//! integration tests.

pub mod handlers;

use std::sync::Arc;

use axum::{routing::get, Router};
use utoipa::OpenApi;
use webproj::TransformService;

/// Application state shared across handlers.
pub struct AppState {
    /// Transformation service with its transformer cache.
    pub transform_service: TransformService,
}

/// OpenAPI documentation for the webproj service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "webproj Transformation Service",
        version = "0.1.0",
        description = "REST API for coordinate transformations between coordinate reference systems.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        handlers::get_crs_index,
        handlers::get_crs,
        handlers::get_transformation,
        handlers::health_check,
        handlers::get_stats,
    ),
    components(
        schemas(
            handlers::CrsResponse,
            handlers::TransformationResponse,
            handlers::MessageResponse,
            handlers::HealthResponse,
            handlers::StatsResponse,
        )
    ),
    tags(
        (name = "crs", description = "CRS registry endpoints"),
        (name = "transformation", description = "Coordinate transformation endpoints"),
        (name = "system", description = "System and health endpoints")
    )
)]
pub struct ApiDoc;

/// Build the API router (without docs and middleware).
///
/// The API version is the first path segment; `v1.0` and `v1.1` are served.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/:version/crs", get(handlers::get_crs_index))
        .route("/:version/crs/", get(handlers::get_crs_index))
        .route("/:version/crs/:srid", get(handlers::get_crs))
        .route(
            "/:version/trans/:src/:dst/:coords",
            get(handlers::get_transformation),
        )
        .route("/health", get(handlers::health_check))
        .route("/stats", get(handlers::get_stats))
        .fallback(handlers::not_found)
        .with_state(state)
}

// Re-export commonly used types for convenience
pub use handlers::{
    ApiVersion, CrsResponse, HealthResponse, MessageResponse, StatsResponse,
    TransformationResponse,
};
