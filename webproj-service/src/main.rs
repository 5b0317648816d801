//! webproj Service - HTTP microservice for coordinate transformations.
//!
//! A REST API for transforming coordinates between coordinate reference
//! systems and describing the systems it knows.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `WEBPROJ_CRS_FILE` | Registry JSON file replacing the bundled one | None |
//! | `WEBPROJ_GRID_DIR` | Directory with `<model>.gtx` geoid grids for compound CRSs | None |
//! | `WEBPROJ_PORT` | HTTP server port | 8080 |
//! | `RUST_LOG` | Log level (e.g., "info", "debug") | "info" |
//!
//! ## Endpoints
//!
//! - `GET /{version}/crs/` - CRS identifiers grouped by country
//! - `GET /{version}/crs/{srid}` - Description of a CRS
//! - `GET /{version}/trans/{src}/{dst}/{coords}` - Transform a coordinate
//! - `GET /health` - Health check
//! - `GET /stats` - Transformer cache statistics
//! - `GET /docs` - OpenAPI documentation (Swagger UI)

use std::net::SocketAddr;
use std::sync::Arc;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use webproj::TransformServiceBuilder;
use webproj_service::{router, ApiDoc, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webproj_service=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port: u16 = std::env::var("WEBPROJ_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);

    // The library handles WEBPROJ_CRS_FILE and WEBPROJ_GRID_DIR
    let transform_service = TransformServiceBuilder::from_env().build()?;

    tracing::info!(
        crs_count = transform_service.registry().len(),
        port = port,
        "Starting webproj service"
    );

    let state = Arc::new(AppState { transform_service });

    let app = router(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        );

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
