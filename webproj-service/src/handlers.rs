//! HTTP request handlers for the transformation service.

use axum::{
    extract::{Path, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;
use webproj::{CrsInfo, TransformedCoordinate, WebprojError};

use crate::AppState;

/// Supported API versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    V1_0,
    V1_1,
}

impl ApiVersion {
    /// Parse a version path segment such as `v1.1`.
    pub fn parse(segment: &str) -> Option<Self> {
        match segment {
            "v1.0" => Some(ApiVersion::V1_0),
            "v1.1" => Some(ApiVersion::V1_1),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V1_0 => "v1.0",
            ApiVersion::V1_1 => "v1.1",
        }
    }

    /// Whether CRS responses echo the requested identifier.
    pub fn echoes_srid(&self) -> bool {
        matches!(self, ApiVersion::V1_1)
    }
}

/// Description of a CRS.
#[derive(Debug, Serialize, ToSchema)]
pub struct CrsResponse {
    /// Country code, or `Global`.
    pub country: String,
    pub title: String,
    pub title_short: String,
    pub v1: Option<String>,
    pub v1_short: Option<String>,
    pub v2: Option<String>,
    pub v2_short: Option<String>,
    pub v3: Option<String>,
    pub v3_short: Option<String>,
    pub v4: Option<String>,
    pub v4_short: Option<String>,
    /// Requested identifier (v1.1 and later).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub srid: Option<String>,
    pub area_of_use: String,
    /// West, south, east, north in decimal degrees.
    #[schema(value_type = Vec<f64>)]
    pub bounding_box: [f64; 4],
}

impl CrsResponse {
    fn new(info: &CrsInfo, srid: Option<&str>) -> Self {
        Self {
            country: info.country.clone(),
            title: info.title.clone(),
            title_short: info.title_short.clone(),
            v1: info.v1.clone(),
            v1_short: info.v1_short.clone(),
            v2: info.v2.clone(),
            v2_short: info.v2_short.clone(),
            v3: info.v3.clone(),
            v3_short: info.v3_short.clone(),
            v4: info.v4.clone(),
            v4_short: info.v4_short.clone(),
            srid: srid.map(str::to_string),
            area_of_use: info.area_of_use.clone(),
            bounding_box: info.bounding_box,
        }
    }
}

/// Transformed coordinate. Absent or inapplicable components are `null`.
///
/// Mirrors [`TransformedCoordinate`] so the OpenAPI schema can be derived;
/// the core crate does not depend on `utoipa`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransformationResponse {
    pub v1: f64,
    pub v2: f64,
    pub v3: Option<f64>,
    pub v4: Option<f64>,
}

impl From<TransformedCoordinate> for TransformationResponse {
    fn from(c: TransformedCoordinate) -> Self {
        Self {
            v1: c.v1,
            v2: c.v2,
            v3: c.v3,
            v4: c.v4,
        }
    }
}

/// Error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    /// Error message.
    pub message: String,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Transformer cache statistics response.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    /// Number of transformers in cache.
    pub cached_transformers: u64,
    /// Cache hit count.
    pub cache_hits: u64,
    /// Cache miss count.
    pub cache_misses: u64,
    /// Cache hit rate (0.0 to 1.0).
    pub hit_rate: f64,
}

fn message(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(MessageResponse {
            message: message.into(),
        }),
    )
        .into_response()
}

fn unknown_version(uri: &Uri) -> Response {
    message(
        StatusCode::NOT_FOUND,
        format!("Unknown API version in URI [{}]", uri.path()),
    )
}

/// Map a library error to a status code and message body.
///
/// `route` is the route pattern suggested when an identifier is unknown.
fn error_response(e: WebprojError, uri: &Uri, route: &str) -> Response {
    let (status, text) = match &e {
        WebprojError::NotFound { .. } => (
            StatusCode::NOT_FOUND,
            format!(
                "{e}. You have requested this URI [{}] but did you mean {route} ?",
                uri.path()
            ),
        ),
        WebprojError::AreaOfUse => (StatusCode::NOT_FOUND, e.to_string()),
        WebprojError::Incompatible | WebprojError::InvalidCoordinate { .. } => {
            (StatusCode::BAD_REQUEST, e.to_string())
        }
        WebprojError::Construction { .. }
        | WebprojError::Registry(_)
        | WebprojError::Grid(_)
        | WebprojError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    tracing::warn!(uri = %uri, error = %e, "Request failed");

    message(status, text)
}

/// List all CRS identifiers grouped by country.
#[utoipa::path(
    get,
    path = "/{version}/crs/",
    tag = "crs",
    params(("version" = String, Path, description = "API version, v1.0 or v1.1")),
    responses(
        (status = 200, description = "Identifiers per country", body = HashMap<String, Vec<String>>),
        (status = 404, description = "Unknown API version", body = MessageResponse)
    )
)]
pub async fn get_crs_index(
    State(state): State<Arc<AppState>>,
    Path(version): Path<String>,
    uri: Uri,
) -> Response {
    if ApiVersion::parse(&version).is_none() {
        return unknown_version(&uri);
    }

    (StatusCode::OK, Json(state.transform_service.crs_index())).into_response()
}

/// Describe a single CRS.
///
/// # Returns
///
/// - `200 OK` with the registered fields; v1.1 adds `srid`
/// - `404 Not Found` if the identifier is not registered
#[utoipa::path(
    get,
    path = "/{version}/crs/{srid}",
    tag = "crs",
    params(
        ("version" = String, Path, description = "API version, v1.0 or v1.1"),
        ("srid" = String, Path, description = "CRS identifier, e.g. EPSG:25832")
    ),
    responses(
        (status = 200, description = "CRS description", body = CrsResponse),
        (status = 404, description = "Unknown CRS", body = MessageResponse)
    )
)]
pub async fn get_crs(
    State(state): State<Arc<AppState>>,
    Path((version, srid)): Path<(String, String)>,
    uri: Uri,
) -> Response {
    let Some(version) = ApiVersion::parse(&version) else {
        return unknown_version(&uri);
    };

    tracing::debug!(srid = %srid, version = version.as_str(), "CRS query");

    match state.transform_service.crs_info(&srid) {
        Ok(info) => {
            let echo = version.echoes_srid().then_some(srid.as_str());
            (StatusCode::OK, Json(CrsResponse::new(info, echo))).into_response()
        }
        Err(e) => error_response(
            e,
            &uri,
            &format!("/{}/crs/<string:crs>", version.as_str()),
        ),
    }
}

/// Transform a coordinate between two CRSs.
///
/// `coords` is a comma separated list of 2 to 4 numbers.
///
/// # Returns
///
/// - `200 OK` with `v1`..`v4`
/// - `400 Bad Request` for malformed coordinates or incompatible CRSs
/// - `404 Not Found` for unknown CRSs or coordinates outside the area of use
/// - `500 Internal Server Error` if no transformation can be built
#[utoipa::path(
    get,
    path = "/{version}/trans/{src}/{dst}/{coords}",
    tag = "transformation",
    params(
        ("version" = String, Path, description = "API version, v1.0 or v1.1"),
        ("src" = String, Path, description = "Source CRS identifier"),
        ("dst" = String, Path, description = "Destination CRS identifier"),
        ("coords" = String, Path, description = "Comma separated coordinate, e.g. 56.0,12.0")
    ),
    responses(
        (status = 200, description = "Transformed coordinate", body = TransformationResponse),
        (status = 400, description = "Invalid request", body = MessageResponse),
        (status = 404, description = "Unknown CRS or outside area of use", body = MessageResponse),
        (status = 500, description = "Transformation unavailable", body = MessageResponse)
    )
)]
pub async fn get_transformation(
    State(state): State<Arc<AppState>>,
    Path((version, src, dst, coords)): Path<(String, String, String, String)>,
    uri: Uri,
) -> Response {
    let Some(version) = ApiVersion::parse(&version) else {
        return unknown_version(&uri);
    };

    tracing::debug!(src = %src, dst = %dst, coords = %coords, "Transformation query");

    match state.transform_service.transform_str(&src, &dst, &coords) {
        Ok(result) => {
            tracing::info!(src = %src, dst = %dst, "Transformation done");
            (StatusCode::OK, Json(TransformationResponse::from(result))).into_response()
        }
        Err(e) => error_response(
            e,
            &uri,
            &format!(
                "/{}/trans/<string:src>/<string:dst>/<number:v1>,<number:v2>",
                version.as_str()
            ),
        ),
    }
}

/// Health check endpoint.
///
/// Returns service status and version.
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Get transformer cache statistics.
#[utoipa::path(
    get,
    path = "/stats",
    tag = "system",
    responses((status = 200, description = "Cache statistics", body = StatsResponse))
)]
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let stats = state.transform_service.cache_stats();

    Json(StatsResponse {
        cached_transformers: stats.entry_count,
        cache_hits: stats.hit_count,
        cache_misses: stats.miss_count,
        hit_rate: stats.hit_rate(),
    })
}

/// Fallback for unmatched routes.
pub async fn not_found(uri: Uri) -> Response {
    message(
        StatusCode::NOT_FOUND,
        format!(
            "The requested URI [{}] was not found on this server",
            uri.path()
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_version_parse() {
        assert_eq!(ApiVersion::parse("v1.0"), Some(ApiVersion::V1_0));
        assert_eq!(ApiVersion::parse("v1.1"), Some(ApiVersion::V1_1));
        assert_eq!(ApiVersion::parse("v2"), None);
        assert!(!ApiVersion::V1_0.echoes_srid());
        assert!(ApiVersion::V1_1.echoes_srid());
    }

    #[test]
    fn test_transformation_response_serialize_nulls() {
        let response = TransformationResponse {
            v1: 687071.4,
            v2: 6210141.3,
            v3: None,
            v4: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"v3\":null"));
        assert!(json.contains("\"v4\":null"));
    }

    #[test]
    fn test_crs_response_srid_only_when_echoed() {
        let registry = webproj::Registry::bundled().unwrap();
        let info = registry.lookup("EPSG:25832").unwrap();

        let json = serde_json::to_value(CrsResponse::new(info, None)).unwrap();
        assert!(json.get("srid").is_none());
        assert!(json.get("global").is_none());

        let json = serde_json::to_value(CrsResponse::new(info, Some("EPSG:25832"))).unwrap();
        assert_eq!(json["srid"], "EPSG:25832");
        assert_eq!(json["title_short"], "ETRS89/UTM32N");
    }

    #[test]
    fn test_health_response_serialize() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("0.1.0"));
    }
}
