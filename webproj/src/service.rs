//! Coordinate transformation service.
//!
//! [`TransformService`] ties the registry, the compatibility rules and the
//! transformer cache together. It is built once per process and shared by
//! every request.
//!
//! ```ignore
//! use webproj::{CoordinateTuple, TransformService};
//!
//! let service = TransformService::new()?;
//! let result = service.transform("EPSG:4258", "EPSG:25832", CoordinateTuple::new_2d(56.0, 12.0))?;
//! println!("{} {}", result.v1, result.v2);
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::{CacheStats, Transformer, TransformerCache, TransformerKey};
use crate::compat;
use crate::coords::{CoordinateTuple, TransformedCoordinate};
use crate::error::Result;
use crate::geodesy::{GeodesyEngine, Proj4rsEngine};
use crate::registry::{CountryIndex, CrsInfo, Registry};

/// High-level transformation service with a shared transformer cache.
pub struct TransformService {
    registry: Registry,
    cache: TransformerCache,
}

impl TransformService {
    /// Create a service with the bundled registry and the `proj4rs` engine.
    pub fn new() -> Result<Self> {
        TransformServiceBuilder::new().build()
    }

    /// Create a builder for more configuration options.
    pub fn builder() -> TransformServiceBuilder {
        TransformServiceBuilder::new()
    }

    /// The CRS registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Look up the description of a CRS.
    pub fn crs_info(&self, srid: &str) -> Result<&CrsInfo> {
        self.registry.lookup(srid)
    }

    /// Identifiers grouped by country, in registry order.
    pub fn crs_index(&self) -> CountryIndex {
        self.registry.by_country()
    }

    /// Resolve, validate and fetch the cached transformer for a CRS pair.
    ///
    /// # Errors
    ///
    /// - [`crate::WebprojError::NotFound`] if either identifier is unknown
    /// - [`crate::WebprojError::Incompatible`] for regional systems of different countries
    /// - [`crate::WebprojError::Construction`] if the engine cannot build the pair
    pub fn transformer(&self, src: &str, dst: &str) -> Result<Arc<Transformer>> {
        self.resolve(src, dst).map(|(transformer, _)| transformer)
    }

    /// Transform a coordinate from `src` to `dst`.
    ///
    /// The result always has four slots. `v3` is set only when a height was
    /// supplied and the destination has a height axis; `v4` is the supplied
    /// time, passed through unchanged.
    ///
    /// # Errors
    ///
    /// Everything [`Self::transformer`] returns, plus
    /// [`crate::WebprojError::AreaOfUse`] when the coordinate cannot be
    /// transformed to a sane value.
    pub fn transform(
        &self,
        src: &str,
        dst: &str,
        coord: CoordinateTuple,
    ) -> Result<TransformedCoordinate> {
        let (transformer, dst_info) = self.resolve(src, dst)?;
        apply(&transformer, dst_info, coord)
    }

    /// Parse a comma separated coordinate string and transform it.
    pub fn transform_str(&self, src: &str, dst: &str, coords: &str) -> Result<TransformedCoordinate> {
        let coord = CoordinateTuple::parse(coords)?;
        self.transform(src, dst, coord)
    }

    /// Transform many coordinates between the same pair of CRSs.
    ///
    /// The pair is validated once; per-coordinate failures (area of use) are
    /// reported individually.
    pub fn transform_batch(
        &self,
        src: &str,
        dst: &str,
        coords: &[CoordinateTuple],
    ) -> Result<Vec<Result<TransformedCoordinate>>> {
        let (transformer, dst_info) = self.resolve(src, dst)?;
        tracing::debug!(transformer = %transformer.key(), count = coords.len(), "Batch transform");
        Ok(coords
            .iter()
            .map(|&coord| apply(&transformer, dst_info, coord))
            .collect())
    }

    /// Get transformer cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.sync();
        self.cache.stats()
    }

    fn resolve(&self, src: &str, dst: &str) -> Result<(Arc<Transformer>, &CrsInfo)> {
        let src_info = self.registry.lookup(src)?;
        let dst_info = self.registry.lookup(dst)?;

        compat::check(src_info, dst_info).into_result()?;

        let transformer = self.cache.get(&TransformerKey::new(src, dst))?;
        Ok((transformer, dst_info))
    }
}

fn apply(
    transformer: &Transformer,
    dst_info: &CrsInfo,
    coord: CoordinateTuple,
) -> Result<TransformedCoordinate> {
    // The engine always computes in 3D; a missing height is zero for the math only
    let (v1, v2, v3) = transformer.apply((coord.x, coord.y, coord.z.unwrap_or(0.0)))?;

    Ok(TransformedCoordinate {
        v1,
        v2,
        v3: coord.z.filter(|_| dst_info.has_height()).map(|_| v3),
        v4: coord.t,
    })
}

/// Builder for [`TransformService`].
pub struct TransformServiceBuilder {
    crs_file: Option<PathBuf>,
    grid_dir: Option<PathBuf>,
    registry: Option<Registry>,
    engine: Option<Arc<dyn GeodesyEngine>>,
}

impl TransformServiceBuilder {
    /// Create a builder using the bundled registry and the `proj4rs` engine.
    pub fn new() -> Self {
        Self {
            crs_file: None,
            grid_dir: None,
            registry: None,
            engine: None,
        }
    }

    /// Create a builder configured from environment variables.
    ///
    /// # Environment Variables
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `WEBPROJ_CRS_FILE` | Registry JSON file to load instead of the bundled one | None |
    /// | `WEBPROJ_GRID_DIR` | Directory with geoid grids (`<model>.gtx`) | None |
    pub fn from_env() -> Self {
        let mut builder = Self::new();
        if let Ok(path) = std::env::var("WEBPROJ_CRS_FILE") {
            builder.crs_file = Some(PathBuf::from(path));
        }
        if let Ok(dir) = std::env::var("WEBPROJ_GRID_DIR") {
            builder.grid_dir = Some(PathBuf::from(dir));
        }
        builder
    }

    /// Load the registry from a JSON file.
    pub fn crs_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.crs_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Directory with the geoid grids compound CRSs need.
    ///
    /// Ignored when a custom engine is set.
    pub fn grid_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.grid_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Use an already loaded registry. Takes precedence over [`Self::crs_file`].
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Use a custom geodesy engine.
    pub fn engine(mut self, engine: Arc<dyn GeodesyEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Build the [`TransformService`].
    ///
    /// # Errors
    ///
    /// Returns an error if the registry file cannot be read or parsed.
    pub fn build(self) -> Result<TransformService> {
        let registry = match (self.registry, self.crs_file) {
            (Some(registry), _) => registry,
            (None, Some(path)) => Registry::from_path(path)?,
            (None, None) => Registry::bundled()?,
        };

        let engine: Arc<dyn GeodesyEngine> = match (self.engine, self.grid_dir) {
            (Some(engine), _) => engine,
            (None, Some(dir)) => Arc::new(Proj4rsEngine::new().with_grid_dir(dir)),
            (None, None) => Arc::new(Proj4rsEngine::new()),
        };

        Ok(TransformService {
            registry,
            cache: TransformerCache::new(engine),
        })
    }
}

impl Default for TransformServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WebprojError;
    use crate::geodesy::Transformation;
    use std::sync::atomic::{AtomicU64, Ordering};

    const MM: f64 = 1e-6;
    const DEG: f64 = 1e-9;

    fn service() -> TransformService {
        TransformService::new().unwrap()
    }

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() < tolerance,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_transform_2d() {
        let r = service()
            .transform("EPSG:4258", "EPSG:25832", CoordinateTuple::new_2d(56.0, 12.0))
            .unwrap();
        assert_close(r.v1, 687071.4391094431, MM);
        assert_close(r.v2, 6210141.326748009, MM);
        assert_eq!(r.v3, None);
        assert_eq!(r.v4, None);
    }

    #[test]
    fn test_transform_3d() {
        let r = service()
            .transform(
                "EPSG:4258",
                "EPSG:25832",
                CoordinateTuple::new_3d(56.0, 12.0, 30.0),
            )
            .unwrap();
        assert_close(r.v1, 687071.4391094431, MM);
        assert_close(r.v3.unwrap(), 30.0, MM);
        assert_eq!(r.v4, None);
    }

    #[test]
    fn test_transform_4d() {
        let r = service()
            .transform(
                "EPSG:4258",
                "EPSG:25832",
                CoordinateTuple::new_4d(56.0, 12.0, 30.0, 2010.5),
            )
            .unwrap();
        assert_close(r.v2, 6210141.326748009, MM);
        assert_close(r.v3.unwrap(), 30.0, MM);
        assert_eq!(r.v4, Some(2010.5));
    }

    #[test]
    fn test_height_dropped_without_destination_axis() {
        let r = service()
            .transform(
                "EPSG:25832",
                "EPSG:4326",
                CoordinateTuple::new_3d(725448.0, 6177355.0, 10.0),
            )
            .unwrap();
        assert_eq!(r.v3, None);
    }

    #[test]
    fn test_integer_and_decimal_literals_agree() {
        let service = service();
        let a = service.transform_str("EPSG:4258", "EPSG:25832", "56,12").unwrap();
        let b = service.transform_str("EPSG:4258", "EPSG:25832", "56.,12.").unwrap();
        let c = service.transform_str("EPSG:4258", "EPSG:25832", "56.0,12.0").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_global_and_regional_both_ways() {
        let service = service();

        let r = service
            .transform_str("EPSG:4326", "EPSG:25832", "55.68950140789923,12.58696909994519")
            .unwrap();
        assert_close(r.v1, 725448.0, MM);
        assert_close(r.v2, 6177354.999999999, MM);

        let r = service
            .transform_str("EPSG:25832", "EPSG:4258", "725448.0,6177355.0")
            .unwrap();
        assert_close(r.v1, 55.689501407899236, DEG);
        assert_close(r.v2, 12.58696909994519, DEG);
    }

    #[test]
    fn test_cross_country_rejected() {
        let service = service();
        let err = service
            .transform_str("EPSG:4258", "EPSG:4909", "55.0,12.0")
            .unwrap_err();
        assert!(matches!(err, WebprojError::Incompatible));

        let err = service
            .transform_str("EPSG:4909", "EPSG:4258", "75.0,-50.0")
            .unwrap_err();
        assert_eq!(err.to_string(), "CRS's are not compatible across countries");
    }

    #[test]
    fn test_unknown_crs() {
        let err = service()
            .transform_str("EPSG:4258", "unknowncrs", "56,12")
            .unwrap_err();
        assert!(matches!(err, WebprojError::NotFound { ref srid } if srid == "unknowncrs"));
    }

    #[test]
    fn test_out_of_area() {
        let err = service()
            .transform_str("EPSG:4258", "EPSG:25832", "95.0,12.0")
            .unwrap_err();
        assert!(matches!(err, WebprojError::AreaOfUse));
    }

    #[test]
    fn test_system_34_both_directions() {
        let service = service();

        let r = service
            .transform_str("DK:S34J", "EPSG:25832", "295799.3977,175252.0903")
            .unwrap();
        assert_close(r.v1, 499999.99999808666, MM);
        assert_close(r.v2, 6206079.587029327, MM);
        assert_eq!(r.v3, None);

        let r = service
            .transform_str("EPSG:25832", "DK:S34J", "500000.0,6205000.0")
            .unwrap();
        assert_close(r.v1, 295820.9708249467, MM);
        assert_close(r.v2, 174172.32360956355, MM);

        let r = service
            .transform_str("DK:S34J", "DK:S34S", "138040.74248674404,63621.728972878314")
            .unwrap();
        assert_close(r.v1, 138010.86611871765, MM);
        assert_close(r.v2, 63644.234364821285, MM);
    }

    #[test]
    fn test_outside_destination_area() {
        let err = service()
            .transform_str("EPSG:4258", "DK:S34S", "12.0,56.0")
            .unwrap_err();
        assert!(matches!(err, WebprojError::AreaOfUse));
    }

    #[test]
    fn test_compound_needs_grid_dir() {
        let err = service()
            .transform_str("EPSG:4909", "EPSG:3184+8267", "64.0,-51.5,0")
            .unwrap_err();
        assert!(matches!(err, WebprojError::Construction { .. }));
    }

    #[test]
    fn test_builder_grid_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let data = crate::geoid::encode_gtx(63.0, -53.0, 0.5, 0.5, 5, 7, |_, _| 27.913);
        std::fs::write(dir.path().join("gl_sdfe_gvr2016.gtx"), data).unwrap();

        let service = TransformService::builder()
            .grid_dir(dir.path())
            .build()
            .unwrap();
        let r = service
            .transform_str("EPSG:4909", "EPSG:3184+8267", "64.0,-51.5,0")
            .unwrap();
        assert_close(r.v1, -108394.69573, 0.01);
        assert_close(r.v2, 7156992.58360, 0.01);
        assert_close(r.v3.unwrap(), -27.913, 0.01);
    }

    #[test]
    fn test_transformer_cached() {
        let service = service();
        let a = service.transformer("EPSG:4258", "EPSG:25832").unwrap();
        let b = service.transformer("EPSG:4258", "EPSG:25832").unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let stats = service.cache_stats();
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.hit_count, 1);
    }

    #[test]
    fn test_transform_batch() {
        let coords = vec![
            CoordinateTuple::new_2d(56.0, 12.0),
            CoordinateTuple::new_2d(95.0, 12.0),
        ];
        let results = service()
            .transform_batch("EPSG:4258", "EPSG:25832", &coords)
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_close(results[0].as_ref().unwrap().v1, 687071.4391094431, MM);
        assert!(matches!(results[1], Err(WebprojError::AreaOfUse)));
    }

    #[derive(Debug)]
    struct Offset;

    impl Transformation for Offset {
        fn apply(&self, (x, y, z): (f64, f64, f64)) -> Result<(f64, f64, f64)> {
            Ok((x + 1.0, y + 1.0, z + 1.0))
        }
    }

    #[derive(Default)]
    struct OffsetEngine {
        constructions: AtomicU64,
    }

    impl GeodesyEngine for OffsetEngine {
        fn construct(&self, _src: &str, _dst: &str) -> Result<Box<dyn Transformation>> {
            self.constructions.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(Offset))
        }
    }

    #[test]
    fn test_custom_engine_and_validation_order() {
        let engine = Arc::new(OffsetEngine::default());
        let service = TransformService::builder()
            .engine(engine.clone())
            .build()
            .unwrap();

        // Any registered pair reaches the engine
        let r = service
            .transform_str("DK:S34J", "DK:S34S", "1,2")
            .unwrap();
        assert_eq!((r.v1, r.v2), (2.0, 3.0));

        // Rejected pairs never reach the engine
        assert!(service.transform_str("EPSG:4258", "EPSG:4909", "1,2").is_err());
        assert!(service.transform_str("nope", "EPSG:4909", "1,2").is_err());
        assert_eq!(engine.constructions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_builder_crs_file_missing() {
        let result = TransformService::builder()
            .crs_file("/nonexistent/crs.json")
            .build();
        assert!(matches!(result, Err(WebprojError::Io(_))));
    }
}
