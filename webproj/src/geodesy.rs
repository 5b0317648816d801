//! Bridge to the numeric geodesy engine.
//!
//! [`GeodesyEngine`] is the seam between the service core and the code that
//! actually does projection and datum math. [`Proj4rsEngine`] implements it on
//! top of the pure-Rust `proj4rs` crate, extended with plane polynomials for
//! local grid systems and geoid grids for compound CRSs.

use std::fmt;
use std::path::{Path, PathBuf};

use proj4rs::adaptors::transform_vertex_2d;
use proj4rs::transform::transform;
use proj4rs::Proj;

use crate::definitions;
use crate::error::{Result, WebprojError};
use crate::geoid::GeoidGrid;
use crate::horner::HornerPair;

/// Geographic system used to look up geoid heights.
const GEOID_LOOKUP: &str = "+proj=longlat +ellps=GRS80 +towgs84=0,0,0 +no_defs";

/// A bound, reusable transformation between two CRSs.
///
/// Points are `(v1, v2, v3)` in the native axis order and units of each CRS:
/// latitude/longitude in degrees for geographic systems, easting/northing in
/// metres for projected ones.
pub trait Transformation: Send + Sync + fmt::Debug {
    /// Transform a point from the source to the destination CRS.
    ///
    /// # Errors
    ///
    /// Returns [`WebprojError::AreaOfUse`] if the engine cannot produce a sane
    /// value for this point.
    fn apply(&self, point: (f64, f64, f64)) -> Result<(f64, f64, f64)>;
}

/// Factory for [`Transformation`]s.
pub trait GeodesyEngine: Send + Sync {
    /// Build a transformation from `src` to `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`WebprojError::Construction`] if no transformation path exists.
    fn construct(&self, src: &str, dst: &str) -> Result<Box<dyn Transformation>>;
}

/// Geodesy engine backed by `proj4rs`.
///
/// Compound CRSs need the geoid model of their vertical datum as
/// `<grid_dir>/<model>.gtx`; without a grid directory they cannot be built.
#[derive(Debug, Default, Clone)]
pub struct Proj4rsEngine {
    grid_dir: Option<PathBuf>,
}

impl Proj4rsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory holding geoid grids.
    pub fn with_grid_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.grid_dir = Some(dir.into());
        self
    }

    pub fn grid_dir(&self) -> Option<&Path> {
        self.grid_dir.as_deref()
    }
}

impl GeodesyEngine for Proj4rsEngine {
    fn construct(&self, src: &str, dst: &str) -> Result<Box<dyn Transformation>> {
        let construction_error = |reason: String| WebprojError::Construction {
            src: src.to_string(),
            dst: dst.to_string(),
            reason,
        };

        let source = Endpoint::new(src, self.grid_dir()).map_err(construction_error)?;
        let target = Endpoint::new(dst, self.grid_dir()).map_err(construction_error)?;

        Ok(Box::new(ProjPipeline { source, target }))
    }
}

/// Geoid heights of a vertical datum.
struct Geoid {
    model: &'static str,
    grid: GeoidGrid,
    lonlat: Proj,
}

impl Geoid {
    fn load(model: &'static str, grid_dir: Option<&Path>) -> std::result::Result<Self, String> {
        let dir = grid_dir
            .ok_or_else(|| format!("geoid model '{model}' needed, but no grid directory is set"))?;
        let path = dir.join(format!("{model}.gtx"));

        let grid = GeoidGrid::from_file(&path)
            .map_err(|e| format!("cannot load geoid model '{model}' from {}: {e}", path.display()))?;
        let lonlat = Proj::from_proj_string(GEOID_LOOKUP).map_err(|e| e.to_string())?;

        Ok(Self {
            model,
            grid,
            lonlat,
        })
    }

    /// Geoid height above the ellipsoid at a horizontal position in `proj`.
    fn separation(&self, proj: &Proj, point: (f64, f64, f64)) -> Result<f64> {
        let (lon, lat) = transform_vertex_2d(proj, &self.lonlat, (point.0, point.1))
            .map_err(|_| WebprojError::AreaOfUse)?;

        self.grid
            .height(lat.to_degrees(), lon.to_degrees())
            .ok_or(WebprojError::AreaOfUse)
    }
}

/// One side of a pipeline.
struct Endpoint {
    srid: String,
    definition: &'static str,
    proj: Proj,
    geographic: bool,
    local_grid: Option<&'static HornerPair>,
    geoid: Option<Geoid>,
}

impl Endpoint {
    fn new(srid: &str, grid_dir: Option<&Path>) -> std::result::Result<Self, String> {
        let def = definitions::resolve(srid)?;
        let proj = Proj::from_proj_string(def.proj)
            .map_err(|e| format!("invalid definition for '{srid}': {e}"))?;

        let geoid = match def.geoid {
            Some(model) => Some(Geoid::load(model, grid_dir)?),
            None => None,
        };

        Ok(Self {
            srid: srid.to_string(),
            definition: def.proj,
            geographic: proj.is_latlong() && def.local_grid.is_none(),
            proj,
            local_grid: def.local_grid,
            geoid,
        })
    }

    /// Caller coordinates to the units and axis order of `proj`.
    fn to_engine(&self, (v1, v2, v3): (f64, f64, f64)) -> Result<(f64, f64, f64)> {
        if let Some(grid) = self.local_grid {
            let (x, y) = grid.fwd.evaluate((v1, v2)).ok_or(WebprojError::AreaOfUse)?;
            return Ok((x, y, v3));
        }

        if self.geographic {
            // proj4rs works in (lon, lat) radians for geographic systems
            let (lat, lon) = (v1, v2);
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                return Err(WebprojError::AreaOfUse);
            }
            return Ok((lon.to_radians(), lat.to_radians(), v3));
        }

        Ok((v1, v2, v3))
    }

    fn to_caller(&self, (x, y, z): (f64, f64, f64)) -> Result<(f64, f64, f64)> {
        if let Some(grid) = self.local_grid {
            let (v1, v2) = grid.inv.evaluate((x, y)).ok_or(WebprojError::AreaOfUse)?;
            return Ok((v1, v2, z));
        }

        if self.geographic {
            return Ok((y.to_degrees(), x.to_degrees(), z));
        }

        Ok((x, y, z))
    }
}

struct ProjPipeline {
    source: Endpoint,
    target: Endpoint,
}

impl fmt::Debug for ProjPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjPipeline")
            .field("source", &self.source.srid)
            .field("target", &self.target.srid)
            .field("source_geoid", &self.source.geoid.as_ref().map(|g| g.model))
            .field("target_geoid", &self.target.geoid.as_ref().map(|g| g.model))
            .finish_non_exhaustive()
    }
}

impl Transformation for ProjPipeline {
    fn apply(&self, point: (f64, f64, f64)) -> Result<(f64, f64, f64)> {
        let mut p = self.source.to_engine(point)?;

        // Orthometric to ellipsoidal height
        if let Some(geoid) = &self.source.geoid {
            p.2 += geoid.separation(&self.source.proj, p)?;
        }

        if self.source.definition != self.target.definition {
            transform(&self.source.proj, &self.target.proj, &mut p).map_err(|e| {
                tracing::debug!(
                    src = %self.source.srid,
                    dst = %self.target.srid,
                    error = %e,
                    "Engine rejected coordinate"
                );
                WebprojError::AreaOfUse
            })?;
        }

        if let Some(geoid) = &self.target.geoid {
            p.2 -= geoid.separation(&self.target.proj, p)?;
        }

        let out = self.target.to_caller(p)?;

        if out.0.is_finite() && out.1.is_finite() && out.2.is_finite() {
            Ok(out)
        } else {
            Err(WebprojError::AreaOfUse)
        }
    }
}
