//! # webproj - Coordinate transformations between CRSs
//!
//! Core of a coordinate transformation API. It decides *which*
//! transformation to run and *whether* a request is legal, and leaves the
//! numeric work to a geodesy engine (`proj4rs` by default).
//!
//! ## Features
//!
//! - **Registry**: static table of CRS descriptions, loaded once
//! - **Transformer cache**: one transformer per (source, target) pair, built at most once
//! - **Compatibility rules**: regional systems of different countries do not mix
//! - **Result shaping**: always four output slots, `null` where not meaningful
//!
//! ## Quick Start
//!
//! ```ignore
//! use webproj::TransformService;
//!
//! let service = TransformService::new()?;
//! let result = service.transform_str("EPSG:4258", "EPSG:25832", "56.0,12.0")?;
//! assert!(result.v3.is_none());
//! ```
//!
//! ## CRS identifiers
//!
//! Identifiers are `AUTHORITY:CODE` tokens such as `EPSG:25832` or `DK:S34J`.
//! Compound systems join a horizontal and a vertical code with `+`, e.g.
//! `EPSG:3184+8267`. Their heights are converted with GTX geoid grids read
//! from a grid directory (`WEBPROJ_GRID_DIR`).

pub mod cache;
pub mod compat;
pub mod coords;
pub mod definitions;
pub mod error;
pub mod geodesy;
pub mod geoid;
pub mod horner;
pub mod registry;
pub mod service;

// Re-export main types at crate root for convenience
pub use cache::{CacheStats, Transformer, TransformerCache, TransformerKey};
pub use compat::Compatibility;
pub use coords::{parse_number, CoordinateTuple, TransformedCoordinate};
pub use error::{Result, WebprojError};
pub use geodesy::{GeodesyEngine, Proj4rsEngine, Transformation};
pub use geoid::GeoidGrid;
pub use horner::{HornerPair, HornerPolynomial};
pub use registry::{CountryIndex, CrsInfo, Registry};
pub use service::{TransformService, TransformServiceBuilder};
