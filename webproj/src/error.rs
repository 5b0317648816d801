//! Error types for the webproj library.

use thiserror::Error;

/// Errors that can occur when resolving or running a transformation.
#[derive(Error, Debug)]
pub enum WebprojError {
    /// IO error when reading a registry file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The CRS identifier is not present in the registry.
    #[error("'{srid}' not available")]
    NotFound { srid: String },

    /// Both CRSs are bound to different, non-global countries.
    #[error("CRS's are not compatible across countries")]
    Incompatible,

    /// The coordinate cannot be transformed to a sane value.
    #[error("Input coordinate outside area of use of either source or destination CRS")]
    AreaOfUse,

    /// The geodesy engine cannot build a transformation for the CRS pair.
    #[error("Unable to create transformation from {src} to {dst}: {reason}")]
    Construction {
        src: String,
        dst: String,
        reason: String,
    },

    /// The coordinate string could not be parsed.
    #[error("Invalid coordinate '{input}': {reason}")]
    InvalidCoordinate { input: String, reason: String },

    /// The registry file is malformed.
    #[error("Invalid CRS registry: {0}")]
    Registry(String),

    /// A geoid grid file is malformed.
    #[error("Invalid geoid grid {0}")]
    Grid(String),
}

/// Result type alias using [`WebprojError`].
pub type Result<T> = std::result::Result<T, WebprojError>;
