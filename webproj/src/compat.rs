//! Compatibility rules between source and destination CRSs.

use crate::error::{Result, WebprojError};
use crate::registry::CrsInfo;

/// Outcome of a compatibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compatibility {
    Allowed,
    /// Both systems are regional and belong to different countries.
    CrossCountry,
}

impl Compatibility {
    /// Convert into a `Result`, mapping rejections to [`WebprojError::Incompatible`].
    pub fn into_result(self) -> Result<()> {
        match self {
            Compatibility::Allowed => Ok(()),
            Compatibility::CrossCountry => Err(WebprojError::Incompatible),
        }
    }
}

/// Decide whether a transformation from `src` to `dst` is permitted.
///
/// Global systems pair with anything in either direction, and systems of the
/// same country always pair. Only regional systems of different countries
/// are rejected. Coordinate values play no part in the decision.
pub fn check(src: &CrsInfo, dst: &CrsInfo) -> Compatibility {
    if src.global || dst.global || src.country == dst.country {
        Compatibility::Allowed
    } else {
        Compatibility::CrossCountry
    }
}
