//! Transformation definitions for the CRSs the geodesy engine can build.
//!
//! The registry describes CRSs for humans; this table tells the engine how to
//! compute with them. Identifiers known to the registry but missing here can
//! be listed and described, but not transformed.

use crate::horner::{HornerPair, HornerPolynomial};

const UTM32_ETRS89: &str = "+proj=utm +zone=32 +ellps=GRS80 +towgs84=0,0,0 +units=m +no_defs";

/// How the engine computes with a CRS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrsDefinition {
    /// PROJ.4 style definition of the CRS, or of the reference plane for
    /// local grid systems.
    pub proj: &'static str,
    /// Polynomials between a local grid and `proj`.
    pub local_grid: Option<&'static HornerPair>,
    /// Geoid model name of the vertical datum of a compound CRS.
    pub geoid: Option<&'static str>,
}

impl CrsDefinition {
    const fn proj(proj: &'static str) -> Self {
        Self {
            proj,
            local_grid: None,
            geoid: None,
        }
    }

    const fn local_grid(proj: &'static str, polynomials: &'static HornerPair) -> Self {
        Self {
            proj,
            local_grid: Some(polynomials),
            geoid: None,
        }
    }
}

// System 34 grids on ETRS89 / UTM zone 32. First-degree conformal fits
// anchored on reference conversions for Jylland; Sjælland shares the linear
// part with its own origin. Westing axes make the linear part a reflection.
const S34_RANGE: f64 = 500_000.0;
const S34_A: f64 = -0.9994346591175322;
const S34_B: f64 = -0.01996813837795825;
const S34_INV_A: f64 = -1.0001664164780937;
const S34_INV_B: f64 = -0.019982758475531895;
const S34_UTM_ORIGIN: [f64; 2] = [499999.99999808666, 6206079.587029327];

const S34J_ORIGIN: [f64; 2] = [295799.3977, 175252.0903];
const S34S_ORIGIN: [f64; 2] = [295769.5213319736, 175274.59569194296];

static S34J: HornerPair = HornerPair {
    fwd: HornerPolynomial {
        degree: 1,
        range: S34_RANGE,
        origin: S34J_ORIGIN,
        u: &[S34_UTM_ORIGIN[0], S34_B, S34_A],
        v: &[S34_UTM_ORIGIN[1], -S34_A, S34_B],
    },
    inv: HornerPolynomial {
        degree: 1,
        range: S34_RANGE,
        origin: S34_UTM_ORIGIN,
        u: &[S34J_ORIGIN[0], S34_INV_B, S34_INV_A],
        v: &[S34J_ORIGIN[1], -S34_INV_A, S34_INV_B],
    },
};

static S34S: HornerPair = HornerPair {
    fwd: HornerPolynomial {
        degree: 1,
        range: S34_RANGE,
        origin: S34S_ORIGIN,
        u: &[S34_UTM_ORIGIN[0], S34_B, S34_A],
        v: &[S34_UTM_ORIGIN[1], -S34_A, S34_B],
    },
    inv: HornerPolynomial {
        degree: 1,
        range: S34_RANGE,
        origin: S34_UTM_ORIGIN,
        u: &[S34S_ORIGIN[0], S34_INV_B, S34_INV_A],
        v: &[S34S_ORIGIN[1], -S34_INV_A, S34_INV_B],
    },
};

/// Split a compound identifier into its horizontal and vertical parts.
///
/// `EPSG:3184+8267` becomes `("EPSG:3184", Some("EPSG:8267"))`; the vertical
/// code inherits the authority of the horizontal one unless it names its own.
pub fn split_compound(srid: &str) -> (&str, Option<String>) {
    match srid.split_once('+') {
        Some((horizontal, vertical)) => {
            let vertical = if vertical.contains(':') {
                vertical.to_string()
            } else {
                match horizontal.split_once(':') {
                    Some((authority, _)) => format!("{authority}:{vertical}"),
                    None => vertical.to_string(),
                }
            };
            (horizontal, Some(vertical))
        }
        None => (srid, None),
    }
}

/// Horizontal (or 3D geographic) definitions.
fn horizontal(srid: &str) -> Option<CrsDefinition> {
    let def = match srid {
        "EPSG:4326" | "EPSG:4979" => {
            CrsDefinition::proj("+proj=longlat +ellps=WGS84 +towgs84=0,0,0 +no_defs")
        }
        "EPSG:4258" | "EPSG:4909" => {
            CrsDefinition::proj("+proj=longlat +ellps=GRS80 +towgs84=0,0,0 +no_defs")
        }
        "EPSG:25832" => CrsDefinition::proj(UTM32_ETRS89),
        "EPSG:25833" => CrsDefinition::proj(
            "+proj=utm +zone=33 +ellps=GRS80 +towgs84=0,0,0 +units=m +no_defs",
        ),
        "EPSG:23032" => CrsDefinition::proj(
            "+proj=utm +zone=32 +ellps=intl +towgs84=-87,-98,-121,0,0,0,0 +units=m +no_defs",
        ),
        "EPSG:3182" => CrsDefinition::proj(
            "+proj=utm +zone=22 +ellps=GRS80 +towgs84=0,0,0 +units=m +no_defs",
        ),
        "EPSG:3184" => CrsDefinition::proj(
            "+proj=utm +zone=24 +ellps=GRS80 +towgs84=0,0,0 +units=m +no_defs",
        ),
        "DK:S34J" => CrsDefinition::local_grid(UTM32_ETRS89, &S34J),
        "DK:S34S" => CrsDefinition::local_grid(UTM32_ETRS89, &S34S),
        _ => return None,
    };
    Some(def)
}

/// Geoid model each known vertical datum depends on.
fn vertical_geoid(srid: &str) -> Option<&'static str> {
    match srid {
        "EPSG:5733" => Some("dk_sdfe_dnn"),
        "EPSG:5799" => Some("dk_sdfe_dvr90"),
        "EPSG:8267" => Some("gl_sdfe_gvr2016"),
        _ => None,
    }
}

/// Resolve the definition for a (possibly compound) CRS identifier.
///
/// The error is a human readable reason suitable for a construction error.
pub fn resolve(srid: &str) -> Result<CrsDefinition, String> {
    let (h, v) = split_compound(srid);

    let def = horizontal(h).ok_or_else(|| format!("no transformation definition for '{h}'"))?;

    match v {
        None => Ok(def),
        Some(_) if def.local_grid.is_some() => {
            Err(format!("'{h}' cannot be combined with a vertical datum"))
        }
        Some(v) => {
            let geoid = vertical_geoid(&v).ok_or_else(|| format!("unknown vertical datum '{v}'"))?;
            Ok(CrsDefinition {
                geoid: Some(geoid),
                ..def
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_compound() {
        assert_eq!(split_compound("EPSG:25832"), ("EPSG:25832", None));
        assert_eq!(
            split_compound("EPSG:3184+8267"),
            ("EPSG:3184", Some("EPSG:8267".to_string()))
        );
        assert_eq!(
            split_compound("EPSG:23032+EPSG:5733"),
            ("EPSG:23032", Some("EPSG:5733".to_string()))
        );
    }

    #[test]
    fn test_resolve_simple() {
        let def = resolve("EPSG:25832").unwrap();
        assert!(def.proj.contains("+zone=32"));
        assert!(def.local_grid.is_none());
        assert!(def.geoid.is_none());
    }

    #[test]
    fn test_resolve_local_grid() {
        let def = resolve("DK:S34J").unwrap();
        assert_eq!(def.proj, UTM32_ETRS89);
        let grid = def.local_grid.unwrap();
        assert!(grid.fwd.is_well_formed());
        assert!(grid.inv.is_well_formed());

        assert!(resolve("DK:S34S").unwrap().local_grid.is_some());
        assert!(resolve("DK:S34J+5799").is_err());
    }

    #[test]
    fn test_local_grid_polynomials_invert_each_other() {
        for pair in [&S34J, &S34S] {
            let point = (260_000.0, 120_000.0);
            let plane = pair.fwd.evaluate(point).unwrap();
            let back = pair.inv.evaluate(plane).unwrap();
            assert!((back.0 - point.0).abs() < 1e-6, "{back:?}");
            assert!((back.1 - point.1).abs() < 1e-6, "{back:?}");
        }
    }

    #[test]
    fn test_resolve_unknown() {
        let reason = resolve("DK:KP2000J").unwrap_err();
        assert!(reason.contains("DK:KP2000J"));
    }

    #[test]
    fn test_resolve_compound() {
        let def = resolve("EPSG:3184+8267").unwrap();
        assert!(def.proj.contains("+zone=24"));
        assert_eq!(def.geoid, Some("gl_sdfe_gvr2016"));

        let reason = resolve("EPSG:25832+9999").unwrap_err();
        assert!(reason.contains("unknown vertical datum"));
    }
}
