//! Coordinate tuples and numeric literal parsing.
//!
//! Coordinates arrive as comma separated literals such as `56,12`,
//! `56.,12.` or `56.0,12.0,30.0,2010.5`. Integer and decimal forms are
//! normalized to `f64` before anything else looks at them.

use serde::Serialize;

use crate::error::{Result, WebprojError};

/// An input coordinate with 2 to 4 components.
///
/// `z` (height) and `t` (time) are present only when supplied by the caller.
/// A time component implies a height component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTuple {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
    pub t: Option<f64>,
}

impl CoordinateTuple {
    pub fn new_2d(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            t: None,
        }
    }

    pub fn new_3d(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z: Some(z),
            t: None,
        }
    }

    pub fn new_4d(x: f64, y: f64, z: f64, t: f64) -> Self {
        Self {
            x,
            y,
            z: Some(z),
            t: Some(t),
        }
    }

    /// Build a tuple from 2 to 4 values.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match *values {
            [x, y] => Some(Self::new_2d(x, y)),
            [x, y, z] => Some(Self::new_3d(x, y, z)),
            [x, y, z, t] => Some(Self::new_4d(x, y, z, t)),
            _ => None,
        }
    }

    /// Parse a comma separated list of 2 to 4 numeric literals.
    ///
    /// # Errors
    ///
    /// Returns [`WebprojError::InvalidCoordinate`] for malformed literals or a
    /// wrong number of components.
    pub fn parse(input: &str) -> Result<Self> {
        let values = input
            .split(',')
            .map(|part| parse_number(part.trim()))
            .collect::<Option<Vec<f64>>>()
            .ok_or_else(|| WebprojError::InvalidCoordinate {
                input: input.to_string(),
                reason: "components must be integer or decimal numbers".to_string(),
            })?;

        Self::from_slice(&values).ok_or_else(|| WebprojError::InvalidCoordinate {
            input: input.to_string(),
            reason: format!("expected 2 to 4 components, got {}", values.len()),
        })
    }
}

/// Parse an integer or decimal literal.
///
/// Accepts an optional sign followed by digits with an optional fractional
/// part: `56`, `56.`, `56.0`, `-12.5`, `.5`. Exponents, the special
/// values `inf`/`nan` and literals too long to be finite are rejected.
pub fn parse_number(literal: &str) -> Option<f64> {
    let unsigned = literal
        .strip_prefix('-')
        .or_else(|| literal.strip_prefix('+'))
        .unwrap_or(literal);

    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, f),
        None => (unsigned, ""),
    };

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !all_digits(int_part) || !all_digits(frac_part) {
        return None;
    }

    literal.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// A transformed coordinate with exactly four output slots.
///
/// Slots that were not supplied, or are not meaningful for the destination
/// CRS, serialize as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransformedCoordinate {
    pub v1: f64,
    pub v2: f64,
    pub v3: Option<f64>,
    pub v4: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_forms() {
        assert_eq!(parse_number("56"), Some(56.0));
        assert_eq!(parse_number("56."), Some(56.0));
        assert_eq!(parse_number("56.0"), Some(56.0));
        assert_eq!(parse_number("-12.5"), Some(-12.5));
        assert_eq!(parse_number("+3"), Some(3.0));
        assert_eq!(parse_number(".5"), Some(0.5));
    }

    #[test]
    fn test_parse_number_rejects() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("."), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("1e5"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("1.2.3"), None);
        assert_eq!(parse_number("12a"), None);
    }

    #[test]
    fn test_parse_equivalent_literals() {
        let a = CoordinateTuple::parse("56,12").unwrap();
        let b = CoordinateTuple::parse("56.,12.").unwrap();
        let c = CoordinateTuple::parse("56.0,12.0").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a, CoordinateTuple::new_2d(56.0, 12.0));
    }

    #[test]
    fn test_parse_dimensions() {
        let c = CoordinateTuple::parse("56,12").unwrap();
        assert_eq!((c.z, c.t), (None, None));

        let c = CoordinateTuple::parse("56,12,0").unwrap();
        assert_eq!(c.z, Some(0.0));
        assert_eq!(c.t, None);

        let c = CoordinateTuple::parse("56.0,12.0,30.0,2010.5").unwrap();
        assert_eq!(c.z, Some(30.0));
        assert_eq!(c.t, Some(2010.5));
    }

    #[test]
    fn test_parse_negative() {
        let c = CoordinateTuple::parse("-12.0,56.0").unwrap();
        assert_eq!(c.x, -12.0);
        assert_eq!(c.y, 56.0);
    }

    #[test]
    fn test_parse_wrong_count() {
        assert!(matches!(
            CoordinateTuple::parse("56"),
            Err(WebprojError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            CoordinateTuple::parse("1,2,3,4,5"),
            Err(WebprojError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_parse_malformed() {
        assert!(CoordinateTuple::parse("56,,12").is_err());
        assert!(CoordinateTuple::parse("56,abc").is_err());
        assert!(CoordinateTuple::parse("").is_err());
    }

    #[test]
    fn test_parse_overflowing_literal() {
        let huge = "9".repeat(400);
        assert_eq!(parse_number(&huge), None);
        assert!(matches!(
            CoordinateTuple::parse(&format!("{huge},12")),
            Err(WebprojError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_transformed_coordinate_serializes_nulls() {
        let coord = TransformedCoordinate {
            v1: 1.5,
            v2: 2.5,
            v3: None,
            v4: None,
        };
        let json = serde_json::to_value(coord).unwrap();
        assert_eq!(json["v1"], 1.5);
        assert!(json["v3"].is_null());
        assert!(json.as_object().unwrap().contains_key("v4"));
    }
}
