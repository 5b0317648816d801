//! Read-only registry of CRS descriptions.
//!
//! The registry is loaded once, either from the bundled `data/crs.json` or
//! from a user supplied file, and is never mutated afterwards. Entry order is
//! the order of the source file and is preserved by every listing.

use std::collections::HashMap;
use std::path::Path;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Result, WebprojError};

/// Registry shipped with the library.
const BUNDLED_REGISTRY: &str = include_str!("../data/crs.json");

/// Descriptive metadata for a single CRS.
///
/// Axis labels (`v1`..`v4` and their short forms) are `None` for axes the CRS
/// does not have.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrsInfo {
    pub country: String,
    /// Not bound to a single country. Global systems are compatible with
    /// every other system and are not part of API responses.
    #[serde(default, skip_serializing)]
    pub global: bool,
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
    pub area_of_use: String,
    /// West, south, east, north in decimal degrees.
    pub bounding_box: [f64; 4],
}

impl CrsInfo {
    /// Whether the CRS has a third (height) axis.
    pub fn has_height(&self) -> bool {
        self.v3.is_some()
    }
}

#[derive(Deserialize)]
struct RegistryEntry {
    srid: String,
    #[serde(flatten)]
    info: CrsInfo,
}

/// CRS identifiers grouped by country, both in registry order.
///
/// Serializes as a JSON object whose keys keep first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountryIndex {
    groups: Vec<(String, Vec<String>)>,
}

impl CountryIndex {
    /// Identifiers registered for `country`.
    pub fn get(&self, country: &str) -> Option<&[String]> {
        self.groups
            .iter()
            .find(|(c, _)| c == country)
            .map(|(_, ids)| ids.as_slice())
    }

    /// Countries in first-seen order.
    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(c, _)| c.as_str())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl Serialize for CountryIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (country, ids) in &self.groups {
            map.serialize_entry(country, ids)?;
        }
        map.end()
    }
}

/// Static mapping from CRS identifier to [`CrsInfo`].
#[derive(Debug, Clone)]
pub struct Registry {
    entries: Vec<(String, CrsInfo)>,
    positions: HashMap<String, usize>,
}

impl Registry {
    /// Load the registry bundled with the library.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_REGISTRY)
    }

    /// Load a registry from a JSON file.
    ///
    /// The file holds an array of objects, each with an `srid` key next to
    /// the [`CrsInfo`] fields.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parse a registry from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Vec<RegistryEntry> =
            serde_json::from_str(json).map_err(|e| WebprojError::Registry(e.to_string()))?;

        let mut entries = Vec::with_capacity(raw.len());
        let mut positions = HashMap::with_capacity(raw.len());

        for entry in raw {
            if positions.contains_key(&entry.srid) {
                return Err(WebprojError::Registry(format!(
                    "duplicate CRS identifier '{}'",
                    entry.srid
                )));
            }
            positions.insert(entry.srid.clone(), entries.len());
            entries.push((entry.srid, entry.info));
        }

        Ok(Self { entries, positions })
    }

    /// Look up the description of a CRS.
    ///
    /// # Errors
    ///
    /// Returns [`WebprojError::NotFound`] if the identifier is not registered.
    pub fn lookup(&self, srid: &str) -> Result<&CrsInfo> {
        self.positions
            .get(srid)
            .map(|&i| &self.entries[i].1)
            .ok_or_else(|| WebprojError::NotFound {
                srid: srid.to_string(),
            })
    }

    /// All entries in registry order.
    pub fn list_all(&self) -> impl Iterator<Item = (&str, &CrsInfo)> {
        self.entries.iter().map(|(srid, info)| (srid.as_str(), info))
    }

    /// Identifiers grouped by country.
    pub fn by_country(&self) -> CountryIndex {
        let mut groups: Vec<(String, Vec<String>)> = Vec::new();
        for (srid, info) in &self.entries {
            match groups.iter_mut().find(|(c, _)| *c == info.country) {
                Some((_, ids)) => ids.push(srid.clone()),
                None => groups.push((info.country.clone(), vec![srid.clone()])),
            }
        }
        CountryIndex { groups }
    }

    /// Number of registered CRSs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
