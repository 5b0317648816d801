//! Geoid height grids in GTX format.
//!
//! A GTX file is a 40 byte big-endian header followed by `rows * cols`
//! big-endian `f32` geoid heights in metres:
//!
//! | Offset | Type | Field |
//! |--------|------|-------|
//! | 0 | f64 | latitude of the south-west node |
//! | 8 | f64 | longitude of the south-west node |
//! | 16 | f64 | latitude spacing |
//! | 24 | f64 | longitude spacing |
//! | 32 | i32 | rows |
//! | 36 | i32 | columns |
//!
//! Rows run from south to north, columns from west to east.

use std::fs;
use std::path::Path;

use crate::error::{Result, WebprojError};

const HEADER_SIZE: usize = 40;

/// Marker for grid nodes without a value.
const NODATA: f32 = -88.8888;

/// A geoid model loaded into memory.
#[derive(Debug, Clone)]
pub struct GeoidGrid {
    south: f64,
    west: f64,
    dlat: f64,
    dlon: f64,
    rows: usize,
    cols: usize,
    heights: Vec<f32>,
}

impl GeoidGrid {
    /// Load a GTX file.
    ///
    /// # Errors
    ///
    /// Returns [`WebprojError::Io`] if the file cannot be read and
    /// [`WebprojError::Grid`] if it is not a valid grid.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(&path)?;
        Self::from_bytes(&data).map_err(|reason| {
            WebprojError::Grid(format!(
                "{}: {reason}",
                path.as_ref().display()
            ))
        })
    }

    /// Parse GTX data.
    pub fn from_bytes(data: &[u8]) -> std::result::Result<Self, String> {
        if data.len() < HEADER_SIZE {
            return Err(format!("file too short for header ({} bytes)", data.len()));
        }

        let f64_at = |offset: usize| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(&data[offset..offset + 8]);
            f64::from_be_bytes(buf)
        };
        let i32_at = |offset: usize| {
            let mut buf = [0u8; 4];
            buf.copy_from_slice(&data[offset..offset + 4]);
            i32::from_be_bytes(buf)
        };

        let (south, west, dlat, dlon) = (f64_at(0), f64_at(8), f64_at(16), f64_at(24));
        let (rows, cols) = (i32_at(32), i32_at(36));

        if rows < 2 || cols < 2 {
            return Err(format!("grid must be at least 2x2, got {rows}x{cols}"));
        }
        if !(dlat > 0.0 && dlon > 0.0) {
            return Err(format!("invalid spacing {dlat}/{dlon}"));
        }

        let (rows, cols) = (rows as usize, cols as usize);
        let expected = HEADER_SIZE + rows * cols * 4;
        if data.len() != expected {
            return Err(format!(
                "expected {expected} bytes for {rows}x{cols} grid, got {}",
                data.len()
            ));
        }

        let heights = data[HEADER_SIZE..]
            .chunks_exact(4)
            .map(|c| f32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Ok(Self {
            south,
            west,
            dlat,
            dlon,
            rows,
            cols,
            heights,
        })
    }

    /// Geoid height at a position, bilinearly interpolated.
    ///
    /// Returns `None` outside the grid or next to a node without data.
    pub fn height(&self, lat: f64, lon: f64) -> Option<f64> {
        let row = (lat - self.south) / self.dlat;
        let mut col = (lon - self.west) / self.dlon;

        // Grids may be stored in 0..360 longitudes
        if col < 0.0 {
            col += 360.0 / self.dlon;
        }

        let max_row = (self.rows - 1) as f64;
        let max_col = (self.cols - 1) as f64;
        if !(0.0..=max_row).contains(&row) || !(0.0..=max_col).contains(&col) {
            return None;
        }

        let r0 = (row.floor() as usize).min(self.rows - 2);
        let c0 = (col.floor() as usize).min(self.cols - 2);
        let fr = row - r0 as f64;
        let fc = col - c0 as f64;

        let node = |r: usize, c: usize| {
            let h = self.heights[r * self.cols + c];
            (h != NODATA).then_some(h as f64)
        };

        let sw = node(r0, c0)?;
        let se = node(r0, c0 + 1)?;
        let nw = node(r0 + 1, c0)?;
        let ne = node(r0 + 1, c0 + 1)?;

        let south = sw + (se - sw) * fc;
        let north = nw + (ne - nw) * fc;
        Some(south + (north - south) * fr)
    }
}

/// Encode a grid in GTX format. Test helper shared with other modules.
#[cfg(test)]
pub(crate) fn encode_gtx(
    south: f64,
    west: f64,
    dlat: f64,
    dlon: f64,
    rows: usize,
    cols: usize,
    height: impl Fn(f64, f64) -> f32,
) -> Vec<u8> {
    let mut data = Vec::with_capacity(HEADER_SIZE + rows * cols * 4);
    for value in [south, west, dlat, dlon] {
        data.extend_from_slice(&value.to_be_bytes());
    }
    data.extend_from_slice(&(rows as i32).to_be_bytes());
    data.extend_from_slice(&(cols as i32).to_be_bytes());

    for r in 0..rows {
        for c in 0..cols {
            let lat = south + r as f64 * dlat;
            let lon = west + c as f64 * dlon;
            data.extend_from_slice(&height(lat, lon).to_be_bytes());
        }
    }
    data
}
