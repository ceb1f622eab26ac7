// Copyright 2025 Honeycomb Contributors
// SPDX-License-Identifier: Apache-2.0

/*!
Core types for neighbor search operations.
*/

use std::fmt;
use std::str::FromStr;

/// Spatial hash code of a grid cell, right-aligned at the codec's precision
pub type HashCode = u64;

/// Maximum precision (in bits) a hash code can carry
pub const MAX_BITS: u32 = 64;

/// Mean meters per degree of arc on the equator
pub const METERS_PER_DEGREE: f64 = 111_319.490_793_273_6;

/// Result type for neighbor search operations
pub type NeighborResult<T> = Result<T, NeighborError>;

/// Errors that can occur during neighbor search operations.
///
/// Every variant describes a configuration problem detected before any work
/// starts. None of them is retryable: fix the parameters and call again.
#[derive(Debug, thiserror::Error)]
pub enum NeighborError {
    #[error("Unknown grid mode: {0} (expected 'longlat', 'geographic' or 'orthogonal')")]
    UnknownGridMode(String),

    #[error("Invalid locations shape {shape:?}: expected an Nx2 coordinate array")]
    InvalidDimensions { shape: Vec<usize> },

    #[error("Invalid precision: {bits} bits (must be between {min} and {max})")]
    InvalidBits { bits: u32, min: u32, max: u32 },

    #[error("Invalid bounding box: {0}")]
    InvalidBoundingBox(String),

    #[error("Invalid radius: {0} (must be finite and positive)")]
    InvalidRadius(f64),

    #[error("Invalid neighbor count: n_neighbor must be at least 1")]
    InvalidNeighborCount,

    #[error("Invalid {pool} ids: {reason}")]
    InvalidIds { pool: &'static str, reason: String },

    #[error("Coordinate ({x}, {y}) lies outside the bounding box")]
    OutOfBounds { x: f64, y: f64 },

    #[error("Entity {index} at ({x}, {y}) lies outside the bounding box")]
    EntityOutOfBounds { index: usize, x: f64, y: f64 },

    #[error("Hash code {code} of entity {index} does not fit in {bits} bits")]
    InvalidHashCode { index: usize, code: HashCode, bits: u32 },

    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Cell layout of the spatial hash grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GridMode {
    /// Longitude/latitude degrees, bit-interleaved codes, radius in meters
    #[default]
    Geographic,
    /// Cartesian map units, row-major codes, radius in map units
    Orthogonal,
}

impl GridMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GridMode::Geographic => "longlat",
            GridMode::Orthogonal => "orthogonal",
        }
    }
}

impl FromStr for GridMode {
    type Err = NeighborError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "longlat" | "geographic" => Ok(GridMode::Geographic),
            "orthogonal" => Ok(GridMode::Orthogonal),
            _ => Err(NeighborError::UnknownGridMode(s.to_string())),
        }
    }
}

impl fmt::Display for GridMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis-aligned extent shared by every entity of one query.
///
/// Both edges are inclusive: a coordinate on `max_x`/`max_y` falls in the
/// last row or column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Whole globe in longitude/latitude degrees
    pub const WORLD: BoundingBox = BoundingBox {
        min_x: -180.0,
        max_x: 180.0,
        min_y: -90.0,
        max_y: 90.0,
    };

    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> NeighborResult<Self> {
        let bbox = Self {
            min_x,
            max_x,
            min_y,
            max_y,
        };
        bbox.validate()?;
        Ok(bbox)
    }

    pub fn validate(&self) -> NeighborResult<()> {
        let all_finite = [self.min_x, self.max_x, self.min_y, self.max_y]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(NeighborError::InvalidBoundingBox(format!(
                "bounds must be finite, got {:?}",
                self
            )));
        }
        if self.min_x >= self.max_x || self.min_y >= self.max_y {
            return Err(NeighborError::InvalidBoundingBox(format!(
                "min must be below max on both axes, got x: {}..{}, y: {}..{}",
                self.min_x, self.max_x, self.min_y, self.max_y
            )));
        }
        Ok(())
    }

    /// Geographic boxes must stay within longitude ±180 and latitude ±90.
    pub(crate) fn validate_geographic(&self) -> NeighborResult<()> {
        if self.min_x < -180.0 || self.max_x > 180.0 || self.min_y < -90.0 || self.max_y > 90.0 {
            return Err(NeighborError::InvalidBoundingBox(format!(
                "geographic bounds must lie within -180..180, -90..90, got x: {}..{}, y: {}..{}",
                self.min_x, self.max_x, self.min_y, self.max_y
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// NaN coordinates are never contained.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::WORLD
    }
}

/// Unsigned integer used for neighbor ids in result arrays.
///
/// The maximum value is reserved as the "no neighbor" sentinel.
pub trait NeighborIndex:
    Copy + Clone + Send + Sync + PartialEq + Eq + Ord + std::hash::Hash + fmt::Debug + 'static
{
    const SENTINEL: Self;

    /// Narrowing is safe because the width is chosen from the entity count.
    fn from_usize(value: usize) -> Self;

    fn to_usize(self) -> usize;

    fn to_u64(self) -> u64;

    #[inline]
    fn is_sentinel(self) -> bool {
        self == Self::SENTINEL
    }
}

impl NeighborIndex for u32 {
    const SENTINEL: Self = u32::MAX;

    #[inline]
    fn from_usize(value: usize) -> Self {
        value as u32
    }

    #[inline]
    fn to_usize(self) -> usize {
        self as usize
    }

    #[inline]
    fn to_u64(self) -> u64 {
        self as u64
    }
}

impl NeighborIndex for u64 {
    const SENTINEL: Self = u64::MAX;

    #[inline]
    fn from_usize(value: usize) -> Self {
        value as u64
    }

    #[inline]
    fn to_usize(self) -> usize {
        self as usize
    }

    #[inline]
    fn to_u64(self) -> u64 {
        self
    }
}

/// Integer width of the result array, fixed once per call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexWidth {
    U32,
    U64,
}

impl IndexWidth {
    /// 32 bits unless an entity id could collide with the u32 sentinel.
    pub fn for_entity_count(n_entities: usize) -> Self {
        if (n_entities as u64) < u32::MAX as u64 {
            IndexWidth::U32
        } else {
            IndexWidth::U64
        }
    }

    pub fn sentinel(&self) -> u64 {
        match self {
            IndexWidth::U32 => u32::SENTINEL as u64,
            IndexWidth::U64 => u64::SENTINEL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_mode_parsing() {
        assert_eq!("longlat".parse::<GridMode>().unwrap(), GridMode::Geographic);
        assert_eq!("Geographic".parse::<GridMode>().unwrap(), GridMode::Geographic);
        assert_eq!(" orthogonal ".parse::<GridMode>().unwrap(), GridMode::Orthogonal);

        let err = "hexagonal".parse::<GridMode>().unwrap_err();
        assert!(matches!(err, NeighborError::UnknownGridMode(ref s) if s == "hexagonal"));
    }

    #[test]
    fn test_bounding_box_validation() {
        assert!(BoundingBox::new(-10.0, 10.0, -10.0, 10.0).is_ok());
        assert!(BoundingBox::new(10.0, -10.0, -10.0, 10.0).is_err());
        assert!(BoundingBox::new(0.0, 0.0, 0.0, 1.0).is_err());
        assert!(BoundingBox::new(0.0, f64::INFINITY, 0.0, 1.0).is_err());
        assert!(BoundingBox::WORLD.validate_geographic().is_ok());
        assert!(BoundingBox::new(0.0, 200.0, 0.0, 10.0)
            .unwrap()
            .validate_geographic()
            .is_err());
    }

    #[test]
    fn test_bounding_box_contains_edges() {
        let bbox = BoundingBox::new(-10.0, 10.0, -10.0, 10.0).unwrap();
        assert!(bbox.contains(-10.0, 10.0));
        assert!(bbox.contains(10.0, -10.0));
        assert!(!bbox.contains(10.000_001, 0.0));
        assert!(!bbox.contains(f64::NAN, 0.0));
    }

    #[test]
    fn test_index_width_selection() {
        assert_eq!(IndexWidth::for_entity_count(0), IndexWidth::U32);
        assert_eq!(IndexWidth::for_entity_count(1_000_000), IndexWidth::U32);
        assert_eq!(
            IndexWidth::for_entity_count(u32::MAX as usize - 1),
            IndexWidth::U32
        );
        assert_eq!(IndexWidth::for_entity_count(u32::MAX as usize), IndexWidth::U64);
        assert_eq!(IndexWidth::U32.sentinel(), u32::MAX as u64);
    }

    #[test]
    fn test_sentinel() {
        assert!(u32::SENTINEL.is_sentinel());
        assert!(!u64::from_usize(7).is_sentinel());
        assert_eq!(u64::from_usize(7).to_usize(), 7);
    }
}
