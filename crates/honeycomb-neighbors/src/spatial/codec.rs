// Copyright 2025 Honeycomb Contributors
// SPDX-License-Identifier: Apache-2.0

/*!
Fixed-precision spatial hash codec.

A codec quantizes coordinates of one bounding box into a grid of
`2^x_bits × 2^y_bits` cells, where `x_bits = ceil(bits / 2)` and
`y_bits = floor(bits / 2)`. Codes are right-aligned: a `bits`-wide code
occupies the low `bits` bits of the u64.

## Layouts

- **Geographic**: geohash bit order. Column and row bits are interleaved
  most-significant first, starting with the column (x) bit, so consecutive
  codes walk a Z-order curve.
- **Orthogonal**: row-major, `code = row << x_bits | col`. Horizontally
  adjacent cells have consecutive codes.

All geometry is corner based: `decode` returns the lower-left corner of a cell.
*/

use super::morton::{morton_decode_2d, morton_encode_2d};
use crate::types::{
    BoundingBox, GridMode, HashCode, NeighborError, NeighborResult, MAX_BITS, METERS_PER_DEGREE,
};

/// Smallest cosine used when converting longitude degrees to meters
const MIN_COS_LATITUDE: f64 = 1e-12;

/// Upper bound on the up-front allocation for one cell enumeration
const INITIAL_CAPACITY_LIMIT: usize = 1 << 16;

/// Split `bits` into per-axis precision: x gets the extra bit when odd.
#[inline]
fn axis_bits(bits: u32) -> (u32, u32) {
    ((bits + 1) / 2, bits / 2)
}

#[inline]
fn compose(grid: GridMode, bits: u32, col: u64, row: u64) -> HashCode {
    match grid {
        GridMode::Geographic => {
            // The most significant code bit belongs to the column.
            if bits % 2 == 0 {
                morton_encode_2d(row as u32, col as u32)
            } else {
                morton_encode_2d(col as u32, row as u32)
            }
        }
        GridMode::Orthogonal => {
            let (x_bits, _) = axis_bits(bits);
            (row << x_bits) | col
        }
    }
}

#[inline]
fn split(grid: GridMode, bits: u32, code: HashCode) -> (u64, u64) {
    match grid {
        GridMode::Geographic => {
            let (low, high) = morton_decode_2d(code);
            if bits % 2 == 0 {
                (high as u64, low as u64)
            } else {
                (low as u64, high as u64)
            }
        }
        GridMode::Orthogonal => {
            let (x_bits, _) = axis_bits(bits);
            let col_mask = (1u64 << x_bits) - 1;
            (code & col_mask, code >> x_bits)
        }
    }
}

/// Map `value` onto `[0, cells)`; the max edge lands in the last cell.
#[inline]
fn quantize(value: f64, min: f64, span: f64, cells: u64) -> u64 {
    let scaled = ((value - min) / span * cells as f64).floor();
    if scaled <= 0.0 {
        0
    } else {
        (scaled as u64).min(cells - 1)
    }
}

/// Encoder/decoder for one precision, bounding box and grid layout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Codec {
    bits: u32,
    x_bits: u32,
    y_bits: u32,
    bbox: BoundingBox,
    grid: GridMode,
}

impl Codec {
    pub fn new(bits: u32, bbox: BoundingBox, grid: GridMode) -> NeighborResult<Self> {
        if bits == 0 || bits > MAX_BITS {
            return Err(NeighborError::InvalidBits {
                bits,
                min: 1,
                max: MAX_BITS,
            });
        }
        bbox.validate()?;
        if grid == GridMode::Geographic {
            bbox.validate_geographic()?;
        }
        let (x_bits, y_bits) = axis_bits(bits);
        Ok(Self {
            bits,
            x_bits,
            y_bits,
            bbox,
            grid,
        })
    }

    #[inline]
    pub fn bits(&self) -> u32 {
        self.bits
    }

    #[inline]
    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    #[inline]
    pub fn grid(&self) -> GridMode {
        self.grid
    }

    /// Number of cells along x
    #[inline]
    pub fn columns(&self) -> u64 {
        1u64 << self.x_bits
    }

    /// Number of cells along y
    #[inline]
    pub fn rows(&self) -> u64 {
        1u64 << self.y_bits
    }

    /// Whether `code` fits in this codec's precision
    #[inline]
    pub fn is_valid_code(&self, code: HashCode) -> bool {
        self.bits == MAX_BITS || code >> self.bits == 0
    }

    /// (column, row) of the cell a code names
    #[inline]
    pub fn cell_of(&self, code: HashCode) -> (u64, u64) {
        split(self.grid, self.bits, code)
    }

    /// Code of the cell at (column, row); both must be inside the grid.
    #[inline]
    pub fn code_of(&self, col: u64, row: u64) -> HashCode {
        compose(self.grid, self.bits, col, row)
    }

    /// Encode a coordinate into the code of the cell containing it.
    ///
    /// # Errors
    /// `OutOfBounds` when the coordinate is non-finite or outside the box.
    pub fn encode(&self, x: f64, y: f64) -> NeighborResult<HashCode> {
        if !self.bbox.contains(x, y) {
            return Err(NeighborError::OutOfBounds { x, y });
        }
        let col = quantize(x, self.bbox.min_x, self.bbox.width(), self.columns());
        let row = quantize(y, self.bbox.min_y, self.bbox.height(), self.rows());
        Ok(self.code_of(col, row))
    }

    /// Lower-left corner of the cell named by `code`
    pub fn decode(&self, code: HashCode) -> (f64, f64) {
        let (col, row) = self.cell_of(code);
        let (w, h) = self.cell_window();
        (
            self.bbox.min_x + col as f64 * w,
            self.bbox.min_y + row as f64 * h,
        )
    }

    /// Cell dimensions in bounding box units
    #[inline]
    pub fn cell_window(&self) -> (f64, f64) {
        (
            self.bbox.width() / self.columns() as f64,
            self.bbox.height() / self.rows() as f64,
        )
    }

    /// Cell dimensions in radius units at `latitude`.
    ///
    /// Geographic cells are converted to meters with the horizontal extent
    /// shrunk by the cosine of the latitude. Orthogonal cells are already in
    /// radius units and ignore `latitude`.
    pub fn metric_window(&self, latitude: f64) -> (f64, f64) {
        let (w, h) = self.cell_window();
        match self.grid {
            GridMode::Geographic => {
                let cos = latitude.to_radians().cos().abs().max(MIN_COS_LATITUDE);
                (w * METERS_PER_DEGREE * cos, h * METERS_PER_DEGREE)
            }
            GridMode::Orthogonal => (w, h),
        }
    }

    /// Coarsen a code encoded at `from_bits` down to this codec's precision.
    ///
    /// The result names the cell of this codec that contains the finer cell.
    pub fn reduce_precision(&self, code: HashCode, from_bits: u32) -> NeighborResult<HashCode> {
        if from_bits < self.bits || from_bits > MAX_BITS {
            return Err(NeighborError::InvalidBits {
                bits: from_bits,
                min: self.bits,
                max: MAX_BITS,
            });
        }
        if from_bits == self.bits {
            return Ok(code);
        }
        let (from_x_bits, from_y_bits) = axis_bits(from_bits);
        let (col, row) = split(self.grid, from_bits, code);
        let col = col.checked_shr(from_x_bits - self.x_bits).unwrap_or(0);
        let row = row.checked_shr(from_y_bits - self.y_bits).unwrap_or(0);
        Ok(self.code_of(col, row))
    }

    #[inline]
    fn offset_cell(&self, col: u64, row: u64, dx: i64, dy: i64) -> Option<(u64, u64)> {
        let col = (col as i64).checked_add(dx)?;
        let row = (row as i64).checked_add(dy)?;
        if col < 0 || row < 0 || col as u64 >= self.columns() || row as u64 >= self.rows() {
            return None;
        }
        Some((col as u64, row as u64))
    }

    /// Code of the cell `dx` columns east and `dy` rows north of `code`.
    ///
    /// Returns `None` when the offset leaves the grid.
    pub fn shift(&self, code: HashCode, dx: i64, dy: i64) -> Option<HashCode> {
        let (col, row) = self.cell_of(code);
        self.offset_cell(col, row, dx, dy)
            .map(|(col, row)| self.code_of(col, row))
    }

    /// Codes of every cell within `radius` of the cell containing (x, y),
    /// sorted ascending.
    pub fn enumerate_shifts(&self, x: f64, y: f64, radius: f64) -> NeighborResult<Vec<HashCode>> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(NeighborError::InvalidRadius(radius));
        }
        let code = self.encode(x, y)?;
        Ok(self.enumerate_shifts_for_code(code, radius))
    }

    /// Codes of every cell within `radius` of the cell named by `code`,
    /// sorted ascending. The cell itself is always included.
    ///
    /// A candidate is kept when the gap between the two cell rectangles is
    /// at most `radius`. Geographic windows are measured at the most poleward
    /// latitude the search can reach, so the enumeration never undershoots.
    ///
    /// The grid does not wrap: offsets past the bounding box edges are
    /// dropped, so a cell at longitude 179.99° never reaches one at -179.99°.
    ///
    /// `radius` must be finite and positive.
    pub fn enumerate_shifts_for_code(&self, code: HashCode, radius: f64) -> Vec<HashCode> {
        debug_assert!(radius.is_finite() && radius > 0.0);

        let (col, row) = self.cell_of(code);
        let (cell_w, cell_h) = match self.grid {
            GridMode::Geographic => {
                let (_, corner_y) = self.decode(code);
                let (_, h_deg) = self.cell_window();
                let reach_deg = radius / METERS_PER_DEGREE;
                let poleward = (corner_y.abs().max((corner_y + h_deg).abs()) + reach_deg).min(90.0);
                self.metric_window(poleward)
            }
            GridMode::Orthogonal => self.cell_window(),
        };

        let reach_x = axis_reach(radius, cell_w, self.columns());
        let reach_y = axis_reach(radius, cell_h, self.rows());
        let radius_sq = radius * radius;

        let span = |reach: i64| (reach as usize).saturating_mul(2).saturating_add(1);
        let mut codes =
            Vec::with_capacity(span(reach_x).saturating_mul(span(reach_y)).min(INITIAL_CAPACITY_LIMIT));
        for dy in -reach_y..=reach_y {
            let gap_y = gap(dy, cell_h);
            let gap_y_sq = gap_y * gap_y;
            if gap_y_sq > radius_sq {
                continue;
            }
            for dx in -reach_x..=reach_x {
                let gap_x = gap(dx, cell_w);
                if gap_x * gap_x + gap_y_sq > radius_sq {
                    continue;
                }
                if let Some((c, r)) = self.offset_cell(col, row, dx, dy) {
                    codes.push(self.code_of(c, r));
                }
            }
        }
        codes.sort_unstable();
        codes
    }
}

/// Whole cells between two cells `offset` apart, in radius units
#[inline]
fn gap(offset: i64, size: f64) -> f64 {
    (offset.unsigned_abs().saturating_sub(1)) as f64 * size
}

/// Largest useful offset along one axis, capped by the grid extent
#[inline]
fn axis_reach(radius: f64, size: f64, count: u64) -> i64 {
    let max = (count - 1) as f64;
    let reach = (radius / size).floor() + 1.0;
    reach.min(max).max(0.0) as i64
}
