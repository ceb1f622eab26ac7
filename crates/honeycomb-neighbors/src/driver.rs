// Copyright 2025 Honeycomb Contributors
// SPDX-License-Identifier: Apache-2.0

/*!
Public entry point for capped radius neighbor search.

[`find_neighbors`] validates the query, encodes (or coarsens) entity locations,
builds the target and source bucket tables, runs the query engine at the
integer width the entity count allows, and maps results back to caller ids.
*/

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use tracing::debug;

use honeycomb_config::HoneycombConfig;

use crate::index::{BucketTable, CrossMap, Pool};
use crate::query::QueryEngine;
use crate::spatial::Codec;
use crate::types::{
    BoundingBox, GridMode, HashCode, IndexWidth, NeighborError, NeighborIndex, NeighborResult,
    MAX_BITS,
};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Entity locations for one query, indexed by entity id
#[derive(Debug, Clone, Copy)]
pub enum Locations<'a> {
    /// N×2 array of (x, y) coordinates
    Coordinates(ArrayView2<'a, f64>),
    /// Codes encoded earlier at precision `bits` (at least the query's)
    HashCodes {
        codes: ArrayView1<'a, HashCode>,
        bits: u32,
    },
}

impl<'a> Locations<'a> {
    pub fn len(&self) -> usize {
        match self {
            Locations::Coordinates(coords) => coords.nrows(),
            Locations::HashCodes { codes, .. } => codes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parameters of one neighbor search
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborQuery {
    /// Meters for geographic grids, bounding box units for orthogonal grids
    pub radius: f64,
    pub n_neighbor: usize,
    pub bits: u32,
    pub bbox: BoundingBox,
    pub grid: GridMode,
    pub seed: Option<u64>,
    /// 0 runs on the global rayon pool
    pub max_threads: usize,
}

impl NeighborQuery {
    /// Geographic query over the whole globe
    pub fn new(radius: f64, n_neighbor: usize, bits: u32) -> Self {
        Self {
            radius,
            n_neighbor,
            bits,
            bbox: BoundingBox::WORLD,
            grid: GridMode::Geographic,
            seed: None,
            max_threads: 0,
        }
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = bbox;
        self
    }

    pub fn with_grid(mut self, grid: GridMode) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }

    pub fn validate(&self) -> NeighborResult<()> {
        self.codec().map(|_| ())
    }

    /// Validate every parameter and build the codec for this query
    pub fn codec(&self) -> NeighborResult<Codec> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(NeighborError::InvalidRadius(self.radius));
        }
        if self.n_neighbor == 0 {
            return Err(NeighborError::InvalidNeighborCount);
        }
        Codec::new(self.bits, self.bbox, self.grid)
    }
}

impl TryFrom<&HoneycombConfig> for NeighborQuery {
    type Error = NeighborError;

    fn try_from(config: &HoneycombConfig) -> Result<Self, Self::Error> {
        let neighbors = &config.neighbors;
        let bbox = BoundingBox::new(
            neighbors.bbox.min_x,
            neighbors.bbox.max_x,
            neighbors.bbox.min_y,
            neighbors.bbox.max_y,
        )?;
        let query = Self {
            radius: neighbors.radius,
            n_neighbor: neighbors.n_neighbor,
            bits: neighbors.bits,
            bbox,
            grid: neighbors.grid.parse()?,
            seed: neighbors.seed,
            max_threads: config.parallel.max_threads,
        };
        query.validate()?;
        Ok(query)
    }
}

/// Neighbor ids per queried entity, at the width chosen for the call.
///
/// Row `i` belongs to the `i`-th source id (or entity `i`). Empty slots hold
/// the sentinel, the maximum value of the element type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NeighborArray {
    U32(Array2<u32>),
    U64(Array2<u64>),
}

impl NeighborArray {
    pub fn shape(&self) -> (usize, usize) {
        match self {
            NeighborArray::U32(a) => a.dim(),
            NeighborArray::U64(a) => a.dim(),
        }
    }

    pub fn nrows(&self) -> usize {
        self.shape().0
    }

    pub fn n_neighbor(&self) -> usize {
        self.shape().1
    }

    pub fn width(&self) -> IndexWidth {
        match self {
            NeighborArray::U32(_) => IndexWidth::U32,
            NeighborArray::U64(_) => IndexWidth::U64,
        }
    }

    pub fn sentinel(&self) -> u64 {
        self.width().sentinel()
    }

    /// Neighbor in `slot` of `row`; `None` for empty or out-of-range slots
    pub fn get(&self, row: usize, slot: usize) -> Option<u64> {
        let value = match self {
            NeighborArray::U32(a) => a.get((row, slot)).map(|v| v.to_u64()),
            NeighborArray::U64(a) => a.get((row, slot)).copied(),
        }?;
        (value != self.sentinel()).then_some(value)
    }

    /// Occupied slots of `row`
    pub fn neighbors(&self, row: usize) -> Vec<u64> {
        (0..self.n_neighbor())
            .filter_map(|slot| self.get(row, slot))
            .collect()
    }

    pub fn as_u32(&self) -> Option<&Array2<u32>> {
        match self {
            NeighborArray::U32(a) => Some(a),
            NeighborArray::U64(_) => None,
        }
    }

    pub fn as_u64(&self) -> Option<&Array2<u64>> {
        match self {
            NeighborArray::U32(_) => None,
            NeighborArray::U64(a) => Some(a),
        }
    }

    /// Widen to u64; empty slots become `u64::MAX`
    pub fn to_u64(&self) -> Array2<u64> {
        match self {
            NeighborArray::U32(a) => a.mapv(|v| if v.is_sentinel() { u64::SENTINEL } else { v as u64 }),
            NeighborArray::U64(a) => a.clone(),
        }
    }
}

/// Encode an N×2 coordinate array with `codec`.
///
/// # Errors
/// `InvalidDimensions` unless the array has two columns; `EntityOutOfBounds`
/// for a coordinate outside the codec's bounding box.
pub fn encode_locations(coords: ArrayView2<'_, f64>, codec: &Codec) -> NeighborResult<Array1<HashCode>> {
    if coords.ncols() != 2 {
        return Err(NeighborError::InvalidDimensions {
            shape: coords.shape().to_vec(),
        });
    }

    let encode_row = |index: usize| {
        let (x, y) = (coords[[index, 0]], coords[[index, 1]]);
        codec
            .encode(x, y)
            .map_err(|_| NeighborError::EntityOutOfBounds { index, x, y })
    };

    #[cfg(feature = "parallel")]
    let codes: NeighborResult<Vec<HashCode>> = (0..coords.nrows()).into_par_iter().map(encode_row).collect();
    #[cfg(not(feature = "parallel"))]
    let codes: NeighborResult<Vec<HashCode>> = (0..coords.nrows()).map(encode_row).collect();

    Ok(Array1::from_vec(codes?))
}

fn coarsen_codes(codes: ArrayView1<'_, HashCode>, from_bits: u32, codec: &Codec) -> NeighborResult<Vec<HashCode>> {
    if from_bits < codec.bits() || from_bits > MAX_BITS {
        return Err(NeighborError::InvalidBits {
            bits: from_bits,
            min: codec.bits(),
            max: MAX_BITS,
        });
    }

    let coarsen = |(index, &code): (usize, &HashCode)| {
        if from_bits < MAX_BITS && code >> from_bits != 0 {
            return Err(NeighborError::InvalidHashCode {
                index,
                code,
                bits: from_bits,
            });
        }
        codec.reduce_precision(code, from_bits)
    };

    // Views may be strided, so copy before handing out indices to rayon.
    let codes = codes.to_vec();
    #[cfg(feature = "parallel")]
    let reduced: NeighborResult<Vec<HashCode>> = codes.par_iter().enumerate().map(coarsen).collect();
    #[cfg(not(feature = "parallel"))]
    let reduced: NeighborResult<Vec<HashCode>> = codes.iter().enumerate().map(coarsen).collect();

    Ok(reduced?)
}

fn validate_ids(ids: &[usize], n_entities: usize, pool: &'static str) -> NeighborResult<()> {
    let mut seen = vec![false; n_entities];
    for &id in ids {
        if id >= n_entities {
            return Err(NeighborError::InvalidIds {
                pool,
                reason: format!("id {} out of range for {} entities", id, n_entities),
            });
        }
        if std::mem::replace(&mut seen[id], true) {
            return Err(NeighborError::InvalidIds {
                pool,
                reason: format!("id {} appears more than once", id),
            });
        }
    }
    Ok(())
}

/// Replace target pool-local ids with caller entity ids
fn reindex<I: NeighborIndex>(raw: &mut Array2<I>, ids: &[usize]) {
    let lookup = |v: I| {
        if v.is_sentinel() {
            v
        } else {
            I::from_usize(ids[v.to_usize()])
        }
    };
    #[cfg(feature = "parallel")]
    raw.par_mapv_inplace(lookup);
    #[cfg(not(feature = "parallel"))]
    raw.mapv_inplace(lookup);
}

/// Find up to `query.n_neighbor` neighbors within `query.radius` for every
/// source entity.
///
/// `source_ids` selects the entities that receive a result row (all when
/// `None`), `target_ids` the entities that may appear as neighbors (all when
/// `None`). Result values are entity ids, never the querying entity itself.
/// When a row has more candidates than slots, the kept neighbors are a
/// uniform random subset.
///
/// # Errors
/// Any invalid parameter, malformed location array, out-of-box coordinate or
/// invalid id list fails the whole call before work starts.
pub fn find_neighbors(
    locations: Locations<'_>,
    query: &NeighborQuery,
    source_ids: Option<&[usize]>,
    target_ids: Option<&[usize]>,
) -> NeighborResult<NeighborArray> {
    let codec = query.codec()?;
    let n_entities = locations.len();
    if let Some(ids) = source_ids {
        validate_ids(ids, n_entities, "source")?;
    }
    if let Some(ids) = target_ids {
        validate_ids(ids, n_entities, "target")?;
    }

    let run = || search(locations, query, &codec, source_ids, target_ids);

    #[cfg(feature = "parallel")]
    if query.max_threads > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(query.max_threads)
            .build()
            .map_err(|e| NeighborError::ThreadPool(e.to_string()))?;
        return pool.install(run);
    }

    run()
}

fn search(
    locations: Locations<'_>,
    query: &NeighborQuery,
    codec: &Codec,
    source_ids: Option<&[usize]>,
    target_ids: Option<&[usize]>,
) -> NeighborResult<NeighborArray> {
    let n_entities = locations.len();
    let codes = match locations {
        Locations::Coordinates(coords) => encode_locations(coords, codec)?.to_vec(),
        Locations::HashCodes { codes, bits } => coarsen_codes(codes, bits, codec)?,
    };

    let target_pool = target_ids.map_or(Pool::All(n_entities), Pool::Subset);
    let source_pool = source_ids.map_or(Pool::All(n_entities), Pool::Subset);
    let shared = source_pool == target_pool;

    let target = BucketTable::build(&codes, target_pool);
    let source_table = (!shared).then(|| BucketTable::build(&codes, source_pool));
    let source = source_table.as_ref().unwrap_or(&target);
    let cross = if shared {
        CrossMap::identity()
    } else {
        CrossMap::build(&target, target_pool, source, source_pool, n_entities)
    };

    let width = IndexWidth::for_entity_count(n_entities);
    debug!(
        target: "honeycomb-neighbors",
        entities = n_entities,
        sources = source.len(),
        targets = target.len(),
        source_cells = source.unique_len(),
        target_cells = target.unique_len(),
        largest_cell = target.max_bucket(),
        shared_pool = shared,
        width = ?width,
        "Built bucket tables"
    );

    let engine = QueryEngine::new(codec, query.radius, query.n_neighbor, &target, source, &cross)
        .with_seed(query.seed);

    match width {
        IndexWidth::U32 => {
            let mut raw = engine.run::<u32>()?;
            if let Some(ids) = target_ids {
                reindex(&mut raw, ids);
            }
            Ok(NeighborArray::U32(raw))
        }
        IndexWidth::U64 => {
            let mut raw = engine.run::<u64>()?;
            if let Some(ids) = target_ids {
                reindex(&mut raw, ids);
            }
            Ok(NeighborArray::U64(raw))
        }
    }
}
