// Copyright 2025 Honeycomb Contributors
// SPDX-License-Identifier: Apache-2.0

/*!
Capped radius neighbor query over sorted bucket tables.

## Units of work

A unit is one unique source hash code. All entities of that code share the
same candidate cells, so the cell enumeration and the merge walk against the
target table run once per unit.

## Output ownership

Rows are first laid out in source sorted order, where every unit's entities
are contiguous. The row buffer is split into one disjoint slice per unit
before the parallel loop, so units never share an output row. A final pass
moves rows back to pool-local order.
*/

pub mod sampling;

use ndarray::Array2;
use tracing::trace;

use crate::index::{BucketTable, CrossMap};
use crate::rng::{unit_rng, UnitRng};
use crate::spatial::Codec;
use crate::types::{HashCode, NeighborError, NeighborIndex, NeighborResult};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use sampling::sample_without_replacement;

/// Run of target sorted positions matched by candidate cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    /// First target sorted position
    pub start: usize,
    /// Number of entities
    pub count: usize,
    /// Candidates in all earlier spans
    pub cumulative: usize,
}

/// Candidate spans of one unit
#[derive(Debug, Default)]
pub(crate) struct Candidates {
    pub spans: Vec<Span>,
    /// Span holding the unit's own cell, when the target pool has it
    pub self_span: Option<usize>,
    pub total: usize,
}

impl Candidates {
    /// Target sorted position of pool-relative candidate `index`
    #[inline]
    pub fn position(&self, index: usize) -> usize {
        let span = self.spans.partition_point(|s| s.cumulative <= index) - 1;
        let span = &self.spans[span];
        span.start + (index - span.cumulative)
    }

    /// Pool-relative index of target sorted position `position`, if it lies
    /// in the unit's own cell
    #[inline]
    pub fn self_index(&self, position: usize) -> Option<usize> {
        let span = &self.spans[self.self_span?];
        (span.start..span.start + span.count)
            .contains(&position)
            .then(|| span.cumulative + (position - span.start))
    }

    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.spans.iter().flat_map(|s| s.start..s.start + s.count)
    }
}

/// Walk sorted `cells` against the target table's unique codes.
///
/// The cursor only moves forward. Consecutive cell codes continue from the
/// cursor directly; a gap repositions it with a binary search over the
/// remaining unique codes. Buckets adjacent in target sorted order merge into
/// one span.
pub(crate) fn match_cells(cells: &[HashCode], own: HashCode, target: &BucketTable) -> Candidates {
    let uniques = target.unique_codes();
    let cumulative = target.cumulative();

    let mut found = Candidates::default();
    let mut cursor = 0usize;
    let mut previous: Option<HashCode> = None;

    for &cell in cells {
        if cursor >= uniques.len() {
            break;
        }
        let contiguous = previous.and_then(|p| p.checked_add(1)) == Some(cell);
        if !contiguous {
            cursor += uniques[cursor..].partition_point(|&u| u < cell);
            if cursor >= uniques.len() {
                break;
            }
        }
        previous = Some(cell);
        if uniques[cursor] != cell {
            continue;
        }

        let start = cumulative[cursor];
        let count = cumulative[cursor + 1] - start;
        match found.spans.last_mut() {
            Some(last) if last.start + last.count == start => last.count += count,
            _ => found.spans.push(Span {
                start,
                count,
                cumulative: found.total,
            }),
        }
        found.total += count;
        if cell == own {
            found.self_span = Some(found.spans.len() - 1);
        }
        cursor += 1;
    }
    found
}

/// One neighbor query over prepared bucket tables.
///
/// Rows of the result follow source pool-local order; values are target
/// pool-local ids or the sentinel of `I`.
pub struct QueryEngine<'a> {
    codec: &'a Codec,
    radius: f64,
    n_neighbor: usize,
    target: &'a BucketTable,
    source: &'a BucketTable,
    cross: &'a CrossMap,
    seed: Option<u64>,
}

impl<'a> QueryEngine<'a> {
    pub fn new(
        codec: &'a Codec,
        radius: f64,
        n_neighbor: usize,
        target: &'a BucketTable,
        source: &'a BucketTable,
        cross: &'a CrossMap,
    ) -> Self {
        Self {
            codec,
            radius,
            n_neighbor,
            target,
            source,
            cross,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn run<I: NeighborIndex>(&self) -> NeighborResult<Array2<I>> {
        let n = self.n_neighbor;
        if n == 0 {
            return Err(NeighborError::InvalidNeighborCount);
        }
        let rows = self.source.len();
        let cells = rows.checked_mul(n).ok_or_else(|| {
            NeighborError::Internal(format!("result of {} x {} overflows", rows, n))
        })?;

        let mut sorted_rows = vec![I::SENTINEL; cells];
        let mut units: Vec<(usize, &mut [I])> = Vec::with_capacity(self.source.unique_len());
        let mut rest: &mut [I] = &mut sorted_rows;
        for unit in 0..self.source.unique_len() {
            let len = self.source.bucket(unit).len() * n;
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(len);
            units.push((unit, head));
            rest = tail;
        }

        #[cfg(feature = "parallel")]
        units
            .into_par_iter()
            .for_each(|(unit, out)| self.process_unit(unit, out));
        #[cfg(not(feature = "parallel"))]
        units
            .into_iter()
            .for_each(|(unit, out)| self.process_unit(unit, out));

        let inverse = self.source.inverse_order();
        let mut result = vec![I::SENTINEL; cells];
        let place = |(local, row): (usize, &mut [I])| {
            let at = inverse[local] * n;
            row.copy_from_slice(&sorted_rows[at..at + n]);
        };
        #[cfg(feature = "parallel")]
        result.par_chunks_mut(n).enumerate().for_each(place);
        #[cfg(not(feature = "parallel"))]
        result.chunks_mut(n).enumerate().for_each(place);

        Array2::from_shape_vec((rows, n), result)
            .map_err(|e| NeighborError::Internal(format!("result shape: {}", e)))
    }

    fn process_unit<I: NeighborIndex>(&self, unit: usize, out: &mut [I]) {
        let n = self.n_neighbor;
        let code = self.source.unique_codes()[unit];
        let cells = self.codec.enumerate_shifts_for_code(code, self.radius);
        let candidates = match_cells(&cells, code, self.target);

        trace!(
            target: "honeycomb-neighbors",
            unit,
            code,
            cells = cells.len(),
            spans = candidates.spans.len(),
            candidates = candidates.total,
            "Processing unit"
        );

        if candidates.total == 0 {
            return;
        }

        let target_order = self.target.order();
        let mut rng: Option<UnitRng> = None;
        let mut drawn = Vec::with_capacity(n);

        for (row, k) in out.chunks_mut(n).zip(self.source.bucket(unit)) {
            let own_position = self.cross.target_position(k);
            let own_index = own_position.and_then(|p| candidates.self_index(p));
            let available = candidates.total - usize::from(own_index.is_some());

            if available <= n {
                let others = candidates
                    .positions()
                    .filter(|&p| Some(p) != own_position);
                for (slot, position) in row.iter_mut().zip(others) {
                    *slot = I::from_usize(target_order[position]);
                }
            } else {
                let rng = rng.get_or_insert_with(|| unit_rng(self.seed, unit));
                sample_without_replacement(rng, candidates.total, own_index, n, &mut drawn);
                for (slot, &index) in row.iter_mut().zip(drawn.iter()) {
                    *slot = I::from_usize(target_order[candidates.position(index)]);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Pool;
    use crate::types::{BoundingBox, GridMode};

    fn grid_codec() -> Codec {
        let bbox = BoundingBox::new(0.0, 32.0, 0.0, 32.0).unwrap();
        Codec::new(10, bbox, GridMode::Orthogonal).unwrap()
    }

    #[test]
    fn test_match_cells_merges_adjacent_buckets() {
        let codes = [1, 2, 2, 3, 7, 9, 9];
        let target = BucketTable::build(&codes, Pool::All(codes.len()));

        let found = match_cells(&[0, 1, 2, 3, 8, 9], 2, &target);
        assert_eq!(
            found.spans,
            vec![
                Span { start: 0, count: 4, cumulative: 0 },
                Span { start: 5, count: 2, cumulative: 4 },
            ]
        );
        assert_eq!(found.total, 6);
        assert_eq!(found.self_span, Some(0));
        assert_eq!(found.position(4), 5);
        assert_eq!(found.self_index(2), Some(2));
        assert_eq!(found.self_index(5), None);
    }

    #[test]
    fn test_candidates_map_across_separate_spans() {
        // Buckets 12 and 30 are outside the cell list and split the spans.
        let codes = [10, 10, 12, 20, 20, 20, 30, 40, 40];
        let target = BucketTable::build(&codes, Pool::All(codes.len()));

        let found = match_cells(&[10, 11, 20, 21, 40], 20, &target);
        assert_eq!(found.spans.len(), 3);
        assert_eq!(found.self_span, Some(1));
        assert_eq!(found.spans[1].cumulative, 2);
        assert_eq!(found.total, 7);

        let positions: Vec<usize> = (0..found.total).map(|i| found.position(i)).collect();
        assert_eq!(positions, vec![0, 1, 3, 4, 5, 7, 8]);
        assert_eq!(found.positions().collect::<Vec<_>>(), positions);

        assert_eq!(found.self_index(3), Some(2));
        assert_eq!(found.self_index(5), Some(4));
        assert_eq!(found.self_index(1), None);
        assert_eq!(found.self_index(7), None);
    }

    #[test]
    fn test_match_cells_without_own_cell() {
        let codes = [4, 6];
        let target = BucketTable::build(&codes, Pool::All(codes.len()));
        let found = match_cells(&[3, 4, 5, 6, 20], 5, &target);
        assert_eq!(found.total, 2);
        assert_eq!(found.spans.len(), 1);
        assert_eq!(found.self_span, None);
    }

    #[test]
    fn test_run_direct_enumeration() {
        let codec = grid_codec();
        // Three entities in one cell, one far away.
        let codes: Vec<HashCode> = [(5.5, 5.5), (5.6, 5.2), (5.1, 5.9), (25.0, 25.0)]
            .iter()
            .map(|&(x, y)| codec.encode(x, y).unwrap())
            .collect();
        let table = BucketTable::build(&codes, Pool::All(codes.len()));
        let cross = CrossMap::identity();

        let result: Array2<u32> = QueryEngine::new(&codec, 1.0, 3, &table, &table, &cross)
            .run()
            .unwrap();

        assert_eq!(result.dim(), (4, 3));
        let mut row0: Vec<u32> = result.row(0).to_vec();
        row0.sort_unstable();
        assert_eq!(row0, vec![1, 2, u32::MAX]);
        assert!(result.row(3).iter().all(|&v| v == u32::MAX));
    }

    #[test]
    fn test_run_sampling_is_seeded() {
        let codec = grid_codec();
        let codes = vec![codec.encode(3.5, 3.5).unwrap(); 30];
        let table = BucketTable::build(&codes, Pool::All(codes.len()));
        let cross = CrossMap::identity();
        let engine = QueryEngine::new(&codec, 1.0, 4, &table, &table, &cross).with_seed(Some(11));

        let first: Array2<u64> = engine.run().unwrap();
        let second: Array2<u64> = engine.run().unwrap();
        assert_eq!(first, second);

        for (row_index, row) in first.rows().into_iter().enumerate() {
            let mut values: Vec<u64> = row.to_vec();
            assert!(!values.contains(&(row_index as u64)));
            values.sort_unstable();
            values.dedup();
            assert_eq!(values.len(), 4);
            assert!(values.iter().all(|&v| v < 30));
        }
    }

    #[test]
    fn test_run_empty_source() {
        let codec = grid_codec();
        let codes = [codec.encode(1.0, 1.0).unwrap()];
        let target = BucketTable::build(&codes, Pool::All(1));
        let source = BucketTable::build(&codes, Pool::Subset(&[]));
        let cross = CrossMap::build(&target, Pool::All(1), &source, Pool::Subset(&[]), 1);

        let result: Array2<u32> = QueryEngine::new(&codec, 1.0, 2, &target, &source, &cross)
            .run()
            .unwrap();
        assert_eq!(result.dim(), (0, 2));
    }
}
