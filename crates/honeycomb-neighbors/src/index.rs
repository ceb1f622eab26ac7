// Copyright 2025 Honeycomb Contributors
// SPDX-License-Identifier: Apache-2.0

/*!
Sorted bucket tables over entity hash codes.

A [`BucketTable`] is built once per pool per query call. It orders the pool's
entities by hash code (stable, so equal codes keep ascending id order) and
records where each unique code's bucket starts in that order.

Positions inside a table are "sorted positions"; values stored in `order` are
"pool-local ids", i.e. indices into the pool's id list (or entity ids directly
when the pool covers every entity).
*/

use crate::types::HashCode;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Entities taking part in one side of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool<'a> {
    /// Every entity `0..n`
    All(usize),
    /// A caller-supplied subset, in caller order
    Subset(&'a [usize]),
}

impl<'a> Pool<'a> {
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Pool::All(n) => *n,
            Pool::Subset(ids) => ids.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entity id of pool-local id `local`
    #[inline]
    pub fn entity(&self, local: usize) -> usize {
        match self {
            Pool::All(_) => local,
            Pool::Subset(ids) => ids[local],
        }
    }
}

/// Sort order, unique codes and bucket boundaries of one pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketTable {
    /// Sorted position -> pool-local id
    order: Vec<usize>,
    /// Strictly increasing unique codes
    unique_codes: Vec<HashCode>,
    /// Bucket `i` occupies sorted positions `cumulative[i]..cumulative[i + 1]`
    cumulative: Vec<usize>,
}

impl BucketTable {
    /// Build the table for `pool`; `codes` is indexed by entity id.
    pub fn build(codes: &[HashCode], pool: Pool<'_>) -> Self {
        let code_of = |local: usize| codes[pool.entity(local)];

        let mut order: Vec<usize> = (0..pool.len()).collect();
        #[cfg(feature = "parallel")]
        order.par_sort_by_key(|&local| code_of(local));
        #[cfg(not(feature = "parallel"))]
        order.sort_by_key(|&local| code_of(local));

        let mut unique_codes = Vec::new();
        let mut cumulative = Vec::new();
        let mut previous: Option<HashCode> = None;
        for (position, &local) in order.iter().enumerate() {
            let code = code_of(local);
            if previous != Some(code) {
                unique_codes.push(code);
                cumulative.push(position);
                previous = Some(code);
            }
        }
        cumulative.push(order.len());

        Self {
            order,
            unique_codes,
            cumulative,
        }
    }

    /// Number of entities in the pool
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of distinct codes (buckets)
    #[inline]
    pub fn unique_len(&self) -> usize {
        self.unique_codes.len()
    }

    #[inline]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    #[inline]
    pub fn unique_codes(&self) -> &[HashCode] {
        &self.unique_codes
    }

    #[inline]
    pub fn cumulative(&self) -> &[usize] {
        &self.cumulative
    }

    /// Sorted positions of bucket `i`
    #[inline]
    pub fn bucket(&self, i: usize) -> std::ops::Range<usize> {
        self.cumulative[i]..self.cumulative[i + 1]
    }

    /// Bucket index holding `code`, if any entity has it
    pub fn find(&self, code: HashCode) -> Option<usize> {
        self.unique_codes.binary_search(&code).ok()
    }

    /// Pool-local id -> sorted position
    pub fn inverse_order(&self) -> Vec<usize> {
        let mut inverse = vec![0usize; self.order.len()];
        for (position, &local) in self.order.iter().enumerate() {
            inverse[local] = position;
        }
        inverse
    }

    /// Largest bucket size
    pub fn max_bucket(&self) -> usize {
        self.cumulative
            .windows(2)
            .map(|w| w[1] - w[0])
            .max()
            .unwrap_or(0)
    }
}

/// Source sorted position -> target sorted position of the same entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrossMap {
    /// Source and target are the same table
    Identity,
    /// `ABSENT` marks sources that are not part of the target pool
    Mapped(Vec<usize>),
}

impl CrossMap {
    pub const ABSENT: usize = usize::MAX;

    pub fn identity() -> Self {
        CrossMap::Identity
    }

    /// Map every source sorted position to the target sorted position of the
    /// same entity. `n_entities` bounds the entity ids of both pools.
    pub fn build(
        target: &BucketTable,
        target_pool: Pool<'_>,
        source: &BucketTable,
        source_pool: Pool<'_>,
        n_entities: usize,
    ) -> Self {
        let mut target_position = vec![Self::ABSENT; n_entities];
        for (position, &local) in target.order().iter().enumerate() {
            target_position[target_pool.entity(local)] = position;
        }

        let lookup = |&local: &usize| target_position[source_pool.entity(local)];
        #[cfg(feature = "parallel")]
        let mapped: Vec<usize> = source.order().par_iter().map(lookup).collect();
        #[cfg(not(feature = "parallel"))]
        let mapped: Vec<usize> = source.order().iter().map(lookup).collect();

        CrossMap::Mapped(mapped)
    }

    /// Target sorted position of the entity at source sorted position `k`
    #[inline]
    pub fn target_position(&self, k: usize) -> Option<usize> {
        match self {
            CrossMap::Identity => Some(k),
            CrossMap::Mapped(mapped) => match mapped[k] {
                Self::ABSENT => None,
                position => Some(position),
            },
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, CrossMap::Identity)
    }
}
