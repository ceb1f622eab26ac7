// Copyright 2025 Honeycomb Contributors
// SPDX-License-Identifier: Apache-2.0

/*!
Per-unit random number generation for neighbor sampling.

Unseeded queries use the worker thread's `rand::thread_rng()`. Seeded queries
derive one independent `StdRng` per unit of work from the seed and the unit
index, so results do not depend on how rayon schedules the units.
*/

use rand::rngs::{StdRng, ThreadRng};
use rand::{RngCore, SeedableRng};

/// Random source owned by a single unit of work
pub enum UnitRng {
    Thread(ThreadRng),
    Seeded(StdRng),
}

impl RngCore for UnitRng {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        match self {
            UnitRng::Thread(rng) => rng.next_u32(),
            UnitRng::Seeded(rng) => rng.next_u32(),
        }
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        match self {
            UnitRng::Thread(rng) => rng.next_u64(),
            UnitRng::Seeded(rng) => rng.next_u64(),
        }
    }

    #[inline]
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        match self {
            UnitRng::Thread(rng) => rng.fill_bytes(dest),
            UnitRng::Seeded(rng) => rng.fill_bytes(dest),
        }
    }

    #[inline]
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        match self {
            UnitRng::Thread(rng) => rng.try_fill_bytes(dest),
            UnitRng::Seeded(rng) => rng.try_fill_bytes(dest),
        }
    }
}

/// SplitMix64 finalizer
#[inline]
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Get the random source for unit `unit` of a query
pub fn unit_rng(seed: Option<u64>, unit: usize) -> UnitRng {
    match seed {
        Some(seed) => {
            let derived = splitmix64(seed ^ splitmix64(unit as u64));
            UnitRng::Seeded(StdRng::seed_from_u64(derived))
        }
        None => UnitRng::Thread(rand::thread_rng()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_seeded_units_are_reproducible() {
        let mut first = unit_rng(Some(7), 3);
        let mut second = unit_rng(Some(7), 3);
        for _ in 0..16 {
            assert_eq!(first.next_u64(), second.next_u64());
        }
    }

    #[test]
    fn test_seeded_units_differ() {
        let mut u0 = unit_rng(Some(7), 0);
        let mut u1 = unit_rng(Some(7), 1);
        let s0: Vec<u32> = (0..8).map(|_| u0.gen_range(0..1_000_000)).collect();
        let s1: Vec<u32> = (0..8).map(|_| u1.gen_range(0..1_000_000)).collect();
        assert_ne!(s0, s1);
    }

    #[test]
    fn test_thread_rng_in_range() {
        let mut rng = unit_rng(None, 0);
        for _ in 0..100 {
            let v = rng.gen_range(0..=5usize);
            assert!(v <= 5);
        }
    }
}
