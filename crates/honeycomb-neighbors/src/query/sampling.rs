// Copyright 2025 Honeycomb Contributors
// SPDX-License-Identifier: Apache-2.0

/*!
Bounded, unbiased sampling without replacement.

Robert Floyd's algorithm over a domain that grows by one value per draw. It
needs exactly `count` random integers regardless of the pool size, which keeps
dense cells cheap, and every admissible index ends up selected with the same
probability `count / available`.
*/

use ahash::AHashSet;
use rand::Rng;

/// Up to this many draws, collisions are found by scanning the output
pub const LINEAR_SCAN_LIMIT: usize = 20;

/// Draw `count` distinct indices from `0..pool_size`, never returning
/// `excluded`, into `out` (cleared first).
///
/// `count` is clamped to the number of admissible indices.
pub fn sample_without_replacement<R: Rng + ?Sized>(
    rng: &mut R,
    pool_size: usize,
    excluded: Option<usize>,
    count: usize,
    out: &mut Vec<usize>,
) {
    out.clear();

    let excluded = excluded.filter(|&e| e < pool_size);
    let available = pool_size - usize::from(excluded.is_some());
    let count = count.min(available);
    if count == 0 {
        return;
    }

    // Domain values are ranks among admissible indices; the excluded index
    // is skipped when mapping them back.
    let remap = |value: usize| match excluded {
        Some(e) if value >= e => value + 1,
        _ => value,
    };

    let first_boundary = available - count;
    if count <= LINEAR_SCAN_LIMIT {
        for boundary in first_boundary..available {
            let draw = rng.gen_range(0..=boundary);
            let value = if out.contains(&draw) { boundary } else { draw };
            out.push(value);
        }
    } else {
        let mut chosen = AHashSet::with_capacity(count);
        for boundary in first_boundary..available {
            let draw = rng.gen_range(0..=boundary);
            let value = if chosen.insert(draw) {
                draw
            } else {
                chosen.insert(boundary);
                boundary
            };
            out.push(value);
        }
    }

    for value in out.iter_mut() {
        *value = remap(*value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn assert_valid(out: &[usize], pool_size: usize, excluded: Option<usize>) {
        let mut seen = vec![false; pool_size];
        for &v in out {
            assert!(v < pool_size, "{} outside pool of {}", v, pool_size);
            assert_ne!(Some(v), excluded, "excluded index was drawn");
            assert!(!seen[v], "duplicate draw {}", v);
            seen[v] = true;
        }
    }

    #[test]
    fn test_exhaustive_draw_returns_everything_but_excluded() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut out = Vec::new();
        sample_without_replacement(&mut rng, 8, Some(3), 7, &mut out);
        out.sort_unstable();
        assert_eq!(out, vec![0, 1, 2, 4, 5, 6, 7]);
    }

    #[test]
    fn test_count_is_clamped() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut out = vec![99];
        sample_without_replacement(&mut rng, 4, Some(0), 10, &mut out);
        assert_eq!(out.len(), 3);
        assert_valid(&out, 4, Some(0));

        sample_without_replacement(&mut rng, 1, Some(0), 5, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_linear_path_is_uniform() {
        let mut rng = StdRng::seed_from_u64(42);
        let (pool, excluded, count, trials) = (50usize, 7usize, 10usize, 20_000usize);
        let mut hits = vec![0usize; pool];
        let mut out = Vec::new();

        for _ in 0..trials {
            sample_without_replacement(&mut rng, pool, Some(excluded), count, &mut out);
            assert_eq!(out.len(), count);
            assert_valid(&out, pool, Some(excluded));
            for &v in &out {
                hits[v] += 1;
            }
        }

        let expected = count as f64 / (pool - 1) as f64;
        for (index, &h) in hits.iter().enumerate() {
            if index == excluded {
                assert_eq!(h, 0);
                continue;
            }
            let freq = h as f64 / trials as f64;
            assert!(
                (freq - expected).abs() < 0.02,
                "index {} drawn with frequency {}, expected {}",
                index,
                freq,
                expected
            );
        }
    }

    #[test]
    fn test_set_path_is_uniform() {
        let mut rng = StdRng::seed_from_u64(7);
        let (pool, count, trials) = (200usize, 40usize, 5_000usize);
        assert!(count > LINEAR_SCAN_LIMIT);
        let mut hits = vec![0usize; pool];
        let mut out = Vec::new();

        for _ in 0..trials {
            sample_without_replacement(&mut rng, pool, None, count, &mut out);
            assert_eq!(out.len(), count);
            assert_valid(&out, pool, None);
            for &v in &out {
                hits[v] += 1;
            }
        }

        let expected = count as f64 / pool as f64;
        for &h in &hits {
            let freq = h as f64 / trials as f64;
            assert!((freq - expected).abs() < 0.03, "frequency {} vs {}", freq, expected);
        }
    }
}
