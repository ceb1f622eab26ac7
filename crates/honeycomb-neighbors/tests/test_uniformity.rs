// Copyright 2025 Honeycomb Contributors
// SPDX-License-Identifier: Apache-2.0

//! Statistical checks on which candidates survive the per-entity cap

use honeycomb_neighbors::{find_neighbors, BoundingBox, GridMode, Locations, NeighborQuery};
use ndarray::Array2;

const TRIALS: u64 = 2000;

fn clustered_query(n_neighbor: usize) -> NeighborQuery {
    NeighborQuery::new(0.5, n_neighbor, 12)
        .with_grid(GridMode::Orthogonal)
        .with_bbox(BoundingBox::new(0.0, 64.0, 0.0, 64.0).unwrap())
}

/// `n` entities spread inside one cell around (10, 10)
fn cluster(n: usize) -> Array2<f64> {
    Array2::from_shape_fn((n, 2), |(i, axis)| 10.1 + 0.05 * i as f64 + 0.01 * axis as f64)
}

#[test]
fn test_selection_frequency_single_pool() {
    let coords = cluster(11);
    let mut hits = [0u64; 11];

    for trial in 0..TRIALS {
        let query = clustered_query(5).with_seed(trial);
        let result = find_neighbors(Locations::Coordinates(coords.view()), &query, None, None).unwrap();
        let row = result.neighbors(0);
        assert_eq!(row.len(), 5);
        for id in row {
            hits[id as usize] += 1;
        }
    }

    assert_eq!(hits[0], 0);
    for (id, &h) in hits.iter().enumerate().skip(1) {
        let freq = h as f64 / TRIALS as f64;
        assert!((freq - 0.5).abs() < 0.06, "entity {} chosen with frequency {}", id, freq);
    }
}

#[test]
fn test_selection_frequency_unseeded() {
    let coords = cluster(9);
    let mut hits = [0u64; 9];

    for _ in 0..TRIALS {
        let result = find_neighbors(Locations::Coordinates(coords.view()), &clustered_query(2), None, None).unwrap();
        for id in result.neighbors(4) {
            hits[id as usize] += 1;
        }
    }

    assert_eq!(hits[4], 0);
    for (id, &h) in hits.iter().enumerate() {
        if id == 4 {
            continue;
        }
        let freq = h as f64 / TRIALS as f64;
        assert!((freq - 0.25).abs() < 0.05, "entity {} chosen with frequency {}", id, freq);
    }
}

#[test]
fn test_selection_frequency_source_outside_target_pool() {
    // The source is not a target, so all ten targets compete for four slots.
    let coords = cluster(11);
    let sources = [0usize];
    let targets: Vec<usize> = (1..11).collect();
    let mut hits = [0u64; 11];

    for trial in 0..TRIALS {
        let query = clustered_query(4).with_seed(trial + 10_000);
        let result = find_neighbors(
            Locations::Coordinates(coords.view()),
            &query,
            Some(&sources[..]),
            Some(&targets[..]),
        )
        .unwrap();
        let row = result.neighbors(0);
        assert_eq!(row.len(), 4);
        for id in row {
            hits[id as usize] += 1;
        }
    }

    for (id, &h) in hits.iter().enumerate().skip(1) {
        let freq = h as f64 / TRIALS as f64;
        assert!((freq - 0.4).abs() < 0.06, "entity {} chosen with frequency {}", id, freq);
    }
}

/// Three entities in each listed (column, row) cell of a 32×32 unit grid
fn cells_of_three(cells: &[(f64, f64)]) -> Array2<f64> {
    Array2::from_shape_fn((cells.len() * 3, 2), |(i, axis)| {
        let (col, row) = cells[i / 3];
        if axis == 0 {
            col + 0.2 + 0.3 * (i % 3) as f64
        } else {
            row + 0.5
        }
    })
}

#[test]
fn test_selection_frequency_across_separate_spans() {
    // Cells (9,9), (10,10) and (11,11) lie in the 3×3 window of (10,10).
    // Occupied cells (20,9) and (20,10) sit between them in code order, so
    // the window matches three non-adjacent buckets and the own cell is the
    // middle one.
    let coords = cells_of_three(&[(9.0, 9.0), (10.0, 10.0), (11.0, 11.0), (20.0, 9.0), (20.0, 10.0)]);
    let bbox = BoundingBox::new(0.0, 32.0, 0.0, 32.0).unwrap();
    let in_window: Vec<u64> = (0..9).collect();
    let mut hits = [[0u64; 15]; 3];

    for trial in 0..TRIALS {
        let query = NeighborQuery::new(0.5, 4, 10)
            .with_grid(GridMode::Orthogonal)
            .with_bbox(bbox)
            .with_seed(trial + 20_000);
        let result = find_neighbors(Locations::Coordinates(coords.view()), &query, None, None).unwrap();

        for (slot, source) in (3..6).enumerate() {
            let row = result.neighbors(source);
            assert_eq!(row.len(), 4);
            for id in row {
                assert!(in_window.contains(&id), "entity {} outside the window", id);
                hits[slot][id as usize] += 1;
            }
        }
    }

    // Eight candidates per source compete for four slots.
    for (slot, source) in (3..6).enumerate() {
        assert_eq!(hits[slot][source], 0);
        for id in (0..9).filter(|&id| id != source) {
            let freq = hits[slot][id] as f64 / TRIALS as f64;
            assert!(
                (freq - 0.5).abs() < 0.06,
                "source {} chose entity {} with frequency {}",
                source,
                id,
                freq
            );
        }
    }
}
