/*!
# Honeycomb Neighbors

Capped, unbiased radius neighbor search for large agent populations:
- Spatial hashing of coordinates into fixed-precision cell codes
- Sorted bucket tables over entity codes, rebuilt every call
- Candidate-cell enumeration and a merge walk against the bucket tables
- Uniform sampling without replacement when a cell holds more candidates
  than the per-entity cap

## Architecture

- `spatial` - Morton interleaving and the cell codec
- `index` - bucket tables and the source/target cross map
- `query` - per-cell query engine and the bounded sampler
- `driver` - public entry point, id validation and result width

## Example

```rust,no_run
use honeycomb_neighbors::{find_neighbors, BoundingBox, GridMode, Locations, NeighborQuery};
use ndarray::array;

let coords = array![[1.0, 1.0], [1.5, 1.2], [8.0, 8.0]];
let query = NeighborQuery::new(1.0, 2, 16)
    .with_grid(GridMode::Orthogonal)
    .with_bbox(BoundingBox::new(0.0, 10.0, 0.0, 10.0).unwrap());

let neighbors = find_neighbors(Locations::Coordinates(coords.view()), &query, None, None).unwrap();
assert_eq!(neighbors.neighbors(0), vec![1]);
```

Copyright 2025 Honeycomb Contributors
Licensed under the Apache License, Version 2.0
*/

pub mod driver;
pub mod index;
pub mod query;
pub mod rng;
pub mod spatial;
pub mod types;

pub use driver::{encode_locations, find_neighbors, Locations, NeighborArray, NeighborQuery};

pub use index::{BucketTable, CrossMap, Pool};

pub use query::{sampling::sample_without_replacement, QueryEngine};

pub use spatial::{morton_decode_2d, morton_encode_2d, Codec};

pub use types::{
    BoundingBox, GridMode, HashCode, IndexWidth, NeighborError, NeighborIndex, NeighborResult,
    MAX_BITS, METERS_PER_DEGREE,
};

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_basic_query() {
        let coords = array![[1.0, 1.0], [1.5, 1.2], [8.0, 8.0]];
        let query = NeighborQuery::new(1.0, 2, 16)
            .with_grid(GridMode::Orthogonal)
            .with_bbox(BoundingBox::new(0.0, 10.0, 0.0, 10.0).unwrap());

        let result = find_neighbors(Locations::Coordinates(coords.view()), &query, None, None);
        assert!(result.is_ok());
        let result = result.unwrap();
        assert_eq!(result.neighbors(0), vec![1]);
        assert_eq!(result.neighbors(1), vec![0]);
        assert!(result.neighbors(2).is_empty());
    }
}
