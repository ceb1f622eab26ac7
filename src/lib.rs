//! # Honeycomb - neighbor search for agent-based simulations
//!
//! Honeycomb answers "which entities are within distance r of each entity",
//! returning at most `n_neighbor` of them per entity, sampled uniformly when
//! more are available. Locations are hashed into a grid of cells; each query
//! enumerates the cells its radius can touch and samples from the entities
//! bucketed there.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! honeycomb = "0.1"  # Default: parallel search
//! ```
//!
//! ## Feature Flags
//!
//! - **`parallel`** (default): Parallel encoding, sorting and querying via rayon
//! - **`file-logging`**: JSON log files in timestamped run folders
//!
//! ## Usage
//!
//! ```rust,no_run
//! use honeycomb::prelude::*;
//! use ndarray::array;
//!
//! let locations = array![[13.40, 52.52], [13.41, 52.52], [2.35, 48.86]];
//! let query = NeighborQuery::new(1_500.0, 2, 40).with_seed(7);
//!
//! let neighbors = find_neighbors(Locations::Coordinates(locations.view()), &query, None, None)?;
//! assert_eq!(neighbors.neighbors(0), vec![1]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  honeycomb-config                                       │
//! │  (TOML file, environment and CLI overrides)             │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  honeycomb-neighbors                                    │
//! │  (codec, bucket index, cell walk, sampling)             │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  honeycomb-observability                                │
//! │  (console and file logging, per-crate debug flags)      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

pub use honeycomb_config as config;
pub use honeycomb_neighbors as neighbors;
pub use honeycomb_observability as observability;

/// Prelude - commonly used types and functions
pub mod prelude {
    pub use crate::config::{load_config, HoneycombConfig};
    pub use crate::neighbors::{
        encode_locations, find_neighbors, BoundingBox, Codec, GridMode, Locations,
        NeighborArray, NeighborError, NeighborQuery, NeighborResult,
    };
}
