// Copyright 2025 Honeycomb Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `honeycomb_configuration.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HoneycombConfig {
    pub neighbors: NeighborsConfig,
    pub parallel: ParallelConfig,
    pub logging: LoggingConfig,
    pub simulation: SimulationConfig,
}

/// Neighbor search parameters
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NeighborsConfig {
    /// Search radius: meters for "longlat", map units for "orthogonal"
    pub radius: f64,
    /// Maximum neighbors returned per entity
    pub n_neighbor: usize,
    /// Hash code precision
    pub bits: u32,
    /// "longlat" (alias "geographic") or "orthogonal"
    pub grid: String,
    pub bbox: BoundingBoxConfig,
    /// Fixed seed for reproducible sampling; random when absent
    pub seed: Option<u64>,
}

impl Default for NeighborsConfig {
    fn default() -> Self {
        Self {
            radius: 1000.0,
            n_neighbor: 5,
            bits: 29,
            grid: "longlat".to_string(),
            bbox: BoundingBoxConfig::default(),
            seed: None,
        }
    }
}

/// Bounding box shared by all entities
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BoundingBoxConfig {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Default for BoundingBoxConfig {
    fn default() -> Self {
        Self {
            min_x: -180.0,
            max_x: 180.0,
            min_y: -90.0,
            max_y: 90.0,
        }
    }
}

/// Worker pool configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Worker threads for one query (0 = rayon default)
    pub max_threads: usize,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for log files (requires the `file-logging` feature)
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
        }
    }
}

/// Contagion demo parameters
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub population: usize,
    pub steps: usize,
    pub initial_infected: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            population: 1000,
            steps: 25,
            initial_infected: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HoneycombConfig::default();
        assert_eq!(config.neighbors.radius, 1000.0);
        assert_eq!(config.neighbors.n_neighbor, 5);
        assert_eq!(config.neighbors.bits, 29);
        assert_eq!(config.neighbors.grid, "longlat");
        assert_eq!(config.neighbors.bbox.max_x, 180.0);
        assert_eq!(config.parallel.max_threads, 0);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: HoneycombConfig = toml::from_str(
            r#"
            [neighbors]
            radius = 3.0
            grid = "orthogonal"

            [neighbors.bbox]
            min_x = -10.0
            max_x = 10.0
            "#,
        )
        .unwrap();

        assert_eq!(config.neighbors.radius, 3.0);
        assert_eq!(config.neighbors.n_neighbor, 5);
        assert_eq!(config.neighbors.bbox.min_x, -10.0);
        assert_eq!(config.neighbors.bbox.min_y, -90.0);
        assert_eq!(config.simulation, SimulationConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = HoneycombConfig::default();
        config.neighbors.seed = Some(42);
        let json = serde_json::to_string(&config).unwrap();
        let back: HoneycombConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
