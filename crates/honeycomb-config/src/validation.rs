// Copyright 2025 Honeycomb Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Every check runs and all problems are reported together, so a broken file
//! can be fixed in one pass.

use crate::{ConfigError, ConfigResult, HoneycombConfig};

/// Grid names accepted in `neighbors.grid`
pub const KNOWN_GRIDS: [&str; 3] = ["longlat", "geographic", "orthogonal"];

/// Hash code precision limits
pub const MIN_BITS: u32 = 1;
pub const MAX_BITS: u32 = 64;

/// Log levels accepted in `logging.level`
pub const KNOWN_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    OutOfRange { field: String, value: String, range: String },
    UnknownName { field: String, value: String, expected: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange { field, value, range } => {
                write!(f, "{} = {} is outside valid range ({})", field, value, range)
            }
            Self::UnknownName { field, value, expected } => {
                write!(f, "{} = '{}' is not one of: {}", field, value, expected)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - Neighbor search parameter ranges
/// - Known grid and log level names
/// - Bounding box ordering, and geographic limits for "longlat" grids
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every failed check
pub fn validate_config(config: &HoneycombConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_neighbors(config, &mut errors);
    validate_bounding_box(config, &mut errors);
    validate_logging(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn is_geographic(grid: &str) -> bool {
    matches!(grid.trim().to_lowercase().as_str(), "longlat" | "geographic")
}

fn validate_neighbors(config: &HoneycombConfig, errors: &mut Vec<ConfigValidationError>) {
    let neighbors = &config.neighbors;

    if !(neighbors.radius.is_finite() && neighbors.radius > 0.0) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "neighbors.radius".to_string(),
            reason: "must be finite and positive".to_string(),
        });
    }

    if neighbors.n_neighbor == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "neighbors.n_neighbor".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    if !(MIN_BITS..=MAX_BITS).contains(&neighbors.bits) {
        errors.push(ConfigValidationError::OutOfRange {
            field: "neighbors.bits".to_string(),
            value: neighbors.bits.to_string(),
            range: format!("{}-{}", MIN_BITS, MAX_BITS),
        });
    }

    let grid = neighbors.grid.trim().to_lowercase();
    if !KNOWN_GRIDS.contains(&grid.as_str()) {
        errors.push(ConfigValidationError::UnknownName {
            field: "neighbors.grid".to_string(),
            value: neighbors.grid.clone(),
            expected: KNOWN_GRIDS.join(", "),
        });
    }
}

fn validate_bounding_box(config: &HoneycombConfig, errors: &mut Vec<ConfigValidationError>) {
    let bbox = &config.neighbors.bbox;
    let bounds = [
        ("min_x", bbox.min_x),
        ("max_x", bbox.max_x),
        ("min_y", bbox.min_y),
        ("max_y", bbox.max_y),
    ];

    let mut finite = true;
    for (name, value) in bounds {
        if !value.is_finite() {
            finite = false;
            errors.push(ConfigValidationError::InvalidValue {
                field: format!("neighbors.bbox.{}", name),
                reason: "must be finite".to_string(),
            });
        }
    }
    if !finite {
        return;
    }

    if bbox.min_x >= bbox.max_x {
        errors.push(ConfigValidationError::InvalidValue {
            field: "neighbors.bbox".to_string(),
            reason: format!("min_x ({}) must be below max_x ({})", bbox.min_x, bbox.max_x),
        });
    }
    if bbox.min_y >= bbox.max_y {
        errors.push(ConfigValidationError::InvalidValue {
            field: "neighbors.bbox".to_string(),
            reason: format!("min_y ({}) must be below max_y ({})", bbox.min_y, bbox.max_y),
        });
    }

    if is_geographic(&config.neighbors.grid) {
        if bbox.min_x < -180.0 || bbox.max_x > 180.0 {
            errors.push(ConfigValidationError::OutOfRange {
                field: "neighbors.bbox (longitude)".to_string(),
                value: format!("{}..{}", bbox.min_x, bbox.max_x),
                range: "-180-180".to_string(),
            });
        }
        if bbox.min_y < -90.0 || bbox.max_y > 90.0 {
            errors.push(ConfigValidationError::OutOfRange {
                field: "neighbors.bbox (latitude)".to_string(),
                value: format!("{}..{}", bbox.min_y, bbox.max_y),
                range: "-90-90".to_string(),
            });
        }
    }
}

fn validate_logging(config: &HoneycombConfig, errors: &mut Vec<ConfigValidationError>) {
    let level = config.logging.level.trim().to_lowercase();
    if !KNOWN_LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::UnknownName {
            field: "logging.level".to_string(),
            value: config.logging.level.clone(),
            expected: KNOWN_LOG_LEVELS.join(", "),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HoneycombConfig;

    fn message(config: &HoneycombConfig) -> String {
        match validate_config(config) {
            Err(ConfigError::ValidationError(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = HoneycombConfig::default();
        let result = validate_config(&config);
        if let Err(e) = &result {
            eprintln!("Validation error: {}", e);
        }
        assert!(result.is_ok());
    }

    #[test]
    fn test_invalid_bits() {
        let mut config = HoneycombConfig::default();
        config.neighbors.bits = 0;

        let msg = message(&config);
        assert!(msg.contains("neighbors.bits"));
        assert!(msg.contains("1-64"));
    }

    #[test]
    fn test_invalid_radius_and_count_reported_together() {
        let mut config = HoneycombConfig::default();
        config.neighbors.radius = -5.0;
        config.neighbors.n_neighbor = 0;

        let msg = message(&config);
        assert!(msg.contains("neighbors.radius"));
        assert!(msg.contains("neighbors.n_neighbor"));
    }

    #[test]
    fn test_unknown_grid() {
        let mut config = HoneycombConfig::default();
        config.neighbors.grid = "hexagonal".to_string();

        let msg = message(&config);
        assert!(msg.contains("neighbors.grid"));
        assert!(msg.contains("orthogonal"));
    }

    #[test]
    fn test_geographic_bbox_limits() {
        let mut config = HoneycombConfig::default();
        config.neighbors.bbox.max_x = 200.0;
        assert!(message(&config).contains("longitude"));

        config.neighbors.grid = "orthogonal".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_unordered_bbox() {
        let mut config = HoneycombConfig::default();
        config.neighbors.grid = "orthogonal".to_string();
        config.neighbors.bbox.min_y = 10.0;
        config.neighbors.bbox.max_y = 10.0;

        assert!(message(&config).contains("min_y"));
    }

    #[test]
    fn test_non_finite_bbox() {
        let mut config = HoneycombConfig::default();
        config.neighbors.bbox.min_x = f64::NAN;

        assert!(message(&config).contains("neighbors.bbox.min_x"));
    }

    #[test]
    fn test_unknown_log_level() {
        let mut config = HoneycombConfig::default();
        config.logging.level = "verbose".to_string();

        assert!(message(&config).contains("logging.level"));
    }
}
