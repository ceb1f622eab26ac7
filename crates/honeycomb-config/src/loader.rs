// Copyright 2025 Honeycomb Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)
//!
//! Override values that fail to parse are ignored and the lower tier wins.

use crate::validation::validate_config;
use crate::{ConfigError, ConfigResult, HoneycombConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "honeycomb_configuration.toml";

/// Find the honeycomb configuration file
///
/// Search order:
/// 1. `HONEYCOMB_CONFIG_PATH` environment variable
/// 2. Current working directory
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("HONEYCOMB_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by HONEYCOMB_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        search_paths.extend(
            cwd.ancestors()
                .skip(1)
                .take(5)
                .map(|dir| dir.join(CONFIG_FILE_NAME)),
        );
    }

    if let Some(path) = search_paths.iter().find(|p| p.exists()) {
        return Ok(path.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "Configuration file '{}' not found in any of these locations:\n{}\n\nSet HONEYCOMB_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load and validate configuration
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found, contains invalid TOML, or fails validation
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<HoneycombConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: HoneycombConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    validate_config(&config)?;
    Ok(config)
}

fn parse_into<T: FromStr>(value: &str, target: &mut T) {
    if let Ok(parsed) = value.trim().parse::<T>() {
        *target = parsed;
    }
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `HONEYCOMB_RADIUS` -> `neighbors.radius`
/// - `HONEYCOMB_N_NEIGHBOR` -> `neighbors.n_neighbor`
/// - `HONEYCOMB_BITS` -> `neighbors.bits`
/// - `HONEYCOMB_GRID` -> `neighbors.grid`
/// - `HONEYCOMB_SEED` -> `neighbors.seed`
/// - `HONEYCOMB_MAX_THREADS` -> `parallel.max_threads`
/// - `HONEYCOMB_LOG_LEVEL` -> `logging.level`
pub fn apply_environment_overrides(config: &mut HoneycombConfig) {
    if let Ok(value) = env::var("HONEYCOMB_RADIUS") {
        parse_into(&value, &mut config.neighbors.radius);
    }
    if let Ok(value) = env::var("HONEYCOMB_N_NEIGHBOR") {
        parse_into(&value, &mut config.neighbors.n_neighbor);
    }
    if let Ok(value) = env::var("HONEYCOMB_BITS") {
        parse_into(&value, &mut config.neighbors.bits);
    }
    if let Ok(value) = env::var("HONEYCOMB_GRID") {
        config.neighbors.grid = value;
    }
    if let Ok(value) = env::var("HONEYCOMB_SEED") {
        if let Ok(seed) = value.trim().parse::<u64>() {
            config.neighbors.seed = Some(seed);
        }
    }
    if let Ok(value) = env::var("HONEYCOMB_MAX_THREADS") {
        parse_into(&value, &mut config.parallel.max_threads);
    }
    if let Ok(value) = env::var("HONEYCOMB_LOG_LEVEL") {
        config.logging.level = value;
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"radius": "250", "n_neighbor": "8"}`)
pub fn apply_cli_overrides(config: &mut HoneycombConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("radius") {
        parse_into(value, &mut config.neighbors.radius);
    }
    if let Some(value) = cli_args.get("n_neighbor") {
        parse_into(value, &mut config.neighbors.n_neighbor);
    }
    if let Some(value) = cli_args.get("bits") {
        parse_into(value, &mut config.neighbors.bits);
    }
    if let Some(value) = cli_args.get("grid") {
        config.neighbors.grid = value.clone();
    }
    if let Some(value) = cli_args.get("seed") {
        if let Ok(seed) = value.trim().parse::<u64>() {
            config.neighbors.seed = Some(seed);
        }
    }
    if let Some(value) = cli_args.get("max_threads") {
        parse_into(value, &mut config.parallel.max_threads);
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
    if let Some(value) = cli_args.get("population") {
        parse_into(value, &mut config.simulation.population);
    }
    if let Some(value) = cli_args.get("steps") {
        parse_into(value, &mut config.simulation.steps);
    }
}
