// Copyright 2025 Honeycomb Contributors
// SPDX-License-Identifier: Apache-2.0

//! Agent-to-agent contagion demo.
//!
//! A population is scattered uniformly over the configured bounding box. Each
//! step a fixed number of people get vaccinated, then every infected person
//! passes the infection to up to `n_neighbor` people within `radius`, unless
//! they are vaccinated. Neighbor search parameters come from
//! `honeycomb_configuration.toml`, environment overrides and the flags below.
//!
//! ```text
//! honeycomb-contagion [--config <path>] [--<key> <value>]... [--debug-<crate>]...
//! ```
//! Keys: radius, n_neighbor, bits, grid, seed, max_threads, log_level,
//! population, steps.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::json;
use tracing::{debug, info, warn};

use honeycomb_config::{apply_cli_overrides, load_config, validate_config, ConfigError, HoneycombConfig};
use honeycomb_neighbors::{find_neighbors, Locations, NeighborQuery};
use honeycomb_observability::{debug_flags_help, init_logging, parse_debug_flags};

/// People vaccinated per step
const VACCINATIONS_PER_STEP: usize = 50;

const OVERRIDE_KEYS: [&str; 9] = [
    "radius",
    "n_neighbor",
    "bits",
    "grid",
    "seed",
    "max_threads",
    "log_level",
    "population",
    "steps",
];

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: honeycomb-contagion [--config <path>] [--<key> <value>]...\n\n\
         Keys: {}\n\n{}",
        OVERRIDE_KEYS.join(", "),
        debug_flags_help()
    );
    process::exit(2);
}

fn parse_args() -> (Option<PathBuf>, HashMap<String, String>) {
    let mut config_path = None;
    let mut overrides = HashMap::new();

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg.starts_with("--debug-") {
            continue;
        }
        match arg.as_str() {
            "-h" | "--help" => usage_and_exit(),
            "--config" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                config_path = Some(PathBuf::from(v));
            }
            other => match other.strip_prefix("--") {
                Some(key) if OVERRIDE_KEYS.contains(&key) => {
                    let v = args.next().unwrap_or_else(|| usage_and_exit());
                    overrides.insert(key.to_string(), v);
                }
                _ => {
                    eprintln!("Unknown argument: {other}");
                    usage_and_exit();
                }
            },
        }
    }

    (config_path, overrides)
}

/// Load the configuration file, or fall back to defaults when none exists
fn resolve_config(
    config_path: Option<&PathBuf>,
    overrides: &HashMap<String, String>,
) -> Result<(HoneycombConfig, Option<String>)> {
    match load_config(config_path.map(PathBuf::as_path), Some(overrides)) {
        Ok(config) => Ok((config, None)),
        Err(ConfigError::FileNotFound(reason)) if config_path.is_none() => {
            let mut config = HoneycombConfig::default();
            honeycomb_config::apply_environment_overrides(&mut config);
            apply_cli_overrides(&mut config, overrides);
            validate_config(&config).context("Invalid default configuration")?;
            Ok((config, Some(reason)))
        }
        Err(e) => Err(e).context("Failed to load configuration"),
    }
}

struct Population {
    locations: Array2<f64>,
    infected: Vec<bool>,
    vaccinated: Vec<bool>,
}

impl Population {
    fn new(config: &HoneycombConfig, rng: &mut StdRng) -> Result<Self> {
        let sim = &config.simulation;
        if sim.initial_infected > sim.population {
            bail!(
                "initial_infected ({}) exceeds population ({})",
                sim.initial_infected,
                sim.population
            );
        }

        let bbox = &config.neighbors.bbox;
        let locations = Array2::from_shape_fn((sim.population, 2), |(_, axis)| {
            if axis == 0 {
                rng.gen_range(bbox.min_x..=bbox.max_x)
            } else {
                rng.gen_range(bbox.min_y..=bbox.max_y)
            }
        });

        let mut infected = vec![false; sim.population];
        let mut ids: Vec<usize> = (0..sim.population).collect();
        ids.shuffle(rng);
        for &id in ids.iter().take(sim.initial_infected) {
            infected[id] = true;
        }

        Ok(Self {
            locations,
            infected,
            vaccinated: vec![false; sim.population],
        })
    }

    fn vaccinate(&mut self, count: usize, rng: &mut StdRng) -> usize {
        let candidates: Vec<usize> = (0..self.vaccinated.len())
            .filter(|&id| !self.vaccinated[id])
            .collect();
        let chosen: Vec<usize> = candidates.choose_multiple(rng, count).copied().collect();
        for &id in &chosen {
            self.vaccinated[id] = true;
        }
        chosen.len()
    }

    fn spread(&mut self, query: &NeighborQuery) -> Result<usize> {
        let sources: Vec<usize> = (0..self.infected.len())
            .filter(|&id| self.infected[id])
            .collect();
        if sources.is_empty() {
            return Ok(0);
        }

        let neighbors = find_neighbors(
            Locations::Coordinates(self.locations.view()),
            query,
            Some(sources.as_slice()),
            None,
        )
        .context("Neighbor search failed")?;

        let mut newly_infected = 0;
        for row in 0..neighbors.nrows() {
            for id in neighbors.neighbors(row) {
                let id = id as usize;
                if !self.vaccinated[id] && !self.infected[id] {
                    self.infected[id] = true;
                    newly_infected += 1;
                }
            }
        }
        Ok(newly_infected)
    }

    fn count(flags: &[bool]) -> usize {
        flags.iter().filter(|&&f| f).count()
    }
}

fn main() -> Result<()> {
    let (config_path, overrides) = parse_args();
    let (config, fallback_reason) = resolve_config(config_path.as_ref(), &overrides)?;

    let debug_flags = parse_debug_flags();
    let _logging = init_logging(
        &debug_flags,
        &config.logging.level,
        config.logging.log_dir.as_deref(),
    )?;

    if let Some(reason) = fallback_reason {
        warn!(target: "honeycomb-contagion", "Using default configuration: {}", reason);
    }

    let query = NeighborQuery::try_from(&config).context("Invalid neighbor search configuration")?;
    info!(
        target: "honeycomb-contagion",
        "Contagion run: population={}, steps={}, radius={}, n_neighbor={}, bits={}, grid={}",
        config.simulation.population,
        config.simulation.steps,
        query.radius,
        query.n_neighbor,
        query.bits,
        query.grid
    );

    let mut rng = match config.neighbors.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut population = Population::new(&config, &mut rng)?;

    for step in 1..=config.simulation.steps {
        let vaccinated = population.vaccinate(VACCINATIONS_PER_STEP, &mut rng);
        let newly_infected = population.spread(&query)?;
        debug!(
            target: "honeycomb-contagion",
            step, vaccinated, newly_infected, "Step finished"
        );
        info!(
            target: "honeycomb-contagion",
            "Timestep {}: {} infected, {} vaccinated",
            step,
            Population::count(&population.infected),
            Population::count(&population.vaccinated)
        );
    }

    let summary = json!({
        "population": config.simulation.population,
        "steps": config.simulation.steps,
        "infected": Population::count(&population.infected),
        "vaccinated": Population::count(&population.vaccinated),
        "radius": query.radius,
        "n_neighbor": query.n_neighbor,
        "grid": query.grid.as_str(),
    });
    println!("{}", summary);

    Ok(())
}
