// Copyright 2025 Honeycomb Contributors
// SPDX-License-Identifier: Apache-2.0

//! # honeycomb-observability
//!
//! Logging setup shared by honeycomb binaries, with per-crate debug flag
//! support.
//!
//! ## Features
//! - `file-logging`: JSON log files in a timestamped run folder

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Known honeycomb crate names (and log targets) for debug flags
pub const KNOWN_CRATES: &[&str] = &["honeycomb-neighbors", "honeycomb-contagion"];
