// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # brainll-observability
//!
//! Logging setup shared by the BrainLL crates and binaries, with per-crate
//! debug flag support.
//!
//! ## Features
//! - `file-logging`: JSON log files in a timestamped run folder

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Known BrainLL crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "brainll",
    "brainll-npu-neural",
    "brainll-npu-plasticity",
    "brainll-npu-engine",
    "brainll-persistence",
    "brainll-config",
];

/// `tracing` target for a crate name (`brainll-npu-engine` -> `brainll_npu_engine`)
pub fn crate_target(crate_name: &str) -> String {
    crate_name.replace('-', "_")
}
