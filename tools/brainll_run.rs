// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! brainll-run: load a saved network, simulate it and save the result.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use brainll::config::{
    apply_cli_overrides, apply_environment_overrides, find_config_file, load_config,
    validate_config, BrainllConfig,
};
use brainll::persistence::{persistence_for, PersistenceFormat};
use clap::Parser;
use tracing::{info, warn};

/// BrainLL runner - simulate a saved network with online learning
#[derive(Parser, Debug)]
#[command(name = "brainll-run", version, author, long_about = None)]
struct Args {
    /// Network file to load (JSON or BLNN, detected from the content)
    #[arg(short, long)]
    network: PathBuf,

    /// Configuration file (default: search for brainll_configuration.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of steps (fixed mode) or events (event mode)
    #[arg(short, long)]
    steps: Option<usize>,

    /// Save the network here after the run
    #[arg(long)]
    save: Option<PathBuf>,

    /// Save only the weights here after the run
    #[arg(long)]
    save_weights: Option<PathBuf>,

    /// Configuration override, e.g. `--set timestep=0.5` (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Raise a crate to debug logging, e.g. `--debug brainll-npu-engine` (repeatable, `all` for every crate)
    #[arg(long = "debug", value_name = "CRATE")]
    debug: Vec<String>,
}

fn parse_overrides(pairs: &[String]) -> Result<HashMap<String, String>> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .ok_or_else(|| anyhow!("Override '{}' is not KEY=VALUE", pair))
        })
        .collect()
}

/// Config file when present, otherwise defaults; overrides and validation apply either way
fn resolve_config(args: &Args, overrides: &HashMap<String, String>) -> Result<BrainllConfig> {
    let path = match &args.config {
        Some(path) => Some(path.clone()),
        None => find_config_file().ok(),
    };
    if let Some(path) = path {
        return Ok(load_config(Some(&path), Some(overrides))?);
    }

    let mut config = BrainllConfig::default();
    apply_environment_overrides(&mut config);
    apply_cli_overrides(&mut config, overrides);
    validate_config(&config)?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let overrides = parse_overrides(&args.overrides)?;
    let mut config = resolve_config(&args, &overrides)?;
    config.logging.debug_crates.extend(args.debug.iter().cloned());
    brainll::init_logging_from_config(&config)?;

    let format = PersistenceFormat::detect(&args.network)
        .with_context(|| format!("Cannot read {}", args.network.display()))?;
    let network = persistence_for(format).load_network(&args.network)?;

    let mut simulator = brainll::simulator_from_config(&config, Some(network))?;
    let spikes = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&spikes);
    simulator.register_spike_callback(Box::new(move |_, _| {
        counter.fetch_add(1, Ordering::Relaxed);
    }));

    let steps = args.steps.unwrap_or(config.simulation.max_steps);
    let completed = simulator.run(steps)?;
    let stats = simulator.stats();
    info!(
        "Ran {} steps to t = {:.3} ms: {} spikes, {:.2} spikes/step, {:.1} us/step",
        completed,
        simulator.current_time(),
        spikes.load(Ordering::Relaxed),
        stats.avg_spikes_per_step(),
        stats.avg_processing_time_us()
    );
    if completed < steps {
        warn!("Stopped early: nothing left to simulate after {} steps", completed);
    }

    let persistence = brainll::persistence_from_config(&config)?;
    if let Some(network) = simulator.network() {
        if let Some(path) = &args.save {
            persistence.save_network(network, path)?;
        }
        if let Some(path) = &args.save_weights {
            persistence.save_weights(network, path)?;
        }
    }
    Ok(())
}
