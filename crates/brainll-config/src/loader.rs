// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later ones winning:
//! 1. TOML file
//! 2. Environment variables
//! 3. CLI arguments

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{info, warn};

use crate::validation::validate_config;
use crate::{BrainllConfig, ConfigError, ConfigResult};

pub const CONFIG_FILE_NAME: &str = "brainll_configuration.toml";
pub const CONFIG_PATH_ENV: &str = "BRAINLL_CONFIG_PATH";

/// Find the BrainLL configuration file
///
/// Search order:
/// 1. `BRAINLL_CONFIG_PATH` environment variable
/// 2. Current working directory
/// 3. Up to five parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by {} not found: {}",
            CONFIG_PATH_ENV,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
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
        "'{}' not found in any of these locations:\n{}\n\nSet {} to specify a custom location.",
        CONFIG_FILE_NAME, search_list, CONFIG_PATH_ENV
    )))
}

/// Load, override and validate the configuration
///
/// `config_path` of `None` searches with [`find_config_file`].
///
/// # Errors
///
/// Returns error if the file is missing, holds invalid TOML, or fails validation
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<BrainllConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: BrainllConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    validate_config(&config)?;
    info!("[CONFIG] Loaded {}", config_file.display());
    Ok(config)
}

/// Parse `value` into `target`; unparsable values are logged and ignored
fn set_parsed<T: FromStr>(target: &mut T, key: &str, value: &str) {
    match value.trim().parse::<T>() {
        Ok(parsed) => *target = parsed,
        Err(_) => warn!("[CONFIG] Ignoring {}: cannot parse '{}'", key, value),
    }
}

fn set_flag(target: &mut bool, key: &str, value: &str) {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => *target = true,
        "false" | "0" | "no" | "off" => *target = false,
        _ => warn!("[CONFIG] Ignoring {}: '{}' is not a boolean", key, value),
    }
}

/// Apply one `key = value` override. Returns `false` for unknown keys.
fn apply_override(config: &mut BrainllConfig, key: &str, value: &str) -> bool {
    match key {
        "timestep" => set_parsed(&mut config.simulation.timestep, key, value),
        "random_seed" => set_parsed(&mut config.simulation.random_seed, key, value),
        "plasticity_enabled" => set_flag(&mut config.simulation.plasticity_enabled, key, value),
        "homeostasis_enabled" => set_flag(&mut config.simulation.homeostasis_enabled, key, value),
        "mode" | "simulation_mode" => config.simulation.mode = value.to_string(),
        "max_steps" => set_parsed(&mut config.simulation.max_steps, key, value),
        "default_model" => config.network.default_model = value.to_string(),
        "default_weight" => set_parsed(&mut config.network.default_weight, key, value),
        "log_level" => config.logging.level = value.to_string(),
        "persistence_format" => config.persistence.format = value.to_string(),
        "data_dir" => config.persistence.data_dir = PathBuf::from(value),
        _ => return false,
    }
    true
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `BRAINLL_TIMESTEP` -> `simulation.timestep`
/// - `BRAINLL_RANDOM_SEED` -> `simulation.random_seed`
/// - `BRAINLL_PLASTICITY_ENABLED` -> `simulation.plasticity_enabled`
/// - `BRAINLL_HOMEOSTASIS_ENABLED` -> `simulation.homeostasis_enabled`
/// - `BRAINLL_SIMULATION_MODE` -> `simulation.mode`
/// - `BRAINLL_LOG_LEVEL` -> `logging.level`
/// - `BRAINLL_DATA_DIR` -> `persistence.data_dir`
pub fn apply_environment_overrides(config: &mut BrainllConfig) {
    const VARS: [(&str, &str); 7] = [
        ("BRAINLL_TIMESTEP", "timestep"),
        ("BRAINLL_RANDOM_SEED", "random_seed"),
        ("BRAINLL_PLASTICITY_ENABLED", "plasticity_enabled"),
        ("BRAINLL_HOMEOSTASIS_ENABLED", "homeostasis_enabled"),
        ("BRAINLL_SIMULATION_MODE", "mode"),
        ("BRAINLL_LOG_LEVEL", "log_level"),
        ("BRAINLL_DATA_DIR", "data_dir"),
    ];
    for (var, key) in VARS {
        if let Ok(value) = env::var(var) {
            apply_override(config, key, &value);
        }
    }
}

/// Apply CLI argument overrides to configuration
///
/// Keys: `timestep`, `random_seed`, `plasticity_enabled`, `homeostasis_enabled`, `mode`,
/// `max_steps`, `default_model`, `default_weight`, `log_level`, `persistence_format`, `data_dir`
pub fn apply_cli_overrides(config: &mut BrainllConfig, cli_args: &HashMap<String, String>) {
    for (key, value) in cli_args {
        if !apply_override(config, key, value) {
            warn!("[CONFIG] Unknown CLI override '{}'", key);
        }
    }
}
