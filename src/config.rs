//! Configuration management with validation and defaults
//!
//! Values load from an optional TOML file, then `FAIRROLL_*` environment
//! overrides, then validation. House edges and limits here change derived
//! outcomes, so a verifier must run with the same `games` section the
//! operator published.

use crate::errors::{FairnessError, FairnessResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Top-level engine configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub games: GameConfig,
    pub seeds: SeedConfig,
    pub storage: StorageConfig,
    pub monitoring: MonitoringConfig,
}

/// Published per-game constants
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub dice_house_edge: f64,
    pub coinflip_house_edge: f64,
    pub crash_house_edge: f64,
    pub keno_house_edge: f64,
    /// Upper bound on any crash point, bounds payout exposure
    pub crash_ceiling: f64,
    pub keno_max_picks: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            dice_house_edge: 0.02,
            coinflip_house_edge: 0.03,
            crash_house_edge: 0.01,
            keno_house_edge: 0.02,
            crash_ceiling: 100.0,
            keno_max_picks: 5,
        }
    }
}

/// Seed generation settings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SeedConfig {
    /// Length of a fresh server seed before hex encoding
    pub server_seed_bytes: usize,
    /// Client seed used when the player supplies none; random per pair if unset
    pub default_client_seed: Option<String>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            server_seed_bytes: 32,
            default_client_seed: None,
        }
    }
}

/// Seed store backend selection
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Rocksdb,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_directory: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            data_directory: "./DB/seed_pairs".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enable_metrics: bool,
    /// Default `tracing` filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enable_metrics: true,
            log_filter: "fairroll=info".to_string(),
        }
    }
}

/// Configuration loader with environment variable support
#[derive(Default)]
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables
    pub fn load(&self) -> FairnessResult<EngineConfig> {
        let mut config = match self.config_path {
            Some(ref path) => Self::load_from_file(path)?,
            None => EngineConfig::default(),
        };

        Self::apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(config)
    }

    fn load_from_file(path: &str) -> FairnessResult<EngineConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FairnessError::Configuration(format!("Failed to read {}: {}", path, e))
        })?;
        Ok(toml::from_str(&content)?)
    }

    fn apply_env_overrides(config: &mut EngineConfig) -> FairnessResult<()> {
        if let Some(edge) = parse_env::<f64>("FAIRROLL_DICE_HOUSE_EDGE")? {
            config.games.dice_house_edge = edge;
        }
        if let Some(edge) = parse_env::<f64>("FAIRROLL_COINFLIP_HOUSE_EDGE")? {
            config.games.coinflip_house_edge = edge;
        }
        if let Some(edge) = parse_env::<f64>("FAIRROLL_CRASH_HOUSE_EDGE")? {
            config.games.crash_house_edge = edge;
        }
        if let Some(edge) = parse_env::<f64>("FAIRROLL_KENO_HOUSE_EDGE")? {
            config.games.keno_house_edge = edge;
        }
        if let Some(ceiling) = parse_env::<f64>("FAIRROLL_CRASH_CEILING")? {
            config.games.crash_ceiling = ceiling;
        }
        if let Ok(seed) = env::var("FAIRROLL_DEFAULT_CLIENT_SEED") {
            config.seeds.default_client_seed = Some(seed);
        }
        if let Ok(dir) = env::var("FAIRROLL_DATA_DIR") {
            config.storage.data_directory = dir;
        }
        if let Ok(backend) = env::var("FAIRROLL_STORAGE_BACKEND") {
            config.storage.backend = match backend.to_ascii_lowercase().as_str() {
                "memory" => StorageBackend::Memory,
                "rocksdb" => StorageBackend::Rocksdb,
                _ => {
                    return Err(invalid_value(
                        "FAIRROLL_STORAGE_BACKEND",
                        &backend,
                        "expected memory or rocksdb",
                    ))
                }
            };
        }

        Ok(())
    }
}

impl EngineConfig {
    /// Validate configuration values
    pub fn validate(&self) -> FairnessResult<()> {
        let games = &self.games;
        for (field, edge) in [
            ("games.dice_house_edge", games.dice_house_edge),
            ("games.coinflip_house_edge", games.coinflip_house_edge),
            ("games.crash_house_edge", games.crash_house_edge),
            ("games.keno_house_edge", games.keno_house_edge),
        ] {
            if !(0.0..0.5).contains(&edge) {
                return Err(invalid_value(field, &edge.to_string(), "edge must be in [0, 0.5)"));
            }
        }

        // ln(1 - e) is the crash denominator
        if games.crash_house_edge == 0.0 {
            return Err(invalid_value(
                "games.crash_house_edge",
                "0",
                "crash needs a non-zero edge",
            ));
        }

        if !(games.crash_ceiling >= 1.01) {
            return Err(invalid_value(
                "games.crash_ceiling",
                &games.crash_ceiling.to_string(),
                "ceiling must be at least 1.01",
            ));
        }

        if !(1..=10).contains(&games.keno_max_picks) {
            return Err(invalid_value(
                "games.keno_max_picks",
                &games.keno_max_picks.to_string(),
                "must be between 1 and 10",
            ));
        }

        if self.seeds.server_seed_bytes < 32 {
            return Err(invalid_value(
                "seeds.server_seed_bytes",
                &self.seeds.server_seed_bytes.to_string(),
                "server seeds need at least 256 bits",
            ));
        }

        if let Some(seed) = &self.seeds.default_client_seed {
            if seed.is_empty() {
                return Err(invalid_value("seeds.default_client_seed", "", "cannot be empty"));
            }
        }

        if self.storage.backend == StorageBackend::Rocksdb && self.storage.data_directory.is_empty() {
            return Err(FairnessError::Configuration(
                "Missing required field: storage.data_directory".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> FairnessResult<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| invalid_value(name, &raw, "could not parse value")),
        Err(_) => Ok(None),
    }
}

fn invalid_value(field: &str, value: &str, reason: &str) -> FairnessError {
    FairnessError::Configuration(format!("Invalid value for {}: '{}' ({})", field, value, reason))
}
