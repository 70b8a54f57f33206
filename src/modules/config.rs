use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which ship becomes the expansion station on the expansion turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ExpansionTrigger {
    /// The ship processed last in roster order.
    LastInRoster,
    /// The ship farthest from the home station; roster order breaks ties.
    FarthestFromHome,
}

impl Default for ExpansionTrigger {
    fn default() -> Self {
        ExpansionTrigger::LastInRoster
    }
}

impl fmt::Display for ExpansionTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpansionTrigger::LastInRoster => write!(f, "last-in-roster"),
            ExpansionTrigger::FarthestFromHome => write!(f, "farthest-from-home"),
        }
    }
}

/// Cargo fraction (in percent of capacity) that sends a harvesting ship home,
/// valid up to and including `until_turn`. `None` means open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnBand {
    pub until_turn: Option<u32>,
    pub percent: u32,
}

fn default_return_bands() -> Vec<ReturnBand> {
    vec![
        ReturnBand {
            until_turn: Some(200),
            percent: 95,
        },
        ReturnBand {
            until_turn: Some(350),
            percent: 90,
        },
        ReturnBand {
            until_turn: None,
            percent: 80,
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Name announced to the engine once initialisation is done.
    pub bot_name: String,
    /// Last turn (inclusive) on which new ships may be produced.
    pub production_cutoff_turn: u32,
    /// The single turn reserved for building the expansion station.
    pub expansion_turn: u32,
    pub expansion_trigger: ExpansionTrigger,
    /// Multiplier applied to the current cell when scoring "stay".
    pub stay_bias: u32,
    /// A harvesting ship only moves if its cargo is at least this percent of
    /// the halite left under it.
    pub min_efficiency_percent: u32,
    /// Ordered by `until_turn`; the first band covering the turn applies.
    pub return_bands: Vec<ReturnBand>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            bot_name: "harvester".to_string(),
            production_cutoff_turn: 200,
            expansion_turn: 250,
            expansion_trigger: ExpansionTrigger::default(),
            stay_bias: 2,
            min_efficiency_percent: 10,
            return_bands: default_return_bands(),
        }
    }
}

impl StrategyConfig {
    /// Cargo percent at which a harvesting ship turns back on `turn`.
    pub fn return_percent(&self, turn: u32) -> u32 {
        self.return_bands
            .iter()
            .find(|band| band.until_turn.map_or(true, |until| turn <= until))
            .map(|band| band.percent)
            .unwrap_or(100)
    }

    pub fn is_expansion_turn(&self, turn: u32) -> bool {
        turn == self.expansion_turn
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse strategy config {path:?}; delete it or run `harvester config init` to reset: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read strategy config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write strategy config to {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn config_dir() -> PathBuf {
    PathBuf::from(".harvester")
}

pub fn config_file_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Loads the config at `path`; a missing or empty file yields the defaults.
pub fn load_config(path: &Path) -> Result<StrategyConfig, ConfigError> {
    if !path.exists() {
        return Ok(StrategyConfig::default());
    }

    let bytes = fs::read(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if bytes.is_empty() {
        return Ok(StrategyConfig::default());
    }

    serde_json::from_slice(&bytes).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save_config(path: &Path, config: &StrategyConfig) -> Result<(), ConfigError> {
    let write_err = |source: io::Error| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let json = serde_json::to_vec_pretty(config).map_err(|e| write_err(e.into()))?;
    fs::write(path, json).map_err(write_err)?;
    Ok(())
}
