//! Sandbox settings from `sandbox.toml`, overridden by command-line flags.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::playgrounds::{Playground, LEVEL_COUNT};
use crate::profile::Character;

pub const DEFAULT_CONFIG_PATH: &str = "sandbox.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub tick_rate_hz: u32,
    pub max_ticks_per_frame: u32,
    pub character: Character,
    /// 0-based playground index
    pub level: usize,
    /// Seed for randomized playgrounds. Entropy when absent.
    pub seed: Option<u64>,
    pub log_file: PathBuf,
    /// `tracing` filter directive, used when `RUST_LOG` is unset
    pub log_level: String,
    /// Key presses needed to sweep a tuning slider end to end
    pub tuning_steps: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            max_ticks_per_frame: 5,
            character: Character::Mario,
            level: 0,
            seed: None,
            log_file: PathBuf::from("sandbox.log"),
            log_level: "info".to_string(),
            tuning_steps: 20,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("level {0} does not exist, pick 0 to {}", LEVEL_COUNT - 1)]
    UnknownLevel(usize),
}

#[derive(Parser, Debug, Default)]
#[command(name = "platformer_sandbox")]
#[command(about = "Compare platformer movement profiles in the terminal", long_about = None)]
pub struct Cli {
    /// Settings file (default: ./sandbox.toml, skipped if missing)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Starting character: mario, meatboy, link, madeline or ninja
    #[arg(long)]
    pub character: Option<Character>,
    /// Starting playground, 0-based
    #[arg(long)]
    pub level: Option<usize>,
    /// Seed for randomized playgrounds
    #[arg(long)]
    pub seed: Option<u64>,
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Settings {
    pub fn from_toml(path: &Path, content: &str) -> Result<Settings, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_file(path: &Path) -> Result<Settings, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Settings::from_toml(path, &content)
    }

    /// An explicit path must exist. The default path may be absent.
    pub fn load(explicit: Option<&Path>) -> Result<Settings, ConfigError> {
        match explicit {
            Some(path) => Settings::from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Settings::from_file(path)
                } else {
                    Ok(Settings::default())
                }
            }
        }
    }

    /// Flags given on the command line win over the file.
    pub fn apply_cli(mut self, cli: &Cli) -> Settings {
        if let Some(character) = cli.character {
            self.character = character;
        }
        if let Some(level) = cli.level {
            self.level = level;
        }
        if let Some(seed) = cli.seed {
            self.seed = Some(seed);
        }
        if let Some(log_file) = &cli.log_file {
            self.log_file = log_file.clone();
        }
        self
    }

    pub fn from_cli(cli: &Cli) -> Result<Settings, ConfigError> {
        Ok(Settings::load(cli.config.as_deref())?.apply_cli(cli))
    }

    pub fn playground(&self) -> Result<Playground, ConfigError> {
        Playground::from_index(self.level).ok_or(ConfigError::UnknownLevel(self.level))
    }
}
