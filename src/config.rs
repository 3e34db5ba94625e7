use std::fs;

use camino::Utf8PathBuf;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::BookpostError;

/// Which review sources the orchestrator runs. `Full` is the two-phase
/// configuration (web search, then the marketplace); `Reduced` keeps a single
/// fallback search engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    Full,
    Reduced,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub data_dir: Option<String>,
    #[serde(default)]
    pub sources: Option<SourceMode>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub data_dir: Utf8PathBuf,
    pub sources: SourceMode,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            schema_version: 1,
            data_dir: Utf8PathBuf::from("data"),
            sources: SourceMode::Full,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `bookpost.json`. The file is optional when no explicit path is
    /// given; defaults apply without one.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, BookpostError> {
        let config_path = match path {
            Some(path) => Utf8PathBuf::from(path),
            None => Utf8PathBuf::from("bookpost.json"),
        };

        if path.is_none() && !config_path.as_std_path().exists() {
            return Ok(ResolvedConfig::default());
        }

        let content = fs::read_to_string(config_path.as_std_path())
            .map_err(|_| BookpostError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| BookpostError::ConfigParse(err.to_string()))?;

        Ok(Self::resolve_config(config))
    }

    pub fn resolve_config(config: Config) -> ResolvedConfig {
        ResolvedConfig {
            schema_version: config.schema_version.unwrap_or(1),
            data_dir: config
                .data_dir
                .map(Utf8PathBuf::from)
                .unwrap_or_else(|| Utf8PathBuf::from("data")),
            sources: config.sources.unwrap_or(SourceMode::Full),
        }
    }
}
