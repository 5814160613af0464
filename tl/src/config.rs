//! TenantLetters configuration types and loading

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Context, Result, eyre};
use letterrender::RateTable;
use serde::{Deserialize, Serialize};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Directory holding `index.yml` and the template files
    #[serde(rename = "templates-dir")]
    pub templates_dir: PathBuf,

    /// Year to annual rate, replacing the built-in table when set
    #[serde(rename = "interest-rates")]
    pub interest_rates: Option<BTreeMap<i32, f64>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: None,
            templates_dir: PathBuf::from("templates"),
            interest_rates: None,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    ///
    /// Explicit path, then `./tenantletters.yml`, then
    /// `~/.config/tenantletters/tenantletters.yml`, then defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::default_paths() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let path = match config_path {
            Some(path) => path.clone(),
            None => Self::default_paths().into_iter().find(|p| p.exists())?,
        };
        Self::load_from_file(&path).ok()?.log_level
    }

    fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("tenantletters.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("tenantletters").join("tenantletters.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Reject rates that are negative or not finite
    pub fn validate(&self) -> Result<()> {
        if let Some(rates) = &self.interest_rates {
            for (year, rate) in rates {
                if !rate.is_finite() || *rate < 0.0 {
                    return Err(eyre!("Invalid interest rate {} for year {}", rate, year));
                }
            }
        }
        Ok(())
    }

    /// Interest-rate table to render with
    pub fn rate_table(&self) -> RateTable {
        match &self.interest_rates {
            Some(rates) => RateTable::new(rates.clone()),
            None => RateTable::default(),
        }
    }
}
