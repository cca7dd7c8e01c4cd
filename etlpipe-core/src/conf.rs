use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_BASE: &str = "https://jsonplaceholder.typicode.com";
pub const DB_PATH: &str = "pipeline.db";
pub const HTTP_TIMEOUT_SECS: u64 = 8;
pub const CONFIG_FILE: &str = "config.json";

/// Limits and thresholds used by the analysis queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConf {
    pub top_users: i64,
    pub avg_title_users: i64,
    pub short_title_threshold: i64,
    pub short_title_limit: i64,
    pub join_limit: i64,
}

impl Default for AnalysisConf {
    fn default() -> Self {
        Self {
            top_users: 5,
            avg_title_users: 10,
            short_title_threshold: 10,
            short_title_limit: 10,
            join_limit: 10,
        }
    }
}

/// Run configuration handed to every pipeline stage.
///
/// Values come from the built-in defaults, then an optional JSON file, then
/// whatever the caller overrides on top (the CLI flags).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Conf {
    pub api_base: String,
    pub db_path: PathBuf,
    pub http_timeout_secs: u64,
    pub analysis: AnalysisConf,
}

impl Default for Conf {
    fn default() -> Self {
        Self {
            api_base: API_BASE.to_string(),
            db_path: PathBuf::from(DB_PATH),
            http_timeout_secs: HTTP_TIMEOUT_SECS,
            analysis: AnalysisConf::default(),
        }
    }
}

impl Conf {
    pub fn new() -> Self {
        Self::default()
    }

    /// `config.json` inside the platform config directory, if one can be resolved.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "etlpipe", "etlpipe")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let conf: Conf = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        conf.validate()?;
        Ok(conf)
    }

    /// Loads the configuration. An explicit path must exist; the default
    /// location is only used when a file is actually there.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            info!("Loading config from {}", path.display());
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => {
                info!("Loading config from {}", path.display());
                Self::from_file(&path)
            }
            Some(path) => {
                debug!("No config file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            None => {
                debug!("No project config directory, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_base.trim().is_empty() {
            bail!("api_base must not be empty");
        }
        if self.db_path.as_os_str().is_empty() {
            bail!("db_path must not be empty");
        }
        if self.http_timeout_secs == 0 {
            bail!("http_timeout_secs must be greater than zero");
        }
        let a = &self.analysis;
        for (name, value) in [
            ("top_users", a.top_users),
            ("avg_title_users", a.avg_title_users),
            ("short_title_limit", a.short_title_limit),
            ("join_limit", a.join_limit),
        ] {
            if value < 0 {
                bail!("analysis.{} must not be negative (got {})", name, value);
            }
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
