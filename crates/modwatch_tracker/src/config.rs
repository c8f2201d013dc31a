//! Runtime configuration.
//!
//! Loaded with the `config` crate from, in increasing precedence:
//! - Bundled defaults (include_str! from modwatch.toml)
//! - An optional user file
//! - `MODWATCH__*` environment variables (`__` separates nesting levels)

use config::{Config, Environment, File, FileFormat};
use derive_getters::Getters;
use modwatch_cache::{CachePolicy, CachePolicyBuilder};
use modwatch_catalog::CatalogConfig;
use modwatch_error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_CONFIG: &str = include_str!("../../../modwatch.toml");

/// Where notifications are delivered from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DispatchMode {
    /// The cycle task delivers right after advancing the cursor.
    #[default]
    Inline,
    /// The cycle enqueues a job; a separate worker delivers.
    Queued,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct LogConfig {
    /// Default filter directive when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    level: String,
    /// Emit JSON lines instead of human-readable text
    #[serde(default)]
    json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl LogConfig {
    /// Override the level directive.
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Toggle JSON output.
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

/// Top-level modwatch configuration.
///
/// # Example
///
/// ```no_run
/// use modwatch_tracker::ModwatchConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ModwatchConfig::load(None)?;
/// println!("Polling every {:?}", config.poll_interval());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ModwatchConfig {
    /// Minutes between detection cycles
    #[serde(default = "default_poll_interval_minutes")]
    poll_interval_minutes: u64,

    /// Ids per upstream batch call
    #[serde(default = "default_version_batch_size")]
    version_batch_size: usize,

    /// Lifetime of cached project metadata
    #[serde(default = "default_project_cache_ttl_minutes")]
    project_cache_ttl_minutes: u64,

    /// Lifetime of cached team membership
    #[serde(default = "default_team_cache_ttl_minutes")]
    team_cache_ttl_minutes: u64,

    /// Lifetime of cached taxonomy (loaders)
    #[serde(default = "default_taxonomy_cache_ttl_hours")]
    taxonomy_cache_ttl_hours: u64,

    /// Projects processed concurrently once fetching is done
    #[serde(default = "default_max_concurrent_projects")]
    max_concurrent_projects: usize,

    /// Projects not started within this many minutes wait for the next tick
    #[serde(default)]
    cycle_deadline_minutes: Option<u64>,

    /// Inline or queued delivery
    #[serde(default)]
    dispatch_mode: DispatchMode,

    /// Pending jobs the queued dispatcher buffers
    #[serde(default = "default_queue_capacity")]
    queue_capacity: usize,

    /// Catalog client settings
    #[serde(default)]
    catalog: CatalogConfig,

    /// Logging settings
    #[serde(default)]
    log: LogConfig,
}

fn default_poll_interval_minutes() -> u64 {
    20
}

fn default_version_batch_size() -> usize {
    500
}

fn default_project_cache_ttl_minutes() -> u64 {
    15
}

fn default_team_cache_ttl_minutes() -> u64 {
    30
}

fn default_taxonomy_cache_ttl_hours() -> u64 {
    6
}

fn default_max_concurrent_projects() -> usize {
    8
}

fn default_queue_capacity() -> usize {
    256
}

impl Default for ModwatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_minutes: default_poll_interval_minutes(),
            version_batch_size: default_version_batch_size(),
            project_cache_ttl_minutes: default_project_cache_ttl_minutes(),
            team_cache_ttl_minutes: default_team_cache_ttl_minutes(),
            taxonomy_cache_ttl_hours: default_taxonomy_cache_ttl_hours(),
            max_concurrent_projects: default_max_concurrent_projects(),
            cycle_deadline_minutes: None,
            dispatch_mode: DispatchMode::default(),
            queue_capacity: default_queue_capacity(),
            catalog: CatalogConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl ModwatchConfig {
    /// Load bundled defaults, then `path` if given, then the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read, a value has the wrong
    /// type, or [`validate`](Self::validate) rejects the result.
    #[instrument(skip(path))]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        debug!("Loading configuration with precedence: env > file > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(path) = path {
            debug!(path = %path.display(), "Adding configuration file");
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("MODWATCH")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string layered over the bundled defaults.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load), minus the environment.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending option.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive: [(&str, u64); 7] = [
            ("poll_interval_minutes", self.poll_interval_minutes),
            ("version_batch_size", self.version_batch_size as u64),
            ("project_cache_ttl_minutes", self.project_cache_ttl_minutes),
            ("team_cache_ttl_minutes", self.team_cache_ttl_minutes),
            ("taxonomy_cache_ttl_hours", self.taxonomy_cache_ttl_hours),
            ("max_concurrent_projects", self.max_concurrent_projects as u64),
            ("queue_capacity", self.queue_capacity as u64),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::new(format!("{} must be greater than zero", name)));
        }
        if self.cycle_deadline_minutes == Some(0) {
            return Err(ConfigError::new("cycle_deadline_minutes must be greater than zero"));
        }
        if *self.catalog.requests_per_minute() == 0 {
            return Err(ConfigError::new(
                "catalog.requests_per_minute must be greater than zero",
            ));
        }
        if self.catalog.user_agent().trim().is_empty() {
            return Err(ConfigError::new("catalog.user_agent must not be empty"));
        }
        Ok(())
    }

    /// Time between scheduled cycles.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_minutes * 60)
    }

    /// Optional per-cycle deadline.
    pub fn cycle_deadline(&self) -> Option<Duration> {
        self.cycle_deadline_minutes
            .map(|minutes| Duration::from_secs(minutes * 60))
    }

    /// Cache policy derived from the TTL options.
    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicyBuilder::default()
            .project_ttl_secs(self.project_cache_ttl_minutes * 60)
            .team_ttl_secs(self.team_cache_ttl_minutes * 60)
            .taxonomy_ttl_secs(self.taxonomy_cache_ttl_hours * 3600)
            .build()
            .unwrap_or_default()
    }

    /// Override the poll interval.
    pub fn with_poll_interval_minutes(mut self, minutes: u64) -> Self {
        self.poll_interval_minutes = minutes;
        self
    }

    /// Override the batch size.
    pub fn with_version_batch_size(mut self, size: usize) -> Self {
        self.version_batch_size = size;
        self
    }

    /// Override the dispatch mode.
    pub fn with_dispatch_mode(mut self, mode: DispatchMode) -> Self {
        self.dispatch_mode = mode;
        self
    }

    /// Override the log settings.
    pub fn with_log(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }
}
