// Demo configuration: TOML file first, environment variables on top.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, InitError};
use crate::singleton::TryLazy;

pub const DEFAULT_CONFIG_FILE: &str = "creational.toml";

pub const ENV_THREADS: &str = "CREATIONAL_THREADS";
pub const ENV_CALLS: &str = "CREATIONAL_CALLS";
pub const ENV_LOG: &str = "CREATIONAL_LOG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    /// Threads racing for first access in the contention demo.
    pub threads: usize,
    /// `get_instance` calls made by each thread.
    pub calls_per_thread: usize,
    /// Fallback log filter when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            threads: 8,
            calls_per_thread: 1_000,
            log_level: "info".to_string(),
        }
    }
}

impl DemoConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: DemoConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Reads `creational.toml` from the working directory when it exists,
    /// then applies the `CREATIONAL_*` environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE), |key| std::env::var(key).ok())
    }

    /// Like [`DemoConfig::load`] with an explicit file and variable lookup.
    /// A missing file means defaults; an unreadable or invalid one is an error.
    pub fn load_from<F>(path: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            tracing::debug!("no {} found, using defaults", path.display());
            Self::default()
        };

        config.apply_overrides(lookup)?;
        Ok(config)
    }

    /// Process-wide configuration, loaded on first successful use. A failed
    /// load is returned to the caller and retried on the next call.
    pub fn global() -> Result<&'static DemoConfig, InitError<ConfigError>> {
        static CONFIG: TryLazy<DemoConfig> = TryLazy::new();
        CONFIG.try_get_instance(Self::load)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_THREADS) {
            self.threads = parse_count(ENV_THREADS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_CALLS) {
            self.calls_per_thread = parse_count(ENV_CALLS, &raw)?;
        }
        if let Some(level) = lookup(ENV_LOG) {
            self.log_level = level;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::invalid_value("threads", "must be at least 1"));
        }
        if self.calls_per_thread == 0 {
            return Err(ConfigError::invalid_value("calls_per_thread", "must be at least 1"));
        }
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::invalid_value("log_level", "must not be empty"));
        }
        Ok(())
    }
}

fn parse_count(field: &str, raw: &str) -> Result<usize, ConfigError> {
    raw.trim()
        .parse::<usize>()
        .map_err(|err| ConfigError::invalid_value(field, format!("'{raw}' is not a count: {err}")))
}
