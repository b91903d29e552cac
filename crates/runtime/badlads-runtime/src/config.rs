use crate::error::RuntimeError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for the `badlads-host` runner.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Plugin `.wasm` file. Relative paths are resolved against the config file.
    pub plugin_path: PathBuf,

    /// Log filter (e.g. "info", "badlads_runtime=debug"). `RUST_LOG` wins when set.
    pub log_level: Option<String>,

    /// `onTick` calls per second.
    #[serde(default = "default_tick_rate_hz")]
    pub tick_rate_hz: u32,

    /// Stop after this many ticks. Runs until Ctrl+C when unset.
    pub max_ticks: Option<u64>,

    /// Reject modules that import functions this host does not provide.
    #[serde(default = "default_strict_imports")]
    pub strict_imports: bool,

    /// How often the plugin file is checked for changes.
    #[serde(default = "default_watch_interval_ms")]
    pub watch_interval_ms: u64,
}

fn default_tick_rate_hz() -> u32 {
    30
}

fn default_strict_imports() -> bool {
    true
}

fn default_watch_interval_ms() -> u64 {
    1000
}

impl RuntimeConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, RuntimeError> {
        let config: RuntimeConfig =
            toml::from_str(contents).map_err(|e| RuntimeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, RuntimeError> {
        let contents = fs::read_to_string(path).map_err(|source| RuntimeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&contents)?;
        if config.plugin_path.is_relative() {
            if let Some(dir) = path.parent() {
                config.plugin_path = dir.join(&config.plugin_path);
            }
        }
        Ok(config)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate_hz))
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.watch_interval_ms)
    }

    fn validate(&self) -> Result<(), RuntimeError> {
        if self.tick_rate_hz == 0 {
            return Err(RuntimeError::Config("tick_rate_hz must be at least 1".into()));
        }
        if self.watch_interval_ms == 0 {
            return Err(RuntimeError::Config("watch_interval_ms must be at least 1".into()));
        }
        Ok(())
    }
}
