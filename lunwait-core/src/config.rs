//! Runtime configuration (TOML).
//!
//! ```toml
//! root = "/"
//! poll_interval_ms = 100
//! log_level = "info"
//! log_file = "/var/log/lunwait.log"
//! ```
//!
//! Every field is optional.

use crate::layout::DeviceLayout;
use crate::waiter::DEFAULT_POLL_INTERVAL;
use anyhow::{bail, Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LunwaitConfig {
    /// Sysroot the device namespace is read from.
    pub root: PathBuf,
    pub poll_interval_ms: u64,
    pub log_level: String,
    /// Append logs here instead of stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for LunwaitConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/"),
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl LunwaitConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(content).context("invalid lunwait config TOML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be greater than zero");
        }
        self.level_filter()?;
        Ok(())
    }

    pub fn level_filter(&self) -> Result<LevelFilter> {
        self.log_level
            .parse::<LevelFilter>()
            .with_context(|| format!("unknown log level: {}", self.log_level))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn layout(&self) -> DeviceLayout {
        DeviceLayout::with_root(&self.root)
    }
}
