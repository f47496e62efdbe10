//! LUN → block device resolution.
//!
//! A [`LunResolver`] owns a fixed, ordered list of [`Strategy`]s and asks each in turn; the
//! first one with evidence of a device wins, even if a later strategy would also match.
//! Earlier strategies are the more authoritative (or more widely present) naming schemes:
//!
//! 1. [`alias::AliasLinkStrategy::legacy_scsi`]: `/dev/disk/azure/scsi1/lun{N}`
//! 2. [`alias::AliasLinkStrategy::legacy_alias`]: `/dev/disk/azure/lun{N}`
//! 3. [`nvme_serial::NvmeSerialStrategy`]: NVMe controller serial ending in `N + 1`
//! 4. [`by_path::ByPathStrategy`]: first `/dev/disk/by-path` entry containing `lun{N}`
//!
//! Probing only reads. Not-found conditions mean "not attached yet" and let the next
//! strategy run; any other filesystem failure aborts resolution with a [`ProbeError`].

pub mod alias;
pub mod by_path;
mod links;
pub mod nvme_serial;

use crate::layout::DeviceLayout;
use crate::lun::Lun;
use crate::observer::{LogObserver, ProbeEvent, ProbeObserver};
use lunwait_error::ProbeResult;
use lunwait_hal::FsOps;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

pub use alias::AliasLinkStrategy;
pub use by_path::ByPathStrategy;
pub use nvme_serial::NvmeSerialStrategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    LegacyScsi,
    LegacyAlias,
    NvmeSerial,
    ScsiByPath,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::LegacyScsi => write!(f, "legacy-scsi"),
            StrategyKind::LegacyAlias => write!(f, "legacy-alias"),
            StrategyKind::NvmeSerial => write!(f, "nvme-serial"),
            StrategyKind::ScsiByPath => write!(f, "scsi-by-path"),
        }
    }
}

/// A device found for a LUN, and which naming scheme found it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceMatch {
    /// Absolute path to the block device node, symlinks dereferenced.
    pub path: PathBuf,
    pub strategy: StrategyKind,
}

impl DeviceMatch {
    pub fn new(path: impl Into<PathBuf>, strategy: StrategyKind) -> Self {
        Self {
            path: path.into(),
            strategy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(DeviceMatch),
    NotFound,
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }

    pub fn device(&self) -> Option<&DeviceMatch> {
        match self {
            Resolution::Found(m) => Some(m),
            Resolution::NotFound => None,
        }
    }
}

/// One device naming scheme.
pub trait Strategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// What this strategy looks at for `lun` (a path, pattern or directory), for diagnostics.
    fn candidate(&self, lun: Lun) -> String;

    /// Look for evidence of `lun`. Must only read from `fs`.
    fn probe(&self, fs: &dyn FsOps, lun: Lun) -> ProbeResult<Resolution>;
}

/// The four Azure naming schemes in priority order.
pub fn default_strategies(layout: &DeviceLayout) -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(AliasLinkStrategy::legacy_scsi(layout)),
        Box::new(AliasLinkStrategy::legacy_alias(layout)),
        Box::new(NvmeSerialStrategy::new(layout)),
        Box::new(ByPathStrategy::new(layout)),
    ]
}

pub struct LunResolver {
    fs: Arc<dyn FsOps>,
    strategies: Vec<Box<dyn Strategy>>,
    observer: Arc<dyn ProbeObserver>,
}

impl fmt::Debug for LunResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LunResolver")
            .field("strategies", &self.strategy_kinds())
            .finish_non_exhaustive()
    }
}

impl LunResolver {
    /// Resolver over the live Linux layout.
    pub fn new(fs: Arc<dyn FsOps>) -> Self {
        Self::with_layout(fs, &DeviceLayout::default())
    }

    pub fn with_layout(fs: Arc<dyn FsOps>, layout: &DeviceLayout) -> Self {
        Self::with_strategies(fs, default_strategies(layout))
    }

    /// Resolver with a caller-chosen strategy order.
    pub fn with_strategies(fs: Arc<dyn FsOps>, strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self {
            fs,
            strategies,
            observer: Arc::new(LogObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProbeObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn observer(&self) -> &dyn ProbeObserver {
        self.observer.as_ref()
    }

    pub fn strategy_kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    /// Probe every strategy in order; first match wins.
    ///
    /// Never blocks beyond synchronous reads and never retries. Returns
    /// `Ok(Resolution::NotFound)` when no strategy sees the LUN yet.
    pub fn resolve(&self, lun: Lun) -> ProbeResult<Resolution> {
        for strategy in &self.strategies {
            let kind = strategy.kind();
            self.observer.on_event(&ProbeEvent::StrategyStarted {
                lun,
                strategy: kind,
                candidate: strategy.candidate(lun),
            });

            match strategy.probe(self.fs.as_ref(), lun) {
                Ok(Resolution::Found(found)) => {
                    self.observer.on_event(&ProbeEvent::Matched {
                        lun,
                        strategy: kind,
                        device: found.path.clone(),
                    });
                    return Ok(Resolution::Found(found));
                }
                Ok(Resolution::NotFound) => continue,
                Err(err) => {
                    self.observer.on_event(&ProbeEvent::StrategyFailed {
                        lun,
                        strategy: kind,
                        error: err.to_string(),
                    });
                    return Err(err);
                }
            }
        }
        Ok(Resolution::NotFound)
    }
}
