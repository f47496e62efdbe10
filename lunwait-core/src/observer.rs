//! Injected observability for probes and waits.
//!
//! Resolution code never logs directly; it reports [`ProbeEvent`]s to a [`ProbeObserver`]
//! handed in by the caller. [`LogObserver`] forwards to the `log` facade, [`NoopObserver`]
//! drops everything and [`RecordingObserver`] keeps events for assertions.

use crate::lun::Lun;
use crate::resolver::StrategyKind;
use crate::waiter::WaitTarget;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeEvent {
    /// A strategy is about to look at `candidate` (a path, pattern or directory).
    StrategyStarted {
        lun: Lun,
        strategy: StrategyKind,
        candidate: String,
    },
    Matched {
        lun: Lun,
        strategy: StrategyKind,
        device: PathBuf,
    },
    StrategyFailed {
        lun: Lun,
        strategy: StrategyKind,
        error: String,
    },
    WaitStarted {
        lun: Lun,
        target: WaitTarget,
    },
    /// Probe `attempt` did not settle the wait; sleeping before the next one.
    Waiting {
        lun: Lun,
        target: WaitTarget,
        attempt: u64,
    },
}

pub trait ProbeObserver: Send + Sync {
    fn on_event(&self, event: &ProbeEvent);
}

/// Writes events to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl ProbeObserver for LogObserver {
    fn on_event(&self, event: &ProbeEvent) {
        match event {
            ProbeEvent::StrategyStarted {
                lun,
                strategy,
                candidate,
            } => log::info!("Check by {} ({}) for lun={}", strategy, candidate, lun),
            ProbeEvent::Matched {
                lun,
                strategy,
                device,
            } => log::info!(
                "lun={} resolved to {} via {}",
                lun,
                device.display(),
                strategy
            ),
            ProbeEvent::StrategyFailed {
                lun,
                strategy,
                error,
            } => log::warn!("{} probe for lun={} failed: {}", strategy, lun, error),
            ProbeEvent::WaitStarted { lun, target } => match target {
                WaitTarget::Attach => log::info!("Wait for Linux device lun {} to show up", lun),
                WaitTarget::Detach => log::info!("Wait for Linux device lun {} to go away", lun),
            },
            ProbeEvent::Waiting {
                lun,
                target,
                attempt,
            } => log::debug!(
                "lun {} not {} yet (attempt {}), waiting",
                lun,
                match target {
                    WaitTarget::Attach => "attached",
                    WaitTarget::Detach => "detached",
                },
                attempt
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ProbeObserver for NoopObserver {
    fn on_event(&self, _event: &ProbeEvent) {}
}

/// Keeps every event in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<ProbeEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ProbeEvent>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn events(&self) -> Vec<ProbeEvent> {
        self.lock().clone()
    }

    /// Strategies consulted, in order, across all recorded probes.
    pub fn strategies_started(&self) -> Vec<StrategyKind> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                ProbeEvent::StrategyStarted { strategy, .. } => Some(*strategy),
                _ => None,
            })
            .collect()
    }

    /// Number of sleeps between probes.
    pub fn waits(&self) -> usize {
        self.lock()
            .iter()
            .filter(|e| matches!(e, ProbeEvent::Waiting { .. }))
            .count()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl ProbeObserver for RecordingObserver {
    fn on_event(&self, event: &ProbeEvent) {
        self.lock().push(event.clone());
    }
}
