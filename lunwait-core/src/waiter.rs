//! Poll the resolver until a disk attach (or detach) settles.
//!
//! Attach is asynchronous: the hypervisor reports success before the guest kernel and udev
//! have created device nodes. The waiter re-probes on a short fixed interval (no backoff,
//! attaches normally settle in well under a second) and relies on the caller's
//! [`CancelToken`] for an upper bound.

use crate::cancel::CancelToken;
use crate::layout::DeviceLayout;
use crate::lun::Lun;
use crate::observer::ProbeEvent;
use crate::resolver::{DeviceMatch, LunResolver, Resolution};
use lunwait_error::{CancelReason, ProbeError, WaitError};
use lunwait_hal::LinuxFs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitTarget {
    Attach,
    Detach,
}

/// How a wait for a device ended.
#[derive(Debug)]
pub enum WaitOutcome {
    Resolved(DeviceMatch),
    Cancelled(CancelReason),
    Failed(ProbeError),
}

impl WaitOutcome {
    pub fn into_result(self) -> Result<DeviceMatch, WaitError> {
        match self {
            WaitOutcome::Resolved(found) => Ok(found),
            WaitOutcome::Cancelled(reason) => Err(WaitError::Cancelled(reason)),
            WaitOutcome::Failed(err) => Err(WaitError::Probe(err)),
        }
    }
}

impl From<Result<DeviceMatch, WaitError>> for WaitOutcome {
    fn from(res: Result<DeviceMatch, WaitError>) -> Self {
        match res {
            Ok(found) => WaitOutcome::Resolved(found),
            Err(WaitError::Cancelled(reason)) => WaitOutcome::Cancelled(reason),
            Err(WaitError::Probe(err)) => WaitOutcome::Failed(err),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttachmentWaiter {
    resolver: Arc<LunResolver>,
    poll_interval: Duration,
}

impl AttachmentWaiter {
    pub fn new(resolver: Arc<LunResolver>) -> Self {
        Self {
            resolver,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn resolver(&self) -> &LunResolver {
        &self.resolver
    }

    /// Wait for `lun` to show up as a block device.
    pub fn wait(&self, lun: Lun, token: &CancelToken) -> WaitOutcome {
        self.poll_until(lun, token, WaitTarget::Attach, |res| match res {
            Resolution::Found(found) => Some(found),
            Resolution::NotFound => None,
        })
        .into()
    }

    /// Like [`wait`](Self::wait), returning just the resolved device path.
    pub fn wait_for_device(&self, lun: Lun, token: &CancelToken) -> Result<PathBuf, WaitError> {
        self.wait(lun, token).into_result().map(|found| found.path)
    }

    /// Wait until no naming scheme reports a device for `lun` any more.
    pub fn wait_for_detach(&self, lun: Lun, token: &CancelToken) -> Result<(), WaitError> {
        self.poll_until(lun, token, WaitTarget::Detach, |res| match res {
            Resolution::Found(_) => None,
            Resolution::NotFound => Some(()),
        })
    }

    /// Probe, and sleep between probes, until `settled` accepts a resolution.
    ///
    /// Hard probe errors end the wait at once. The token is checked before every probe and
    /// during every sleep, never in the middle of a probe.
    fn poll_until<T>(
        &self,
        lun: Lun,
        token: &CancelToken,
        target: WaitTarget,
        mut settled: impl FnMut(Resolution) -> Option<T>,
    ) -> Result<T, WaitError> {
        let observer = self.resolver.observer();
        observer.on_event(&ProbeEvent::WaitStarted { lun, target });

        let mut attempt: u64 = 0;
        loop {
            if let Some(reason) = token.reason() {
                return Err(WaitError::Cancelled(reason));
            }
            attempt += 1;

            if let Some(done) = settled(self.resolver.resolve(lun)?) {
                return Ok(done);
            }

            observer.on_event(&ProbeEvent::Waiting {
                lun,
                target,
                attempt,
            });
            token
                .sleep(self.poll_interval)
                .map_err(WaitError::Cancelled)?;
        }
    }
}

/// Wait for `lun` on the live system with the standard layout and poll interval.
pub fn wait_for_device(lun: Lun, token: &CancelToken) -> Result<PathBuf, WaitError> {
    let resolver = LunResolver::with_layout(Arc::new(LinuxFs::new()), &DeviceLayout::default());
    AttachmentWaiter::new(Arc::new(resolver)).wait_for_device(lun, token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::RecordingObserver;
    use crate::resolver::StrategyKind;
    use lunwait_hal::{FakeFs, FsCall};
    use std::io;
    use std::time::Instant;

    fn waiter(fs: &FakeFs, observer: &RecordingObserver) -> AttachmentWaiter {
        let resolver =
            LunResolver::new(Arc::new(fs.clone())).with_observer(Arc::new(observer.clone()));
        AttachmentWaiter::new(Arc::new(resolver))
    }

    #[test]
    fn present_device_resolves_without_sleeping() {
        let fs = FakeFs::new();
        fs.add_block_device("/dev/sdc")
            .add_symlink("/dev/disk/azure/scsi1/lun0", "/dev/sdc");
        let observer = RecordingObserver::new();

        let outcome = waiter(&fs, &observer).wait(Lun::new(0), &CancelToken::new());
        match outcome {
            WaitOutcome::Resolved(found) => {
                assert_eq!(found.path, PathBuf::from("/dev/sdc"));
                assert_eq!(found.strategy, StrategyKind::LegacyScsi);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(observer.waits(), 0);
    }

    #[test]
    fn hard_error_fails_without_sleeping() {
        let fs = FakeFs::new();
        fs.fail(
            FsCall::Stat,
            "/dev/disk/azure/scsi1/lun0",
            io::ErrorKind::PermissionDenied,
        );
        let observer = RecordingObserver::new();

        let start = Instant::now();
        let outcome = waiter(&fs, &observer).wait(Lun::new(0), &CancelToken::new());
        assert!(matches!(outcome, WaitOutcome::Failed(_)));
        assert_eq!(observer.waits(), 0);
        assert!(start.elapsed() < DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn already_cancelled_token_skips_probing() {
        let fs = FakeFs::new();
        fs.add_block_device("/dev/sdc")
            .add_symlink("/dev/disk/azure/lun0", "/dev/sdc");
        let token = CancelToken::new();
        token.cancel();

        let err = waiter(&fs, &RecordingObserver::new())
            .wait_for_device(Lun::new(0), &token)
            .unwrap_err();
        assert!(matches!(err, WaitError::Cancelled(CancelReason::Cancelled)));
        assert_eq!(fs.operation_count(), 0);
    }

    #[test]
    fn deadline_ends_wait_for_missing_device() {
        let fs = FakeFs::new();
        let observer = RecordingObserver::new();
        let token = CancelToken::with_timeout(Duration::from_millis(250));

        let start = Instant::now();
        let err = waiter(&fs, &observer)
            .wait_for_device(Lun::new(5), &token)
            .unwrap_err();
        assert!(matches!(
            err,
            WaitError::Cancelled(CancelReason::DeadlineExceeded)
        ));
        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(observer.waits() >= 2);
    }

    #[test]
    fn detach_wait_returns_once_links_are_gone() {
        let fs = FakeFs::new();
        fs.add_block_device("/dev/sdc")
            .add_symlink("/dev/disk/azure/lun1", "/dev/sdc");
        let observer = RecordingObserver::new();
        let waiter = waiter(&fs, &observer).with_poll_interval(Duration::from_millis(10));

        let remover = fs.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            remover.remove("/dev/disk/azure/lun1");
        });

        waiter
            .wait_for_detach(Lun::new(1), &CancelToken::with_timeout(Duration::from_secs(5)))
            .unwrap();
        handle.join().unwrap();
        assert!(observer.waits() >= 1);
    }

    #[test]
    fn outcome_converts_to_result() {
        let err = WaitOutcome::Cancelled(CancelReason::Cancelled)
            .into_result()
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
