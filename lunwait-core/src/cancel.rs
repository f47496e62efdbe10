//! Cooperative cancellation for waits.
//!
//! A [`CancelToken`] is shared (by cloning) between the thread that waits and whoever may
//! abort it. It fires either on an explicit [`CancelToken::cancel`] or when its optional
//! deadline passes. Waiters only observe it between probes.

use lunwait_error::CancelReason;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Inner {
    reason: Mutex<Option<CancelReason>>,
    wake: Condvar,
    deadline: Option<Instant>,
}

#[derive(Debug, Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    /// A token that only fires on an explicit [`cancel`](Self::cancel).
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self::build(Some(deadline))
    }

    /// Deadline `timeout` from now. A timeout too large to represent means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::build(Instant::now().checked_add(timeout))
    }

    fn build(deadline: Option<Instant>) -> Self {
        Self {
            inner: Arc::new(Inner {
                reason: Mutex::new(None),
                wake: Condvar::new(),
                deadline,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<CancelReason>> {
        self.inner
            .reason
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Fire the token and wake every sleeper. Later calls keep the first reason.
    pub fn cancel(&self) {
        let mut reason = self.lock();
        if reason.is_none() {
            *reason = Some(CancelReason::Cancelled);
        }
        self.inner.wake.notify_all();
    }

    /// Why the token has fired, if it has.
    pub fn reason(&self) -> Option<CancelReason> {
        let reason = *self.lock();
        reason.or_else(|| self.deadline_passed(Instant::now()))
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    fn deadline_passed(&self, now: Instant) -> Option<CancelReason> {
        match self.inner.deadline {
            Some(deadline) if now >= deadline => Some(CancelReason::DeadlineExceeded),
            _ => None,
        }
    }

    /// Sleep for `interval` unless the token fires first.
    ///
    /// Returns `Err(reason)` as soon as the token fires (explicitly or by deadline), without
    /// waiting out the rest of the interval.
    pub fn sleep(&self, interval: Duration) -> Result<(), CancelReason> {
        let start = Instant::now();
        let wake_at = start.checked_add(interval);
        let mut reason = self.lock();
        loop {
            if let Some(r) = *reason {
                return Err(r);
            }
            let now = Instant::now();
            if let Some(r) = self.deadline_passed(now) {
                return Err(r);
            }
            let until = match (wake_at, self.inner.deadline) {
                (Some(w), _) if now >= w => return Ok(()),
                (Some(w), Some(d)) => w.min(d),
                (Some(w), None) => w,
                (None, Some(d)) => d,
                // Interval overflowed Instant and no deadline: wait for an explicit cancel.
                (None, None) => {
                    reason = self
                        .inner
                        .wake
                        .wait(reason)
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                    continue;
                }
            };
            let (guard, _) = self
                .inner
                .wake
                .wait_timeout(reason, until.saturating_duration_since(now))
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            reason = guard;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn fresh_token_is_not_cancelled() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert_eq!(token.deadline(), None);
        assert_eq!(token.sleep(Duration::from_millis(5)), Ok(()));
    }

    #[test]
    fn cancel_is_sticky_and_keeps_first_reason() {
        let token = CancelToken::with_timeout(Duration::from_secs(60));
        token.cancel();
        token.cancel();
        assert_eq!(token.reason(), Some(CancelReason::Cancelled));
        assert_eq!(
            token.sleep(Duration::from_secs(5)),
            Err(CancelReason::Cancelled)
        );
    }

    #[test]
    fn expired_deadline_reports_deadline_exceeded() {
        let token = CancelToken::with_deadline(Instant::now());
        assert_eq!(token.reason(), Some(CancelReason::DeadlineExceeded));
    }

    #[test]
    fn sleep_returns_at_deadline_not_after_interval() {
        let token = CancelToken::with_timeout(Duration::from_millis(30));
        let start = Instant::now();
        assert_eq!(
            token.sleep(Duration::from_secs(10)),
            Err(CancelReason::DeadlineExceeded)
        );
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn cancel_from_another_thread_wakes_sleeper() {
        let token = CancelToken::new();
        let remote = token.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            remote.cancel();
        });

        let start = Instant::now();
        assert_eq!(
            token.sleep(Duration::from_secs(10)),
            Err(CancelReason::Cancelled)
        );
        assert!(start.elapsed() < Duration::from_secs(2));
        handle.join().unwrap();
    }
}
