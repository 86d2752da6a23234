//! Keep-awake scope for long reconciliation passes.
//!
//! A [`WakeGuard`] holds the platform wake lock until it is dropped, so the
//! lock is released on every exit path of the holder, including `?` returns.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Platform capability that keeps the device from sleeping.
pub trait WakeLock: Send + Sync {
    fn acquire(&self, tag: &str) -> WakeGuard;
}

/// Releases its wake lock on drop.
#[must_use = "the wake lock is released as soon as the guard is dropped"]
pub struct WakeGuard {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl WakeGuard {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A guard that holds nothing.
    pub fn noop() -> Self {
        Self { release: None }
    }
}

impl Drop for WakeGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/// Desktop default: processes do not get suspended mid-pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopWakeLock;

impl WakeLock for NoopWakeLock {
    fn acquire(&self, tag: &str) -> WakeGuard {
        tracing::trace!(tag, "wake lock (noop) acquired");
        WakeGuard::noop()
    }
}

/// Wake lock that counts acquisitions and currently held guards.
#[derive(Debug, Clone, Default)]
pub struct CountingWakeLock {
    acquired: Arc<AtomicUsize>,
    held: Arc<AtomicUsize>,
}

impl CountingWakeLock {
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn held(&self) -> usize {
        self.held.load(Ordering::SeqCst)
    }
}

impl WakeLock for CountingWakeLock {
    fn acquire(&self, tag: &str) -> WakeGuard {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        self.held.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(tag, "wake lock acquired");
        let held = Arc::clone(&self.held);
        let tag = tag.to_string();
        WakeGuard::new(move || {
            held.fetch_sub(1, Ordering::SeqCst);
            tracing::debug!(tag = %tag, "wake lock released");
        })
    }
}
