//! Alarm adapter backed by tokio timers.
//!
//! Each armed key owns one sleeping task. Re-arming or cancelling a key
//! aborts its task; a task that wakes sends its key down the channel
//! returned by [`TokioAlarmScheduler::new`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{AlarmKey, AlarmScheduler};
use crate::clock::Clock;
use crate::error::AlarmError;

pub struct TokioAlarmScheduler {
    clock: Arc<dyn Clock>,
    tx: mpsc::UnboundedSender<AlarmKey>,
    armed: Mutex<HashMap<AlarmKey, JoinHandle<()>>>,
}

impl TokioAlarmScheduler {
    pub fn new(clock: Arc<dyn Clock>) -> (Self, mpsc::UnboundedReceiver<AlarmKey>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            clock,
            tx,
            armed: Mutex::new(HashMap::new()),
        };
        (scheduler, rx)
    }

    /// Keys whose timer has not yet delivered.
    pub fn pending_count(&self) -> usize {
        self.armed
            .lock()
            .map(|armed| armed.values().filter(|h| !h.is_finished()).count())
            .unwrap_or(0)
    }
}

impl AlarmScheduler for TokioAlarmScheduler {
    fn arm_exact(&self, key: &AlarmKey, at_ms: i64) -> Result<(), AlarmError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|_| AlarmError::RuntimeUnavailable(key.to_string()))?;

        let delay_ms = at_ms.saturating_sub(self.clock.now_ms()).max(0) as u64;
        let tx = self.tx.clone();
        let fired = key.clone();
        let task = handle.spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            // Receiver gone means the run loop is shutting down.
            let _ = tx.send(fired);
        });

        let mut armed = self.armed.lock().map_err(|_| AlarmError::LockPoisoned)?;
        if let Some(previous) = armed.insert(key.clone(), task) {
            previous.abort();
        }
        tracing::debug!(%key, at_ms, delay_ms, "alarm armed");
        Ok(())
    }

    fn cancel(&self, key: &AlarmKey) -> Result<(), AlarmError> {
        let mut armed = self.armed.lock().map_err(|_| AlarmError::LockPoisoned)?;
        if let Some(task) = armed.remove(key) {
            task.abort();
            tracing::debug!(%key, "alarm cancelled");
        }
        Ok(())
    }
}

impl Drop for TokioAlarmScheduler {
    fn drop(&mut self) {
        if let Ok(armed) = self.armed.get_mut() {
            for (_, task) in armed.drain() {
                task.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[tokio::test(start_paused = true)]
    async fn delivers_key_at_instant() {
        let clock = Arc::new(ManualClock::new(1_000));
        let (alarms, mut rx) = TokioAlarmScheduler::new(clock);

        alarms.arm_exact(&AlarmKey::talk("T1"), 61_000).unwrap();
        assert_eq!(alarms.pending_count(), 1);

        let key = rx.recv().await.unwrap();
        assert_eq!(key, AlarmKey::talk("T1"));
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_replaces_earlier_timer() {
        let clock = Arc::new(ManualClock::new(0));
        let (alarms, mut rx) = TokioAlarmScheduler::new(clock);

        alarms.arm_exact(&AlarmKey::talk("T1"), 10).unwrap();
        alarms.arm_exact(&AlarmKey::talk("T1"), 5_000).unwrap();
        alarms.arm_exact(&AlarmKey::post("T1"), 20_000).unwrap();

        assert_eq!(rx.recv().await.unwrap(), AlarmKey::talk("T1"));
        assert_eq!(rx.recv().await.unwrap(), AlarmKey::post("T1"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_key_never_arrives() {
        let clock = Arc::new(ManualClock::new(0));
        let (alarms, mut rx) = TokioAlarmScheduler::new(clock);

        alarms.arm_exact(&AlarmKey::talk("gone"), 100).unwrap();
        alarms.arm_exact(&AlarmKey::post("kept"), 200).unwrap();
        alarms.cancel(&AlarmKey::talk("gone")).unwrap();
        alarms.cancel(&AlarmKey::talk("never-armed")).unwrap();

        assert_eq!(rx.recv().await.unwrap(), AlarmKey::post("kept"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn arming_outside_runtime_fails() {
        let clock = Arc::new(ManualClock::new(0));
        let (alarms, _rx) = TokioAlarmScheduler::new(clock);
        let err = alarms.arm_exact(&AlarmKey::talk("T1"), 10).unwrap_err();
        assert!(matches!(err, AlarmError::RuntimeUnavailable(_)));
    }
}
