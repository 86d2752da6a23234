use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{AlarmKey, AlarmScheduler};
use crate::error::AlarmError;

/// One call observed by [`RecordingAlarmScheduler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmOp {
    Arm { key: AlarmKey, at_ms: i64 },
    Cancel { key: AlarmKey },
}

/// In-process scheduler that only remembers what is armed.
///
/// Nothing is ever delivered on its own; the holder decides when a key
/// "fires". Used for simulations and tests.
#[derive(Debug, Default)]
pub struct RecordingAlarmScheduler {
    pending: Mutex<BTreeMap<AlarmKey, i64>>,
    ops: Mutex<Vec<AlarmOp>>,
    reject_arms: AtomicBool,
}

impl RecordingAlarmScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `arm_exact` fail until turned off again.
    pub fn reject_arms(&self, reject: bool) {
        self.reject_arms.store(reject, Ordering::SeqCst);
    }

    /// Instant a key is armed for, if any.
    pub fn pending(&self, key: &AlarmKey) -> Option<i64> {
        lock(&self.pending).get(key).copied()
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Keys whose instant is at or before `now_ms`, earliest first.
    pub fn due(&self, now_ms: i64) -> Vec<AlarmKey> {
        let pending = lock(&self.pending);
        let mut due: Vec<_> = pending
            .iter()
            .filter(|(_, at)| **at <= now_ms)
            .map(|(key, at)| (*at, key.clone()))
            .collect();
        due.sort();
        due.into_iter().map(|(_, key)| key).collect()
    }

    pub fn ops(&self) -> Vec<AlarmOp> {
        lock(&self.ops).clone()
    }

    pub fn clear_ops(&self) {
        lock(&self.ops).clear();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl AlarmScheduler for RecordingAlarmScheduler {
    fn arm_exact(&self, key: &AlarmKey, at_ms: i64) -> Result<(), AlarmError> {
        if self.reject_arms.load(Ordering::SeqCst) {
            return Err(AlarmError::Rejected {
                key: key.to_string(),
                message: "arming disabled".into(),
            });
        }
        lock(&self.pending).insert(key.clone(), at_ms);
        lock(&self.ops).push(AlarmOp::Arm {
            key: key.clone(),
            at_ms,
        });
        Ok(())
    }

    fn cancel(&self, key: &AlarmKey) -> Result<(), AlarmError> {
        lock(&self.pending).remove(key);
        lock(&self.ops).push(AlarmOp::Cancel { key: key.clone() });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rearm_supersedes_previous_registration() {
        let alarms = RecordingAlarmScheduler::new();
        let key = AlarmKey::talk("T1");
        alarms.arm_exact(&key, 100).unwrap();
        alarms.arm_exact(&key, 200).unwrap();
        assert_eq!(alarms.pending(&key), Some(200));
        assert_eq!(alarms.pending_count(), 1);
    }

    #[test]
    fn due_is_ordered_by_instant() {
        let alarms = RecordingAlarmScheduler::new();
        alarms.arm_exact(&AlarmKey::post("a"), 300).unwrap();
        alarms.arm_exact(&AlarmKey::talk("b"), 100).unwrap();
        alarms.arm_exact(&AlarmKey::talk("c"), 900).unwrap();
        assert_eq!(
            alarms.due(500),
            vec![AlarmKey::talk("b"), AlarmKey::post("a")]
        );
    }

    #[test]
    fn rejecting_leaves_nothing_armed() {
        let alarms = RecordingAlarmScheduler::new();
        alarms.reject_arms(true);
        assert!(alarms.arm_exact(&AlarmKey::talk("x"), 1).is_err());
        assert_eq!(alarms.pending_count(), 0);
        assert!(alarms.cancel(&AlarmKey::talk("x")).is_ok());
    }
}
