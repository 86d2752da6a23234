//! Alarm adapter boundary.
//!
//! The engine never keeps time itself. It asks an [`AlarmScheduler`] to
//! deliver an [`AlarmKey`] back at an exact instant, and the owner of the
//! scheduler routes delivered keys to `NotificationsManager::dispatch`.
//!
//! Keys are derived only from the slot id and the alarm kind, so arming the
//! same key again replaces the earlier registration.

mod recording;
mod tokio_scheduler;

pub use recording::{AlarmOp, RecordingAlarmScheduler};
pub use tokio_scheduler::TokioAlarmScheduler;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AlarmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmKind {
    /// Reminder before the talk starts.
    Talk,
    /// Reminder after the talk ends.
    Post,
}

/// Stable registration key for one alarm.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AlarmKey {
    pub slot_id: String,
    pub kind: AlarmKind,
}

impl AlarmKey {
    pub fn talk(slot_id: impl Into<String>) -> Self {
        Self {
            slot_id: slot_id.into(),
            kind: AlarmKind::Talk,
        }
    }

    pub fn post(slot_id: impl Into<String>) -> Self {
        Self {
            slot_id: slot_id.into(),
            kind: AlarmKind::Post,
        }
    }
}

impl fmt::Display for AlarmKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            AlarmKind::Talk => "talk",
            AlarmKind::Post => "post",
        };
        write!(f, "{kind}:{}", self.slot_id)
    }
}

/// "Deliver this key at that instant" capability.
///
/// Cancelling a key that is not armed is not an error.
pub trait AlarmScheduler {
    fn arm_exact(&self, key: &AlarmKey, at_ms: i64) -> Result<(), AlarmError>;

    fn cancel(&self, key: &AlarmKey) -> Result<(), AlarmError>;
}

/// Scheduler for short-lived processes that cannot hold timers.
///
/// Arming only logs; the durable record is the source of truth and the
/// long-running process re-arms everything on start.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedAlarmScheduler;

impl AlarmScheduler for DetachedAlarmScheduler {
    fn arm_exact(&self, key: &AlarmKey, at_ms: i64) -> Result<(), AlarmError> {
        tracing::debug!(%key, at_ms, "alarm recorded for the next run loop");
        Ok(())
    }

    fn cancel(&self, key: &AlarmKey) -> Result<(), AlarmError> {
        tracing::debug!(%key, "alarm cancel recorded");
        Ok(())
    }
}
