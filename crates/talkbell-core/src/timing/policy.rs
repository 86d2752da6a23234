//! Reminder timing policy.
//!
//! Derives the two alarm instants for a slot and decides whether a reminder
//! can still be scheduled. Pure: the caller passes the current time.
//!
//! ```text
//!   talk_notification_time      start         end     post_notification_time
//!  ───────────┬───────────────────┬─────────────┬──────────────┬──────────────►
//!             │◄── pre offset ───►│             │◄─ post off. ─►│
//! ```
//!
//! In debug mode the pre-event reminder is placed `now + pre offset`
//! regardless of the slot's start so reminders show up quickly.

use serde::{Deserialize, Serialize};

use crate::slot::Slot;
use crate::storage::NotificationRecord;

const PROD_PRE_EVENT_OFFSET_MS: i64 = 60 * 60 * 1000;
const PROD_POST_EVENT_OFFSET_MS: i64 = 15 * 60 * 1000;
const DEBUG_PRE_EVENT_OFFSET_MS: i64 = 60 * 1000;
const DEBUG_POST_EVENT_OFFSET_MS: i64 = 10 * 1000;

/// How far past a talk's end a delayed pre-event alarm is still presented.
pub const DEFAULT_STALE_FIRE_GRACE_MS: i64 = 10 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationMode {
    #[default]
    Production,
    Debug,
}

impl NotificationMode {
    pub fn pre_event_offset_ms(self) -> i64 {
        match self {
            NotificationMode::Production => PROD_PRE_EVENT_OFFSET_MS,
            NotificationMode::Debug => DEBUG_PRE_EVENT_OFFSET_MS,
        }
    }

    pub fn post_event_offset_ms(self) -> i64 {
        match self {
            NotificationMode::Production => PROD_POST_EVENT_OFFSET_MS,
            NotificationMode::Debug => DEBUG_POST_EVENT_OFFSET_MS,
        }
    }
}

/// Timing rules for one engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingPolicy {
    mode: NotificationMode,
    stale_fire_grace_ms: i64,
}

impl Default for TimingPolicy {
    fn default() -> Self {
        Self::new(NotificationMode::Production)
    }
}

impl TimingPolicy {
    pub fn new(mode: NotificationMode) -> Self {
        Self {
            mode,
            stale_fire_grace_ms: DEFAULT_STALE_FIRE_GRACE_MS,
        }
    }

    pub fn with_stale_fire_grace_ms(mut self, grace_ms: i64) -> Self {
        self.stale_fire_grace_ms = grace_ms.max(0);
        self
    }

    pub fn mode(&self) -> NotificationMode {
        self.mode
    }

    pub fn stale_fire_grace_ms(&self) -> i64 {
        self.stale_fire_grace_ms
    }

    /// Compute a fresh configuration for a slot.
    pub fn for_slot(&self, slot: &Slot, with_toast: bool, now_ms: i64) -> NotificationConfiguration {
        let start = slot.from_time_millis;
        let end = slot.to_time_millis;
        let pre_offset = self.mode.pre_event_offset_ms();

        // An instant that overflows is stored as 0, which `is_invalid` rejects.
        let talk_notification_time = match self.mode {
            NotificationMode::Production => start.checked_sub(pre_offset),
            NotificationMode::Debug => now_ms.checked_add(pre_offset),
        }
        .unwrap_or(0);
        let post_notification_time = end
            .checked_add(self.mode.post_event_offset_ms())
            .unwrap_or(0);

        NotificationConfiguration {
            slot_id: slot.slot_id.clone(),
            talk_title: slot.title().to_string(),
            room_name: slot.room_name.clone(),
            talk_start_time: start,
            talk_end_time: end,
            with_toast,
            talk_notification_time,
            post_notification_time,
            mode: self.mode,
        }
    }

    /// Rebuild a configuration from a persisted record, keeping its stored instants.
    pub fn for_record(&self, record: &NotificationRecord, with_toast: bool) -> NotificationConfiguration {
        NotificationConfiguration {
            slot_id: record.slot_id.clone(),
            talk_title: record.talk_title.clone(),
            room_name: record.room_name.clone(),
            talk_start_time: record.talk_start_time,
            talk_end_time: record.talk_end_time,
            with_toast,
            talk_notification_time: record.talk_notification_time,
            post_notification_time: record.post_notification_time,
            mode: self.mode,
        }
    }

    /// Whether a pre-event alarm delivered at `now_ms` is still worth presenting:
    /// the talk ended no more than the grace period ago.
    pub fn is_before_event(&self, record: &NotificationRecord, now_ms: i64) -> bool {
        self.mode == NotificationMode::Debug
            || record.talk_end_time >= now_ms.saturating_sub(self.stale_fire_grace_ms)
    }
}

/// Ephemeral scheduling intent for one slot. Only its fields are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationConfiguration {
    pub slot_id: String,
    pub talk_title: String,
    pub room_name: String,
    pub talk_start_time: i64,
    pub talk_end_time: i64,
    pub with_toast: bool,
    /// Raw pre-event instant, before the fire-at-start fallback.
    pub talk_notification_time: i64,
    pub post_notification_time: i64,
    pub mode: NotificationMode,
}

impl NotificationConfiguration {
    /// Pre-event instant handed to the alarm adapter. Falls back to the
    /// start time once the reminder instant has passed.
    pub fn effective_talk_notification_time(&self, now_ms: i64) -> i64 {
        if self.talk_notification_time < now_ms {
            self.talk_start_time
        } else {
            self.talk_notification_time
        }
    }

    pub fn can_schedule_notification(&self, now_ms: i64) -> bool {
        self.mode == NotificationMode::Debug
            || self.talk_notification_time > now_ms
            || self.talk_start_time > now_ms
    }

    /// Zero is never a real epoch instant for a talk. Overflowed instants
    /// are stored as zero too.
    pub fn is_invalid(&self) -> bool {
        self.talk_notification_time == 0
            || self.post_notification_time == 0
            || self.talk_end_time == 0
            || self.talk_start_time == 0
    }

    /// The durable record for this configuration, not yet fired.
    pub fn to_record(&self, now_ms: i64) -> NotificationRecord {
        NotificationRecord {
            slot_id: self.slot_id.clone(),
            talk_title: self.talk_title.clone(),
            room_name: self.room_name.clone(),
            talk_start_time: self.talk_start_time,
            talk_end_time: self.talk_end_time,
            talk_notification_time: self.effective_talk_notification_time(now_ms),
            post_notification_time: self.post_notification_time,
            fired_for_talk: false,
        }
    }
}
