//! Talk notification orchestrator.
//!
//! Owns the durable record store, the alarm adapter and the volatile index,
//! and keeps all three consistent. Per slot:
//!
//! ```text
//!            schedule            pre-event alarm            post-event alarm
//!   None ─────────────► Scheduled ─────────────► FiredForTalk ─────────────► None
//!    ▲                      │                         │
//!    └──── cancel(full) ────┴────── cancel(full) ─────┘
//! ```
//!
//! Every mutating operation takes `&mut self`: one writer per process.
//! Alarm deliveries come back through [`NotificationsManager::dispatch`].

mod index;

pub use index::VolatileIndex;

use std::sync::Arc;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::alarm::{AlarmKey, AlarmKind, AlarmScheduler};
use crate::clock::Clock;
use crate::error::Result;
use crate::notify::{Feedback, OpenAction, Presenter, RefreshListener, Silent};
use crate::slot::Slot;
use crate::storage::{NotificationRecord, RecordStore};
use crate::timing::{format_fire_time, NotificationConfiguration, TimingPolicy};
use crate::wake::{NoopWakeLock, WakeLock};

pub const NOTIFICATION_NOT_SET: &str = "Notification not set, the talk has already started";
pub const NOTIFICATION_SET_AT: &str = "Notification set at";
pub const DEFAULT_POST_TITLE: &str = "How was the talk?";
const DEFAULT_WAKE_LOCK_TAG: &str = "talkbell-reset";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    None,
    Scheduled,
    FiredForTalk,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScheduleOutcome {
    Scheduled {
        slot_id: String,
        /// Effective pre-event instant handed to the alarm adapter.
        talk_notification_time: i64,
        post_notification_time: i64,
    },
    /// Zero timestamps; silently ignored.
    Invalid,
    /// Reminder and start both in the past.
    TooLate,
}

impl ScheduleOutcome {
    pub fn is_scheduled(&self) -> bool {
        matches!(self, ScheduleOutcome::Scheduled { .. })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetSummary {
    pub rearmed: usize,
    pub dropped: usize,
}

pub struct NotificationsManager<S, A> {
    store: S,
    alarms: A,
    policy: TimingPolicy,
    index: VolatileIndex,
    clock: Arc<dyn Clock>,
    presenter: Arc<dyn Presenter>,
    feedback: Arc<dyn Feedback>,
    refresh: Arc<dyn RefreshListener>,
    wake_lock: Arc<dyn WakeLock>,
    wake_lock_tag: String,
    toasts_enabled: bool,
}

impl<S: RecordStore, A: AlarmScheduler> NotificationsManager<S, A> {
    /// Create the manager and warm the volatile index from the store.
    ///
    /// # Errors
    /// Returns an error if the initial store scan fails.
    pub fn new(store: S, alarms: A, policy: TimingPolicy, clock: Arc<dyn Clock>) -> Result<Self> {
        let records = store.find_all()?;
        let index = VolatileIndex::warm_up(&records);
        info!(tracked = index.len(), "notification index warmed up");

        Ok(Self {
            store,
            alarms,
            policy,
            index,
            clock,
            presenter: Arc::new(Silent),
            feedback: Arc::new(Silent),
            refresh: Arc::new(Silent),
            wake_lock: Arc::new(NoopWakeLock),
            wake_lock_tag: DEFAULT_WAKE_LOCK_TAG.to_string(),
            toasts_enabled: true,
        })
    }

    pub fn with_presenter(mut self, presenter: Arc<dyn Presenter>) -> Self {
        self.presenter = presenter;
        self
    }

    pub fn with_feedback(mut self, feedback: Arc<dyn Feedback>) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn with_refresh_listener(mut self, refresh: Arc<dyn RefreshListener>) -> Self {
        self.refresh = refresh;
        self
    }

    /// Route all three outward signals to one sink.
    pub fn with_sink<T>(self, sink: Arc<T>) -> Self
    where
        T: Presenter + Feedback + RefreshListener + 'static,
    {
        self.with_presenter(sink.clone())
            .with_feedback(sink.clone())
            .with_refresh_listener(sink)
    }

    pub fn with_wake_lock(mut self, wake_lock: Arc<dyn WakeLock>, tag: impl Into<String>) -> Self {
        self.wake_lock = wake_lock;
        self.wake_lock_tag = tag.into();
        self
    }

    /// Globally allow or suppress "notification set" confirmations.
    pub fn with_toasts(mut self, enabled: bool) -> Self {
        self.toasts_enabled = enabled;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn alarms(&self) -> &A {
        &self.alarms
    }

    pub fn policy(&self) -> &TimingPolicy {
        &self.policy
    }

    pub fn index(&self) -> &VolatileIndex {
        &self.index
    }

    /// Tracked and the pre-event reminder is still pending.
    pub fn is_notification_scheduled(&self, slot_id: &str) -> bool {
        self.index.is_scheduled(slot_id)
    }

    /// Tracked in any state.
    pub fn is_notification_available(&self, slot_id: &str) -> bool {
        self.index.is_available(slot_id)
    }

    pub fn state(&self, slot_id: &str) -> SlotState {
        match self.index.fired_for_talk(slot_id) {
            None => SlotState::None,
            Some(false) => SlotState::Scheduled,
            Some(true) => SlotState::FiredForTalk,
        }
    }

    /// All persisted records, ordered by talk start.
    pub fn records(&self) -> Result<Vec<NotificationRecord>> {
        Ok(self.store.find_all()?)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Schedule both reminders for a slot.
    ///
    /// # Errors
    /// Returns an error if persisting the record or arming an alarm fails.
    pub fn schedule(&mut self, slot: &Slot, with_toast: bool) -> Result<ScheduleOutcome> {
        let now = self.clock.now_ms();
        let cfg = self
            .policy
            .for_slot(slot, with_toast && self.toasts_enabled, now);
        self.schedule_configuration(&cfg, true)
    }

    fn schedule_configuration(
        &mut self,
        cfg: &NotificationConfiguration,
        announce: bool,
    ) -> Result<ScheduleOutcome> {
        if cfg.is_invalid() {
            debug!(slot_id = %cfg.slot_id, "ignoring slot with missing timestamps");
            return Ok(ScheduleOutcome::Invalid);
        }

        let now = self.clock.now_ms();
        if !cfg.can_schedule_notification(now) {
            info!(slot_id = %cfg.slot_id, "talk already started, notification not set");
            if announce {
                self.feedback.show_brief(NOTIFICATION_NOT_SET);
            }
            return Ok(ScheduleOutcome::TooLate);
        }

        let record = cfg.to_record(now);
        self.store.upsert(&record)?;
        self.index.insert_scheduled(&record.slot_id);

        self.alarms.arm_exact(
            &AlarmKey::talk(&record.slot_id),
            record.talk_notification_time,
        )?;
        self.alarms.arm_exact(
            &AlarmKey::post(&record.slot_id),
            record.post_notification_time,
        )?;

        info!(
            slot_id = %record.slot_id,
            talk_at = record.talk_notification_time,
            post_at = record.post_notification_time,
            "notification scheduled"
        );

        if cfg.with_toast && announce {
            let when = format_fire_time(record.talk_notification_time, now, &Local);
            self.feedback
                .show_brief(&format!("{NOTIFICATION_SET_AT} {when}"));
        }

        Ok(ScheduleOutcome::Scheduled {
            slot_id: record.slot_id,
            talk_notification_time: record.talk_notification_time,
            post_notification_time: record.post_notification_time,
        })
    }

    /// Cancel a slot's reminders.
    ///
    /// `fully_finish` drops both alarms and the record. Otherwise only the
    /// pre-event alarm is cancelled and the slot moves to fired-for-talk.
    /// Returns whether a record existed.
    ///
    /// # Errors
    /// Returns an error if the store or alarm adapter fails.
    pub fn cancel(&mut self, slot_id: &str, fully_finish: bool) -> Result<bool> {
        if self.store.find_by_slot_id(slot_id)?.is_none() {
            debug!(slot_id, "notification already cancelled");
            return Ok(false);
        }

        if fully_finish {
            self.alarms.cancel(&AlarmKey::post(slot_id))?;
            self.alarms.cancel(&AlarmKey::talk(slot_id))?;
            self.store.delete(slot_id)?;
            self.index.remove(slot_id);
            info!(slot_id, "notification removed");
        } else {
            self.alarms.cancel(&AlarmKey::talk(slot_id))?;
            self.store.mark_fired_for_talk(slot_id)?;
            self.index.mark_fired_for_talk(slot_id);
            info!(slot_id, "notification marked as fired for talk");
        }
        Ok(true)
    }

    /// Fully cancel a slot.
    pub fn remove_notification(&mut self, slot_id: &str) -> Result<bool> {
        self.cancel(slot_id, true)
    }

    /// Schedule the slot if it is not tracked, remove it otherwise.
    pub fn toggle(&mut self, slot: &Slot) -> Result<SlotState> {
        if self.is_notification_available(&slot.slot_id) {
            self.remove_notification(&slot.slot_id)?;
        } else {
            self.schedule(slot, true)?;
        }
        self.refresh.schedule_changed();
        Ok(self.state(&slot.slot_id))
    }

    /// Pre-event alarm delivered. Returns whether a reminder was presented.
    ///
    /// # Errors
    /// Returns an error if the store or alarm adapter fails.
    pub fn fire_pre_event_alarm(&mut self, slot_id: &str) -> Result<bool> {
        let Some(record) = self.store.find_by_slot_id(slot_id)? else {
            debug!(slot_id, "pre-event alarm for untracked slot");
            return Ok(false);
        };
        if record.fired_for_talk {
            debug!(slot_id, "pre-event alarm already delivered");
            return Ok(false);
        }

        let presented = self.policy.is_before_event(&record, self.clock.now_ms());
        if presented {
            self.presenter.present_talk_notification(
                &record.room_name,
                &record.talk_title,
                record.talk_start_time,
                &OpenAction {
                    slot_id: record.slot_id.clone(),
                },
            );
            self.refresh.schedule_changed();
        } else {
            warn!(slot_id, "pre-event alarm arrived after the talk ended, not presented");
        }

        self.cancel(slot_id, false)?;
        Ok(presented)
    }

    /// Post-event alarm delivered. Returns whether a reminder was presented.
    ///
    /// # Errors
    /// Returns an error if the store or alarm adapter fails.
    pub fn fire_post_event_alarm(
        &mut self,
        slot_id: &str,
        title: &str,
        description: &str,
    ) -> Result<bool> {
        if self.store.find_by_slot_id(slot_id)?.is_none() {
            debug!(slot_id, "post-event alarm for untracked slot");
            return Ok(false);
        }

        self.presenter.present_post_notification(
            title,
            description,
            &OpenAction {
                slot_id: slot_id.to_string(),
            },
        );
        self.cancel(slot_id, true)?;
        self.refresh.schedule_changed();
        Ok(true)
    }

    /// Route a delivered alarm key to its handler.
    pub fn dispatch(&mut self, key: &AlarmKey) -> Result<bool> {
        debug!(%key, "alarm delivered");
        match key.kind {
            AlarmKind::Talk => self.fire_pre_event_alarm(&key.slot_id),
            AlarmKind::Post => {
                let Some(record) = self.store.find_by_slot_id(&key.slot_id)? else {
                    return Ok(false);
                };
                let description = post_event_description(&record);
                self.fire_post_event_alarm(&key.slot_id, DEFAULT_POST_TITLE, &description)
            }
        }
    }

    /// Cold-start reconciliation: re-run scheduling for every persisted record.
    ///
    /// Timers do not survive a reboot, so each record has its stale alarm
    /// registrations cancelled and goes through the full schedule path with its
    /// stored instants. Records that can no longer be scheduled are deleted.
    /// A fired-for-talk record whose talk has not started yet comes back as
    /// scheduled, with its pre-event alarm at the talk start.
    ///
    /// # Errors
    /// Returns an error on the first store or alarm failure. The wake lock is
    /// released either way.
    pub fn reset_all(&mut self) -> Result<ResetSummary> {
        let _wake = self.wake_lock.acquire(&self.wake_lock_tag);
        info!("resetting alarms");

        let mut summary = ResetSummary::default();
        for record in self.store.find_all()? {
            self.alarms.cancel(&AlarmKey::post(&record.slot_id))?;
            self.alarms.cancel(&AlarmKey::talk(&record.slot_id))?;

            let cfg = self.policy.for_record(&record, false);
            match self.schedule_configuration(&cfg, false)? {
                ScheduleOutcome::Scheduled { .. } => summary.rearmed += 1,
                ScheduleOutcome::Invalid | ScheduleOutcome::TooLate => {
                    self.store.delete(&record.slot_id)?;
                    self.index.remove(&record.slot_id);
                    summary.dropped += 1;
                    debug!(slot_id = %record.slot_id, "dropped elapsed notification");
                }
            }
        }

        info!(
            rearmed = summary.rearmed,
            dropped = summary.dropped,
            "alarms reset"
        );
        Ok(summary)
    }
}

fn post_event_description(record: &NotificationRecord) -> String {
    if record.talk_title.is_empty() {
        "Tell us what you thought".to_string()
    } else {
        format!("Rate \"{}\"", record.talk_title)
    }
}
