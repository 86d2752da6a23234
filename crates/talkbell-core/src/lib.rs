//! # Talkbell Core Library
//!
//! Scheduling engine for conference talk reminders. For every talk the user
//! picks, two reminders are kept: one shortly before the talk starts and one
//! after it ends. Intent is persisted so that timers lost on reboot can be
//! re-armed.
//!
//! ## Architecture
//!
//! - **Timing**: pure computation of reminder instants and eligibility
//! - **Storage**: SQLite record store and TOML configuration
//! - **Alarm**: exact-time alarm adapters keyed by slot and kind
//! - **Manager**: the orchestrator keeping store, alarms and index consistent
//!
//! ## Key Components
//!
//! - [`NotificationsManager`]: schedule, cancel, fire and reset
//! - [`NotificationDb`]: durable notification records
//! - [`TimingPolicy`]: offsets, eligibility and the stale-fire guard
//! - [`AlarmScheduler`]: trait for alarm backends

pub mod alarm;
pub mod clock;
pub mod error;
pub mod events;
pub mod manager;
pub mod notify;
pub mod slot;
pub mod storage;
pub mod timing;
pub mod wake;

pub use alarm::{
    AlarmKey, AlarmKind, AlarmScheduler, DetachedAlarmScheduler, RecordingAlarmScheduler,
    TokioAlarmScheduler,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AlarmError, ConfigError, CoreError, DatabaseError};
pub use events::Event;
pub use manager::{NotificationsManager, ResetSummary, ScheduleOutcome, SlotState, VolatileIndex};
pub use notify::{EventLog, Feedback, OpenAction, Presenter, RefreshListener, Silent};
pub use slot::Slot;
pub use storage::{Config, NotificationDb, NotificationRecord, RecordStore};
pub use timing::{NotificationConfiguration, NotificationMode, TimingPolicy};
pub use wake::{CountingWakeLock, NoopWakeLock, WakeGuard, WakeLock};
