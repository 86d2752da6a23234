//! Integration tests for cold-start reconciliation.
//!
//! A first manager schedules against an on-disk database, then a second one
//! opens the same file as if the process had restarted after a reboot.

use std::path::Path;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use talkbell_core::{
    AlarmKey, CountingWakeLock, EventLog, ManualClock, NotificationDb, NotificationsManager,
    RecordStore, RecordingAlarmScheduler, ResetSummary, Slot, SlotState, TimingPolicy, TokioAlarmScheduler,
};
use tempfile::TempDir;

fn ms(h: u32, mi: u32) -> i64 {
    Utc.with_ymd_and_hms(2025, 1, 1, h, mi, 0)
        .unwrap()
        .timestamp_millis()
}

fn open(
    path: &Path,
    clock: Arc<ManualClock>,
) -> NotificationsManager<NotificationDb, RecordingAlarmScheduler> {
    NotificationsManager::new(
        NotificationDb::open_at(path).unwrap(),
        RecordingAlarmScheduler::new(),
        TimingPolicy::default(),
        clock,
    )
    .unwrap()
}

fn seed(path: &Path) {
    let clock = Arc::new(ManualClock::new(ms(8, 0)));
    let mut manager = open(path, clock);
    manager
        .schedule(&Slot::talk("OLD", "Morning", "Room 1", ms(10, 0), ms(11, 0)), false)
        .unwrap();
    manager
        .schedule(&Slot::talk("NEW", "Evening", "Room 2", ms(16, 0), ms(17, 0)), false)
        .unwrap();
}

#[test]
fn test_reset_drops_elapsed_and_rearms_future() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notifications.db");
    seed(&path);

    let clock = Arc::new(ManualClock::new(ms(12, 0)));
    let mut manager = open(&path, clock);
    assert!(manager.is_notification_available("OLD"));
    assert_eq!(manager.alarms().pending_count(), 0);

    let before = manager.store().find_by_slot_id("NEW").unwrap().unwrap();
    let summary = manager.reset_all().unwrap();

    assert_eq!(
        summary,
        ResetSummary {
            rearmed: 1,
            dropped: 1
        }
    );
    assert_eq!(manager.state("OLD"), SlotState::None);
    assert!(manager.store().find_by_slot_id("OLD").unwrap().is_none());

    let after = manager.store().find_by_slot_id("NEW").unwrap().unwrap();
    assert_eq!(after, before);
    assert_eq!(
        manager.alarms().pending(&AlarmKey::talk("NEW")),
        Some(ms(15, 0))
    );
    assert_eq!(
        manager.alarms().pending(&AlarmKey::post("NEW")),
        Some(ms(17, 15))
    );
    assert_eq!(manager.alarms().pending_count(), 2);
}

#[test]
fn test_reset_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notifications.db");
    seed(&path);

    let clock = Arc::new(ManualClock::new(ms(12, 0)));
    let mut manager = open(&path, clock);
    manager.reset_all().unwrap();
    let records = manager.records().unwrap();

    let second = manager.reset_all().unwrap();
    assert_eq!(
        second,
        ResetSummary {
            rearmed: 1,
            dropped: 0
        }
    );
    assert_eq!(manager.records().unwrap(), records);
    assert_eq!(manager.alarms().pending_count(), 2);
}

#[test]
fn test_reset_is_quiet() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notifications.db");
    seed(&path);

    let log = Arc::new(EventLog::new());
    let clock = Arc::new(ManualClock::new(ms(12, 0)));
    let mut manager = open(&path, clock).with_sink(log.clone());
    manager.reset_all().unwrap();

    assert!(log.toasts().is_empty());
}

#[test]
fn test_reset_holds_wake_lock_and_releases_on_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notifications.db");
    seed(&path);

    let lock = CountingWakeLock::default();
    let clock = Arc::new(ManualClock::new(ms(9, 0)));
    let mut manager = open(&path, clock).with_wake_lock(Arc::new(lock.clone()), "test-reset");

    manager.reset_all().unwrap();
    assert_eq!(lock.acquired(), 1);
    assert_eq!(lock.held(), 0);

    manager.alarms().reject_arms(true);
    assert!(manager.reset_all().is_err());
    assert_eq!(lock.acquired(), 2);
    assert_eq!(lock.held(), 0);
}

#[test]
fn test_reset_reschedules_fired_talk_that_has_not_started() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notifications.db");
    seed(&path);

    let clock = Arc::new(ManualClock::new(ms(9, 0)));
    {
        let mut manager = open(&path, clock.clone());
        manager.fire_pre_event_alarm("OLD").unwrap();
        assert_eq!(manager.state("OLD"), SlotState::FiredForTalk);
    }

    // Restart before the talk starts: the full schedule path runs again.
    clock.set(ms(9, 10));
    let mut manager = open(&path, clock);
    manager.reset_all().unwrap();

    assert_eq!(manager.state("OLD"), SlotState::Scheduled);
    let record = manager.store().find_by_slot_id("OLD").unwrap().unwrap();
    assert!(!record.fired_for_talk);
    assert_eq!(record.talk_notification_time, ms(10, 0));
    assert_eq!(
        manager.alarms().pending(&AlarmKey::talk("OLD")),
        Some(ms(10, 0))
    );
    assert_eq!(
        manager.alarms().pending(&AlarmKey::post("OLD")),
        Some(ms(11, 15))
    );
}

#[test]
fn test_cold_start_restores_fired_state() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notifications.db");
    seed(&path);
    {
        let clock = Arc::new(ManualClock::new(ms(15, 0)));
        let mut manager = open(&path, clock);
        manager.fire_pre_event_alarm("NEW").unwrap();
    }

    let clock = Arc::new(ManualClock::new(ms(15, 5)));
    let manager = open(&path, clock);
    assert_eq!(manager.state("NEW"), SlotState::FiredForTalk);
    assert_eq!(manager.state("OLD"), SlotState::Scheduled);
}

#[tokio::test(start_paused = true)]
async fn test_rearmed_alarms_are_delivered_and_dispatched() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notifications.db");
    seed(&path);

    let clock = Arc::new(ManualClock::new(ms(12, 0)));
    let (alarms, mut rx) = TokioAlarmScheduler::new(clock.clone());
    let log = Arc::new(EventLog::new());
    let mut manager = NotificationsManager::new(
        NotificationDb::open_at(&path).unwrap(),
        alarms,
        TimingPolicy::default(),
        clock.clone(),
    )
    .unwrap()
    .with_sink(log.clone());

    manager.reset_all().unwrap();
    assert_eq!(manager.alarms().pending_count(), 2);

    let first = rx.recv().await.unwrap();
    assert_eq!(first, AlarmKey::talk("NEW"));
    clock.set(ms(15, 0));
    assert!(manager.dispatch(&first).unwrap());

    let second = rx.recv().await.unwrap();
    assert_eq!(second, AlarmKey::post("NEW"));
    clock.set(ms(17, 15));
    assert!(manager.dispatch(&second).unwrap());

    assert!(manager.records().unwrap().is_empty());
}
