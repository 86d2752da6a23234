pub mod config;
pub mod fire;
pub mod run;
pub mod slots;

use std::sync::Arc;

use serde::Serialize;
use talkbell_core::notify::{Feedback, OpenAction, Presenter, RefreshListener};
use talkbell_core::wake::NoopWakeLock;
use talkbell_core::{
    AlarmScheduler, Clock, Config, Event, EventLog, NotificationDb, NotificationsManager,
    SystemClock,
};

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Build a manager over the default database with the user's configuration.
pub fn open_manager<A, T>(
    alarms: A,
    clock: Arc<dyn Clock>,
    sink: Arc<T>,
) -> CliResult<NotificationsManager<NotificationDb, A>>
where
    A: AlarmScheduler,
    T: Presenter + Feedback + RefreshListener + 'static,
{
    let config = Config::load_or_default();
    let db = NotificationDb::open()?;
    let manager = NotificationsManager::new(db, alarms, config.timing_policy(), clock)?
        .with_sink(sink)
        .with_wake_lock(Arc::new(NoopWakeLock), config.alarms.wake_lock_tag.clone())
        .with_toasts(config.notifications.toasts);
    Ok(manager)
}

pub fn system_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct CommandOutput<'a, T> {
    result: &'a T,
    events: Vec<Event>,
}

/// A one-shot command: the manager plus the signals it raised.
pub struct Session<A: AlarmScheduler> {
    pub manager: NotificationsManager<NotificationDb, A>,
    events: Arc<EventLog>,
}

impl<A: AlarmScheduler> Session<A> {
    pub fn open(alarms: A) -> CliResult<Self> {
        let events = Arc::new(EventLog::new());
        let manager = open_manager(alarms, system_clock(), events.clone())?;
        Ok(Self { manager, events })
    }

    /// Print `result` and the collected events as one JSON document.
    pub fn finish<T: Serialize>(self, result: &T) -> CliResult {
        print_json(&CommandOutput {
            result,
            events: self.events.drain(),
        })
    }
}

/// Streams every engine signal as one JSON line on stdout.
pub struct StdoutSink;

impl StdoutSink {
    fn emit(&self, event: Event) {
        match serde_json::to_string(&event) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!(error = %e, "failed to encode event"),
        }
    }
}

impl Presenter for StdoutSink {
    fn present_talk_notification(&self, room_name: &str, title: &str, when_ms: i64, open: &OpenAction) {
        self.emit(Event::TalkReminder {
            slot_id: open.slot_id.clone(),
            room_name: room_name.to_string(),
            talk_title: title.to_string(),
            when_ms,
            at: chrono::Utc::now(),
        });
    }

    fn present_post_notification(&self, title: &str, description: &str, open: &OpenAction) {
        self.emit(Event::PostTalkReminder {
            slot_id: open.slot_id.clone(),
            title: title.to_string(),
            description: description.to_string(),
            at: chrono::Utc::now(),
        });
    }
}

impl Feedback for StdoutSink {
    fn show_brief(&self, message: &str) {
        self.emit(Event::Toast {
            message: message.to_string(),
            at: chrono::Utc::now(),
        });
    }
}

impl RefreshListener for StdoutSink {
    fn schedule_changed(&self) {
        self.emit(Event::ScheduleChanged {
            at: chrono::Utc::now(),
        });
    }
}
