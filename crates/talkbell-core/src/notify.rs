//! Outward collaborators of the engine.
//!
//! The engine never renders anything. It calls a [`Presenter`] for the two
//! reminders, a [`Feedback`] sink for brief confirmations and a
//! [`RefreshListener`] when schedule views should redraw.

use std::sync::Mutex;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::events::Event;

/// Deep link back into the schedule, attached to every presented reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAction {
    pub slot_id: String,
}

pub trait Presenter: Send + Sync {
    fn present_talk_notification(&self, room_name: &str, title: &str, when_ms: i64, open: &OpenAction);

    fn present_post_notification(&self, title: &str, description: &str, open: &OpenAction);
}

pub trait Feedback: Send + Sync {
    fn show_brief(&self, message: &str);
}

pub trait RefreshListener: Send + Sync {
    fn schedule_changed(&self);
}

/// Drops every signal. Default for all three collaborators.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Presenter for Silent {
    fn present_talk_notification(&self, _room: &str, _title: &str, _when_ms: i64, _open: &OpenAction) {}

    fn present_post_notification(&self, _title: &str, _description: &str, _open: &OpenAction) {}
}

impl Feedback for Silent {
    fn show_brief(&self, _message: &str) {}
}

impl RefreshListener for Silent {
    fn schedule_changed(&self) {}
}

/// Collects every signal as an [`Event`].
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<Event>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: Event) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Take everything collected so far.
    pub fn drain(&self) -> Vec<Event> {
        std::mem::take(
            &mut *self
                .events
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }

    /// Messages of the collected toasts, oldest first.
    pub fn toasts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Toast { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }
}

impl Presenter for EventLog {
    fn present_talk_notification(&self, room_name: &str, title: &str, when_ms: i64, open: &OpenAction) {
        self.push(Event::TalkReminder {
            slot_id: open.slot_id.clone(),
            room_name: room_name.to_string(),
            talk_title: title.to_string(),
            when_ms,
            at: Utc::now(),
        });
    }

    fn present_post_notification(&self, title: &str, description: &str, open: &OpenAction) {
        self.push(Event::PostTalkReminder {
            slot_id: open.slot_id.clone(),
            title: title.to_string(),
            description: description.to_string(),
            at: Utc::now(),
        });
    }
}

impl Feedback for EventLog {
    fn show_brief(&self, message: &str) {
        self.push(Event::Toast {
            message: message.to_string(),
            at: Utc::now(),
        });
    }
}

impl RefreshListener for EventLog {
    fn schedule_changed(&self) {
        self.push(Event::ScheduleChanged { at: Utc::now() });
    }
}
