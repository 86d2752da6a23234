use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every outward signal of the engine as a value.
/// The CLI prints them; tests assert on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Pre-event reminder handed to the presenter.
    TalkReminder {
        slot_id: String,
        room_name: String,
        talk_title: String,
        /// Talk start, epoch milliseconds.
        when_ms: i64,
        at: DateTime<Utc>,
    },
    /// Post-event reminder (feedback / voting prompt).
    PostTalkReminder {
        slot_id: String,
        title: String,
        description: String,
        at: DateTime<Utc>,
    },
    /// Short user-facing confirmation or refusal.
    Toast {
        message: String,
        at: DateTime<Utc>,
    },
    /// Schedule views should re-render.
    ScheduleChanged {
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn slot_id(&self) -> Option<&str> {
        match self {
            Event::TalkReminder { slot_id, .. } | Event::PostTalkReminder { slot_id, .. } => {
                Some(slot_id)
            }
            Event::Toast { .. } | Event::ScheduleChanged { .. } => None,
        }
    }
}
