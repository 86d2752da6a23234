//! Schedule slots as delivered by the conference API.
//!
//! A slot is either a talk or a break. The engine only reads it; field names
//! follow the upstream JSON so a downloaded schedule deserializes directly.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalkInfo {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakInfo {
    #[serde(rename = "nameEN", default)]
    pub name: String,
}

/// A time-boxed schedule entry.
///
/// `talk` and `slot_break` are mutually exclusive upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub slot_id: String,
    #[serde(default)]
    pub room_name: String,
    /// Start, epoch milliseconds.
    pub from_time_millis: i64,
    /// End, epoch milliseconds.
    pub to_time_millis: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub talk: Option<TalkInfo>,
    #[serde(rename = "break", default, skip_serializing_if = "Option::is_none")]
    pub slot_break: Option<BreakInfo>,
}

impl Slot {
    /// Build a talk slot.
    pub fn talk(
        slot_id: impl Into<String>,
        title: impl Into<String>,
        room_name: impl Into<String>,
        from_time_millis: i64,
        to_time_millis: i64,
    ) -> Self {
        Self {
            slot_id: slot_id.into(),
            room_name: room_name.into(),
            from_time_millis,
            to_time_millis,
            talk: Some(TalkInfo {
                title: title.into(),
            }),
            slot_break: None,
        }
    }

    pub fn is_talk(&self) -> bool {
        self.talk.is_some() && self.slot_break.is_none()
    }

    pub fn is_break(&self) -> bool {
        self.slot_break.is_some() && self.talk.is_none()
    }

    /// Display title: the talk title, or the break name.
    pub fn title(&self) -> &str {
        match (&self.talk, &self.slot_break) {
            (Some(talk), _) => &talk.title,
            (None, Some(brk)) => &brk.name,
            (None, None) => "",
        }
    }
}
