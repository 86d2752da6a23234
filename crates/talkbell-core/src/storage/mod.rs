mod config;
pub mod migrations;
pub mod notification_db;

pub use config::{AlarmsConfig, Config, NotificationsConfig};
pub use notification_db::NotificationDb;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::DatabaseError;

/// Durable scheduling intent for one slot.
///
/// Presence of a record means at least one of its alarms is still pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub slot_id: String,
    pub talk_title: String,
    pub room_name: String,
    pub talk_start_time: i64,
    pub talk_end_time: i64,
    /// When the pre-event alarm fires (epoch ms).
    pub talk_notification_time: i64,
    /// When the post-event alarm fires (epoch ms).
    pub post_notification_time: i64,
    pub fired_for_talk: bool,
}

/// Keyed persistence of [`NotificationRecord`]s, unique by `slot_id`.
pub trait RecordStore {
    /// Insert or replace the record for its `slot_id`.
    fn upsert(&self, record: &NotificationRecord) -> Result<(), DatabaseError>;

    fn find_by_slot_id(&self, slot_id: &str) -> Result<Option<NotificationRecord>, DatabaseError>;

    /// Returns whether a record was removed.
    fn delete(&self, slot_id: &str) -> Result<bool, DatabaseError>;

    fn find_all(&self) -> Result<Vec<NotificationRecord>, DatabaseError>;

    /// Flip `fired_for_talk` to true. Returns whether a record existed.
    fn mark_fired_for_talk(&self, slot_id: &str) -> Result<bool, DatabaseError> {
        match self.find_by_slot_id(slot_id)? {
            Some(mut record) => {
                record.fired_for_talk = true;
                self.upsert(&record)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Returns `~/.config/talkbell[-dev]/` based on TALKBELL_ENV.
///
/// Set TALKBELL_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("TALKBELL_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("talkbell-dev")
    } else {
        base_dir.join("talkbell")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
