//! SQLite-backed [`RecordStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::{data_dir, migrations, NotificationRecord, RecordStore};
use crate::error::DatabaseError;

const SELECT_COLUMNS: &str = "slot_id, talk_title, room_name, talk_start_time, talk_end_time,
     talk_notification_time, post_notification_time, fired_for_talk";

fn row_to_record(row: &rusqlite::Row) -> Result<NotificationRecord, rusqlite::Error> {
    Ok(NotificationRecord {
        slot_id: row.get(0)?,
        talk_title: row.get(1)?,
        room_name: row.get(2)?,
        talk_start_time: row.get(3)?,
        talk_end_time: row.get(4)?,
        talk_notification_time: row.get(5)?,
        post_notification_time: row.get(6)?,
        fired_for_talk: row.get(7)?,
    })
}

/// SQLite database for notification records.
pub struct NotificationDb {
    conn: Connection,
}

impl NotificationDb {
    /// Open the database at `~/.config/talkbell/talkbell.db`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, DatabaseError> {
        let dir = data_dir().map_err(|e| DatabaseError::Unavailable(e.to_string()))?;
        Self::open_at(dir.join("talkbell.db"))
    }

    /// Open (or create) a database file at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, DatabaseError> {
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn count(&self) -> Result<usize, DatabaseError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM notifications", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

impl RecordStore for NotificationDb {
    fn upsert(&self, record: &NotificationRecord) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO notifications (
                slot_id, talk_title, room_name, talk_start_time, talk_end_time,
                talk_notification_time, post_notification_time, fired_for_talk, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(slot_id) DO UPDATE SET
                talk_title = excluded.talk_title,
                room_name = excluded.room_name,
                talk_start_time = excluded.talk_start_time,
                talk_end_time = excluded.talk_end_time,
                talk_notification_time = excluded.talk_notification_time,
                post_notification_time = excluded.post_notification_time,
                fired_for_talk = excluded.fired_for_talk,
                updated_at = excluded.updated_at",
            params![
                record.slot_id,
                record.talk_title,
                record.room_name,
                record.talk_start_time,
                record.talk_end_time,
                record.talk_notification_time,
                record.post_notification_time,
                record.fired_for_talk,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn find_by_slot_id(&self, slot_id: &str) -> Result<Option<NotificationRecord>, DatabaseError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM notifications WHERE slot_id = ?1");
        let record = self
            .conn
            .query_row(&sql, params![slot_id], row_to_record)
            .optional()?;
        Ok(record)
    }

    fn delete(&self, slot_id: &str) -> Result<bool, DatabaseError> {
        let n = self
            .conn
            .execute("DELETE FROM notifications WHERE slot_id = ?1", params![slot_id])?;
        Ok(n > 0)
    }

    fn find_all(&self) -> Result<Vec<NotificationRecord>, DatabaseError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM notifications ORDER BY talk_start_time, slot_id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_record)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    fn mark_fired_for_talk(&self, slot_id: &str) -> Result<bool, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let exists = tx
            .query_row(
                "SELECT 1 FROM notifications WHERE slot_id = ?1",
                params![slot_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if exists {
            tx.execute(
                "UPDATE notifications SET fired_for_talk = 1, updated_at = ?2 WHERE slot_id = ?1",
                params![slot_id, Utc::now().to_rfc3339()],
            )?;
        }
        tx.commit()?;
        Ok(exists)
    }
}
