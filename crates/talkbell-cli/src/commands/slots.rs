use std::path::Path;

use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use talkbell_core::{DetachedAlarmScheduler, ScheduleOutcome, Slot, SlotState};

use super::{CliResult, Session};

#[derive(Args)]
pub struct SlotArgs {
    #[arg(long)]
    pub slot_id: String,
    /// Talk title
    #[arg(long)]
    pub title: String,
    #[arg(long, default_value = "")]
    pub room: String,
    /// Talk start (RFC 3339)
    #[arg(long)]
    pub start: DateTime<Utc>,
    /// Talk end (RFC 3339)
    #[arg(long)]
    pub end: DateTime<Utc>,
    /// Do not confirm with a toast
    #[arg(long)]
    pub no_toast: bool,
}

impl SlotArgs {
    fn to_slot(&self) -> Slot {
        Slot::talk(
            self.slot_id.clone(),
            self.title.clone(),
            self.room.clone(),
            self.start.timestamp_millis(),
            self.end.timestamp_millis(),
        )
    }
}

#[derive(Serialize)]
struct SlotStatus<'a> {
    slot_id: &'a str,
    state: SlotState,
}

#[derive(Serialize)]
struct ImportReport {
    scheduled: usize,
    too_late: usize,
    invalid: usize,
    skipped_breaks: usize,
}

pub fn schedule(args: SlotArgs) -> CliResult {
    let mut session = Session::open(DetachedAlarmScheduler)?;
    let outcome = session.manager.schedule(&args.to_slot(), !args.no_toast)?;
    session.finish(&outcome)
}

pub fn import(path: &Path) -> CliResult {
    let content = std::fs::read_to_string(path)?;
    let slots: Vec<Slot> = serde_json::from_str(&content)?;
    let mut session = Session::open(DetachedAlarmScheduler)?;

    let mut report = ImportReport {
        scheduled: 0,
        too_late: 0,
        invalid: 0,
        skipped_breaks: 0,
    };
    for slot in &slots {
        if !slot.is_talk() {
            report.skipped_breaks += 1;
            continue;
        }
        match session.manager.schedule(slot, false)? {
            ScheduleOutcome::Scheduled { .. } => report.scheduled += 1,
            ScheduleOutcome::TooLate => report.too_late += 1,
            ScheduleOutcome::Invalid => report.invalid += 1,
        }
    }
    tracing::info!(path = %path.display(), scheduled = report.scheduled, "schedule imported");
    session.finish(&report)
}

pub fn cancel(slot_id: &str, partial: bool) -> CliResult {
    let mut session = Session::open(DetachedAlarmScheduler)?;
    session.manager.cancel(slot_id, !partial)?;
    let state = session.manager.state(slot_id);
    session.finish(&SlotStatus { slot_id, state })
}

pub fn toggle(args: SlotArgs) -> CliResult {
    let mut session = Session::open(DetachedAlarmScheduler)?;
    let state = session.manager.toggle(&args.to_slot())?;
    session.finish(&SlotStatus {
        slot_id: &args.slot_id,
        state,
    })
}

pub fn status(slot_id: &str) -> CliResult {
    let session = Session::open(DetachedAlarmScheduler)?;
    let state = session.manager.state(slot_id);
    session.finish(&SlotStatus { slot_id, state })
}

pub fn list() -> CliResult {
    let session = Session::open(DetachedAlarmScheduler)?;
    let records = session.manager.records()?;
    session.finish(&records)
}
