use clap::Subcommand;
use serde::Serialize;
use talkbell_core::manager::DEFAULT_POST_TITLE;
use talkbell_core::{DetachedAlarmScheduler, SlotState};

use super::{CliResult, Session};

#[derive(Subcommand)]
pub enum FireAction {
    /// Deliver the pre-talk reminder
    Talk { slot_id: String },
    /// Deliver the post-talk reminder
    Post {
        slot_id: String,
        #[arg(long, default_value = DEFAULT_POST_TITLE)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
}

#[derive(Serialize)]
struct FireReport {
    slot_id: String,
    presented: bool,
    state: SlotState,
}

pub fn run(action: FireAction) -> CliResult {
    let mut session = Session::open(DetachedAlarmScheduler)?;
    let (slot_id, presented) = match action {
        FireAction::Talk { slot_id } => {
            let presented = session.manager.fire_pre_event_alarm(&slot_id)?;
            (slot_id, presented)
        }
        FireAction::Post {
            slot_id,
            title,
            description,
        } => {
            let presented = session.manager.fire_post_event_alarm(&slot_id, &title, &description)?;
            (slot_id, presented)
        }
    };
    let state = session.manager.state(&slot_id);
    session.finish(&FireReport {
        slot_id,
        presented,
        state,
    })
}
