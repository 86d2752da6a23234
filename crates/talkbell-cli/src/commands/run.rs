use std::sync::Arc;

use talkbell_core::{DetachedAlarmScheduler, TokioAlarmScheduler};

use super::{open_manager, system_clock, CliResult, Session, StdoutSink};

/// Cold-start reconciliation without holding any timers.
pub fn reset() -> CliResult {
    let mut session = Session::open(DetachedAlarmScheduler)?;
    let summary = session.manager.reset_all()?;
    session.finish(&summary)
}

/// Re-arm everything, then deliver alarms until nothing is left or Ctrl-C.
///
/// Output is one JSON object per line: the reset summary, then each event.
pub fn run() -> CliResult {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let clock = system_clock();
        let (alarms, mut rx) = TokioAlarmScheduler::new(clock.clone());
        let mut manager = open_manager(alarms, clock, Arc::new(StdoutSink))?;

        let summary = manager.reset_all()?;
        println!("{}", serde_json::to_string(&summary)?);

        while !manager.records()?.is_empty() {
            tokio::select! {
                delivered = rx.recv() => {
                    let Some(key) = delivered else { break };
                    if let Err(e) = manager.dispatch(&key) {
                        tracing::error!(%key, error = %e, "alarm dispatch failed");
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("interrupted, pending alarms stay persisted");
                    break;
                }
            }
        }
        tracing::info!("run loop finished");
        Ok(())
    })
}
