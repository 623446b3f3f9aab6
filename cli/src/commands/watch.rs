use anyhow::{Context, Result};
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};

use super::Service;

const ROLLOVER_POLL: Duration = Duration::from_secs(60);

/// Keep a session open and move to the new local day when midnight passes.
/// Stops on Ctrl-C.
pub(crate) async fn cmd_watch(svc: &mut Service, json: bool) -> Result<()> {
    let mut interval = time::interval(ROLLOVER_POLL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let date = svc.active_date()?;
    if json {
        println!("{}", serde_json::json!({ "event": "start", "date": date }));
    } else {
        println!("Tracking {date}. Press Ctrl-C to stop.");
    }

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if svc.refresh()? {
                    let date = svc.active_date()?;
                    tracing::info!(%date, "new day started");
                    if json {
                        println!("{}", serde_json::json!({ "event": "rollover", "date": date }));
                    } else {
                        println!("New day: {date}. Today's record starts empty.");
                    }
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                break;
            }
        }
    }

    if json {
        println!("{}", serde_json::json!({ "event": "stop" }));
    } else {
        println!("Stopped.");
    }

    Ok(())
}
