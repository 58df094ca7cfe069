// src/quiz/timer.rs

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::{
    sync::watch,
    time::{MissedTickBehavior, interval},
};

use super::lifecycle::AttemptManager;

/// Whole seconds left until `deadline`, never negative.
pub fn remaining_seconds(deadline: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (deadline - now).num_seconds().max(0)
}

/// Spawns the ticker that watches one open attempt.
///
/// Every `tick` it publishes the remaining seconds; once the deadline has passed it
/// submits the attempt through the same path as a manual submit. The task exits as
/// soon as the attempt is no longer the user's open one, which closes the channel.
pub fn spawn_deadline_ticker(
    manager: AttemptManager,
    user_id: i64,
    attempt_id: i64,
    deadline: DateTime<Utc>,
    tick: Duration,
) -> watch::Receiver<i64> {
    let (tx, rx) = watch::channel(remaining_seconds(deadline, Utc::now()));

    tokio::spawn(async move {
        let mut ticker = interval(tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            if !manager.is_current(user_id, attempt_id).await {
                tracing::debug!("Ticker for attempt {} stopped: attempt closed", attempt_id);
                break;
            }

            let now = Utc::now();
            let _ = tx.send(remaining_seconds(deadline, now));

            if now >= deadline {
                tracing::info!("Attempt {} reached its deadline, auto-submitting", attempt_id);
                if let Err(e) = manager.finalize_expired(user_id, attempt_id).await {
                    tracing::error!("Auto-submit of attempt {} failed: {}", attempt_id, e);
                }
                break;
            }
        }
    });

    rx
}
