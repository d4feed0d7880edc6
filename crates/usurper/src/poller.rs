//! The lobby poller: fixed-interval fallback while waiting for push.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use usurper_protocol::{PlayerId, RoomCode, StateUpdate};
use usurper_transport::GameApi;

/// Fixed interval between polls, well under the reaction clock.
const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Random delay before the first poll, so clients created by the same
/// lobby event don't hit the authority in lockstep.
const POLL_JITTER_MS: u64 = 500;

/// Periodically fetches room state while the game has not started.
///
/// Single-flight by construction: each tick runs its fetch to completion
/// before the next tick is considered. The poller is an owned handle;
/// dropping (or [`stop`](Self::stop)ping) it aborts the task, and it also
/// stops itself the moment it observes a started status.
#[derive(Debug)]
pub struct LobbyPoller {
    handle: JoinHandle<()>,
}

impl LobbyPoller {
    /// Spawns the poll loop, feeding results into `updates`.
    pub fn start<A: GameApi>(
        api: Arc<A>,
        room: RoomCode,
        viewer: PlayerId,
        updates: mpsc::UnboundedSender<StateUpdate>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let jitter = rand::rng().random_range(0..POLL_JITTER_MS);
            tokio::time::sleep(Duration::from_millis(jitter)).await;

            let mut interval = tokio::time::interval(POLL_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                let response = match api.fetch_state(&room, &viewer).await {
                    Ok(response) => response,
                    Err(e) => {
                        // This is the fallback path; a miss is not fatal.
                        tracing::debug!(%room, error = %e, "lobby poll failed");
                        continue;
                    }
                };
                match response.into_update() {
                    Ok(update) => {
                        let started = update.snapshot.is_started();
                        if updates.send(update).is_err() {
                            break;
                        }
                        if started {
                            tracing::debug!(%room, "poller observed started state, stopping");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(%room, error = %e, "discarding malformed poll response");
                    }
                }
            }
        });
        Self { handle }
    }

    /// Stops the poller. No further results will be produced.
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for LobbyPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
