//! Periodic removal of musicians that stopped announcing.

use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;

use roster_services::RosterStore;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Sweep the roster every `every`, dropping entries older than the roster's
/// own ttl, the same bound `snapshot` filters with.
///
/// A single loop drives every sweep, so two sweeps never overlap; a tick
/// that falls due while a sweep is still running is skipped. A zero `every`
/// is treated as one millisecond.
///
/// Runs forever; stop it by aborting its task.
pub async fn expiry_loop(roster: RosterStore, every: Duration) {
    let ttl = roster.ttl();
    let every = every.max(MIN_INTERVAL);
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        ttl_ms = ttl.as_millis() as u64,
        every_ms = every.as_millis() as u64,
        "expiry sweeper starting"
    );

    loop {
        interval.tick().await;

        let removed = roster.sweep(Instant::now(), ttl);
        if removed > 0 {
            tracing::debug!(removed, remaining = roster.len(), "expired roster entries");
        }
    }
}
