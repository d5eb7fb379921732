use std::time::Duration;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, instrument};

use super::repository::RoomStore;
use crate::config::RoomsConfig;

/// Periodically deletes rooms older than the idle TTL, regardless of state.
/// Runs until the task is aborted.
#[instrument(skip(store, config))]
pub async fn start_cleanup_task(store: RoomStore, config: RoomsConfig) {
    let period = config.cleanup_interval().max(Duration::from_secs(1));
    let ttl = config.idle_room_ttl();

    info!(
        cleanup_interval_secs = period.as_secs(),
        idle_room_ttl_secs = ttl.as_secs(),
        "Starting room cleanup background task"
    );

    let mut cleanup_interval = interval_at(Instant::now() + period, period);
    loop {
        cleanup_interval.tick().await;
        run_cleanup(&store, ttl).await;
    }
}

async fn run_cleanup(store: &RoomStore, ttl: Duration) -> usize {
    let reaped = store.reap_idle_rooms(ttl).await;
    if reaped.is_empty() {
        debug!("No idle rooms to clean up");
    } else {
        info!(deleted_count = reaped.len(), rooms = ?reaped, "Room cleanup completed");
    }
    reaped.len()
}
