use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use roomkit_core::CancellationToken;

use crate::room::check_timers;
use crate::store::Store;

/// Optional convenience: a plain interval loop that evaluates
/// [`check_timers`] against every room on each tick and applies any due
/// transition through the store. Entirely independent of the inbound
/// pipeline — it never runs inside a room's exclusive section and nothing
/// about the pipeline depends on it running at all. A host with its own
/// scheduler is free to call `check_timers` directly on whatever cadence it
/// prefers instead of spawning this.
pub async fn run_room_timer_ticker(store: Arc<dyn Store>, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = cancel.cancelled() => return,
        }

        let rooms = match store.list_rooms().await {
            Ok(rooms) => rooms,
            Err(error) => {
                tracing::warn!(%error, "room timer ticker failed to list rooms");
                continue;
            }
        };

        let now = Utc::now();
        for mut room in rooms {
            let Some(desired) = check_timers(&room, now) else {
                continue;
            };
            room.status = desired;
            if desired == crate::room::RoomStatus::Closed {
                room.closed_at = Some(now);
            }
            if let Err(error) = store.update_room(room.clone()).await {
                tracing::warn!(room_id = %room.id, %error, "room timer ticker failed to apply transition");
            }
        }
    }
}
