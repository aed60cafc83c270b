use std::collections::HashMap;
use std::sync::Mutex;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use roomkit_core::{RoomId, SubscriptionId};

use crate::types::{EphemeralEvent, RealtimeItem};

#[derive(Debug, Clone, Copy)]
pub struct RealtimeBusConfig {
    pub subscriber_queue_capacity: usize,
}

impl Default for RealtimeBusConfig {
    fn default() -> Self {
        Self {
            subscriber_queue_capacity: 1024,
        }
    }
}

#[derive(Default)]
struct RoomEntry {
    subscribers: HashMap<SubscriptionId, mpsc::Sender<RealtimeItem>>,
    pending_lag: HashMap<SubscriptionId, u64>,
}

/// Ephemeral pub/sub of typing/presence/read-receipt events, scoped per
/// room. Nothing published here is persisted. Delivery ordering to a single
/// subscriber follows publish order; there is no cross-subscriber ordering
/// guarantee.
pub struct RealtimeBus {
    config: RealtimeBusConfig,
    rooms: Mutex<HashMap<RoomId, RoomEntry>>,
    subscription_room: DashMap<SubscriptionId, RoomId>,
}

impl RealtimeBus {
    pub fn new(config: RealtimeBusConfig) -> Self {
        Self {
            config,
            rooms: Mutex::new(HashMap::new()),
            subscription_room: DashMap::new(),
        }
    }

    pub fn subscribe(&self, room_id: &RoomId) -> (SubscriptionId, mpsc::Receiver<RealtimeItem>) {
        let (tx, rx) = mpsc::channel(self.config.subscriber_queue_capacity);
        let id = SubscriptionId::generate();

        let mut rooms = self.rooms.lock().expect("realtime bus lock poisoned");
        let entry = rooms.entry(room_id.clone()).or_default();
        entry.subscribers.insert(id.clone(), tx);

        self.subscription_room.insert(id.clone(), room_id.clone());
        (id, rx)
    }

    /// `subscribe(room_id, callback)` in the literal callback-based shape —
    /// spawns a task draining this subscriber's queue and invoking
    /// `callback` for each item. A callback that panics is caught and
    /// logged rather than allowed to unwind through the bus; delivery to
    /// this subscriber continues with the next item.
    pub fn subscribe_with_callback<F>(&self, room_id: &RoomId, callback: F) -> SubscriptionId
    where
        F: Fn(RealtimeItem) + Send + 'static,
    {
        let (id, mut rx) = self.subscribe(room_id);
        tokio::spawn(async move {
            while let Some(item) = rx.recv().await {
                let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| callback(item)));
                if let Err(payload) = outcome {
                    let message = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "non-string panic payload".to_string());
                    tracing::error!(error = %message, "realtime bus subscriber callback panicked, continuing");
                }
            }
        });
        id
    }

    pub fn unsubscribe(&self, subscription_id: &SubscriptionId) {
        let Some((_, room_id)) = self.subscription_room.remove(subscription_id) else {
            return;
        };
        let mut rooms = self.rooms.lock().expect("realtime bus lock poisoned");
        if let Some(entry) = rooms.get_mut(&room_id) {
            entry.subscribers.remove(subscription_id);
            entry.pending_lag.remove(subscription_id);
            if entry.subscribers.is_empty() {
                rooms.remove(&room_id);
            }
        }
    }

    /// Fans `event` out to every current subscriber of `event.room_id`.
    /// A subscriber whose queue is full has this publish dropped for it and
    /// accrues a lag counter; the next publish that fits delivers a single
    /// coalesced `Lagged` marker ahead of the event itself.
    pub fn publish(&self, event: EphemeralEvent) {
        let room_id = event.room_id.clone();
        let mut rooms = self.rooms.lock().expect("realtime bus lock poisoned");
        let Some(entry) = rooms.get_mut(&room_id) else {
            return;
        };

        let mut closed = Vec::new();
        for (id, sender) in entry.subscribers.iter() {
            if sender.is_closed() {
                closed.push(id.clone());
                continue;
            }

            let pending = entry.pending_lag.entry(id.clone()).or_insert(0);
            if *pending > 0 {
                match sender.try_send(RealtimeItem::Lagged { dropped: *pending }) {
                    Ok(()) => *pending = 0,
                    Err(TrySendError::Full(_)) => {
                        *pending += 1;
                        continue;
                    }
                    Err(TrySendError::Closed(_)) => {
                        closed.push(id.clone());
                        continue;
                    }
                }
            }

            match sender.try_send(RealtimeItem::Event(event.clone())) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    *entry.pending_lag.entry(id.clone()).or_insert(0) += 1;
                }
                Err(TrySendError::Closed(_)) => closed.push(id.clone()),
            }
        }

        for id in closed {
            entry.subscribers.remove(&id);
            entry.pending_lag.remove(&id);
            self.subscription_room.remove(&id);
        }
        if entry.subscribers.is_empty() {
            rooms.remove(&room_id);
        }
    }

    /// Drops every subscriber across every room.
    pub fn close(&self) {
        let mut rooms = self.rooms.lock().expect("realtime bus lock poisoned");
        rooms.clear();
        self.subscription_room.clear();
    }

    pub fn subscriber_count(&self, room_id: &RoomId) -> usize {
        self.rooms
            .lock()
            .expect("realtime bus lock poisoned")
            .get(room_id)
            .map(|e| e.subscribers.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EphemeralEventType;
    use chrono::Utc;
    use std::sync::Arc;

    fn ev(room_id: &RoomId) -> EphemeralEvent {
        EphemeralEvent::new(room_id.clone(), EphemeralEventType::TypingStart, Utc::now())
    }

    #[tokio::test]
    async fn subscriber_receives_published_events() {
        let bus = RealtimeBus::new(RealtimeBusConfig::default());
        let room_id = RoomId::generate();
        let (_id, mut rx) = bus.subscribe(&room_id);
        bus.publish(ev(&room_id));
        let item = rx.recv().await.unwrap();
        assert!(matches!(item, RealtimeItem::Event(_)));
    }

    #[tokio::test]
    async fn unsubscribe_stops_further_delivery() {
        let bus = RealtimeBus::new(RealtimeBusConfig::default());
        let room_id = RoomId::generate();
        let (id, mut rx) = bus.subscribe(&room_id);
        bus.unsubscribe(&id);
        bus.publish(ev(&room_id));
        assert_eq!(bus.subscriber_count(&room_id), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn a_full_queue_drops_events_and_surfaces_one_lagged_marker() {
        let bus = RealtimeBus::new(RealtimeBusConfig {
            subscriber_queue_capacity: 2,
        });
        let room_id = RoomId::generate();
        let (_id, mut rx) = bus.subscribe(&room_id);

        for _ in 0..5 {
            bus.publish(ev(&room_id));
        }

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(matches!(first, RealtimeItem::Event(_)));
        assert!(matches!(second, RealtimeItem::Event(_)));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn different_rooms_do_not_cross_deliver() {
        let bus = RealtimeBus::new(RealtimeBusConfig::default());
        let room_a = RoomId::generate();
        let room_b = RoomId::generate();
        let (_id_a, mut rx_a) = bus.subscribe(&room_a);
        let (_id_b, mut rx_b) = bus.subscribe(&room_b);

        bus.publish(ev(&room_a));

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn a_panicking_callback_does_not_stop_later_deliveries() {
        let bus = Arc::new(RealtimeBus::new(RealtimeBusConfig::default()));
        let room_id = RoomId::generate();
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));

        let calls_for_callback = calls.clone();
        bus.subscribe_with_callback(&room_id, move |item| {
            let n = calls_for_callback.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if n == 0 {
                panic!("simulated subscriber callback bug");
            }
            let _ = item;
        });

        bus.publish(ev(&room_id));
        bus.publish(ev(&room_id));
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}
