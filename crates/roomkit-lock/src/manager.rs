use std::sync::{Arc, Mutex as StdMutex};

use dashmap::DashMap;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use roomkit_core::RoomId;

/// A held exclusive section for one room. Dropping it releases the section;
/// there is no explicit `release()` — RAII does the job, the same as every
/// other scoped-guard type in this crate family.
pub struct Section {
    room_id: RoomId,
    _guard: OwnedMutexGuard<()>,
}

impl Section {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }
}

/// Per-room exclusive sections, backed by an LRU-bounded registry. Two
/// `acquire` calls for the same room are strictly ordered; calls for
/// different rooms proceed concurrently. The registry never evicts an entry
/// whose section is currently held — eviction only removes locks it can
/// itself momentarily acquire uncontended.
pub struct LockManager {
    capacity: usize,
    locks: DashMap<RoomId, Arc<AsyncMutex<()>>>,
    recency: StdMutex<Vec<RoomId>>,
}

impl LockManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            locks: DashMap::new(),
            recency: StdMutex::new(Vec::new()),
        }
    }

    /// Acquires the exclusive section for `room_id`, suspending until any
    /// concurrent holder releases it.
    pub async fn acquire(&self, room_id: &RoomId) -> Section {
        let mutex = self
            .locks
            .entry(room_id.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();
        self.touch(room_id);
        self.evict_idle_entries(room_id);

        let guard = mutex.lock_owned().await;
        tracing::debug!(room_id = %room_id, "acquired room section");
        Section {
            room_id: room_id.clone(),
            _guard: guard,
        }
    }

    pub fn registry_len(&self) -> usize {
        self.locks.len()
    }

    fn touch(&self, room_id: &RoomId) {
        let mut recency = self.recency.lock().expect("recency lock poisoned");
        recency.retain(|id| id != room_id);
        recency.push(room_id.clone());
    }

    /// Evicts idle (not currently held) entries beyond `capacity`, oldest
    /// first, never considering `current_room` itself — its mutex was just
    /// inserted/touched by this same `acquire` call and is always idle at
    /// this point (nothing holds it yet), so without this exclusion the
    /// scan could evict the very entry the caller is about to lock,
    /// letting a second concurrent `acquire` for the same room race in and
    /// create a distinct mutex for it. An entry is idle iff a `try_lock` on
    /// it succeeds; that probe guard is dropped immediately, so the
    /// eviction itself never blocks.
    fn evict_idle_entries(&self, current_room: &RoomId) {
        let mut recency = self.recency.lock().expect("recency lock poisoned");
        if recency.len() <= self.capacity {
            return;
        }
        let mut i = 0;
        while recency.len() > self.capacity && i < recency.len() {
            let candidate = recency[i].clone();
            if &candidate == current_room {
                i += 1;
                continue;
            }
            let is_idle = self
                .locks
                .get(&candidate)
                .map(|arc| arc.try_lock().is_ok())
                .unwrap_or(true);
            if is_idle {
                self.locks.remove(&candidate);
                recency.remove(i);
            } else {
                i += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    #[tokio::test]
    async fn same_room_sections_are_strictly_ordered() {
        let manager = Arc::new(LockManager::new(1024));
        let room_id = RoomId::generate();
        let order = Arc::new(StdMutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..5 {
            let manager = manager.clone();
            let room_id = room_id.clone();
            let order = order.clone();
            handles.push(tokio::spawn(async move {
                let _section = manager.acquire(&room_id).await;
                tokio::time::sleep(Duration::from_millis(5)).await;
                order.lock().unwrap().push(i);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(order.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn different_rooms_do_not_block_each_other() {
        let manager = Arc::new(LockManager::new(1024));
        let room_a = RoomId::generate();
        let room_b = RoomId::generate();

        let a = manager.acquire(&room_a).await;
        let started = std::time::Instant::now();
        let _b = manager.acquire(&room_b).await;
        assert!(started.elapsed() < Duration::from_millis(50));
        drop(a);
    }

    #[tokio::test]
    async fn same_room_sections_stay_mutually_exclusive_under_capacity_pressure() {
        // capacity=1 with one other room held the whole time means every
        // `acquire(&room_id)` call finds the registry over capacity and has
        // to scan past a non-idle entry before reaching `room_id`'s own —
        // exactly the condition that used to let eviction remove the
        // current room's entry out from under the caller about to lock it,
        // handing a second concurrent `acquire` a brand-new, independent
        // mutex for the same logical room.
        let manager = Arc::new(LockManager::new(1));
        let held_room = RoomId::generate();
        let _held_section = manager.acquire(&held_room).await;

        let room_id = RoomId::generate();
        let in_section = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = manager.clone();
            let room_id = room_id.clone();
            let in_section = in_section.clone();
            handles.push(tokio::spawn(async move {
                let _section = manager.acquire(&room_id).await;
                let concurrent = in_section.fetch_add(1, Ordering::SeqCst) + 1;
                assert_eq!(concurrent, 1, "two holders of the same room's section overlapped");
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_section.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
    }

    #[tokio::test]
    async fn idle_entries_are_evicted_beyond_capacity() {
        let manager = LockManager::new(2);
        for _ in 0..5 {
            let room_id = RoomId::generate();
            let _section = manager.acquire(&room_id).await;
        }
        assert!(manager.registry_len() <= 2);
    }

    #[tokio::test]
    async fn a_held_lock_is_never_evicted() {
        let manager = Arc::new(LockManager::new(1));
        let held_room = RoomId::generate();
        let held_section = manager.acquire(&held_room).await;

        for _ in 0..10 {
            let room_id = RoomId::generate();
            let _section = manager.acquire(&room_id).await;
        }

        // The held room's entry must still be present and still exclusive.
        let manager2 = manager.clone();
        let held_room2 = held_room.clone();
        let attempt = tokio::spawn(async move {
            let _ = manager2.acquire(&held_room2).await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!attempt.is_finished());
        drop(held_section);
        attempt.await.unwrap();
    }
}
