//! Keyed lock table serialising ingestion per patient.

use crate::types::PatientId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Slots = Arc<Mutex<HashMap<PatientId, Slot>>>;

#[derive(Debug)]
struct Slot {
    mutex: Arc<AsyncMutex<()>>,
    /// Holders plus waiters
    users: usize,
}

/// Hands out one async mutex per patient.
///
/// Different patients never contend. Every holder and waiter is counted
/// against its slot, and the slot is removed when that count reaches zero,
/// including when a waiter is cancelled before it acquires.
#[derive(Debug, Default, Clone)]
pub struct SubjectLocks {
    slots: Slots,
}

/// A counted registration against one patient's slot.
#[derive(Debug)]
struct SlotLease {
    id: PatientId,
    slots: Slots,
}

impl SlotLease {
    fn register(id: PatientId, slots: &Slots) -> (Self, Arc<AsyncMutex<()>>) {
        let mut table = slots.lock().unwrap_or_else(|e| e.into_inner());
        let slot = table.entry(id).or_insert_with(|| Slot {
            mutex: Arc::default(),
            users: 0,
        });
        slot.users += 1;
        let mutex = Arc::clone(&slot.mutex);

        (
            Self {
                id,
                slots: Arc::clone(slots),
            },
            mutex,
        )
    }
}

impl Drop for SlotLease {
    fn drop(&mut self) {
        let mut table = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(slot) = table.get_mut(&self.id) {
            slot.users = slot.users.saturating_sub(1);
            if slot.users == 0 {
                table.remove(&self.id);
            }
        }
    }
}

/// Exclusive hold on one patient's slot.
#[derive(Debug)]
pub struct SubjectGuard {
    // Field order matters: the mutex is released before the lease is returned
    _guard: OwnedMutexGuard<()>,
    lease: SlotLease,
}

impl SubjectLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`.
    ///
    /// Dropping the returned future while it waits gives the slot back.
    pub async fn acquire(&self, id: PatientId) -> SubjectGuard {
        let (lease, mutex) = SlotLease::register(id, &self.slots);
        let guard = mutex.lock_owned().await;

        SubjectGuard {
            _guard: guard,
            lease,
        }
    }

    /// Number of patients with a live slot.
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SubjectGuard {
    pub fn patient_id(&self) -> PatientId {
        self.lease.id
    }
}
