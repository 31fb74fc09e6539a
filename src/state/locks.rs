use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// One gate per aggregate id so read-modify-write cycles on the same document never interleave.
#[derive(Default)]
pub struct AggregateLocks {
    gates: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl AggregateLocks {
    /// Empty registry; gates are created on first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`.
    pub async fn acquire(&self, id: Uuid) -> OwnedMutexGuard<()> {
        let gate = self.gates.entry(id).or_default().clone();
        gate.lock_owned().await
    }

    /// Forget the gate of `id` when nobody holds or awaits it.
    pub fn release(&self, id: Uuid) {
        self.gates
            .remove_if(&id, |_, gate| Arc::strong_count(gate) == 1);
    }

    /// Number of gates currently tracked.
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Whether no gate is tracked.
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }
}
