use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Identifier of a single WebSocket connection.
pub type ConnectionId = u64;

/// Serialized frame fanned out to every subscriber of a group room.
#[derive(Debug, Clone)]
pub struct RoomEvent {
    /// Connection that caused the event; receivers skip it for presence-style events.
    pub origin: Option<ConnectionId>,
    pub payload: Arc<str>,
}

impl RoomEvent {
    /// Whether this event must be delivered to `connection`.
    pub fn is_for(&self, connection: ConnectionId) -> bool {
        self.origin != Some(connection)
    }
}

/// One broadcast channel per group, created on first subscription.
pub struct RoomHub {
    rooms: DashMap<Uuid, broadcast::Sender<RoomEvent>>,
    capacity: usize,
    next_connection: AtomicU64,
}

impl RoomHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            capacity: capacity.max(1),
            next_connection: AtomicU64::new(1),
        }
    }

    /// Allocate an identifier for a new connection.
    pub fn next_connection_id(&self) -> ConnectionId {
        self.next_connection.fetch_add(1, Ordering::Relaxed)
    }

    /// Subscribe to the room of `group_id`, creating it when needed.
    pub fn subscribe(&self, group_id: Uuid) -> broadcast::Receiver<RoomEvent> {
        self.rooms
            .entry(group_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Send to every current subscriber, returning how many received it.
    pub fn broadcast(&self, group_id: Uuid, event: RoomEvent) -> usize {
        self.rooms
            .get(&group_id)
            .and_then(|sender| sender.send(event).ok())
            .unwrap_or(0)
    }

    /// Drop the room once its last subscriber left.
    pub fn prune(&self, group_id: Uuid) {
        self.rooms
            .remove_if(&group_id, |_, sender| sender.receiver_count() == 0);
    }

    /// Number of live rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }
}
