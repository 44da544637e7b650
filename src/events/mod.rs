// src/events/mod.rs
// In-process publish/subscribe channel shared by the workspace controllers

use crate::lock::lock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::mpsc;

/// Payload-free signals carried by the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkspaceEvent {
    /// At least one upload batch settled and the stored records may have changed
    RecordInserted,
}

impl WorkspaceEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkspaceEvent::RecordInserted => "record-inserted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: HashMap<SubscriptionId, mpsc::UnboundedSender<WorkspaceEvent>>,
}

/// Cloneable handle to one listener registry. Clones share listeners.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. The returned handle unsubscribes when dropped.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut registry = lock(&self.inner);
        registry.next_id += 1;
        let id = SubscriptionId(registry.next_id);
        registry.listeners.insert(id, tx);
        tracing::debug!("Event listener {:?} subscribed ({} active)", id, registry.listeners.len());

        Subscription {
            id,
            receiver: rx,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Remove a listener. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        remove_listener(&self.inner, id)
    }

    /// Deliver `event` to every live listener, returning how many received it.
    /// Emitting with no listeners is a no-op.
    pub fn emit(&self, event: WorkspaceEvent) -> usize {
        let mut registry = lock(&self.inner);
        registry
            .listeners
            .retain(|_, sender| sender.send(event).is_ok());
        let delivered = registry.listeners.len();
        tracing::debug!("Emitted {} to {} listener(s)", event.as_str(), delivered);
        delivered
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.inner).listeners.len()
    }
}

/// Receiving end of one bus registration
pub struct Subscription {
    id: SubscriptionId,
    receiver: mpsc::UnboundedReceiver<WorkspaceEvent>,
    bus: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Wait for the next event. Returns `None` once the listener was removed from the bus.
    pub async fn recv(&mut self) -> Option<WorkspaceEvent> {
        self.receiver.recv().await
    }

    /// Non-blocking poll, used to drain pending signals
    pub fn try_recv(&mut self) -> Option<WorkspaceEvent> {
        self.receiver.try_recv().ok()
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            remove_listener(&inner, self.id);
        }
    }
}

fn remove_listener(inner: &Mutex<Registry>, id: SubscriptionId) -> bool {
    let mut registry = lock(inner);
    let removed = registry.listeners.remove(&id).is_some();
    if removed {
        tracing::debug!("Event listener {:?} unsubscribed ({} active)", id, registry.listeners.len());
    }
    removed
}
