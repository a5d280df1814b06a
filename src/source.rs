//! Input sources a dispatcher can attach to

use crate::event::InputEvent;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Callback registered on an [`EventSource`]
pub type Listener = Rc<dyn Fn(&InputEvent)>;

/// Identifies one subscription on an [`EventSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Something that delivers key and focus events to its listeners
pub trait EventSource {
    /// Register a listener for every event the source emits
    fn subscribe(&self, listener: Listener) -> SubscriptionId;

    /// Remove a listener; false if it was not registered
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

/// In-process event source that forwards emitted events to its listeners
#[derive(Default)]
pub struct EventBus {
    listeners: RefCell<Vec<(SubscriptionId, Listener)>>,
    next_id: Cell<u64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every listener registered when the call starts.
    /// Listeners may subscribe or unsubscribe while the event is delivered.
    pub fn emit(&self, event: &InputEvent) {
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        trace!(
            target: "source",
            "Emitting {:?} to {} listeners",
            event,
            listeners.len()
        );
        for listener in listeners {
            listener(event);
        }
    }

    pub fn emit_all<'a>(&self, events: impl IntoIterator<Item = &'a InputEvent>) {
        for event in events {
            self.emit(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl EventSource for EventBus {
    fn subscribe(&self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        debug!(target: "source", "Adding listener {:?}", id);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        let removed = listeners.len() != before;
        if removed {
            debug!(target: "source", "Removed listener {:?}", id);
        } else {
            warn!(target: "source", "Listener {:?} was not registered", id);
        }
        removed
    }
}
