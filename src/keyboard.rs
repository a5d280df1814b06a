use crate::binding::Handler;
use crate::dispatcher::Dispatcher;
use crate::event::{InputEvent, KeyEventKind, KeyboardEvent};
use crate::modifiers::Modifier;
use crate::source::{EventSource, SubscriptionId};
use anyhow::Result;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use tracing::debug;

/// Shareable handle to a [`Dispatcher`], optionally attached to an
/// [`EventSource`].
///
/// Clones refer to the same dispatcher, so handlers can capture a clone and
/// bind or unbind keys while an event is being handled. Such changes apply
/// from the next event on.
#[derive(Clone)]
pub struct Keyboard {
    dispatcher: Rc<RefCell<Dispatcher>>,
    subscription: Rc<Cell<Option<SubscriptionId>>>,
}

impl Keyboard {
    /// Detached handle; feed it events with [`Keyboard::handle`]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Rc::new(RefCell::new(dispatcher)),
            subscription: Rc::new(Cell::new(None)),
        }
    }

    /// Subscribe `dispatcher` to every event of `source`.
    ///
    /// The source only holds a weak reference; once every handle is dropped
    /// its listener does nothing.
    pub fn attach(source: &dyn EventSource, dispatcher: Dispatcher) -> Self {
        let keyboard = Self::new(dispatcher);
        let weak = Rc::downgrade(&keyboard.dispatcher);
        let id = source.subscribe(Rc::new(move |event: &InputEvent| {
            if let Some(dispatcher) = weak.upgrade() {
                run(&dispatcher, event);
            }
        }));
        debug!(target: "keys", "Keyboard attached as {:?}", id);
        keyboard.subscription.set(Some(id));
        keyboard
    }

    /// Stop listening to `source` and drop all bindings and modifier state
    pub fn detach(&self, source: &dyn EventSource) {
        if let Some(id) = self.subscription.take() {
            source.unsubscribe(id);
            debug!(target: "keys", "Keyboard detached from {:?}", id);
        }
        self.dispatcher.borrow_mut().destroy();
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.get().is_some()
    }

    /// Dispatch one event and call its handlers; returns how many ran
    pub fn handle(&self, event: &InputEvent) -> usize {
        run(&self.dispatcher, event)
    }

    pub fn bind(&self, keys: &str, handler: Handler) -> &Self {
        self.dispatcher.borrow_mut().bind(keys, handler);
        self
    }

    pub fn down(&self, keys: &str, handler: Handler) -> &Self {
        self.dispatcher.borrow_mut().down(keys, handler);
        self
    }

    pub fn up(&self, keys: &str, handler: Handler) -> &Self {
        self.dispatcher.borrow_mut().up(keys, handler);
        self
    }

    pub fn bind_event(&self, kind: KeyEventKind, keys: &str, handler: Handler) -> &Self {
        self.dispatcher.borrow_mut().bind_event(kind, keys, handler);
        self
    }

    pub fn bind_with_timeout(
        &self,
        kind: KeyEventKind,
        keys: &str,
        timeout: Duration,
        handler: Handler,
    ) -> &Self {
        self.dispatcher
            .borrow_mut()
            .bind_with_timeout(kind, keys, timeout, handler);
        self
    }

    pub fn try_bind(&self, kind: KeyEventKind, keys: &str, handler: Handler) -> Result<&Self> {
        self.dispatcher.borrow_mut().try_bind(kind, keys, handler)?;
        Ok(self)
    }

    pub fn unbind(&self, keys: &str) -> usize {
        self.dispatcher.borrow_mut().unbind(keys)
    }

    pub fn unbind_handler(&self, keys: &str, handler: &Handler) -> usize {
        self.dispatcher.borrow_mut().unbind_handler(keys, handler)
    }

    pub fn unbind_all(&self) {
        self.dispatcher.borrow_mut().unbind_all();
    }

    pub fn set_ignore(&self, predicate: impl Fn(&KeyboardEvent) -> bool + 'static) {
        self.dispatcher.borrow_mut().set_ignore(predicate);
    }

    pub fn clear_ignore(&self) {
        self.dispatcher.borrow_mut().clear_ignore();
    }

    pub fn is_held(&self, modifier: Modifier) -> bool {
        self.dispatcher.borrow().is_held(modifier)
    }

    pub fn binding_count(&self) -> usize {
        self.dispatcher.borrow().bindings().len()
    }

    pub fn format_debug_info(&self) -> String {
        self.dispatcher.borrow().format_debug_info()
    }

    /// Read access to the dispatcher; must not be held across `handle`
    pub fn with_dispatcher<R>(&self, f: impl FnOnce(&Dispatcher) -> R) -> R {
        f(&self.dispatcher.borrow())
    }
}

fn run(dispatcher: &RefCell<Dispatcher>, event: &InputEvent) -> usize {
    // borrow ends before any handler runs
    let handlers = dispatcher.borrow_mut().dispatch(event);
    if let Some(key) = event.as_key() {
        for handler in &handlers {
            handler.call(key);
        }
    }
    handlers.len()
}
