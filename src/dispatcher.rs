use crate::binding::{BindingRegistry, Handler};
use crate::chord_parser::{parse_chords, parse_chords_strict};
use crate::clock::{Clock, SystemClock};
use crate::config::DispatcherConfig;
use crate::event::{InputEvent, KeyEventKind, KeyboardEvent};
use crate::keycode;
use crate::modifiers::{Modifier, ModifierTracker};
use crate::platform::Platform;
use anyhow::Result;
use chrono::Local;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, trace};

/// Decides whether an event should bypass binding matching entirely
pub type IgnorePredicate = Box<dyn Fn(&KeyboardEvent) -> bool>;

/// Predicate ignoring events whose target tag is one of `targets`
/// (compared case-insensitively). Events without a target are never ignored.
pub fn ignore_targets(targets: Vec<String>) -> IgnorePredicate {
    Box::new(move |event: &KeyboardEvent| {
        event
            .target
            .as_deref()
            .map(|tag| targets.iter().any(|t| t.eq_ignore_ascii_case(tag)))
            .unwrap_or(false)
    })
}

/// Matches key events from one input source against its bindings.
///
/// Owns the modifier state and the binding registry of that source. Events
/// go through [`Dispatcher::dispatch`] (returns the handlers to run) or
/// [`Dispatcher::handle`] (also runs them). Use [`crate::Keyboard`] when
/// handlers need to bind or unbind while an event is being handled.
pub struct Dispatcher {
    registry: BindingRegistry,
    modifiers: ModifierTracker,
    platform: Platform,
    clock: Rc<dyn Clock>,
    sequence_timeout: Duration,
    ignore: Option<IgnorePredicate>,
    /// Recent keys for the debug view
    key_history: VecDeque<String>,
    max_history: usize,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::from_config(&DispatcherConfig::default())
    }

    pub fn with_platform(platform: Platform) -> Self {
        let config = DispatcherConfig {
            platform: Some(platform),
            ..DispatcherConfig::default()
        };
        Self::from_config(&config)
    }

    pub fn from_config(config: &DispatcherConfig) -> Self {
        let platform = config.platform.unwrap_or_else(Platform::current);
        debug!(
            target: "keys",
            "Creating dispatcher for {} (super = {}, sequence timeout {}ms)",
            platform,
            platform.super_modifier(),
            config.sequence_timeout_ms
        );

        Self {
            registry: BindingRegistry::new(),
            modifiers: ModifierTracker::new(platform.super_modifier()),
            platform,
            clock: Rc::new(SystemClock::new()),
            sequence_timeout: config.sequence_timeout(),
            ignore: Some(ignore_targets(config.ignored_targets.clone())),
            key_history: VecDeque::new(),
            max_history: config.max_history,
        }
    }

    /// Replace the clock used to time sequences
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Rc::new(clock);
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// The modifier `super` resolves to for this dispatcher
    pub fn super_modifier(&self) -> Modifier {
        self.platform.super_modifier()
    }

    /// Default timeout for sequences bound without an explicit one
    pub fn sequence_timeout(&self) -> Duration {
        self.sequence_timeout
    }

    pub fn set_sequence_timeout(&mut self, timeout: Duration) {
        self.sequence_timeout = timeout;
    }

    /// Bind `keys` on key-down
    pub fn bind(&mut self, keys: &str, handler: Handler) -> &mut Self {
        self.bind_event(KeyEventKind::Down, keys, handler)
    }

    pub fn down(&mut self, keys: &str, handler: Handler) -> &mut Self {
        self.bind_event(KeyEventKind::Down, keys, handler)
    }

    pub fn up(&mut self, keys: &str, handler: Handler) -> &mut Self {
        self.bind_event(KeyEventKind::Up, keys, handler)
    }

    pub fn bind_event(&mut self, kind: KeyEventKind, keys: &str, handler: Handler) -> &mut Self {
        let timeout = self.sequence_timeout;
        self.bind_with_timeout(kind, keys, timeout, handler)
    }

    /// Bind with a specific timeout for any sequences in `keys`
    pub fn bind_with_timeout(
        &mut self,
        kind: KeyEventKind,
        keys: &str,
        timeout: Duration,
        handler: Handler,
    ) -> &mut Self {
        let chords = parse_chords(keys, self.super_modifier());
        if chords.is_empty() {
            debug!(target: "bind", "No chords in {:?}, nothing bound", keys);
        }
        self.registry.add(chords, kind, &handler, timeout);
        self
    }

    /// Like [`Dispatcher::bind_event`] but rejects specs naming unknown
    /// modifiers or keys instead of registering inert bindings
    pub fn try_bind(
        &mut self,
        kind: KeyEventKind,
        keys: &str,
        handler: Handler,
    ) -> Result<&mut Self> {
        let chords = parse_chords_strict(keys, self.super_modifier())?;
        let timeout = self.sequence_timeout;
        self.registry.add(chords, kind, &handler, timeout);
        Ok(self)
    }

    /// Remove every handler bound to the chords in `keys`. Chords given
    /// without modifiers remove the key under any modifier combination.
    pub fn unbind(&mut self, keys: &str) -> usize {
        let requests = parse_chords(keys, self.super_modifier());
        self.registry.remove(&requests, None)
    }

    /// Remove `handler` from the chords in `keys`
    pub fn unbind_handler(&mut self, keys: &str, handler: &Handler) -> usize {
        let requests = parse_chords(keys, self.super_modifier());
        self.registry.remove(&requests, Some(handler))
    }

    pub fn unbind_all(&mut self) {
        self.registry.clear();
    }

    /// Replace the ignore predicate
    pub fn set_ignore(&mut self, predicate: impl Fn(&KeyboardEvent) -> bool + 'static) {
        self.ignore = Some(Box::new(predicate));
    }

    /// Match every event, whatever its target
    pub fn clear_ignore(&mut self) {
        self.ignore = None;
    }

    pub fn is_ignored(&self, event: &KeyboardEvent) -> bool {
        self.ignore.as_ref().is_some_and(|ignore| ignore(event))
    }

    /// Process one event and return the handlers it triggers, in binding
    /// order. The handlers are not called.
    pub fn dispatch(&mut self, event: &InputEvent) -> Vec<Handler> {
        match event {
            InputEvent::Focus => {
                debug!(target: "keys", "Focus: clearing modifiers");
                self.modifiers.clear();
                Vec::new()
            }
            InputEvent::Key(key) => self.dispatch_key(key),
        }
    }

    /// Process one event and call the triggered handlers. Returns how many
    /// handlers ran.
    pub fn handle(&mut self, event: &InputEvent) -> usize {
        let handlers = self.dispatch(event);
        if let Some(key) = event.as_key() {
            for handler in &handlers {
                handler.call(key);
            }
        }
        handlers.len()
    }

    fn dispatch_key(&mut self, event: &KeyboardEvent) -> Vec<Handler> {
        crate::trace_key!(event);
        self.log_key(event);

        let modifier = Modifier::from_code(event.code);
        if let (KeyEventKind::Down, Some(modifier)) = (event.kind, modifier) {
            self.modifiers.press(modifier);
            trace!(target: "keys", "Modifiers held: {}", self.modifiers.held());
            return Vec::new();
        }

        let fired = if self.is_ignored(event) {
            trace!(
                target: "keys",
                "Ignoring {} from {:?}",
                keycode::describe(event.code),
                event.target
            );
            Vec::new()
        } else {
            self.match_bindings(event)
        };

        if let (KeyEventKind::Up, Some(modifier)) = (event.kind, modifier) {
            self.modifiers.release(modifier);
            trace!(target: "keys", "Modifiers held: {}", self.modifiers.held());
        }

        fired
    }

    fn match_bindings(&mut self, event: &KeyboardEvent) -> Vec<Handler> {
        let now = self.clock.now();
        let modifiers = &self.modifiers;

        let mut fired = Vec::new();
        for binding in self.registry.iter_mut() {
            if binding.matches(event, modifiers, now) {
                debug!(target: "keys", "Matched {}", binding.describe());
                fired.push(binding.handler.clone());
            }
        }
        fired
    }

    fn log_key(&mut self, event: &KeyboardEvent) {
        if self.max_history == 0 {
            return;
        }
        if self.key_history.len() >= self.max_history {
            self.key_history.pop_front();
        }

        let timestamp = Local::now().format("%H:%M:%S.%3f");
        let key = keycode::describe(event.code);
        let entry = if self.modifiers.any_held() {
            format!("[{}] {} {} ({})", timestamp, event.kind, key, self.modifiers.held())
        } else {
            format!("[{}] {} {}", timestamp, event.kind, key)
        };
        self.key_history.push_back(entry);
    }

    pub fn is_held(&self, modifier: Modifier) -> bool {
        self.modifiers.is_held(modifier)
    }

    pub fn modifiers(&self) -> &ModifierTracker {
        &self.modifiers
    }

    pub fn clear_modifiers(&mut self) {
        self.modifiers.clear();
    }

    pub fn bindings(&self) -> &BindingRegistry {
        &self.registry
    }

    /// Recent keys, oldest first
    pub fn key_history(&self) -> &VecDeque<String> {
        &self.key_history
    }

    pub fn clear_history(&mut self) {
        self.key_history.clear();
    }

    /// Drop all bindings and modifier state
    pub fn destroy(&mut self) {
        debug!(target: "keys", "Destroying dispatcher");
        self.registry.clear();
        self.modifiers.clear();
    }

    /// Pretty print for debug view
    pub fn format_debug_info(&self) -> String {
        let mut output = String::new();

        output.push_str("========== MODIFIERS ==========\n");
        output.push_str(&format!("Platform: {}\n", self.platform));
        output.push_str(&format!("Held: {}\n", self.modifiers.held()));
        output.push_str(&format!(
            "Super ({}): {}\n",
            self.super_modifier(),
            if self.modifiers.super_held() {
                "held"
            } else {
                "released"
            }
        ));

        output.push_str("\n========== BINDINGS ==========\n");
        if self.registry.is_empty() {
            output.push_str("No bindings\n");
        }
        for (i, binding) in self.registry.iter().enumerate() {
            output.push_str(&format!("{}. {}", i + 1, binding.describe()));
            if let Some(sequence) = binding.sequence() {
                output.push_str(&format!(
                    " [{}: {}/{} within {}ms]",
                    sequence.describe(),
                    sequence.progress(),
                    sequence.len(),
                    sequence.timeout().as_millis()
                ));
            }
            output.push('\n');
        }

        output.push_str("\n========== KEY HISTORY ==========\n");
        output.push_str(&format!(
            "(Most recent at bottom, last {} keys)\n",
            self.max_history
        ));
        for entry in &self.key_history {
            output.push_str(entry);
            output.push('\n');
        }

        output
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
