use crate::chord_parser::ParsedChord;
use crate::event::{KeyEventKind, KeyboardEvent};
use crate::modifiers::ModifierTracker;
use crate::sequence::{SequenceMatcher, SequenceProgress};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;
use tracing::debug;

/// Callback invoked when a binding matches.
///
/// Cloning is cheap and clones compare equal under [`Handler::ptr_eq`], which
/// is how a specific handler is unbound again.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&KeyboardEvent)>);

impl Handler {
    pub fn new(f: impl Fn(&KeyboardEvent) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, event: &KeyboardEvent) {
        (self.0)(event)
    }

    /// Whether both handles refer to the same callback
    pub fn ptr_eq(&self, other: &Handler) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// A registered association of chord, event phase and handler
#[derive(Debug, Clone)]
pub struct Binding {
    pub chord: ParsedChord,
    pub kind: KeyEventKind,
    pub handler: Handler,
    /// Present only for sequence chords
    sequence: Option<SequenceMatcher>,
}

impl Binding {
    pub fn new(
        chord: ParsedChord,
        kind: KeyEventKind,
        handler: Handler,
        sequence_timeout: Duration,
    ) -> Self {
        let sequence = chord
            .is_sequence
            .then(|| SequenceMatcher::with_timeout(&chord.key, sequence_timeout));
        Self {
            chord,
            kind,
            handler,
            sequence,
        }
    }

    pub fn is_sequence(&self) -> bool {
        self.sequence.is_some()
    }

    pub fn sequence(&self) -> Option<&SequenceMatcher> {
        self.sequence.as_ref()
    }

    /// Match this binding against one event.
    ///
    /// Plain chords need the same key code; every binding needs its modifiers
    /// held (extra held modifiers are fine). A sequence binding is only fed
    /// when its modifiers are held and reports a match on its final step.
    pub fn matches(
        &mut self,
        event: &KeyboardEvent,
        modifiers: &ModifierTracker,
        now: Duration,
    ) -> bool {
        if self.kind != event.kind {
            return false;
        }
        if self.sequence.is_none() && self.chord.code != event.code {
            return false;
        }
        if self.chord.is_inert() || !modifiers.satisfies(self.chord.modifiers) {
            return false;
        }

        match self.sequence.as_mut() {
            Some(matcher) => matches!(
                matcher.feed(event.code, now),
                SequenceProgress::Completed
            ),
            None => true,
        }
    }

    /// Whether an unbind request for `request` (and optionally `handler`)
    /// covers this binding. A request without modifiers covers every
    /// modifier combination of the key.
    pub fn is_covered_by(&self, request: &ParsedChord, handler: Option<&Handler>) -> bool {
        if let Some(handler) = handler {
            if !self.handler.ptr_eq(handler) {
                return false;
            }
        }
        if self.chord.key != request.key {
            return false;
        }
        request.has_no_modifiers() || self.chord.same_modifiers(request)
    }

    /// Label in binding syntax, e.g. `shift + tab (keydown)`
    pub fn describe(&self) -> String {
        let mut parts: Vec<String> = self
            .chord
            .modifiers
            .modifiers()
            .map(|m| m.name().to_string())
            .collect();
        parts.extend(self.chord.unknown_modifiers.iter().cloned());
        parts.push(self.chord.key.clone());
        format!("{} ({})", parts.join(" + "), self.kind)
    }
}

/// Ordered collection of bindings for one dispatcher
#[derive(Debug, Default)]
pub struct BindingRegistry {
    bindings: Vec<Binding>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one binding per chord, all sharing `handler`
    pub fn add(
        &mut self,
        chords: Vec<ParsedChord>,
        kind: KeyEventKind,
        handler: &Handler,
        sequence_timeout: Duration,
    ) {
        for chord in chords {
            let binding = Binding::new(chord, kind, handler.clone(), sequence_timeout);
            crate::trace_binding!("Binding", binding);
            self.bindings.push(binding);
        }
    }

    /// Remove every binding covered by one of `requests`; returns how many
    /// were removed
    pub fn remove(&mut self, requests: &[ParsedChord], handler: Option<&Handler>) -> usize {
        let before = self.bindings.len();
        self.bindings.retain(|binding| {
            let covered = requests
                .iter()
                .any(|request| binding.is_covered_by(request, handler));
            if covered {
                crate::trace_binding!("Unbinding", binding);
            }
            !covered
        });
        before - self.bindings.len()
    }

    pub fn clear(&mut self) {
        if !self.bindings.is_empty() {
            debug!(target: "bind", "Clearing {} bindings", self.bindings.len());
        }
        self.bindings.clear();
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Binding> {
        self.bindings.iter_mut()
    }
}
