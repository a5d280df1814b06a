//! Keyboard chord and sequence dispatcher for the ed rich-text editor.
//!
//! Bind handlers to specs like `"ctrl + a, shift + tab"` or `"g g"` on a
//! [`Dispatcher`], then feed it key and focus events, either directly or by
//! attaching a [`Keyboard`] to an [`EventSource`].

pub mod binding;
pub mod chord_parser;
pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod event;
pub mod keyboard;
pub mod keycode;
pub mod logging;
pub mod modifiers;
pub mod platform;
pub mod sequence;
pub mod source;
pub mod terminal;

pub use binding::{Binding, BindingRegistry, Handler};
pub use chord_parser::{parse_chords, parse_chords_strict, ParsedChord};
pub use clock::{Clock, ManualClock, SystemClock};
pub use dispatcher::Dispatcher;
pub use event::{InputEvent, KeyEventKind, KeyboardEvent};
pub use keyboard::Keyboard;
pub use modifiers::{Modifier, ModifierSet, ModifierTracker};
pub use platform::Platform;
pub use sequence::{SequenceMatcher, SequenceProgress};
pub use source::{EventBus, EventSource};
