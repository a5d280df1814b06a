use serde::{Deserialize, Serialize};
use std::fmt;

/// Which phase of a key press an event (or a binding) refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyEventKind {
    Down,
    Up,
}

impl fmt::Display for KeyEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Down => write!(f, "keydown"),
            Self::Up => write!(f, "keyup"),
        }
    }
}

/// A single key press or release delivered by the input source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardEvent {
    pub kind: KeyEventKind,
    pub code: u32,
    /// Tag name of the element the event originated from, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl KeyboardEvent {
    pub fn new(kind: KeyEventKind, code: u32) -> Self {
        Self {
            kind,
            code,
            target: None,
        }
    }

    pub fn down(code: u32) -> Self {
        Self::new(KeyEventKind::Down, code)
    }

    pub fn up(code: u32) -> Self {
        Self::new(KeyEventKind::Up, code)
    }

    /// Attach the tag name of the originating element
    pub fn with_target(mut self, tag: impl Into<String>) -> Self {
        self.target = Some(tag.into());
        self
    }

    pub fn is_down(&self) -> bool {
        self.kind == KeyEventKind::Down
    }

    pub fn is_up(&self) -> bool {
        self.kind == KeyEventKind::Up
    }
}

/// Everything a dispatcher observes on its input source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    Key(KeyboardEvent),
    /// The input source gained focus
    Focus,
}

impl InputEvent {
    pub fn key_down(code: u32) -> Self {
        Self::Key(KeyboardEvent::down(code))
    }

    pub fn key_up(code: u32) -> Self {
        Self::Key(KeyboardEvent::up(code))
    }

    pub fn as_key(&self) -> Option<&KeyboardEvent> {
        match self {
            Self::Key(event) => Some(event),
            Self::Focus => None,
        }
    }
}

impl From<KeyboardEvent> for InputEvent {
    fn from(event: KeyboardEvent) -> Self {
        Self::Key(event)
    }
}
