//! Modifier keys and the per-dispatcher tracker of which ones are held.
//!
//! Keyboard events only carry the code of the key that changed, so the held
//! state has to be derived from the stream itself: a modifier key-down sets
//! its flag, the matching key-up clears it, and a focus event clears
//! everything (the release may have happened while focus was elsewhere).

use crate::keycode;
use bitflags::bitflags;
use std::fmt;

/// A single modifier key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Shift,
    Ctrl,
    Alt,
    Command,
}

impl Modifier {
    pub const ALL: [Modifier; 4] = [
        Modifier::Shift,
        Modifier::Ctrl,
        Modifier::Alt,
        Modifier::Command,
    ];

    /// Modifier produced by a key code, if any
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            keycode::SHIFT => Some(Self::Shift),
            keycode::CTRL => Some(Self::Ctrl),
            keycode::ALT => Some(Self::Alt),
            keycode::COMMAND | keycode::COMMAND_RIGHT => Some(Self::Command),
            _ => None,
        }
    }

    /// Key code of the (left) key for this modifier
    pub fn code(&self) -> u32 {
        match self {
            Self::Shift => keycode::SHIFT,
            Self::Ctrl => keycode::CTRL,
            Self::Alt => keycode::ALT,
            Self::Command => keycode::COMMAND,
        }
    }

    /// Modifier named in a binding spec
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "shift" => Some(Self::Shift),
            "ctrl" => Some(Self::Ctrl),
            "alt" => Some(Self::Alt),
            "command" => Some(Self::Command),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Shift => "shift",
            Self::Ctrl => "ctrl",
            Self::Alt => "alt",
            Self::Command => "command",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

bitflags! {
    /// Unordered set of modifiers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ModifierSet: u8 {
        const SHIFT = 1 << 0;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
        const COMMAND = 1 << 3;
    }
}

impl From<Modifier> for ModifierSet {
    fn from(modifier: Modifier) -> Self {
        match modifier {
            Modifier::Shift => Self::SHIFT,
            Modifier::Ctrl => Self::CTRL,
            Modifier::Alt => Self::ALT,
            Modifier::Command => Self::COMMAND,
        }
    }
}

impl ModifierSet {
    pub fn has(&self, modifier: Modifier) -> bool {
        self.contains(modifier.into())
    }

    /// Modifiers in canonical order
    pub fn modifiers(&self) -> impl Iterator<Item = Modifier> + '_ {
        Modifier::ALL.into_iter().filter(|m| self.has(*m))
    }
}

impl fmt::Display for ModifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        let names: Vec<&str> = self.modifiers().map(|m| m.name()).collect();
        write!(f, "{}", names.join(" + "))
    }
}

/// Which modifiers are currently held on one input source
#[derive(Debug, Clone)]
pub struct ModifierTracker {
    held: ModifierSet,
    super_key: Modifier,
}

impl ModifierTracker {
    /// `super_key` is the modifier the platform treats as `super`
    pub fn new(super_key: Modifier) -> Self {
        Self {
            held: ModifierSet::empty(),
            super_key,
        }
    }

    pub fn press(&mut self, modifier: Modifier) {
        self.held.insert(modifier.into());
    }

    pub fn release(&mut self, modifier: Modifier) {
        self.held.remove(modifier.into());
    }

    pub fn clear(&mut self) {
        self.held = ModifierSet::empty();
    }

    pub fn is_held(&self, modifier: Modifier) -> bool {
        self.held.has(modifier)
    }

    pub fn any_held(&self) -> bool {
        !self.held.is_empty()
    }

    /// Whether the platform's `super` modifier is held
    pub fn super_held(&self) -> bool {
        self.is_held(self.super_key)
    }

    pub fn held(&self) -> ModifierSet {
        self.held
    }

    /// At-least match: every required modifier is held, extras are allowed
    pub fn satisfies(&self, required: ModifierSet) -> bool {
        self.held.contains(required)
    }
}
