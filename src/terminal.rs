//! Translation of crossterm terminal events into [`InputEvent`]s.
//!
//! Terminals report modifiers as flags on each key rather than as key
//! events of their own (unless keyboard enhancement is on), so
//! [`TerminalInput`] remembers the last reported flags and synthesizes
//! modifier key-down/up events whenever they change.

use crate::event::{InputEvent, KeyEventKind, KeyboardEvent};
use crate::keycode;
use crate::modifiers::{Modifier, ModifierSet};
use anyhow::{Context, Result};
use crossterm::event::{
    DisableFocusChange, EnableFocusChange, Event, KeyCode, KeyEvent, KeyEventKind as TermKeyKind,
    KeyModifiers, KeyboardEnhancementFlags, ModifierKeyCode, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement};
use std::io::stdout;
use tracing::{debug, trace, warn};

/// Terminal state needed for key capture: raw mode, focus reporting and,
/// where supported, key release reporting. Whatever was switched on is
/// switched off again on drop, including when `enter` fails halfway.
#[derive(Debug, Default)]
pub struct TerminalSession {
    raw_mode: bool,
    focus_reporting: bool,
    enhanced: bool,
}

impl TerminalSession {
    pub fn enter() -> Result<Self> {
        let mut session = Self::default();
        let mut out = stdout();

        enable_raw_mode().context("Failed to enable raw mode")?;
        session.raw_mode = true;

        execute!(out, EnableFocusChange).context("Failed to enable focus reporting")?;
        session.focus_reporting = true;

        if supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                out,
                PushKeyboardEnhancementFlags(
                    KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                        | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                        | KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
                )
            )
            .context("Failed to enable keyboard enhancement")?;
            session.enhanced = true;
        }

        debug!(target: "keys", "Terminal session started (enhanced: {})", session.enhanced);
        Ok(session)
    }

    /// Whether the terminal reports key releases and bare modifier keys
    pub fn is_enhanced(&self) -> bool {
        self.enhanced
    }

    /// Undo every step `enter` completed. Each step is attempted even if an
    /// earlier one fails; the first error is returned.
    pub fn restore(&mut self) -> Result<()> {
        let mut out = stdout();
        let mut result = Ok(());

        if std::mem::take(&mut self.enhanced) {
            result = result.and(
                execute!(out, PopKeyboardEnhancementFlags)
                    .context("Failed to disable keyboard enhancement"),
            );
        }
        if std::mem::take(&mut self.focus_reporting) {
            result = result.and(
                execute!(out, DisableFocusChange).context("Failed to disable focus reporting"),
            );
        }
        if std::mem::take(&mut self.raw_mode) {
            result = result.and(disable_raw_mode().context("Failed to disable raw mode"));
        }

        result
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            warn!(target: "keys", "Terminal restore failed: {:#}", e);
        }
    }
}

/// Stateful translator from terminal events to dispatcher input
#[derive(Debug, Default)]
pub struct TerminalInput {
    held: ModifierSet,
}

impl TerminalInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Modifiers the terminal last reported as held
    pub fn held(&self) -> ModifierSet {
        self.held
    }

    pub fn translate(&mut self, event: &Event) -> Vec<InputEvent> {
        match event {
            Event::FocusGained => {
                self.held = ModifierSet::empty();
                vec![InputEvent::Focus]
            }
            Event::FocusLost => {
                self.held = ModifierSet::empty();
                Vec::new()
            }
            Event::Key(key) => self.translate_key(key),
            _ => Vec::new(),
        }
    }

    fn translate_key(&mut self, key: &KeyEvent) -> Vec<InputEvent> {
        let kind = match key.kind {
            TermKeyKind::Press | TermKeyKind::Repeat => KeyEventKind::Down,
            TermKeyKind::Release => KeyEventKind::Up,
        };

        let mut reported = modifier_flags(key.modifiers);
        if key.code == KeyCode::BackTab {
            reported.insert(ModifierSet::SHIFT);
        }

        let mut events = Vec::new();
        match key.code {
            KeyCode::Modifier(modifier_key) => {
                let Some(modifier) = modifier_from_key(modifier_key) else {
                    return events;
                };
                // the key's own flag is handled by its event, not synthesized
                let own: ModifierSet = modifier.into();
                self.sync(reported - own, own, &mut events);

                events.push(KeyboardEvent::new(kind, modifier_code(modifier_key)).into());
                match kind {
                    KeyEventKind::Down => self.held.insert(own),
                    KeyEventKind::Up => self.held.remove(own),
                }
            }
            code => {
                let Some(code) = key_code(code) else {
                    trace!(target: "keys", "No key code for {:?}", key.code);
                    return events;
                };
                self.sync(reported, ModifierSet::empty(), &mut events);
                events.push(KeyboardEvent::new(kind, code).into());
            }
        }

        events
    }

    /// Emit modifier events that bring `held` in line with `reported`,
    /// leaving the modifiers in `skip` alone
    fn sync(&mut self, reported: ModifierSet, skip: ModifierSet, events: &mut Vec<InputEvent>) {
        for modifier in Modifier::ALL {
            let flag: ModifierSet = modifier.into();
            if skip.contains(flag) {
                continue;
            }
            let was_held = self.held.contains(flag);
            let is_held = reported.contains(flag);
            if is_held && !was_held {
                events.push(InputEvent::key_down(modifier.code()));
            } else if was_held && !is_held {
                events.push(InputEvent::key_up(modifier.code()));
            }
        }
        self.held = (self.held & skip) | (reported - skip);
    }
}

fn modifier_flags(flags: KeyModifiers) -> ModifierSet {
    let mut set = ModifierSet::empty();
    if flags.contains(KeyModifiers::SHIFT) {
        set.insert(ModifierSet::SHIFT);
    }
    if flags.contains(KeyModifiers::CONTROL) {
        set.insert(ModifierSet::CTRL);
    }
    if flags.contains(KeyModifiers::ALT) {
        set.insert(ModifierSet::ALT);
    }
    if flags.contains(KeyModifiers::SUPER) {
        set.insert(ModifierSet::COMMAND);
    }
    set
}

fn modifier_from_key(key: ModifierKeyCode) -> Option<Modifier> {
    match key {
        ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift => Some(Modifier::Shift),
        ModifierKeyCode::LeftControl | ModifierKeyCode::RightControl => Some(Modifier::Ctrl),
        ModifierKeyCode::LeftAlt | ModifierKeyCode::RightAlt => Some(Modifier::Alt),
        ModifierKeyCode::LeftSuper | ModifierKeyCode::RightSuper => Some(Modifier::Command),
        _ => None,
    }
}

fn modifier_code(key: ModifierKeyCode) -> u32 {
    match key {
        ModifierKeyCode::RightSuper => keycode::COMMAND_RIGHT,
        other => modifier_from_key(other)
            .map(|modifier| modifier.code())
            .unwrap_or_default(),
    }
}

fn key_code(code: KeyCode) -> Option<u32> {
    let code = match code {
        KeyCode::Backspace => keycode::BACKSPACE,
        KeyCode::Enter => keycode::ENTER,
        KeyCode::Left => keycode::LEFT,
        KeyCode::Right => keycode::RIGHT,
        KeyCode::Up => keycode::UP,
        KeyCode::Down => keycode::DOWN,
        KeyCode::Home => keycode::HOME,
        KeyCode::End => keycode::END,
        KeyCode::PageUp => keycode::PAGE_UP,
        KeyCode::PageDown => keycode::PAGE_DOWN,
        KeyCode::Tab | KeyCode::BackTab => keycode::TAB,
        KeyCode::Delete => keycode::DELETE,
        KeyCode::Insert => keycode::INSERT,
        KeyCode::Esc => keycode::ESCAPE,
        KeyCode::CapsLock => keycode::CAPSLOCK,
        KeyCode::F(n) if (1..=12).contains(&n) => keycode::F1 + u32::from(n) - 1,
        KeyCode::Char(c) => keycode::resolve(c.encode_utf8(&mut [0; 4])),
        _ => return None,
    };
    Some(code)
}
