//! Chord grammar parser
//!
//! Binding specs look like `"ctrl + a, shift + tab"` or `"g g"`:
//!
//! - `,` separates independent chords (a spec that is exactly `","` binds the
//!   comma key itself)
//! - `+` separates modifier names from the final key token
//! - a key token with an inner space is a sequence, matched step by step
//! - `super` means `command` on mac-like hosts and `ctrl` elsewhere
//!
//! Parsing never fails. Chords naming an unknown modifier are kept but can
//! never fire; unknown key words resolve through [`keycode::resolve`]. Use
//! [`parse_chords_strict`] to reject such specs instead.

use crate::keycode;
use crate::modifiers::{Modifier, ModifierSet};
use anyhow::{bail, Result};
use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

static COMMA_SPLIT: OnceLock<Regex> = OnceLock::new();
static PLUS_SPLIT: OnceLock<Regex> = OnceLock::new();

fn comma_split() -> &'static Regex {
    COMMA_SPLIT.get_or_init(|| Regex::new(r"\s*,\s*").expect("valid comma pattern"))
}

fn plus_split() -> &'static Regex {
    PLUS_SPLIT.get_or_init(|| Regex::new(r"\s*\+\s*").expect("valid plus pattern"))
}

/// One chord parsed out of a binding spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedChord {
    /// Key token after `super` translation (`"a"`, `"enter"`, `"g g"`)
    pub key: String,
    /// Code of the key token; unused for sequences
    pub code: u32,
    pub modifiers: ModifierSet,
    /// Modifier tokens that name no modifier, sorted
    pub unknown_modifiers: Vec<String>,
    pub is_sequence: bool,
}

impl ParsedChord {
    /// A chord requiring an unknown modifier can never be satisfied
    pub fn is_inert(&self) -> bool {
        !self.unknown_modifiers.is_empty()
    }

    /// No modifier tokens at all
    pub fn has_no_modifiers(&self) -> bool {
        self.modifiers.is_empty() && self.unknown_modifiers.is_empty()
    }

    /// Order-insensitive comparison of the modifier tokens
    pub fn same_modifiers(&self, other: &ParsedChord) -> bool {
        self.modifiers == other.modifiers && self.unknown_modifiers == other.unknown_modifiers
    }

    /// The individual key tokens of a sequence (a single token otherwise)
    pub fn steps(&self) -> Vec<&str> {
        if self.is_sequence {
            self.key.split_whitespace().collect()
        } else {
            vec![self.key.as_str()]
        }
    }
}

fn translate_super(token: &str, super_key: Modifier) -> &str {
    if token == "super" {
        super_key.name()
    } else {
        token
    }
}

fn translate_key(key: &str, super_key: Modifier) -> Cow<'_, str> {
    if !key.split_whitespace().any(|part| part == "super") {
        return Cow::Borrowed(key);
    }
    let parts: Vec<&str> = key
        .split_whitespace()
        .map(|part| translate_super(part, super_key))
        .collect();
    Cow::Owned(parts.join(" "))
}

/// Parse a binding spec into chords.
///
/// `super_key` is the modifier `super` resolves to on this host (see
/// [`crate::platform::Platform::super_modifier`]).
pub fn parse_chords(keys: &str, super_key: Modifier) -> Vec<ParsedChord> {
    let keys = keys.trim();
    let segments: Vec<&str> = if keys == "," {
        vec![","]
    } else {
        comma_split().split(keys).collect()
    };

    let mut chords = Vec::new();
    for segment in segments {
        if segment.is_empty() {
            continue;
        }

        let mut tokens: Vec<&str> = plus_split().split(segment).collect();
        let key = match tokens.pop() {
            Some(key) if !key.is_empty() => key,
            _ => ",",
        };
        let key = translate_key(key, super_key).into_owned();

        let mut modifiers = ModifierSet::empty();
        let mut unknown_modifiers = Vec::new();
        for token in tokens {
            let name = translate_super(token, super_key);
            match Modifier::from_name(name) {
                Some(modifier) => modifiers.insert(modifier.into()),
                None => unknown_modifiers.push(name.to_string()),
            }
        }
        unknown_modifiers.sort();

        let is_sequence = key.contains(' ');
        chords.push(ParsedChord {
            code: keycode::resolve(&key),
            key,
            modifiers,
            unknown_modifiers,
            is_sequence,
        });
    }

    chords
}

/// Parse a binding spec, rejecting anything the lenient grammar would turn
/// into an inert or guessed binding.
pub fn parse_chords_strict(keys: &str, super_key: Modifier) -> Result<Vec<ParsedChord>> {
    let chords = parse_chords(keys, super_key);
    if chords.is_empty() {
        bail!("No key chords in `{}`", keys);
    }

    for chord in &chords {
        if let Some(name) = chord.unknown_modifiers.first() {
            if name.is_empty() {
                bail!("Empty modifier in `{}`", keys);
            }
            bail!("Unknown modifier `{}` in `{}`", name, keys);
        }

        for step in chord.steps() {
            if step.chars().count() > 1 && !keycode::is_named(step) {
                bail!("Unknown key name `{}` in `{}`", step, keys);
            }
        }
    }

    Ok(chords)
}
