//! Key-symbol table
//!
//! Maps the human-readable key names used in binding specs (`"enter"`,
//! `"shift"`, `","`) to the numeric key codes carried by keyboard events,
//! and back again for display.

pub const BACKSPACE: u32 = 8;
pub const TAB: u32 = 9;
pub const CLEAR: u32 = 12;
pub const ENTER: u32 = 13;
pub const SHIFT: u32 = 16;
pub const CTRL: u32 = 17;
pub const ALT: u32 = 18;
pub const CAPSLOCK: u32 = 20;
pub const ESCAPE: u32 = 27;
pub const SPACE: u32 = 32;
pub const PAGE_UP: u32 = 33;
pub const PAGE_DOWN: u32 = 34;
pub const END: u32 = 35;
pub const HOME: u32 = 36;
pub const LEFT: u32 = 37;
pub const UP: u32 = 38;
pub const RIGHT: u32 = 39;
pub const DOWN: u32 = 40;
pub const INSERT: u32 = 45;
pub const DELETE: u32 = 46;
pub const COMMAND: u32 = 91;
/// Right-hand command key; tracked as the same modifier as [`COMMAND`]
pub const COMMAND_RIGHT: u32 = 93;
pub const F1: u32 = 112;
pub const COMMA: u32 = 188;

/// Sequence step that accepts any key (the code of `*`)
pub const WILDCARD: u32 = 42;

/// Named keys, canonical name first for each code
const NAMED_KEYS: &[(&str, u32)] = &[
    ("backspace", BACKSPACE),
    ("command", COMMAND),
    ("tab", TAB),
    ("clear", CLEAR),
    ("enter", ENTER),
    ("shift", SHIFT),
    ("ctrl", CTRL),
    ("alt", ALT),
    ("capslock", CAPSLOCK),
    ("escape", ESCAPE),
    ("esc", ESCAPE),
    ("space", SPACE),
    ("pageup", PAGE_UP),
    ("pagedown", PAGE_DOWN),
    ("end", END),
    ("home", HOME),
    ("left", LEFT),
    ("up", UP),
    ("right", RIGHT),
    ("down", DOWN),
    ("insert", INSERT),
    ("delete", DELETE),
    ("del", DELETE),
    ("f1", F1),
    ("f2", F1 + 1),
    ("f3", F1 + 2),
    ("f4", F1 + 3),
    ("f5", F1 + 4),
    ("f6", F1 + 5),
    ("f7", F1 + 6),
    ("f8", F1 + 7),
    ("f9", F1 + 8),
    ("f10", F1 + 9),
    ("f11", F1 + 10),
    ("f12", F1 + 11),
    ("comma", COMMA),
    (",", COMMA),
    (".", 190),
    ("/", 191),
    ("`", 192),
    ("-", 189),
    ("=", 187),
    (";", 186),
    ("[", 219),
    ("\\", 220),
    ("]", 221),
    ("'", 222),
];

// Names match without regard to case, so "Up" is the arrow key (38) and
// never the letter U.
fn lookup(name: &str) -> Option<u32> {
    NAMED_KEYS
        .iter()
        .find(|(named, _)| named.eq_ignore_ascii_case(name))
        .map(|&(_, code)| code)
}

/// Resolve a key name to its key code.
///
/// Named keys come from the fixed table and match in any case. Anything else resolves to the code
/// of its upper-cased first character, so `"a"` and `"A"` are both 65 and an
/// unknown word like `"foo"` degenerates to the code of `F`. The empty name
/// resolves to 0, which no real key produces.
pub fn resolve(name: &str) -> u32 {
    if let Some(code) = lookup(name) {
        return code;
    }

    name.chars()
        .next()
        .map(|c| c.to_uppercase().next().unwrap_or(c) as u32)
        .unwrap_or(0)
}

/// Whether `name` is one of the named keys in the table
pub fn is_named(name: &str) -> bool {
    lookup(name).is_some()
}

/// Human-readable name for a key code
pub fn describe(code: u32) -> String {
    if let Some((name, _)) = NAMED_KEYS.iter().find(|(_, named)| *named == code) {
        return (*name).to_string();
    }
    if code == COMMAND_RIGHT {
        return "command".to_string();
    }

    match char::from_u32(code) {
        Some(c) if c.is_ascii_alphanumeric() => c.to_ascii_lowercase().to_string(),
        Some(c) if code == WILDCARD => c.to_string(),
        _ => format!("#{}", code),
    }
}
