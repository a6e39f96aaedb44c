//! Canonical token space shared by every input source
//!
//! Backends describe inputs in whatever terms they have (characters, key
//! names, virtual-key codes, mouse buttons). Everything downstream of the
//! aggregator only ever sees [`Token`]s, so a combo written as `ctrl+q` in the
//! counter file matches regardless of which backend saw the keys.

use super::{MouseButton, RawInput};
use std::borrow::Borrow;
use std::fmt;

/// Canonical lowercase name of one physical input source
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(String);

/// Left/right variants and verbose names collapsed to one short form
const ALIASES: &[(&str, &str)] = &[
    ("control", "ctrl"),
    ("ctrl_l", "ctrl"),
    ("ctrl_r", "ctrl"),
    ("shift_l", "shift"),
    ("shift_r", "shift"),
    ("alt_l", "alt"),
    ("alt_r", "alt"),
    ("windows", "cmd"),
    ("win", "cmd"),
    ("cmd_l", "cmd"),
    ("cmd_r", "cmd"),
    ("escape", "esc"),
];

/// Windows virtual-key codes for the letters A-Z
const VK_A: u32 = 0x41;
const VK_Z: u32 = 0x5A;

/// Windows virtual-key codes of the numeric keypad
const NUMPAD_CODES: &[(u32, &str)] = &[
    (0x60, "num0"),
    (0x61, "num1"),
    (0x62, "num2"),
    (0x63, "num3"),
    (0x64, "num4"),
    (0x65, "num5"),
    (0x66, "num6"),
    (0x67, "num7"),
    (0x68, "num8"),
    (0x69, "num9"),
    (0x6A, "num_multiply"),
    (0x6B, "num_add"),
    (0x6D, "num_subtract"),
    (0x6E, "num_decimal"),
    (0x6F, "num_divide"),
];

impl Token {
    /// Normalize a key name, applying the alias table.
    ///
    /// This is also how combo segments are read, so `Control`, `ctrl_l` and
    /// `ctrl` all produce the same token.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        if lower.is_empty() {
            return None;
        }
        let canonical = ALIASES
            .iter()
            .find(|(alias, _)| *alias == lower)
            .map(|(_, short)| (*short).to_string())
            .unwrap_or(lower);
        Some(Self(canonical))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Token {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Map a raw backend identifier to its token, or `None` if it is not one we know.
pub fn normalize(raw: &RawInput) -> Option<Token> {
    match raw {
        RawInput::Char(c) => from_char(*c),
        RawInput::Named(name) => Token::from_name(name),
        RawInput::Code(code) => from_code(*code),
        RawInput::Mouse(button) => from_mouse(*button),
    }
}

fn from_char(c: char) -> Option<Token> {
    if c.is_control() || c.is_whitespace() {
        return None;
    }
    Some(Token(c.to_lowercase().collect()))
}

fn from_code(code: u32) -> Option<Token> {
    if (VK_A..=VK_Z).contains(&code) {
        let letter = char::from(b'a' + (code - VK_A) as u8);
        return Some(Token(letter.to_string()));
    }
    NUMPAD_CODES
        .iter()
        .find(|(vk, _)| *vk == code)
        .map(|(_, name)| Token((*name).to_string()))
}

fn from_mouse(button: MouseButton) -> Option<Token> {
    let name = match button {
        MouseButton::Left => "mouse_left",
        MouseButton::Right => "mouse_right",
        MouseButton::Middle => "mouse_middle",
        MouseButton::X1 => "mouse4",
        MouseButton::X2 => "mouse5",
        MouseButton::Other(_) => return None,
    };
    Some(Token(name.to_string()))
}
