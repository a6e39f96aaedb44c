//! Translation tables from backend key identifiers to raw inputs
//!
//! Letters and digits become [`RawInput::Char`], sided modifiers become named
//! keys (`ctrl_l`, `shift_r`, ...) and the numeric keypad becomes Windows
//! virtual-key codes, so every backend lands in the same token space after
//! normalization.

use super::{MouseButton, RawInput};

/// Windows virtual-key codes for the numeric keypad
pub mod vk {
    pub const NUMPAD0: u32 = 0x60;
    pub const MULTIPLY: u32 = 0x6A;
    pub const ADD: u32 = 0x6B;
    pub const SUBTRACT: u32 = 0x6D;
    pub const DECIMAL: u32 = 0x6E;
    pub const DIVIDE: u32 = 0x6F;
}

fn numpad_digit(n: u32) -> RawInput {
    RawInput::Code(vk::NUMPAD0 + n)
}

/// Map a device_query keycode to a raw input
pub fn from_device_query(keycode: device_query::Keycode) -> Option<RawInput> {
    use device_query::Keycode as DK;
    let raw = match keycode {
        DK::A => RawInput::Char('a'),
        DK::B => RawInput::Char('b'),
        DK::C => RawInput::Char('c'),
        DK::D => RawInput::Char('d'),
        DK::E => RawInput::Char('e'),
        DK::F => RawInput::Char('f'),
        DK::G => RawInput::Char('g'),
        DK::H => RawInput::Char('h'),
        DK::I => RawInput::Char('i'),
        DK::J => RawInput::Char('j'),
        DK::K => RawInput::Char('k'),
        DK::L => RawInput::Char('l'),
        DK::M => RawInput::Char('m'),
        DK::N => RawInput::Char('n'),
        DK::O => RawInput::Char('o'),
        DK::P => RawInput::Char('p'),
        DK::Q => RawInput::Char('q'),
        DK::R => RawInput::Char('r'),
        DK::S => RawInput::Char('s'),
        DK::T => RawInput::Char('t'),
        DK::U => RawInput::Char('u'),
        DK::V => RawInput::Char('v'),
        DK::W => RawInput::Char('w'),
        DK::X => RawInput::Char('x'),
        DK::Y => RawInput::Char('y'),
        DK::Z => RawInput::Char('z'),
        DK::Key0 => RawInput::Char('0'),
        DK::Key1 => RawInput::Char('1'),
        DK::Key2 => RawInput::Char('2'),
        DK::Key3 => RawInput::Char('3'),
        DK::Key4 => RawInput::Char('4'),
        DK::Key5 => RawInput::Char('5'),
        DK::Key6 => RawInput::Char('6'),
        DK::Key7 => RawInput::Char('7'),
        DK::Key8 => RawInput::Char('8'),
        DK::Key9 => RawInput::Char('9'),
        DK::Minus => RawInput::Char('-'),
        DK::Equal => RawInput::Char('='),
        DK::LeftBracket => RawInput::Char('['),
        DK::RightBracket => RawInput::Char(']'),
        DK::BackSlash => RawInput::Char('\\'),
        DK::Semicolon => RawInput::Char(';'),
        DK::Apostrophe => RawInput::Char('\''),
        DK::Grave => RawInput::Char('`'),
        DK::Comma => RawInput::Char(','),
        DK::Dot => RawInput::Char('.'),
        DK::Slash => RawInput::Char('/'),
        DK::Escape => RawInput::named("escape"),
        DK::Backspace => RawInput::named("backspace"),
        DK::Tab => RawInput::named("tab"),
        DK::Enter => RawInput::named("enter"),
        DK::Space => RawInput::named("space"),
        DK::CapsLock => RawInput::named("caps_lock"),
        DK::LControl => RawInput::named("ctrl_l"),
        DK::RControl => RawInput::named("ctrl_r"),
        DK::LShift => RawInput::named("shift_l"),
        DK::RShift => RawInput::named("shift_r"),
        DK::LAlt => RawInput::named("alt_l"),
        DK::RAlt => RawInput::named("alt_r"),
        DK::LMeta => RawInput::named("cmd_l"),
        DK::RMeta => RawInput::named("cmd_r"),
        DK::F1 => RawInput::named("f1"),
        DK::F2 => RawInput::named("f2"),
        DK::F3 => RawInput::named("f3"),
        DK::F4 => RawInput::named("f4"),
        DK::F5 => RawInput::named("f5"),
        DK::F6 => RawInput::named("f6"),
        DK::F7 => RawInput::named("f7"),
        DK::F8 => RawInput::named("f8"),
        DK::F9 => RawInput::named("f9"),
        DK::F10 => RawInput::named("f10"),
        DK::F11 => RawInput::named("f11"),
        DK::F12 => RawInput::named("f12"),
        DK::Home => RawInput::named("home"),
        DK::End => RawInput::named("end"),
        DK::PageUp => RawInput::named("page_up"),
        DK::PageDown => RawInput::named("page_down"),
        DK::Insert => RawInput::named("insert"),
        DK::Delete => RawInput::named("delete"),
        DK::Up => RawInput::named("up"),
        DK::Down => RawInput::named("down"),
        DK::Left => RawInput::named("left"),
        DK::Right => RawInput::named("right"),
        DK::Numpad0 => numpad_digit(0),
        DK::Numpad1 => numpad_digit(1),
        DK::Numpad2 => numpad_digit(2),
        DK::Numpad3 => numpad_digit(3),
        DK::Numpad4 => numpad_digit(4),
        DK::Numpad5 => numpad_digit(5),
        DK::Numpad6 => numpad_digit(6),
        DK::Numpad7 => numpad_digit(7),
        DK::Numpad8 => numpad_digit(8),
        DK::Numpad9 => numpad_digit(9),
        DK::NumpadMultiply => RawInput::Code(vk::MULTIPLY),
        DK::NumpadAdd => RawInput::Code(vk::ADD),
        DK::NumpadSubtract => RawInput::Code(vk::SUBTRACT),
        DK::NumpadDecimal => RawInput::Code(vk::DECIMAL),
        DK::NumpadDivide => RawInput::Code(vk::DIVIDE),
        _ => return None,
    };
    Some(raw)
}

/// Map a device_query mouse button index to a button.
///
/// Index 0 is unused by device_query.
#[cfg(target_os = "linux")]
pub fn from_mouse_index(index: usize) -> Option<MouseButton> {
    // X11 pointer state only covers buttons 1..=5 and 4/5 are the wheel.
    // Side buttons come from the evdev backend instead.
    match index {
        0 | 4 | 5 => None,
        1 => Some(MouseButton::Left),
        2 => Some(MouseButton::Middle),
        3 => Some(MouseButton::Right),
        n => Some(MouseButton::Other(n.min(u8::MAX as usize) as u8)),
    }
}

/// Map a device_query mouse button index to a button.
///
/// Index 0 is unused by device_query.
#[cfg(not(target_os = "linux"))]
pub fn from_mouse_index(index: usize) -> Option<MouseButton> {
    match index {
        0 => None,
        1 => Some(MouseButton::Left),
        2 => Some(MouseButton::Right),
        3 => Some(MouseButton::Middle),
        4 => Some(MouseButton::X1),
        5 => Some(MouseButton::X2),
        n => Some(MouseButton::Other(n.min(u8::MAX as usize) as u8)),
    }
}

/// evdev button codes (`BTN_LEFT` .. `BTN_EXTRA`)
const BTN_LEFT: u16 = 0x110;
const BTN_RIGHT: u16 = 0x111;
const BTN_MIDDLE: u16 = 0x112;
const BTN_SIDE: u16 = 0x113;
const BTN_EXTRA: u16 = 0x114;

/// Map a Linux evdev scancode to a raw input
pub fn from_scancode(code: u16) -> Option<RawInput> {
    let raw = match code {
        1 => RawInput::named("escape"),
        2..=10 => RawInput::Char(char::from(b'0' + (code - 1) as u8)),
        11 => RawInput::Char('0'),
        12 => RawInput::Char('-'),
        13 => RawInput::Char('='),
        14 => RawInput::named("backspace"),
        15 => RawInput::named("tab"),
        16 => RawInput::Char('q'),
        17 => RawInput::Char('w'),
        18 => RawInput::Char('e'),
        19 => RawInput::Char('r'),
        20 => RawInput::Char('t'),
        21 => RawInput::Char('y'),
        22 => RawInput::Char('u'),
        23 => RawInput::Char('i'),
        24 => RawInput::Char('o'),
        25 => RawInput::Char('p'),
        26 => RawInput::Char('['),
        27 => RawInput::Char(']'),
        28 => RawInput::named("enter"),
        29 => RawInput::named("ctrl_l"),
        30 => RawInput::Char('a'),
        31 => RawInput::Char('s'),
        32 => RawInput::Char('d'),
        33 => RawInput::Char('f'),
        34 => RawInput::Char('g'),
        35 => RawInput::Char('h'),
        36 => RawInput::Char('j'),
        37 => RawInput::Char('k'),
        38 => RawInput::Char('l'),
        39 => RawInput::Char(';'),
        40 => RawInput::Char('\''),
        41 => RawInput::Char('`'),
        42 => RawInput::named("shift_l"),
        43 => RawInput::Char('\\'),
        44 => RawInput::Char('z'),
        45 => RawInput::Char('x'),
        46 => RawInput::Char('c'),
        47 => RawInput::Char('v'),
        48 => RawInput::Char('b'),
        49 => RawInput::Char('n'),
        50 => RawInput::Char('m'),
        51 => RawInput::Char(','),
        52 => RawInput::Char('.'),
        53 => RawInput::Char('/'),
        54 => RawInput::named("shift_r"),
        55 => RawInput::Code(vk::MULTIPLY),
        56 => RawInput::named("alt_l"),
        57 => RawInput::named("space"),
        58 => RawInput::named("caps_lock"),
        59..=68 => RawInput::Named(format!("f{}", code - 58)),
        // Keypad rows: 7 8 9 -, 4 5 6 +, 1 2 3, 0 .
        71 => numpad_digit(7),
        72 => numpad_digit(8),
        73 => numpad_digit(9),
        74 => RawInput::Code(vk::SUBTRACT),
        75 => numpad_digit(4),
        76 => numpad_digit(5),
        77 => numpad_digit(6),
        78 => RawInput::Code(vk::ADD),
        79 => numpad_digit(1),
        80 => numpad_digit(2),
        81 => numpad_digit(3),
        82 => numpad_digit(0),
        83 => RawInput::Code(vk::DECIMAL),
        87 => RawInput::named("f11"),
        88 => RawInput::named("f12"),
        97 => RawInput::named("ctrl_r"),
        98 => RawInput::Code(vk::DIVIDE),
        100 => RawInput::named("alt_r"),
        102 => RawInput::named("home"),
        103 => RawInput::named("up"),
        104 => RawInput::named("page_up"),
        105 => RawInput::named("left"),
        106 => RawInput::named("right"),
        107 => RawInput::named("end"),
        108 => RawInput::named("down"),
        109 => RawInput::named("page_down"),
        110 => RawInput::named("insert"),
        111 => RawInput::named("delete"),
        125 => RawInput::named("cmd_l"),
        126 => RawInput::named("cmd_r"),
        BTN_LEFT => RawInput::Mouse(MouseButton::Left),
        BTN_RIGHT => RawInput::Mouse(MouseButton::Right),
        BTN_MIDDLE => RawInput::Mouse(MouseButton::Middle),
        BTN_SIDE => RawInput::Mouse(MouseButton::X1),
        BTN_EXTRA => RawInput::Mouse(MouseButton::X2),
        _ => return None,
    };
    Some(raw)
}
