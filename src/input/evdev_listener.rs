//! Raw evdev-based input backend for Linux
//!
//! Reads kernel input events straight from `/dev/input/event*`. It runs next
//! to the device_query backends and catches presses the X11 query misses
//! (short taps between polls, keys grabbed by other clients, and mouse side
//! buttons, which X11 pointer state does not report). Overlapping reports are
//! dropped by the aggregator.

use super::{keymap, BackendError, InputBackend, RawEvent};
use log::debug;
use nix::libc;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Read};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for evdev operations
#[derive(Debug, Error)]
pub enum EvdevError {
    /// No keyboard or side-button mouse found
    #[error("No keyboard or mouse devices found")]
    NoDevices,
    /// Permission denied accessing device
    #[error("Permission denied accessing {0}")]
    PermissionDenied(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Device enumeration failed
    #[error("Device enumeration failed: {0}")]
    EnumerationFailed(String),
}

impl From<EvdevError> for BackendError {
    fn from(e: EvdevError) -> Self {
        match e {
            EvdevError::Io(source) => BackendError::Io {
                backend: "evdev",
                source,
            },
            other => BackendError::Unavailable {
                backend: "evdev",
                reason: other.to_string(),
            },
        }
    }
}

/// A raw input event from the kernel
#[repr(C)]
#[derive(Debug, Clone, Copy)]
struct InputEvent {
    tv_sec: i64,
    tv_usec: i64,
    event_type: u16,
    code: u16,
    value: i32,
}

const EV_KEY: u16 = 0x01;
const INPUT_EVENT_SIZE: usize = std::mem::size_of::<InputEvent>();

/// Key event values: 0 = release, 1 = press, 2 = autorepeat
const KEY_RELEASE: i32 = 0;
const KEY_REPEAT: i32 = 2;

/// Scancodes used to recognise devices worth reading
const KEY_ESC: u16 = 1;
const KEY_Q: u16 = 16;
const BTN_SIDE: u16 = 0x113;
const BTN_EXTRA: u16 = 0x114;

/// Width of one word in the sysfs capability bitmap (a C `long`)
const CAP_WORD_BITS: usize = usize::BITS as usize;

/// What an event device is read for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeviceKind {
    Keyboard,
    /// A mouse with side buttons, which X11 polling cannot see
    Pointer,
}

/// Key capability bitmap of one device, as exported under /sys/class/input
struct KeyCaps {
    /// Least significant word first
    words: Vec<u64>,
}

impl KeyCaps {
    /// Parse the space-separated hex words sysfs prints, most significant first
    fn parse(text: &str) -> Self {
        let words = text
            .split_whitespace()
            .rev()
            .map(|hex| u64::from_str_radix(hex, 16).unwrap_or(0))
            .collect();
        Self { words }
    }

    fn has(&self, code: u16) -> bool {
        let code = code as usize;
        self.words
            .get(code / CAP_WORD_BITS)
            .is_some_and(|word| word & (1u64 << (code % CAP_WORD_BITS)) != 0)
    }

    fn kind(&self) -> Option<DeviceKind> {
        if self.has(KEY_Q) && self.has(KEY_ESC) {
            Some(DeviceKind::Keyboard)
        } else if self.has(BTN_SIDE) || self.has(BTN_EXTRA) {
            Some(DeviceKind::Pointer)
        } else {
            None
        }
    }
}

/// Classify an event device from sysfs, or `None` if it has nothing we count
fn device_kind(event_name: &str) -> Option<DeviceKind> {
    let sys = Path::new("/sys/class/input").join(event_name).join("device");

    if let Ok(caps) = fs::read_to_string(sys.join("capabilities/key")) {
        return KeyCaps::parse(&caps).kind();
    }

    // No capability file: go by the advertised name
    let name = fs::read_to_string(sys.join("name")).ok()?.to_lowercase();
    if name.contains("keyboard") || name.contains("kbd") {
        Some(DeviceKind::Keyboard)
    } else if name.contains("mouse") {
        Some(DeviceKind::Pointer)
    } else {
        None
    }
}

/// Event devices that are keyboards or mice with side buttons
fn find_input_devices() -> Result<Vec<(PathBuf, DeviceKind)>, EvdevError> {
    let entries = fs::read_dir("/dev/input")
        .map_err(|e| EvdevError::EnumerationFailed(format!("/dev/input: {}", e)))?;

    let devices: Vec<_> = entries
        .flatten()
        .filter_map(|entry| {
            let path = entry.path();
            let name = path.file_name()?.to_str()?;
            if !name.starts_with("event") {
                return None;
            }
            let kind = device_kind(name)?;
            Some((path, kind))
        })
        .collect();

    if devices.is_empty() {
        return Err(EvdevError::NoDevices);
    }
    Ok(devices)
}

/// Evdev-based keyboard and side-button backend
pub struct EvdevListener {
    devices: Vec<File>,
    pressed_keys: HashSet<u16>,
    buffer: Vec<u8>,
}

impl EvdevListener {
    /// Open every readable keyboard and side-button mouse in non-blocking mode
    pub fn new() -> Result<Self, EvdevError> {
        let mut devices = Vec::new();

        for (path, kind) in find_input_devices()? {
            match File::open(&path) {
                Ok(file) => {
                    let fd = file.as_raw_fd();
                    unsafe {
                        let flags = libc::fcntl(fd, libc::F_GETFL);
                        libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK);
                    }
                    debug!("evdev: opened {} ({:?})", path.display(), kind);
                    devices.push(file);
                }
                Err(e) if e.kind() == io::ErrorKind::PermissionDenied => continue,
                Err(e) => return Err(EvdevError::Io(e)),
            }
        }

        if devices.is_empty() {
            return Err(EvdevError::PermissionDenied(
                "every input device (add the user to the 'input' group)".to_string(),
            ));
        }

        Ok(Self {
            devices,
            pressed_keys: HashSet::new(),
            buffer: vec![0u8; INPUT_EVENT_SIZE * 64],
        })
    }

    /// Get the number of opened devices
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Turn one kernel event into a raw event, tracking pressed scancodes
    fn translate(&mut self, input_event: &InputEvent) -> Option<RawEvent> {
        if input_event.event_type != EV_KEY || input_event.value == KEY_REPEAT {
            return None;
        }
        let scancode = input_event.code;
        if input_event.value == KEY_RELEASE {
            self.pressed_keys.remove(&scancode);
            keymap::from_scancode(scancode).map(RawEvent::release)
        } else if self.pressed_keys.insert(scancode) {
            keymap::from_scancode(scancode).map(RawEvent::press)
        } else {
            None
        }
    }
}

impl InputBackend for EvdevListener {
    fn name(&self) -> &'static str {
        "evdev"
    }

    fn poll(&mut self, out: &mut Vec<RawEvent>) -> Result<(), BackendError> {
        let mut events = Vec::new();

        for device in &mut self.devices {
            loop {
                match device.read(&mut self.buffer) {
                    Ok(bytes_read) if bytes_read >= INPUT_EVENT_SIZE => {
                        let num_events = bytes_read / INPUT_EVENT_SIZE;
                        for i in 0..num_events {
                            let offset = i * INPUT_EVENT_SIZE;
                            let event_bytes = &self.buffer[offset..offset + INPUT_EVENT_SIZE];
                            let input_event: InputEvent = unsafe {
                                std::ptr::read_unaligned(event_bytes.as_ptr() as *const InputEvent)
                            };
                            events.push(input_event);
                        }
                    }
                    Ok(_) => break,
                    Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                    Err(e) => {
                        return Err(BackendError::Io {
                            backend: "evdev",
                            source: e,
                        })
                    }
                }
            }
        }

        for input_event in &events {
            if let Some(event) = self.translate(input_event) {
                out.push(event);
            }
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BackendError> {
        self.devices.clear();
        self.pressed_keys.clear();
        Ok(())
    }
}

/// Get a status message about evdev availability
pub fn evdev_status() -> String {
    match find_input_devices() {
        Ok(devices) => {
            let pointers = devices
                .iter()
                .filter(|(_, kind)| *kind == DeviceKind::Pointer)
                .count();
            format!(
                "{} keyboard(s), {} side-button mouse(s)",
                devices.len() - pointers,
                pointers
            )
        }
        Err(EvdevError::NoDevices) => "No keyboard or mouse devices found".to_string(),
        Err(EvdevError::PermissionDenied(_)) => {
            "Permission denied - add user to 'input' group".to_string()
        }
        Err(e) => format!("Error: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputEventType, RawInput};

    fn key_event(code: u16, value: i32) -> InputEvent {
        InputEvent {
            tv_sec: 0,
            tv_usec: 0,
            event_type: EV_KEY,
            code,
            value,
        }
    }

    fn empty_listener() -> EvdevListener {
        EvdevListener {
            devices: Vec::new(),
            pressed_keys: HashSet::new(),
            buffer: Vec::new(),
        }
    }

    #[test]
    fn translate_skips_repeats_and_duplicate_presses() {
        let mut listener = empty_listener();

        let press = listener.translate(&key_event(16, 1)).unwrap();
        assert_eq!(press.input, RawInput::Char('q'));
        assert_eq!(press.event_type, InputEventType::Press);

        assert!(listener.translate(&key_event(16, KEY_REPEAT)).is_none());
        assert!(listener.translate(&key_event(16, 1)).is_none());

        let release = listener.translate(&key_event(16, KEY_RELEASE)).unwrap();
        assert_eq!(release.event_type, InputEventType::Release);
    }

    #[test]
    fn translate_ignores_non_key_events() {
        let mut listener = empty_listener();
        let mut event = key_event(16, 1);
        event.event_type = 0x02; // EV_REL
        assert!(listener.translate(&event).is_none());
    }

    /// Render a capability bitmap the way sysfs prints it
    fn sysfs_caps(codes: &[u16]) -> String {
        let max = codes.iter().copied().max().unwrap_or(0) as usize;
        let mut words = vec![0u64; max / CAP_WORD_BITS + 1];
        for &code in codes {
            let code = code as usize;
            words[code / CAP_WORD_BITS] |= 1u64 << (code % CAP_WORD_BITS);
        }
        words
            .iter()
            .rev()
            .map(|w| format!("{:x}", w))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn keyboard_caps_classified_as_keyboard() {
        let caps = KeyCaps::parse(&sysfs_caps(&[KEY_ESC, 2, 3, KEY_Q, 18, 30, 57]));
        assert!(caps.has(KEY_Q));
        assert!(!caps.has(BTN_SIDE));
        assert_eq!(caps.kind(), Some(DeviceKind::Keyboard));
    }

    #[test]
    fn side_button_mouse_classified_as_pointer() {
        let caps = KeyCaps::parse(&sysfs_caps(&[0x110, 0x111, 0x112, BTN_SIDE, BTN_EXTRA]));
        assert!(caps.has(BTN_EXTRA));
        assert_eq!(caps.kind(), Some(DeviceKind::Pointer));
    }

    #[test]
    fn plain_mouse_and_empty_caps_ignored() {
        let caps = KeyCaps::parse(&sysfs_caps(&[0x110, 0x111, 0x112]));
        assert_eq!(caps.kind(), None);
        assert_eq!(KeyCaps::parse("0").kind(), None);
        assert_eq!(KeyCaps::parse("").kind(), None);
    }

    #[test]
    fn pointer_side_buttons_become_mouse4_and_mouse5() {
        let mut listener = empty_listener();
        let side = listener.translate(&key_event(BTN_SIDE, 1)).unwrap();
        let extra = listener.translate(&key_event(BTN_EXTRA, 1)).unwrap();
        assert_eq!(side.input, RawInput::Mouse(crate::input::MouseButton::X1));
        assert_eq!(extra.input, RawInput::Mouse(crate::input::MouseButton::X2));
    }

    #[test]
    fn device_discovery_does_not_panic() {
        // Usually fails without permissions in a test environment
        match find_input_devices() {
            Ok(devices) => println!("Found {} devices", devices.len()),
            Err(e) => println!("No devices: {}", e),
        }
    }

    #[test]
    fn test_evdev_status() {
        assert!(!evdev_status().is_empty());
    }

    #[test]
    fn evdev_error_converts_to_backend_error() {
        let err: BackendError = EvdevError::NoDevices.into();
        assert!(err.to_string().contains("evdev"));
    }
}
