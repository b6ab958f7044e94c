// src/core/keys.rs

//! Decodes the raw byte stream of a terminal in raw mode into editor keys.

/// A decoded keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    Insert,
    Tab,
    /// Ctrl-C
    Interrupt,
    /// Ctrl-D
    EndOfInput,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum DecodeState {
    #[default]
    Ground,
    Escape,
    /// `ESC [` followed by numeric parameters.
    Csi(String),
    /// `ESC O`, sent by some terminals for Home/End.
    Ss3,
    Utf8 {
        bytes: Vec<u8>,
        expected: usize,
    },
}

/// Byte-at-a-time key decoder. Bytes that do not complete a known key are dropped.
#[derive(Debug, Clone, Default)]
pub struct KeyDecoder {
    state: DecodeState,
}

const MAX_CSI_PARAMS: usize = 4;

impl KeyDecoder {
    /// A decoder waiting for the first byte of a key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one byte; returns a key once a complete sequence has been seen.
    pub fn feed(&mut self, byte: u8) -> Option<Key> {
        match std::mem::take(&mut self.state) {
            DecodeState::Ground => self.ground(byte),
            DecodeState::Escape => {
                match byte {
                    b'[' => self.state = DecodeState::Csi(String::new()),
                    b'O' => self.state = DecodeState::Ss3,
                    _ => log::trace!("Dropping unknown escape byte {}", byte),
                }
                None
            }
            DecodeState::Csi(mut params) => match byte {
                b'A' if params.is_empty() => Some(Key::Up),
                b'B' if params.is_empty() => Some(Key::Down),
                b'C' if params.is_empty() => Some(Key::Right),
                b'D' if params.is_empty() => Some(Key::Left),
                b'H' if params.is_empty() => Some(Key::Home),
                b'F' if params.is_empty() => Some(Key::End),
                b'0'..=b'9' | b';' if params.len() < MAX_CSI_PARAMS => {
                    params.push(byte as char);
                    self.state = DecodeState::Csi(params);
                    None
                }
                b'~' => match params.as_str() {
                    "1" | "7" => Some(Key::Home),
                    "2" => Some(Key::Insert),
                    "3" => Some(Key::Delete),
                    "4" | "8" => Some(Key::End),
                    _ => None,
                },
                _ => None,
            },
            DecodeState::Ss3 => match byte {
                b'H' => Some(Key::Home),
                b'F' => Some(Key::End),
                _ => None,
            },
            DecodeState::Utf8 {
                mut bytes,
                expected,
            } => {
                if byte & 0xC0 != 0x80 {
                    // Broken sequence; start over with this byte.
                    return self.ground(byte);
                }
                bytes.push(byte);
                if bytes.len() < expected {
                    self.state = DecodeState::Utf8 { bytes, expected };
                    return None;
                }
                std::str::from_utf8(&bytes)
                    .ok()
                    .and_then(|s| s.chars().next())
                    .map(Key::Char)
            }
        }
    }

    fn ground(&mut self, byte: u8) -> Option<Key> {
        match byte {
            13 | 10 => Some(Key::Enter),
            127 | 8 => Some(Key::Backspace),
            9 => Some(Key::Tab),
            3 => Some(Key::Interrupt),
            4 => Some(Key::EndOfInput),
            27 => {
                self.state = DecodeState::Escape;
                None
            }
            32..=126 => Some(Key::Char(byte as char)),
            0xC0..=0xF7 => {
                let expected = match byte {
                    0xC0..=0xDF => 2,
                    0xE0..=0xEF => 3,
                    _ => 4,
                };
                self.state = DecodeState::Utf8 {
                    bytes: vec![byte],
                    expected,
                };
                None
            }
            _ => None,
        }
    }
}
