mod scripted;
mod terminal;

use std::fmt::Debug;
use crate::HalResult;
pub use scripted::*;
pub use terminal::*;

/// The ASCII control code produced by Ctrl-C when the terminal is in raw mode.
pub const ETX: u8 = 0x03;

/// A single keystroke, as read from a [Keyboard].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Key {
    /// A printable (or at least decodable) character.
    Char(char),
    /// The operator pressed Ctrl-C.
    Interrupt,
    /// The input stream is closed; no more keys will arrive.
    EndOfInput,
}

impl Key {
    /// Decodes a single raw byte. Bytes above `0x7F` are taken as Latin-1.
    pub fn from_byte(byte: u8) -> Key {
        match byte {
            ETX => Key::Interrupt,
            _ => Key::Char(byte as char),
        }
    }
}

/// The `Keyboard` trait defines the interface for keystroke sources.
pub trait Keyboard: Debug {
    /// Blocks until a single key is available and returns it.
    fn read_key(&mut self) -> HalResult<Key>;
}
