use std::collections::VecDeque;
use crate::HalResult;
use crate::keyboard::{Key, Keyboard};

/// A keyboard replaying a fixed sequence of keys, then reporting the end of input.
#[derive(Debug, Default)]
pub struct ScriptedKeyboard {
    keys: VecDeque<Key>,
}

impl ScriptedKeyboard {
    pub fn new(keys: impl IntoIterator<Item = Key>) -> Self {
        Self { keys: keys.into_iter().collect() }
    }

    /// Creates a keyboard typing out every character of `text`.
    pub fn typing(text: &str) -> Self {
        Self::new(text.chars().map(Key::Char))
    }

    /// Gets the number of keys not read yet.
    pub fn remaining(&self) -> usize {
        self.keys.len()
    }
}

impl Keyboard for ScriptedKeyboard {
    fn read_key(&mut self) -> HalResult<Key> {
        Ok(self.keys.pop_front().unwrap_or(Key::EndOfInput))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_then_ends() {
        let mut keyboard = ScriptedKeyboard::typing("wa");
        assert_eq!(keyboard.read_key(), Ok(Key::Char('w')));
        assert_eq!(keyboard.remaining(), 1);
        assert_eq!(keyboard.read_key(), Ok(Key::Char('a')));
        assert_eq!(keyboard.read_key(), Ok(Key::EndOfInput));
        assert_eq!(keyboard.read_key(), Ok(Key::EndOfInput));
    }
}
