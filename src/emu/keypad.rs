use crate::u4;

/// How host key events are latched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeypadMode {
    /// Every key is latched on its own, several keys can be held at once.
    #[default]
    Independent,
    /// A press releases every other key first and any release clears the whole keypad,
    /// so at most one key is ever down.
    Exclusive,
}

/// The 16-key hex keypad as seen by the program.
#[derive(Debug, Clone, Default)]
pub struct Keypad {
    keys: [bool; 16],
    mode: KeypadMode,
}

impl Keypad {
    pub fn new(mode: KeypadMode) -> Self {
        Self {
            keys: [false; 16],
            mode,
        }
    }

    pub fn mode(&self) -> KeypadMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: KeypadMode) {
        self.mode = mode;
    }

    /// Set the state of a key on the keypad.
    pub fn set_key(&mut self, key: u4, pressed: bool) {
        match self.mode {
            KeypadMode::Independent => self.keys[key] = pressed,
            KeypadMode::Exclusive => {
                self.clear();
                self.keys[key] = pressed;
            }
        }
    }

    pub fn is_pressed(&self, key: u4) -> bool {
        self.keys[key]
    }

    /// Lowest numbered key currently held down.
    pub fn first_pressed(&self) -> Option<u4> {
        self.keys
            .iter()
            .position(|&pressed| pressed)
            .map(|key| u4::new(key as u8))
    }

    pub fn clear(&mut self) {
        self.keys = [false; 16];
    }

    pub fn keys(&self) -> &[bool; 16] {
        &self.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn independent_keys_are_latched_separately() {
        let mut keypad = Keypad::new(KeypadMode::Independent);
        keypad.set_key(u4::new(0x3), true);
        keypad.set_key(u4::new(0xA), true);
        keypad.set_key(u4::new(0x3), false);

        assert!(!keypad.is_pressed(u4::new(0x3)));
        assert!(keypad.is_pressed(u4::new(0xA)));
        assert_eq!(keypad.first_pressed(), Some(u4::new(0xA)));
    }

    #[test]
    fn exclusive_press_replaces_previous_key() {
        let mut keypad = Keypad::new(KeypadMode::Exclusive);
        keypad.set_key(u4::new(0x3), true);
        keypad.set_key(u4::new(0xA), true);

        assert!(!keypad.is_pressed(u4::new(0x3)));
        assert!(keypad.is_pressed(u4::new(0xA)));
    }

    #[test]
    fn exclusive_release_of_any_key_clears_all() {
        let mut keypad = Keypad::new(KeypadMode::Exclusive);
        keypad.set_key(u4::new(0xA), true);
        keypad.set_key(u4::new(0x1), false);

        assert_eq!(keypad.first_pressed(), None);
    }
}
