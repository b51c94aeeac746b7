// gcsw Key Type
// Keyboard symbols the injector understands, with their Linux key codes

use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::output::{InjectResult, InputInjector, Toggle};
use crate::Action;

/// A keyboard key as seen by the injector.
///
/// The string form (`"a"`, `"f1"`, `"up"`, `"control"`) is the injector-side
/// symbol name. Wire-level names such as `"ArrowUp"` are translated by
/// [`crate::symbols::key_from_wire`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, IntoStaticStr, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum Key {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    #[strum(serialize = "0")]
    Num0,
    #[strum(serialize = "1")]
    Num1,
    #[strum(serialize = "2")]
    Num2,
    #[strum(serialize = "3")]
    Num3,
    #[strum(serialize = "4")]
    Num4,
    #[strum(serialize = "5")]
    Num5,
    #[strum(serialize = "6")]
    Num6,
    #[strum(serialize = "7")]
    Num7,
    #[strum(serialize = "8")]
    Num8,
    #[strum(serialize = "9")]
    Num9,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    Escape,
    Space,
    Tab,
    Enter,
    Backspace,
    Delete,
    Up,
    Down,
    Right,
    Left,
    Control,
    Shift,
    Alt,
}

impl Key {
    /// Linux input-event-codes.h code for this key.
    ///
    /// Modifiers map to their left-hand variants.
    pub fn code(self) -> u16 {
        match self {
            Key::A => 30,
            Key::B => 48,
            Key::C => 46,
            Key::D => 32,
            Key::E => 18,
            Key::F => 33,
            Key::G => 34,
            Key::H => 35,
            Key::I => 23,
            Key::J => 36,
            Key::K => 37,
            Key::L => 38,
            Key::M => 50,
            Key::N => 49,
            Key::O => 24,
            Key::P => 25,
            Key::Q => 16,
            Key::R => 19,
            Key::S => 31,
            Key::T => 20,
            Key::U => 22,
            Key::V => 47,
            Key::W => 17,
            Key::X => 45,
            Key::Y => 21,
            Key::Z => 44,
            Key::Num1 => 2,
            Key::Num2 => 3,
            Key::Num3 => 4,
            Key::Num4 => 5,
            Key::Num5 => 6,
            Key::Num6 => 7,
            Key::Num7 => 8,
            Key::Num8 => 9,
            Key::Num9 => 10,
            Key::Num0 => 11,
            Key::F1 => 59,
            Key::F2 => 60,
            Key::F3 => 61,
            Key::F4 => 62,
            Key::F5 => 63,
            Key::F6 => 64,
            Key::F7 => 65,
            Key::F8 => 66,
            Key::F9 => 67,
            Key::F10 => 68,
            Key::F11 => 87,
            Key::F12 => 88,
            Key::Escape => 1,
            Key::Space => 57,
            Key::Tab => 15,
            Key::Enter => 28,
            Key::Backspace => 14,
            Key::Delete => 111,
            Key::Up => 103,
            Key::Down => 108,
            Key::Right => 106,
            Key::Left => 105,
            Key::Control => 29,
            Key::Shift => 42,
            Key::Alt => 56,
        }
    }

    /// Injector-side symbol name
    pub fn name(self) -> &'static str {
        self.into()
    }
}

impl Toggle for Key {
    fn toggle<I: InputInjector + ?Sized>(self, injector: &mut I, action: Action) -> InjectResult<()> {
        injector.toggle_key(self, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_key_names() {
        assert_eq!(Key::A.name(), "a");
        assert_eq!(Key::Num7.name(), "7");
        assert_eq!(Key::F11.name(), "f11");
        assert_eq!(Key::Backspace.to_string(), "backspace");
        assert_eq!(Key::Control.to_string(), "control");
    }

    #[test]
    fn test_key_from_str() {
        assert_eq!(Key::from_str("up"), Ok(Key::Up));
        assert_eq!(Key::from_str("0"), Ok(Key::Num0));
        assert_eq!(Key::from_str("f12"), Ok(Key::F12));
        assert!(Key::from_str("ArrowUp").is_err());
    }

    #[test]
    fn test_key_codes_are_unique() {
        let codes: HashSet<u16> = Key::iter().map(Key::code).collect();
        assert_eq!(codes.len(), Key::iter().count());
    }

    #[test]
    fn test_modifier_keys() {
        assert_eq!(Key::Control.code(), 29);
    }
}
