// gcsw Pointer Buttons

use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::output::{InjectResult, InputInjector, Toggle};
use crate::Action;

/// A pointer button as seen by the injector.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, IntoStaticStr, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum Button {
    Left,
    Right,
    Center,
}

impl Button {
    /// Linux input-event-codes.h code (BTN_LEFT, BTN_RIGHT, BTN_MIDDLE)
    pub fn code(self) -> u16 {
        match self {
            Button::Left => 0x110,
            Button::Right => 0x111,
            Button::Center => 0x112,
        }
    }
}

impl Toggle for Button {
    fn toggle<I: InputInjector + ?Sized>(self, injector: &mut I, action: Action) -> InjectResult<()> {
        injector.toggle_button(self, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_names() {
        assert_eq!(Button::Left.to_string(), "left");
        assert_eq!(Button::Center.to_string(), "center");
    }

    #[test]
    fn test_button_codes() {
        assert_eq!(Button::Left.code(), 0x110);
        assert_eq!(Button::Right.code(), 0x111);
        assert_eq!(Button::Center.code(), 0x112);
    }
}
