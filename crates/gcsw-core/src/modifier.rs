// gcsw Modifier System
// Modifiers carried in keyboard words (Control, Shift, Alt)

use std::fmt;

use crate::Key;

/// A keyboard modifier as addressed by index on the wire.
///
/// Modifiers are diffed exactly like plain keys; this type only exists to
/// give the wire indices a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Control,
    Shift,
    Alt,
}

impl Modifier {
    /// All modifiers in wire-index order
    pub const ALL: [Modifier; 3] = [Modifier::Control, Modifier::Shift, Modifier::Alt];

    /// Resolve a wire-level modifier index (0, 1, 2)
    pub fn from_index(index: i64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i))
            .copied()
    }

    /// The key toggled for this modifier
    pub fn key(self) -> Key {
        match self {
            Modifier::Control => Key::Control,
            Modifier::Shift => Key::Shift,
            Modifier::Alt => Key::Alt,
        }
    }

    pub fn name(self) -> &'static str {
        self.key().name()
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
