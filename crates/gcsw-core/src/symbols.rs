// gcsw Symbol Tables
// Read-only translation from wire-level names and indices to injector symbols

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::{Button, Key, Modifier};

/// Buttons in wire-index order
const BUTTONS: [Button; 3] = [Button::Left, Button::Right, Button::Center];

/// Wire key name -> injector key.
///
/// Built once on first access and never mutated, so both device workers
/// can read it without locking.
static KEY_TABLE: LazyLock<HashMap<&'static str, Key>> = LazyLock::new(|| {
    use Key::*;
    HashMap::from([
        ("a", A),
        ("b", B),
        ("c", C),
        ("d", D),
        ("e", E),
        ("f", F),
        ("g", G),
        ("h", H),
        ("i", I),
        ("j", J),
        ("k", K),
        ("l", L),
        ("m", M),
        ("n", N),
        ("o", O),
        ("p", P),
        ("q", Q),
        ("r", R),
        ("s", S),
        ("t", T),
        ("u", U),
        ("v", V),
        ("w", W),
        ("x", X),
        ("y", Y),
        ("z", Z),
        ("0", Num0),
        ("1", Num1),
        ("2", Num2),
        ("3", Num3),
        ("4", Num4),
        ("5", Num5),
        ("6", Num6),
        ("7", Num7),
        ("8", Num8),
        ("9", Num9),
        ("F1", F1),
        ("F2", F2),
        ("F3", F3),
        ("F4", F4),
        ("F5", F5),
        ("F6", F6),
        ("F7", F7),
        ("F8", F8),
        ("F9", F9),
        ("F10", F10),
        ("F11", F11),
        ("F12", F12),
        ("Escape", Escape),
        ("Space", Space),
        ("Tab", Tab),
        ("Enter", Enter),
        ("Backspace", Backspace),
        ("Delete", Delete),
        ("ArrowUp", Up),
        ("ArrowDown", Down),
        ("ArrowRight", Right),
        ("ArrowLeft", Left),
    ])
});

/// Translate a wire-level key name (e.g. `"ArrowUp"`) to an injector key.
///
/// Returns `None` for names outside the table; callers drop those silently.
pub fn key_from_wire(name: &str) -> Option<Key> {
    KEY_TABLE.get(name).copied()
}

/// Translate a wire-level button index (0, 1, 2)
pub fn button_from_index(index: i64) -> Option<Button> {
    usize::try_from(index)
        .ok()
        .and_then(|i| BUTTONS.get(i))
        .copied()
}

/// Translate a wire-level modifier index (0, 1, 2) to the key it toggles
pub fn modifier_key_from_index(index: i64) -> Option<Key> {
    Modifier::from_index(index).map(Modifier::key)
}
