// gcsw Toggle Calculation
// Set arithmetic for determining which symbols to release and press

use std::hash::Hash;

use indexmap::IndexSet;
use smallvec::SmallVec;

/// Toggles needed to move the injector from one held set to another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleSet<T> {
    /// Held before, not held now (in the order they were pressed)
    pub released: SmallVec<[T; 8]>,
    /// Held now, not held before (in the order the word lists them)
    pub pressed: SmallVec<[T; 8]>,
}

impl<T> Default for ToggleSet<T> {
    fn default() -> Self {
        Self {
            released: SmallVec::new(),
            pressed: SmallVec::new(),
        }
    }
}

/// Calculate the toggles that turn `previous` into `latest`.
///
/// `released = previous - latest` and `pressed = latest - previous`. The two
/// are disjoint by construction; a symbol held in both sets is left alone.
pub fn calculate_toggles<T: Copy + Eq + Hash>(
    previous: &IndexSet<T>,
    latest: &IndexSet<T>,
) -> ToggleSet<T> {
    ToggleSet {
        released: previous.difference(latest).copied().collect(),
        pressed: latest.difference(previous).copied().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Button, Key};

    #[test]
    fn test_press_from_empty() {
        let toggles = calculate_toggles(&IndexSet::new(), &IndexSet::from([Button::Left]));
        assert!(toggles.released.is_empty());
        assert_eq!(toggles.pressed.as_slice(), &[Button::Left]);
    }

    #[test]
    fn test_held_symbol_not_toggled() {
        let previous = IndexSet::from([Button::Left]);
        let latest = IndexSet::from([Button::Left, Button::Right]);
        let toggles = calculate_toggles(&previous, &latest);
        assert!(toggles.released.is_empty());
        assert_eq!(toggles.pressed.as_slice(), &[Button::Right]);
    }

    #[test]
    fn test_swap() {
        let previous = IndexSet::from([Key::A, Key::Shift]);
        let latest = IndexSet::from([Key::Shift, Key::B]);
        let toggles = calculate_toggles(&previous, &latest);
        assert_eq!(toggles.released.as_slice(), &[Key::A]);
        assert_eq!(toggles.pressed.as_slice(), &[Key::B]);
    }

    #[test]
    fn test_release_order_follows_press_order() {
        let previous = IndexSet::from([Key::C, Key::A, Key::B]);
        let toggles = calculate_toggles(&previous, &IndexSet::new());
        assert_eq!(toggles.released.as_slice(), &[Key::C, Key::A, Key::B]);
    }

    #[test]
    fn test_identical_sets_are_empty() {
        let set = IndexSet::from([Key::Up, Key::Left]);
        assert_eq!(calculate_toggles(&set, &set), ToggleSet::default());
    }

    #[test]
    fn test_released_and_pressed_disjoint() {
        let all = [Key::A, Key::B, Key::C, Key::D];
        for mask_a in 0u8..16 {
            for mask_b in 0u8..16 {
                let pick = |mask: u8| -> IndexSet<Key> {
                    all.iter()
                        .enumerate()
                        .filter(|(i, _)| mask & (1 << i) != 0)
                        .map(|(_, k)| *k)
                        .collect()
                };
                let toggles = calculate_toggles(&pick(mask_a), &pick(mask_b));
                assert!(toggles.released.iter().all(|k| !toggles.pressed.contains(k)));
            }
        }
    }
}
