// gcsw Held State
// Insertion-ordered set of symbols the injector currently holds down

use std::hash::Hash;

use indexmap::IndexSet;

/// Tracks the symbols currently held, in the order they were pressed
#[derive(Debug, Clone)]
pub struct HeldState<T> {
    held: IndexSet<T>,
}

impl<T> Default for HeldState<T> {
    fn default() -> Self {
        Self {
            held: IndexSet::new(),
        }
    }
}

impl<T: Copy + Eq + Hash> HeldState<T> {
    /// Create a new empty held state
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the held set
    pub fn as_set(&self) -> &IndexSet<T> {
        &self.held
    }

    /// Replace the held set with a newly computed one
    pub fn replace(&mut self, latest: IndexSet<T>) {
        self.held = latest;
    }

    /// Empty the state, returning what was held in press order
    pub fn take(&mut self) -> IndexSet<T> {
        std::mem::take(&mut self.held)
    }

    /// Check if nothing is held
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Key;

    #[test]
    fn test_replace_and_query() {
        let mut state = HeldState::new();
        assert!(state.is_empty());

        state.replace(IndexSet::from([Key::A, Key::Shift]));
        assert!(state.as_set().contains(&Key::A));
        assert!(state.as_set().contains(&Key::Shift));
        assert!(!state.as_set().contains(&Key::B));
        assert_eq!(state.as_set().len(), 2);
    }

    #[test]
    fn test_take_preserves_order() {
        let mut state = HeldState::new();
        state.replace(IndexSet::from([Key::C, Key::A, Key::B]));
        let taken = state.take();
        assert_eq!(taken.into_iter().collect::<Vec<_>>(), vec![Key::C, Key::A, Key::B]);
        assert!(state.is_empty());
    }

    #[test]
    fn test_default_is_empty() {
        let state: HeldState<Key> = HeldState::default();
        assert!(state.is_empty());
    }
}
