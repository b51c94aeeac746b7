// gcsw Output Layer
// Injector capability and its implementations

mod logging;
mod recording;

#[cfg(feature = "uinput")]
mod uinput;

use std::fmt;
use std::hash::Hash;

use crate::{Action, Button, Key};

pub use logging::LogInjector;
pub use recording::RecordingInjector;

#[cfg(feature = "uinput")]
pub use uinput::VirtualDevice;

/// Result type for injector operations
pub type InjectResult<T> = Result<T, InjectError>;

/// Error types for injector operations
#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    #[error("Failed to create virtual device: {0}")]
    DeviceCreation(String),

    #[error("Failed to write event: {0}")]
    WriteError(String),

    #[error("{0} is not supported by this device")]
    Unsupported(&'static str),
}

/// The primitive capability the sequencer drives.
///
/// Implementations own their device; each sequencer worker gets its own
/// injector, so none of these methods need to be thread-safe beyond `Send`.
pub trait InputInjector: Send {
    /// Press or release a pointer button
    fn toggle_button(&mut self, button: Button, action: Action) -> InjectResult<()>;

    /// Press or release a keyboard key
    fn toggle_key(&mut self, key: Key, action: Action) -> InjectResult<()>;

    /// Current absolute pointer position
    fn pointer_position(&mut self) -> InjectResult<(i32, i32)>;

    /// Move the pointer to an absolute position
    fn move_pointer(&mut self, x: i32, y: i32) -> InjectResult<()>;
}

impl<T: InputInjector + ?Sized> InputInjector for Box<T> {
    fn toggle_button(&mut self, button: Button, action: Action) -> InjectResult<()> {
        (**self).toggle_button(button, action)
    }

    fn toggle_key(&mut self, key: Key, action: Action) -> InjectResult<()> {
        (**self).toggle_key(key, action)
    }

    fn pointer_position(&mut self) -> InjectResult<(i32, i32)> {
        (**self).pointer_position()
    }

    fn move_pointer(&mut self, x: i32, y: i32) -> InjectResult<()> {
        (**self).move_pointer(x, y)
    }
}

/// A symbol that can be held down: a pointer button or a keyboard key.
pub trait Toggle: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + 'static {
    /// Send this symbol's press or release to the injector
    fn toggle<I: InputInjector + ?Sized>(self, injector: &mut I, action: Action) -> InjectResult<()>;
}

/// One event as observed at the injector boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedEvent {
    Button(Button, Action),
    Key(Key, Action),
    MoveTo(i32, i32),
}

impl fmt::Display for InjectedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InjectedEvent::Button(button, action) => write!(f, "{}({})", action, button),
            InjectedEvent::Key(key, action) => write!(f, "{}({})", action, key),
            InjectedEvent::MoveTo(x, y) => write!(f, "move_to({}, {})", x, y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_injected_event_display() {
        assert_eq!(
            InjectedEvent::Button(Button::Left, Action::Press).to_string(),
            "press(left)"
        );
        assert_eq!(
            InjectedEvent::Key(Key::Up, Action::Release).to_string(),
            "release(up)"
        );
        assert_eq!(InjectedEvent::MoveTo(5, -1).to_string(), "move_to(5, -1)");
    }

    #[test]
    fn test_boxed_injector_forwards() {
        let recorder = RecordingInjector::new();
        let mut boxed: Box<dyn InputInjector> = Box::new(recorder.clone());
        Key::A.toggle(&mut boxed, Action::Press).unwrap();
        Button::Right.toggle(&mut boxed, Action::Release).unwrap();
        boxed.move_pointer(1, 2).unwrap();
        assert_eq!(boxed.pointer_position().unwrap(), (1, 2));
        assert_eq!(
            recorder.events(),
            vec![
                InjectedEvent::Key(Key::A, Action::Press),
                InjectedEvent::Button(Button::Right, Action::Release),
                InjectedEvent::MoveTo(1, 2),
            ]
        );
    }
}
