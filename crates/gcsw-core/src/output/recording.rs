// gcsw Recording Injector
// Captures injector traffic in memory instead of touching a device

use std::sync::Arc;

use parking_lot::Mutex;

use super::{InjectResult, InjectedEvent, InputInjector};
use crate::{Action, Button, Key};

/// Injector that records every event it receives.
///
/// Clones share the same log and pointer position, so a test can keep one
/// handle while a sequencer owns another (possibly on another thread).
#[derive(Debug, Clone, Default)]
pub struct RecordingInjector {
    events: Arc<Mutex<Vec<InjectedEvent>>>,
    position: Arc<Mutex<(i32, i32)>>,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the pointer at a given position
    pub fn with_position(x: i32, y: i32) -> Self {
        let injector = Self::new();
        injector.set_position(x, y);
        injector
    }

    /// Snapshot of all events recorded so far
    pub fn events(&self) -> Vec<InjectedEvent> {
        self.events.lock().clone()
    }

    /// Remove and return all recorded events
    pub fn take_events(&self) -> Vec<InjectedEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Move the pointer without recording an event (an external move)
    pub fn set_position(&self, x: i32, y: i32) {
        *self.position.lock() = (x, y);
    }

    pub fn position(&self) -> (i32, i32) {
        *self.position.lock()
    }

    fn record(&self, event: InjectedEvent) {
        self.events.lock().push(event);
    }
}

impl InputInjector for RecordingInjector {
    fn toggle_button(&mut self, button: Button, action: Action) -> InjectResult<()> {
        self.record(InjectedEvent::Button(button, action));
        Ok(())
    }

    fn toggle_key(&mut self, key: Key, action: Action) -> InjectResult<()> {
        self.record(InjectedEvent::Key(key, action));
        Ok(())
    }

    fn pointer_position(&mut self) -> InjectResult<(i32, i32)> {
        Ok(self.position())
    }

    fn move_pointer(&mut self, x: i32, y: i32) -> InjectResult<()> {
        self.set_position(x, y);
        self.record(InjectedEvent::MoveTo(x, y));
        Ok(())
    }
}
