// gcsw Log Injector
// Dry-run output: logs every event instead of driving a device

use super::{InjectResult, InjectedEvent, InputInjector};
use crate::word::Device;
use crate::{Action, Button, Key};

/// Injector that only logs what it would have done.
///
/// Tracks a virtual pointer position starting at the origin.
#[derive(Debug)]
pub struct LogInjector {
    device: Device,
    position: (i32, i32),
}

impl LogInjector {
    pub fn new(device: Device) -> Self {
        Self {
            device,
            position: (0, 0),
        }
    }

    fn emit(&self, event: InjectedEvent) {
        log::info!("[{}] {}", self.device, event);
    }
}

impl InputInjector for LogInjector {
    fn toggle_button(&mut self, button: Button, action: Action) -> InjectResult<()> {
        self.emit(InjectedEvent::Button(button, action));
        Ok(())
    }

    fn toggle_key(&mut self, key: Key, action: Action) -> InjectResult<()> {
        self.emit(InjectedEvent::Key(key, action));
        Ok(())
    }

    fn pointer_position(&mut self) -> InjectResult<(i32, i32)> {
        Ok(self.position)
    }

    fn move_pointer(&mut self, x: i32, y: i32) -> InjectResult<()> {
        self.position = (x, y);
        self.emit(InjectedEvent::MoveTo(x, y));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_injector_tracks_position() {
        let mut injector = LogInjector::new(Device::Mouse);
        assert_eq!(injector.pointer_position().unwrap(), (0, 0));
        injector.move_pointer(12, -4).unwrap();
        assert_eq!(injector.pointer_position().unwrap(), (12, -4));
        injector.toggle_button(Button::Left, Action::Press).unwrap();
        injector.toggle_key(Key::Tab, Action::Release).unwrap();
    }
}
