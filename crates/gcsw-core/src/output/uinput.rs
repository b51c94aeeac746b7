// gcsw uinput Output Layer
// Virtual device creation and event emission

use evdev::uinput::VirtualDeviceBuilder;
use evdev::{AttributeSet, EventType, InputEvent, RelativeAxisType};
use strum::IntoEnumIterator;

use super::{InjectError, InjectResult, InputInjector};
use crate::{Action, Button, Key};

/// Name prefix of every device this process creates
const VIRT_DEVICE_PREFIX: &str = "gcsw (virtual)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeviceKind {
    Pointer,
    Keyboard,
}

/// Virtual uinput device driven by one sequencer.
///
/// uinput devices are write-only: the cursor cannot be read back. The pointer
/// position reported here is the running total of the motion this device has
/// emitted, and absolute moves are sent as the relative difference to it.
pub struct VirtualDevice {
    device: evdev::uinput::VirtualDevice,
    kind: DeviceKind,
    position: (i32, i32),
}

impl VirtualDevice {
    /// Create a virtual pointer with left/right/middle buttons and REL_X/REL_Y
    pub fn pointer() -> InjectResult<Self> {
        let mut buttons = AttributeSet::<evdev::Key>::new();
        for button in Button::iter() {
            buttons.insert(evdev::Key::new(button.code()));
        }
        let mut axes = AttributeSet::<RelativeAxisType>::new();
        axes.insert(RelativeAxisType::REL_X);
        axes.insert(RelativeAxisType::REL_Y);

        let device = VirtualDeviceBuilder::new()
            .map_err(|e: std::io::Error| InjectError::DeviceCreation(e.to_string()))?
            .name(&format!("{} Pointer", VIRT_DEVICE_PREFIX))
            .with_keys(&buttons)
            .map_err(|e: std::io::Error| InjectError::DeviceCreation(e.to_string()))?
            .with_relative_axes(&axes)
            .map_err(|e: std::io::Error| InjectError::DeviceCreation(e.to_string()))?
            .build()
            .map_err(|e: std::io::Error| InjectError::DeviceCreation(e.to_string()))?;

        Ok(Self {
            device,
            kind: DeviceKind::Pointer,
            position: (0, 0),
        })
    }

    /// Create a virtual keyboard exposing every key in the symbol table
    pub fn keyboard() -> InjectResult<Self> {
        let mut keys = AttributeSet::<evdev::Key>::new();
        for key in Key::iter() {
            keys.insert(evdev::Key::new(key.code()));
        }

        let device = VirtualDeviceBuilder::new()
            .map_err(|e: std::io::Error| InjectError::DeviceCreation(e.to_string()))?
            .name(&format!("{} Keyboard", VIRT_DEVICE_PREFIX))
            .with_keys(&keys)
            .map_err(|e: std::io::Error| InjectError::DeviceCreation(e.to_string()))?
            .build()
            .map_err(|e: std::io::Error| InjectError::DeviceCreation(e.to_string()))?;

        Ok(Self {
            device,
            kind: DeviceKind::Keyboard,
            position: (0, 0),
        })
    }

    fn emit(&mut self, events: &[InputEvent]) -> InjectResult<()> {
        self.device
            .emit(events)
            .map_err(|e: std::io::Error| InjectError::WriteError(e.to_string()))
    }

    fn write_key_event(&mut self, code: u16, action: Action) -> InjectResult<()> {
        let key_event = InputEvent::new(EventType::KEY, code, action.to_i32());
        // SYN event is required for the kernel to process the key event
        let syn_event = InputEvent::new(EventType::SYNCHRONIZATION, 0, 0);
        self.emit(&[key_event, syn_event])
    }
}

impl InputInjector for VirtualDevice {
    fn toggle_button(&mut self, button: Button, action: Action) -> InjectResult<()> {
        if self.kind != DeviceKind::Pointer {
            return Err(InjectError::Unsupported("pointer buttons"));
        }
        self.write_key_event(button.code(), action)
    }

    fn toggle_key(&mut self, key: Key, action: Action) -> InjectResult<()> {
        if self.kind != DeviceKind::Keyboard {
            return Err(InjectError::Unsupported("keyboard keys"));
        }
        self.write_key_event(key.code(), action)
    }

    fn pointer_position(&mut self) -> InjectResult<(i32, i32)> {
        if self.kind != DeviceKind::Pointer {
            return Err(InjectError::Unsupported("pointer motion"));
        }
        Ok(self.position)
    }

    fn move_pointer(&mut self, x: i32, y: i32) -> InjectResult<()> {
        if self.kind != DeviceKind::Pointer {
            return Err(InjectError::Unsupported("pointer motion"));
        }
        let dx = x.wrapping_sub(self.position.0);
        let dy = y.wrapping_sub(self.position.1);
        let events = [
            InputEvent::new(EventType::RELATIVE, RelativeAxisType::REL_X.0, dx),
            InputEvent::new(EventType::RELATIVE, RelativeAxisType::REL_Y.0, dy),
            InputEvent::new(EventType::SYNCHRONIZATION, 0, 0),
        ];
        self.emit(&events)?;
        self.position = (x, y);
        Ok(())
    }
}
