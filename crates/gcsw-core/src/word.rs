// gcsw Device Words
// One word = the complete held state of one device for one time slice

use std::fmt;

use indexmap::IndexSet;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use strum_macros::{Display, EnumString, IntoStaticStr};

use crate::output::Toggle;
use crate::symbols::{button_from_index, key_from_wire, modifier_key_from_index};
use crate::{Button, Key};

/// Device class a word belongs to.
///
/// The string form is the last segment of the channel the word arrives on
/// (`<prefix>/mouse`, `<prefix>/keyboard`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Device {
    Mouse,
    Keyboard,
}

impl Device {
    /// Route a channel name by its last `/`-separated segment
    pub fn from_channel(channel: &str) -> Option<Self> {
        let last = channel.rsplit('/').next()?;
        last.parse().ok()
    }

    /// Channel name for this device under `prefix`
    pub fn channel(self, prefix: &str) -> String {
        format!("{}/{}", prefix, self)
    }
}

/// Errors produced while decoding a batch of words
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed word batch: {0}")]
    Batch(#[from] serde_json::Error),
}

/// A device word the sequencer can diff.
pub trait DeviceWord: DeserializeOwned + fmt::Debug + Send + 'static {
    /// Symbol type held by this device
    type Symbol: Toggle;

    /// Device class this word type belongs to
    const DEVICE: Device;

    /// Complete set of symbols asserted down during this word.
    ///
    /// Unknown symbols are already filtered out and duplicates collapsed;
    /// order follows the order in which the word lists them.
    fn held(&self) -> IndexSet<Self::Symbol>;

    /// Relative pointer displacement applied once for this word
    fn motion(&self) -> (i32, i32) {
        (0, 0)
    }

    /// Hold duration in display frames (1/60 s)
    fn hold_frames(&self) -> u32;
}

/// Pointer word: `{"btn":[int...], "mov":[int,int], "dur":int}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PointerWord {
    /// Wire-level button indices held down
    #[serde(rename = "btn", default, deserialize_with = "lenient_list")]
    pub buttons: Vec<i64>,
    /// Relative motion `[dx, dy]`
    #[serde(rename = "mov", default)]
    pub motion: [i32; 2],
    /// Hold duration in frames
    #[serde(rename = "dur", default)]
    pub hold_frames: u32,
}

impl PointerWord {
    pub fn new(buttons: Vec<i64>, motion: (i32, i32), hold_frames: u32) -> Self {
        Self {
            buttons,
            motion: [motion.0, motion.1],
            hold_frames,
        }
    }
}

impl DeviceWord for PointerWord {
    type Symbol = Button;
    const DEVICE: Device = Device::Mouse;

    fn held(&self) -> IndexSet<Button> {
        self.buttons
            .iter()
            .filter_map(|&index| button_from_index(index))
            .collect()
    }

    fn motion(&self) -> (i32, i32) {
        (self.motion[0], self.motion[1])
    }

    fn hold_frames(&self) -> u32 {
        self.hold_frames
    }
}

/// Keyboard word: `{"key":[string...], "mod":[int...], "dur":int}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct KeyboardWord {
    /// Wire-level key names held down
    #[serde(rename = "key", default, deserialize_with = "lenient_list")]
    pub keys: Vec<String>,
    /// Wire-level modifier indices held down
    #[serde(rename = "mod", default, deserialize_with = "lenient_list")]
    pub modifiers: Vec<i64>,
    /// Hold duration in frames
    #[serde(rename = "dur", default)]
    pub hold_frames: u32,
}

impl KeyboardWord {
    pub fn new<S: Into<String>>(
        keys: impl IntoIterator<Item = S>,
        modifiers: Vec<i64>,
        hold_frames: u32,
    ) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            modifiers,
            hold_frames,
        }
    }
}

impl DeviceWord for KeyboardWord {
    type Symbol = Key;
    const DEVICE: Device = Device::Keyboard;

    fn held(&self) -> IndexSet<Key> {
        let modifiers = self
            .modifiers
            .iter()
            .filter_map(|&index| modifier_key_from_index(index));
        let keys = self.keys.iter().filter_map(|name| key_from_wire(name));
        modifiers.chain(keys).collect()
    }

    fn hold_frames(&self) -> u32 {
        self.hold_frames
    }
}

/// Deserialize a list, dropping entries of the wrong type instead of failing
/// the whole word.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect())
}

/// Decode one transport message (a JSON array of words).
///
/// A payload that is not an array is an error. Entries that fail to decode
/// are logged and skipped; the remaining words keep their order.
pub fn decode_batch<W: DeviceWord>(payload: &[u8]) -> Result<Vec<W>, DecodeError> {
    let entries: Vec<serde_json::Value> = serde_json::from_slice(payload)?;
    Ok(decode_entries(entries))
}

/// Decode already-parsed word entries, skipping malformed ones.
pub fn decode_entries<W: DeviceWord>(entries: Vec<serde_json::Value>) -> Vec<W> {
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<W>(entry) {
            Ok(word) => Some(word),
            Err(e) => {
                log::warn!("[!] {} word #{} skipped: {}", W::DEVICE, index, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_from_channel() {
        assert_eq!(Device::from_channel("dev/mouse"), Some(Device::Mouse));
        assert_eq!(Device::from_channel("a/b/keyboard"), Some(Device::Keyboard));
        assert_eq!(Device::from_channel("keyboard"), Some(Device::Keyboard));
        assert_eq!(Device::from_channel("dev/joystick"), None);
        assert_eq!(Device::from_channel("dev/mouse/"), None);
    }

    #[test]
    fn test_device_channel() {
        assert_eq!(Device::Mouse.channel("dev"), "dev/mouse");
        assert_eq!(Device::Keyboard.channel("site/a"), "site/a/keyboard");
    }

    #[test]
    fn test_pointer_word_decode() {
        let words: Vec<PointerWord> =
            decode_batch(br#"[{"btn":[0,2],"mov":[3,-2],"dur":4}]"#).unwrap();
        assert_eq!(words, vec![PointerWord::new(vec![0, 2], (3, -2), 4)]);
        assert_eq!(
            words[0].held(),
            IndexSet::from([Button::Left, Button::Center])
        );
        assert_eq!(words[0].motion(), (3, -2));
    }

    #[test]
    fn test_pointer_word_defaults() {
        let words: Vec<PointerWord> = decode_batch(br#"[{}]"#).unwrap();
        assert_eq!(words[0], PointerWord::default());
        assert!(words[0].held().is_empty());
        assert_eq!(words[0].hold_frames(), 0);
    }

    #[test]
    fn test_pointer_unknown_buttons_dropped() {
        let word = PointerWord::new(vec![5, 1, -1, 1], (0, 0), 0);
        assert_eq!(word.held(), IndexSet::from([Button::Right]));
    }

    #[test]
    fn test_keyboard_word_decode() {
        let words: Vec<KeyboardWord> =
            decode_batch(br#"[{"key":["ArrowUp","a"],"mod":[1],"dur":2}]"#).unwrap();
        assert_eq!(words[0].held(), IndexSet::from([Key::Shift, Key::Up, Key::A]));
        assert_eq!(words[0].motion(), (0, 0));
        assert_eq!(words[0].hold_frames(), 2);
    }

    #[test]
    fn test_keyboard_unknown_symbols_dropped() {
        let word = KeyboardWord::new(["§", "a", "a"], vec![9], 5);
        assert_eq!(word.held(), IndexSet::from([Key::A]));
    }

    #[test]
    fn test_malformed_symbols_do_not_drop_word() {
        let words: Vec<KeyboardWord> =
            decode_batch(br#"[{"key":[12,"b",null],"mod":["x",0],"dur":1}]"#).unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].held(), IndexSet::from([Key::Control, Key::B]));
    }

    #[test]
    fn test_malformed_entry_skipped() {
        let words: Vec<PointerWord> = decode_batch(
            br#"[{"btn":[0],"dur":1},{"btn":[1],"dur":-3},"junk",{"btn":[2],"dur":0}]"#,
        )
        .unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].buttons, vec![0]);
        assert_eq!(words[1].buttons, vec![2]);
    }

    #[test]
    fn test_non_array_payload_is_error() {
        assert!(decode_batch::<PointerWord>(br#"{"btn":[0]}"#).is_err());
        assert!(decode_batch::<KeyboardWord>(b"not json").is_err());
    }
}
