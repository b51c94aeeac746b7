// gcsw Core Library
// Input-word sequencing: network word batches in, synthetic input events out

pub mod action;
pub mod button;
pub mod config;
pub mod key;
pub mod modifier;
pub mod output;
pub mod queue;
pub mod sequencer;
pub mod source;
pub mod symbols;
pub mod word;

pub use action::Action;
pub use button::Button;
pub use config::{Config, ConfigError, OutputBackend, TransportKind};
pub use key::Key;
pub use modifier::Modifier;
pub use output::{
    InjectError, InjectResult, InjectedEvent, InputInjector, LogInjector, RecordingInjector, Toggle,
};
pub use queue::{word_queue, Polled, QueueClosed, WordReceiver, WordSender};
pub use sequencer::{Pacer, Sequencer, SessionSummary, ThreadPacer};
pub use source::{CommandSource, MqttSource, SourceError, SourceResult, StreamSource, WordSinks};
pub use word::{decode_batch, DecodeError, Device, DeviceWord, KeyboardWord, PointerWord};

#[cfg(feature = "uinput")]
pub use output::VirtualDevice;
