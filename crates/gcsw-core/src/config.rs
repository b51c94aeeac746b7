// gcsw Configuration
// Transport, queue and output settings, loaded from TOML and overridden by CLI

use std::path::{Path, PathBuf};
use std::str::FromStr;

use strum_macros::{Display, EnumString};

use crate::queue::DEFAULT_CAPACITY;
use crate::source::{MqttSettings, StreamSettings};

/// Which command source to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum TransportKind {
    /// Publish/subscribe over MQTT
    Mqtt,
    /// Length-framed JSON over a raw TCP stream
    Stream,
}

/// Where sequenced events go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OutputBackend {
    /// Linux uinput virtual devices
    Uinput,
    /// Log only (dry run)
    Log,
}

/// Effective runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub transport: TransportKind,
    pub host: String,
    pub port: u16,
    pub topic: String,
    pub client_id: String,
    pub queue_capacity: usize,
    pub backend: OutputBackend,
    source_path: Option<PathBuf>,
}

/// Errors that can occur when loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Unsupported transport '{0}' (expected 'mqtt' or 'stream')")]
    UnsupportedTransport(String),

    #[error("Unsupported output backend '{0}' (expected 'uinput' or 'log')")]
    UnsupportedBackend(String),

    #[error("Invalid setting value: {0}")]
    InvalidValue(String),

    #[error("Refusing to overwrite existing config {0}")]
    AlreadyExists(PathBuf),
}

/// TOML representation for deserializing the config file
#[derive(Debug, Clone, serde::Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    #[serde(default)]
    transport: Option<TransportToml>,

    #[serde(default)]
    sequencer: Option<SequencerToml>,

    #[serde(default)]
    output: Option<OutputToml>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TransportToml {
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    client_id: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SequencerToml {
    #[serde(default)]
    queue_capacity: Option<usize>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct OutputToml {
    #[serde(default)]
    backend: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Built-in defaults
    pub fn new() -> Self {
        Self {
            transport: TransportKind::Mqtt,
            host: "127.0.0.1".to_string(),
            port: 1883,
            topic: "dev".to_string(),
            client_id: "GcSwEmulator".to_string(),
            queue_capacity: DEFAULT_CAPACITY,
            backend: OutputBackend::Uinput,
            source_path: None,
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        config.source_path = Some(path.as_ref().to_path_buf());
        Ok(config)
    }

    /// Load configuration from a TOML string, starting from the defaults
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let parsed: ConfigToml =
            toml::from_str(content).map_err(|e| ConfigError::TomlParse(e.to_string()))?;

        let mut config = Self::new();

        if let Some(transport) = parsed.transport {
            if let Some(kind) = transport.kind {
                config.set_transport(&kind)?;
            }
            if let Some(host) = transport.host {
                config.host = host;
            }
            if let Some(port) = transport.port {
                config.port = port;
            }
            if let Some(topic) = transport.topic {
                config.topic = topic;
            }
            if let Some(client_id) = transport.client_id {
                config.client_id = client_id;
            }
        }

        if let Some(sequencer) = parsed.sequencer {
            if let Some(capacity) = sequencer.queue_capacity {
                config.queue_capacity = capacity;
            }
        }

        if let Some(output) = parsed.output {
            if let Some(backend) = output.backend {
                config.set_backend(&backend)?;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Get the default config path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gcsw").join("config.toml"))
    }

    /// Load from the default location, or the defaults if no file exists
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::from_file(path);
            }
        }
        Ok(Self::new())
    }

    /// Write the commented default config to `path`, creating parent
    /// directories. An existing file is never overwritten.
    pub fn write_default(path: &Path) -> Result<(), ConfigError> {
        if path.exists() {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        std::fs::write(path, default_config_content()).map_err(io_error)
    }

    /// File this configuration was read from, if any
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Select the transport by name
    pub fn set_transport(&mut self, name: &str) -> Result<(), ConfigError> {
        self.transport = TransportKind::from_str(&name.to_ascii_lowercase())
            .map_err(|_| ConfigError::UnsupportedTransport(name.to_string()))?;
        Ok(())
    }

    /// Select the output backend by name
    pub fn set_backend(&mut self, name: &str) -> Result<(), ConfigError> {
        self.backend = OutputBackend::from_str(&name.to_ascii_lowercase())
            .map_err(|_| ConfigError::UnsupportedBackend(name.to_string()))?;
        Ok(())
    }

    /// Reject values no pipeline can run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::InvalidValue("host must not be empty".to_string()));
        }
        if self.topic.is_empty() || self.topic.ends_with('/') {
            return Err(ConfigError::InvalidValue(format!(
                "topic '{}' must be non-empty without a trailing '/'",
                self.topic
            )));
        }
        Ok(())
    }

    pub fn mqtt_settings(&self) -> MqttSettings {
        MqttSettings {
            host: self.host.clone(),
            port: self.port,
            topic: self.topic.clone(),
            client_id: self.client_id.clone(),
        }
    }

    pub fn stream_settings(&self) -> StreamSettings {
        StreamSettings {
            host: self.host.clone(),
            port: self.port,
            topic: self.topic.clone(),
        }
    }
}

/// Default config file content for a new installation
fn default_config_content() -> &'static str {
    r#"# gcsw configuration
# Place this file at: ~/.config/gcsw/config.toml

[transport]
# "mqtt" (publish/subscribe) or "stream" (length-framed JSON over TCP)
kind = "mqtt"
host = "127.0.0.1"
port = 1883
# Words arrive on <topic>/mouse and <topic>/keyboard
topic = "dev"
client_id = "GcSwEmulator"

[sequencer]
queue_capacity = 32

[output]
# "uinput" (virtual devices) or "log" (dry run)
backend = "uinput"
"#
}
