// gcsw CLI
// Subscribes to device word streams and replays them on virtual input devices

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use gcsw_core::source::{CommandSource, MqttSource, SourceError, StreamSource, WordSinks};
use gcsw_core::{
    word_queue, Config, Device, DeviceWord, InputInjector, KeyboardWord, LogInjector,
    OutputBackend, PointerWord, Sequencer, SessionSummary, TransportKind, WordReceiver,
};

/// How often the main loop checks for shutdown and source faults
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Replay network input words on synthetic input devices
#[derive(Parser, Debug)]
#[command(name = "gcsw")]
#[command(author = "gcsw contributors")]
#[command(version)]
#[command(about = "Replay network input words on synthetic input devices", long_about = None)]
struct Args {
    /// TOML configuration file (default: ~/.config/gcsw/config.toml if present)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Broker or stream server host
    #[arg(long, value_name = "HOST")]
    host: Option<String>,

    /// Broker or stream server port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Topic / channel prefix; words arrive on <TOPIC>/mouse and <TOPIC>/keyboard
    #[arg(short, long, value_name = "TOPIC")]
    topic: Option<String>,

    /// MQTT client id
    #[arg(long, value_name = "ID")]
    client_id: Option<String>,

    /// Transport: mqtt or stream
    #[arg(long, value_name = "KIND")]
    transport: Option<String>,

    /// Word queue capacity per device
    #[arg(long, value_name = "N")]
    queue_capacity: Option<usize>,

    /// Log events instead of driving uinput devices
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    check_config: bool,

    /// Write a commented default config (to --config or the default path) and exit
    #[arg(long)]
    init_config: bool,
}

impl Args {
    /// Where `--init-config` writes
    fn init_config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => Config::default_path().context("no config directory on this system"),
        }
    }

    /// Resolve the effective configuration: file (or defaults), then CLI overrides
    fn resolve_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::load_default()?,
        };

        if let Some(ref kind) = self.transport {
            config.set_transport(kind)?;
        }
        if let Some(ref host) = self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(ref topic) = self.topic {
            config.topic = topic.clone();
        }
        if let Some(ref client_id) = self.client_id {
            config.client_id = client_id.clone();
        }
        if let Some(capacity) = self.queue_capacity {
            config.queue_capacity = capacity;
        }
        if self.dry_run {
            config.backend = OutputBackend::Log;
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "info,gcsw=debug,gcsw_core=debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();
}

fn log_config(config: &Config) {
    log::info!("[*] gcsw");
    if let Some(path) = config.source_path() {
        log::info!(" - config : {}", path.display());
    }
    log::info!(" - transport : {}", config.transport);
    log::info!(" - host : {}", config.host);
    log::info!(" - port : {}", config.port);
    log::info!(" - topic(sub) : '{}'", Device::Mouse.channel(&config.topic));
    log::info!("                '{}'", Device::Keyboard.channel(&config.topic));
    log::info!(" - queue capacity : {}", config.queue_capacity);
    log::info!(" - output : {}", config.backend);
}

fn build_injector(backend: OutputBackend, device: Device) -> anyhow::Result<Box<dyn InputInjector>> {
    match backend {
        OutputBackend::Log => Ok(Box::new(LogInjector::new(device))),
        #[cfg(feature = "uinput")]
        OutputBackend::Uinput => {
            let injector = match device {
                Device::Mouse => gcsw_core::VirtualDevice::pointer(),
                Device::Keyboard => gcsw_core::VirtualDevice::keyboard(),
            }
            .with_context(|| format!("creating virtual {} device", device))?;
            Ok(Box::new(injector))
        }
        #[cfg(not(feature = "uinput"))]
        OutputBackend::Uinput => {
            anyhow::bail!("built without uinput support; rebuild with --features uinput or use --dry-run")
        }
    }
}

fn build_source(config: &Config) -> Box<dyn CommandSource> {
    match config.transport {
        TransportKind::Mqtt => Box::new(MqttSource::new(config.mqtt_settings())),
        TransportKind::Stream => Box::new(StreamSource::new(config.stream_settings())),
    }
}

fn spawn_worker<W: DeviceWord>(
    injector: Box<dyn InputInjector>,
    queue: WordReceiver<W>,
) -> anyhow::Result<JoinHandle<SessionSummary>> {
    let handle = thread::Builder::new()
        .name(format!("gcsw-{}", W::DEVICE))
        .spawn(move || Sequencer::<W, _>::new(injector).run(queue))
        .with_context(|| format!("spawning {} worker", W::DEVICE))?;
    Ok(handle)
}

/// Main application state
struct Application {
    config: Config,
    /// Flag to signal the main loop to stop
    running: Arc<AtomicBool>,
}

impl Application {
    fn new(config: Config) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Set up signal handler for graceful shutdown
    fn install_signal_handler(&self) -> anyhow::Result<()> {
        use signal_hook::consts::{SIGINT, SIGTERM};
        use signal_hook::iterator::Signals;

        let mut signals = Signals::new([SIGINT, SIGTERM]).context("installing signal handler")?;
        let running = self.running.clone();
        thread::Builder::new()
            .name("gcsw-signals".to_string())
            .spawn(move || {
                if let Some(signal) = signals.forever().next() {
                    log::info!("Received signal {}, shutting down gracefully...", signal);
                    running.store(false, Ordering::SeqCst);
                }
            })
            .context("spawning signal thread")?;
        Ok(())
    }

    fn run(&self) -> anyhow::Result<()> {
        self.install_signal_handler()?;

        let (pointer_tx, pointer_rx) = word_queue::<PointerWord>(self.config.queue_capacity);
        let (keyboard_tx, keyboard_rx) = word_queue::<KeyboardWord>(self.config.queue_capacity);

        let pointer_injector = build_injector(self.config.backend, Device::Mouse)?;
        let keyboard_injector = build_injector(self.config.backend, Device::Keyboard)?;
        let pointer_worker = spawn_worker(pointer_injector, pointer_rx)?;
        let keyboard_worker = spawn_worker(keyboard_injector, keyboard_rx)?;

        let (fault_tx, fault_rx) = mpsc::channel();
        let mut source = build_source(&self.config);
        source
            .start(WordSinks::new(pointer_tx, keyboard_tx), fault_tx)
            .with_context(|| format!("starting {} source", source.name()))?;

        log::info!("gcsw is running. Press Ctrl+C to exit.");
        let fault = self.wait_for_shutdown(&fault_rx);

        if let Err(e) = source.stop() {
            log::warn!("{} source did not stop cleanly: {}", source.name(), e);
        }
        Self::join_worker(Device::Mouse, pointer_worker);
        Self::join_worker(Device::Keyboard, keyboard_worker);

        match fault {
            Some(e) => Err(e).context(format!("{} source failed", source.name())),
            None => Ok(()),
        }
    }

    /// Block until a signal arrives or the source reports a fault
    fn wait_for_shutdown(&self, faults: &Receiver<SourceError>) -> Option<SourceError> {
        while self.running.load(Ordering::SeqCst) {
            match faults.recv_timeout(POLL_INTERVAL) {
                Ok(fault) => {
                    log::error!("{}", fault);
                    return Some(fault);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    return Some(SourceError::Disconnected(
                        "reader stopped unexpectedly".to_string(),
                    ));
                }
            }
        }
        None
    }

    fn join_worker(device: Device, worker: JoinHandle<SessionSummary>) {
        match worker.join() {
            Ok(summary) => log::info!("{} sequencer: {}", device, summary),
            Err(_) => log::error!("{} sequencer panicked", device),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.init_config {
        let path = args.init_config_path()?;
        Config::write_default(&path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config = args.resolve_config()?;
    log_config(&config);

    if args.check_config {
        println!("Configuration is valid");
        return Ok(());
    }

    Application::new(config).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["gcsw", "--config", "/tmp/gcsw.toml"]);

        assert_eq!(args.config, Some(PathBuf::from("/tmp/gcsw.toml")));
        assert!(args.host.is_none());
        assert!(args.transport.is_none());
        assert!(!args.dry_run);
        assert!(!args.verbose);
        assert!(!args.check_config);
        assert!(!args.init_config);
    }

    #[test]
    fn test_args_with_options() {
        let args = Args::parse_from([
            "gcsw",
            "--host",
            "broker.local",
            "--port",
            "1884",
            "--topic",
            "lab",
            "--transport",
            "stream",
            "--dry-run",
            "--verbose",
        ]);

        assert_eq!(args.host.as_deref(), Some("broker.local"));
        assert_eq!(args.port, Some(1884));
        assert_eq!(args.topic.as_deref(), Some("lab"));
        assert_eq!(args.transport.as_deref(), Some("stream"));
        assert!(args.dry_run);
        assert!(args.verbose);
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let path = std::env::temp_dir().join(format!("gcsw-test-{}.toml", std::process::id()));
        std::fs::write(&path, "[transport]\nhost = \"10.1.1.1\"\nport = 2000\n").unwrap();

        let args = Args::parse_from([
            "gcsw",
            "--config",
            path.to_str().unwrap(),
            "--port",
            "3000",
            "--transport",
            "stream",
            "--dry-run",
        ]);
        let config = args.resolve_config().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.host, "10.1.1.1");
        assert_eq!(config.port, 3000);
        assert_eq!(config.transport, TransportKind::Stream);
        assert_eq!(config.backend, OutputBackend::Log);
    }

    #[test]
    fn test_unknown_transport_is_fatal() {
        let path = std::env::temp_dir().join(format!("gcsw-empty-{}.toml", std::process::id()));
        std::fs::write(&path, "").unwrap();
        let args = Args::parse_from([
            "gcsw",
            "--config",
            path.to_str().unwrap(),
            "--transport",
            "udp",
        ]);
        let result = args.resolve_config();
        std::fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn test_init_config_writes_loadable_file() {
        let path = std::env::temp_dir().join(format!("gcsw-init-cli-{}.toml", std::process::id()));
        let args = Args::parse_from(["gcsw", "--init-config", "--config", path.to_str().unwrap()]);
        assert!(args.init_config);

        let target = args.init_config_path().unwrap();
        Config::write_default(&target).unwrap();
        let config = args.resolve_config().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(target, path);
        assert_eq!(config.transport, TransportKind::Mqtt);
        assert_eq!(config.topic, "dev");
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let args = Args::parse_from(["gcsw", "--config", "/nonexistent/gcsw.toml"]);
        assert!(args.resolve_config().is_err());
    }
}
