// gcsw Stream Command Source
// Length-framed JSON messages over a raw TCP connection
//
// Frame layout: 4-byte big-endian length N, then N bytes of JSON:
//   {"channel": "<prefix>/<device>", "words": [...]}

use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};

use super::{CommandSource, SharedSinks, SourceError, SourceResult, WordSinks};
use crate::word::Device;

/// Largest frame body accepted (1 MiB)
pub const MAX_FRAME_LEN: u32 = 1 << 20;

/// Server address and channel prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSettings {
    pub host: String,
    pub port: u16,
    pub topic: String,
}

/// Body of one stream frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamFrame {
    pub channel: String,
    #[serde(default)]
    pub words: Vec<serde_json::Value>,
}

impl StreamFrame {
    /// Device addressed by this frame, if its channel lives under `prefix`
    pub fn device(&self, prefix: &str) -> Option<Device> {
        let rest = self.channel.strip_prefix(prefix)?.strip_prefix('/')?;
        Device::from_channel(rest)
    }
}

/// Read one frame body.
///
/// Returns `Ok(None)` on end of stream at a frame boundary.
pub fn read_frame<R: Read>(reader: &mut R) -> SourceResult<Option<Vec<u8>>> {
    let mut header = [0u8; 4];
    match reader.read_exact(&mut header) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(header);
    if len > MAX_FRAME_LEN {
        return Err(SourceError::Protocol(format!(
            "frame of {} bytes exceeds limit of {}",
            len, MAX_FRAME_LEN
        )));
    }

    let mut body = vec![0u8; len as usize];
    reader.read_exact(&mut body)?;
    Ok(Some(body))
}

/// Write one frame body with its length header
pub fn write_frame<W: Write>(writer: &mut W, body: &[u8]) -> io::Result<()> {
    let len = u32::try_from(body.len())
        .ok()
        .filter(|&len| len <= MAX_FRAME_LEN)
        .ok_or_else(|| io::Error::new(ErrorKind::InvalidInput, "frame too large"))?;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(body)?;
    writer.flush()
}

/// Raw streaming-socket command source
pub struct StreamSource {
    settings: StreamSettings,
    stream: Option<TcpStream>,
    sinks: Option<SharedSinks>,
    stopping: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl StreamSource {
    pub fn new(settings: StreamSettings) -> Self {
        Self {
            settings,
            stream: None,
            sinks: None,
            stopping: Arc::new(AtomicBool::new(false)),
            reader: None,
        }
    }

    fn handle_frame(body: &[u8], prefix: &str, sinks: &SharedSinks) -> SourceResult<()> {
        let frame: StreamFrame = match serde_json::from_slice(body) {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("[!] malformed frame skipped: {}", e);
                return Ok(());
            }
        };
        let Some(device) = frame.device(prefix) else {
            log::debug!("ignoring frame on '{}'", frame.channel);
            return Ok(());
        };
        let count = sinks.dispatch_entries(device, frame.words)?;
        log::trace!("{} word(s) queued for {}", count, device);
        Ok(())
    }

    fn read_loop(
        mut stream: TcpStream,
        prefix: String,
        sinks: SharedSinks,
        stopping: Arc<AtomicBool>,
        faults: Sender<SourceError>,
    ) {
        loop {
            let fault = match read_frame(&mut stream) {
                Ok(Some(body)) => match Self::handle_frame(&body, &prefix, &sinks) {
                    Ok(()) => continue,
                    Err(SourceError::QueueClosed) => break,
                    Err(e) => e,
                },
                Ok(None) => SourceError::Disconnected("server closed the stream".to_string()),
                Err(e) => e,
            };
            if !stopping.load(Ordering::SeqCst) {
                let _ = faults.send(fault);
            }
            break;
        }
        sinks.close();
    }
}

impl CommandSource for StreamSource {
    fn name(&self) -> &'static str {
        "stream"
    }

    fn start(&mut self, sinks: WordSinks, faults: Sender<SourceError>) -> SourceResult<()> {
        let address = format!("{}:{}", self.settings.host, self.settings.port);
        let stream = TcpStream::connect(&address)
            .map_err(|e| SourceError::Connect(format!("{}: {}", address, e)))?;
        stream.set_nodelay(true)?;
        log::info!("[*] stream client connected to {}", address);

        let reader_stream = stream.try_clone()?;
        let sinks = SharedSinks::new(sinks);
        let reader_sinks = sinks.clone();
        let prefix = self.settings.topic.clone();
        let stopping = self.stopping.clone();
        let reader = thread::Builder::new()
            .name("gcsw-stream".to_string())
            .spawn(move || Self::read_loop(reader_stream, prefix, reader_sinks, stopping, faults))?;

        self.stream = Some(stream);
        self.sinks = Some(sinks);
        self.reader = Some(reader);
        Ok(())
    }

    fn stop(&mut self) -> SourceResult<()> {
        self.stopping.store(true, Ordering::SeqCst);

        if let Some(stream) = self.stream.take() {
            // Unblocks the reader; it may already be gone
            let _ = stream.shutdown(Shutdown::Both);
        }
        if let Some(sinks) = self.sinks.take() {
            sinks.close();
        }
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        Ok(())
    }
}
