// gcsw MQTT Command Source
// Subscribes to <prefix>/# and routes publishes by their last topic segment
//
// Two threads per source: the pump keeps the connection polled (so keep-alive
// pings go out on time) and hands publishes to the dispatcher, which is the
// only one that blocks on a full word queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rumqttc::{
    Client, Connection, Event, MqttOptions, Packet, Publish, QoS, SubAck, SubscribeReasonCode,
};

use super::{CommandSource, SharedSinks, SourceError, SourceResult, WordSinks};
use crate::word::Device;

/// Capacity of the client request channel
const REQUEST_CAPACITY: usize = 10;

/// Keep-alive interval negotiated with the broker
const KEEP_ALIVE: Duration = Duration::from_secs(30);

/// How long `stop` waits for the reader threads before detaching them
const JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Broker address and subscription settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    pub topic: String,
    pub client_id: String,
}

impl MqttSettings {
    /// Subscription filter covering every device under the prefix
    pub fn topic_filter(&self) -> String {
        format!("{}/#", self.topic)
    }
}

/// A publish on its way from the pump to the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl From<Publish> for Inbound {
    fn from(publish: Publish) -> Self {
        Self {
            topic: publish.topic,
            payload: publish.payload.to_vec(),
        }
    }
}

/// Enqueue one publish on the queue named by the topic's last segment.
///
/// Topics that name no device are ignored. Returns the number of words
/// enqueued.
pub fn handle_publish(topic: &str, payload: &[u8], sinks: &SharedSinks) -> SourceResult<usize> {
    let Some(device) = Device::from_channel(topic) else {
        log::debug!("ignoring message on '{}'", topic);
        return Ok(0);
    };
    let count = sinks.dispatch(device, payload)?;
    log::trace!("{} word(s) queued for {}", count, device);
    Ok(count)
}

/// Fail if the broker refused any filter of a subscription
fn check_suback(suback: &SubAck, filter: &str) -> SourceResult<()> {
    if suback
        .return_codes
        .iter()
        .any(|code| matches!(code, SubscribeReasonCode::Failure))
    {
        return Err(SourceError::Subscribe(format!(
            "broker refused '{}'",
            filter
        )));
    }
    Ok(())
}

/// Join `handle` if it finishes within `timeout`, otherwise leave it running
fn join_within(handle: JoinHandle<()>, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            // Sinks are closed and faults suppressed; it can no longer act
            log::debug!(
                "{} still running, detached",
                handle.thread().name().unwrap_or("mqtt reader")
            );
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
    let _ = handle.join();
}

/// Publish/subscribe command source over MQTT
pub struct MqttSource {
    settings: MqttSettings,
    client: Option<Client>,
    sinks: Option<SharedSinks>,
    stopping: Arc<AtomicBool>,
    readers: Vec<JoinHandle<()>>,
}

impl MqttSource {
    pub fn new(settings: MqttSettings) -> Self {
        Self {
            settings,
            client: None,
            sinks: None,
            stopping: Arc::new(AtomicBool::new(false)),
            readers: Vec::new(),
        }
    }

    /// Drive the connection until the broker acknowledges it
    fn wait_for_connack(connection: &mut Connection) -> SourceResult<()> {
        for notification in connection.iter() {
            match notification {
                Ok(Event::Incoming(Packet::ConnAck(_))) => return Ok(()),
                Ok(_) => continue,
                Err(e) => return Err(SourceError::Connect(e.to_string())),
            }
        }
        Err(SourceError::Connect(
            "connection closed before acknowledgement".to_string(),
        ))
    }

    /// Drive the connection until the subscription is acknowledged.
    ///
    /// Publishes that overtake the SubAck are handed on in order.
    fn wait_for_suback(
        connection: &mut Connection,
        filter: &str,
        inbound: &Sender<Inbound>,
    ) -> SourceResult<()> {
        for notification in connection.iter() {
            match notification {
                Ok(Event::Incoming(Packet::SubAck(suback))) => {
                    return check_suback(&suback, filter)
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    let _ = inbound.send(publish.into());
                }
                Ok(_) => continue,
                Err(e) => return Err(SourceError::Subscribe(e.to_string())),
            }
        }
        Err(SourceError::Subscribe(
            "connection closed before acknowledgement".to_string(),
        ))
    }

    /// Poll the connection for as long as it lives; never blocks on a queue
    fn pump(
        mut connection: Connection,
        inbound: Sender<Inbound>,
        stopping: Arc<AtomicBool>,
        faults: Sender<SourceError>,
    ) {
        for notification in connection.iter() {
            match notification {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    if inbound.send(publish.into()).is_err() {
                        break;
                    }
                }
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    log::info!("[*] MQTT client is ONLINE");
                }
                Ok(_) => {}
                Err(e) => {
                    if !stopping.load(Ordering::SeqCst) {
                        let _ = faults.send(SourceError::Disconnected(e.to_string()));
                    }
                    break;
                }
            }
        }
    }

    /// Enqueue publishes in arrival order, then close the sinks
    fn dispatch_loop(inbound: Receiver<Inbound>, sinks: SharedSinks) {
        for message in inbound {
            match handle_publish(&message.topic, &message.payload, &sinks) {
                Ok(_) => {}
                Err(SourceError::QueueClosed) => break,
                Err(e) => log::warn!("[!] {}", e),
            }
        }
        sinks.close();
    }
}

impl CommandSource for MqttSource {
    fn name(&self) -> &'static str {
        "mqtt"
    }

    fn start(&mut self, sinks: WordSinks, faults: Sender<SourceError>) -> SourceResult<()> {
        let mut options = MqttOptions::new(
            self.settings.client_id.clone(),
            self.settings.host.clone(),
            self.settings.port,
        );
        options.set_keep_alive(KEEP_ALIVE);

        let (client, mut connection) = Client::new(options, REQUEST_CAPACITY);
        Self::wait_for_connack(&mut connection)?;
        log::info!("[*] MQTT client is ONLINE");

        let filter = self.settings.topic_filter();
        client
            .subscribe(filter.as_str(), QoS::AtMostOnce)
            .map_err(|e| SourceError::Subscribe(e.to_string()))?;
        let (inbound_tx, inbound_rx) = mpsc::channel();
        Self::wait_for_suback(&mut connection, &filter, &inbound_tx)?;
        log::info!("[*] subscribed to '{}'", filter);

        let sinks = SharedSinks::new(sinks);
        let dispatcher_sinks = sinks.clone();
        let dispatcher = thread::Builder::new()
            .name("gcsw-mqtt-dispatch".to_string())
            .spawn(move || Self::dispatch_loop(inbound_rx, dispatcher_sinks))?;
        self.readers.push(dispatcher);

        let stopping = self.stopping.clone();
        let pump = thread::Builder::new()
            .name("gcsw-mqtt".to_string())
            .spawn(move || Self::pump(connection, inbound_tx, stopping, faults))?;
        self.readers.push(pump);

        self.client = Some(client);
        self.sinks = Some(sinks);
        Ok(())
    }

    fn stop(&mut self) -> SourceResult<()> {
        self.stopping.store(true, Ordering::SeqCst);

        // Close the queues first so the sequencers can finish even if the
        // broker never answers the disconnect.
        if let Some(sinks) = self.sinks.take() {
            sinks.close();
        }

        // Dropping the client afterwards ends the pump's request stream
        let result = match self.client.take() {
            Some(client) => client
                .disconnect()
                .map_err(|e| SourceError::Disconnected(e.to_string())),
            None => Ok(()),
        };

        for reader in self.readers.drain(..) {
            join_within(reader, JOIN_TIMEOUT);
        }
        result
    }
}
