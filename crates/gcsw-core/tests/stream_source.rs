// gcsw Stream Source Tests
//
// Drives a StreamSource against a local TCP listener.
//
// Run with: cargo test --test stream_source

use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde_json::json;

use gcsw_core::source::{write_frame, CommandSource, SourceError, StreamSettings, StreamSource};
use gcsw_core::{
    word_queue, Action, Button, InjectedEvent, KeyboardWord, Pacer, PointerWord, RecordingInjector,
    Sequencer, WordSinks,
};

const TOPIC: &str = "dev";

// =========================================================================
// Test Helpers
// =========================================================================

struct NoSleep;

impl Pacer for NoSleep {
    fn pause(&mut self, _duration: Duration) {}
}

/// Listener on an ephemeral port plus the settings pointing at it
fn listen() -> (TcpListener, StreamSettings) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let settings = StreamSettings {
        host: "127.0.0.1".to_string(),
        port,
        topic: TOPIC.to_string(),
    };
    (listener, settings)
}

fn frame(channel: &str, words: serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(&json!({ "channel": channel, "words": words })).unwrap()
}

/// Accept one client, write `frames`, then wait for `release` before closing
fn serve(
    listener: TcpListener,
    frames: Vec<Vec<u8>>,
    release: mpsc::Receiver<()>,
) -> JoinHandle<TcpStream> {
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        for body in frames {
            write_frame(&mut stream, &body).unwrap();
        }
        let _ = release.recv();
        stream
    })
}

// =========================================================================
// Routing
// =========================================================================

#[test]
fn test_frames_route_to_device_queues_in_order() {
    let (listener, settings) = listen();
    let (release_tx, release_rx) = mpsc::channel();
    let server = serve(
        listener,
        vec![
            frame("dev/mouse", json!([{"btn": [0], "dur": 1}, {"mov": [2, 3]}])),
            frame("dev/keyboard", json!([{"key": ["a"], "mod": [1], "dur": 4}])),
            frame("other/mouse", json!([{"btn": [2]}])),
            b"not json".to_vec(),
            frame("dev/mouse", json!([{"btn": "bad"}, {"btn": [1]}])),
        ],
        release_rx,
    );

    let (pointer_tx, pointer_rx) = word_queue::<PointerWord>(8);
    let (keyboard_tx, keyboard_rx) = word_queue::<KeyboardWord>(8);
    let (fault_tx, fault_rx) = mpsc::channel();
    let mut source = StreamSource::new(settings);
    source
        .start(WordSinks::new(pointer_tx, keyboard_tx), fault_tx)
        .unwrap();

    assert_eq!(pointer_rx.recv(), Some(PointerWord::new(vec![0], (0, 0), 1)));
    assert_eq!(pointer_rx.recv(), Some(PointerWord::new(vec![], (2, 3), 0)));
    assert_eq!(
        keyboard_rx.recv(),
        Some(KeyboardWord::new(["a"], vec![1], 4))
    );
    // Foreign channel, garbage frame and malformed entry are all skipped
    assert_eq!(pointer_rx.recv(), Some(PointerWord::new(vec![1], (0, 0), 0)));

    release_tx.send(()).unwrap();
    drop(server.join().unwrap());

    // Server hang-up is a fault and closes both queues
    let fault = fault_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(matches!(fault, SourceError::Disconnected(_)));
    assert_eq!(pointer_rx.recv(), None);
    assert_eq!(keyboard_rx.recv(), None);

    source.stop().unwrap();
}

#[test]
fn test_stop_closes_queues_without_fault() {
    let (listener, settings) = listen();
    let (release_tx, release_rx) = mpsc::channel();
    let server = serve(listener, Vec::new(), release_rx);

    let (pointer_tx, pointer_rx) = word_queue::<PointerWord>(4);
    let (keyboard_tx, keyboard_rx) = word_queue::<KeyboardWord>(4);
    let (fault_tx, fault_rx) = mpsc::channel();
    let mut source = StreamSource::new(settings);
    source
        .start(WordSinks::new(pointer_tx, keyboard_tx), fault_tx)
        .unwrap();

    source.stop().unwrap();

    assert_eq!(pointer_rx.recv(), None);
    assert_eq!(keyboard_rx.recv(), None);
    assert!(fault_rx.try_recv().is_err());

    release_tx.send(()).unwrap();
    server.join().unwrap();
}

#[test]
fn test_connect_refused_fails_start() {
    let (listener, settings) = listen();
    drop(listener);

    let (pointer_tx, _pointer_rx) = word_queue::<PointerWord>(1);
    let (keyboard_tx, _keyboard_rx) = word_queue::<KeyboardWord>(1);
    let (fault_tx, _fault_rx) = mpsc::channel();
    let mut source = StreamSource::new(settings);

    let result = source.start(WordSinks::new(pointer_tx, keyboard_tx), fault_tx);
    assert!(matches!(result, Err(SourceError::Connect(_))));
}

// =========================================================================
// End to End
// =========================================================================

#[test]
fn test_stream_to_sequencer() {
    let (listener, settings) = listen();
    let (release_tx, release_rx) = mpsc::channel();
    let server = serve(
        listener,
        vec![frame(
            "dev/mouse",
            json!([
                {"btn": [0], "mov": [0, 0], "dur": 0},
                {"btn": [0, 1], "mov": [5, 0], "dur": 1}
            ]),
        )],
        release_rx,
    );

    let (pointer_tx, pointer_rx) = word_queue::<PointerWord>(8);
    let (keyboard_tx, _keyboard_rx) = word_queue::<KeyboardWord>(8);
    let recorder = RecordingInjector::new();
    let worker = {
        let recorder = recorder.clone();
        thread::spawn(move || {
            Sequencer::<PointerWord, _, _>::with_pacer(recorder, NoSleep).run(pointer_rx)
        })
    };

    let (fault_tx, _fault_rx) = mpsc::channel();
    let mut source = StreamSource::new(settings);
    source
        .start(WordSinks::new(pointer_tx, keyboard_tx), fault_tx)
        .unwrap();

    // Wait for the batch to be consumed, then shut down
    for _ in 0..500 {
        if recorder.events().len() >= 5 {
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }
    source.stop().unwrap();
    let summary = worker.join().unwrap();
    release_tx.send(()).unwrap();
    server.join().unwrap();

    assert_eq!(
        recorder.events(),
        vec![
            InjectedEvent::Button(Button::Left, Action::Press),
            InjectedEvent::Button(Button::Right, Action::Press),
            InjectedEvent::MoveTo(5, 0),
            InjectedEvent::Button(Button::Left, Action::Release),
            InjectedEvent::Button(Button::Right, Action::Release),
        ]
    );
    assert_eq!(summary.words, 2);
    assert_eq!(summary.idle_drains, 1);
}
