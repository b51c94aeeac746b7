// gcsw Sequencer
// Diffs device words against the held state and drives the injector

mod diff;
mod held;
mod pacing;

use std::fmt;
use std::marker::PhantomData;

use crate::output::{InputInjector, Toggle};
use crate::queue::{Polled, WordReceiver};
use crate::word::DeviceWord;
use crate::Action;

pub use diff::{calculate_toggles, ToggleSet};
pub use held::HeldState;
pub use pacing::{frame_duration, Pacer, ThreadPacer, FRAMES_PER_SECOND};

/// Counters for one sequencer session, returned when its loop ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Words applied
    pub words: u64,
    /// Press toggles sent
    pub presses: u64,
    /// Release toggles sent (diff and idle-drain)
    pub releases: u64,
    /// Pointer moves sent
    pub moves: u64,
    /// Idle-drain passes that released at least one symbol
    pub idle_drains: u64,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} words, {} presses, {} releases, {} moves, {} idle drains",
            self.words, self.presses, self.releases, self.moves, self.idle_drains
        )
    }
}

/// Per-device sequencer.
///
/// Owns the held state for one device class exclusively. Words are applied
/// strictly in queue order; the pacing pause after a word is the only point
/// where the worker blocks besides waiting for the next word.
pub struct Sequencer<W: DeviceWord, I: InputInjector, P: Pacer = ThreadPacer> {
    held: HeldState<W::Symbol>,
    injector: I,
    pacer: P,
    summary: SessionSummary,
    _word: PhantomData<fn(W)>,
}

impl<W: DeviceWord, I: InputInjector> Sequencer<W, I, ThreadPacer> {
    /// Create a sequencer that paces by sleeping the current thread
    pub fn new(injector: I) -> Self {
        Self::with_pacer(injector, ThreadPacer)
    }
}

impl<W: DeviceWord, I: InputInjector, P: Pacer> Sequencer<W, I, P> {
    /// Create a sequencer with a custom pacer
    pub fn with_pacer(injector: I, pacer: P) -> Self {
        Self {
            held: HeldState::new(),
            injector,
            pacer,
            summary: SessionSummary::default(),
            _word: PhantomData,
        }
    }

    /// Symbols the injector currently holds down
    pub fn held(&self) -> &HeldState<W::Symbol> {
        &self.held
    }

    pub fn summary(&self) -> SessionSummary {
        self.summary
    }

    /// Apply one word: release what is no longer held, press what newly is,
    /// then apply the word's relative motion.
    ///
    /// Does not pace; see [`Sequencer::process`].
    pub fn apply(&mut self, word: &W) -> ToggleSet<W::Symbol> {
        log::debug!("{}: {:?}", W::DEVICE, word);

        let latest = word.held();
        let toggles = calculate_toggles(self.held.as_set(), &latest);

        // Releases go first so the injector never sees a phantom double press
        for &symbol in &toggles.released {
            self.send(symbol, Action::Release);
        }
        for &symbol in &toggles.pressed {
            self.send(symbol, Action::Press);
        }

        let (dx, dy) = word.motion();
        if dx != 0 || dy != 0 {
            self.move_by(dx, dy);
        }

        self.held.replace(latest);
        self.summary.words += 1;
        toggles
    }

    /// Release everything still held and reset the state to empty.
    ///
    /// Returns the number of symbols released.
    pub fn release_all(&mut self) -> usize {
        let held = self.held.take();
        for &symbol in &held {
            self.send(symbol, Action::Release);
        }
        held.len()
    }

    /// Apply a word and pace it, without looking at any queue.
    ///
    /// Returns true if the word asked for a pacing pause, in which case the
    /// caller should run the idle-drain check.
    pub fn process(&mut self, word: &W) -> bool {
        self.apply(word);
        let frames = word.hold_frames();
        if frames == 0 {
            return false;
        }
        self.pacer.pause(frame_duration(frames));
        true
    }

    /// Consume words until the queue is closed and drained.
    ///
    /// After every paced word the queue is checked once: if nothing arrived
    /// during the pause, everything still held is released (idle-drain).
    pub fn run(mut self, queue: WordReceiver<W>) -> SessionSummary {
        let mut pending: Option<W> = None;

        loop {
            let word = match pending.take() {
                Some(word) => word,
                None => match queue.recv() {
                    Some(word) => word,
                    None => break,
                },
            };

            if !self.process(&word) {
                continue;
            }

            match queue.poll() {
                Polled::Word(next) => pending = Some(next),
                Polled::Empty => self.idle_drain(),
                Polled::Closed => {
                    self.idle_drain();
                    break;
                }
            }
        }

        log::debug!("{} sequencer stopped: {}", W::DEVICE, self.summary);
        self.summary
    }

    fn idle_drain(&mut self) {
        let released = self.release_all();
        if released > 0 {
            self.summary.idle_drains += 1;
            log::debug!("{}: idle, released {} held", W::DEVICE, released);
        }
    }

    fn send(&mut self, symbol: W::Symbol, action: Action) {
        match symbol.toggle(&mut self.injector, action) {
            Ok(()) => match action {
                Action::Press => self.summary.presses += 1,
                Action::Release => self.summary.releases += 1,
            },
            Err(e) => log::warn!("{}: {} {} failed: {}", W::DEVICE, action, symbol, e),
        }
    }

    fn move_by(&mut self, dx: i32, dy: i32) {
        let (x, y) = match self.injector.pointer_position() {
            Ok(position) => position,
            Err(e) => {
                log::warn!("{}: pointer position unavailable, motion skipped: {}", W::DEVICE, e);
                return;
            }
        };
        match self
            .injector
            .move_pointer(x.saturating_add(dx), y.saturating_add(dy))
        {
            Ok(()) => self.summary.moves += 1,
            Err(e) => log::warn!("{}: pointer move failed: {}", W::DEVICE, e),
        }
    }
}
