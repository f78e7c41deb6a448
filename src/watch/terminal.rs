use std::{
    cmp::Reverse,
    collections::BinaryHeap,
    io::{self, BufRead},
    sync::mpsc::Sender,
    thread,
    time::{Duration, Instant},
};

use log::debug;

use super::buttons::{ButtonEvent, ButtonId};
use crate::{
    host::{Surface, TapMessage, Timer},
    tick_scheduler::Phase,
};

const THREAD_NAME: &str = "tap-metronome-keys";

/// Message sent from the key reader thread to the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMessage {
    Button {
        event: ButtonEvent,
        timestamp_ms: u32,
    },
    Quit,
}

/// Millisecond clock shared by the host and the key reader thread.
#[derive(Debug, Clone, Copy)]
pub struct HostClock {
    started: Instant,
}

impl HostClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(started: Instant) -> Self {
        Self { started }
    }

    /// Milliseconds since the clock was created.
    pub fn now_ms(&self) -> u32 {
        self.ms_at(Instant::now())
    }

    fn ms_at(&self, instant: Instant) -> u32 {
        let elapsed = instant.saturating_duration_since(self.started);
        u32::try_from(elapsed.as_millis()).unwrap_or(u32::MAX)
    }
}

impl Default for HostClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Stand-in for the watch: keeps one-shot timer deadlines and draws the
/// face as plain lines on stdout.
///
/// The main loop polls [`TerminalHost::take_due`] and fires the controller
/// once per elapsed deadline.
#[derive(Debug, Default)]
pub struct TerminalHost {
    clock: HostClock,
    deadlines: BinaryHeap<Reverse<Instant>>,
}

impl TerminalHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock the host timestamps with, to hand to the key reader.
    pub fn clock(&self) -> HostClock {
        self.clock
    }

    /// Drop every deadline at or before `now` and return how many there were.
    pub fn take_due(&mut self, now: Instant) -> usize {
        let mut due = 0;
        while let Some(&Reverse(deadline)) = self.deadlines.peek() {
            if deadline > now {
                break;
            }
            self.deadlines.pop();
            due += 1;
        }
        due
    }
}

impl Timer for TerminalHost {
    fn schedule_once(&mut self, duration_ms: u32) {
        let deadline = Instant::now() + Duration::from_millis(duration_ms.into());
        self.deadlines.push(Reverse(deadline));
    }
}

impl Surface for TerminalHost {
    fn render_phase(&mut self, phase: Phase, running: bool) {
        println!("tick  {}", face(phase, running));
    }

    fn render_bpm(&mut self, bpm: u32) {
        println!("bpm   {bpm}");
    }

    fn render_tap_message(&mut self, message: TapMessage) {
        println!("tap   {message}");
    }
}

/// The watch draws the dot left or right of centre, and nothing while the
/// metronome is stopped.
fn face(phase: Phase, running: bool) -> &'static str {
    match (running, phase) {
        (false, _) => "         ",
        (true, Phase::Low) => "(o)      ",
        (true, Phase::High) => "      (o)",
    }
}

/// Read key presses from stdin on a background thread.
///
/// Each line is stamped with `clock` as soon as it is read. The thread ends,
/// dropping `tx`, once stdin is closed or the receiver is gone.
pub fn spawn_key_reader(
    tx: Sender<KeyMessage>,
    clock: HostClock,
) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name(THREAD_NAME.into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                let timestamp_ms = clock.now_ms();
                for message in line.chars().filter_map(|key| parse_key(key, timestamp_ms)) {
                    if tx.send(message).is_err() {
                        return;
                    }
                }
            }
            debug!("stdin closed");
        })
}

fn parse_key(key: char, timestamp_ms: u32) -> Option<KeyMessage> {
    let event = match key {
        's' => ButtonEvent::single(ButtonId::Select),
        'u' => ButtonEvent::single(ButtonId::Up),
        'U' => ButtonEvent::repeat(ButtonId::Up),
        'd' => ButtonEvent::single(ButtonId::Down),
        'D' => ButtonEvent::repeat(ButtonId::Down),
        'b' => ButtonEvent::single(ButtonId::Back),
        'q' => return Some(KeyMessage::Quit),
        _ => return None,
    };
    Some(KeyMessage::Button {
        event,
        timestamp_ms,
    })
}
