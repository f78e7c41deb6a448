use std::fmt;

use crate::tick_scheduler::Phase;

/// One-shot timer provided by the host.
///
/// When the duration elapses the host calls back into
/// [`MetronomeController::on_fire`](crate::metronome::MetronomeController::on_fire)
/// on the same thread that handles input.
pub trait Timer {
    fn schedule_once(&mut self, duration_ms: u32);
}

/// Output side of the host: whatever draws the watch face.
pub trait Surface {
    /// Repaint the pulsing indicator. The indicator is only drawn while the
    /// metronome is `running`; a tick landing after a stop blanks it.
    fn render_phase(&mut self, phase: Phase, running: bool);

    /// Update the numeric BPM display.
    fn render_bpm(&mut self, bpm: u32);

    /// Update the status line of the tap-tempo screen.
    fn render_tap_message(&mut self, message: TapMessage);
}

/// Status line of the tap-tempo screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapMessage {
    BeatTime,
    Bpm(u32),
}

impl fmt::Display for TapMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TapMessage::BeatTime => f.write_str("Beat time"),
            TapMessage::Bpm(bpm) => write!(f, "{bpm}"),
        }
    }
}
