use log::{debug, warn};

use crate::host::{Surface, Timer};

const MS_PER_MINUTE: u32 = 60_000;

/// Two-state pulse indicator, flipped on every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Low,
    High,
}

impl Phase {
    pub fn toggled(self) -> Self {
        match self {
            Phase::Low => Phase::High,
            Phase::High => Phase::Low,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Phase::Low => 0,
            Phase::High => 1,
        }
    }
}

/// Self-rescheduling one-shot tick train.
///
/// Each fire arms the next timer using the BPM current at fire time, so rate
/// changes land on the next beat boundary. There is no way to cancel an armed
/// timer: `stop` only clears the running flag and the pending fire then ends
/// the train.
#[derive(Debug, Default)]
pub struct TickScheduler {
    phase: Phase,
    running: bool,
    armed: bool,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start<H: Timer>(&mut self, bpm: u32, host: &mut H) {
        self.running = true;
        if self.armed {
            // The pending fire sees `running` and keeps the train going.
            debug!("tick already armed, not scheduling another");
            return;
        }
        self.arm(bpm, host);
    }

    pub fn on_fire<H: Timer + Surface>(&mut self, bpm: u32, host: &mut H) {
        self.armed = false;
        self.phase = self.phase.toggled();
        host.render_phase(self.phase, self.running);

        if self.running {
            self.arm(bpm, host);
        } else {
            debug!("tick train stopped at phase {}", self.phase.index());
        }
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    #[cfg(test)]
    fn phase(&self) -> Phase {
        self.phase
    }

    fn arm<H: Timer>(&mut self, bpm: u32, host: &mut H) {
        match period_from_bpm(bpm) {
            Some(period) => {
                debug!("next tick in {period} ms ({bpm} BPM)");
                host.schedule_once(period);
                self.armed = true;
            }
            None => warn!("refusing to schedule a tick at 0 BPM"),
        }
    }
}

/// Milliseconds between ticks, never less than one. `None` for 0 BPM.
pub fn period_from_bpm(bpm: u32) -> Option<u32> {
    MS_PER_MINUTE.checked_div(bpm).map(|period| period.max(1))
}
