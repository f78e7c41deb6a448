use std::ops::RangeInclusive;

use log::{debug, info};

use crate::{
    config::Config,
    host::{Surface, TapMessage, Timer},
    tap_tempo::TempoEstimator,
    tick_scheduler::TickScheduler,
};

/// Which screen currently owns the buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Metronome,
    TapTempo,
}

/// Discrete input the controller reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    EnterTapMode,
    ExitTapMode,
    Tap { timestamp_ms: u32 },
    Increase,
    Decrease,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Binds user input to the tempo estimator and the tick scheduler.
///
/// In `Metronome` mode the tick train runs and up/down adjust the BPM within
/// the configured range. In `TapTempo` mode the train is stopped and taps feed
/// the estimator; leaving the mode commits the last estimate.
///
/// The committed tap estimate is not clamped to the configured range, only the
/// up/down buttons are.
#[derive(Debug)]
pub struct MetronomeController {
    mode: Mode,
    bpm: u32,
    bpm_range: RangeInclusive<u32>,
    candidate: Option<u32>,
    estimator: TempoEstimator,
    scheduler: TickScheduler,
}

impl MetronomeController {
    pub fn new(config: &Config) -> Self {
        Self {
            mode: Mode::Metronome,
            bpm: config.initial_bpm,
            bpm_range: config.bpm_range(),
            candidate: None,
            estimator: TempoEstimator::new(config.tap_history),
            scheduler: TickScheduler::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    pub fn handle<H: Timer + Surface>(&mut self, action: Action, host: &mut H) -> Flow {
        match action {
            Action::EnterTapMode => self.enter_tap_mode(host),
            Action::ExitTapMode => self.exit_tap_mode(host),
            Action::Tap { timestamp_ms } => self.tap(timestamp_ms, host),
            Action::Increase => self.increase(host),
            Action::Decrease => self.decrease(host),
            Action::Quit => return Flow::Exit,
        }
        Flow::Continue
    }

    /// Show the metronome screen and get the tick train going.
    pub fn appear<H: Timer + Surface>(&mut self, host: &mut H) {
        host.render_bpm(self.bpm);
        self.scheduler.start(self.bpm, host);
    }

    pub fn enter_tap_mode<H: Surface>(&mut self, host: &mut H) {
        if self.mode != Mode::Metronome {
            debug!("already in tap mode");
            return;
        }

        self.mode = Mode::TapTempo;
        self.scheduler.stop();
        self.estimator.reset();
        self.candidate = None;
        host.render_tap_message(TapMessage::BeatTime);
        info!("tap mode, metronome paused at {} BPM", self.bpm);
    }

    pub fn tap<H: Surface>(&mut self, timestamp_ms: u32, host: &mut H) {
        if self.mode != Mode::TapTempo {
            debug!("tap ignored outside tap mode");
            return;
        }

        self.estimator.record_tap(timestamp_ms);
        let Some(bpm) = self.estimator.current_bpm() else {
            return;
        };

        debug!("estimate {bpm} BPM from {} taps", self.estimator.len());
        self.candidate = Some(bpm);
        host.render_tap_message(TapMessage::Bpm(bpm));
    }

    pub fn exit_tap_mode<H: Timer + Surface>(&mut self, host: &mut H) {
        if self.mode != Mode::TapTempo {
            debug!("not in tap mode");
            return;
        }

        self.mode = Mode::Metronome;
        if self.estimator.is_empty() {
            debug!("left tap mode without tapping");
        }
        self.estimator.reset();
        host.render_tap_message(TapMessage::BeatTime);

        // An interval above one minute truncates to 0 BPM, which is never used.
        match self.candidate.take().filter(|&bpm| bpm > 0) {
            Some(bpm) => {
                self.bpm = bpm;
                info!("tapped tempo committed: {bpm} BPM");
            }
            None => info!("no tapped tempo, keeping {} BPM", self.bpm),
        }

        self.appear(host);
    }

    pub fn increase<H: Surface>(&mut self, host: &mut H) {
        if !self.adjustable() {
            return;
        }
        if self.bpm < *self.bpm_range.end() {
            self.bpm += 1;
            host.render_bpm(self.bpm);
        }
    }

    pub fn decrease<H: Surface>(&mut self, host: &mut H) {
        if !self.adjustable() {
            return;
        }
        if self.bpm > *self.bpm_range.start() {
            self.bpm -= 1;
            host.render_bpm(self.bpm);
        }
    }

    /// Host callback for an elapsed tick timer.
    pub fn on_fire<H: Timer + Surface>(&mut self, host: &mut H) {
        self.scheduler.on_fire(self.bpm, host);
    }

    fn adjustable(&self) -> bool {
        let adjustable = self.mode == Mode::Metronome && self.scheduler.is_running();
        if !adjustable {
            debug!("tempo adjustment ignored in {:?} mode", self.mode);
        }
        adjustable
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, Flow, MetronomeController, Mode};
    use crate::{
        config::Config,
        host::{
            testing::{RecordingHost, Rendered},
            TapMessage,
        },
        tick_scheduler::Phase,
    };

    fn running(initial_bpm: u32) -> (MetronomeController, RecordingHost) {
        let config = Config {
            initial_bpm,
            ..Config::default()
        };
        let mut controller = MetronomeController::new(&config);
        let mut host = RecordingHost::default();
        controller.appear(&mut host);
        (controller, host)
    }

    fn tap_all(controller: &mut MetronomeController, host: &mut RecordingHost, taps: &[u32]) {
        for &t in taps {
            controller.tap(t, host);
        }
    }

    #[test]
    fn appear_renders_and_starts() {
        let (controller, host) = running(60);

        assert_eq!(controller.mode(), Mode::Metronome);
        assert_eq!(host.rendered, vec![Rendered::Bpm(60)]);
        assert_eq!(host.armed, vec![1_000]);
    }

    #[test]
    fn increase_and_decrease_step_by_one() {
        let (mut controller, mut host) = running(60);
        host.clear();

        controller.increase(&mut host);
        controller.increase(&mut host);
        controller.decrease(&mut host);

        assert_eq!(controller.bpm(), 61);
        assert_eq!(
            host.rendered,
            vec![Rendered::Bpm(61), Rendered::Bpm(62), Rendered::Bpm(61)]
        );
    }

    #[test]
    fn increase_saturates_at_max() {
        let (mut controller, mut host) = running(500);
        host.clear();

        controller.increase(&mut host);

        assert_eq!(controller.bpm(), 500);
        assert!(host.rendered.is_empty());
    }

    #[test]
    fn decrease_saturates_at_min() {
        let (mut controller, mut host) = running(10);
        host.clear();

        controller.decrease(&mut host);

        assert_eq!(controller.bpm(), 10);
        assert!(host.rendered.is_empty());
    }

    #[test]
    fn adjustment_needs_running_metronome() {
        let config = Config::default();
        let mut controller = MetronomeController::new(&config);
        let mut host = RecordingHost::default();

        controller.increase(&mut host);
        assert_eq!(controller.bpm(), 60);

        controller.appear(&mut host);
        controller.enter_tap_mode(&mut host);
        controller.decrease(&mut host);
        assert_eq!(controller.bpm(), 60);
    }

    #[test]
    fn bpm_change_applies_on_next_tick() {
        let (mut controller, mut host) = running(60);

        for _ in 0..60 {
            controller.increase(&mut host);
        }
        controller.on_fire(&mut host);

        assert_eq!(host.armed, vec![1_000, 500]);
    }

    #[test]
    fn tap_session_commits_estimate() {
        let (mut controller, mut host) = running(60);

        controller.enter_tap_mode(&mut host);
        assert_eq!(controller.mode(), Mode::TapTempo);

        tap_all(&mut controller, &mut host, &[0, 500, 1_000, 1_500]);
        assert_eq!(
            host.rendered.last(),
            Some(&Rendered::TapMessage(TapMessage::Bpm(120)))
        );

        controller.exit_tap_mode(&mut host);

        assert_eq!(controller.mode(), Mode::Metronome);
        assert_eq!(controller.bpm(), 120);
        assert_eq!(
            &host.rendered[host.rendered.len() - 2..],
            &[
                Rendered::TapMessage(TapMessage::BeatTime),
                Rendered::Bpm(120)
            ]
        );
    }

    #[test]
    fn tap_mode_ends_tick_train_lazily() {
        let (mut controller, mut host) = running(60);

        controller.enter_tap_mode(&mut host);
        controller.on_fire(&mut host);

        assert_eq!(host.armed, vec![1_000]);
        // The tap screen is up, so the late tick blanks the indicator.
        assert!(host.rendered.contains(&Rendered::Phase {
            phase: Phase::High,
            running: false
        }));

        controller.exit_tap_mode(&mut host);
        assert_eq!(host.armed, vec![1_000, 1_000]);
    }

    #[test]
    fn quick_tap_session_keeps_single_train() {
        let (mut controller, mut host) = running(60);

        controller.enter_tap_mode(&mut host);
        tap_all(&mut controller, &mut host, &[0, 500]);
        controller.exit_tap_mode(&mut host);

        // The timer armed at 60 BPM is still pending and carries the train.
        assert_eq!(host.armed, vec![1_000]);

        controller.on_fire(&mut host);
        assert_eq!(host.armed, vec![1_000, 500]);
    }

    #[test]
    fn exit_without_estimate_keeps_bpm() {
        let (mut controller, mut host) = running(75);

        controller.enter_tap_mode(&mut host);
        controller.exit_tap_mode(&mut host);
        assert_eq!(controller.bpm(), 75);

        controller.enter_tap_mode(&mut host);
        controller.tap(1_000, &mut host);
        controller.exit_tap_mode(&mut host);
        assert_eq!(controller.bpm(), 75);
    }

    #[test]
    fn estimate_does_not_leak_into_next_session() {
        let (mut controller, mut host) = running(60);

        controller.enter_tap_mode(&mut host);
        tap_all(&mut controller, &mut host, &[0, 400]);
        controller.exit_tap_mode(&mut host);
        assert_eq!(controller.bpm(), 150);

        controller.increase(&mut host);
        controller.enter_tap_mode(&mut host);
        tap_all(&mut controller, &mut host, &[5_000]);
        controller.exit_tap_mode(&mut host);
        assert_eq!(controller.bpm(), 151);
    }

    #[test]
    fn tapped_tempo_is_not_clamped() {
        let (mut controller, mut host) = running(60);

        controller.enter_tap_mode(&mut host);
        tap_all(&mut controller, &mut host, &[0, 100]);
        controller.exit_tap_mode(&mut host);
        assert_eq!(controller.bpm(), 600);

        controller.increase(&mut host);
        assert_eq!(controller.bpm(), 600);
        controller.decrease(&mut host);
        assert_eq!(controller.bpm(), 599);
    }

    #[test]
    fn zero_bpm_estimate_is_not_committed() {
        let (mut controller, mut host) = running(60);

        controller.enter_tap_mode(&mut host);
        tap_all(&mut controller, &mut host, &[0, 61_000]);
        assert_eq!(
            host.rendered.last(),
            Some(&Rendered::TapMessage(TapMessage::Bpm(0)))
        );

        controller.exit_tap_mode(&mut host);
        assert_eq!(controller.bpm(), 60);
    }

    #[test]
    fn same_millisecond_taps_are_ignored() {
        let (mut controller, mut host) = running(60);

        controller.enter_tap_mode(&mut host);
        host.clear();
        tap_all(&mut controller, &mut host, &[300, 300]);

        assert!(host.rendered.is_empty());
    }

    #[test]
    fn tap_outside_tap_mode_is_ignored() {
        let (mut controller, mut host) = running(60);
        host.clear();

        controller.tap(0, &mut host);
        controller.tap(500, &mut host);
        controller.exit_tap_mode(&mut host);

        assert!(host.rendered.is_empty());
        assert_eq!(controller.bpm(), 60);
    }

    #[test]
    fn handle_dispatches_actions() {
        let (mut controller, mut host) = running(60);

        let flows = [
            controller.handle(Action::Increase, &mut host),
            controller.handle(Action::EnterTapMode, &mut host),
            controller.handle(Action::Tap { timestamp_ms: 0 }, &mut host),
            controller.handle(Action::Tap { timestamp_ms: 250 }, &mut host),
            controller.handle(Action::ExitTapMode, &mut host),
            controller.handle(Action::Decrease, &mut host),
        ];

        assert!(flows.iter().all(|&flow| flow == Flow::Continue));
        assert_eq!(controller.bpm(), 239);
        assert_eq!(controller.handle(Action::Quit, &mut host), Flow::Exit);
    }
}
