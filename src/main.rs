mod config;
mod host;
mod metronome;
mod tap_tempo;
mod tick_scheduler;
mod watch;

use std::{
    path::PathBuf,
    sync::mpsc::{self, TryRecvError},
    thread,
    time::{Duration, Instant},
};

use anyhow::Context;
use clap::Parser;
use log::info;

use config::Config;
use metronome::{Flow, MetronomeController};
use watch::{KeyMessage, TerminalHost};

const POLL_INTERVAL_MS: u64 = 2;

/// Metronome with tap-tempo detection, driven from the keyboard.
///
/// Keys (followed by Enter): s = select, u/U = up (press/hold),
/// d/D = down (press/hold), b = back, q = quit.
#[derive(Debug, Parser)]
#[command(name = "tap-metronome", version)]
struct Args {
    /// YAML file with metronome settings.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Config::default(),
    };
    info!(
        "starting at {} BPM, range {}..={}",
        config.initial_bpm, config.min_bpm, config.max_bpm
    );

    let (tx, rx) = mpsc::channel::<KeyMessage>();
    let mut host = TerminalHost::new();
    watch::spawn_key_reader(tx, host.clock()).context("spawning key reader")?;

    let mut controller = MetronomeController::new(&config);
    controller.appear(&mut host);

    loop {
        // Drain key presses.
        loop {
            let (event, timestamp_ms) = match rx.try_recv() {
                Ok(KeyMessage::Button {
                    event,
                    timestamp_ms,
                }) => (event, timestamp_ms),
                Ok(KeyMessage::Quit) | Err(TryRecvError::Disconnected) => return Ok(()),
                Err(TryRecvError::Empty) => break,
            };

            let Some(action) = watch::action_for(controller.mode(), event, timestamp_ms) else {
                continue;
            };
            if controller.handle(action, &mut host) == Flow::Exit {
                info!("stopped at {} BPM", controller.bpm());
                return Ok(());
            }
        }

        for _ in 0..host.take_due(Instant::now()) {
            controller.on_fire(&mut host);
        }

        thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
    }
}
