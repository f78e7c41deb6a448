use crate::metronome::{Action, Mode};

/// Physical buttons of the watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonId {
    Select,
    Up,
    Down,
    Back,
}

/// A fresh press, or an auto-repeat while the button is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    Single,
    Repeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    pub id: ButtonId,
    pub kind: ClickKind,
}

impl ButtonEvent {
    pub fn single(id: ButtonId) -> Self {
        Self {
            id,
            kind: ClickKind::Single,
        }
    }

    pub fn repeat(id: ButtonId) -> Self {
        Self {
            id,
            kind: ClickKind::Repeat,
        }
    }
}

/// Translate a button press into a controller action for the screen that
/// currently has focus.
///
/// The metronome screen repeats up/down while held. The tap screen only
/// listens for single clicks on down, and back pops it, which ends the tap
/// session. Back on the metronome screen leaves the app.
pub fn action_for(mode: Mode, event: ButtonEvent, now_ms: u32) -> Option<Action> {
    match (mode, event.id, event.kind) {
        (Mode::Metronome, ButtonId::Select, ClickKind::Single) => Some(Action::EnterTapMode),
        (Mode::Metronome, ButtonId::Up, _) => Some(Action::Increase),
        (Mode::Metronome, ButtonId::Down, _) => Some(Action::Decrease),
        (Mode::Metronome, ButtonId::Back, _) => Some(Action::Quit),
        (Mode::TapTempo, ButtonId::Down, ClickKind::Single) => Some(Action::Tap {
            timestamp_ms: now_ms,
        }),
        (Mode::TapTempo, ButtonId::Back, _) => Some(Action::ExitTapMode),
        _ => None,
    }
}
