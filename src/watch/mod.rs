mod buttons;
mod terminal;

pub use buttons::action_for;
pub use terminal::{spawn_key_reader, KeyMessage, TerminalHost};
