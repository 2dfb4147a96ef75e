//! Page-side key handling — chord normalization, focus detection, and the
//! listener that turns key events into navigation.

pub mod chord;
pub mod focus;
pub mod listener;

pub use chord::{ChordError, KeyPress, Modifier, chords_match, normalize, parse_chord};
pub use focus::{FocusTarget, is_user_typing};
pub use listener::{KeyOutcome, PageEvent, PageListener, Passthrough};
