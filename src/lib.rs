//! shortkey — bind keyboard chords to URLs, globally or per domain.
//!
//! A page context feeds key events to a [`PageListener`]; the listener
//! normalizes the chord, asks its [`Engine`] for the winning binding and
//! hands back a [`Navigation`]. The configuration surface drives the same
//! engine to add, update and delete bindings, which pushes a `clearCache`
//! message to every other context afterward.
//!
//! Storage and navigation are host primitives injected through the
//! [`KeyValueStore`] and [`Navigator`] traits.

pub mod broker;
pub mod config;
pub mod hotkey;
pub mod model;
pub mod resolver;
pub mod store;

pub use broker::{Engine, EngineError, Navigation, Navigator, Notifier, Saved};
pub use hotkey::{KeyOutcome, KeyPress, PageEvent, PageListener};
pub use model::{Binding, BindingId, BindingSet, Candidate, Color, Theme};
pub use store::{KeyValueStore, StoreError};
