//! Resolution rules — which binding a chord triggers, and which stored
//! bindings a candidate collides with.
//!
//! Pure functions over a [`BindingSet`](crate::model::BindingSet); the
//! engine in [`broker`](crate::broker) owns the set and calls into here.

pub mod conflict;
pub mod domain;
pub mod matcher;

pub use conflict::{
    Conflict, ConflictKind, ConflictReport, RESERVED_SHORTCUTS, ReservedShortcut, Severity,
    detect_conflicts, reserved_shortcut,
};
pub use domain::{Domain, WILDCARD, normalize_host};
pub use matcher::{find_global, find_specific, match_binding};
