//! Conflict detection for a candidate binding against the stored set.
//!
//! Only a same-scope duplicate blocks a save: two bindings for one chord
//! at the identical scope would break the one-winner rule of the matcher.
//! Global/specific overlaps are reported as advisories, as are chords the
//! browser or OS reserves for itself.

use std::fmt;

use serde::Serialize;

use crate::hotkey::chord::chords_match;
use crate::model::{Binding, BindingId, BindingSet};

use super::domain::Domain;

/// How a candidate relates to an existing binding with the same chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictKind {
    /// Candidate is global; the existing binding is domain-specific and
    /// keeps winning on its domain, so the new global never fires there.
    GlobalOverride,
    /// Candidate is domain-specific; an existing global binding for the
    /// chord stops firing on the candidate's domain.
    SpecificOverride,
    /// Same chord at the identical scope.
    SameScopeDuplicate,
}

impl ConflictKind {
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::SameScopeDuplicate)
    }
}

/// One existing binding the candidate overlaps with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub existing: Binding,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let existing = &self.existing;
        match self.kind {
            ConflictKind::GlobalOverride => write!(
                f,
                "\"{}\" on {} → {} takes precedence over this global binding there",
                existing.chord, existing.domain, existing.url
            ),
            ConflictKind::SpecificOverride => write!(
                f,
                "global \"{}\" → {} will no longer fire on this domain",
                existing.chord, existing.url
            ),
            ConflictKind::SameScopeDuplicate if existing.domain.is_any() => write!(
                f,
                "\"{}\" is already a global binding → {}",
                existing.chord, existing.url
            ),
            ConflictKind::SameScopeDuplicate => write!(
                f,
                "\"{}\" is already bound on {} → {}",
                existing.chord, existing.domain, existing.url
            ),
        }
    }
}

/// Classify every existing binding sharing the candidate's chord.
///
/// `exclude` skips the binding being edited so it never conflicts with
/// itself. Bindings on a different concrete domain never conflict.
pub fn detect_conflicts(
    chord: &str,
    domain: &Domain,
    existing: &BindingSet,
    exclude: Option<BindingId>,
) -> Vec<Conflict> {
    existing
        .iter()
        .filter(|b| Some(b.id) != exclude)
        .filter(|b| chords_match(&b.chord, chord))
        .filter_map(|b| {
            let kind = match (domain, &b.domain) {
                (Domain::Any, Domain::Any) => ConflictKind::SameScopeDuplicate,
                (Domain::Any, Domain::Host(_)) => ConflictKind::GlobalOverride,
                (Domain::Host(_), Domain::Any) => ConflictKind::SpecificOverride,
                (Domain::Host(new), Domain::Host(old)) if new == old => {
                    ConflictKind::SameScopeDuplicate
                }
                (Domain::Host(_), Domain::Host(_)) => return None,
            };
            Some(Conflict {
                kind,
                existing: b.clone(),
            })
        })
        .collect()
}

/// How disruptive shadowing a reserved shortcut would be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// A chord the browser or OS already uses. Some of these never reach the
/// page at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReservedShortcut {
    pub chord: &'static str,
    pub description: &'static str,
    pub severity: Severity,
}

const fn reserved(
    chord: &'static str,
    description: &'static str,
    severity: Severity,
) -> ReservedShortcut {
    ReservedShortcut {
        chord,
        description,
        severity,
    }
}

pub const RESERVED_SHORTCUTS: &[ReservedShortcut] = &[
    reserved("Ctrl+T", "Opens new tab", Severity::High),
    reserved("Ctrl+W", "Closes tab", Severity::High),
    reserved("Ctrl+Shift+T", "Reopens closed tab", Severity::High),
    reserved("Alt+F4", "Closes browser", Severity::High),
    reserved("Alt+Tab", "Switch applications", Severity::High),
    reserved("Ctrl+R", "Refreshes page", Severity::Medium),
    reserved("Ctrl+Shift+R", "Hard refresh", Severity::Medium),
    reserved("Alt+←", "Go back", Severity::Medium),
    reserved("Alt+→", "Go forward", Severity::Medium),
    reserved("F5", "Refresh", Severity::Medium),
    reserved("Ctrl+Tab", "Next tab", Severity::Medium),
    reserved("Ctrl+Shift+Tab", "Previous tab", Severity::Medium),
    reserved("Space", "Play/pause media", Severity::Medium),
    reserved("Ctrl+H", "Opens history", Severity::Low),
    reserved("Ctrl+J", "Opens downloads", Severity::Low),
    reserved("Ctrl+L", "Focuses address bar", Severity::Low),
    reserved("Ctrl+K", "Focuses search", Severity::Low),
    reserved("Ctrl+F", "Opens find dialog", Severity::Low),
    reserved("Ctrl+P", "Opens print dialog", Severity::Low),
    reserved("Ctrl+1", "Switch to tab 1", Severity::Low),
    reserved("Ctrl+2", "Switch to tab 2", Severity::Low),
    reserved("Ctrl+3", "Switch to tab 3", Severity::Low),
    reserved("Ctrl+4", "Switch to tab 4", Severity::Low),
    reserved("Ctrl+5", "Switch to tab 5", Severity::Low),
    reserved("Ctrl+6", "Switch to tab 6", Severity::Low),
    reserved("Ctrl+7", "Switch to tab 7", Severity::Low),
    reserved("Ctrl+8", "Switch to tab 8", Severity::Low),
    reserved("Ctrl+9", "Switch to last tab", Severity::Low),
    reserved("F12", "Opens developer tools", Severity::Low),
    reserved("Ctrl+Shift+I", "Opens developer tools", Severity::Low),
    reserved("Ctrl+Shift+J", "Opens console", Severity::Low),
    reserved("Ctrl+Shift+C", "Inspect element", Severity::Low),
    reserved("F", "Fullscreen video", Severity::Low),
    reserved("M", "Mute video", Severity::Low),
];

/// Look up `chord` in the reserved table.
pub fn reserved_shortcut(chord: &str) -> Option<&'static ReservedShortcut> {
    RESERVED_SHORTCUTS
        .iter()
        .find(|r| chords_match(r.chord, chord))
}

impl fmt::Display for ReservedShortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} is a {} priority browser shortcut: {}",
            self.chord, self.severity, self.description
        )
    }
}

/// Everything a candidate runs into: stored-binding conflicts plus the
/// reserved-shortcut warning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictReport {
    pub conflicts: Vec<Conflict>,
    pub reserved: Option<&'static ReservedShortcut>,
}

impl ConflictReport {
    pub fn check(
        chord: &str,
        domain: &Domain,
        existing: &BindingSet,
        exclude: Option<BindingId>,
    ) -> Self {
        Self {
            conflicts: detect_conflicts(chord, domain, existing, exclude),
            reserved: reserved_shortcut(chord),
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.conflicts.iter().any(|c| c.kind.is_blocking())
    }

    pub fn blocking(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts.iter().filter(|c| c.kind.is_blocking())
    }

    pub fn advisories(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts.iter().filter(|c| !c.kind.is_blocking())
    }

    pub fn is_clear(&self) -> bool {
        self.conflicts.is_empty() && self.reserved.is_none()
    }
}
