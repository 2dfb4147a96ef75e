//! Persisted data — bindings, the ordered binding set, and display tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hotkey::chord::{self, ChordError};
use crate::resolver::domain::Domain;

/// Candidate rejected before any conflict check or storage round-trip.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("url is empty")]
    EmptyUrl,
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("chord is empty")]
    EmptyChord,
    #[error("invalid chord: {0}")]
    Chord(#[from] ChordError),
    #[error("domain is missing")]
    MissingDomain,
    #[error("invalid domain '{0}'")]
    InvalidDomain(String),
}

/// Stable identifier assigned when a binding is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BindingId(Uuid);

impl BindingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BindingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for BindingId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Display tag. Has no effect on matching or navigation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    #[default]
    Default,
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
}

impl Color {
    pub const ALL: [Color; 7] = [
        Self::Default,
        Self::Red,
        Self::Orange,
        Self::Yellow,
        Self::Green,
        Self::Blue,
        Self::Purple,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Red => "red",
            Self::Orange => "orange",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Purple => "purple",
        }
    }
}

/// Display theme of the configuration surface, persisted under its own key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn name(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }
}

/// Unrecognized enumeration value from user input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl FromStr for Color {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant {
                kind: "color",
                value: s.to_string(),
            })
    }
}

impl FromStr for Theme {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Self::Dark),
            "light" => Ok(Self::Light),
            _ => Err(UnknownVariant {
                kind: "theme",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A chord bound to a URL within a domain scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub id: BindingId,
    pub url: String,
    /// Canonical chord, see [`chord`](crate::hotkey::chord).
    pub chord: String,
    pub domain: Domain,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub open_in_new_tab: bool,
}

impl Binding {
    /// Whether `candidate` carries the same user-visible fields.
    pub fn same_as(&self, candidate: &Validated) -> bool {
        self.url == candidate.url
            && self.chord == candidate.chord
            && self.domain == candidate.domain
            && self.color == candidate.color
            && self.open_in_new_tab == candidate.open_in_new_tab
    }
}

/// Unvalidated user input for `add` / `update`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
    /// Chord text; canonicalized during validation.
    pub chord: String,
    /// Raw domain text; `*` for global.
    pub domain: String,
    pub color: Color,
    pub open_in_new_tab: bool,
}

impl Candidate {
    pub fn new(
        url: impl Into<String>,
        chord: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            chord: chord.into(),
            domain: domain.into(),
            ..Default::default()
        }
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn new_tab(mut self, open_in_new_tab: bool) -> Self {
        self.open_in_new_tab = open_in_new_tab;
        self
    }

    /// Check URL, chord and domain, producing the canonical fields.
    pub fn validate(&self) -> Result<Validated, ValidationError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(ValidationError::EmptyUrl);
        }
        url::Url::parse(url).map_err(|e| ValidationError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if self.chord.trim().is_empty() {
            return Err(ValidationError::EmptyChord);
        }
        let chord = chord::parse_chord(&self.chord)?;

        let domain = Domain::parse(&self.domain)?;

        Ok(Validated {
            url: url.to_string(),
            chord,
            domain,
            color: self.color,
            open_in_new_tab: self.open_in_new_tab,
        })
    }
}

/// A candidate that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated {
    pub url: String,
    pub chord: String,
    pub domain: Domain,
    pub color: Color,
    pub open_in_new_tab: bool,
}

impl Validated {
    pub fn into_binding(self, id: BindingId) -> Binding {
        Binding {
            id,
            url: self.url,
            chord: self.chord,
            domain: self.domain,
            color: self.color,
            open_in_new_tab: self.open_in_new_tab,
        }
    }
}

/// Bindings in insertion order.
///
/// Order only matters for display; lookups go through [`BindingId`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BindingSet(Vec<Binding>);

/// Record shape as found in storage, including records written before
/// bindings had ids (chord under `shortkey`, no `openInNewTab`). Chord and
/// domain stay raw text here and are canonicalized one record at a time.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredBinding {
    #[serde(default)]
    id: Option<BindingId>,
    url: String,
    #[serde(alias = "shortkey")]
    chord: String,
    domain: String,
    #[serde(default)]
    color: Option<Color>,
    #[serde(default)]
    open_in_new_tab: Option<bool>,
}

impl StoredBinding {
    /// Canonical binding, plus whether anything differs from the record.
    fn into_binding(self) -> Result<(Binding, bool), ValidationError> {
        let chord = chord::parse_chord(&self.chord)?;
        let domain = Domain::parse(&self.domain)?;

        let changed = self.id.is_none()
            || chord != self.chord
            || domain.to_string() != self.domain
            || self.color.is_none()
            || self.open_in_new_tab.is_none();

        let binding = Binding {
            id: self.id.unwrap_or_default(),
            url: self.url,
            chord,
            domain,
            color: self.color.unwrap_or_default(),
            open_in_new_tab: self.open_in_new_tab.unwrap_or(false),
        };
        Ok((binding, changed))
    }
}

impl BindingSet {
    pub fn new(bindings: Vec<Binding>) -> Self {
        Self(bindings)
    }

    /// Decode the stored value into canonical bindings.
    ///
    /// Records without an id get one, and chords and domains are brought
    /// into canonical form. A record that cannot be decoded, or that
    /// repeats an earlier chord at the same scope, is dropped with a
    /// warning instead of failing the whole set. The flag is `true` when
    /// the result differs from what was stored and must be written back.
    pub fn from_stored(value: serde_json::Value) -> Result<(Self, bool), serde_json::Error> {
        let records: Vec<serde_json::Value> = serde_json::from_value(value)?;
        let mut rewrite = false;
        let mut set = Self::default();

        for (index, record) in records.into_iter().enumerate() {
            let decoded = serde_json::from_value::<StoredBinding>(record)
                .map_err(|e| e.to_string())
                .and_then(|s| s.into_binding().map_err(|e| e.to_string()));

            let (binding, changed) = match decoded {
                Ok(decoded) => decoded,
                Err(error) => {
                    tracing::warn!(index, %error, "dropping unreadable stored binding");
                    rewrite = true;
                    continue;
                }
            };

            if let Some(kept) = set.iter().find(|b| {
                b.domain == binding.domain && chord::chords_match(&b.chord, &binding.chord)
            }) {
                tracing::warn!(
                    index,
                    chord = %binding.chord,
                    domain = %binding.domain,
                    kept = %kept.url,
                    dropped = %binding.url,
                    "dropping duplicate stored binding"
                );
                rewrite = true;
                continue;
            }

            rewrite |= changed;
            set.push(binding);
        }

        Ok((set, rewrite))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Binding> {
        self.0.iter()
    }

    pub fn get(&self, id: BindingId) -> Option<&Binding> {
        self.0.iter().find(|b| b.id == id)
    }

    /// Display position of `id`.
    pub fn position(&self, id: BindingId) -> Option<usize> {
        self.0.iter().position(|b| b.id == id)
    }

    /// Id of the binding shown at `index`.
    pub fn id_at(&self, index: usize) -> Option<BindingId> {
        self.0.get(index).map(|b| b.id)
    }

    pub fn push(&mut self, binding: Binding) {
        self.0.push(binding);
    }

    /// Replace the binding with the same id in place. Returns the old one.
    pub fn replace(&mut self, binding: Binding) -> Option<Binding> {
        let slot = self.0.iter_mut().find(|b| b.id == binding.id)?;
        Some(std::mem::replace(slot, binding))
    }

    pub fn remove(&mut self, id: BindingId) -> Option<Binding> {
        let index = self.position(id)?;
        Some(self.0.remove(index))
    }
}

impl<'a> IntoIterator for &'a BindingSet {
    type Item = &'a Binding;
    type IntoIter = std::slice::Iter<'a, Binding>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
