//! Chord normalization — raw key presses and typed text to canonical chords.
//!
//! A chord is the `+`-joined form of a key combination: held modifiers in
//! the fixed order Ctrl, Shift, Alt, then one display token for the main
//! key (`"Ctrl+Shift+K"`, `"Alt+←"`, `"Page Up"`). The same string is
//! stored and compared at runtime. Comparison is case-insensitive over the
//! whole chord, never per segment.

use std::fmt;

/// Chord text parse failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChordError {
    /// Nothing but whitespace.
    #[error("chord is empty")]
    Empty,
    /// Only modifiers, no main key.
    #[error("chord has no main key, only modifiers")]
    MissingKey,
    /// Same modifier named twice (`Alt+Alt`).
    #[error("duplicate modifier: {0}")]
    DuplicateModifier(Modifier),
    /// More than one main key (`A+B`).
    #[error("multiple main keys: {0} and {1}")]
    MultipleKeys(String, String),
    /// Token is neither a modifier nor a representable key.
    #[error("unknown key '{0}'")]
    UnknownKey(String),
}

/// Modifier that can take part in a chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Ctrl,
    Shift,
    Alt,
}

impl Modifier {
    pub fn name(self) -> &'static str {
        match self {
            Self::Ctrl => "Ctrl",
            Self::Shift => "Shift",
            Self::Alt => "Alt",
        }
    }

    fn from_token(lower: &str) -> Option<Self> {
        match lower {
            "ctrl" | "control" => Some(Self::Ctrl),
            "shift" => Some(Self::Shift),
            "alt" => Some(Self::Alt),
            _ => None,
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A key-press as delivered by the input layer.
///
/// `key` is the raw identifier (`"k"`, `"K"`, `"Escape"`, `"ArrowUp"`,
/// `"F5"`, `" "`, or a bare modifier such as `"Control"`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPress {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub key: String,
}

impl KeyPress {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }
}

/// Raw identifiers of keys that are themselves modifiers.
const MODIFIER_KEYS: [&str; 5] = ["control", "ctrl", "shift", "alt", "meta"];

/// Normalize a key-press into its canonical chord.
///
/// Returns an empty string when the press carries no representable chord:
/// a bare modifier (the user is still composing) or a key with no display
/// token. Never fails; the listener treats the empty chord as "no action".
pub fn normalize(press: &KeyPress) -> String {
    let lower = press.key.to_lowercase();
    if MODIFIER_KEYS.contains(&lower.as_str()) {
        return String::new();
    }

    let Some(token) = key_token(&lower) else {
        return String::new();
    };

    join(press.ctrl, press.shift, press.alt, &token)
}

/// Parse user-entered chord text (`"ctrl+shift+k"`, `"Alt+←"`,
/// `"shift + page up"`) into the canonical chord.
///
/// Tokens may appear in any order; the result always lists modifiers as
/// Ctrl, Shift, Alt followed by the main key, so parsed chords compare
/// equal to what [`normalize`] produces for the same keys.
pub fn parse_chord(text: &str) -> Result<String, ChordError> {
    if text.trim().is_empty() {
        return Err(ChordError::Empty);
    }

    let (mut ctrl, mut shift, mut alt) = (false, false, false);
    let mut main: Option<(String, String)> = None;

    for raw in text.split('+') {
        let token = raw.trim();
        let lower = token.to_lowercase();

        if let Some(modifier) = Modifier::from_token(&lower) {
            let held = match modifier {
                Modifier::Ctrl => &mut ctrl,
                Modifier::Shift => &mut shift,
                Modifier::Alt => &mut alt,
            };
            if *held {
                return Err(ChordError::DuplicateModifier(modifier));
            }
            *held = true;
            continue;
        }

        let display = key_token(&lower)
            .or_else(|| display_alias(&lower))
            .ok_or_else(|| ChordError::UnknownKey(token.to_string()))?;

        if let Some((first, _)) = &main {
            return Err(ChordError::MultipleKeys(first.clone(), token.to_string()));
        }
        main = Some((token.to_string(), display));
    }

    let (_, key) = main.ok_or(ChordError::MissingKey)?;
    Ok(join(ctrl, shift, alt, &key))
}

/// Case-insensitive comparison over the full chord string.
pub fn chords_match(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn join(ctrl: bool, shift: bool, alt: bool, key: &str) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(4);
    if ctrl {
        parts.push(Modifier::Ctrl.name());
    }
    if shift {
        parts.push(Modifier::Shift.name());
    }
    if alt {
        parts.push(Modifier::Alt.name());
    }
    parts.push(key);
    parts.join("+")
}

/// Display token for a lowercased raw key identifier.
fn key_token(lower: &str) -> Option<String> {
    let named = match lower {
        " " => "Space",
        "escape" => "Esc",
        "tab" => "Tab",
        "enter" => "Enter",
        "backspace" => "Backspace",
        "delete" => "Delete",
        "insert" => "Insert",
        "home" => "Home",
        "end" => "End",
        "pageup" => "Page Up",
        "pagedown" => "Page Down",
        "arrowup" => "↑",
        "arrowdown" => "↓",
        "arrowleft" => "←",
        "arrowright" => "→",
        _ => {
            let mut chars = lower.chars();
            return match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphanumeric() => {
                    Some(c.to_ascii_uppercase().to_string())
                }
                _ => function_key(lower),
            };
        }
    };
    Some(named.to_string())
}

/// `f1`..`f12` → `F1`..`F12`.
fn function_key(lower: &str) -> Option<String> {
    let n: u8 = lower.strip_prefix('f')?.parse().ok()?;
    (1..=12).contains(&n).then(|| format!("F{n}"))
}

/// Tokens that only appear in typed chord text: the display tokens
/// themselves and a few common spellings.
fn display_alias(lower: &str) -> Option<String> {
    let display = match lower {
        "space" => "Space",
        "esc" => "Esc",
        "page up" => "Page Up",
        "page down" => "Page Down",
        "up" | "↑" => "↑",
        "down" | "↓" => "↓",
        "left" | "←" => "←",
        "right" | "→" => "→",
        _ => return None,
    };
    Some(display.to_string())
}
