//! Focus detection — is the user typing into an editable surface?
//!
//! The listener must never eat keystrokes meant for a text field, so every
//! key event is checked against the focused element first. Editable means
//! a text-like `<input>`, a `<textarea>`, or anything inside a
//! contenteditable region.

use std::convert::Infallible;
use std::str::FromStr;

/// `<input>` types that take clicks rather than text.
const NON_TEXT_INPUT_TYPES: [&str; 5] = ["checkbox", "radio", "button", "submit", "reset"];

/// The element holding input focus when a key event fired.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusTarget {
    /// Element tag name, any case (`"INPUT"`, `"div"`).
    pub tag: String,
    /// The `type` attribute of an `<input>`; `None` means the default
    /// (`text`).
    pub input_type: Option<String>,
    /// Whether the element is inside a contenteditable region.
    pub content_editable: bool,
}

impl FocusTarget {
    pub fn element(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn input(input_type: impl Into<String>) -> Self {
        Self {
            tag: "input".into(),
            input_type: Some(input_type.into()),
            content_editable: false,
        }
    }

    pub fn editable(mut self) -> Self {
        self.content_editable = true;
        self
    }

    /// Whether keystrokes on this element belong to the user's typing.
    pub fn is_editable(&self) -> bool {
        if self.content_editable {
            return true;
        }

        if self.tag.eq_ignore_ascii_case("textarea") {
            return true;
        }

        if self.tag.eq_ignore_ascii_case("input") {
            let input_type = self
                .input_type
                .as_deref()
                .map(str::to_ascii_lowercase)
                .unwrap_or_else(|| "text".to_string());
            return !NON_TEXT_INPUT_TYPES.contains(&input_type.as_str());
        }

        false
    }
}

/// Whether the focused element (if any) is an editable surface.
///
/// No focused element means the document body has focus, which is not
/// editable.
pub fn is_user_typing(focus: Option<&FocusTarget>) -> bool {
    focus.is_some_and(FocusTarget::is_editable)
}

/// Compact text form used on the command line: `tag`, `tag:type`, or
/// either with a trailing `!` for contenteditable (`div!`).
impl FromStr for FocusTarget {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (s, content_editable) = match s.strip_suffix('!') {
            Some(rest) => (rest, true),
            None => (s, false),
        };

        let (tag, input_type) = match s.split_once(':') {
            Some((tag, ty)) => (tag, Some(ty.to_string())),
            None => (s, None),
        };

        Ok(Self {
            tag: tag.to_string(),
            input_type,
            content_editable,
        })
    }
}
