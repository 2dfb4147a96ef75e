//! Domain scopes — the wildcard `*` or one normalized hostname.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::ValidationError;

/// Wildcard scope marker, as stored.
pub const WILDCARD: &str = "*";

static SCHEME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://").expect("scheme pattern is valid")
});

/// Where a binding applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Domain {
    /// Every page.
    Any,
    /// Pages on this hostname: lowercase, no scheme, no leading `www.`.
    Host(String),
}

impl Domain {
    /// Clean up a user-entered scope.
    ///
    /// `*` is the wildcard. Anything else has its scheme, path, query,
    /// port and leading `www.` removed, so `"https://www.GitHub.com/x"`
    /// becomes `github.com`.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingDomain);
        }
        if trimmed == WILDCARD {
            return Ok(Self::Any);
        }

        let without_scheme = SCHEME.replace(trimmed, "");
        let host = without_scheme
            .split(['/', '?', '#'])
            .next()
            .unwrap_or_default();
        let host = host.rsplit_once(':').map_or(host, |(h, _port)| h);
        let host = normalize_host(host);

        if host.is_empty() || host.contains(char::is_whitespace) {
            return Err(ValidationError::InvalidDomain(raw.to_string()));
        }
        Ok(Self::Host(host))
    }

    /// Scope derived from a URL's host, for filling in a missing domain.
    pub fn from_url(url: &str) -> Option<Self> {
        let parsed = url::Url::parse(url.trim()).ok()?;
        let host = normalize_host(parsed.host_str()?);
        (!host.is_empty()).then_some(Self::Host(host))
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Whether this scope names exactly `host` (already normalized).
    pub fn is_host(&self, host: &str) -> bool {
        matches!(self, Self::Host(h) if h == host)
    }
}

/// Lowercase a page hostname and strip a leading `www.`.
pub fn normalize_host(host: &str) -> String {
    let lower = host.trim().to_ascii_lowercase();
    match lower.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str(WILDCARD),
            Self::Host(host) => f.write_str(host),
        }
    }
}

impl From<Domain> for String {
    fn from(domain: Domain) -> Self {
        domain.to_string()
    }
}

impl TryFrom<String> for Domain {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}
