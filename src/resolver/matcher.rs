//! Binding matcher — picks the one binding a chord triggers on a page.
//!
//! Two passes over the set: bindings scoped to the page's domain, then
//! global (`*`) bindings. A domain-specific match always wins, so a user
//! can keep a default action for a chord everywhere and override it on a
//! few sites without touching the default.

use crate::hotkey::chord::chords_match;
use crate::model::{Binding, BindingSet};

use super::domain::normalize_host;

/// Select the binding `chord` triggers on `page_domain`, if any.
///
/// `page_domain` is the raw page hostname; a leading `www.` is ignored.
pub fn match_binding<'a>(
    chord: &str,
    page_domain: &str,
    bindings: &'a BindingSet,
) -> Option<&'a Binding> {
    let host = normalize_host(page_domain);
    let specific = find_specific(chord, &host, bindings);
    let global = find_global(chord, bindings);
    specific.or(global)
}

/// Domain-specific pass. `host` must already be normalized.
pub fn find_specific<'a>(
    chord: &str,
    host: &str,
    bindings: &'a BindingSet,
) -> Option<&'a Binding> {
    if host.is_empty() {
        return None;
    }
    bindings
        .iter()
        .find(|b| b.domain.is_host(host) && chords_match(&b.chord, chord))
}

/// Wildcard pass.
pub fn find_global<'a>(chord: &str, bindings: &'a BindingSet) -> Option<&'a Binding> {
    bindings
        .iter()
        .find(|b| b.domain.is_any() && chords_match(&b.chord, chord))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BindingId, Candidate};

    fn binding(chord: &str, domain: &str, url: &str) -> Binding {
        Candidate::new(url, chord, domain)
            .validate()
            .unwrap()
            .into_binding(BindingId::new())
    }

    fn set(bindings: Vec<Binding>) -> BindingSet {
        BindingSet::new(bindings)
    }

    #[test]
    fn domain_specific_shadows_global() {
        // Global listed first: order must not matter.
        let bindings = set(vec![
            binding("G", "*", "https://b.example"),
            binding("G", "github.com", "https://a.example"),
        ]);
        let found = match_binding("G", "github.com", &bindings).unwrap();
        assert_eq!(found.url, "https://a.example");
    }

    #[test]
    fn global_applies_elsewhere() {
        let bindings = set(vec![
            binding("G", "github.com", "https://a.example"),
            binding("G", "*", "https://b.example"),
        ]);
        let found = match_binding("G", "gitlab.com", &bindings).unwrap();
        assert_eq!(found.url, "https://b.example");
    }

    #[test]
    fn leading_www_is_ignored_on_page() {
        let bindings = set(vec![binding("K", "example.com", "https://k.example")]);
        assert!(match_binding("K", "www.example.com", &bindings).is_some());
        assert!(match_binding("K", "WWW.EXAMPLE.COM", &bindings).is_some());
        assert!(match_binding("K", "sub.example.com", &bindings).is_none());
    }

    #[test]
    fn chord_comparison_is_case_insensitive() {
        let bindings = set(vec![binding("ctrl+k", "*", "https://k.example")]);
        assert!(match_binding("CTRL+K", "any.example", &bindings).is_some());
        assert!(match_binding("Ctrl+Shift+K", "any.example", &bindings).is_none());
    }

    #[test]
    fn no_match_returns_none() {
        let bindings = set(vec![binding("H", "docs.rs", "https://h.example")]);
        assert!(match_binding("H", "crates.io", &bindings).is_none());
        assert!(match_binding("J", "docs.rs", &bindings).is_none());
        assert!(match_binding("H", "docs.rs", &BindingSet::default()).is_none());
    }

    #[test]
    fn empty_page_host_only_sees_globals() {
        let bindings = set(vec![binding("H", "*", "https://home.example")]);
        assert!(match_binding("H", "", &bindings).is_some());
        assert!(find_specific("H", "", &bindings).is_none());
    }

    #[test]
    fn passes_are_independent() {
        let bindings = set(vec![
            binding("G", "github.com", "https://a.example"),
            binding("G", "*", "https://b.example"),
        ]);
        assert_eq!(find_specific("g", "github.com", &bindings).unwrap().url, "https://a.example");
        assert_eq!(find_global("g", &bindings).unwrap().url, "https://b.example");
    }
}
