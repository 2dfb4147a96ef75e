//! The engine's local copy of the binding set.

use crate::model::BindingSet;

/// Lifecycle of the cached set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CacheState {
    /// Nothing usable; the next read goes to the store.
    #[default]
    Stale,
    /// Usable. `verified` is false while the copy came from the fast
    /// path and has not yet been checked against the store.
    Valid { set: BindingSet, verified: bool },
}

#[derive(Debug, Default)]
pub struct BindingCache {
    state: CacheState,
}

impl BindingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CacheState {
        &self.state
    }

    pub fn is_stale(&self) -> bool {
        matches!(self.state, CacheState::Stale)
    }

    /// Valid but only warmed from the fast path.
    pub fn needs_verification(&self) -> bool {
        matches!(self.state, CacheState::Valid { verified: false, .. })
    }

    pub fn bindings(&self) -> Option<&BindingSet> {
        match &self.state {
            CacheState::Valid { set, .. } => Some(set),
            CacheState::Stale => None,
        }
    }

    pub fn fill(&mut self, set: BindingSet, verified: bool) {
        self.state = CacheState::Valid { set, verified };
    }

    /// Drop the cached set. Idempotent.
    pub fn invalidate(&mut self) {
        self.state = CacheState::Stale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_stale() {
        let cache = BindingCache::new();
        assert!(cache.is_stale());
        assert!(cache.bindings().is_none());
    }

    #[test]
    fn fill_then_invalidate() {
        let mut cache = BindingCache::new();
        cache.fill(BindingSet::default(), false);
        assert!(!cache.is_stale());
        assert!(cache.needs_verification());

        cache.fill(BindingSet::default(), true);
        assert!(!cache.needs_verification());

        cache.invalidate();
        cache.invalidate();
        assert_eq!(cache.state(), &CacheState::Stale);
    }
}
