//! Resolution engine — owns a context's view of the binding set.
//!
//! Composes the normalizer, matcher and conflict detector over an injected
//! [`KeyValueStore`]. Mutations read the authoritative set, modify it, write
//! it back whole, then broadcast `clearCache` so other contexts drop their
//! copies. Operations on one engine are serialized by `&mut self`; across
//! contexts the last write to the store wins.

pub mod cache;
pub mod notify;
pub mod sink;

pub use cache::{BindingCache, CacheState};
pub use notify::{ContextMessage, MessageReply, Notifier};
pub use sink::{CommandNavigator, Navigation, Navigator, SinkError, Target};

use crate::model::{Binding, BindingId, BindingSet, Candidate, Theme, ValidationError};
use crate::resolver::{Conflict, ConflictReport, match_binding};
use crate::store::{BINDINGS_KEY, FastPath, KeyValueStore, StoreError, THEME_KEY};

/// Errors returned by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("validation: {0}")]
    Validation(#[from] ValidationError),

    /// Same chord at the identical scope already exists. Nothing was saved.
    #[error("conflict: {}", describe(.conflicts))]
    Conflict { conflicts: Vec<Conflict> },

    #[error("no binding with id {0}")]
    NotFound(BindingId),

    #[error("storage: {0}")]
    Storage(#[from] StoreError),
}

fn describe(conflicts: &[Conflict]) -> String {
    conflicts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A binding that was written, with the advisories it raised.
#[derive(Debug, Clone)]
pub struct Saved {
    pub binding: Binding,
    pub report: ConflictReport,
}

pub struct Engine<S> {
    store: S,
    fast_path: Option<Box<dyn FastPath>>,
    notifier: Notifier,
    cache: BindingCache,
}

impl<S: KeyValueStore> Engine<S> {
    pub fn new(store: S, notifier: Notifier) -> Self {
        Self {
            store,
            fast_path: None,
            notifier,
            cache: BindingCache::new(),
        }
    }

    pub fn with_fast_path(mut self, fast_path: impl FastPath + 'static) -> Self {
        self.fast_path = Some(Box::new(fast_path));
        self
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn cache_state(&self) -> &CacheState {
        self.cache.state()
    }

    /// The set as the store currently holds it.
    pub async fn bindings(&mut self) -> Result<&BindingSet, EngineError> {
        if self.cache.is_stale() || self.cache.needs_verification() {
            self.refresh().await?;
        }
        self.cached()
    }

    /// Validate `candidate` and report every conflict it would raise,
    /// without saving. `exclude` is the binding being edited, if any.
    pub async fn check(
        &mut self,
        candidate: &Candidate,
        exclude: Option<BindingId>,
    ) -> Result<ConflictReport, EngineError> {
        let validated = candidate.validate()?;
        let set = self.bindings().await?;
        Ok(ConflictReport::check(
            &validated.chord,
            &validated.domain,
            set,
            exclude,
        ))
    }

    /// Append a new binding.
    ///
    /// Fails with [`EngineError::Conflict`] when the chord is already bound
    /// at the same scope; overlap with other scopes is returned in
    /// [`Saved::report`] but does not block.
    pub async fn add(&mut self, candidate: Candidate) -> Result<Saved, EngineError> {
        let validated = candidate.validate()?;
        self.refresh().await?;
        let mut set = self.cached()?.clone();

        let report = ConflictReport::check(&validated.chord, &validated.domain, &set, None);
        reject_blocking(&report)?;

        let binding = validated.into_binding(BindingId::new());
        set.push(binding.clone());
        self.persist(set).await?;

        log_advisories(&binding, &report);
        tracing::info!(
            id = %binding.id,
            chord = %binding.chord,
            domain = %binding.domain,
            "binding added"
        );
        Ok(Saved { binding, report })
    }

    /// Replace the binding `id` in place, keeping its id and position.
    pub async fn update(
        &mut self,
        id: BindingId,
        candidate: Candidate,
    ) -> Result<Saved, EngineError> {
        let validated = candidate.validate()?;
        self.refresh().await?;
        let mut set = self.cached()?.clone();

        if set.get(id).is_none() {
            return Err(EngineError::NotFound(id));
        }

        let report = ConflictReport::check(&validated.chord, &validated.domain, &set, Some(id));
        reject_blocking(&report)?;

        let binding = validated.into_binding(id);
        set.replace(binding.clone());
        self.persist(set).await?;

        log_advisories(&binding, &report);
        tracing::info!(
            id = %binding.id,
            chord = %binding.chord,
            domain = %binding.domain,
            "binding updated"
        );
        Ok(Saved { binding, report })
    }

    /// Remove the binding `id`, returning it.
    pub async fn delete(&mut self, id: BindingId) -> Result<Binding, EngineError> {
        self.refresh().await?;
        let mut set = self.cached()?.clone();

        let removed = set.remove(id).ok_or(EngineError::NotFound(id))?;
        self.persist(set).await?;

        tracing::info!(id = %removed.id, chord = %removed.chord, "binding deleted");
        Ok(removed)
    }

    /// The binding `chord` triggers on `domain`, if any.
    ///
    /// A fresh context answers from the fast-path cache when it has one,
    /// then checks that copy against the store before returning so the
    /// next keystroke sees the authoritative set.
    pub async fn resolve(
        &mut self,
        chord: &str,
        domain: &str,
    ) -> Result<Option<Binding>, EngineError> {
        if self.cache.is_stale() {
            self.warm_from_fast_path();
        }
        if self.cache.is_stale() {
            self.refresh().await?;
        }

        let found = self
            .cache
            .bindings()
            .and_then(|set| match_binding(chord, domain, set))
            .cloned();

        if self.cache.needs_verification() {
            if let Err(e) = self.refresh().await {
                tracing::warn!(error = %e, "could not verify cached bindings");
            }
        }

        tracing::debug!(chord, domain, hit = found.is_some(), "resolved chord");
        Ok(found)
    }

    /// Discard the cached set; the next operation reloads from the store.
    pub fn invalidate_cache(&mut self) {
        self.cache.invalidate();
        tracing::debug!("binding cache invalidated");
    }

    pub async fn theme(&self) -> Result<Theme, EngineError> {
        match self.store.get(THEME_KEY).await? {
            Some(value) => Ok(serde_json::from_value(value).map_err(StoreError::from)?),
            None => Ok(Theme::default()),
        }
    }

    pub async fn set_theme(&mut self, theme: Theme) -> Result<(), EngineError> {
        let value = serde_json::to_value(theme).map_err(StoreError::from)?;
        self.store.set(THEME_KEY, value).await?;
        tracing::info!(%theme, "theme saved");
        Ok(())
    }

    fn cached(&self) -> Result<&BindingSet, EngineError> {
        self.cache
            .bindings()
            .ok_or_else(|| StoreError::Unavailable("binding cache not loaded".into()).into())
    }

    /// Load the authoritative set and bring the fast path in line with it.
    async fn refresh(&mut self) -> Result<(), EngineError> {
        let (set, migrated) = match self.store.get(BINDINGS_KEY).await? {
            Some(value) => BindingSet::from_stored(value).map_err(StoreError::from)?,
            None => (BindingSet::default(), false),
        };

        if migrated {
            tracing::info!(count = set.len(), "rewriting stored bindings in canonical form");
            self.store.set(BINDINGS_KEY, to_value(&set)?).await?;
        }

        self.sync_fast_path(&set);
        self.cache.fill(set, true);
        Ok(())
    }

    /// Write the whole set, refresh local copies, and tell other contexts.
    async fn persist(&mut self, set: BindingSet) -> Result<(), EngineError> {
        if let Err(e) = self.store.set(BINDINGS_KEY, to_value(&set)?).await {
            // The write may or may not have landed.
            self.cache.invalidate();
            tracing::warn!(error = %e, "failed to save bindings");
            return Err(e.into());
        }

        self.sync_fast_path(&set);
        self.cache.fill(set, true);
        self.notifier.broadcast(ContextMessage::ClearCache);
        Ok(())
    }

    fn warm_from_fast_path(&mut self) {
        let Some(fast_path) = &self.fast_path else {
            return;
        };
        let Some(bytes) = fast_path.read(BINDINGS_KEY) else {
            return;
        };
        match rmp_serde::from_slice::<BindingSet>(&bytes) {
            Ok(set) => {
                tracing::debug!(count = set.len(), "warmed bindings from fast path");
                self.cache.fill(set, false);
            }
            Err(e) => tracing::debug!(error = %e, "ignoring unreadable fast-path entry"),
        }
    }

    /// Overwrite the fast-path copy when it differs from `set`.
    fn sync_fast_path(&self, set: &BindingSet) {
        let Some(fast_path) = &self.fast_path else {
            return;
        };

        let encoded = match rmp_serde::to_vec_named(set) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "could not encode bindings for fast path");
                return;
            }
        };

        if fast_path.read(BINDINGS_KEY).as_deref() == Some(encoded.as_slice()) {
            return;
        }
        if let Err(e) = fast_path.write(BINDINGS_KEY, &encoded) {
            tracing::warn!(error = %e, "fast-path cache update failed");
        } else {
            tracing::debug!(count = set.len(), "fast-path cache updated");
        }
    }
}

fn to_value(set: &BindingSet) -> Result<serde_json::Value, StoreError> {
    Ok(serde_json::to_value(set)?)
}

fn reject_blocking(report: &ConflictReport) -> Result<(), EngineError> {
    if report.is_blocked() {
        return Err(EngineError::Conflict {
            conflicts: report.blocking().cloned().collect(),
        });
    }
    Ok(())
}

fn log_advisories(binding: &Binding, report: &ConflictReport) {
    for conflict in report.advisories() {
        tracing::warn!(chord = %binding.chord, kind = ?conflict.kind, "{conflict}");
    }
    if let Some(reserved) = report.reserved {
        tracing::warn!(chord = %binding.chord, severity = %reserved.severity, "{reserved}");
    }
}
