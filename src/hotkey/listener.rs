//! Page listener — key events in, navigation out.
//!
//! Sees every key event on a page before the page's own handlers. Events
//! aimed at an editable surface, already handled, or carrying no chord
//! pass through untouched. A resolved binding suppresses the event and
//! produces a [`Navigation`]. Nothing on this path returns an error: a
//! failed lookup leaves the page's default behavior alone.

use tokio::sync::{broadcast, mpsc};

use crate::broker::{ContextMessage, Engine, MessageReply, Navigation, Navigator};
use crate::store::KeyValueStore;

use super::chord::{KeyPress, normalize};
use super::focus::{FocusTarget, is_user_typing};

/// A key event as the page delivered it.
#[derive(Debug, Clone, Default)]
pub struct PageEvent {
    pub press: KeyPress,
    /// Element holding focus, `None` for the document body.
    pub focus: Option<FocusTarget>,
    /// Another handler already called `preventDefault`.
    pub default_prevented: bool,
}

impl PageEvent {
    pub fn new(press: KeyPress) -> Self {
        Self {
            press,
            ..Default::default()
        }
    }

    pub fn focused_on(mut self, focus: FocusTarget) -> Self {
        self.focus = Some(focus);
        self
    }
}

/// Why an event was left to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Passthrough {
    /// Focus is on an editable surface; no lookup attempted.
    Typing,
    /// Already handled by the page.
    AlreadyHandled,
    /// Bare modifier or unrepresentable key.
    NoChord,
    /// No binding for the chord here.
    NoMatch,
    /// Bindings could not be loaded.
    Unavailable,
}

/// What the host must do with the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Leave the event alone.
    Passthrough(Passthrough),
    /// Suppress the event's default action and propagation, then navigate.
    Navigate(Navigation),
}

impl KeyOutcome {
    pub fn suppresses_event(&self) -> bool {
        matches!(self, Self::Navigate(_))
    }
}

/// One page context: its own engine (and cache) plus a subscription to
/// cross-context invalidations.
pub struct PageListener<S> {
    engine: Engine<S>,
    host: String,
    invalidations: broadcast::Receiver<ContextMessage>,
}

impl<S: KeyValueStore> PageListener<S> {
    /// Listen on a page whose hostname is `host`.
    pub fn new(engine: Engine<S>, host: impl Into<String>) -> Self {
        let invalidations = engine.notifier().subscribe();
        Self {
            engine,
            host: host.into(),
            invalidations,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn engine_mut(&mut self) -> &mut Engine<S> {
        &mut self.engine
    }

    /// Decide what to do with one key event.
    pub async fn handle_key(&mut self, event: &PageEvent) -> KeyOutcome {
        self.drain_invalidations();

        if is_user_typing(event.focus.as_ref()) {
            return KeyOutcome::Passthrough(Passthrough::Typing);
        }
        if event.default_prevented {
            return KeyOutcome::Passthrough(Passthrough::AlreadyHandled);
        }

        let chord = normalize(&event.press);
        if chord.is_empty() {
            return KeyOutcome::Passthrough(Passthrough::NoChord);
        }

        match self.engine.resolve(&chord, &self.host).await {
            Ok(Some(binding)) => {
                tracing::debug!(
                    chord = %chord,
                    url = %binding.url,
                    new_tab = binding.open_in_new_tab,
                    "chord triggered"
                );
                KeyOutcome::Navigate(Navigation::from(&binding))
            }
            Ok(None) => KeyOutcome::Passthrough(Passthrough::NoMatch),
            Err(e) => {
                tracing::warn!(chord = %chord, error = %e, "binding lookup failed");
                KeyOutcome::Passthrough(Passthrough::Unavailable)
            }
        }
    }

    /// Handle a cross-context message.
    pub fn handle_message(&mut self, message: ContextMessage) -> MessageReply {
        match message {
            ContextMessage::ClearCache => {
                self.engine.invalidate_cache();
                MessageReply::CACHE_CLEARED
            }
        }
    }

    /// Apply any invalidations that arrived since the last event.
    fn drain_invalidations(&mut self) {
        loop {
            match self.invalidations.try_recv() {
                Ok(message) => {
                    self.handle_message(message);
                }
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    tracing::debug!(missed, "invalidations lagged; clearing cache");
                    self.engine.invalidate_cache();
                }
                Err(_) => break,
            }
        }
    }

    /// Drive the listener until the event channel closes.
    ///
    /// Invalidations are applied as they arrive; each resolved event is
    /// handed to `navigator`. Delivery failures are logged, never fatal.
    pub async fn run<N: Navigator>(
        mut self,
        mut events: mpsc::Receiver<PageEvent>,
        navigator: N,
    ) {
        tracing::info!(host = %self.host, "page listener started");

        loop {
            tokio::select! {
                biased;

                message = self.invalidations.recv() => match message {
                    Ok(message) => {
                        self.handle_message(message);
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => self.engine.invalidate_cache(),
                    // The engine holds a sender, so this only happens on teardown.
                    Err(broadcast::error::RecvError::Closed) => break,
                },

                event = events.recv() => {
                    let Some(event) = event else { break };
                    if let KeyOutcome::Navigate(navigation) = self.handle_key(&event).await {
                        if let Err(e) = navigator.navigate(&navigation).await {
                            tracing::warn!(url = %navigation.url, error = %e, "navigation failed");
                        }
                    }
                }
            }
        }

        tracing::info!(host = %self.host, "page listener stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::notify::CHANNEL_CAPACITY;
    use crate::broker::{Notifier, SinkError, Target};
    use crate::model::Candidate;
    use crate::store::{BINDINGS_KEY, MemoryStore};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn press(key: &str) -> PageEvent {
        PageEvent::new(KeyPress::new(key))
    }

    async fn seeded(candidates: Vec<Candidate>) -> (Arc<MemoryStore>, Notifier) {
        let store = Arc::new(MemoryStore::new());
        let notifier = Notifier::new();
        let mut engine = Engine::new(Arc::clone(&store), notifier.clone());
        for candidate in candidates {
            engine.add(candidate).await.unwrap();
        }
        (store, notifier)
    }

    fn listener(
        store: &Arc<MemoryStore>,
        notifier: &Notifier,
        host: &str,
    ) -> PageListener<Arc<MemoryStore>> {
        PageListener::new(Engine::new(Arc::clone(store), notifier.clone()), host)
    }

    #[tokio::test]
    async fn global_binding_fires_outside_text_fields() {
        let (store, notifier) =
            seeded(vec![Candidate::new("https://home.example", "H", "*")]).await;
        let mut page = listener(&store, &notifier, "www.example.com");

        let on_div = press("h").focused_on(FocusTarget::element("div"));
        let outcome = page.handle_key(&on_div).await;
        assert_eq!(
            outcome,
            KeyOutcome::Navigate(Navigation {
                url: "https://home.example".into(),
                target: Target::Current,
            })
        );
        assert!(outcome.suppresses_event());

        let in_input = press("h").focused_on(FocusTarget::input("text"));
        assert_eq!(
            page.handle_key(&in_input).await,
            KeyOutcome::Passthrough(Passthrough::Typing)
        );
    }

    #[tokio::test]
    async fn domain_binding_wins_on_its_domain_only() {
        let (store, notifier) = seeded(vec![
            Candidate::new("https://a.example", "G", "github.com").new_tab(true),
            Candidate::new("https://b.example", "G", "*"),
        ])
        .await;

        let mut github = listener(&store, &notifier, "github.com");
        assert_eq!(
            github.handle_key(&press("g")).await,
            KeyOutcome::Navigate(Navigation {
                url: "https://a.example".into(),
                target: Target::NewTab,
            })
        );

        let mut gitlab = listener(&store, &notifier, "gitlab.com");
        assert_eq!(
            gitlab.handle_key(&press("g")).await,
            KeyOutcome::Navigate(Navigation {
                url: "https://b.example".into(),
                target: Target::Current,
            })
        );
    }

    #[tokio::test]
    async fn non_matches_pass_through() {
        let (store, notifier) =
            seeded(vec![Candidate::new("https://home.example", "H", "*")]).await;
        let mut page = listener(&store, &notifier, "example.com");

        assert_eq!(
            page.handle_key(&press("Shift")).await,
            KeyOutcome::Passthrough(Passthrough::NoChord)
        );
        assert_eq!(
            page.handle_key(&press("j")).await,
            KeyOutcome::Passthrough(Passthrough::NoMatch)
        );

        let handled = PageEvent {
            default_prevented: true,
            ..press("h")
        };
        assert_eq!(
            page.handle_key(&handled).await,
            KeyOutcome::Passthrough(Passthrough::AlreadyHandled)
        );

        let checkbox = press("h").focused_on(FocusTarget::input("checkbox"));
        assert!(page.handle_key(&checkbox).await.suppresses_event());
    }

    #[tokio::test]
    async fn sees_changes_after_clear_cache() {
        let (store, notifier) = seeded(vec![]).await;
        let mut page = listener(&store, &notifier, "example.com");
        assert_eq!(
            page.handle_key(&press("k")).await,
            KeyOutcome::Passthrough(Passthrough::NoMatch)
        );

        // The configuration surface is another context on the same hub.
        let mut config = Engine::new(Arc::clone(&store), notifier.clone());
        config
            .add(Candidate::new("https://k.example", "k", "*"))
            .await
            .unwrap();

        assert!(page.handle_key(&press("k")).await.suppresses_event());
    }

    /// Write bindings behind the listener's back, then overflow its
    /// invalidation queue so the next receive reports a lag.
    async fn rebind_and_overflow(store: &MemoryStore, notifier: &Notifier) {
        store
            .set(
                BINDINGS_KEY,
                json!([{"url": "https://k.example", "chord": "K", "domain": "*"}]),
            )
            .await
            .unwrap();
        for _ in 0..=CHANNEL_CAPACITY {
            notifier.broadcast(ContextMessage::ClearCache);
        }
    }

    #[tokio::test]
    async fn lagged_invalidations_clear_the_cache() {
        let (store, notifier) = seeded(vec![]).await;
        let mut page = listener(&store, &notifier, "example.com");
        assert_eq!(
            page.handle_key(&press("k")).await,
            KeyOutcome::Passthrough(Passthrough::NoMatch)
        );

        rebind_and_overflow(&store, &notifier).await;
        assert!(page.handle_key(&press("k")).await.suppresses_event());
        assert!(matches!(
            page.invalidations.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn run_loop_recovers_from_lagged_invalidations() {
        let (store, notifier) = seeded(vec![]).await;
        let mut page = listener(&store, &notifier, "example.com");
        assert_eq!(
            page.handle_key(&press("k")).await,
            KeyOutcome::Passthrough(Passthrough::NoMatch)
        );
        rebind_and_overflow(&store, &notifier).await;

        let navigator = RecordingNavigator::default();
        let (tx, rx) = mpsc::channel(8);
        tx.send(press("k")).await.unwrap();
        drop(tx);
        page.run(rx, navigator.clone()).await;

        let seen = navigator.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].url, "https://k.example");
    }

    #[tokio::test]
    async fn clear_cache_reply() {
        let (store, notifier) = seeded(vec![]).await;
        let mut page = listener(&store, &notifier, "example.com");
        let reply = page.handle_message(ContextMessage::ClearCache);
        assert_eq!(reply, MessageReply::CACHE_CLEARED);
    }

    #[derive(Clone, Default)]
    struct RecordingNavigator {
        seen: Arc<Mutex<Vec<Navigation>>>,
    }

    impl Navigator for RecordingNavigator {
        async fn navigate(&self, navigation: &Navigation) -> Result<(), SinkError> {
            self.seen.lock().unwrap().push(navigation.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn run_loop_navigates_until_closed() {
        let (store, notifier) =
            seeded(vec![Candidate::new("https://home.example", "H", "*")]).await;
        let page = listener(&store, &notifier, "example.com");
        let navigator = RecordingNavigator::default();

        let (tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(page.run(rx, navigator.clone()));

        tx.send(press("h")).await.unwrap();
        tx.send(press("x")).await.unwrap();
        tx.send(press("h").focused_on(FocusTarget::element("textarea")))
            .await
            .unwrap();
        drop(tx);
        task.await.unwrap();

        let seen = navigator.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].url, "https://home.example");
    }
}
