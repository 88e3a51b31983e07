//! Process-wide holder of the authenticated identity.
//!
//! Every subscriber owns an unbounded queue. Changes are applied and
//! enqueued under one lock, so each subscriber sees the current value first
//! and then every later change in the order it was applied.

use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use field_core::{Session, SessionState};
use futures::Stream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::credential_store::CredentialStore;

/// Ordered stream of updates from a [`SessionStore`].
pub struct Subscription<T> {
    rx: UnboundedReceiver<T>,
}

impl<T> Subscription<T> {
    /// Wait for the next update. `None` once the store is dropped.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Next update if one is already queued.
    pub fn try_next(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

impl<T> Unpin for Subscription<T> {}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.rx.poll_recv(cx)
    }
}

#[derive(Default)]
struct Inner {
    state: SessionState,
    session_subscribers: Vec<UnboundedSender<Option<Session>>>,
    state_subscribers: Vec<UnboundedSender<SessionState>>,
}

impl Inner {
    fn publish_session(&mut self) {
        let user = self.state.user.clone();
        self.session_subscribers
            .retain(|tx| tx.send(user.clone()).is_ok());
    }

    fn publish_state(&mut self) {
        let state = self.state.clone();
        self.state_subscribers
            .retain(|tx| tx.send(state.clone()).is_ok());
    }
}

/// Single source of truth for who is logged in.
pub struct SessionStore {
    credentials: Arc<dyn CredentialStore>,
    inner: Mutex<Inner>,
}

impl SessionStore {
    #[must_use]
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            credentials,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.lock().state.user.clone()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    /// Credential store this session is paired with.
    #[must_use]
    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Replace the session atomically.
    pub fn set(&self, session: Session) {
        let mut inner = self.lock();
        tracing::debug!(user_id = %session.id, "session set");
        inner.state.user = Some(session);
        inner.publish_session();
        inner.publish_state();
    }

    /// Drop the session. Returns `false` when there was nothing to clear;
    /// subscribers are only notified of actual changes.
    pub fn clear(&self) -> bool {
        let mut inner = self.lock();
        let Some(previous) = inner.state.user.take() else {
            return false;
        };
        tracing::debug!(user_id = %previous.id, "session cleared");
        inner.publish_session();
        inner.publish_state();
        true
    }

    /// Record that startup restoration has finished. Only the first call has
    /// any effect.
    pub fn mark_ready(&self) -> bool {
        let mut inner = self.lock();
        if inner.state.is_ready {
            return false;
        }
        inner.state.is_ready = true;
        inner.publish_state();
        true
    }

    /// Current session followed by every later `set`/`clear`.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<Option<Session>> {
        let mut inner = self.lock();
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(inner.state.user.clone());
        inner.session_subscribers.push(tx);
        Subscription { rx }
    }

    /// Current [`SessionState`] followed by every later change, including
    /// the readiness transition.
    #[must_use]
    pub fn watch_state(&self) -> Subscription<SessionState> {
        let mut inner = self.lock();
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(inner.state.clone());
        inner.state_subscribers.push(tx);
        Subscription { rx }
    }

    /// A credential is stored AND a session is held in memory.
    ///
    /// Guards against an in-memory session outliving an external credential
    /// wipe.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.credentials.has() && self.current().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential_store::MemoryCredentialStore;
    use pretty_assertions::assert_eq;

    fn session(id: &str) -> Session {
        Session {
            id: id.into(),
            email: format!("{id}@example.com"),
            token: format!("tok-{id}"),
        }
    }

    fn store() -> SessionStore {
        SessionStore::new(Arc::new(MemoryCredentialStore::default()))
    }

    #[test]
    fn new_subscriber_sees_current_value_first() {
        let store = store();
        store.set(session("a"));

        let mut sub = store.subscribe();
        assert_eq!(sub.try_next(), Some(Some(session("a"))));
        assert_eq!(sub.try_next(), None);
    }

    #[test]
    fn subscribers_see_every_change_in_order() {
        let store = store();
        let mut first = store.subscribe();
        let mut second = store.subscribe();

        store.set(session("a"));
        store.clear();
        store.set(session("b"));
        store.set(session("c"));

        let expected = vec![
            None,
            Some(session("a")),
            None,
            Some(session("b")),
            Some(session("c")),
        ];
        for sub in [&mut first, &mut second] {
            let seen: Vec<_> = std::iter::from_fn(|| sub.try_next()).collect();
            assert_eq!(seen, expected);
        }
    }

    #[test]
    fn clear_is_idempotent_and_silent_when_empty() {
        let store = store();
        store.set(session("a"));
        let mut sub = store.subscribe();
        let _ = sub.try_next();

        assert!(store.clear());
        assert!(!store.clear());
        assert_eq!(sub.try_next(), Some(None));
        assert_eq!(sub.try_next(), None);
        assert_eq!(store.current(), None);
    }

    #[test]
    fn ready_flips_once() {
        let store = store();
        let mut states = store.watch_state();
        assert!(!states.try_next().expect("seed").is_ready);

        assert!(store.mark_ready());
        assert!(!store.mark_ready());

        let ready = states.try_next().expect("ready update");
        assert!(ready.is_ready);
        assert!(!ready.is_authenticated());
        assert_eq!(states.try_next(), None);
    }

    #[test]
    fn readiness_does_not_reach_session_subscribers() {
        let store = store();
        let mut sub = store.subscribe();
        let _ = sub.try_next();
        store.mark_ready();
        assert_eq!(sub.try_next(), None);
    }

    #[test]
    fn logged_in_requires_credential_and_session() {
        let credentials: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::default());
        let store = SessionStore::new(Arc::clone(&credentials));

        store.set(session("a"));
        assert!(!store.is_logged_in(), "no credential stored yet");

        credentials.save("tok-a").expect("save");
        assert!(store.is_logged_in());

        credentials.clear().expect("external wipe");
        assert!(!store.is_logged_in());
        assert!(store.current().is_some());
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let store = store();
        let sub = store.subscribe();
        drop(sub);
        store.set(session("a"));
        assert!(store.lock().session_subscribers.is_empty());
    }

    #[tokio::test]
    async fn subscription_is_a_stream() {
        use futures::StreamExt;

        let store = Arc::new(store());
        let mut sub = store.subscribe();
        assert_eq!(sub.next().await, Some(None));

        let writer = Arc::clone(&store);
        tokio::spawn(async move {
            writer.set(session("remote"));
        })
        .await
        .expect("join");

        let update = StreamExt::next(&mut sub).await;
        assert_eq!(update, Some(Some(session("remote"))));
    }
}
