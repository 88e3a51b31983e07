//! Server-side session invalidation.
//!
//! [`InvalidationDetector`] wraps a transport and inspects every 401
//! response for a sentinel error code. A match fires the shared
//! [`InvalidationTrigger`], whose callback runs at most once no matter how
//! many in-flight requests observe the sentinel together.
//!
//! A sentinel only counts when the request carried the credential that is
//! still stored: late answers to requests sent before a sign-in never wipe
//! the newer session.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use field_core::responses::ApiErrorBody;
use field_session::{CredentialStore, SessionStore};
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;

use crate::transport::{HttpRequest, HttpResponse, Transport, TransportFailure};

type Callback = Box<dyn Fn(&str) + Send + Sync>;

/// One-shot guard around the forced-logout action.
pub struct InvalidationTrigger {
    fired: AtomicBool,
    callback: Callback,
}

impl fmt::Debug for InvalidationTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvalidationTrigger")
            .field("fired", &self.has_fired())
            .finish_non_exhaustive()
    }
}

impl InvalidationTrigger {
    /// `callback` receives the sentinel code that fired it.
    pub fn new(callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self {
            fired: AtomicBool::new(false),
            callback: Box::new(callback),
        }
    }

    /// Trigger that wipes the stored credential and the in-memory session.
    #[must_use]
    pub fn for_session(session: Arc<SessionStore>) -> Self {
        Self::new(move |code| {
            tracing::info!(code, "session invalidated by server, signing out");
            if let Err(error) = session.credentials().clear() {
                tracing::warn!(%error, "could not clear stored credential");
            }
            session.clear();
        })
    }

    /// Run the callback unless it has already run since the last rearm.
    /// Returns whether this call ran it.
    pub fn fire(&self, code: &str) -> bool {
        if self
            .fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(code, "invalidation already handled");
            return false;
        }
        (self.callback)(code);
        true
    }

    /// Allow the next sentinel to fire again.
    pub fn rearm(&self) {
        self.fired.store(false, Ordering::Release);
    }

    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

/// Transport decorator watching for invalidation sentinels.
///
/// Responses are always passed through unchanged.
pub struct InvalidationDetector<T> {
    inner: T,
    codes: HashSet<String>,
    trigger: Arc<InvalidationTrigger>,
    credentials: Arc<dyn CredentialStore>,
}

impl<T: Transport> InvalidationDetector<T> {
    pub fn new<I, S>(
        inner: T,
        codes: I,
        trigger: Arc<InvalidationTrigger>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inner,
            codes: codes.into_iter().map(Into::into).collect(),
            trigger,
            credentials,
        }
    }

    #[must_use]
    pub fn trigger(&self) -> &Arc<InvalidationTrigger> {
        &self.trigger
    }

    /// `sent_with` is the bearer token the request was dispatched with.
    fn inspect(&self, response: &HttpResponse, sent_with: Option<&str>) {
        if response.status != StatusCode::UNAUTHORIZED {
            return;
        }
        let Some(body) = ApiErrorBody::parse(&response.body) else {
            tracing::warn!(
                bytes = response.body.len(),
                "unreadable 401 body, skipping invalidation check"
            );
            return;
        };
        match body.error.as_deref() {
            Some(code) if self.codes.contains(code) => {
                if sent_with == self.credentials.get().as_deref() {
                    self.trigger.fire(code);
                } else {
                    tracing::debug!(code, "sentinel answers a replaced credential, ignoring");
                }
            }
            _ => {}
        }
    }
}

impl<T: Transport> Transport for InvalidationDetector<T> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportFailure> {
        let sent_with = bearer(&request);
        let response = self.inner.execute(request).await?;
        self.inspect(&response, sent_with.as_deref());
        Ok(response)
    }
}

fn bearer(request: &HttpRequest) -> Option<String> {
    request
        .header(&AUTHORIZATION)?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}
