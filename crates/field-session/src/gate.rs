//! Navigation gating on session restoration.
//!
//! [`NavigationGate`] is a pure state machine over a back-stack: a root
//! [`Route`] with protected destinations pushed above it. It makes no
//! routing decision until the session layer reports ready, then follows
//! authentication changes, discarding all history on every switch between
//! `Auth` and `Main`.
//!
//! [`spawn_gate`] drives a gate from a [`SessionStore`] on a tokio task and
//! publishes settled routes through a `watch` channel.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use field_core::{Route, SessionState};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::session_store::SessionStore;

/// An entry on the navigation back-stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Route(Route),
    /// Screen that may only render for an authenticated user.
    Protected(String),
}

/// What a protected destination should do for a given session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    Render,
    /// Restoration not finished; render nothing and wait.
    Pending,
    /// Not authenticated; the gate has moved to [`Route::Auth`]. Render nothing.
    Redirected,
}

#[derive(Debug, Clone)]
pub struct NavigationGate {
    root: Route,
    screens: Vec<String>,
}

impl Default for NavigationGate {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationGate {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            root: Route::Gate,
            screens: Vec::new(),
        }
    }

    /// Current root route.
    #[must_use]
    pub const fn route(&self) -> Route {
        self.root
    }

    /// Topmost destination.
    #[must_use]
    pub fn current(&self) -> Destination {
        self.screens
            .last()
            .map_or(Destination::Route(self.root), |name| {
                Destination::Protected(name.clone())
            })
    }

    /// Full back-stack, root first.
    #[must_use]
    pub fn history(&self) -> Vec<Destination> {
        std::iter::once(Destination::Route(self.root))
            .chain(self.screens.iter().cloned().map(Destination::Protected))
            .collect()
    }

    /// Feed the latest session state. Returns the new root route when the
    /// gate moved.
    pub fn observe(&mut self, state: &SessionState) -> Option<Route> {
        if !state.is_ready {
            return None;
        }
        let target = if state.is_authenticated() {
            Route::Main
        } else {
            Route::Auth
        };
        if self.root == target {
            return None;
        }
        self.reset(target);
        Some(target)
    }

    /// Feed a batch of queued states. Returns the final root route when the
    /// gate moved at any point, so intermediate roots are never reported.
    pub fn settle(&mut self, states: impl IntoIterator<Item = SessionState>) -> Option<Route> {
        let mut moved = false;
        for state in states {
            moved |= self.observe(&state).is_some();
        }
        moved.then_some(self.root)
    }

    /// Open a protected destination above `Main`. Refused elsewhere.
    pub fn push(&mut self, name: impl Into<String>) -> bool {
        if self.root != Route::Main {
            return false;
        }
        self.screens.push(name.into());
        true
    }

    /// Pop the topmost protected destination. The root is never popped.
    pub fn back(&mut self) -> bool {
        self.screens.pop().is_some()
    }

    /// Check performed by a protected destination before rendering.
    pub fn guard(&mut self, state: &SessionState) -> GuardOutcome {
        if state.is_authenticated() {
            return GuardOutcome::Render;
        }
        if !state.is_ready {
            return GuardOutcome::Pending;
        }
        if self.root != Route::Auth {
            self.reset(Route::Auth);
        }
        GuardOutcome::Redirected
    }

    fn reset(&mut self, target: Route) {
        debug_assert!(
            self.root.can_transition_to(target),
            "gate cannot move from {} to {target}",
            self.root
        );
        tracing::debug!(from = %self.root, to = %target, "navigation reset");
        self.root = target;
        self.screens.clear();
    }
}

struct Shared {
    gate: Mutex<NavigationGate>,
    routes: watch::Sender<Route>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, NavigationGate> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, route: Route) {
        self.routes.send_replace(route);
    }
}

/// A gate driven by a [`SessionStore`]. Aborts its task on drop.
pub struct GateHandle {
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

/// Start following `store` on the current tokio runtime.
#[must_use]
pub fn spawn_gate(store: &SessionStore) -> GateHandle {
    let (routes, _) = watch::channel(Route::Gate);
    let shared = Arc::new(Shared {
        gate: Mutex::new(NavigationGate::new()),
        routes,
    });

    let mut states = store.watch_state();
    let driver = Arc::clone(&shared);
    let task = tokio::spawn(async move {
        while let Some(state) = states.next().await {
            let queued = std::iter::from_fn(|| states.try_next());
            let batch: Vec<_> = std::iter::once(state).chain(queued).collect();
            let moved = driver.lock().settle(batch);
            if let Some(route) = moved {
                driver.publish(route);
            }
        }
    });

    GateHandle { shared, task }
}

impl GateHandle {
    #[must_use]
    pub fn route(&self) -> Route {
        *self.shared.routes.borrow()
    }

    /// Receiver for route changes.
    #[must_use]
    pub fn routes(&self) -> watch::Receiver<Route> {
        self.shared.routes.subscribe()
    }

    /// Wait until the gate has left [`Route::Gate`].
    pub async fn decided(&self) -> Route {
        let mut rx = self.routes();
        let settled = rx.wait_for(|route| *route != Route::Gate).await.map(|r| *r);
        // The sender lives in `shared`, so the channel cannot close here.
        settled.unwrap_or_else(|_| self.route())
    }

    #[must_use]
    pub fn history(&self) -> Vec<Destination> {
        self.shared.lock().history()
    }

    pub fn push(&self, name: impl Into<String>) -> bool {
        self.shared.lock().push(name)
    }

    pub fn back(&self) -> bool {
        self.shared.lock().back()
    }

    pub fn guard(&self, state: &SessionState) -> GuardOutcome {
        let (outcome, route) = {
            let mut gate = self.shared.lock();
            let outcome = gate.guard(state);
            (outcome, gate.route())
        };
        if outcome == GuardOutcome::Redirected {
            self.shared.publish(route);
        }
        outcome
    }
}

impl Drop for GateHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
