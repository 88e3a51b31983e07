//! Sign-in, sign-up, sign-out and startup restoration.

use std::sync::Arc;

use field_core::responses::{AuthResponse, Credentials, SignUpRequest, UserProfile};
use field_core::{AppError, AppResult, ErrorKind, Session};
use field_session::{CredentialError, SessionStore};
use serde::de::IgnoredAny;

use crate::invalidation::InvalidationTrigger;
use crate::pipeline::RequestPipeline;
use crate::transport::Transport;

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const ME_PATH: &str = "/auth/me";
pub const LOGOUT_PATH: &str = "/auth/logout";

/// Authentication flows over the shared pipeline and session store.
pub struct AuthService<T> {
    pipeline: RequestPipeline<T>,
    session: Arc<SessionStore>,
    trigger: Arc<InvalidationTrigger>,
    rearm_on_sign_in: bool,
}

impl<T: Transport> AuthService<T> {
    pub const fn new(
        pipeline: RequestPipeline<T>,
        session: Arc<SessionStore>,
        trigger: Arc<InvalidationTrigger>,
        rearm_on_sign_in: bool,
    ) -> Self {
        Self {
            pipeline,
            session,
            trigger,
            rearm_on_sign_in,
        }
    }

    /// Exchange email and password for a session.
    ///
    /// # Errors
    ///
    /// Returns the mapped failure of the login call, or `Unknown` if the
    /// credential cannot be stored.
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session> {
        let body = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: AuthResponse = self.pipeline.post(LOGIN_PATH, &body).await?;
        self.establish(response)
    }

    /// Create an account and sign in to it.
    ///
    /// # Errors
    ///
    /// Same as [`sign_in`](Self::sign_in).
    pub async fn sign_up(&self, request: &SignUpRequest) -> AppResult<Session> {
        let response: AuthResponse = self.pipeline.post(REGISTER_PATH, request).await?;
        self.establish(response)
    }

    /// Profile of the user the stored credential belongs to.
    ///
    /// # Errors
    ///
    /// Returns the mapped failure of `GET /auth/me`.
    pub async fn me(&self) -> AppResult<UserProfile> {
        self.pipeline.get(ME_PATH).await
    }

    /// Tell the server (best-effort), then drop the local credential and
    /// session. The session is cleared even if the credential is not.
    ///
    /// # Errors
    ///
    /// Returns `Unknown` if the stored credential cannot be erased.
    pub async fn sign_out(&self) -> AppResult<()> {
        if self.session.credentials().has() {
            if let Err(error) = self.pipeline.post::<_, IgnoredAny>(LOGOUT_PATH, &()).await {
                tracing::debug!(%error, "server logout failed, clearing locally");
            }
        }
        let cleared = self.session.credentials().clear();
        self.session.clear();
        tracing::info!("signed out");
        cleared.map_err(credential_failure)
    }

    /// Rebuild the session from the stored credential at startup.
    ///
    /// Always ends with the session store marked ready. A credential the
    /// server rejects is erased; one that could not be checked is kept for a
    /// later start.
    pub async fn restore(&self) -> Option<Session> {
        let restored = self.try_restore().await;
        self.session.mark_ready();
        restored
    }

    async fn try_restore(&self) -> Option<Session> {
        let Some(token) = self.session.credentials().get() else {
            tracing::debug!("no stored credential");
            return None;
        };
        match self.me().await {
            Ok(profile) => {
                let session = profile.into_session(token);
                tracing::info!(user_id = %session.id, "session restored");
                self.session.set(session.clone());
                Some(session)
            }
            Err(error) if matches!(error.kind, ErrorKind::Unauthorized | ErrorKind::Forbidden) => {
                tracing::info!(%error, "stored credential rejected, discarding");
                if let Err(error) = self.session.credentials().clear() {
                    tracing::warn!(%error, "could not clear rejected credential");
                }
                None
            }
            Err(error) => {
                tracing::warn!(%error, "could not verify stored credential");
                None
            }
        }
    }

    fn establish(&self, response: AuthResponse) -> AppResult<Session> {
        self.session
            .credentials()
            .save(&response.token)
            .map_err(credential_failure)?;
        let session = response.into_session();
        self.session.set(session.clone());
        if self.rearm_on_sign_in {
            self.trigger.rearm();
        }
        tracing::info!(user_id = %session.id, "signed in");
        Ok(session)
    }
}

fn credential_failure(error: CredentialError) -> AppError {
    AppError::unknown(format!("Could not update stored credential: {error}")).with_cause(error)
}
