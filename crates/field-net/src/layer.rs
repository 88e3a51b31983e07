//! One-per-process wiring of the session layer.

use std::sync::Arc;

use field_config::{FieldConfig, SessionConfig};
use field_session::{CredentialStore, GateHandle, SessionStore, open_store, spawn_gate};

use crate::auth::AuthService;
use crate::error::SetupError;
use crate::invalidation::{InvalidationDetector, InvalidationTrigger};
use crate::pipeline::RequestPipeline;
use crate::transport::{ReqwestTransport, Transport};

/// Owns exactly one of each collaborator and hands out shared handles.
pub struct SessionLayer<T = ReqwestTransport> {
    credentials: Arc<dyn CredentialStore>,
    session: Arc<SessionStore>,
    trigger: Arc<InvalidationTrigger>,
    pipeline: RequestPipeline<InvalidationDetector<T>>,
    auth: AuthService<InvalidationDetector<T>>,
}

impl SessionLayer<ReqwestTransport> {
    /// Build the production graph from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] if the credential store or HTTP client cannot
    /// be created.
    pub fn from_config(config: &FieldConfig) -> Result<Self, SetupError> {
        let credentials = open_store(&config.credentials)?;
        let transport = ReqwestTransport::new(&config.api)?;
        tracing::debug!(
            backend = credentials.backend(),
            base_url = config.api.base_url(),
            "session layer ready"
        );
        Ok(Self::with_transport(transport, credentials, &config.session))
    }
}

impl<T: Transport> SessionLayer<T> {
    /// Build the graph over any executing transport.
    pub fn with_transport(
        transport: T,
        credentials: Arc<dyn CredentialStore>,
        config: &SessionConfig,
    ) -> Self {
        let session = Arc::new(SessionStore::new(Arc::clone(&credentials)));
        let trigger = Arc::new(InvalidationTrigger::for_session(Arc::clone(&session)));
        let detector = InvalidationDetector::new(
            transport,
            config.invalidation_codes.iter().cloned(),
            Arc::clone(&trigger),
            Arc::clone(&credentials),
        );
        let pipeline = RequestPipeline::new(Arc::new(detector), Arc::clone(&credentials));
        let auth = AuthService::new(
            pipeline.clone(),
            Arc::clone(&session),
            Arc::clone(&trigger),
            config.rearm_on_sign_in,
        );
        Self {
            credentials,
            session,
            trigger,
            pipeline,
            auth,
        }
    }

    #[must_use]
    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    #[must_use]
    pub fn trigger(&self) -> &Arc<InvalidationTrigger> {
        &self.trigger
    }

    #[must_use]
    pub fn pipeline(&self) -> &RequestPipeline<InvalidationDetector<T>> {
        &self.pipeline
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService<InvalidationDetector<T>> {
        &self.auth
    }

    /// Start a navigation gate following this layer's session.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn gate(&self) -> GateHandle {
        spawn_gate(&self.session)
    }
}
