use field_session::CredentialError;
use thiserror::Error;

/// Failures while assembling the session layer.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("credential store: {0}")]
    Credentials(#[from] CredentialError),

    /// The HTTP client could not be built.
    #[error("HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}
