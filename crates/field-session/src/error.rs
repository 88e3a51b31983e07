use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("refusing to store an empty credential")]
    EmptyToken,

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("credential file error: {0}")]
    File(String),

    #[error("home directory not found, cannot locate credentials file")]
    NoLocation,
}
