//! # field-session
//!
//! Session state for the fieldops client.
//!
//! Provides durable credential storage (`keyring` with a file fallback, or
//! memory), the process-wide observable [`SessionStore`], and the
//! [`NavigationGate`] that withholds routing until restoration completes.
//! Instances are created once per process and shared by `Arc`; nothing here
//! is a global.

pub mod credential_store;
pub mod error;
pub mod gate;
pub mod session_store;
pub mod token;

pub use credential_store::{
    CredentialStore, FileCredentialStore, KeyringCredentialStore, MemoryCredentialStore,
    OsKeyring, SecretSlot, open_store,
};
pub use error::CredentialError;
pub use gate::{Destination, GateHandle, GuardOutcome, NavigationGate, spawn_gate};
pub use session_store::{SessionStore, Subscription};
pub use token::{expires_within, token_expiry};
