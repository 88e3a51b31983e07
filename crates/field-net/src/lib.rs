//! # field-net
//!
//! Network side of the fieldops session layer.
//!
//! - [`RequestPipeline`]: authenticated JSON calls, failures mapped into
//!   [`AppError`](field_core::AppError)
//! - [`InvalidationDetector`]: forced sign-out on server sentinel codes
//! - [`AuthService`]: sign-in/up/out and startup restoration
//! - [`SessionLayer`]: builds all of the above once per process
//!
//! Requests go through a [`Transport`]; [`ReqwestTransport`] is the network
//! implementation.

pub mod auth;
pub mod cancel;
pub mod error;
pub mod invalidation;
pub mod layer;
pub mod mapper;
pub mod pipeline;
pub mod transport;

pub use auth::AuthService;
pub use cancel::CancelToken;
pub use error::SetupError;
pub use invalidation::{InvalidationDetector, InvalidationTrigger};
pub use layer::SessionLayer;
pub use mapper::map_failure;
pub use pipeline::RequestPipeline;
pub use transport::{
    FnTransport, HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportFailure,
};
