//! # field-core
//!
//! Core types shared across the fieldops session layer.
//!
//! This crate provides the foundational types every other crate consumes:
//! - The closed error taxonomy ([`ErrorKind`], [`AppError`], [`AppResult`])
//!   and the distinguished [`Cancelled`] outcome
//! - The authenticated identity ([`Session`]) and its observable
//!   [`SessionState`]
//! - Top-level navigation [`Route`]s with their transition table
//! - Request/response bodies for the authentication API

pub mod enums;
pub mod errors;
pub mod identity;
pub mod responses;

pub use enums::Route;
pub use errors::{AppError, AppResult, Cancelled, ErrorKind};
pub use identity::{Session, SessionState};
