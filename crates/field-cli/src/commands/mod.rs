pub mod auth;
pub mod dispatch;
pub mod request;
pub mod route;
