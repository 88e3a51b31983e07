//! The request-executing layer beneath the pipeline.
//!
//! A [`Transport`] turns an [`HttpRequest`] into an [`HttpResponse`] or a
//! [`TransportFailure`]. Decorators such as the invalidation detector wrap
//! another transport; [`ReqwestTransport`] talks to the network.

use std::future::Future;

use field_config::ApiConfig;
use field_core::errors::Cause;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};

/// Outbound request, path relative to the configured base URL.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Response as received, any status.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Add a header, ignoring values that are not valid header text.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    #[must_use]
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Collect status, headers and body from a `reqwest` response.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportFailure`] if the body cannot be read.
    pub async fn from_reqwest(response: reqwest::Response) -> Result<Self, TransportFailure> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();
        Ok(Self {
            status,
            headers,
            body,
        })
    }
}

/// Why a request produced no usable response.
///
/// Cancellation is not represented: an explicitly cancelled call never
/// reaches the transport's result.
#[derive(Debug, thiserror::Error)]
pub enum TransportFailure {
    /// The server answered with a non-success status.
    #[error("HTTP {}", .0.status)]
    Status(HttpResponse),

    #[error("request timed out")]
    Timeout(#[source] Option<Cause>),

    /// Connection-level failure, no status available.
    #[error("I/O error: {0}")]
    Io(#[source] Cause),

    /// Request body could not be serialized.
    #[error("encode error: {0}")]
    Encode(#[source] Cause),

    /// Success response body did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(#[source] Cause),

    #[error("transport error: {0}")]
    Other(#[source] Cause),
}

impl From<reqwest::Error> for TransportFailure {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(Some(Box::new(error)))
        } else if error.is_builder() {
            Self::Other(Box::new(error))
        } else if error.is_connect() || error.is_request() || error.is_body() {
            Self::Io(Box::new(error))
        } else if error.is_decode() {
            Self::Decode(Box::new(error))
        } else {
            Self::Other(Box::new(error))
        }
    }
}

/// Executes requests. Implementations hold no per-call mutable state.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportFailure>> + Send;
}

/// A plain async function used as a transport.
pub struct FnTransport<F>(pub F);

impl<F, Fut> Transport for FnTransport<F>
where
    F: Fn(HttpRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HttpResponse, TransportFailure>> + Send,
{
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportFailure>> + Send {
        (self.0)(request)
    }
}

/// Network transport backed by a shared `reqwest::Client`.
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Build the client with the configured timeouts and default headers.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the TLS backend cannot be initialized.
    pub fn new(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        let mut defaults = HeaderMap::new();
        defaults.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        defaults.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(defaults)
            .connect_timeout(config.connect_timeout())
            .read_timeout(config.read_timeout())
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }
}

impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportFailure> {
        let mut builder = self
            .client
            .request(request.method, self.url(&request.path))
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let response = builder.send().await?;
        HttpResponse::from_reqwest(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_paths_with_single_slash() {
        let transport = ReqwestTransport::new(&ApiConfig {
            base_url: "https://api.example.com/v1/".into(),
            ..Default::default()
        })
        .expect("client builds");
        assert_eq!(
            transport.url("/auth/me"),
            "https://api.example.com/v1/auth/me"
        );
        assert_eq!(transport.url("visits"), "https://api.example.com/v1/visits");
    }

    #[tokio::test]
    async fn collects_reqwest_response_parts() {
        let raw = ::http::Response::builder()
            .status(429)
            .header("Retry-After", "30")
            .body(r#"{"error":"slow_down"}"#)
            .expect("http response");
        let response = HttpResponse::from_reqwest(reqwest::Response::from(raw))
            .await
            .expect("collect");

        assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.header(&header::RETRY_AFTER), Some("30"));
        assert_eq!(response.body, br#"{"error":"slow_down"}"#.to_vec());
    }

    #[test]
    fn invalid_header_values_are_skipped() {
        let response =
            HttpResponse::new(StatusCode::OK, "").with_header(header::RETRY_AFTER, "bad\nvalue");
        assert!(response.headers.is_empty());
    }
}
