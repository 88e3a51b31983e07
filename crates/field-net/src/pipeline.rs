//! Authenticated JSON request pipeline.
//!
//! Every call re-reads the credential store at dispatch, so a token saved or
//! cleared by one task is reflected on the very next request of any other.
//! Failures come back as mapped [`AppError`]s.

use std::sync::Arc;
use std::time::Instant;

use field_core::{AppResult, Cancelled};
use field_session::CredentialStore;
use reqwest::Method;
use reqwest::header::{self, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cancel::CancelToken;
use crate::mapper::map_failure;
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportFailure};

const JSON: &str = "application/json";

/// Shared, stateless request executor. Cheap to clone.
pub struct RequestPipeline<T> {
    transport: Arc<T>,
    credentials: Arc<dyn CredentialStore>,
}

impl<T> Clone for RequestPipeline<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            credentials: Arc::clone(&self.credentials),
        }
    }
}

impl<T: Transport> RequestPipeline<T> {
    pub fn new(transport: Arc<T>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            transport,
            credentials,
        }
    }

    #[must_use]
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// # Errors
    ///
    /// Returns the mapped [`AppError`](field_core::AppError) on any failure.
    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> AppResult<R> {
        self.send::<(), R>(Method::GET, path, None).await
    }

    /// # Errors
    ///
    /// Returns the mapped [`AppError`](field_core::AppError) on any failure.
    pub async fn delete<R: DeserializeOwned>(&self, path: &str) -> AppResult<R> {
        self.send::<(), R>(Method::DELETE, path, None).await
    }

    /// # Errors
    ///
    /// Returns the mapped [`AppError`](field_core::AppError) on any failure.
    pub async fn post<B, R>(&self, path: &str, body: &B) -> AppResult<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        self.send(Method::POST, path, Some(body)).await
    }

    /// # Errors
    ///
    /// Returns the mapped [`AppError`](field_core::AppError) on any failure.
    pub async fn put<B, R>(&self, path: &str, body: &B) -> AppResult<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        self.send(Method::PUT, path, Some(body)).await
    }

    /// Execute one request and decode a 2xx body as `R`.
    ///
    /// An empty success body decodes as JSON `null`, so `()` and `Option<_>`
    /// targets accept it.
    ///
    /// # Errors
    ///
    /// Non-2xx statuses, transport failures and decode failures are mapped
    /// to an [`AppError`](field_core::AppError).
    pub async fn send<B, R>(&self, method: Method, path: &str, body: Option<&B>) -> AppResult<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let request = self.build(method, path, body).map_err(map_failure)?;
        let method = request.method.clone();
        let started = Instant::now();
        let outcome = self.transport.execute(request).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let response = match outcome {
            Ok(response) => response,
            Err(failure) => {
                tracing::debug!(%method, path, elapsed_ms, error = %failure, "request failed");
                return Err(map_failure(failure));
            }
        };
        tracing::debug!(
            %method,
            path,
            status = response.status.as_u16(),
            elapsed_ms,
            "request completed"
        );

        if !response.status.is_success() {
            return Err(map_failure(TransportFailure::Status(response)));
        }
        decode(&response).map_err(map_failure)
    }

    /// [`send`](Self::send), abandoned as soon as `cancel` fires.
    ///
    /// The outer `Err(Cancelled)` is distinct from every mapped failure and
    /// wins over a response that completes at the same moment.
    pub async fn send_cancellable<B, R>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        cancel: &CancelToken,
    ) -> Result<AppResult<R>, Cancelled>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        if cancel.is_cancelled() {
            return Err(Cancelled);
        }
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!(%method, path, "request cancelled");
                Err(Cancelled)
            }
            result = self.send(method.clone(), path, body) => Ok(result),
        }
    }

    fn build<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<HttpRequest, TransportFailure>
    where
        B: Serialize + ?Sized,
    {
        let mut request = HttpRequest::new(method, path);
        request
            .headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON));
        request
            .headers
            .insert(header::ACCEPT, HeaderValue::from_static(JSON));

        if let Some(token) = self.credentials.get() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| TransportFailure::Encode(Box::new(e)))?;
            value.set_sensitive(true);
            request.headers.insert(header::AUTHORIZATION, value);
        }

        if let Some(body) = body {
            let bytes =
                serde_json::to_vec(body).map_err(|e| TransportFailure::Encode(Box::new(e)))?;
            request.body = Some(bytes);
        }
        Ok(request)
    }
}

fn decode<R: DeserializeOwned>(response: &HttpResponse) -> Result<R, TransportFailure> {
    let body: &[u8] = if response.body.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        &response.body
    };
    serde_json::from_slice(body).map_err(|e| TransportFailure::Decode(Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use field_core::ErrorKind;
    use field_session::MemoryCredentialStore;
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;
    use serde::Deserialize;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Recording {
        requests: Mutex<Vec<HttpRequest>>,
        status: Option<StatusCode>,
        body: &'static str,
    }

    impl Recording {
        fn answering(status: StatusCode, body: &'static str) -> Self {
            Self {
                status: Some(status),
                body,
                ..Self::default()
            }
        }

        fn last(&self) -> HttpRequest {
            self.requests
                .lock()
                .unwrap()
                .last()
                .cloned()
                .expect("a request was sent")
        }
    }

    impl Transport for Recording {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportFailure> {
            self.requests.lock().unwrap().push(request);
            Ok(HttpResponse::new(
                self.status.unwrap_or(StatusCode::OK),
                self.body,
            ))
        }
    }

    struct Pending;

    impl Transport for Pending {
        async fn execute(&self, _: HttpRequest) -> Result<HttpResponse, TransportFailure> {
            std::future::pending().await
        }
    }

    #[derive(Debug, Deserialize, PartialEq, Eq)]
    struct Visit {
        id: u32,
        status: String,
    }

    fn pipeline<T: Transport>(
        transport: T,
        credentials: Arc<MemoryCredentialStore>,
    ) -> RequestPipeline<T> {
        RequestPipeline::new(Arc::new(transport), credentials)
    }

    #[tokio::test]
    async fn attaches_current_credential_per_call() {
        let store = Arc::new(MemoryCredentialStore::with_token("first"));
        let pipeline = pipeline(Recording::answering(StatusCode::OK, "{}"), Arc::clone(&store));

        let _: serde_json::Value = pipeline.get("/visits").await.unwrap();
        assert_eq!(
            pipeline.transport().last().header(&header::AUTHORIZATION),
            Some("Bearer first")
        );

        store.save("second").unwrap();
        let _: serde_json::Value = pipeline.get("/visits").await.unwrap();
        assert_eq!(
            pipeline.transport().last().header(&header::AUTHORIZATION),
            Some("Bearer second")
        );

        store.clear().unwrap();
        let _: serde_json::Value = pipeline.get("/visits").await.unwrap();
        assert_eq!(
            pipeline.transport().last().header(&header::AUTHORIZATION),
            None
        );
    }

    #[tokio::test]
    async fn always_sends_json_headers() {
        let store = Arc::new(MemoryCredentialStore::default());
        let pipeline = pipeline(Recording::answering(StatusCode::OK, ""), store);

        let (): () = pipeline.delete("/visits/3").await.unwrap();
        let request = pipeline.transport().last();
        assert_eq!(request.method, Method::DELETE);
        assert_eq!(request.header(&header::CONTENT_TYPE), Some(JSON));
        assert_eq!(request.header(&header::ACCEPT), Some(JSON));
        assert!(request.body.is_none());
    }

    #[tokio::test]
    async fn serializes_body_and_decodes_response() {
        let store = Arc::new(MemoryCredentialStore::with_token("tok"));
        let pipeline = pipeline(
            Recording::answering(StatusCode::CREATED, r#"{"id":7,"status":"open"}"#),
            store,
        );

        let visit: Visit = pipeline
            .post("/visits", &serde_json::json!({"client_id": 42}))
            .await
            .unwrap();
        assert_eq!(
            visit,
            Visit {
                id: 7,
                status: "open".into()
            }
        );
        let request = pipeline.transport().last();
        assert_eq!(request.path, "/visits");
        assert_eq!(request.body.as_deref(), Some(br#"{"client_id":42}"#.as_slice()));
    }

    #[tokio::test]
    async fn empty_success_body_fits_optional_targets() {
        let store = Arc::new(MemoryCredentialStore::default());
        let pipeline = pipeline(Recording::answering(StatusCode::NO_CONTENT, ""), store);

        let none: Option<Visit> = pipeline.put("/visits/1", &()).await.unwrap();
        assert_eq!(none, None);
    }

    #[tokio::test]
    async fn non_success_status_is_mapped() {
        let store = Arc::new(MemoryCredentialStore::with_token("tok"));
        let pipeline = pipeline(
            Recording::answering(StatusCode::BAD_REQUEST, r#"{"error":"bad_input"}"#),
            store,
        );

        let err = pipeline.get::<Visit>("/visits").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation { code: None });
        assert_eq!(err.message, "bad_input");
    }

    #[tokio::test]
    async fn unexpected_shape_is_unknown() {
        let store = Arc::new(MemoryCredentialStore::default());
        let pipeline = pipeline(Recording::answering(StatusCode::OK, "[1,2]"), store);

        let err = pipeline.get::<Visit>("/visits/1").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unknown);
    }

    #[tokio::test]
    async fn cancellation_is_distinct_from_failure() {
        let store = Arc::new(MemoryCredentialStore::default());
        let pipeline = pipeline(Pending, store);
        let cancel = CancelToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let outcome = tokio::time::timeout(
            Duration::from_secs(2),
            pipeline.send_cancellable::<(), Visit>(Method::GET, "/slow", None, &cancel),
        )
        .await
        .expect("cancelled in time");
        assert!(matches!(outcome, Err(Cancelled)));
    }

    #[tokio::test]
    async fn pre_cancelled_token_skips_dispatch() {
        let store = Arc::new(MemoryCredentialStore::default());
        let pipeline = pipeline(Recording::answering(StatusCode::OK, "{}"), store);
        let cancel = CancelToken::new();
        cancel.cancel();

        let outcome = pipeline
            .send_cancellable::<(), serde_json::Value>(Method::GET, "/visits", None, &cancel)
            .await;
        assert!(matches!(outcome, Err(Cancelled)));
        assert!(pipeline.transport().requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn uncancelled_call_returns_inner_result() {
        let store = Arc::new(MemoryCredentialStore::default());
        let pipeline = pipeline(Recording::answering(StatusCode::NOT_FOUND, ""), store);

        let outcome = pipeline
            .send_cancellable::<(), Visit>(Method::GET, "/visits/9", None, &CancelToken::new())
            .await
            .expect("not cancelled");
        assert_eq!(outcome.unwrap_err().kind, ErrorKind::NotFound);
    }
}
