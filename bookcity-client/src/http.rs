//! HTTP transports
//!
//! [`NetworkHttpClient`] goes over the wire with reqwest; [`OneshotHttpClient`]
//! drives an axum `Router` directly through `tower::ServiceExt::oneshot`.
//! Both attach the bearer token from their [`Credentials`] to every request
//! and decode failures into [`ClientError`].

use std::time::Duration;

use ::http::{Method, Request, StatusCode, header};
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tower::ServiceExt;

use crate::{ClientConfig, ClientError, ClientResult, Credentials};

/// Decode a response body, or the server's error envelope
fn decode<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> ClientResult<T> {
    if !status.is_success() {
        return Err(ClientError::from_response(status, body));
    }
    serde_json::from_slice(body)
        .map_err(|e| ClientError::InvalidResponse(format!("JSON parse error: {}", e)))
}

/// HTTP client trait
///
/// `path` always starts with `/api/...`.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T>;
    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T>;
    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T>;
    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T>;
    async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T>;
    fn credentials(&self) -> &Credentials;
}

// ============================================================================
// NetworkHttpClient
// ============================================================================

/// Network HTTP client (reqwest)
#[derive(Debug, Clone)]
pub struct NetworkHttpClient {
    client: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl NetworkHttpClient {
    pub fn new(config: &ClientConfig, credentials: Credentials) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send<T: DeserializeOwned>(&self, mut req: reqwest::RequestBuilder) -> ClientResult<T> {
        if let Some(auth) = self.credentials.authorization().await {
            req = req.header(reqwest::header::AUTHORIZATION, auth);
        }
        let response = req.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            tracing::debug!(status = %status, "Request rejected");
        }
        decode(status, &bytes)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl HttpClient for NetworkHttpClient {
    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(self.client.get(self.url(path))).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(self.client.post(self.url(path)).json(body)).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(self.client.post(self.url(path))).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(self.client.put(self.url(path)).json(body)).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(self.client.delete(self.url(path))).await
    }

    fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

// ============================================================================
// OneshotHttpClient
// ============================================================================

/// In-process HTTP client
///
/// ```ignore
/// let router = bookcity_server::build_router(state);
/// let client = OneshotHttpClient::new(router, Credentials::default());
/// let books: Paginated<BookSummary> = client.get("/api/books").await?;
/// ```
#[derive(Debug, Clone)]
pub struct OneshotHttpClient {
    router: Router,
    credentials: Credentials,
}

impl OneshotHttpClient {
    /// `router` must already have its state attached
    pub fn new(router: Router, credentials: Credentials) -> Self {
        Self { router, credentials }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> ClientResult<T> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(auth) = self.credentials.authorization().await {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        let request = match body {
            Some(bytes) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(bytes)),
            None => builder.body(Body::empty()),
        }
        .map_err(|e| ClientError::Internal(format!("Failed to build request: {}", e)))?;

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .map_err(|e| ClientError::Internal(format!("Oneshot call failed: {}", e)))?;

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| ClientError::Internal(format!("Failed to read body: {}", e)))?;
        decode(status, &bytes)
    }
}

#[async_trait]
impl HttpClient for OneshotHttpClient {
    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.execute(Method::GET, path, None).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let bytes = serde_json::to_vec(body)?;
        self.execute(Method::POST, path, Some(bytes)).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.execute(Method::POST, path, None).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let bytes = serde_json::to_vec(body)?;
        self.execute(Method::PUT, path, Some(bytes)).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.execute(Method::DELETE, path, None).await
    }

    fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}
