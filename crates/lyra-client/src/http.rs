//! Core HTTP request plumbing.
//!
//! Every backend call funnels through [`HttpApi::execute`], which attaches
//! the bearer token from the session store, parses the body leniently and
//! maps non-success statuses onto the client error taxonomy.

use lyra_core::error::{LyraError, Result};
use lyra_infrastructure::config_service::ClientConfig;
use lyra_infrastructure::session_store::SessionStore;
use reqwest::header::HeaderValue;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const GENERIC_ERROR_MESSAGE: &str = "Failed to communicate with the server";

/// Whether a request belongs to the authenticated surface.
///
/// A 401 invalidates the session only on `Required` calls; on `Optional`
/// calls (login, guest chat) it is an ordinary request failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Auth {
    Required,
    Optional,
}

/// HTTP client for the Lyra backend.
pub struct HttpApi {
    client: Client,
    base_url: String,
    store: Arc<SessionStore>,
}

impl HttpApi {
    /// Creates a client from the given configuration.
    pub fn new(config: &ClientConfig, store: Arc<SessionStore>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|err| LyraError::internal(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            store,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Attaches the bearer token whenever one is present. Requests that
    /// require auth but have no token go out bare and fail server-side.
    fn apply_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.store.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends a request and normalizes the response.
    ///
    /// The body is parsed as JSON; a parse failure is treated as an empty
    /// body, never as an error by itself. No retries: every call is
    /// at-most-once from this layer's perspective.
    pub(crate) async fn execute(&self, builder: RequestBuilder, auth: Auth) -> Result<Value> {
        let response = builder
            .send()
            .await
            .map_err(|err| LyraError::transport(err.to_string()))?;

        let status = response.status();
        let header_retry = parse_retry_after(response.headers().get(reqwest::header::RETRY_AFTER));
        let body_text = response.text().await.unwrap_or_default();
        let body: Value = serde_json::from_str(&body_text).unwrap_or(Value::Null);

        if status.is_success() {
            return Ok(body);
        }

        tracing::debug!(
            target: "http",
            status = status.as_u16(),
            "Request failed"
        );

        match status {
            StatusCode::UNAUTHORIZED if auth == Auth::Required => Err(LyraError::Auth),
            StatusCode::TOO_MANY_REQUESTS => Err(LyraError::RateLimited {
                retry_after_seconds: extract_retry_after(&body, header_retry),
            }),
            _ => Err(LyraError::Request {
                message: error_message(&body),
                status: status.as_u16(),
            }),
        }
    }

    pub(crate) async fn get_json(&self, endpoint: &str, auth: Auth) -> Result<Value> {
        let builder = self.apply_auth(self.client.get(self.url(endpoint)));
        self.execute(builder, auth).await
    }

    pub(crate) async fn post_json<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        auth: Auth,
    ) -> Result<Value> {
        let builder = self.apply_auth(self.client.post(self.url(endpoint)).json(body));
        self.execute(builder, auth).await
    }

    pub(crate) async fn post_empty(&self, endpoint: &str, auth: Auth) -> Result<Value> {
        let builder = self.apply_auth(self.client.post(self.url(endpoint)));
        self.execute(builder, auth).await
    }

    pub(crate) async fn post_form(
        &self,
        endpoint: &str,
        fields: &[(&str, &str)],
        auth: Auth,
    ) -> Result<Value> {
        let builder = self.apply_auth(self.client.post(self.url(endpoint)).form(fields));
        self.execute(builder, auth).await
    }

    pub(crate) async fn put_json<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        auth: Auth,
    ) -> Result<Value> {
        let builder = self.apply_auth(self.client.put(self.url(endpoint)).json(body));
        self.execute(builder, auth).await
    }

    pub(crate) async fn put_multipart(
        &self,
        endpoint: &str,
        form: reqwest::multipart::Form,
        auth: Auth,
    ) -> Result<Value> {
        let builder = self.apply_auth(self.client.put(self.url(endpoint)).multipart(form));
        self.execute(builder, auth).await
    }

    pub(crate) async fn delete(&self, endpoint: &str, auth: Auth) -> Result<Value> {
        let builder = self.apply_auth(self.client.delete(self.url(endpoint)));
        self.execute(builder, auth).await
    }
}

/// Decodes a success body into the expected response type.
pub(crate) fn decode<T: DeserializeOwned>(body: Value) -> Result<T> {
    serde_json::from_value(body)
        .map_err(|err| LyraError::Serialization(format!("Unexpected response shape: {err}")))
}

/// Builds a single human-readable message from an error body.
///
/// Priority: `detail` (a list joins per-item `msg` values with `", "`, a
/// string is used as-is, an object contributes its `message`), then a
/// top-level `message`, then a generic fallback.
fn error_message(body: &Value) -> String {
    let derived = match body.get("detail") {
        Some(Value::Array(items)) => {
            let joined = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(", ");
            Some(joined).filter(|msg| !msg.is_empty())
        }
        Some(Value::String(detail)) => Some(detail.clone()).filter(|msg| !msg.is_empty()),
        Some(Value::Object(detail)) => detail
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    };

    derived
        .or_else(|| {
            body.get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string())
}

/// Extracts the rate-limit wait in seconds.
///
/// The backend has sent this under two names over time; the `Retry-After`
/// header is the last resort.
fn extract_retry_after(body: &Value, header: Option<u64>) -> u64 {
    body.get("retry_after_seconds")
        .and_then(Value::as_u64)
        .or_else(|| body.pointer("/detail/retry_after").and_then(Value::as_u64))
        .or(header)
        .unwrap_or(0)
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<u64> {
    let value = header?.to_str().ok()?;
    // Retry-After HTTP-date parsing is omitted for simplicity
    value.parse::<u64>().ok()
}
