//! Transport module for talking to the admin API
//!
//! This module provides:
//! - The [`Transport`] trait every client operation is composed against
//! - [`RequestContext`], which carries the caller's cancellation signal
//! - [`HttpTransport`], the `reqwest` implementation used in production
//!
//! A transport performs exactly one request per call. It never retries.

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::metrics::ClientMetrics;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub use reqwest::Method;

/// Per-call context passed down to the transport
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
}

impl RequestContext {
    /// A context that is never cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// A context bound to the caller's cancellation token
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Request executor for the admin API.
///
/// `path` is relative to the admin base URL and already percent-encoded.
/// Returns `None` when the response has no body (e.g. `204 No Content`).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(
        &self,
        ctx: &RequestContext,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Option<Value>, TransportError>;
}

/// HTTP transport backed by `reqwest`
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    metrics: Option<Arc<ClientMetrics>>,
}

impl HttpTransport {
    /// Create a transport for `base_url` sending `headers` on every request
    pub fn new(
        base_url: &str,
        timeout: Duration,
        headers: &[(String, String)],
    ) -> Result<Self, TransportError> {
        let mut default_headers = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::InvalidRequest(format!("header '{}': {}", name, e)))?;
            let mut value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::InvalidRequest(format!("header '{}': {}", name, e)))?;
            value.set_sensitive(true);
            default_headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .user_agent(concat!("kong-admin/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(TransportError::Network)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            metrics: None,
        })
    }

    /// Create a transport from client configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        Self::new(
            config.admin_url(),
            Duration::from_secs(config.admin.timeout),
            &config.request_headers(),
        )
    }

    /// Record request metrics into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<ClientMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn record(&self, method: &Method, path: &str, status: Option<u16>, latency: Duration) {
        if let Some(metrics) = &self.metrics {
            metrics.record_request(method.as_str(), path, status, latency);
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        ctx: &RequestContext,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Option<Value>, TransportError> {
        if ctx.is_cancelled() {
            return Err(TransportError::Cancelled);
        }

        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.client.request(method.clone(), &url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let start = Instant::now();
        let exchange = async {
            let response = builder.send().await?;
            let status = response.status();
            let bytes = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, bytes))
        };

        let outcome = tokio::select! {
            biased;
            _ = ctx.cancellation().cancelled() => {
                self.record(&method, path, None, start.elapsed());
                debug!(method = %method, path, "admin request cancelled");
                return Err(TransportError::Cancelled);
            }
            outcome = exchange => outcome,
        };

        let latency = start.elapsed();
        let (status, bytes) = match outcome {
            Ok(exchanged) => exchanged,
            Err(e) => {
                self.record(&method, path, None, latency);
                warn!(method = %method, path, error = %e, "admin request failed");
                return Err(TransportError::Network(e));
            }
        };

        self.record(&method, path, Some(status.as_u16()), latency);
        debug!(
            method = %method,
            path,
            status = status.as_u16(),
            latency_ms = latency.as_millis() as u64,
            "admin request"
        );

        if status == StatusCode::NOT_FOUND {
            return Err(TransportError::NotFound {
                message: error_message(status, &bytes),
            });
        }
        if !status.is_success() {
            let message = error_message(status, &bytes);
            warn!(method = %method, path, status = status.as_u16(), %message, "admin API returned an error");
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(TransportError::Body)
    }
}

/// Extract a human readable message from an error response body.
///
/// Prefers the `message` field of a JSON body, then the raw text, then the
/// canonical reason phrase.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) {
        if let Some(Value::String(message)) = map.get("message") {
            return message.clone();
        }
    }
    let text = String::from_utf8_lossy(body).trim().to_string();
    if !text.is_empty() {
        return text;
    }
    status
        .canonical_reason()
        .unwrap_or("unknown status")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_json_message() {
        let body = br#"{"message":"Not found"}"#;
        assert_eq!(error_message(StatusCode::NOT_FOUND, body), "Not found");
    }

    #[test]
    fn test_error_message_falls_back_to_text() {
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, b"  upstream down \n"),
            "upstream down"
        );
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, br#"{"name":"schema violation"}"#),
            r#"{"name":"schema violation"}"#
        );
    }

    #[test]
    fn test_error_message_falls_back_to_reason() {
        assert_eq!(
            error_message(StatusCode::SERVICE_UNAVAILABLE, b""),
            "Service Unavailable"
        );
    }

    #[test]
    fn test_invalid_header_is_rejected() {
        let headers = vec![("Bad Header".to_string(), "x".to_string())];
        let result = HttpTransport::new("http://localhost:8001", Duration::from_secs(1), &headers);
        assert!(matches!(result, Err(TransportError::InvalidRequest(_))));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let transport =
            HttpTransport::new("http://localhost:8001/", Duration::from_secs(1), &[]).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:8001");
    }

    #[test]
    fn test_context_cancellation() {
        let token = CancellationToken::new();
        let ctx = RequestContext::with_cancellation(token.clone());
        assert!(!ctx.is_cancelled());
        token.cancel();
        assert!(ctx.is_cancelled());
        assert!(!RequestContext::new().is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_context_short_circuits() {
        let transport =
            HttpTransport::new("http://127.0.0.1:9", Duration::from_secs(1), &[]).unwrap();
        let ctx = RequestContext::new();
        ctx.cancellation().cancel();

        let err = transport
            .request(&ctx, Method::GET, "/routes", &[], None)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
