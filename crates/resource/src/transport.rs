//! The seam between the coordinator and whatever actually moves bytes.
//!
//! The coordinator never touches sockets. It builds a [`TransportRequest`],
//! hands it to a [`Transport`], and inspects the [`TransportResponse`] once the
//! round trip finishes.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use http::StatusCode;
use serde_json::Value;

use crate::request::{Method, RequestDescriptor};

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Whether cookies and other credentials ride along with a request.
///
/// Mirrors the browser fetch `credentials` modes.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum CredentialsPolicy {
    #[default]
    Include,
    SameOrigin,
    Omit,
}

impl CredentialsPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialsPolicy::Include => "include",
            CredentialsPolicy::SameOrigin => "same-origin",
            CredentialsPolicy::Omit => "omit",
        }
    }
}

/// Fully resolved request handed to a [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub url: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub credentials: CredentialsPolicy,
    pub body: Option<String>,
}

impl TransportRequest {
    /// Build the request for `descriptor` against an already prefixed URL.
    ///
    /// Always JSON, always with credentials.
    pub fn for_descriptor(url: String, descriptor: &RequestDescriptor) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self {
            url,
            method: descriptor.method,
            headers,
            credentials: CredentialsPolicy::Include,
            body: descriptor.body(),
        }
    }
}

/// A completed round trip with its body fully buffered.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// Parse the buffered body as JSON.
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// The round trip itself failed: no response to inspect.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Something that can perform one request/response round trip.
///
/// Implementations must be `Send + Sync` so a coordinator can be shared across
/// tasks. The returned future is `'static`: it must own whatever it needs
/// rather than borrow the transport.
pub trait Transport: Send + Sync {
    fn send(&self, request: TransportRequest)
    -> BoxFuture<'static, Result<TransportResponse, TransportError>>;
}

impl fmt::Debug for dyn Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn Transport")
    }
}
