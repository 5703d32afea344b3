use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier used when a caller does not pick one.
///
/// All anonymous requests share this slot, so they supersede each other.
pub const DEFAULT_REQUEST_ID: &str = "fetch";

/// Standard HTTP verbs accepted by the coordinator.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Connect,
    Trace,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Connect => "CONNECT",
            Method::Trace => "TRACE",
        }
    }

    /// `GET` and `HEAD` never carry a body.
    pub fn permits_body(&self) -> bool {
        !matches!(self, Method::Get | Method::Head)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMethod(pub String);

impl fmt::Display for UnknownMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a standard HTTP method: {}", self.0)
    }
}

impl std::error::Error for UnknownMethod {}

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "OPTIONS" => Ok(Method::Options),
            "CONNECT" => Ok(Method::Connect),
            "TRACE" => Ok(Method::Trace),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => http::Method::GET,
            Method::Head => http::Method::HEAD,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Patch => http::Method::PATCH,
            Method::Delete => http::Method::DELETE,
            Method::Options => http::Method::OPTIONS,
            Method::Connect => http::Method::CONNECT,
            Method::Trace => http::Method::TRACE,
        }
    }
}

/// What to request, and which supersession slot it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    /// Logical identifier. Requests sharing it are mutually exclusive.
    #[serde(default = "default_id")]
    pub id: String,

    /// Path appended to the coordinator's base URL.
    pub endpoint: String,

    #[serde(default)]
    pub method: Method,

    /// JSON payload; only shipped for body-carrying methods when non-empty.
    #[serde(default)]
    pub payload: Value,
}

fn default_id() -> String {
    DEFAULT_REQUEST_ID.to_string()
}

impl RequestDescriptor {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            id: default_id(),
            endpoint: endpoint.into(),
            method: Method::Get,
            payload: Value::Null,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(endpoint)
    }

    pub fn post(endpoint: impl Into<String>, payload: Value) -> Self {
        Self::new(endpoint)
            .with_method(Method::Post)
            .with_payload(payload)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Serialized request body, if one should be sent at all.
    pub fn body(&self) -> Option<String> {
        if !self.method.permits_body() || payload_is_empty(&self.payload) {
            return None;
        }
        Some(self.payload.to_string())
    }
}

/// A payload counts as empty when it has no enumerable entries.
///
/// Scalars (numbers, booleans) have none, so they are never shipped.
pub fn payload_is_empty(payload: &Value) -> bool {
    match payload {
        Value::Null | Value::Bool(_) | Value::Number(_) => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::{Method, RequestDescriptor, payload_is_empty};
    use serde_json::json;

    #[test]
    fn descriptor_defaults_match_anonymous_get() {
        let d: RequestDescriptor = serde_json::from_value(json!({ "endpoint": "/layers" })).unwrap();
        assert_eq!(d.id, "fetch");
        assert_eq!(d.method, Method::Get);
        assert!(d.payload.is_null());
        assert_eq!(d, RequestDescriptor::new("/layers"));
    }

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("post".parse::<Method>(), Ok(Method::Post));
        assert_eq!("DELETE".parse::<Method>(), Ok(Method::Delete));
        assert!("FETCH".parse::<Method>().is_err());
        assert_eq!(http::Method::from(Method::Patch), http::Method::PATCH);
    }

    #[test]
    fn method_serializes_uppercase() {
        assert_eq!(serde_json::to_value(Method::Options).unwrap(), json!("OPTIONS"));
    }

    #[test]
    fn body_only_for_non_empty_payload_on_body_methods() {
        let payload = json!({ "data": true });
        assert_eq!(
            RequestDescriptor::post("/e", payload.clone()).body().as_deref(),
            Some(r#"{"data":true}"#)
        );
        assert_eq!(
            RequestDescriptor::get("/e").with_payload(payload.clone()).body(),
            None
        );
        assert_eq!(
            RequestDescriptor::new("/e")
                .with_method(Method::Head)
                .with_payload(payload)
                .body(),
            None
        );
        assert_eq!(RequestDescriptor::post("/e", json!({})).body(), None);
    }

    #[test]
    fn scalars_count_as_empty() {
        assert!(payload_is_empty(&json!(null)));
        assert!(payload_is_empty(&json!(42)));
        assert!(payload_is_empty(&json!(false)));
        assert!(payload_is_empty(&json!("")));
        assert!(payload_is_empty(&json!([])));
        assert!(!payload_is_empty(&json!("x")));
        assert!(!payload_is_empty(&json!([0])));
        assert!(!payload_is_empty(&json!({ "k": null })));
    }
}
