//! Response body wire shape.
//!
//! The backend answers with a JSON object:
//!
//! ```json
//! { "success": true, "data": { ... } }
//! ```
//!
//! Only `data` matters here. `success` is tolerated but not interpreted, and a
//! missing `data` field is a successful response with no payload.

use serde_json::Value;

use crate::transport::TransportResponse;

/// The body could not be turned into a response envelope.
#[derive(Debug, thiserror::Error)]
pub enum MalformedResponse {
    #[error("response body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("expected a JSON object response body, found {found}")]
    UnexpectedShape { found: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub success: Option<bool>,
    pub data: Option<Value>,
}

impl ResponseEnvelope {
    pub fn from_response(response: &TransportResponse) -> Result<Self, MalformedResponse> {
        Self::from_value(response.json()?)
    }

    pub fn from_value(value: Value) -> Result<Self, MalformedResponse> {
        let mut map = match value {
            Value::Object(map) => map,
            other => {
                return Err(MalformedResponse::UnexpectedShape {
                    found: json_kind(&other),
                });
            }
        };
        Ok(Self {
            success: map.get("success").and_then(Value::as_bool),
            data: map.remove("data"),
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::{MalformedResponse, ResponseEnvelope};
    use crate::transport::TransportResponse;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parse(body: &'static [u8]) -> Result<ResponseEnvelope, MalformedResponse> {
        ResponseEnvelope::from_response(&TransportResponse::ok(body))
    }

    #[test]
    fn extracts_data_and_ignores_success_flag() {
        let env = parse(br#"{"success":true,"data":{"response":true}}"#).unwrap();
        assert_eq!(env.data, Some(json!({ "response": true })));
        assert_eq!(env.success, Some(true));
    }

    #[test]
    fn missing_data_is_not_an_error() {
        let env = parse(br#"{"success":false}"#).unwrap();
        assert_eq!(env.data, None);
    }

    #[test]
    fn explicit_null_data_is_kept() {
        let env = parse(br#"{"data":null}"#).unwrap();
        assert_eq!(env.data, Some(json!(null)));
    }

    #[test]
    fn non_object_bodies_are_malformed() {
        let bodies: [&'static [u8]; 4] = [b"null", b"[1,2]", b"\"ok\"", b"7"];
        for body in bodies {
            assert!(matches!(
                parse(body),
                Err(MalformedResponse::UnexpectedShape { .. })
            ));
        }
    }

    #[test]
    fn unparseable_bodies_are_malformed() {
        assert!(matches!(
            parse(b"<!doctype html>"),
            Err(MalformedResponse::InvalidJson(_))
        ));
        assert!(matches!(
            parse(b""),
            Err(MalformedResponse::InvalidJson(_))
        ));
    }
}
