use std::fmt;

use serde_json::Value;

use crate::protocol::MalformedResponse;
use crate::transport::TransportError;

/// Error code for a request that lost to a more recent request with the same ID.
pub const EREQUESTDEDUPLICATION: &str = "EREQUESTDEDUPLICATION";
pub const ETRANSPORT: &str = "ETRANSPORT";
pub const EMALFORMEDRESPONSE: &str = "EMALFORMEDRESPONSE";

/// The single result delivered for every issued request.
#[derive(Debug)]
pub enum Outcome {
    /// `data` from the response envelope; `None` when the field was absent.
    Success(Option<Value>),
    /// A later request with the same identifier was issued first.
    Superseded,
    TransportError(TransportError),
    MalformedResponse(MalformedResponse),
}

impl Outcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Success(_) => OutcomeKind::Success,
            Outcome::Superseded => OutcomeKind::Superseded,
            Outcome::TransportError(_) => OutcomeKind::TransportError,
            Outcome::MalformedResponse(_) => OutcomeKind::MalformedResponse,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, Outcome::Superseded)
    }

    /// Collapse into the `(error, data)` pair callers receive.
    ///
    /// `id` names the identifier reported by [`RequestError::Superseded`].
    pub fn into_result(self, id: &str) -> Result<Option<Value>, RequestError> {
        match self {
            Outcome::Success(data) => Ok(data),
            Outcome::Superseded => Err(RequestError::Superseded { id: id.to_string() }),
            Outcome::TransportError(err) => Err(RequestError::Transport(err)),
            Outcome::MalformedResponse(err) => Err(RequestError::Malformed(err)),
        }
    }
}

/// Fieldless view of [`Outcome`] for logs, breadcrumbs and counters.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OutcomeKind {
    Success,
    Superseded,
    TransportError,
    MalformedResponse,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Success => "success",
            OutcomeKind::Superseded => "superseded",
            OutcomeKind::TransportError => "transport_error",
            OutcomeKind::MalformedResponse => "malformed_response",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error half of a request callback.
///
/// `Superseded` is a control signal rather than a failure: UIs should drop it
/// silently and surface the other two.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Request superseded by more recent request of the same ID")]
    Superseded { id: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Malformed(#[from] MalformedResponse),
}

impl RequestError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            RequestError::Superseded { .. } => EREQUESTDEDUPLICATION,
            RequestError::Transport(_) => ETRANSPORT,
            RequestError::Malformed(_) => EMALFORMEDRESPONSE,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, RequestError::Superseded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::{EREQUESTDEDUPLICATION, Outcome, OutcomeKind, RequestError};
    use crate::protocol::MalformedResponse;
    use crate::transport::TransportError;
    use serde_json::json;

    #[test]
    fn success_maps_to_data() {
        let res = Outcome::Success(Some(json!({ "v": 2 }))).into_result("a");
        assert_eq!(res.unwrap(), Some(json!({ "v": 2 })));
    }

    #[test]
    fn superseded_carries_dedup_code() {
        let err = Outcome::Superseded.into_result("layers").unwrap_err();
        assert!(err.is_superseded());
        assert_eq!(err.code(), EREQUESTDEDUPLICATION);
        assert_eq!(
            err.to_string(),
            "Request superseded by more recent request of the same ID"
        );
        assert!(matches!(err, RequestError::Superseded { id } if id == "layers"));
    }

    #[test]
    fn failures_are_not_superseded() {
        let transport = Outcome::TransportError(TransportError::new("offline"))
            .into_result("a")
            .unwrap_err();
        assert!(!transport.is_superseded());
        assert_eq!(transport.code(), "ETRANSPORT");
        assert_eq!(transport.to_string(), "offline");

        let malformed = Outcome::MalformedResponse(MalformedResponse::UnexpectedShape {
            found: "null",
        })
        .into_result("a")
        .unwrap_err();
        assert_eq!(malformed.code(), "EMALFORMEDRESPONSE");
    }

    #[test]
    fn kinds_have_stable_names() {
        assert_eq!(Outcome::Superseded.kind(), OutcomeKind::Superseded);
        assert_eq!(OutcomeKind::TransportError.as_str(), "transport_error");
        assert_eq!(OutcomeKind::MalformedResponse.to_string(), "malformed_response");
    }
}
