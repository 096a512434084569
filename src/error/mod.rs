//! Error types for the admin client
//!
//! Transport failures are kept intact as the `source` of the client-level
//! [`Error`], which adds the operation and path that failed.

use crate::resource::ResourceKind;
use std::fmt;
use thiserror::Error;

/// Failure reported by a [`Transport`](crate::transport::Transport)
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, timeout or protocol failure below HTTP status handling
    #[error("request failed: {0}")]
    Network(#[source] reqwest::Error),

    /// HTTP 404
    #[error("not found: {message}")]
    NotFound { message: String },

    /// Any other non-2xx status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body is not valid JSON
    #[error("malformed response body: {0}")]
    Body(#[source] serde_json::Error),

    /// The caller's cancellation token fired before the response arrived
    #[error("request cancelled")]
    Cancelled,

    /// The request could not be built (bad URL, header, ...)
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TransportError::NotFound { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TransportError::Cancelled)
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::NotFound { .. } => Some(404),
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Admin operation that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Get,
    Update,
    Delete,
    List,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Get => "get",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::List => "list",
        };
        f.write_str(name)
    }
}

/// Client error
#[derive(Debug, Error)]
pub enum Error {
    #[error("{op} {path}: {source}")]
    Transport {
        op: Operation,
        path: String,
        #[source]
        source: TransportError,
    },

    #[error("{op} {path}: {kind} payload does not match the expected shape: {source}")]
    Encoding {
        op: Operation,
        kind: ResourceKind,
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{op} {kind}: {reason}")]
    InvalidArgument {
        op: Operation,
        kind: ResourceKind,
        reason: &'static str,
    },
}

impl Error {
    /// True when the admin API answered 404
    pub fn is_not_found(&self) -> bool {
        self.transport().map(|e| e.is_not_found()).unwrap_or(false)
    }

    /// True when the request was abandoned because the caller cancelled it
    pub fn is_cancelled(&self) -> bool {
        self.transport().map(|e| e.is_cancelled()).unwrap_or(false)
    }

    pub fn status(&self) -> Option<u16> {
        self.transport().and_then(|e| e.status())
    }

    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            Error::Transport { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            Error::Transport { op, .. }
            | Error::Encoding { op, .. }
            | Error::InvalidArgument { op, .. } => *op,
        }
    }
}

/// Client result type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn transport_error(source: TransportError) -> Error {
        Error::Transport {
            op: Operation::Delete,
            path: "/consumers/alice".to_string(),
            source,
        }
    }

    #[test]
    fn test_not_found_classification() {
        let err = transport_error(TransportError::NotFound {
            message: "Not found".to_string(),
        });
        assert!(err.is_not_found());
        assert!(!err.is_cancelled());
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.operation(), Operation::Delete);

        let err = transport_error(TransportError::Status {
            status: 500,
            message: "boom".to_string(),
        });
        assert!(!err.is_not_found());
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_cancelled_classification() {
        let err = transport_error(TransportError::Cancelled);
        assert!(err.is_cancelled());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_error_message_carries_context() {
        let err = transport_error(TransportError::Status {
            status: 409,
            message: "UNIQUE violation detected on '{username=\"alice\"}'".to_string(),
        });
        let msg = err.to_string();
        assert!(msg.starts_with("delete /consumers/alice: HTTP 409"));

        let err = Error::InvalidArgument {
            op: Operation::Update,
            kind: ResourceKind::Route,
            reason: "entity has no identifier",
        };
        assert_eq!(err.to_string(), "update route: entity has no identifier");
        assert!(err.transport().is_none());
    }

    #[test]
    fn test_encoding_error_keeps_source() {
        let source = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        let err = Error::Encoding {
            op: Operation::Get,
            kind: ResourceKind::Consumer,
            path: "/consumers/alice".to_string(),
            source,
        };
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("consumer payload"));
    }
}
