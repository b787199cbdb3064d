//! Error types for flow executors and their collaborating services.
//!
//! Two kinds of failure surface from every executor invocation:
//!
//! 1. **Client-visible flow failures** — returned as an
//!    [`ExecutorResponse`](crate::response::ExecutorResponse) with
//!    `Status = Failure` and no error. The engine ends the flow and relays
//!    the reason to the caller.
//! 2. **Server faults** — returned as [`ExecutorError`]. The engine aborts
//!    the flow with an operational error.
//!
//! Collaborating services report [`ServiceError`]; its
//! [`kind`](ServiceError::kind) decides which of the two buckets an executor
//! maps it into.

use thiserror::Error;

/// Distinguishes caller-induced service failures from upstream faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceErrorKind {
    /// The request was invalid or the target entity is in a conflicting
    /// state; safe to surface to the flow caller.
    Client,

    /// The service itself failed; the flow must abort with an operational
    /// error.
    Server,
}

/// Well-known [`ServiceError`] codes.
pub mod error_codes {
    /// No user matched the supplied identifying attributes.
    pub const USER_NOT_FOUND: &str = "user-not-found";

    /// A user with the supplied identifying attributes already exists.
    pub const USER_ALREADY_EXISTS: &str = "user-already-exists";

    /// Username/password verification failed.
    pub const INVALID_CREDENTIALS: &str = "invalid-credentials";

    /// The supplied one-time password did not verify.
    pub const INVALID_OTP: &str = "invalid-otp";

    /// The supplied passkey assertion or attestation did not verify.
    pub const INVALID_PASSKEY_CREDENTIALS: &str = "invalid-passkey-credentials";

    /// The target entity conflicts with an existing one (name/handle).
    pub const CONFLICT: &str = "conflict";

    /// The request was malformed or missing required fields.
    pub const INVALID_REQUEST: &str = "invalid-request";

    /// The upstream dependency of the service failed.
    pub const UPSTREAM_ERROR: &str = "upstream-error";
}

/// Error reported by a collaborating service.
///
/// Mirrors the wire shape services use: a short machine `code`, an `error`
/// summary, and a human-readable `description`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error} ({code}): {description}")]
pub struct ServiceError {
    /// Client or server classification.
    pub kind: ServiceErrorKind,

    /// Machine-readable error code (see [`error_codes`]).
    pub code: String,

    /// Short error summary.
    pub error: String,

    /// Human-readable description.
    pub description: String,
}

impl ServiceError {
    /// Create a client-kind error.
    #[must_use]
    pub fn client(code: &str, error: &str, description: &str) -> Self {
        Self {
            kind: ServiceErrorKind::Client,
            code: code.to_string(),
            error: error.to_string(),
            description: description.to_string(),
        }
    }

    /// Create a server-kind error.
    #[must_use]
    pub fn server(code: &str, error: &str, description: &str) -> Self {
        Self {
            kind: ServiceErrorKind::Server,
            code: code.to_string(),
            error: error.to_string(),
            description: description.to_string(),
        }
    }

    /// Canonical user-not-found error.
    #[must_use]
    pub fn user_not_found() -> Self {
        Self::client(
            error_codes::USER_NOT_FOUND,
            "User not found",
            "no user matched the supplied attributes",
        )
    }

    /// Returns `true` for caller-induced failures.
    #[must_use]
    pub const fn is_client(&self) -> bool {
        matches!(self.kind, ServiceErrorKind::Client)
    }

    /// Returns `true` for upstream/service faults.
    #[must_use]
    pub const fn is_server(&self) -> bool {
        matches!(self.kind, ServiceErrorKind::Server)
    }

    /// Returns `true` if this is the canonical user-not-found error.
    #[must_use]
    pub fn is_user_not_found(&self) -> bool {
        self.is_client() && self.code == error_codes::USER_NOT_FOUND
    }

    /// Returns `true` for name/handle conflict errors.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.is_client() && self.code == error_codes::CONFLICT
    }
}

/// Server-side fault raised by an executor.
///
/// Returning one of these aborts the flow; anything a caller could recover
/// from is reported through the response status instead.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// A collaborating service failed on its side.
    #[error("service call failed: {0}")]
    Service(#[from] ServiceError),

    /// A stored user attribute blob was not a valid JSON object.
    #[error("user attributes are not a valid JSON object: {0}")]
    MalformedAttributes(String),

    /// A verification leg ran without the session token its send/start leg
    /// should have persisted; indicates engine/state corruption.
    #[error("missing `{0}` session token in runtime data")]
    MissingSessionToken(&'static str),

    /// The node selected an executor mode the executor does not implement.
    #[error("unsupported executor mode `{0}`")]
    UnsupportedMode(String),

    /// A mandatory node property is absent from the flow definition.
    #[error("missing required node property `{0}`")]
    MissingProperty(&'static str),

    /// A runtime-data value failed to parse.
    #[error("invalid runtime data value for `{key}`: {reason}")]
    InvalidRuntimeValue {
        /// The runtime-data key.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A service reported success but returned an empty mandatory field.
    #[error("service returned an empty {0}")]
    EmptyServiceResult(&'static str),

    /// The engine cancelled the step while an outbound call was in flight.
    #[error("execution cancelled")]
    Cancelled,

    /// An outbound HTTP call failed at the transport level.
    #[error("http transport error: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_server_split() {
        assert!(ServiceError::user_not_found().is_client());
        assert!(!ServiceError::user_not_found().is_server());
        assert!(ServiceError::server(error_codes::UPSTREAM_ERROR, "boom", "db down").is_server());
    }

    #[test]
    fn user_not_found_predicate() {
        assert!(ServiceError::user_not_found().is_user_not_found());
        let other = ServiceError::client(error_codes::INVALID_CREDENTIALS, "nope", "bad password");
        assert!(!other.is_user_not_found());
        // A server-side error never reads as user-not-found.
        let server = ServiceError::server(error_codes::USER_NOT_FOUND, "odd", "misclassified");
        assert!(!server.is_user_not_found());
    }

    #[test]
    fn executor_error_from_service_error() {
        let err: ExecutorError = ServiceError::server("x", "y", "z").into();
        assert!(matches!(err, ExecutorError::Service(_)));
    }

    #[test]
    fn display_includes_code_and_description() {
        let err = ServiceError::client(error_codes::CONFLICT, "Conflict", "handle taken");
        assert_eq!(err.to_string(), "Conflict (conflict): handle taken");
    }
}
