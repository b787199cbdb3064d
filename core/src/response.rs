//! Executor response types.
//!
//! An [`ExecutorResponse`] is the sole success value of an executor
//! invocation. The engine merges `runtime_data` into the flow's durable
//! state, surfaces `additional_data` to the caller for the current step
//! only, and branches on [`ExecutorStatus`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::context::AuthenticatedUser;

/// Outcome of an executor invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutorStatus {
    /// The node's work is done; the engine advances the flow.
    Complete,

    /// The caller must supply the listed inputs; the engine suspends and
    /// re-invokes the same executor with them.
    UserInputRequired,

    /// The caller must be redirected externally; the engine suspends and
    /// resumes the same executor when callback inputs arrive.
    ExternalRedirection,

    /// Client-visible, flow-terminating failure.
    ///
    /// The default, so that an unset status fails closed rather than
    /// advancing the flow.
    #[default]
    Failure,
}

/// Describes one input the caller must supply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDescriptor {
    /// Input identifier, e.g. `username`.
    pub identifier: String,

    /// Informational type tag, e.g. `"string"` or `"password"`.
    #[serde(rename = "type")]
    pub input_type: String,

    /// Whether the input must be present before execution proceeds.
    pub required: bool,
}

impl InputDescriptor {
    /// Create an input descriptor.
    #[must_use]
    pub fn new(identifier: &str, input_type: &str, required: bool) -> Self {
        Self {
            identifier: identifier.to_string(),
            input_type: input_type.to_string(),
            required,
        }
    }

    /// Required string input.
    #[must_use]
    pub fn string(identifier: &str) -> Self {
        Self::new(identifier, "string", true)
    }

    /// Required password input.
    #[must_use]
    pub fn password(identifier: &str) -> Self {
        Self::new(identifier, "password", true)
    }

    /// Optional string input.
    #[must_use]
    pub fn optional(identifier: &str) -> Self {
        Self::new(identifier, "string", false)
    }
}

/// Result of one executor invocation, consumed by the flow engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutorResponse {
    /// Outcome the engine branches on.
    pub status: ExecutorStatus,

    /// Human-readable failure reason; empty unless the step failed or a
    /// retryable client error occurred.
    pub failure_reason: String,

    /// Inputs the caller must still supply (`UserInputRequired` only).
    pub inputs: Vec<InputDescriptor>,

    /// Redirect target (`ExternalRedirection` only).
    pub redirect_url: String,

    /// The user resolved by this step, if any.
    pub authenticated_user: Option<AuthenticatedUser>,

    /// Updates the engine merges into the flow's runtime data before the
    /// next step.
    pub runtime_data: HashMap<String, String>,

    /// Transient data surfaced to the caller for this step only.
    pub additional_data: HashMap<String, String>,
}

impl ExecutorResponse {
    /// A completed step.
    #[must_use]
    pub fn complete() -> Self {
        Self {
            status: ExecutorStatus::Complete,
            ..Self::default()
        }
    }

    /// A client-visible failure with the given reason.
    #[must_use]
    pub fn failure(reason: &str) -> Self {
        Self {
            status: ExecutorStatus::Failure,
            failure_reason: reason.to_string(),
            ..Self::default()
        }
    }

    /// A suspension asking the caller for `inputs`.
    #[must_use]
    pub fn input_required(inputs: Vec<InputDescriptor>) -> Self {
        Self {
            status: ExecutorStatus::UserInputRequired,
            inputs,
            ..Self::default()
        }
    }

    /// A suspension redirecting the caller to `url`.
    #[must_use]
    pub fn redirect(url: &str) -> Self {
        Self {
            status: ExecutorStatus::ExternalRedirection,
            redirect_url: url.to_string(),
            ..Self::default()
        }
    }

    /// Record a runtime-data update for the engine to merge.
    pub fn set_runtime(&mut self, key: &str, value: &str) {
        self.runtime_data.insert(key.to_string(), value.to_string());
    }

    /// Record transient step data for the caller.
    pub fn set_additional(&mut self, key: &str, value: &str) {
        self.additional_data
            .insert(key.to_string(), value.to_string());
    }

    /// Attach the resolved user.
    pub fn set_authenticated_user(&mut self, user: AuthenticatedUser) {
        self.authenticated_user = Some(user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_status_fails_closed() {
        assert_eq!(ExecutorResponse::default().status, ExecutorStatus::Failure);
    }

    #[test]
    fn constructors_set_status_and_payload() {
        let resp = ExecutorResponse::redirect("https://idp.example/authorize");
        assert_eq!(resp.status, ExecutorStatus::ExternalRedirection);
        assert_eq!(resp.redirect_url, "https://idp.example/authorize");

        let resp = ExecutorResponse::input_required(vec![InputDescriptor::string("username")]);
        assert_eq!(resp.status, ExecutorStatus::UserInputRequired);
        assert_eq!(resp.inputs.len(), 1);

        let resp = ExecutorResponse::failure("User not found");
        assert_eq!(resp.status, ExecutorStatus::Failure);
        assert_eq!(resp.failure_reason, "User not found");
    }

    #[test]
    fn input_descriptor_serializes_type_field() {
        let descriptor = InputDescriptor::password("password");
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["type"], "password");
        assert_eq!(json["identifier"], "password");
        assert_eq!(json["required"], true);
    }
}
