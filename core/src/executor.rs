//! The executor contract and its default lifecycle behavior.
//!
//! Executors are the pluggable units a flow node delegates to. They are
//! stateless beyond injected service handles and must be re-entrant: the
//! engine may run many flows concurrently, each with its own
//! [`NodeContext`].
//!
//! [`ExecutorBase`] carries the metadata and the shared lifecycle steps
//! (input-presence check, prerequisite check, user-id extraction); concrete
//! executors embed it by composition rather than reimplementing the
//! contract.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::constants::runtime_keys;
use crate::context::NodeContext;
use crate::error::ExecutorError;
use crate::response::{ExecutorResponse, ExecutorStatus, InputDescriptor};

/// Well-known executor kinds the flow factory can construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutorKind {
    /// Maps identifying attributes to an internal user id.
    IdentityResolver,

    /// Username + password authentication or uniqueness check.
    BasicAuth,

    /// Two-mode SMS one-time-password authentication.
    SmsOtp,

    /// Federated login against a generic OIDC provider.
    Oidc,

    /// Federated login against GitHub.
    Github,

    /// Federated login against Google.
    Google,

    /// Four-mode WebAuthn ceremonies.
    Passkey,

    /// Config-driven outbound HTTP call.
    HttpRequest,

    /// Organization unit creation.
    OuCreate,

    /// User materialization with group/role assignment.
    Provision,
}

impl ExecutorKind {
    /// Get the kind as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::IdentityResolver => "identity_resolver",
            Self::BasicAuth => "basic_auth",
            Self::SmsOtp => "sms_otp",
            Self::Oidc => "oidc",
            Self::Github => "github",
            Self::Google => "google",
            Self::Passkey => "passkey",
            Self::HttpRequest => "http_request",
            Self::OuCreate => "ou_create",
            Self::Provision => "provision",
        }
    }

    /// Parse a kind from its string form.
    ///
    /// # Errors
    ///
    /// Returns the unrecognized input when it names no known kind.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "identity_resolver" => Ok(Self::IdentityResolver),
            "basic_auth" => Ok(Self::BasicAuth),
            "sms_otp" => Ok(Self::SmsOtp),
            "oidc" => Ok(Self::Oidc),
            "github" => Ok(Self::Github),
            "google" => Ok(Self::Google),
            "passkey" => Ok(Self::Passkey),
            "http_request" => Ok(Self::HttpRequest),
            "ou_create" => Ok(Self::OuCreate),
            "provision" => Ok(Self::Provision),
            _ => Err(format!("Unknown executor kind: {s}")),
        }
    }
}

impl std::str::FromStr for ExecutorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for ExecutorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The step contract every executor implements.
///
/// `execute` returns exactly one of a response or an error: a response with
/// `Status = Failure` is a client-visible flow failure, an error is a
/// server-side fault.
pub trait Executor: Send + Sync {
    /// Executor instance name.
    fn name(&self) -> &str;

    /// Executor kind.
    fn kind(&self) -> ExecutorKind;

    /// Inputs this executor asks for when the node declares none.
    fn default_inputs(&self) -> &[InputDescriptor];

    /// Data that must be present (or derivable) before execution.
    fn prerequisites(&self) -> &[InputDescriptor];

    /// Run the node's step.
    fn execute(
        &self,
        ctx: &NodeContext,
    ) -> impl Future<Output = Result<ExecutorResponse, ExecutorError>> + Send;
}

/// Shared metadata and default lifecycle behavior, embedded by every
/// concrete executor.
#[derive(Debug, Clone)]
pub struct ExecutorBase {
    name: String,
    kind: ExecutorKind,
    default_inputs: Vec<InputDescriptor>,
    prerequisites: Vec<InputDescriptor>,
}

impl ExecutorBase {
    /// Create base metadata for an executor.
    #[must_use]
    pub fn new(
        name: &str,
        kind: ExecutorKind,
        default_inputs: Vec<InputDescriptor>,
        prerequisites: Vec<InputDescriptor>,
    ) -> Self {
        Self {
            name: name.to_string(),
            kind,
            default_inputs,
            prerequisites,
        }
    }

    /// Executor instance name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Executor kind.
    #[must_use]
    pub const fn kind(&self) -> ExecutorKind {
        self.kind
    }

    /// Default input schema.
    #[must_use]
    pub fn default_inputs(&self) -> &[InputDescriptor] {
        &self.default_inputs
    }

    /// Prerequisite schema.
    #[must_use]
    pub fn prerequisites(&self) -> &[InputDescriptor] {
        &self.prerequisites
    }

    /// Inputs required for this invocation: the node's declared schema when
    /// present, the executor defaults otherwise.
    #[must_use]
    pub fn required_inputs<'a>(&'a self, ctx: &'a NodeContext) -> &'a [InputDescriptor] {
        if ctx.node_inputs.is_empty() {
            &self.default_inputs
        } else {
            &ctx.node_inputs
        }
    }

    /// Check that every required input is present in `UserInputs` or
    /// `RuntimeData`.
    ///
    /// Appends each missing input to `resp.inputs` and marks the response
    /// `UserInputRequired` when any is absent.
    pub fn has_required_inputs(&self, ctx: &NodeContext, resp: &mut ExecutorResponse) -> bool {
        let mut satisfied = true;
        for input in self.required_inputs(ctx) {
            if !input.required {
                continue;
            }
            if ctx.input_or_runtime(&input.identifier).is_none() {
                resp.inputs.push(input.clone());
                satisfied = false;
            }
        }
        if !satisfied {
            resp.status = ExecutorStatus::UserInputRequired;
        }
        satisfied
    }

    /// Check that every prerequisite is satisfied in `RuntimeData` or
    /// derivable from the resolved user.
    ///
    /// Marks the response as a failure when any prerequisite is missing.
    pub fn validate_prerequisites(&self, ctx: &NodeContext, resp: &mut ExecutorResponse) -> bool {
        for prerequisite in &self.prerequisites {
            let satisfied = ctx.runtime_value(&prerequisite.identifier).is_some()
                || (prerequisite.identifier == runtime_keys::USER_ID
                    && self.user_id_from_context(ctx).is_some());
            if !satisfied {
                resp.status = ExecutorStatus::Failure;
                resp.failure_reason =
                    format!("prerequisite `{}` not met", prerequisite.identifier);
                return false;
            }
        }
        true
    }

    /// The user id resolved so far: the authenticated user's id when set,
    /// the `userID` runtime value otherwise.
    #[must_use]
    pub fn user_id_from_context(&self, ctx: &NodeContext) -> Option<String> {
        if let Some(user) = &ctx.authenticated_user {
            if !user.user_id.is_empty() {
                return Some(user.user_id.clone());
            }
        }
        ctx.runtime_value(runtime_keys::USER_ID).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{AuthenticatedUser, FlowType};

    fn base() -> ExecutorBase {
        ExecutorBase::new(
            "basic_auth",
            ExecutorKind::BasicAuth,
            vec![
                InputDescriptor::string("username"),
                InputDescriptor::password("password"),
            ],
            vec![],
        )
    }

    #[test]
    fn missing_inputs_are_reported() {
        let ctx = NodeContext::new("f1", FlowType::Authentication)
            .with_user_input("username", "testuser");
        let mut resp = ExecutorResponse::default();

        assert!(!base().has_required_inputs(&ctx, &mut resp));
        assert_eq!(resp.status, ExecutorStatus::UserInputRequired);
        assert_eq!(resp.inputs.len(), 1);
        assert_eq!(resp.inputs[0].identifier, "password");
    }

    #[test]
    fn runtime_data_satisfies_inputs() {
        let ctx = NodeContext::new("f1", FlowType::Authentication)
            .with_user_input("username", "testuser")
            .with_runtime_value("password", "from-earlier-step");
        let mut resp = ExecutorResponse::default();

        assert!(base().has_required_inputs(&ctx, &mut resp));
        assert!(resp.inputs.is_empty());
    }

    #[test]
    fn node_inputs_override_defaults() {
        let ctx = NodeContext::new("f1", FlowType::Authentication)
            .with_node_inputs(vec![InputDescriptor::string("email")]);
        let mut resp = ExecutorResponse::default();

        assert!(!base().has_required_inputs(&ctx, &mut resp));
        assert_eq!(resp.inputs[0].identifier, "email");
    }

    #[test]
    fn optional_inputs_are_not_enforced() {
        let ctx = NodeContext::new("f1", FlowType::Authentication)
            .with_node_inputs(vec![InputDescriptor::optional("credentialName")]);
        let mut resp = ExecutorResponse::default();

        assert!(base().has_required_inputs(&ctx, &mut resp));
    }

    #[test]
    fn user_id_prefers_authenticated_user() {
        let ctx = NodeContext::new("f1", FlowType::Authentication)
            .with_runtime_value("userID", "runtime-user")
            .with_authenticated_user(AuthenticatedUser {
                is_authenticated: true,
                user_id: "auth-user".to_string(),
                ..AuthenticatedUser::default()
            });

        assert_eq!(
            base().user_id_from_context(&ctx),
            Some("auth-user".to_string())
        );
    }

    #[test]
    fn user_id_prerequisite_derivable_from_context() {
        let base = ExecutorBase::new(
            "passkey",
            ExecutorKind::Passkey,
            vec![],
            vec![InputDescriptor::string("userID")],
        );
        let ctx = NodeContext::new("f1", FlowType::Authentication)
            .with_runtime_value("userID", "u1");
        let mut resp = ExecutorResponse::default();

        assert!(base.validate_prerequisites(&ctx, &mut resp));

        let empty_ctx = NodeContext::new("f1", FlowType::Authentication);
        let mut resp = ExecutorResponse::default();
        assert!(!base.validate_prerequisites(&empty_ctx, &mut resp));
        assert_eq!(resp.status, ExecutorStatus::Failure);
    }

    #[test]
    fn kind_round_trips_through_strings() {
        for kind in [
            ExecutorKind::IdentityResolver,
            ExecutorKind::BasicAuth,
            ExecutorKind::SmsOtp,
            ExecutorKind::Oidc,
            ExecutorKind::Github,
            ExecutorKind::Google,
            ExecutorKind::Passkey,
            ExecutorKind::HttpRequest,
            ExecutorKind::OuCreate,
            ExecutorKind::Provision,
        ] {
            assert_eq!(ExecutorKind::parse(kind.as_str()), Ok(kind));
        }
        assert!(ExecutorKind::parse("jwt_mint").is_err());
    }
}
