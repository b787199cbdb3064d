//! Flow context types.
//!
//! A [`NodeContext`] is created by the flow engine when a node is entered and
//! dropped when the step returns. `RuntimeData` outlives the step — the
//! engine persists it across suspensions and re-presents a superset of it on
//! resume. `AuthenticatedUser` is cumulative across a flow: later nodes may
//! overwrite or enrich it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::response::InputDescriptor;

/// Kind of journey a flow drives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowType {
    /// Authenticate an existing user.
    #[default]
    Authentication,

    /// Register (and usually provision) a new user.
    Registration,
}

impl FlowType {
    /// Get the flow type as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::Registration => "registration",
        }
    }

    /// Returns `true` for registration flows.
    #[must_use]
    pub const fn is_registration(&self) -> bool {
        matches!(self, Self::Registration)
    }
}

/// The application a flow runs under.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    /// User schema names this application may provision or authenticate.
    ///
    /// Order matters: auto-provisioning resolution walks the list in order.
    pub allowed_user_types: Vec<String>,
}

/// The user resolved so far by the flow.
///
/// `is_authenticated` is only `true` once an executor completed an
/// authentication ceremony in an authentication flow, or a registration flow
/// attached an existing user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Whether an authentication ceremony completed.
    pub is_authenticated: bool,

    /// Internal user id.
    pub user_id: String,

    /// Organization unit the user belongs to.
    pub organization_unit_id: String,

    /// User schema name.
    pub user_type: String,

    /// User attributes accumulated so far.
    pub attributes: HashMap<String, Value>,
}

/// Per-invocation context handed to an executor by the flow engine.
#[derive(Debug, Clone, Default)]
pub struct NodeContext {
    /// Opaque flow id, stable across suspensions of one journey.
    pub flow_id: String,

    /// Authentication or registration.
    pub flow_type: FlowType,

    /// Application id, for observability correlation.
    pub app_id: String,

    /// Current node id, for observability correlation.
    pub current_node_id: String,

    /// The application this flow belongs to.
    pub application: Application,

    /// Sub-mode tag for multi-phase executors (OTP send/verify, passkey
    /// ceremonies). Empty for single-mode executors.
    pub executor_mode: String,

    /// Inputs supplied by the caller for the current step.
    pub user_inputs: HashMap<String, String>,

    /// Engine-persisted data carried across steps.
    pub runtime_data: HashMap<String, String>,

    /// Static per-node configuration from the flow definition.
    pub node_properties: HashMap<String, Value>,

    /// The user resolved by earlier nodes, if any.
    pub authenticated_user: Option<AuthenticatedUser>,

    /// Input schema declared on the node; overrides the executor's defaults
    /// when non-empty.
    pub node_inputs: Vec<InputDescriptor>,

    /// Cancellation handle propagated from the engine. Executors must
    /// abandon outbound calls once it fires.
    pub cancellation: CancellationToken,
}

impl NodeContext {
    /// Create a context for the given flow.
    #[must_use]
    pub fn new(flow_id: &str, flow_type: FlowType) -> Self {
        Self {
            flow_id: flow_id.to_string(),
            flow_type,
            ..Self::default()
        }
    }

    /// Set the application id.
    #[must_use]
    pub fn with_app_id(mut self, app_id: &str) -> Self {
        self.app_id = app_id.to_string();
        self
    }

    /// Set the current node id.
    #[must_use]
    pub fn with_node_id(mut self, node_id: &str) -> Self {
        self.current_node_id = node_id.to_string();
        self
    }

    /// Set the application record.
    #[must_use]
    pub fn with_application(mut self, application: Application) -> Self {
        self.application = application;
        self
    }

    /// Set the executor mode tag.
    #[must_use]
    pub fn with_executor_mode(mut self, mode: &str) -> Self {
        self.executor_mode = mode.to_string();
        self
    }

    /// Add a caller-supplied input.
    #[must_use]
    pub fn with_user_input(mut self, key: &str, value: &str) -> Self {
        self.user_inputs.insert(key.to_string(), value.to_string());
        self
    }

    /// Add an engine-persisted runtime value.
    #[must_use]
    pub fn with_runtime_value(mut self, key: &str, value: &str) -> Self {
        self.runtime_data.insert(key.to_string(), value.to_string());
        self
    }

    /// Add a static node property.
    #[must_use]
    pub fn with_node_property(mut self, key: &str, value: Value) -> Self {
        self.node_properties.insert(key.to_string(), value);
        self
    }

    /// Set the resolved user.
    #[must_use]
    pub fn with_authenticated_user(mut self, user: AuthenticatedUser) -> Self {
        self.authenticated_user = Some(user);
        self
    }

    /// Declare the node's input schema.
    #[must_use]
    pub fn with_node_inputs(mut self, inputs: Vec<InputDescriptor>) -> Self {
        self.node_inputs = inputs;
        self
    }

    /// Set the cancellation handle.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Non-empty caller input for `key`.
    #[must_use]
    pub fn user_input(&self, key: &str) -> Option<&str> {
        self.user_inputs
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Non-empty runtime value for `key`.
    #[must_use]
    pub fn runtime_value(&self, key: &str) -> Option<&str> {
        self.runtime_data
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Non-empty value for `key` from caller inputs, falling back to
    /// runtime data.
    #[must_use]
    pub fn input_or_runtime(&self, key: &str) -> Option<&str> {
        self.user_input(key).or_else(|| self.runtime_value(key))
    }

    /// Returns `true` if the runtime flag `key` is the string `"true"`.
    #[must_use]
    pub fn runtime_flag(&self, key: &str) -> bool {
        self.runtime_value(key) == Some("true")
    }

    /// Non-empty string node property for `key`.
    ///
    /// Type-mismatched values read as absent.
    #[must_use]
    pub fn string_property(&self, key: &str) -> Option<&str> {
        self.node_properties
            .get(key)
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Boolean node property for `key`; `false` when absent or mismatched.
    #[must_use]
    pub fn bool_property(&self, key: &str) -> bool {
        self.node_properties
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}
