//! Observability side-channel trait and event payloads.

use std::collections::HashMap;
use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use flowgate_core::ServiceError;

/// Lifecycle point a node event marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeEventType {
    /// Execution is about to start.
    NodeStarted,

    /// Execution returned a non-failure response.
    NodeCompleted,

    /// Execution failed, client-visibly or with a server fault.
    NodeFailed,
}

/// Coarse outcome attached to a node event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeEventStatus {
    /// Execution has started and not yet returned.
    InProgress,

    /// The step completed and produced an authenticated user.
    Success,

    /// The step completed but the journey is waiting on the caller
    /// (redirection, pending input, or an unverified OTP delivery).
    Pending,

    /// The step failed.
    Failure,
}

/// Event published around one node execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowEvent {
    /// Unique event id.
    pub event_id: uuid::Uuid,

    /// Lifecycle point.
    pub event_type: NodeEventType,

    /// Coarse outcome.
    pub status: NodeEventStatus,

    /// Flow this node ran in.
    pub flow_id: String,

    /// Application the flow belongs to.
    pub app_id: String,

    /// Node that ran.
    pub node_id: String,

    /// Executor instance name bound to the node.
    pub executor: String,

    /// User involved, when one is resolved.
    pub user_id: Option<String>,

    /// Event creation time.
    pub timestamp: DateTime<Utc>,

    /// Status-specific fields (`error`, `errorCode`, `errorType`, `message`,
    /// `failureReason`, …).
    pub data: HashMap<String, Value>,
}

/// Publishes node lifecycle events.
///
/// Implementations must be cheap to gate: when [`is_enabled`] returns
/// `false` the adapter skips event construction entirely.
///
/// [`is_enabled`]: ObservabilityService::is_enabled
pub trait ObservabilityService: Send + Sync {
    /// Whether events should be published at all.
    fn is_enabled(&self) -> bool;

    /// Publish one event.
    ///
    /// # Errors
    ///
    /// Returns a service error when the sink rejects the event; callers
    /// must not let this alter executor outcomes.
    fn publish_event(
        &self,
        event: FlowEvent,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;
}
