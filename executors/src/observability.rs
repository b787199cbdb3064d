//! Observability adapter.
//!
//! Wraps an executor and publishes a `NodeStarted` event before execution
//! and a `NodeCompleted`/`NodeFailed` event after it. The wrapper never
//! alters executor outcomes: publish failures are logged and swallowed, and
//! a disabled sink short-circuits to the inner executor.

use std::collections::HashMap;

use chrono::Utc;
use serde_json::{Value, json};

use flowgate_core::constants::{modes, runtime_keys};
use flowgate_core::{
    Executor, ExecutorError, ExecutorKind, ExecutorResponse, ExecutorStatus, InputDescriptor,
    NodeContext,
};

use crate::services::{FlowEvent, NodeEventStatus, NodeEventType, ObservabilityService};

/// Executor wrapper publishing per-node lifecycle events.
#[derive(Debug, Clone)]
pub struct Observed<X, B> {
    inner: X,
    sink: B,
}

impl<X, B> Observed<X, B>
where
    X: Executor,
    B: ObservabilityService + Clone + Send + Sync,
{
    /// Wrap `inner`, publishing to `sink`.
    #[must_use]
    pub fn new(inner: X, sink: B) -> Self {
        Self { inner, sink }
    }

    /// The wrapped executor.
    #[must_use]
    pub fn inner(&self) -> &X {
        &self.inner
    }

    async fn publish(&self, event: FlowEvent) {
        if let Err(e) = self.sink.publish_event(event).await {
            tracing::warn!(error = %e, "failed to publish node event");
        }
    }

    fn base_event(
        &self,
        ctx: &NodeContext,
        event_type: NodeEventType,
        status: NodeEventStatus,
    ) -> FlowEvent {
        FlowEvent {
            event_id: uuid::Uuid::new_v4(),
            event_type,
            status,
            flow_id: ctx.flow_id.clone(),
            app_id: ctx.app_id.clone(),
            node_id: ctx.current_node_id.clone(),
            executor: self.inner.name().to_string(),
            user_id: context_user_id(ctx),
            timestamp: Utc::now(),
            data: HashMap::new(),
        }
    }

    fn completion_event(&self, ctx: &NodeContext, resp: &ExecutorResponse) -> FlowEvent {
        match resp.status {
            ExecutorStatus::Failure => {
                let mut event =
                    self.base_event(ctx, NodeEventType::NodeFailed, NodeEventStatus::Failure);
                event.data = failure_data(
                    "flow_failure",
                    "client_error",
                    &resp.failure_reason,
                    &resp.failure_reason,
                );
                event
            }
            ExecutorStatus::UserInputRequired | ExecutorStatus::ExternalRedirection => {
                self.base_event(ctx, NodeEventType::NodeCompleted, NodeEventStatus::Pending)
            }
            ExecutorStatus::Complete => {
                // A completed OTP send still leaves the journey pending its
                // verification leg.
                let status = if ctx.executor_mode == modes::SEND {
                    NodeEventStatus::Pending
                } else {
                    NodeEventStatus::Success
                };
                let mut event = self.base_event(ctx, NodeEventType::NodeCompleted, status);
                if let Some(user) = &resp.authenticated_user {
                    if !user.user_id.is_empty() {
                        event.user_id = Some(user.user_id.clone());
                    }
                }
                event
            }
        }
    }

    fn fault_event(&self, ctx: &NodeContext, error: &ExecutorError) -> FlowEvent {
        let mut event = self.base_event(ctx, NodeEventType::NodeFailed, NodeEventStatus::Failure);
        event.data = failure_data(
            "executor_fault",
            "server_error",
            &error.to_string(),
            "executor aborted with a server-side fault",
        );
        event
    }
}

impl<X, B> Executor for Observed<X, B>
where
    X: Executor,
    B: ObservabilityService + Clone + Send + Sync,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn kind(&self) -> ExecutorKind {
        self.inner.kind()
    }

    fn default_inputs(&self) -> &[InputDescriptor] {
        self.inner.default_inputs()
    }

    fn prerequisites(&self) -> &[InputDescriptor] {
        self.inner.prerequisites()
    }

    async fn execute(&self, ctx: &NodeContext) -> Result<ExecutorResponse, ExecutorError> {
        if !self.sink.is_enabled() {
            return self.inner.execute(ctx).await;
        }

        self.publish(self.base_event(ctx, NodeEventType::NodeStarted, NodeEventStatus::InProgress))
            .await;

        let result = self.inner.execute(ctx).await;

        let event = match &result {
            Ok(resp) => self.completion_event(ctx, resp),
            Err(error) => self.fault_event(ctx, error),
        };
        self.publish(event).await;

        result
    }
}

/// The user id known to the context, if any.
fn context_user_id(ctx: &NodeContext) -> Option<String> {
    if let Some(user) = &ctx.authenticated_user {
        if !user.user_id.is_empty() {
            return Some(user.user_id.clone());
        }
    }
    ctx.runtime_value(runtime_keys::USER_ID).map(str::to_string)
}

/// Status-specific payload for failure events.
fn failure_data(
    error_code: &str,
    error_type: &str,
    error: &str,
    message: &str,
) -> HashMap<String, Value> {
    let mut data = HashMap::new();
    data.insert("error".to_string(), json!(error));
    data.insert("errorCode".to_string(), json!(error_code));
    data.insert("errorType".to_string(), json!(error_type));
    data.insert("message".to_string(), json!(message));
    data.insert("failureReason".to_string(), json!(error));
    data
}
