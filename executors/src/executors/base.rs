//! Helpers shared across executors.

use std::future::Future;

use serde_json::Value;

use flowgate_core::{AuthenticatedUser, ExecutorError, NodeContext};

use crate::services::User;

/// Await `fut`, abandoning it when the engine cancels the step.
///
/// Used around every outbound service call so that cancellation surfaces as
/// a server fault instead of a hung step.
pub(crate) async fn with_cancellation<T>(
    ctx: &NodeContext,
    fut: impl Future<Output = T> + Send,
) -> Result<T, ExecutorError> {
    tokio::select! {
        () = ctx.cancellation.cancelled() => Err(ExecutorError::Cancelled),
        out = fut => Ok(out),
    }
}

/// Build an [`AuthenticatedUser`] from a stored user record.
///
/// # Errors
///
/// Returns a server fault when the record's attribute blob is malformed.
pub(crate) fn authenticated_user_from_record(
    user: &User,
    is_authenticated: bool,
) -> Result<AuthenticatedUser, ExecutorError> {
    Ok(AuthenticatedUser {
        is_authenticated,
        user_id: user.id.clone(),
        organization_unit_id: user.organization_unit.clone(),
        user_type: user.user_type.clone(),
        attributes: user.parsed_attributes()?,
    })
}

/// Render a JSON value as the string form runtime data carries.
///
/// Strings are taken verbatim; everything else is serialized compactly.
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
