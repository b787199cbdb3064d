//! Role service trait.

use std::future::Future;

use serde::{Deserialize, Serialize};

use flowgate_core::ServiceError;

/// One assignee to add to a role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Assignee id (a user id).
    pub id: String,

    /// Assignee type (the user's schema name).
    pub assignee_type: String,
}

/// Role store operations.
pub trait RoleService: Send + Sync {
    /// Add assignees to a role.
    ///
    /// # Errors
    ///
    /// - unknown role → a client-kind error
    /// - store failure → a server-kind error
    fn add_assignments(
        &self,
        role_id: &str,
        assignments: &[RoleAssignment],
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;
}
