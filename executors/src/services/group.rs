//! Group service trait.

use std::future::Future;

use serde::{Deserialize, Serialize};

use flowgate_core::ServiceError;

/// A member entry in a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    /// Member id (a user id).
    pub id: String,

    /// Member kind, e.g. `user`.
    pub member_type: String,
}

/// Group record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group id.
    pub id: String,

    /// Group name.
    pub name: String,

    /// Free-form description.
    pub description: String,

    /// Organization unit the group belongs to.
    pub organization_unit_id: String,

    /// Current members.
    pub members: Vec<GroupMember>,
}

/// Replacement state for a group update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupUpdate {
    /// Group name.
    pub name: String,

    /// Free-form description.
    pub description: String,

    /// Organization unit the group belongs to.
    pub organization_unit_id: String,

    /// Full member list after the update.
    pub members: Vec<GroupMember>,
}

/// Group store operations.
pub trait GroupService: Send + Sync {
    /// Fetch a group by id.
    ///
    /// # Errors
    ///
    /// - unknown id → a client-kind error
    /// - store failure → a server-kind error
    fn get_group(&self, group_id: &str)
    -> impl Future<Output = Result<Group, ServiceError>> + Send;

    /// Replace a group's state.
    ///
    /// # Errors
    ///
    /// - unknown id → a client-kind error
    /// - store failure → a server-kind error
    fn update_group(
        &self,
        group_id: &str,
        update: &GroupUpdate,
    ) -> impl Future<Output = Result<Group, ServiceError>> + Send;
}
