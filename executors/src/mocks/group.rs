//! Mock group service.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use flowgate_core::ServiceError;
use flowgate_core::error::error_codes;

use super::poisoned;
use crate::services::{Group, GroupService, GroupUpdate};

/// In-memory group store.
#[derive(Debug, Clone, Default)]
pub struct MockGroupService {
    groups: Arc<Mutex<HashMap<String, Group>>>,
    fail_with: Arc<Mutex<Option<ServiceError>>>,
}

impl MockGroupService {
    /// Create an empty group store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a group.
    #[must_use]
    pub fn with_group(self, group: Group) -> Self {
        if let Ok(mut groups) = self.groups.lock() {
            groups.insert(group.id.clone(), group);
        }
        self
    }

    /// Make every subsequent call fail with `error`.
    pub fn set_failure(&self, error: Option<ServiceError>) {
        if let Ok(mut fail) = self.fail_with.lock() {
            *fail = error;
        }
    }

    /// Fetch a group's current state, for assertions.
    ///
    /// # Panics
    ///
    /// Panics if the state mutex is poisoned.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn stored_group(&self, group_id: &str) -> Option<Group> {
        self.groups.lock().unwrap().get(group_id).cloned()
    }

    fn scripted_failure(&self) -> Option<ServiceError> {
        self.fail_with.lock().ok().and_then(|guard| guard.clone())
    }

    fn not_found() -> ServiceError {
        ServiceError::client(
            error_codes::INVALID_REQUEST,
            "Group not found",
            "no group registered under the supplied id",
        )
    }
}

impl GroupService for MockGroupService {
    fn get_group(
        &self,
        group_id: &str,
    ) -> impl Future<Output = Result<Group, ServiceError>> + Send {
        let groups = Arc::clone(&self.groups);
        let group_id = group_id.to_string();
        let failure = self.scripted_failure();

        async move {
            if let Some(error) = failure {
                return Err(error);
            }
            groups
                .lock()
                .map_err(|_| poisoned())?
                .get(&group_id)
                .cloned()
                .ok_or_else(Self::not_found)
        }
    }

    fn update_group(
        &self,
        group_id: &str,
        update: &GroupUpdate,
    ) -> impl Future<Output = Result<Group, ServiceError>> + Send {
        let groups = Arc::clone(&self.groups);
        let group_id = group_id.to_string();
        let update = update.clone();
        let failure = self.scripted_failure();

        async move {
            if let Some(error) = failure {
                return Err(error);
            }
            let mut groups = groups.lock().map_err(|_| poisoned())?;
            if !groups.contains_key(&group_id) {
                return Err(Self::not_found());
            }
            let group = Group {
                id: group_id.clone(),
                name: update.name,
                description: update.description,
                organization_unit_id: update.organization_unit_id,
                members: update.members,
            };
            groups.insert(group_id, group.clone());
            Ok(group)
        }
    }
}
