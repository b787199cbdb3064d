//! Mock role service.

use std::future::Future;
use std::sync::{Arc, Mutex};

use flowgate_core::ServiceError;

use super::poisoned;
use crate::services::{RoleAssignment, RoleService};

/// Records role assignments in memory.
#[derive(Debug, Clone, Default)]
pub struct MockRoleService {
    assignments: Arc<Mutex<Vec<(String, Vec<RoleAssignment>)>>>,
    fail_with: Arc<Mutex<Option<ServiceError>>>,
}

impl MockRoleService {
    /// Create an empty role service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `error`.
    pub fn set_failure(&self, error: Option<ServiceError>) {
        if let Ok(mut fail) = self.fail_with.lock() {
            *fail = error;
        }
    }

    /// Assignments recorded so far, for assertions.
    ///
    /// # Panics
    ///
    /// Panics if the state mutex is poisoned.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn recorded_assignments(&self) -> Vec<(String, Vec<RoleAssignment>)> {
        self.assignments.lock().unwrap().clone()
    }
}

impl RoleService for MockRoleService {
    fn add_assignments(
        &self,
        role_id: &str,
        assignments: &[RoleAssignment],
    ) -> impl Future<Output = Result<(), ServiceError>> + Send {
        let store = Arc::clone(&self.assignments);
        let role_id = role_id.to_string();
        let assignments = assignments.to_vec();
        let failure = self.fail_with.lock().ok().and_then(|guard| guard.clone());

        async move {
            if let Some(error) = failure {
                return Err(error);
            }
            store
                .lock()
                .map_err(|_| poisoned())?
                .push((role_id, assignments));
            Ok(())
        }
    }
}
