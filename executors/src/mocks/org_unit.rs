//! Mock organization unit service.

use std::future::Future;
use std::sync::{Arc, Mutex};

use flowgate_core::ServiceError;
use flowgate_core::error::error_codes;

use super::poisoned;
use crate::services::{CreateOrganizationUnitRequest, OrganizationUnit, OrganizationUnitService};

/// In-memory organization unit store with handle-uniqueness enforcement.
#[derive(Debug, Clone, Default)]
pub struct MockOrganizationUnitService {
    units: Arc<Mutex<Vec<OrganizationUnit>>>,
    fail_with: Arc<Mutex<Option<ServiceError>>>,
}

impl MockOrganizationUnitService {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing unit (to provoke handle conflicts).
    #[must_use]
    pub fn with_unit(self, unit: OrganizationUnit) -> Self {
        if let Ok(mut units) = self.units.lock() {
            units.push(unit);
        }
        self
    }

    /// Make every subsequent call fail with `error`.
    pub fn set_failure(&self, error: Option<ServiceError>) {
        if let Ok(mut fail) = self.fail_with.lock() {
            *fail = error;
        }
    }

    /// Units created so far, for assertions.
    ///
    /// # Panics
    ///
    /// Panics if the state mutex is poisoned.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn created(&self) -> Vec<OrganizationUnit> {
        self.units.lock().unwrap().clone()
    }
}

impl OrganizationUnitService for MockOrganizationUnitService {
    fn create_organization_unit(
        &self,
        request: &CreateOrganizationUnitRequest,
    ) -> impl Future<Output = Result<OrganizationUnit, ServiceError>> + Send {
        let units = Arc::clone(&self.units);
        let request = request.clone();
        let failure = self.fail_with.lock().ok().and_then(|guard| guard.clone());

        async move {
            if let Some(error) = failure {
                return Err(error);
            }
            let mut units = units.lock().map_err(|_| poisoned())?;
            if units
                .iter()
                .any(|unit| unit.handle == request.handle || unit.name == request.name)
            {
                return Err(ServiceError::client(
                    error_codes::CONFLICT,
                    "Conflict",
                    "an organization unit with this name or handle already exists",
                ));
            }
            let unit = OrganizationUnit {
                id: format!("ou-{}", uuid::Uuid::new_v4()),
                name: request.name,
                handle: request.handle,
            };
            units.push(unit.clone());
            Ok(unit)
        }
    }
}
