//! Organization unit service trait.

use std::future::Future;

use serde::{Deserialize, Serialize};

use flowgate_core::ServiceError;

/// Organization unit record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationUnit {
    /// Organization unit id.
    pub id: String,

    /// Display name.
    pub name: String,

    /// URL-safe handle, unique per deployment.
    pub handle: String,
}

/// Request to create an organization unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrganizationUnitRequest {
    /// Display name.
    pub name: String,

    /// URL-safe handle.
    pub handle: String,
}

/// Organization unit store operations.
pub trait OrganizationUnitService: Send + Sync {
    /// Create an organization unit.
    ///
    /// # Errors
    ///
    /// - name/handle conflict → a `conflict` client error
    /// - store failure → a server-kind error
    fn create_organization_unit(
        &self,
        request: &CreateOrganizationUnitRequest,
    ) -> impl Future<Output = Result<OrganizationUnit, ServiceError>> + Send;
}
