//! User schema service trait.

use std::future::Future;

use serde::{Deserialize, Serialize};

use flowgate_core::ServiceError;

/// A named user profile describing attribute constraints and registration
/// policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSchema {
    /// Schema (user type) name.
    pub name: String,

    /// Organization unit new users of this type land in.
    pub organization_unit_id: String,

    /// Whether users of this type may self-register.
    pub allow_self_registration: bool,
}

/// Read access to user schemas.
pub trait UserSchemaService: Send + Sync {
    /// Fetch a user schema by name.
    ///
    /// # Errors
    ///
    /// - unknown name → a client-kind error
    /// - store failure → a server-kind error
    fn get_user_schema_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<UserSchema, ServiceError>> + Send;
}
