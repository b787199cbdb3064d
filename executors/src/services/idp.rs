//! Identity provider registry trait.

use std::future::Future;

use serde::{Deserialize, Serialize};

use flowgate_core::ServiceError;

/// A configured federated identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProvider {
    /// Provider id.
    pub id: String,

    /// Display name shown to end users.
    pub name: String,

    /// Free-form description.
    pub description: String,
}

/// Read access to the identity provider registry.
pub trait IdentityProviderService: Send + Sync {
    /// Fetch a provider by id.
    ///
    /// # Errors
    ///
    /// - unknown id → a client-kind error
    /// - store failure → a server-kind error
    fn get_identity_provider(
        &self,
        idp_id: &str,
    ) -> impl Future<Output = Result<IdentityProvider, ServiceError>> + Send;
}
