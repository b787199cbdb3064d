//! Mock identity provider registry.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use flowgate_core::ServiceError;
use flowgate_core::error::error_codes;

use super::poisoned;
use crate::services::{IdentityProvider, IdentityProviderService};

/// In-memory identity provider registry.
#[derive(Debug, Clone, Default)]
pub struct MockIdentityProviderService {
    idps: Arc<Mutex<HashMap<String, IdentityProvider>>>,
}

impl MockIdentityProviderService {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a provider.
    #[must_use]
    pub fn with_idp(self, idp: IdentityProvider) -> Self {
        if let Ok(mut idps) = self.idps.lock() {
            idps.insert(idp.id.clone(), idp);
        }
        self
    }
}

impl IdentityProviderService for MockIdentityProviderService {
    fn get_identity_provider(
        &self,
        idp_id: &str,
    ) -> impl Future<Output = Result<IdentityProvider, ServiceError>> + Send {
        let idps = Arc::clone(&self.idps);
        let idp_id = idp_id.to_string();

        async move {
            idps.lock()
                .map_err(|_| poisoned())?
                .get(&idp_id)
                .cloned()
                .ok_or_else(|| {
                    ServiceError::client(
                        error_codes::INVALID_REQUEST,
                        "Identity provider not found",
                        "no identity provider registered under the supplied id",
                    )
                })
        }
    }
}
