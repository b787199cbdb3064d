//! Credential verification service trait.

use std::collections::HashMap;
use std::future::Future;

use flowgate_core::ServiceError;

use super::User;

/// Verifies first-factor credentials against the credential store.
pub trait CredentialService: Send + Sync {
    /// Verify the supplied credentials (`username` + `password`) and return
    /// the matching user record.
    ///
    /// # Errors
    ///
    /// - wrong credentials → an `invalid-credentials` client error
    /// - store failure → a server-kind error
    fn authenticate(
        &self,
        credentials: &HashMap<String, String>,
    ) -> impl Future<Output = Result<User, ServiceError>> + Send;
}
