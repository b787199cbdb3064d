//! User service trait.

use std::collections::HashMap;
use std::future::Future;

use flowgate_core::ServiceError;

use super::User;

/// User store operations the executors need.
pub trait UserService: Send + Sync {
    /// Resolve a user id from identifying attributes (`username`, `email`,
    /// `mobileNumber`, …). All supplied attributes must match.
    ///
    /// # Errors
    ///
    /// - no match → the canonical user-not-found client error
    /// - store failure → a server-kind error
    fn identify_user(
        &self,
        attributes: &HashMap<String, String>,
    ) -> impl Future<Output = Result<String, ServiceError>> + Send;

    /// Fetch a user record by id.
    ///
    /// # Errors
    ///
    /// - unknown id → user-not-found
    /// - store failure → a server-kind error
    fn get_user(&self, user_id: &str) -> impl Future<Output = Result<User, ServiceError>> + Send;

    /// Create a user record; the store assigns the id.
    ///
    /// # Errors
    ///
    /// - identifying-attribute conflict → a client-kind error
    /// - store failure → a server-kind error
    fn create_user(&self, user: &User) -> impl Future<Output = Result<User, ServiceError>> + Send;
}
