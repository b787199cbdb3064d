//! Mock credential service.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use constant_time_eq::constant_time_eq;

use flowgate_core::ServiceError;
use flowgate_core::error::error_codes;

use super::poisoned;
use crate::services::{CredentialService, User};

/// In-memory credential store keyed by username.
#[derive(Debug, Clone, Default)]
pub struct MockCredentialService {
    credentials: Arc<Mutex<HashMap<String, (String, User)>>>,
    fail_with: Arc<Mutex<Option<ServiceError>>>,
}

impl MockCredentialService {
    /// Create an empty mock credential service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a username/password pair resolving to `user`.
    #[must_use]
    pub fn with_credentials(self, username: &str, password: &str, user: User) -> Self {
        if let Ok(mut credentials) = self.credentials.lock() {
            credentials.insert(username.to_string(), (password.to_string(), user));
        }
        self
    }

    /// Make every subsequent call fail with `error`.
    pub fn set_failure(&self, error: Option<ServiceError>) {
        if let Ok(mut fail) = self.fail_with.lock() {
            *fail = error;
        }
    }

    fn invalid_credentials() -> ServiceError {
        ServiceError::client(
            error_codes::INVALID_CREDENTIALS,
            "Invalid credentials",
            "username or password is incorrect",
        )
    }
}

impl CredentialService for MockCredentialService {
    fn authenticate(
        &self,
        credentials: &HashMap<String, String>,
    ) -> impl Future<Output = Result<User, ServiceError>> + Send {
        let store = Arc::clone(&self.credentials);
        let supplied = credentials.clone();
        let failure = self.fail_with.lock().ok().and_then(|guard| guard.clone());

        async move {
            if let Some(error) = failure {
                return Err(error);
            }
            let username = supplied.get("username").cloned().unwrap_or_default();
            let password = supplied.get("password").cloned().unwrap_or_default();

            let store = store.lock().map_err(|_| poisoned())?;
            let Some((stored_password, user)) = store.get(&username) else {
                return Err(Self::invalid_credentials());
            };
            if constant_time_eq(stored_password.as_bytes(), password.as_bytes()) {
                Ok(user.clone())
            } else {
                Err(Self::invalid_credentials())
            }
        }
    }
}
