//! Mock user service.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use flowgate_core::ServiceError;

use super::poisoned;
use crate::executors::base::value_to_string;
use crate::services::{User, UserService};

/// In-memory user store.
///
/// `identify_user` scans stored attribute blobs and requires every supplied
/// attribute to match.
#[derive(Debug, Clone, Default)]
pub struct MockUserService {
    users: Arc<Mutex<HashMap<String, User>>>,
    fail_with: Arc<Mutex<Option<ServiceError>>>,
}

impl MockUserService {
    /// Create an empty mock user service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user record.
    #[must_use]
    pub fn with_user(self, user: User) -> Self {
        if let Ok(mut users) = self.users.lock() {
            users.insert(user.id.clone(), user);
        }
        self
    }

    /// Make every subsequent call fail with `error`.
    pub fn set_failure(&self, error: Option<ServiceError>) {
        if let Ok(mut fail) = self.fail_with.lock() {
            *fail = error;
        }
    }

    /// All stored users, for assertions.
    ///
    /// # Panics
    ///
    /// Panics if the state mutex is poisoned.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn stored_users(&self) -> Vec<User> {
        self.users.lock().unwrap().values().cloned().collect()
    }

    fn scripted_failure(&self) -> Option<ServiceError> {
        self.fail_with.lock().ok().and_then(|guard| guard.clone())
    }
}

impl UserService for MockUserService {
    fn identify_user(
        &self,
        attributes: &HashMap<String, String>,
    ) -> impl Future<Output = Result<String, ServiceError>> + Send {
        let users = Arc::clone(&self.users);
        let attributes = attributes.clone();
        let failure = self.scripted_failure();

        async move {
            if let Some(error) = failure {
                return Err(error);
            }
            let users = users.lock().map_err(|_| poisoned())?;
            for user in users.values() {
                let Ok(stored) = user.parsed_attributes() else {
                    continue;
                };
                let matches = !attributes.is_empty()
                    && attributes.iter().all(|(key, value)| {
                        stored.get(key).map(value_to_string).as_deref() == Some(value)
                    });
                if matches {
                    return Ok(user.id.clone());
                }
            }
            Err(ServiceError::user_not_found())
        }
    }

    fn get_user(&self, user_id: &str) -> impl Future<Output = Result<User, ServiceError>> + Send {
        let users = Arc::clone(&self.users);
        let user_id = user_id.to_string();
        let failure = self.scripted_failure();

        async move {
            if let Some(error) = failure {
                return Err(error);
            }
            users
                .lock()
                .map_err(|_| poisoned())?
                .get(&user_id)
                .cloned()
                .ok_or_else(ServiceError::user_not_found)
        }
    }

    fn create_user(&self, user: &User) -> impl Future<Output = Result<User, ServiceError>> + Send {
        let users = Arc::clone(&self.users);
        let mut user = user.clone();
        let failure = self.scripted_failure();

        async move {
            if let Some(error) = failure {
                return Err(error);
            }
            if user.id.is_empty() {
                user.id = format!("user-{}", uuid::Uuid::new_v4());
            }
            users
                .lock()
                .map_err(|_| poisoned())?
                .insert(user.id.clone(), user.clone());
            Ok(user)
        }
    }
}
