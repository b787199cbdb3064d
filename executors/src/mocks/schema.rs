//! Mock user schema service.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use flowgate_core::ServiceError;
use flowgate_core::error::error_codes;

use super::poisoned;
use crate::services::{UserSchema, UserSchemaService};

/// In-memory user schema registry.
#[derive(Debug, Clone, Default)]
pub struct MockUserSchemaService {
    schemas: Arc<Mutex<HashMap<String, UserSchema>>>,
}

impl MockUserSchemaService {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a schema.
    #[must_use]
    pub fn with_schema(self, schema: UserSchema) -> Self {
        if let Ok(mut schemas) = self.schemas.lock() {
            schemas.insert(schema.name.clone(), schema);
        }
        self
    }
}

impl UserSchemaService for MockUserSchemaService {
    fn get_user_schema_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<UserSchema, ServiceError>> + Send {
        let schemas = Arc::clone(&self.schemas);
        let name = name.to_string();

        async move {
            schemas
                .lock()
                .map_err(|_| poisoned())?
                .get(&name)
                .cloned()
                .ok_or_else(|| {
                    ServiceError::client(
                        error_codes::INVALID_REQUEST,
                        "User schema not found",
                        "no user schema registered under the supplied name",
                    )
                })
        }
    }
}
