//! Basic authentication executor.
//!
//! In authentication flows this verifies a username + password pair against
//! the credential service. In registration flows it only checks username
//! uniqueness; the provisioning node creates the account later.

use std::collections::HashMap;

use flowgate_core::constants::{input_keys, runtime_keys};
use flowgate_core::{
    AuthenticatedUser, Executor, ExecutorBase, ExecutorError, ExecutorKind, ExecutorResponse,
    InputDescriptor, NodeContext,
};

use crate::executors::base::{authenticated_user_from_record, with_cancellation};
use crate::services::{CredentialService, UserService};

/// Username + password authentication, or a uniqueness check during
/// registration.
#[derive(Debug, Clone)]
pub struct BasicAuthExecutor<U, C> {
    base: ExecutorBase,
    users: U,
    credentials: C,
}

impl<U, C> BasicAuthExecutor<U, C>
where
    U: UserService + Clone,
    C: CredentialService + Clone,
{
    /// Create a new basic auth executor.
    #[must_use]
    pub fn new(users: U, credentials: C) -> Self {
        Self {
            base: ExecutorBase::new(
                ExecutorKind::BasicAuth.as_str(),
                ExecutorKind::BasicAuth,
                vec![
                    InputDescriptor::string(input_keys::USERNAME),
                    InputDescriptor::password(input_keys::PASSWORD),
                ],
                vec![],
            ),
            users,
            credentials,
        }
    }

    async fn execute_registration(
        &self,
        ctx: &NodeContext,
        username: &str,
        identify_attrs: &HashMap<String, String>,
    ) -> Result<ExecutorResponse, ExecutorError> {
        match with_cancellation(ctx, self.users.identify_user(identify_attrs)).await? {
            Ok(_) => Ok(ExecutorResponse::failure("User already exists")),
            Err(e) if e.is_user_not_found() => {
                // The username is free; hand it to the provisioning node.
                let mut attributes = HashMap::new();
                attributes.insert(
                    input_keys::USERNAME.to_string(),
                    serde_json::Value::String(username.to_string()),
                );
                let mut resp = ExecutorResponse::complete();
                resp.set_authenticated_user(AuthenticatedUser {
                    is_authenticated: false,
                    attributes,
                    ..AuthenticatedUser::default()
                });
                Ok(resp)
            }
            Err(e) if e.is_client() => Ok(ExecutorResponse::failure(&e.description)),
            Err(e) => Err(e.into()),
        }
    }

    async fn execute_authentication(
        &self,
        ctx: &NodeContext,
        credentials: &HashMap<String, String>,
        identify_attrs: &HashMap<String, String>,
    ) -> Result<ExecutorResponse, ExecutorError> {
        match with_cancellation(ctx, self.users.identify_user(identify_attrs)).await? {
            Ok(user_id) => {
                tracing::debug!(flow_id = %ctx.flow_id, user_id = %user_id, "identified user, verifying credentials");
            }
            Err(e) if e.is_user_not_found() => {
                return Ok(ExecutorResponse::failure("User not found"));
            }
            Err(e) if e.is_client() => return Ok(ExecutorResponse::failure(&e.description)),
            Err(e) => return Err(e.into()),
        }

        match with_cancellation(ctx, self.credentials.authenticate(credentials)).await? {
            Ok(user) => {
                let authenticated = authenticated_user_from_record(&user, true)?;
                let mut resp = ExecutorResponse::complete();
                resp.set_runtime(runtime_keys::USER_ID, &user.id);
                resp.set_authenticated_user(authenticated);
                Ok(resp)
            }
            Err(e) if e.is_client() => {
                tracing::debug!(flow_id = %ctx.flow_id, "credential verification rejected");
                Ok(ExecutorResponse::failure(&format!(
                    "Failed to authenticate user: {}",
                    e.description
                )))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl<U, C> Executor for BasicAuthExecutor<U, C>
where
    U: UserService + Clone,
    C: CredentialService + Clone,
{
    fn name(&self) -> &str {
        self.base.name()
    }

    fn kind(&self) -> ExecutorKind {
        self.base.kind()
    }

    fn default_inputs(&self) -> &[InputDescriptor] {
        self.base.default_inputs()
    }

    fn prerequisites(&self) -> &[InputDescriptor] {
        self.base.prerequisites()
    }

    async fn execute(&self, ctx: &NodeContext) -> Result<ExecutorResponse, ExecutorError> {
        let mut resp = ExecutorResponse::default();
        if !self.base.has_required_inputs(ctx, &mut resp) {
            return Ok(resp);
        }

        let username = ctx
            .input_or_runtime(input_keys::USERNAME)
            .unwrap_or_default()
            .to_string();
        let password = ctx
            .input_or_runtime(input_keys::PASSWORD)
            .unwrap_or_default()
            .to_string();

        let mut identify_attrs = HashMap::new();
        identify_attrs.insert(input_keys::USERNAME.to_string(), username.clone());

        if ctx.flow_type.is_registration() {
            return self
                .execute_registration(ctx, &username, &identify_attrs)
                .await;
        }

        let mut credentials = HashMap::new();
        credentials.insert(input_keys::USERNAME.to_string(), username);
        credentials.insert(input_keys::PASSWORD.to_string(), password);

        self.execute_authentication(ctx, &credentials, &identify_attrs)
            .await
    }
}
