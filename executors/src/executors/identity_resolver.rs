//! Identity resolver executor.
//!
//! Maps a caller-supplied `username` to an internal user id and writes it
//! into runtime data for downstream nodes. Useful as the first node of
//! multi-factor journeys where later nodes only need a user id.

use std::collections::HashMap;

use flowgate_core::constants::{input_keys, runtime_keys};
use flowgate_core::{
    Executor, ExecutorBase, ExecutorError, ExecutorKind, ExecutorResponse, InputDescriptor,
    NodeContext,
};

use crate::executors::base::with_cancellation;
use crate::services::UserService;

/// Resolves identifying attributes to an internal user id.
#[derive(Debug, Clone)]
pub struct IdentityResolverExecutor<U> {
    base: ExecutorBase,
    users: U,
}

impl<U> IdentityResolverExecutor<U>
where
    U: UserService + Clone,
{
    /// Create a new identity resolver executor.
    #[must_use]
    pub fn new(users: U) -> Self {
        Self {
            base: ExecutorBase::new(
                ExecutorKind::IdentityResolver.as_str(),
                ExecutorKind::IdentityResolver,
                vec![InputDescriptor::string(input_keys::USERNAME)],
                vec![],
            ),
            users,
        }
    }
}

impl<U> Executor for IdentityResolverExecutor<U>
where
    U: UserService + Clone,
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

        // has_required_inputs guarantees presence, but the node schema may
        // have renamed the input; treat an absent username as still-missing.
        let Some(username) = ctx.input_or_runtime(input_keys::USERNAME) else {
            return Ok(ExecutorResponse::input_required(vec![
                InputDescriptor::string(input_keys::USERNAME),
            ]));
        };

        let mut attributes = HashMap::new();
        attributes.insert(input_keys::USERNAME.to_string(), username.to_string());

        match with_cancellation(ctx, self.users.identify_user(&attributes)).await? {
            Ok(user_id) if !user_id.is_empty() => {
                tracing::debug!(flow_id = %ctx.flow_id, "resolved user for {username}");
                let mut resp = ExecutorResponse::complete();
                resp.set_runtime(runtime_keys::USER_ID, &user_id);
                Ok(resp)
            }
            Ok(_) => Ok(ExecutorResponse::failure("User not found")),
            Err(e) if e.is_user_not_found() => Ok(ExecutorResponse::failure("User not found")),
            Err(e) if e.is_client() => Ok(ExecutorResponse::failure(&e.description)),
            Err(e) => Err(e.into()),
        }
    }
}
