//! Google provider variant.

use flowgate_core::{
    Executor, ExecutorError, ExecutorKind, ExecutorResponse, InputDescriptor, NodeContext,
};

use super::OAuthExecutor;
use crate::services::{IdentityProviderService, OAuthClientService, UserSchemaService};

/// Federated login against Google.
///
/// Google is a full OIDC provider; the `sub` claim is stable per Google
/// account and `email_verified` arrives as a regular userinfo claim.
#[derive(Debug, Clone)]
pub struct GoogleOAuthExecutor<O, I, S> {
    inner: OAuthExecutor<O, I, S>,
}

impl<O, I, S> GoogleOAuthExecutor<O, I, S>
where
    O: OAuthClientService + Clone,
    I: IdentityProviderService + Clone,
    S: UserSchemaService + Clone,
{
    /// Create a new Google executor.
    #[must_use]
    pub fn new(oauth: O, idps: I, schemas: S) -> Self {
        Self {
            inner: OAuthExecutor::with_kind(ExecutorKind::Google, oauth, idps, schemas),
        }
    }
}

impl<O, I, S> Executor for GoogleOAuthExecutor<O, I, S>
where
    O: OAuthClientService + Clone,
    I: IdentityProviderService + Clone,
    S: UserSchemaService + Clone,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn kind(&self) -> ExecutorKind {
        self.inner.kind()
    }

    fn default_inputs(&self) -> &[InputDescriptor] {
        self.inner.default_inputs()
    }

    fn prerequisites(&self) -> &[InputDescriptor] {
        self.inner.prerequisites()
    }

    async fn execute(&self, ctx: &NodeContext) -> Result<ExecutorResponse, ExecutorError> {
        self.inner.execute(ctx).await
    }
}
