//! GitHub provider variant.

use flowgate_core::{
    Executor, ExecutorError, ExecutorKind, ExecutorResponse, InputDescriptor, NodeContext,
};

use super::OAuthExecutor;
use crate::services::{IdentityProviderService, OAuthClientService, UserSchemaService};

/// Federated login against GitHub.
///
/// GitHub speaks plain OAuth 2.0 (no discovery document, no id token); the
/// OAuth client core normalizes its `/user` response into userinfo-shaped
/// claims before they reach this executor.
#[derive(Debug, Clone)]
pub struct GithubOAuthExecutor<O, I, S> {
    inner: OAuthExecutor<O, I, S>,
}

impl<O, I, S> GithubOAuthExecutor<O, I, S>
where
    O: OAuthClientService + Clone,
    I: IdentityProviderService + Clone,
    S: UserSchemaService + Clone,
{
    /// Create a new GitHub executor.
    #[must_use]
    pub fn new(oauth: O, idps: I, schemas: S) -> Self {
        Self {
            inner: OAuthExecutor::with_kind(ExecutorKind::Github, oauth, idps, schemas),
        }
    }
}

impl<O, I, S> Executor for GithubOAuthExecutor<O, I, S>
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
