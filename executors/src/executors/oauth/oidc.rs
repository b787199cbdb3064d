//! Generic OIDC provider variant.

use flowgate_core::{
    Executor, ExecutorError, ExecutorKind, ExecutorResponse, InputDescriptor, NodeContext,
};

use super::OAuthExecutor;
use crate::services::{IdentityProviderService, OAuthClientService, UserSchemaService};

/// Federated login against any spec-compliant OIDC provider.
///
/// The provider's endpoints, client credentials, and scopes come from the
/// identity provider registry entry named by the node's `idpId` property.
#[derive(Debug, Clone)]
pub struct OidcAuthExecutor<O, I, S> {
    inner: OAuthExecutor<O, I, S>,
}

impl<O, I, S> OidcAuthExecutor<O, I, S>
where
    O: OAuthClientService + Clone,
    I: IdentityProviderService + Clone,
    S: UserSchemaService + Clone,
{
    /// Create a new OIDC executor.
    #[must_use]
    pub fn new(oauth: O, idps: I, schemas: S) -> Self {
        Self {
            inner: OAuthExecutor::with_kind(ExecutorKind::Oidc, oauth, idps, schemas),
        }
    }
}

impl<O, I, S> Executor for OidcAuthExecutor<O, I, S>
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
