//! Federated OAuth/OIDC login executor.
//!
//! One invocation occupies one of two states:
//!
//! 1. **Initiate** — no `code` input yet: build the provider authorization
//!    URL and suspend the flow with an external redirection.
//! 2. **Process** — `code` present: exchange it for tokens, fetch user info,
//!    and resolve the federated subject against the local user store.
//!
//! Provider variants ([`OidcAuthExecutor`], [`GithubOAuthExecutor`],
//! [`GoogleOAuthExecutor`]) share this core; the wire protocol itself lives
//! behind [`OAuthClientService`].

mod github;
mod google;
mod oidc;

pub use github::GithubOAuthExecutor;
pub use google::GoogleOAuthExecutor;
pub use oidc::OidcAuthExecutor;

use std::collections::HashMap;

use serde_json::Value;

use flowgate_core::constants::{input_keys, property_keys, runtime_keys};
use flowgate_core::{
    AuthenticatedUser, Executor, ExecutorBase, ExecutorError, ExecutorKind, ExecutorResponse,
    InputDescriptor, NodeContext,
};

use crate::executors::base::{authenticated_user_from_record, value_to_string, with_cancellation};
use crate::services::{
    IdentityProviderService, OAuthClientService, User, UserSchema, UserSchemaService,
};

/// Additional-data key carrying the IdP display name on the initiate leg.
pub const ADDITIONAL_IDP_NAME: &str = "idpName";

/// User-info claims that never become user attributes.
const SKIPPED_CLAIMS: &[&str] = &["username", "sub", "id"];

/// Shared two-phase OAuth/OIDC executor core.
#[derive(Debug, Clone)]
pub struct OAuthExecutor<O, I, S> {
    base: ExecutorBase,
    oauth: O,
    idps: I,
    schemas: S,
}

impl<O, I, S> OAuthExecutor<O, I, S>
where
    O: OAuthClientService + Clone,
    I: IdentityProviderService + Clone,
    S: UserSchemaService + Clone,
{
    /// Create an executor core registered under the given kind.
    #[must_use]
    pub fn with_kind(kind: ExecutorKind, oauth: O, idps: I, schemas: S) -> Self {
        Self {
            base: ExecutorBase::new(
                kind.as_str(),
                kind,
                vec![InputDescriptor::string(input_keys::CODE)],
                vec![],
            ),
            oauth,
            idps,
            schemas,
        }
    }

    /// Build the authorization URL and suspend the flow.
    async fn initiate(
        &self,
        ctx: &NodeContext,
        idp_id: &str,
    ) -> Result<ExecutorResponse, ExecutorError> {
        let idp = match with_cancellation(ctx, self.idps.get_identity_provider(idp_id)).await? {
            Ok(idp) => idp,
            Err(e) if e.is_client() => return Ok(ExecutorResponse::failure(&e.description)),
            Err(e) => return Err(e.into()),
        };

        let url = match with_cancellation(ctx, self.oauth.build_authorize_url(idp_id)).await? {
            Ok(url) => url,
            Err(e) if e.is_client() => return Ok(ExecutorResponse::failure(&e.description)),
            Err(e) => return Err(e.into()),
        };
        if url.is_empty() {
            return Err(ExecutorError::EmptyServiceResult("authorization URL"));
        }

        tracing::debug!(flow_id = %ctx.flow_id, idp_id, "redirecting to identity provider");
        let mut resp = ExecutorResponse::redirect(&url);
        resp.set_additional(ADDITIONAL_IDP_NAME, &idp.name);
        Ok(resp)
    }

    /// Exchange the callback code and resolve the federated user locally.
    async fn process(
        &self,
        ctx: &NodeContext,
        idp_id: &str,
        code: &str,
    ) -> Result<ExecutorResponse, ExecutorError> {
        let token = match with_cancellation(
            ctx,
            self.oauth.exchange_code_for_token(idp_id, code, true),
        )
        .await?
        {
            Ok(token) => token,
            Err(e) if e.is_client() => {
                return Ok(ExecutorResponse::failure(&format!(
                    "Failed to exchange authorization code: {}",
                    e.description
                )));
            }
            Err(e) => return Err(e.into()),
        };

        if token.scope.trim().is_empty() {
            return Ok(ExecutorResponse::failure(
                "Authorization token carries no scopes",
            ));
        }

        let user_info = match with_cancellation(
            ctx,
            self.oauth.fetch_user_info(idp_id, &token.access_token),
        )
        .await?
        {
            Ok(info) => info,
            Err(e) if e.is_client() => return Ok(ExecutorResponse::failure(&e.description)),
            Err(e) => return Err(e.into()),
        };

        let sub = user_info
            .get(runtime_keys::SUB)
            .map(value_to_string)
            .unwrap_or_default();
        if sub.is_empty() {
            return Ok(ExecutorResponse::failure(
                "User info carries no sub claim",
            ));
        }

        let internal = match with_cancellation(ctx, self.oauth.get_internal_user(&sub)).await? {
            Ok(user) => Some(user),
            Err(e) if e.is_user_not_found() => None,
            Err(e) if e.is_client() => return Ok(ExecutorResponse::failure(&e.description)),
            Err(e) => return Err(e.into()),
        };

        self.resolve_context_user(ctx, &sub, internal, &user_info)
            .await
    }

    /// Decide the flow outcome from the local-user lookup, per flow type
    /// and node policy flags.
    async fn resolve_context_user(
        &self,
        ctx: &NodeContext,
        sub: &str,
        internal: Option<User>,
        user_info: &HashMap<String, Value>,
    ) -> Result<ExecutorResponse, ExecutorError> {
        let mapped = mapped_attributes(user_info);
        let mut resp = ExecutorResponse::complete();
        if let Some(email) = user_info.get(runtime_keys::EMAIL) {
            resp.set_runtime(runtime_keys::EMAIL, &value_to_string(email));
        }

        match (ctx.flow_type.is_registration(), internal) {
            // Authentication against a linked local user.
            (false, Some(user)) => {
                let mut authenticated = authenticated_user_from_record(&user, true)?;
                authenticated.attributes.extend(mapped);
                resp.set_runtime(runtime_keys::USER_ID, &user.id);
                resp.set_authenticated_user(authenticated);
                Ok(resp)
            }

            // Authentication without a local user: eligible for just-in-time
            // provisioning when the node allows it.
            (false, None) => {
                if !ctx.bool_property(property_keys::ALLOW_AUTHENTICATION_WITHOUT_LOCAL_USER) {
                    return Ok(ExecutorResponse::failure("User not found"));
                }
                let Some(schema) = self.resolve_provisioning_schema(ctx).await? else {
                    return Ok(ExecutorResponse::failure("cannot provision automatically"));
                };
                tracing::info!(
                    flow_id = %ctx.flow_id,
                    user_type = %schema.name,
                    "federated user eligible for auto-provisioning"
                );
                resp.set_runtime(runtime_keys::USER_ELIGIBLE_FOR_PROVISIONING, "true");
                resp.set_runtime(runtime_keys::SUB, sub);
                resp.set_runtime(runtime_keys::USER_TYPE, &schema.name);
                resp.set_runtime(runtime_keys::DEFAULT_OU_ID, &schema.organization_unit_id);
                resp.set_authenticated_user(AuthenticatedUser {
                    is_authenticated: false,
                    attributes: mapped,
                    ..AuthenticatedUser::default()
                });
                Ok(resp)
            }

            // Registration of a fresh federated user: the provisioning node
            // creates the record.
            (true, None) => {
                resp.set_runtime(runtime_keys::SUB, sub);
                resp.set_authenticated_user(AuthenticatedUser {
                    is_authenticated: false,
                    attributes: mapped,
                    ..AuthenticatedUser::default()
                });
                Ok(resp)
            }

            // Registration against an existing local user.
            (true, Some(user)) => {
                if !ctx.bool_property(property_keys::ALLOW_REGISTRATION_WITH_EXISTING_USER) {
                    return Ok(ExecutorResponse::failure("User already exists"));
                }
                let mut authenticated = authenticated_user_from_record(&user, true)?;
                authenticated.attributes.extend(mapped);
                resp.set_runtime(runtime_keys::USER_ID, &user.id);
                resp.set_runtime(runtime_keys::SKIP_PROVISIONING, "true");
                resp.set_authenticated_user(authenticated);
                Ok(resp)
            }
        }
    }

    /// Resolve the single self-registration user schema, or `None` when the
    /// choice is ambiguous or empty.
    async fn resolve_provisioning_schema(
        &self,
        ctx: &NodeContext,
    ) -> Result<Option<UserSchema>, ExecutorError> {
        let mut eligible: Vec<UserSchema> = Vec::new();
        for name in &ctx.application.allowed_user_types {
            match with_cancellation(ctx, self.schemas.get_user_schema_by_name(name)).await? {
                Ok(schema) if schema.allow_self_registration => eligible.push(schema),
                Ok(_) => {}
                Err(e) if e.is_client() => {
                    tracing::warn!(flow_id = %ctx.flow_id, user_type = %name, error = %e, "skipping unknown user schema");
                }
                Err(e) => return Err(e.into()),
            }
        }
        if eligible.len() == 1 {
            Ok(eligible.pop())
        } else {
            Ok(None)
        }
    }
}

impl<O, I, S> Executor for OAuthExecutor<O, I, S>
where
    O: OAuthClientService + Clone,
    I: IdentityProviderService + Clone,
    S: UserSchemaService + Clone,
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
        let idp_id = ctx
            .string_property(property_keys::IDP_ID)
            .ok_or(ExecutorError::MissingProperty(property_keys::IDP_ID))?
            .to_string();

        // A provider that denied or errored redirects back with `error`
        // instead of `code`.
        if let Some(error) = ctx.user_input(input_keys::ERROR) {
            let description = ctx
                .user_input(input_keys::ERROR_DESCRIPTION)
                .unwrap_or(error);
            return Ok(ExecutorResponse::failure(&format!(
                "Identity provider returned an error: {description}"
            )));
        }

        match ctx.user_input(input_keys::CODE) {
            None => self.initiate(ctx, &idp_id).await,
            Some(code) => {
                let code = code.to_string();
                self.process(ctx, &idp_id, &code).await
            }
        }
    }
}

/// User-info claims minus identifier claims that must not become user
/// attributes.
fn mapped_attributes(user_info: &HashMap<String, Value>) -> HashMap<String, Value> {
    user_info
        .iter()
        .filter(|(k, _)| !SKIPPED_CLAIMS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_claims_are_skipped() {
        let mut info = HashMap::new();
        info.insert("sub".to_string(), serde_json::json!("s1"));
        info.insert("id".to_string(), serde_json::json!(7));
        info.insert("username".to_string(), serde_json::json!("octocat"));
        info.insert("email".to_string(), serde_json::json!("o@example.com"));
        info.insert("name".to_string(), serde_json::json!("Octo Cat"));

        let mapped = mapped_attributes(&info);
        assert_eq!(mapped.len(), 2);
        assert!(mapped.contains_key("email"));
        assert!(mapped.contains_key("name"));
    }
}
