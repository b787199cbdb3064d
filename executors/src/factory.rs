//! Flow factory.
//!
//! The single registration point tying an [`ExecutorKind`] to a constructed
//! executor. The graph engine resolves a node's executor name to a kind and
//! asks the factory for an instance bound to the environment's services.
//!
//! Executors are modeled as a tagged variant rather than trait objects so
//! the contract's async methods stay free of boxing.

use flowgate_core::{
    Executor, ExecutorError, ExecutorKind, ExecutorResponse, InputDescriptor, NodeContext,
};

use crate::environment::FlowEnvironment;
use crate::executors::{
    BasicAuthExecutor, GithubOAuthExecutor, GoogleOAuthExecutor, HttpRequestExecutor,
    IdentityResolverExecutor, OidcAuthExecutor, OuCreateExecutor, PasskeyExecutor,
    ProvisioningExecutor, SmsOtpExecutor,
};
use crate::observability::Observed;
use crate::services::{
    CredentialService, GroupService, IdentityProviderService, OAuthClientService,
    ObservabilityService, OrganizationUnitService, OtpService, PasskeyService, RoleService,
    UserSchemaService, UserService,
};

/// Any executor the factory can produce, dispatching the contract by
/// variant.
#[derive(Debug, Clone)]
pub enum FlowExecutor<U, C, O, I, S, T, P, G, R, Q> {
    /// Identity resolver.
    IdentityResolver(IdentityResolverExecutor<U>),

    /// Basic username/password authentication.
    BasicAuth(BasicAuthExecutor<U, C>),

    /// Generic OIDC federation.
    Oidc(OidcAuthExecutor<O, I, S>),

    /// GitHub federation.
    Github(GithubOAuthExecutor<O, I, S>),

    /// Google federation.
    Google(GoogleOAuthExecutor<O, I, S>),

    /// SMS one-time passwords.
    SmsOtp(SmsOtpExecutor<U, T>),

    /// WebAuthn ceremonies.
    Passkey(PasskeyExecutor<U, P>),

    /// Outbound HTTP call.
    HttpRequest(HttpRequestExecutor),

    /// Organization unit creation.
    OuCreate(OuCreateExecutor<Q>),

    /// User provisioning.
    Provision(ProvisioningExecutor<U, G, R>),
}

impl<U, C, O, I, S, T, P, G, R, Q> Executor for FlowExecutor<U, C, O, I, S, T, P, G, R, Q>
where
    U: UserService + Clone,
    C: CredentialService + Clone,
    O: OAuthClientService + Clone,
    I: IdentityProviderService + Clone,
    S: UserSchemaService + Clone,
    T: OtpService + Clone,
    P: PasskeyService + Clone,
    G: GroupService + Clone,
    R: RoleService + Clone,
    Q: OrganizationUnitService + Clone,
{
    fn name(&self) -> &str {
        match self {
            Self::IdentityResolver(e) => e.name(),
            Self::BasicAuth(e) => e.name(),
            Self::Oidc(e) => e.name(),
            Self::Github(e) => e.name(),
            Self::Google(e) => e.name(),
            Self::SmsOtp(e) => e.name(),
            Self::Passkey(e) => e.name(),
            Self::HttpRequest(e) => e.name(),
            Self::OuCreate(e) => e.name(),
            Self::Provision(e) => e.name(),
        }
    }

    fn kind(&self) -> ExecutorKind {
        match self {
            Self::IdentityResolver(e) => e.kind(),
            Self::BasicAuth(e) => e.kind(),
            Self::Oidc(e) => e.kind(),
            Self::Github(e) => e.kind(),
            Self::Google(e) => e.kind(),
            Self::SmsOtp(e) => e.kind(),
            Self::Passkey(e) => e.kind(),
            Self::HttpRequest(e) => e.kind(),
            Self::OuCreate(e) => e.kind(),
            Self::Provision(e) => e.kind(),
        }
    }

    fn default_inputs(&self) -> &[InputDescriptor] {
        match self {
            Self::IdentityResolver(e) => e.default_inputs(),
            Self::BasicAuth(e) => e.default_inputs(),
            Self::Oidc(e) => e.default_inputs(),
            Self::Github(e) => e.default_inputs(),
            Self::Google(e) => e.default_inputs(),
            Self::SmsOtp(e) => e.default_inputs(),
            Self::Passkey(e) => e.default_inputs(),
            Self::HttpRequest(e) => e.default_inputs(),
            Self::OuCreate(e) => e.default_inputs(),
            Self::Provision(e) => e.default_inputs(),
        }
    }

    fn prerequisites(&self) -> &[InputDescriptor] {
        match self {
            Self::IdentityResolver(e) => e.prerequisites(),
            Self::BasicAuth(e) => e.prerequisites(),
            Self::Oidc(e) => e.prerequisites(),
            Self::Github(e) => e.prerequisites(),
            Self::Google(e) => e.prerequisites(),
            Self::SmsOtp(e) => e.prerequisites(),
            Self::Passkey(e) => e.prerequisites(),
            Self::HttpRequest(e) => e.prerequisites(),
            Self::OuCreate(e) => e.prerequisites(),
            Self::Provision(e) => e.prerequisites(),
        }
    }

    async fn execute(&self, ctx: &NodeContext) -> Result<ExecutorResponse, ExecutorError> {
        match self {
            Self::IdentityResolver(e) => e.execute(ctx).await,
            Self::BasicAuth(e) => e.execute(ctx).await,
            Self::Oidc(e) => e.execute(ctx).await,
            Self::Github(e) => e.execute(ctx).await,
            Self::Google(e) => e.execute(ctx).await,
            Self::SmsOtp(e) => e.execute(ctx).await,
            Self::Passkey(e) => e.execute(ctx).await,
            Self::HttpRequest(e) => e.execute(ctx).await,
            Self::OuCreate(e) => e.execute(ctx).await,
            Self::Provision(e) => e.execute(ctx).await,
        }
    }
}

/// Construct the executor for `kind`, bound to the environment's services.
#[must_use]
pub fn build_executor<U, C, O, I, S, T, P, G, R, Q, B>(
    kind: ExecutorKind,
    env: &FlowEnvironment<U, C, O, I, S, T, P, G, R, Q, B>,
) -> FlowExecutor<U, C, O, I, S, T, P, G, R, Q>
where
    U: UserService + Clone,
    C: CredentialService + Clone,
    O: OAuthClientService + Clone,
    I: IdentityProviderService + Clone,
    S: UserSchemaService + Clone,
    T: OtpService + Clone,
    P: PasskeyService + Clone,
    G: GroupService + Clone,
    R: RoleService + Clone,
    Q: OrganizationUnitService + Clone,
    B: ObservabilityService + Clone,
{
    match kind {
        ExecutorKind::IdentityResolver => FlowExecutor::IdentityResolver(
            IdentityResolverExecutor::new(env.users.clone()),
        ),
        ExecutorKind::BasicAuth => FlowExecutor::BasicAuth(BasicAuthExecutor::new(
            env.users.clone(),
            env.credentials.clone(),
        )),
        ExecutorKind::Oidc => FlowExecutor::Oidc(OidcAuthExecutor::new(
            env.oauth.clone(),
            env.idps.clone(),
            env.schemas.clone(),
        )),
        ExecutorKind::Github => FlowExecutor::Github(GithubOAuthExecutor::new(
            env.oauth.clone(),
            env.idps.clone(),
            env.schemas.clone(),
        )),
        ExecutorKind::Google => FlowExecutor::Google(GoogleOAuthExecutor::new(
            env.oauth.clone(),
            env.idps.clone(),
            env.schemas.clone(),
        )),
        ExecutorKind::SmsOtp => {
            FlowExecutor::SmsOtp(SmsOtpExecutor::new(env.users.clone(), env.otp.clone()))
        }
        ExecutorKind::Passkey => FlowExecutor::Passkey(PasskeyExecutor::new(
            env.users.clone(),
            env.passkeys.clone(),
        )),
        ExecutorKind::HttpRequest => FlowExecutor::HttpRequest(HttpRequestExecutor::new()),
        ExecutorKind::OuCreate => {
            FlowExecutor::OuCreate(OuCreateExecutor::new(env.org_units.clone()))
        }
        ExecutorKind::Provision => FlowExecutor::Provision(ProvisioningExecutor::new(
            env.users.clone(),
            env.groups.clone(),
            env.roles.clone(),
        )),
    }
}

/// Like [`build_executor`], wrapped with the environment's observability
/// sink.
#[must_use]
pub fn build_observed_executor<U, C, O, I, S, T, P, G, R, Q, B>(
    kind: ExecutorKind,
    env: &FlowEnvironment<U, C, O, I, S, T, P, G, R, Q, B>,
) -> Observed<FlowExecutor<U, C, O, I, S, T, P, G, R, Q>, B>
where
    U: UserService + Clone,
    C: CredentialService + Clone,
    O: OAuthClientService + Clone,
    I: IdentityProviderService + Clone,
    S: UserSchemaService + Clone,
    T: OtpService + Clone,
    P: PasskeyService + Clone,
    G: GroupService + Clone,
    R: RoleService + Clone,
    Q: OrganizationUnitService + Clone,
    B: ObservabilityService + Clone,
{
    Observed::new(build_executor(kind, env), env.observability.clone())
}
