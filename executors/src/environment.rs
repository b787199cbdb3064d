//! Flow environment.
//!
//! This module defines the environment type for dependency injection into
//! executors. The factory builds executors from one of these; each executor
//! keeps owned clones of just the services it needs.

use crate::services::{
    CredentialService, GroupService, IdentityProviderService, OAuthClientService,
    ObservabilityService, OrganizationUnitService, OtpService, PasskeyService, RoleService,
    UserSchemaService, UserService,
};

/// Flow environment.
///
/// Contains all external dependencies the executor set can need.
///
/// # Type Parameters
///
/// - `U`: user service
/// - `C`: credential service
/// - `O`: OAuth client core
/// - `I`: identity provider registry
/// - `S`: user schema service
/// - `T`: OTP channel
/// - `P`: passkey service
/// - `G`: group service
/// - `R`: role service
/// - `Q`: organization unit service
/// - `B`: observability sink
#[derive(Debug, Clone)]
pub struct FlowEnvironment<U, C, O, I, S, T, P, G, R, Q, B>
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
    /// User service.
    pub users: U,

    /// Credential service.
    pub credentials: C,

    /// OAuth client core.
    pub oauth: O,

    /// Identity provider registry.
    pub idps: I,

    /// User schema service.
    pub schemas: S,

    /// OTP channel.
    pub otp: T,

    /// Passkey service.
    pub passkeys: P,

    /// Group service.
    pub groups: G,

    /// Role service.
    pub roles: R,

    /// Organization unit service.
    pub org_units: Q,

    /// Observability sink.
    pub observability: B,
}

impl<U, C, O, I, S, T, P, G, R, Q, B> FlowEnvironment<U, C, O, I, S, T, P, G, R, Q, B>
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
    /// Create a new flow environment.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: U,
        credentials: C,
        oauth: O,
        idps: I,
        schemas: S,
        otp: T,
        passkeys: P,
        groups: G,
        roles: R,
        org_units: Q,
        observability: B,
    ) -> Self {
        Self {
            users,
            credentials,
            oauth,
            idps,
            schemas,
            otp,
            passkeys,
            groups,
            roles,
            org_units,
            observability,
        }
    }
}
