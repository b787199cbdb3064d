//! Mock service implementations for testing.
//!
//! Simple in-memory implementations of every service trait, with builder
//! methods to seed state and script failures. Enabled by the default-on
//! `test-utils` feature.

pub mod credential;
pub mod group;
pub mod idp;
pub mod oauth;
pub mod observability;
pub mod org_unit;
pub mod otp;
pub mod passkey;
pub mod role;
pub mod schema;
pub mod user;

pub use credential::MockCredentialService;
pub use group::MockGroupService;
pub use idp::MockIdentityProviderService;
pub use oauth::MockOAuthClientService;
pub use observability::MockObservabilityService;
pub use org_unit::MockOrganizationUnitService;
pub use otp::MockOtpService;
pub use passkey::MockPasskeyService;
pub use role::MockRoleService;
pub use schema::MockUserSchemaService;
pub use user::MockUserService;

use flowgate_core::error::error_codes;
use flowgate_core::ServiceError;

/// Generate a random session token (256 bits, base64url).
pub(crate) fn generate_token() -> String {
    use base64::Engine;
    use rand::RngCore;

    let mut rng = rand::thread_rng();
    let mut random_bytes = [0u8; 32];
    rng.fill_bytes(&mut random_bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Error returned when a mock's state mutex is poisoned.
pub(crate) fn poisoned() -> ServiceError {
    ServiceError::server(
        error_codes::UPSTREAM_ERROR,
        "Lock poisoned",
        "mock state mutex poisoned",
    )
}
