//! Service seams consumed by the executors.
//!
//! This module defines traits for all external collaborators of the flow
//! engine. Services are **interfaces**, not implementations: executors
//! depend on these traits and the runtime injects concrete clients through
//! [`FlowEnvironment`](crate::environment::FlowEnvironment).
//!
//! All methods are async, `Send`, and fail with
//! [`ServiceError`](flowgate_core::ServiceError); its client/server kind
//! decides whether an executor maps the failure into a client-visible flow
//! failure or a server fault.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use flowgate_core::ExecutorError;

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

// Re-export service traits
pub use credential::CredentialService;
pub use group::{Group, GroupMember, GroupService, GroupUpdate};
pub use idp::{IdentityProvider, IdentityProviderService};
pub use oauth::{OAuthClientService, TokenResponse};
pub use observability::{FlowEvent, NodeEventStatus, NodeEventType, ObservabilityService};
pub use org_unit::{CreateOrganizationUnitRequest, OrganizationUnit, OrganizationUnitService};
pub use otp::{
    OtpService, OtpVerificationStatus, SendOtpRequest, SendOtpResponse, VerifyOtpRequest,
    VerifyOtpResponse,
};
pub use passkey::{
    FinishAuthenticationRequest, FinishAuthenticationResponse, FinishRegistrationRequest,
    FinishRegistrationResponse, PasskeyAssertion, PasskeyAttestation, PasskeyService,
    RegistrationOptions, RelyingParty, StartAuthenticationRequest, StartAuthenticationResponse,
    StartRegistrationRequest, StartRegistrationResponse,
};
pub use role::{RoleAssignment, RoleService};
pub use schema::{UserSchema, UserSchemaService};
pub use user::UserService;

/// User record as stored by the user service.
///
/// `attributes` is an opaque serialized blob; parse it with
/// [`User::parsed_attributes`] rather than by hand so that malformed blobs
/// consistently surface as server faults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Internal user id.
    pub id: String,

    /// Organization unit the user belongs to.
    pub organization_unit: String,

    /// User schema name.
    pub user_type: String,

    /// Serialized attribute blob (a JSON object document).
    pub attributes: String,
}

impl User {
    /// Parse the attribute blob into a map.
    ///
    /// An empty blob parses as an empty map.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::MalformedAttributes`] when the blob is not a
    /// valid JSON object.
    pub fn parsed_attributes(&self) -> Result<HashMap<String, Value>, ExecutorError> {
        if self.attributes.is_empty() {
            return Ok(HashMap::new());
        }
        let value: Value = serde_json::from_str(&self.attributes)
            .map_err(|e| ExecutorError::MalformedAttributes(e.to_string()))?;
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(ExecutorError::MalformedAttributes(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_blob_parses_to_empty_map() {
        let user = User::default();
        assert!(user.parsed_attributes().unwrap().is_empty());
    }

    #[test]
    fn object_blob_parses() {
        let user = User {
            attributes: r#"{"email":"test@example.com","age":42}"#.to_string(),
            ..User::default()
        };
        let attrs = user.parsed_attributes().unwrap();
        assert_eq!(attrs["email"], "test@example.com");
        assert_eq!(attrs["age"], 42);
    }

    #[test]
    fn non_object_blob_is_a_server_fault() {
        for blob in ["[1,2,3]", "\"text\"", "{broken"] {
            let user = User {
                attributes: blob.to_string(),
                ..User::default()
            };
            assert!(matches!(
                user.parsed_attributes(),
                Err(ExecutorError::MalformedAttributes(_))
            ));
        }
    }
}
