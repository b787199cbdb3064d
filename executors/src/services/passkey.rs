//! Passkey (WebAuthn) service trait.
//!
//! Ceremony crypto and credential storage live behind this seam. Option and
//! credential payloads cross it as JSON so the transport can hand them to
//! the browser untouched.

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use flowgate_core::ServiceError;

/// Relying party identity used in WebAuthn ceremonies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelyingParty {
    /// Relying party id (a registrable domain suffix).
    pub id: String,

    /// Human-readable relying party name.
    pub name: String,
}

/// Registration ceremony tuning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationOptions {
    /// Authenticator selection criteria, passed through verbatim.
    pub authenticator_selection: Option<Value>,

    /// Attestation conveyance preference (`none` by default).
    pub attestation: String,
}

/// Start an authentication ceremony.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartAuthenticationRequest {
    /// User the ceremony is for.
    pub user_id: String,

    /// Relying party identity.
    pub relying_party: RelyingParty,
}

/// Authentication ceremony opened.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartAuthenticationResponse {
    /// Session token binding this ceremony to its finish call.
    pub session_token: String,

    /// `PublicKeyCredentialRequestOptions` for the browser.
    pub request_options: Value,
}

/// Assertion produced by the authenticator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasskeyAssertion {
    /// Credential id.
    pub credential_id: String,

    /// Base64url client data JSON.
    pub client_data_json: String,

    /// Base64url authenticator data.
    pub authenticator_data: String,

    /// Base64url assertion signature.
    pub signature: String,

    /// Optional user handle returned by the authenticator.
    pub user_handle: Option<String>,
}

/// Finish an authentication ceremony.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishAuthenticationRequest {
    /// Session token from the matching start.
    pub session_token: String,

    /// The assertion to verify.
    pub assertion: PasskeyAssertion,
}

/// Authentication ceremony verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishAuthenticationResponse {
    /// The verified user id.
    pub user_id: String,
}

/// Start a registration ceremony.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartRegistrationRequest {
    /// User the credential will belong to.
    pub user_id: String,

    /// Relying party identity.
    pub relying_party: RelyingParty,

    /// Ceremony tuning.
    pub options: RegistrationOptions,
}

/// Registration ceremony opened.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartRegistrationResponse {
    /// Session token binding this ceremony to its finish call.
    pub session_token: String,

    /// `PublicKeyCredentialCreationOptions` for the browser.
    pub creation_options: Value,
}

/// Attestation produced by the authenticator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasskeyAttestation {
    /// Credential id.
    pub credential_id: String,

    /// Base64url client data JSON.
    pub client_data_json: String,

    /// Base64url attestation object.
    pub attestation_object: String,
}

/// Finish a registration ceremony.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishRegistrationRequest {
    /// Session token from the matching start.
    pub session_token: String,

    /// The attestation to verify and persist.
    pub attestation: PasskeyAttestation,

    /// Optional display name for the credential.
    pub credential_name: Option<String>,
}

/// Registration ceremony verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishRegistrationResponse {
    /// Id of the persisted credential.
    pub credential_id: String,
}

/// WebAuthn ceremony operations.
pub trait PasskeyService: Send + Sync {
    /// Open an authentication ceremony.
    ///
    /// # Errors
    ///
    /// - user has no registered credentials → a client-kind error
    /// - service failure → a server-kind error
    fn start_authentication(
        &self,
        request: &StartAuthenticationRequest,
    ) -> impl Future<Output = Result<StartAuthenticationResponse, ServiceError>> + Send;

    /// Verify an assertion and close the ceremony.
    ///
    /// # Errors
    ///
    /// - bad assertion or stale session → a client-kind error
    /// - service failure → a server-kind error
    fn finish_authentication(
        &self,
        request: &FinishAuthenticationRequest,
    ) -> impl Future<Output = Result<FinishAuthenticationResponse, ServiceError>> + Send;

    /// Open a registration ceremony.
    ///
    /// # Errors
    ///
    /// - invalid relying party/options → a client-kind error
    /// - service failure → a server-kind error
    fn start_registration(
        &self,
        request: &StartRegistrationRequest,
    ) -> impl Future<Output = Result<StartRegistrationResponse, ServiceError>> + Send;

    /// Verify an attestation, persist the credential, and close the
    /// ceremony.
    ///
    /// # Errors
    ///
    /// - bad attestation or stale session → a client-kind error
    /// - service failure → a server-kind error
    fn finish_registration(
        &self,
        request: &FinishRegistrationRequest,
    ) -> impl Future<Output = Result<FinishRegistrationResponse, ServiceError>> + Send;
}
