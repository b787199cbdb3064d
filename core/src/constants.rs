//! Well-known keys and closed key sets shared by the engine and executors.
//!
//! `RuntimeData` is the only durable channel across flow suspensions, so its
//! keys form a contract between executors. The same applies to node property
//! keys coming from the flow definition.

/// Reserved `RuntimeData` keys.
///
/// Executors read and write these across steps of one flow; the engine
/// persists them between suspensions.
pub mod runtime_keys {
    /// Internal user id resolved for the flow.
    pub const USER_ID: &str = "userID";

    /// Email address captured from user info or inputs.
    pub const EMAIL: &str = "email";

    /// Mobile number used for OTP delivery.
    pub const MOBILE_NUMBER: &str = "mobileNumber";

    /// Subject claim returned by a federated identity provider.
    pub const SUB: &str = "sub";

    /// Session token handed from OTP send to OTP verify.
    pub const OTP_SESSION_TOKEN: &str = "otpSessionToken";

    /// Session token handed between passkey ceremony legs.
    pub const PASSKEY_SESSION_TOKEN: &str = "passkeySessionToken";

    /// Credential id persisted by passkey registration.
    pub const PASSKEY_CREDENTIAL_ID: &str = "passkeyCredentialID";

    /// Optional display name persisted by passkey registration.
    pub const PASSKEY_CREDENTIAL_NAME: &str = "passkeyCredentialName";

    /// OTP send attempts consumed so far; maintained by the engine.
    pub const ATTEMPT_COUNT: &str = "attemptCount";

    /// Organization unit id created or selected for provisioning.
    pub const OU_ID: &str = "ouId";

    /// Fallback organization unit id from the resolved user schema.
    pub const DEFAULT_OU_ID: &str = "defaultOUID";

    /// User schema name selected for provisioning.
    pub const USER_TYPE: &str = "userType";

    /// Marks a federated user as eligible for just-in-time provisioning.
    pub const USER_ELIGIBLE_FOR_PROVISIONING: &str = "userEligibleForProvisioning";

    /// Marks provisioning as a no-op because an existing user was attached.
    pub const SKIP_PROVISIONING: &str = "skipProvisioning";

    /// Set once a user was materialized during an authentication flow.
    pub const USER_AUTO_PROVISIONED: &str = "userAutoProvisioned";
}

/// Well-known `UserInputs` identifiers.
pub mod input_keys {
    /// Login name.
    pub const USERNAME: &str = "username";

    /// Password (basic auth).
    pub const PASSWORD: &str = "password";

    /// OAuth authorization code from the callback.
    pub const CODE: &str = "code";

    /// OAuth error code from the callback.
    pub const ERROR: &str = "error";

    /// OAuth error description from the callback.
    pub const ERROR_DESCRIPTION: &str = "error_description";

    /// One-time password entered by the user.
    pub const OTP: &str = "otp";

    /// Mobile number entered by the user.
    pub const MOBILE_NUMBER: &str = "mobileNumber";

    /// Organization unit display name.
    pub const OU_NAME: &str = "ouName";

    /// Organization unit handle (url-safe identifier).
    pub const OU_HANDLE: &str = "ouHandle";

    /// WebAuthn credential id.
    pub const CREDENTIAL_ID: &str = "credentialId";

    /// WebAuthn client data (base64url JSON).
    pub const CLIENT_DATA_JSON: &str = "clientDataJSON";

    /// WebAuthn authenticator data (assertion).
    pub const AUTHENTICATOR_DATA: &str = "authenticatorData";

    /// WebAuthn assertion signature.
    pub const SIGNATURE: &str = "signature";

    /// Optional WebAuthn user handle.
    pub const USER_HANDLE: &str = "userHandle";

    /// WebAuthn attestation object (registration).
    pub const ATTESTATION_OBJECT: &str = "attestationObject";

    /// Optional display name for a registered passkey.
    pub const CREDENTIAL_NAME: &str = "credentialName";
}

/// Recognized `NodeProperties` keys, per executor family.
pub mod property_keys {
    /// Identity provider id (OAuth executors).
    pub const IDP_ID: &str = "idpId";

    /// Permit authentication without a local user (OAuth executors).
    pub const ALLOW_AUTHENTICATION_WITHOUT_LOCAL_USER: &str = "allowAuthenticationWithoutLocalUser";

    /// Permit registration against an existing user (OAuth executors).
    pub const ALLOW_REGISTRATION_WITH_EXISTING_USER: &str = "allowRegistrationWithExistingUser";

    /// OTP sender id (SMS-OTP executor).
    pub const SENDER_ID: &str = "senderId";

    /// WebAuthn relying party id (passkey executor).
    pub const RELYING_PARTY_ID: &str = "relyingPartyId";

    /// WebAuthn relying party display name (passkey executor).
    pub const RELYING_PARTY_NAME: &str = "relyingPartyName";

    /// WebAuthn authenticator selection criteria (passkey executor).
    pub const AUTHENTICATOR_SELECTION: &str = "authenticatorSelection";

    /// WebAuthn attestation conveyance preference (passkey executor).
    pub const ATTESTATION: &str = "attestation";

    /// Target URL (HTTP-request executor).
    pub const URL: &str = "url";

    /// HTTP method (HTTP-request executor).
    pub const METHOD: &str = "method";

    /// Outbound headers (HTTP-request executor).
    pub const HEADERS: &str = "headers";

    /// Outbound JSON body (HTTP-request executor).
    pub const BODY: &str = "body";

    /// Response-to-runtime-data mapping (HTTP-request executor).
    pub const RESPONSE_MAPPING: &str = "responseMapping";

    /// Request timeout in seconds (HTTP-request executor).
    pub const TIMEOUT: &str = "timeout";

    /// Error handling policy (HTTP-request executor).
    pub const ERROR_HANDLING: &str = "errorHandling";

    /// Group to add the provisioned user to (provisioning executor).
    pub const ASSIGN_GROUP: &str = "assignGroup";

    /// Role to assign the provisioned user (provisioning executor).
    pub const ASSIGN_ROLE: &str = "assignRole";
}

/// Executor mode tags for multi-phase executors.
pub mod modes {
    /// OTP: deliver a one-time password.
    pub const SEND: &str = "send";

    /// OTP / passkey: verify the supplied credential.
    pub const VERIFY: &str = "verify";

    /// Passkey: start an authentication ceremony.
    pub const CHALLENGE: &str = "challenge";

    /// Passkey: start a registration ceremony.
    pub const REGISTER_START: &str = "register_start";

    /// Passkey: finish a registration ceremony.
    pub const REGISTER_FINISH: &str = "register_finish";
}

/// Keys that must never be persisted as user attributes.
///
/// This is a closed list; provisioning filters the merged attribute set
/// against it before creating a user record.
pub const NON_USER_ATTRIBUTES: &[&str] = &[
    "userID",
    "code",
    "nonce",
    "state",
    "flowID",
    "otp",
    "attemptCount",
    "expiryTimeInMillis",
    "otpSessionToken",
    "value",
    "authorized_permissions",
    "requested_permissions",
    "userType",
    "ouId",
    "defaultOUID",
    "ouName",
    "ouHandle",
    "ouDescription",
    "userEligibleForProvisioning",
    "skipProvisioning",
    "userAutoProvisioned",
];

/// Attribute keys usable to identify an existing user.
pub const IDENTIFYING_ATTRIBUTES: &[&str] = &["username", "email", "mobileNumber"];

/// Returns `true` if `key` must be excluded from persisted user attributes.
#[must_use]
pub fn is_reserved_attribute(key: &str) -> bool {
    NON_USER_ATTRIBUTES.contains(&key)
}

/// Returns `true` if `key` can identify an existing user.
#[must_use]
pub fn is_identifying_attribute(key: &str) -> bool {
    IDENTIFYING_ATTRIBUTES.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_set_is_closed_over_runtime_keys() {
        // Every reserved runtime-data key an executor writes must be filtered
        // out of provisioning attribute sets.
        for key in [
            runtime_keys::USER_ID,
            runtime_keys::OTP_SESSION_TOKEN,
            runtime_keys::ATTEMPT_COUNT,
            runtime_keys::OU_ID,
            runtime_keys::DEFAULT_OU_ID,
            runtime_keys::USER_TYPE,
            runtime_keys::USER_ELIGIBLE_FOR_PROVISIONING,
            runtime_keys::SKIP_PROVISIONING,
            runtime_keys::USER_AUTO_PROVISIONED,
        ] {
            assert!(is_reserved_attribute(key), "{key} must be reserved");
        }
    }

    #[test]
    fn identifying_attributes_are_not_reserved() {
        for key in IDENTIFYING_ATTRIBUTES {
            assert!(!is_reserved_attribute(key));
        }
    }

    #[test]
    fn federated_and_contact_attributes_survive_filtering() {
        // email/mobileNumber identify users and `sub` links federated
        // accounts; none of them may be filtered out of user records.
        assert!(!is_reserved_attribute(runtime_keys::EMAIL));
        assert!(!is_reserved_attribute(runtime_keys::MOBILE_NUMBER));
        assert!(!is_reserved_attribute(runtime_keys::SUB));
    }
}
