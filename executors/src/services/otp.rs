//! One-time-password channel trait.

use std::future::Future;

use serde::{Deserialize, Serialize};

use flowgate_core::ServiceError;

/// Request to deliver a one-time password.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOtpRequest {
    /// Destination mobile number.
    pub recipient: String,

    /// Configured sender id the message goes out under.
    pub sender_id: String,
}

/// Result of an OTP delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOtpResponse {
    /// Session token binding this delivery to a later verification.
    pub session_token: String,
}

/// Request to verify a one-time password.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOtpRequest {
    /// Session token from the matching send.
    pub session_token: String,

    /// The code the user entered.
    pub otp_code: String,
}

/// Verification verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OtpVerificationStatus {
    /// The code matched.
    Verified,

    /// The code did not match or the session expired.
    Invalid,
}

/// Result of an OTP verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOtpResponse {
    /// Verdict.
    pub status: OtpVerificationStatus,
}

/// Sends and verifies one-time passwords.
pub trait OtpService: Send + Sync {
    /// Deliver a one-time password and open a verification session.
    ///
    /// # Errors
    ///
    /// - invalid recipient/sender → a client-kind error
    /// - channel failure → a server-kind error
    fn send_otp(
        &self,
        request: &SendOtpRequest,
    ) -> impl Future<Output = Result<SendOtpResponse, ServiceError>> + Send;

    /// Verify a code against an open session.
    ///
    /// A wrong code is a `Verified`/`Invalid` verdict, not an error.
    ///
    /// # Errors
    ///
    /// - unknown/expired session token → a client-kind error
    /// - channel failure → a server-kind error
    fn verify_otp(
        &self,
        request: &VerifyOtpRequest,
    ) -> impl Future<Output = Result<VerifyOtpResponse, ServiceError>> + Send;
}
