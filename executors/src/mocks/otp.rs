//! Mock OTP channel.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use constant_time_eq::constant_time_eq;

use flowgate_core::ServiceError;
use flowgate_core::error::error_codes;

use super::{generate_token, poisoned};
use crate::services::{
    OtpService, OtpVerificationStatus, SendOtpRequest, SendOtpResponse, VerifyOtpRequest,
    VerifyOtpResponse,
};

/// In-memory OTP channel.
///
/// Every send delivers the configured code (default `123456`) and opens a
/// session under a fresh random token.
#[derive(Debug, Clone)]
pub struct MockOtpService {
    code: Arc<Mutex<String>>,
    sessions: Arc<Mutex<HashMap<String, String>>>,
    sent: Arc<Mutex<Vec<SendOtpRequest>>>,
    fail_with: Arc<Mutex<Option<ServiceError>>>,
}

impl Default for MockOtpService {
    fn default() -> Self {
        Self {
            code: Arc::new(Mutex::new("123456".to_string())),
            sessions: Arc::new(Mutex::new(HashMap::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            fail_with: Arc::new(Mutex::new(None)),
        }
    }
}

impl MockOtpService {
    /// Create a mock delivering the default code `123456`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the delivered code.
    #[must_use]
    pub fn with_code(self, code: &str) -> Self {
        if let Ok(mut stored) = self.code.lock() {
            *stored = code.to_string();
        }
        self
    }

    /// Make every subsequent call fail with `error`.
    pub fn set_failure(&self, error: Option<ServiceError>) {
        if let Ok(mut fail) = self.fail_with.lock() {
            *fail = error;
        }
    }

    /// Deliveries recorded so far, for assertions.
    ///
    /// # Panics
    ///
    /// Panics if the state mutex is poisoned.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn sent(&self) -> Vec<SendOtpRequest> {
        self.sent.lock().unwrap().clone()
    }

    fn scripted_failure(&self) -> Option<ServiceError> {
        self.fail_with.lock().ok().and_then(|guard| guard.clone())
    }
}

impl OtpService for MockOtpService {
    fn send_otp(
        &self,
        request: &SendOtpRequest,
    ) -> impl Future<Output = Result<SendOtpResponse, ServiceError>> + Send {
        let code = Arc::clone(&self.code);
        let sessions = Arc::clone(&self.sessions);
        let sent = Arc::clone(&self.sent);
        let request = request.clone();
        let failure = self.scripted_failure();

        async move {
            if let Some(error) = failure {
                return Err(error);
            }
            let session_token = generate_token();
            let code = code.lock().map_err(|_| poisoned())?.clone();
            sessions
                .lock()
                .map_err(|_| poisoned())?
                .insert(session_token.clone(), code);
            sent.lock().map_err(|_| poisoned())?.push(request);
            Ok(SendOtpResponse { session_token })
        }
    }

    fn verify_otp(
        &self,
        request: &VerifyOtpRequest,
    ) -> impl Future<Output = Result<VerifyOtpResponse, ServiceError>> + Send {
        let sessions = Arc::clone(&self.sessions);
        let request = request.clone();
        let failure = self.scripted_failure();

        async move {
            if let Some(error) = failure {
                return Err(error);
            }
            let sessions = sessions.lock().map_err(|_| poisoned())?;
            let Some(expected) = sessions.get(&request.session_token) else {
                return Err(ServiceError::client(
                    error_codes::INVALID_REQUEST,
                    "Unknown OTP session",
                    "no OTP session matches the supplied token",
                ));
            };
            let status = if constant_time_eq(expected.as_bytes(), request.otp_code.as_bytes()) {
                OtpVerificationStatus::Verified
            } else {
                OtpVerificationStatus::Invalid
            };
            Ok(VerifyOtpResponse { status })
        }
    }
}
