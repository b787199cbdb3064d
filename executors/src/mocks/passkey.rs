//! Mock passkey service.
//!
//! Simulates WebAuthn ceremonies without any crypto: starts open a session
//! under a fresh token, finishes validate only the token and a scripted
//! rejection switch.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use serde_json::json;

use flowgate_core::ServiceError;
use flowgate_core::error::error_codes;

use super::{generate_token, poisoned};
use crate::services::{
    FinishAuthenticationRequest, FinishAuthenticationResponse, FinishRegistrationRequest,
    FinishRegistrationResponse, PasskeyService, StartAuthenticationRequest,
    StartAuthenticationResponse, StartRegistrationRequest, StartRegistrationResponse,
};

/// In-memory passkey ceremony state.
#[derive(Debug, Clone, Default)]
pub struct MockPasskeyService {
    sessions: Arc<Mutex<HashMap<String, String>>>,
    reject_credentials: Arc<Mutex<bool>>,
    fail_with: Arc<Mutex<Option<ServiceError>>>,
}

impl MockPasskeyService {
    /// Create a mock passkey service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script finish calls to reject the supplied credentials.
    pub fn set_reject_credentials(&self, reject: bool) {
        if let Ok(mut flag) = self.reject_credentials.lock() {
            *flag = reject;
        }
    }

    /// Make every subsequent call fail with `error`.
    pub fn set_failure(&self, error: Option<ServiceError>) {
        if let Ok(mut fail) = self.fail_with.lock() {
            *fail = error;
        }
    }

    fn scripted_failure(&self) -> Option<ServiceError> {
        self.fail_with.lock().ok().and_then(|guard| guard.clone())
    }

    fn rejects(&self) -> bool {
        self.reject_credentials
            .lock()
            .map(|flag| *flag)
            .unwrap_or(false)
    }

    fn invalid_credentials() -> ServiceError {
        ServiceError::client(
            error_codes::INVALID_PASSKEY_CREDENTIALS,
            "Invalid passkey credentials",
            "the assertion or attestation did not verify",
        )
    }

    fn unknown_session() -> ServiceError {
        ServiceError::client(
            error_codes::INVALID_REQUEST,
            "Unknown passkey session",
            "no ceremony matches the supplied session token",
        )
    }
}

impl PasskeyService for MockPasskeyService {
    fn start_authentication(
        &self,
        request: &StartAuthenticationRequest,
    ) -> impl Future<Output = Result<StartAuthenticationResponse, ServiceError>> + Send {
        let sessions = Arc::clone(&self.sessions);
        let request = request.clone();
        let failure = self.scripted_failure();

        async move {
            if let Some(error) = failure {
                return Err(error);
            }
            let session_token = generate_token();
            sessions
                .lock()
                .map_err(|_| poisoned())?
                .insert(session_token.clone(), request.user_id.clone());
            Ok(StartAuthenticationResponse {
                session_token,
                request_options: json!({
                    "challenge": generate_token(),
                    "rpId": request.relying_party.id,
                    "allowCredentials": [],
                    "userVerification": "preferred",
                }),
            })
        }
    }

    fn finish_authentication(
        &self,
        request: &FinishAuthenticationRequest,
    ) -> impl Future<Output = Result<FinishAuthenticationResponse, ServiceError>> + Send {
        let sessions = Arc::clone(&self.sessions);
        let request = request.clone();
        let failure = self.scripted_failure();
        let rejects = self.rejects();

        async move {
            if let Some(error) = failure {
                return Err(error);
            }
            let user_id = sessions
                .lock()
                .map_err(|_| poisoned())?
                .remove(&request.session_token)
                .ok_or_else(Self::unknown_session)?;
            if rejects {
                return Err(Self::invalid_credentials());
            }
            Ok(FinishAuthenticationResponse { user_id })
        }
    }

    fn start_registration(
        &self,
        request: &StartRegistrationRequest,
    ) -> impl Future<Output = Result<StartRegistrationResponse, ServiceError>> + Send {
        let sessions = Arc::clone(&self.sessions);
        let request = request.clone();
        let failure = self.scripted_failure();

        async move {
            if let Some(error) = failure {
                return Err(error);
            }
            let session_token = generate_token();
            sessions
                .lock()
                .map_err(|_| poisoned())?
                .insert(session_token.clone(), request.user_id.clone());
            Ok(StartRegistrationResponse {
                session_token,
                creation_options: json!({
                    "challenge": generate_token(),
                    "rp": {
                        "id": request.relying_party.id,
                        "name": request.relying_party.name,
                    },
                    "attestation": request.options.attestation,
                    "authenticatorSelection": request.options.authenticator_selection,
                }),
            })
        }
    }

    fn finish_registration(
        &self,
        request: &FinishRegistrationRequest,
    ) -> impl Future<Output = Result<FinishRegistrationResponse, ServiceError>> + Send {
        let sessions = Arc::clone(&self.sessions);
        let request = request.clone();
        let failure = self.scripted_failure();
        let rejects = self.rejects();

        async move {
            if let Some(error) = failure {
                return Err(error);
            }
            sessions
                .lock()
                .map_err(|_| poisoned())?
                .remove(&request.session_token)
                .ok_or_else(Self::unknown_session)?;
            if rejects {
                return Err(Self::invalid_credentials());
            }
            Ok(FinishRegistrationResponse {
                credential_id: request.attestation.credential_id,
            })
        }
    }
}
