//! Mock OAuth client core.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use flowgate_core::ServiceError;

use super::poisoned;
use crate::services::{OAuthClientService, TokenResponse, User};

/// Scripted OAuth client.
///
/// Returns a configurable token, user-info claim set, and sub → local-user
/// mapping; no wire traffic.
#[derive(Debug, Clone)]
pub struct MockOAuthClientService {
    authorize_url: Arc<Mutex<String>>,
    token: Arc<Mutex<TokenResponse>>,
    user_info: Arc<Mutex<HashMap<String, Value>>>,
    internal_users: Arc<Mutex<HashMap<String, User>>>,
    exchange_failure: Arc<Mutex<Option<ServiceError>>>,
}

impl Default for MockOAuthClientService {
    fn default() -> Self {
        Self {
            authorize_url: Arc::new(Mutex::new(
                "https://idp.example/authorize?client_id=mock".to_string(),
            )),
            token: Arc::new(Mutex::new(TokenResponse {
                access_token: "mock_access_token".to_string(),
                token_type: "Bearer".to_string(),
                expires_in: Some(3600),
                refresh_token: None,
                id_token: None,
                scope: "openid profile email".to_string(),
            })),
            user_info: Arc::new(Mutex::new(HashMap::new())),
            internal_users: Arc::new(Mutex::new(HashMap::new())),
            exchange_failure: Arc::new(Mutex::new(None)),
        }
    }
}

impl MockOAuthClientService {
    /// Create a mock with a default token and authorize URL.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the authorization URL.
    #[must_use]
    pub fn with_authorize_url(self, url: &str) -> Self {
        if let Ok(mut stored) = self.authorize_url.lock() {
            *stored = url.to_string();
        }
        self
    }

    /// Override the token response.
    #[must_use]
    pub fn with_token(self, token: TokenResponse) -> Self {
        if let Ok(mut stored) = self.token.lock() {
            *stored = token;
        }
        self
    }

    /// Add a user-info claim.
    #[must_use]
    pub fn with_claim(self, key: &str, value: Value) -> Self {
        if let Ok(mut info) = self.user_info.lock() {
            info.insert(key.to_string(), value);
        }
        self
    }

    /// Link a federated subject to a local user.
    #[must_use]
    pub fn with_internal_user(self, sub: &str, user: User) -> Self {
        if let Ok(mut users) = self.internal_users.lock() {
            users.insert(sub.to_string(), user);
        }
        self
    }

    /// Make the next code exchange fail with `error`.
    pub fn set_exchange_failure(&self, error: Option<ServiceError>) {
        if let Ok(mut fail) = self.exchange_failure.lock() {
            *fail = error;
        }
    }
}

impl OAuthClientService for MockOAuthClientService {
    fn build_authorize_url(
        &self,
        idp_id: &str,
    ) -> impl Future<Output = Result<String, ServiceError>> + Send {
        let authorize_url = Arc::clone(&self.authorize_url);
        let idp_id = idp_id.to_string();

        async move {
            let url = authorize_url.lock().map_err(|_| poisoned())?.clone();
            Ok(format!("{url}&idp={idp_id}"))
        }
    }

    fn exchange_code_for_token(
        &self,
        _idp_id: &str,
        code: &str,
        _validate: bool,
    ) -> impl Future<Output = Result<TokenResponse, ServiceError>> + Send {
        let token = Arc::clone(&self.token);
        let failure = self
            .exchange_failure
            .lock()
            .ok()
            .and_then(|guard| guard.clone());
        let code = code.to_string();

        async move {
            if let Some(error) = failure {
                return Err(error);
            }
            tracing::debug!(code = %code, "mock code exchange");
            Ok(token.lock().map_err(|_| poisoned())?.clone())
        }
    }

    fn fetch_user_info(
        &self,
        _idp_id: &str,
        _access_token: &str,
    ) -> impl Future<Output = Result<HashMap<String, Value>, ServiceError>> + Send {
        let user_info = Arc::clone(&self.user_info);

        async move { Ok(user_info.lock().map_err(|_| poisoned())?.clone()) }
    }

    fn get_internal_user(
        &self,
        sub: &str,
    ) -> impl Future<Output = Result<User, ServiceError>> + Send {
        let internal_users = Arc::clone(&self.internal_users);
        let sub = sub.to_string();

        async move {
            internal_users
                .lock()
                .map_err(|_| poisoned())?
                .get(&sub)
                .cloned()
                .ok_or_else(ServiceError::user_not_found)
        }
    }
}
