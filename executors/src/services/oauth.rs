//! OAuth client core trait.
//!
//! The wire protocol (authorization endpoints, token exchange, user-info
//! requests) lives behind this seam; executors only see its results.

use std::collections::HashMap;
use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use flowgate_core::ServiceError;

use super::User;

/// Token endpoint response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Bearer access token.
    pub access_token: String,

    /// Token type, usually `Bearer`.
    pub token_type: String,

    /// Seconds until the access token expires, if stated.
    pub expires_in: Option<u64>,

    /// Refresh token, if granted.
    pub refresh_token: Option<String>,

    /// OIDC id token, if granted.
    pub id_token: Option<String>,

    /// Space-separated granted scopes.
    pub scope: String,
}

/// OAuth/OIDC protocol operations against a configured identity provider.
pub trait OAuthClientService: Send + Sync {
    /// Build the authorization URL for the given identity provider.
    ///
    /// # Errors
    ///
    /// - unknown provider or missing client config → a client-kind error
    /// - upstream failure → a server-kind error
    fn build_authorize_url(
        &self,
        idp_id: &str,
    ) -> impl Future<Output = Result<String, ServiceError>> + Send;

    /// Exchange an authorization code for tokens. `validate` asks the
    /// service to also validate id-token signatures/claims where applicable.
    ///
    /// # Errors
    ///
    /// - rejected code → a client-kind error
    /// - upstream failure → a server-kind error
    fn exchange_code_for_token(
        &self,
        idp_id: &str,
        code: &str,
        validate: bool,
    ) -> impl Future<Output = Result<TokenResponse, ServiceError>> + Send;

    /// Fetch user info claims with an access token.
    ///
    /// # Errors
    ///
    /// - rejected token → a client-kind error
    /// - upstream failure → a server-kind error
    fn fetch_user_info(
        &self,
        idp_id: &str,
        access_token: &str,
    ) -> impl Future<Output = Result<HashMap<String, Value>, ServiceError>> + Send;

    /// Resolve the local user linked to a federated subject.
    ///
    /// # Errors
    ///
    /// - no linked user → user-not-found
    /// - store failure → a server-kind error
    fn get_internal_user(
        &self,
        sub: &str,
    ) -> impl Future<Output = Result<User, ServiceError>> + Send;
}
