//! Concrete flow executors.
//!
//! Each executor embeds [`ExecutorBase`](flowgate_core::ExecutorBase) for
//! the shared lifecycle behavior and owns clones of the services it needs.
//! Multi-mode executors dispatch on the node's `executor_mode` tag.

pub mod base;
pub mod basic_auth;
pub mod http_request;
pub mod identity_resolver;
pub mod oauth;
pub mod ou_create;
pub mod passkey;
pub mod provision;
pub mod sms_otp;

pub use basic_auth::BasicAuthExecutor;
pub use http_request::HttpRequestExecutor;
pub use identity_resolver::IdentityResolverExecutor;
pub use oauth::{GithubOAuthExecutor, GoogleOAuthExecutor, OAuthExecutor, OidcAuthExecutor};
pub use ou_create::OuCreateExecutor;
pub use passkey::PasskeyExecutor;
pub use provision::ProvisioningExecutor;
pub use sms_otp::SmsOtpExecutor;
