//! Integration tests for the OAuth/OIDC executor family.

use serde_json::json;

use flowgate_core::constants::runtime_keys;
use flowgate_core::{
    Application, Executor, ExecutorError, ExecutorStatus, FlowType, NodeContext, ServiceError,
};
use flowgate_executors::executors::{GithubOAuthExecutor, OidcAuthExecutor};
use flowgate_executors::mocks::{
    MockIdentityProviderService, MockOAuthClientService, MockUserSchemaService,
};
use flowgate_executors::services::{IdentityProvider, TokenResponse, User, UserSchema};

type TestExecutor =
    OidcAuthExecutor<MockOAuthClientService, MockIdentityProviderService, MockUserSchemaService>;

fn idp_registry() -> MockIdentityProviderService {
    MockIdentityProviderService::new().with_idp(IdentityProvider {
        id: "idp1".to_string(),
        name: "Example IdP".to_string(),
        description: "test provider".to_string(),
    })
}

fn executor(oauth: MockOAuthClientService) -> TestExecutor {
    OidcAuthExecutor::new(oauth, idp_registry(), MockUserSchemaService::new())
}

fn executor_with_schemas(
    oauth: MockOAuthClientService,
    schemas: MockUserSchemaService,
) -> TestExecutor {
    OidcAuthExecutor::new(oauth, idp_registry(), schemas)
}

fn auth_ctx() -> NodeContext {
    NodeContext::new("flow-1", FlowType::Authentication)
        .with_node_property("idpId", json!("idp1"))
}

#[tokio::test]
async fn initiate_redirects_to_the_provider() {
    let oauth = MockOAuthClientService::new()
        .with_authorize_url("https://idp.example/authorize?client_id=abc");
    let executor = executor(oauth);

    let resp = executor.execute(&auth_ctx()).await.unwrap();

    assert_eq!(resp.status, ExecutorStatus::ExternalRedirection);
    assert!(resp.redirect_url.starts_with("https://idp.example/authorize"));
    assert_eq!(resp.additional_data["idpName"], "Example IdP");
}

#[tokio::test]
async fn missing_idp_property_is_a_server_fault() {
    let executor = executor(MockOAuthClientService::new());
    let ctx = NodeContext::new("flow-1", FlowType::Authentication);

    assert!(matches!(
        executor.execute(&ctx).await,
        Err(ExecutorError::MissingProperty("idpId"))
    ));
}

#[tokio::test]
async fn callback_authenticates_a_linked_user() {
    let oauth = MockOAuthClientService::new()
        .with_claim("sub", json!("s1"))
        .with_claim("email", json!("test@example.com"))
        .with_claim("name", json!("Test User"))
        .with_internal_user(
            "s1",
            User {
                id: "u1".to_string(),
                organization_unit: "ou-123".to_string(),
                user_type: "INTERNAL".to_string(),
                attributes: json!({"username": "testuser"}).to_string(),
            },
        );
    let executor = executor(oauth);

    let ctx = auth_ctx().with_user_input("code", "auth-code");
    let resp = executor.execute(&ctx).await.unwrap();

    assert_eq!(resp.status, ExecutorStatus::Complete);
    let user = resp.authenticated_user.unwrap();
    assert!(user.is_authenticated);
    assert_eq!(user.user_id, "u1");
    // Userinfo claims are merged in, identifier claims are skipped.
    assert_eq!(user.attributes["name"], "Test User");
    assert!(!user.attributes.contains_key("sub"));
    assert_eq!(resp.runtime_data[runtime_keys::EMAIL], "test@example.com");
}

#[tokio::test]
async fn callback_without_local_user_fails_by_default() {
    let oauth = MockOAuthClientService::new().with_claim("sub", json!("s1"));
    let executor = executor(oauth);

    let ctx = auth_ctx().with_user_input("code", "auth-code");
    let resp = executor.execute(&ctx).await.unwrap();

    assert_eq!(resp.status, ExecutorStatus::Failure);
    assert_eq!(resp.failure_reason, "User not found");
}

#[tokio::test]
async fn auto_provisioning_marks_eligibility_with_a_single_schema() {
    let oauth = MockOAuthClientService::new()
        .with_claim("sub", json!("s1"))
        .with_claim("email", json!("new@example.com"));
    let schemas = MockUserSchemaService::new().with_schema(UserSchema {
        name: "Customer".to_string(),
        organization_unit_id: "ou-99".to_string(),
        allow_self_registration: true,
    });
    let executor = executor_with_schemas(oauth, schemas);

    let ctx = auth_ctx()
        .with_application(Application {
            allowed_user_types: vec!["Customer".to_string()],
        })
        .with_node_property("allowAuthenticationWithoutLocalUser", json!(true))
        .with_user_input("code", "auth-code");
    let resp = executor.execute(&ctx).await.unwrap();

    assert_eq!(resp.status, ExecutorStatus::Complete);
    assert_eq!(
        resp.runtime_data[runtime_keys::USER_ELIGIBLE_FOR_PROVISIONING],
        "true"
    );
    assert_eq!(resp.runtime_data[runtime_keys::SUB], "s1");
    assert_eq!(resp.runtime_data[runtime_keys::USER_TYPE], "Customer");
    assert_eq!(resp.runtime_data[runtime_keys::DEFAULT_OU_ID], "ou-99");
    assert!(!resp.authenticated_user.unwrap().is_authenticated);
}

#[tokio::test]
async fn auto_provisioning_requires_an_unambiguous_schema() {
    let oauth = MockOAuthClientService::new().with_claim("sub", json!("s1"));
    let schemas = MockUserSchemaService::new()
        .with_schema(UserSchema {
            name: "Customer".to_string(),
            organization_unit_id: "ou-1".to_string(),
            allow_self_registration: true,
        })
        .with_schema(UserSchema {
            name: "Partner".to_string(),
            organization_unit_id: "ou-2".to_string(),
            allow_self_registration: true,
        });
    let executor = executor_with_schemas(oauth, schemas);

    let ctx = auth_ctx()
        .with_application(Application {
            allowed_user_types: vec!["Customer".to_string(), "Partner".to_string()],
        })
        .with_node_property("allowAuthenticationWithoutLocalUser", json!(true))
        .with_user_input("code", "auth-code");
    let resp = executor.execute(&ctx).await.unwrap();

    assert_eq!(resp.status, ExecutorStatus::Failure);
    assert_eq!(resp.failure_reason, "cannot provision automatically");
}

#[tokio::test]
async fn registration_hands_fresh_subjects_to_provisioning() {
    let oauth = MockOAuthClientService::new()
        .with_claim("sub", json!("s1"))
        .with_claim("email", json!("new@example.com"));
    let executor = executor(oauth);

    let ctx = NodeContext::new("flow-1", FlowType::Registration)
        .with_node_property("idpId", json!("idp1"))
        .with_user_input("code", "auth-code");
    let resp = executor.execute(&ctx).await.unwrap();

    assert_eq!(resp.status, ExecutorStatus::Complete);
    assert_eq!(resp.runtime_data[runtime_keys::SUB], "s1");
    let user = resp.authenticated_user.unwrap();
    assert!(!user.is_authenticated);
    assert_eq!(user.attributes["email"], "new@example.com");
}

#[tokio::test]
async fn registration_against_existing_user_needs_the_policy_flag() {
    let oauth = MockOAuthClientService::new()
        .with_claim("sub", json!("s1"))
        .with_internal_user(
            "s1",
            User {
                id: "u1".to_string(),
                organization_unit: "ou-123".to_string(),
                user_type: "INTERNAL".to_string(),
                attributes: "{}".to_string(),
            },
        );

    let executor = executor(oauth.clone());
    let ctx = NodeContext::new("flow-1", FlowType::Registration)
        .with_node_property("idpId", json!("idp1"))
        .with_user_input("code", "auth-code");
    let resp = executor.execute(&ctx).await.unwrap();
    assert_eq!(resp.status, ExecutorStatus::Failure);
    assert_eq!(resp.failure_reason, "User already exists");

    let executor = executor_with_schemas(oauth, MockUserSchemaService::new());
    let ctx = NodeContext::new("flow-1", FlowType::Registration)
        .with_node_property("idpId", json!("idp1"))
        .with_node_property("allowRegistrationWithExistingUser", json!(true))
        .with_user_input("code", "auth-code");
    let resp = executor.execute(&ctx).await.unwrap();
    assert_eq!(resp.status, ExecutorStatus::Complete);
    assert!(resp.authenticated_user.unwrap().is_authenticated);
    assert_eq!(resp.runtime_data[runtime_keys::SKIP_PROVISIONING], "true");
}

#[tokio::test]
async fn rejected_code_is_a_client_failure() {
    let oauth = MockOAuthClientService::new();
    oauth.set_exchange_failure(Some(ServiceError::client(
        "invalid-request",
        "Bad code",
        "authorization code expired",
    )));
    let executor = executor(oauth);

    let ctx = auth_ctx().with_user_input("code", "stale");
    let resp = executor.execute(&ctx).await.unwrap();

    assert_eq!(resp.status, ExecutorStatus::Failure);
    assert!(resp.failure_reason.starts_with("Failed to exchange authorization code"));
}

#[tokio::test]
async fn upstream_exchange_failure_aborts_the_flow() {
    let oauth = MockOAuthClientService::new();
    oauth.set_exchange_failure(Some(ServiceError::server(
        "upstream-error",
        "IdP down",
        "token endpoint unreachable",
    )));
    let executor = executor(oauth);

    let ctx = auth_ctx().with_user_input("code", "auth-code");
    assert!(matches!(
        executor.execute(&ctx).await,
        Err(ExecutorError::Service(_))
    ));
}

#[tokio::test]
async fn scopeless_tokens_are_rejected() {
    let oauth = MockOAuthClientService::new().with_token(TokenResponse {
        access_token: "tok".to_string(),
        token_type: "Bearer".to_string(),
        scope: String::new(),
        ..TokenResponse::default()
    });
    let executor = executor(oauth);

    let ctx = auth_ctx().with_user_input("code", "auth-code");
    let resp = executor.execute(&ctx).await.unwrap();
    assert_eq!(resp.status, ExecutorStatus::Failure);
}

#[tokio::test]
async fn missing_sub_claim_is_a_failure() {
    let oauth = MockOAuthClientService::new().with_claim("email", json!("x@example.com"));
    let executor = executor(oauth);

    let ctx = auth_ctx().with_user_input("code", "auth-code");
    let resp = executor.execute(&ctx).await.unwrap();
    assert_eq!(resp.status, ExecutorStatus::Failure);
}

#[tokio::test]
async fn provider_error_callback_fails_the_flow() {
    let executor = executor(MockOAuthClientService::new());

    let ctx = auth_ctx()
        .with_user_input("error", "access_denied")
        .with_user_input("error_description", "User denied access");
    let resp = executor.execute(&ctx).await.unwrap();

    assert_eq!(resp.status, ExecutorStatus::Failure);
    assert!(resp.failure_reason.contains("User denied access"));
}

#[tokio::test]
async fn github_variant_shares_the_oauth_core() {
    let oauth = MockOAuthClientService::new();
    let executor = GithubOAuthExecutor::new(oauth, idp_registry(), MockUserSchemaService::new());

    assert_eq!(executor.name(), "github");
    let resp = executor.execute(&auth_ctx()).await.unwrap();
    assert_eq!(resp.status, ExecutorStatus::ExternalRedirection);
}
