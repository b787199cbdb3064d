//! Integration tests for the passkey executor.

use serde_json::json;

use flowgate_core::constants::runtime_keys;
use flowgate_core::{Executor, ExecutorError, ExecutorStatus, FlowType, NodeContext};
use flowgate_executors::executors::PasskeyExecutor;
use flowgate_executors::mocks::{MockPasskeyService, MockUserService};
use flowgate_executors::services::User;

fn user_record(id: &str) -> User {
    User {
        id: id.to_string(),
        organization_unit: "ou-123".to_string(),
        user_type: "INTERNAL".to_string(),
        attributes: json!({"username": "testuser"}).to_string(),
    }
}

fn executor() -> PasskeyExecutor<MockUserService, MockPasskeyService> {
    PasskeyExecutor::new(
        MockUserService::new().with_user(user_record("u1")),
        MockPasskeyService::new(),
    )
}

fn executor_with(
    passkeys: MockPasskeyService,
) -> PasskeyExecutor<MockUserService, MockPasskeyService> {
    PasskeyExecutor::new(MockUserService::new().with_user(user_record("u1")), passkeys)
}

fn ctx(mode: &str) -> NodeContext {
    NodeContext::new("flow-1", FlowType::Authentication)
        .with_executor_mode(mode)
        .with_node_property("relyingPartyId", json!("example.com"))
        .with_runtime_value(runtime_keys::USER_ID, "u1")
}

fn assertion_inputs(ctx: NodeContext) -> NodeContext {
    ctx.with_user_input("credentialId", "cred-1")
        .with_user_input("clientDataJSON", "eyJjaGFsbGVuZ2UiOiJ4In0")
        .with_user_input("authenticatorData", "YXV0aGRhdGE")
        .with_user_input("signature", "c2lnbmF0dXJl")
}

#[tokio::test]
async fn challenge_then_verify_authenticates() {
    let executor = executor();

    // Challenge leg.
    let resp = executor.execute(&ctx("challenge")).await.unwrap();
    assert_eq!(resp.status, ExecutorStatus::Complete);
    let session_token = resp.runtime_data[runtime_keys::PASSKEY_SESSION_TOKEN].clone();
    assert!(!session_token.is_empty());
    let options: serde_json::Value =
        serde_json::from_str(&resp.additional_data["requestOptions"]).unwrap();
    assert_eq!(options["rpId"], "example.com");

    // Verify leg.
    let verify_ctx = assertion_inputs(ctx("verify"))
        .with_runtime_value(runtime_keys::PASSKEY_SESSION_TOKEN, &session_token);
    let resp = executor.execute(&verify_ctx).await.unwrap();

    assert_eq!(resp.status, ExecutorStatus::Complete);
    let user = resp.authenticated_user.unwrap();
    assert!(user.is_authenticated);
    assert_eq!(user.user_id, "u1");
    assert_eq!(resp.runtime_data[runtime_keys::PASSKEY_SESSION_TOKEN], "");
}

#[tokio::test]
async fn rejected_assertion_invites_a_retry() {
    let passkeys = MockPasskeyService::new();
    let executor = executor_with(passkeys.clone());

    let resp = executor.execute(&ctx("challenge")).await.unwrap();
    let session_token = resp.runtime_data[runtime_keys::PASSKEY_SESSION_TOKEN].clone();

    passkeys.set_reject_credentials(true);
    let verify_ctx = assertion_inputs(ctx("verify"))
        .with_runtime_value(runtime_keys::PASSKEY_SESSION_TOKEN, &session_token);
    let resp = executor.execute(&verify_ctx).await.unwrap();

    assert_eq!(resp.status, ExecutorStatus::UserInputRequired);
    assert_eq!(resp.failure_reason, "invalid passkey credentials");
    assert!(!resp.inputs.is_empty());
    assert!(resp.authenticated_user.is_none());
}

#[tokio::test]
async fn verify_without_session_token_is_a_server_fault() {
    let executor = executor();

    let verify_ctx = assertion_inputs(ctx("verify"));
    assert!(matches!(
        executor.execute(&verify_ctx).await,
        Err(ExecutorError::MissingSessionToken("passkeySessionToken"))
    ));
}

#[tokio::test]
async fn verify_asks_for_missing_assertion_fields() {
    let executor = executor();

    let verify_ctx = ctx("verify")
        .with_runtime_value(runtime_keys::PASSKEY_SESSION_TOKEN, "tok")
        .with_user_input("credentialId", "cred-1");
    let resp = executor.execute(&verify_ctx).await.unwrap();

    assert_eq!(resp.status, ExecutorStatus::UserInputRequired);
    let identifiers: Vec<_> = resp
        .inputs
        .iter()
        .map(|input| input.identifier.as_str())
        .collect();
    assert!(identifiers.contains(&"clientDataJSON"));
    assert!(identifiers.contains(&"authenticatorData"));
    assert!(identifiers.contains(&"signature"));
    assert!(!identifiers.contains(&"credentialId"));
}

#[tokio::test]
async fn registration_ceremony_persists_the_credential() {
    let executor = executor();

    let start_ctx = ctx("register_start")
        .with_node_property("relyingPartyName", json!("Example App"))
        .with_node_property("authenticatorSelection", json!({"userVerification": "required"}))
        .with_node_property("attestation", json!("direct"));
    let resp = executor.execute(&start_ctx).await.unwrap();
    assert_eq!(resp.status, ExecutorStatus::Complete);
    let session_token = resp.runtime_data[runtime_keys::PASSKEY_SESSION_TOKEN].clone();
    let options: serde_json::Value =
        serde_json::from_str(&resp.additional_data["creationOptions"]).unwrap();
    assert_eq!(options["rp"]["name"], "Example App");
    assert_eq!(options["attestation"], "direct");

    let finish_ctx = ctx("register_finish")
        .with_runtime_value(runtime_keys::PASSKEY_SESSION_TOKEN, &session_token)
        .with_user_input("credentialId", "cred-9")
        .with_user_input("clientDataJSON", "eyJjaGFsbGVuZ2UiOiJ4In0")
        .with_user_input("attestationObject", "b2JqZWN0")
        .with_user_input("credentialName", "Work laptop");
    let resp = executor.execute(&finish_ctx).await.unwrap();

    assert_eq!(resp.status, ExecutorStatus::Complete);
    assert_eq!(resp.runtime_data[runtime_keys::PASSKEY_CREDENTIAL_ID], "cred-9");
    assert_eq!(
        resp.runtime_data[runtime_keys::PASSKEY_CREDENTIAL_NAME],
        "Work laptop"
    );
    assert_eq!(resp.runtime_data[runtime_keys::PASSKEY_SESSION_TOKEN], "");
    // Adding a passkey mid-authentication attaches the user.
    assert!(resp.authenticated_user.unwrap().is_authenticated);
}

#[tokio::test]
async fn registration_flow_does_not_attach_a_user() {
    let passkeys = MockPasskeyService::new();
    let executor = executor_with(passkeys);

    let start_ctx = NodeContext::new("flow-1", FlowType::Registration)
        .with_executor_mode("register_start")
        .with_node_property("relyingPartyId", json!("example.com"))
        .with_runtime_value(runtime_keys::USER_ID, "u1");
    let resp = executor.execute(&start_ctx).await.unwrap();
    let session_token = resp.runtime_data[runtime_keys::PASSKEY_SESSION_TOKEN].clone();

    let finish_ctx = NodeContext::new("flow-1", FlowType::Registration)
        .with_executor_mode("register_finish")
        .with_node_property("relyingPartyId", json!("example.com"))
        .with_runtime_value(runtime_keys::USER_ID, "u1")
        .with_runtime_value(runtime_keys::PASSKEY_SESSION_TOKEN, &session_token)
        .with_user_input("credentialId", "cred-2")
        .with_user_input("clientDataJSON", "eyJjaGFsbGVuZ2UiOiJ4In0")
        .with_user_input("attestationObject", "b2JqZWN0");
    let resp = executor.execute(&finish_ctx).await.unwrap();

    assert_eq!(resp.status, ExecutorStatus::Complete);
    assert!(resp.authenticated_user.is_none());
    assert_eq!(resp.runtime_data[runtime_keys::PASSKEY_CREDENTIAL_ID], "cred-2");
}

#[tokio::test]
async fn missing_relying_party_id_is_a_server_fault() {
    let executor = executor();

    let ctx = NodeContext::new("flow-1", FlowType::Authentication)
        .with_executor_mode("challenge")
        .with_runtime_value(runtime_keys::USER_ID, "u1");
    assert!(matches!(
        executor.execute(&ctx).await,
        Err(ExecutorError::MissingProperty("relyingPartyId"))
    ));

    // Type-mismatched values read as absent.
    let ctx = ctx.with_node_property("relyingPartyId", json!(42));
    assert!(matches!(
        executor.execute(&ctx).await,
        Err(ExecutorError::MissingProperty("relyingPartyId"))
    ));
}

#[tokio::test]
async fn unresolvable_user_fails_the_ceremony() {
    let executor = executor();

    let ctx = NodeContext::new("flow-1", FlowType::Authentication)
        .with_executor_mode("challenge")
        .with_node_property("relyingPartyId", json!("example.com"));
    let resp = executor.execute(&ctx).await.unwrap();

    assert_eq!(resp.status, ExecutorStatus::Failure);
}

#[tokio::test]
async fn unknown_mode_is_a_server_fault() {
    let executor = executor();

    let bad = NodeContext::new("flow-1", FlowType::Authentication)
        .with_executor_mode("attest")
        .with_node_property("relyingPartyId", json!("example.com"))
        .with_runtime_value(runtime_keys::USER_ID, "u1");
    assert!(matches!(
        executor.execute(&bad).await,
        Err(ExecutorError::UnsupportedMode(_))
    ));
}
