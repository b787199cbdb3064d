//! Integration tests for the observability adapter.

use serde_json::json;

use flowgate_core::constants::runtime_keys;
use flowgate_core::{Executor, ExecutorStatus, FlowType, NodeContext, ServiceError};
use flowgate_executors::executors::{BasicAuthExecutor, SmsOtpExecutor};
use flowgate_executors::mocks::{
    MockCredentialService, MockObservabilityService, MockOtpService, MockUserService,
};
use flowgate_executors::observability::Observed;
use flowgate_executors::services::{NodeEventStatus, NodeEventType, User};

fn seeded_user() -> User {
    User {
        id: "u1".to_string(),
        organization_unit: "ou-123".to_string(),
        user_type: "INTERNAL".to_string(),
        attributes: json!({"username": "testuser", "mobileNumber": "+1234567890"}).to_string(),
    }
}

fn basic_auth() -> BasicAuthExecutor<MockUserService, MockCredentialService> {
    BasicAuthExecutor::new(
        MockUserService::new().with_user(seeded_user()),
        MockCredentialService::new().with_credentials("testuser", "password123", seeded_user()),
    )
}

fn auth_ctx(password: &str) -> NodeContext {
    NodeContext::new("flow-1", FlowType::Authentication)
        .with_app_id("app-1")
        .with_node_id("node-1")
        .with_user_input("username", "testuser")
        .with_user_input("password", password)
}

#[tokio::test]
async fn success_emits_started_and_completed() {
    let sink = MockObservabilityService::new();
    let executor = Observed::new(basic_auth(), sink.clone());

    let resp = executor.execute(&auth_ctx("password123")).await.unwrap();
    assert_eq!(resp.status, ExecutorStatus::Complete);

    let events = sink.events();
    assert_eq!(events.len(), 2);

    assert_eq!(events[0].event_type, NodeEventType::NodeStarted);
    assert_eq!(events[0].status, NodeEventStatus::InProgress);
    assert_eq!(events[0].flow_id, "flow-1");
    assert_eq!(events[0].app_id, "app-1");
    assert_eq!(events[0].node_id, "node-1");
    assert_eq!(events[0].executor, "basic_auth");

    assert_eq!(events[1].event_type, NodeEventType::NodeCompleted);
    assert_eq!(events[1].status, NodeEventStatus::Success);
    assert_eq!(events[1].user_id.as_deref(), Some("u1"));
}

#[tokio::test]
async fn client_failures_emit_node_failed() {
    let sink = MockObservabilityService::new();
    let executor = Observed::new(basic_auth(), sink.clone());

    let resp = executor.execute(&auth_ctx("wrong")).await.unwrap();
    assert_eq!(resp.status, ExecutorStatus::Failure);

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].event_type, NodeEventType::NodeFailed);
    assert_eq!(events[1].status, NodeEventStatus::Failure);
    assert_eq!(events[1].data["errorType"], "client_error");
    assert!(
        events[1].data["failureReason"]
            .as_str()
            .unwrap()
            .starts_with("Failed to authenticate user")
    );
}

#[tokio::test]
async fn server_faults_emit_node_failed_and_propagate() {
    let users = MockUserService::new();
    users.set_failure(Some(ServiceError::server(
        "upstream-error",
        "boom",
        "store down",
    )));
    let sink = MockObservabilityService::new();
    let executor = Observed::new(
        BasicAuthExecutor::new(users, MockCredentialService::new()),
        sink.clone(),
    );

    let result = executor.execute(&auth_ctx("password123")).await;
    assert!(result.is_err());

    // The wrapper still published both lifecycle events.
    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].event_type, NodeEventType::NodeFailed);
    assert_eq!(events[1].data["errorType"], "server_error");
}

#[tokio::test]
async fn completed_otp_send_reads_as_pending() {
    let sink = MockObservabilityService::new();
    let executor = Observed::new(
        SmsOtpExecutor::new(
            MockUserService::new().with_user(seeded_user()),
            MockOtpService::new(),
        ),
        sink.clone(),
    );

    let ctx = NodeContext::new("flow-1", FlowType::Authentication)
        .with_executor_mode("send")
        .with_node_property("senderId", json!("sender-1"))
        .with_runtime_value(runtime_keys::MOBILE_NUMBER, "+1234567890");
    let resp = executor.execute(&ctx).await.unwrap();
    assert_eq!(resp.status, ExecutorStatus::Complete);

    let events = sink.events();
    assert_eq!(events[1].event_type, NodeEventType::NodeCompleted);
    assert_eq!(events[1].status, NodeEventStatus::Pending);
}

#[tokio::test]
async fn disabled_sinks_see_nothing() {
    let sink = MockObservabilityService::disabled();
    let executor = Observed::new(basic_auth(), sink.clone());

    let resp = executor.execute(&auth_ctx("password123")).await.unwrap();
    assert_eq!(resp.status, ExecutorStatus::Complete);
    assert!(sink.events().is_empty());
}

#[tokio::test]
async fn publish_failures_never_change_the_outcome() {
    let sink = MockObservabilityService::new();
    sink.set_failure(Some(ServiceError::server(
        "upstream-error",
        "sink down",
        "event pipeline unavailable",
    )));
    let executor = Observed::new(basic_auth(), sink.clone());

    let resp = executor.execute(&auth_ctx("password123")).await.unwrap();
    assert_eq!(resp.status, ExecutorStatus::Complete);
    assert!(resp.authenticated_user.unwrap().is_authenticated);
    assert!(sink.events().is_empty());
}
