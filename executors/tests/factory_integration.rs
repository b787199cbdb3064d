//! Integration tests for the flow factory and environment wiring.

use flowgate_core::{Executor, ExecutorKind, ExecutorStatus, FlowType, NodeContext};
use flowgate_executors::mocks::{
    MockCredentialService, MockGroupService, MockIdentityProviderService, MockOAuthClientService,
    MockObservabilityService, MockOrganizationUnitService, MockOtpService, MockPasskeyService,
    MockRoleService, MockUserSchemaService, MockUserService,
};
use flowgate_executors::services::NodeEventStatus;
use flowgate_executors::{FlowEnvironment, build_executor, build_observed_executor};

type TestEnvironment = FlowEnvironment<
    MockUserService,
    MockCredentialService,
    MockOAuthClientService,
    MockIdentityProviderService,
    MockUserSchemaService,
    MockOtpService,
    MockPasskeyService,
    MockGroupService,
    MockRoleService,
    MockOrganizationUnitService,
    MockObservabilityService,
>;

fn environment() -> TestEnvironment {
    FlowEnvironment::new(
        MockUserService::new(),
        MockCredentialService::new(),
        MockOAuthClientService::new(),
        MockIdentityProviderService::new(),
        MockUserSchemaService::new(),
        MockOtpService::new(),
        MockPasskeyService::new(),
        MockGroupService::new(),
        MockRoleService::new(),
        MockOrganizationUnitService::new(),
        MockObservabilityService::new(),
    )
}

#[test]
fn every_kind_is_constructible() {
    let env = environment();
    for kind in [
        ExecutorKind::IdentityResolver,
        ExecutorKind::BasicAuth,
        ExecutorKind::SmsOtp,
        ExecutorKind::Oidc,
        ExecutorKind::Github,
        ExecutorKind::Google,
        ExecutorKind::Passkey,
        ExecutorKind::HttpRequest,
        ExecutorKind::OuCreate,
        ExecutorKind::Provision,
    ] {
        let executor = build_executor(kind, &env);
        assert_eq!(executor.kind(), kind);
        assert_eq!(executor.name(), kind.as_str());
    }
}

#[tokio::test]
async fn the_variant_dispatches_execution() {
    let env = environment();
    let executor = build_executor(ExecutorKind::HttpRequest, &env);

    // No `url` property configured: the HTTP executor's config failure must
    // surface through the variant dispatch.
    let ctx = NodeContext::new("flow-1", FlowType::Authentication);
    let resp = executor.execute(&ctx).await.unwrap();

    assert_eq!(resp.status, ExecutorStatus::Failure);
    assert_eq!(resp.failure_reason, "url is required");
}

#[tokio::test]
async fn observed_executors_publish_to_the_environment_sink() {
    let env = environment();
    let executor = build_observed_executor(ExecutorKind::BasicAuth, &env);

    let ctx = NodeContext::new("flow-1", FlowType::Authentication)
        .with_app_id("app-1")
        .with_node_id("node-1");
    let resp = executor.execute(&ctx).await.unwrap();
    assert_eq!(resp.status, ExecutorStatus::UserInputRequired);

    let events = env.observability.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].status, NodeEventStatus::Pending);
    assert_eq!(events[1].executor, "basic_auth");
}
