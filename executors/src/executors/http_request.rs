//! HTTP-request executor.
//!
//! Executes one configured outbound HTTP call. Everything comes from node
//! properties: URL, method, headers, JSON body, response mapping, timeout,
//! and error-handling policy. String values in the URL, headers, and body
//! may reference flow state with `{{ context.<name> }}` placeholders.
//!
//! Configuration errors (missing URL, invalid method) always fail the flow;
//! non-2xx responses and transport failures fail it only when
//! `errorHandling.failOnError` is set, after bounded retries.

use std::time::Duration;

use serde_json::{Value, json};

use flowgate_core::constants::{property_keys, runtime_keys};
use flowgate_core::{
    Executor, ExecutorBase, ExecutorError, ExecutorKind, ExecutorResponse, InputDescriptor,
    NodeContext,
};

use crate::executors::base::{value_to_string, with_cancellation};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: i64 = 10;

/// Timeout bounds in seconds.
const TIMEOUT_BOUNDS: (i64, i64) = (1, 30);

/// Retry bounds.
const MAX_RETRY_COUNT: u64 = 3;
const MAX_RETRY_DELAY_MS: u64 = 5000;
const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// HTTP methods the executor accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Patch,
}

impl HttpMethod {
    fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "PUT" => Some(Self::Put),
            "POST" => Some(Self::Post),
            "DELETE" => Some(Self::Delete),
            "PATCH" => Some(Self::Patch),
            _ => None,
        }
    }

    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Put => reqwest::Method::PUT,
            Self::Post => reqwest::Method::POST,
            Self::Delete => reqwest::Method::DELETE,
            Self::Patch => reqwest::Method::PATCH,
        }
    }
}

/// Error-handling policy.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ErrorHandling {
    fail_on_error: bool,
    retry_count: u64,
    retry_delay_ms: u64,
}

impl Default for ErrorHandling {
    fn default() -> Self {
        Self {
            fail_on_error: false,
            retry_count: 0,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

/// Parsed node configuration.
#[derive(Debug, Clone)]
struct HttpNodeConfig {
    url: String,
    method: HttpMethod,
    headers: Vec<(String, String)>,
    body: Option<Value>,
    response_mapping: Vec<(String, String)>,
    timeout: Duration,
    error_handling: ErrorHandling,
}

impl HttpNodeConfig {
    /// Parse node properties; `Err` carries the client-visible reason.
    fn from_properties(ctx: &NodeContext) -> Result<Self, String> {
        let url = ctx
            .string_property(property_keys::URL)
            .ok_or_else(|| "url is required".to_string())?
            .to_string();

        let method = match ctx.string_property(property_keys::METHOD) {
            None => HttpMethod::Get,
            Some(m) => HttpMethod::parse(m).ok_or_else(|| "invalid HTTP method".to_string())?,
        };

        let headers = ctx
            .node_properties
            .get(property_keys::HEADERS)
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        let body = ctx
            .node_properties
            .get(property_keys::BODY)
            .filter(|v| v.is_object())
            .cloned();

        let response_mapping = ctx
            .node_properties
            .get(property_keys::RESPONSE_MAPPING)
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        let timeout_secs = ctx
            .node_properties
            .get(property_keys::TIMEOUT)
            .and_then(Value::as_i64)
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .clamp(TIMEOUT_BOUNDS.0, TIMEOUT_BOUNDS.1);

        let error_handling = ctx
            .node_properties
            .get(property_keys::ERROR_HANDLING)
            .and_then(Value::as_object)
            .map(|map| ErrorHandling {
                fail_on_error: map
                    .get("failOnError")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                retry_count: map
                    .get("retryCount")
                    .and_then(Value::as_u64)
                    .unwrap_or(0)
                    .min(MAX_RETRY_COUNT),
                retry_delay_ms: map
                    .get("retryDelay")
                    .and_then(Value::as_u64)
                    .unwrap_or(DEFAULT_RETRY_DELAY_MS)
                    .min(MAX_RETRY_DELAY_MS),
            })
            .unwrap_or_default();

        Ok(Self {
            url,
            method,
            headers,
            body,
            response_mapping,
            timeout: Duration::from_secs(timeout_secs.unsigned_abs()),
            error_handling,
        })
    }
}

/// One attempt's outcome.
enum SendOutcome {
    Response { status: u16, body: String },
    TransportError(String),
}

/// Config-driven outbound HTTP call executor.
#[derive(Debug, Clone)]
pub struct HttpRequestExecutor {
    base: ExecutorBase,
    client: reqwest::Client,
}

impl HttpRequestExecutor {
    /// Create a new HTTP-request executor with a fresh client.
    #[must_use]
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Create an executor over an existing client (shared pools).
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            base: ExecutorBase::new(
                ExecutorKind::HttpRequest.as_str(),
                ExecutorKind::HttpRequest,
                vec![],
                vec![],
            ),
            client,
        }
    }

    async fn send_once(
        &self,
        config: &HttpNodeConfig,
        url: &str,
        headers: &[(String, String)],
        body: Option<&Value>,
    ) -> SendOutcome {
        let mut request = self
            .client
            .request(config.method.as_reqwest(), url)
            .timeout(config.timeout);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        if let Some(body) = body {
            let has_content_type = headers
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case("content-type"));
            if !has_content_type {
                request = request.header("Content-Type", "application/json");
            }
            request = request.body(body.to_string());
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                match response.text().await {
                    Ok(body) => SendOutcome::Response { status, body },
                    Err(e) => SendOutcome::TransportError(e.to_string()),
                }
            }
            Err(e) => SendOutcome::TransportError(e.to_string()),
        }
    }

    /// Send with retries for transport failures and 5xx responses.
    async fn send_with_retries(
        &self,
        ctx: &NodeContext,
        config: &HttpNodeConfig,
        url: &str,
        headers: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<SendOutcome, ExecutorError> {
        let policy = &config.error_handling;
        let mut attempt: u64 = 0;
        loop {
            let outcome =
                with_cancellation(ctx, self.send_once(config, url, headers, body)).await?;
            let retryable = match &outcome {
                SendOutcome::Response { status, .. } => *status >= 500,
                SendOutcome::TransportError(_) => true,
            };
            if !retryable || attempt >= policy.retry_count {
                return Ok(outcome);
            }
            attempt += 1;
            tracing::debug!(
                flow_id = %ctx.flow_id,
                attempt,
                "retrying HTTP request after {}ms",
                policy.retry_delay_ms
            );
            with_cancellation(
                ctx,
                tokio::time::sleep(Duration::from_millis(policy.retry_delay_ms)),
            )
            .await?;
        }
    }
}

impl Default for HttpRequestExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for HttpRequestExecutor {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn kind(&self) -> ExecutorKind {
        self.base.kind()
    }

    fn default_inputs(&self) -> &[InputDescriptor] {
        self.base.default_inputs()
    }

    fn prerequisites(&self) -> &[InputDescriptor] {
        self.base.prerequisites()
    }

    async fn execute(&self, ctx: &NodeContext) -> Result<ExecutorResponse, ExecutorError> {
        let config = match HttpNodeConfig::from_properties(ctx) {
            Ok(config) => config,
            Err(reason) => return Ok(ExecutorResponse::failure(&reason)),
        };

        let url = resolve_placeholders(&config.url, ctx);
        let headers: Vec<(String, String)> = config
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), resolve_placeholders(value, ctx)))
            .collect();
        let body = config
            .body
            .as_ref()
            .map(|body| resolve_json_placeholders(body, ctx));

        let outcome = self
            .send_with_retries(ctx, &config, &url, &headers, body.as_ref())
            .await?;

        let (status, text) = match outcome {
            SendOutcome::Response { status, body } => (status, body),
            SendOutcome::TransportError(message) => {
                if config.error_handling.fail_on_error {
                    return Ok(ExecutorResponse::failure(&format!(
                        "HTTP request failed: {message}"
                    )));
                }
                tracing::warn!(flow_id = %ctx.flow_id, "HTTP request failed: {message}");
                return Ok(ExecutorResponse::complete());
            }
        };

        if !(200..300).contains(&status) {
            if config.error_handling.fail_on_error {
                return Ok(ExecutorResponse::failure(&format!(
                    "HTTP request failed with status {status}"
                )));
            }
            tracing::warn!(flow_id = %ctx.flow_id, status = %status, "HTTP request returned a non-2xx status");
        }

        let data: Value = serde_json::from_str(&text).unwrap_or_else(|_| json!({ "raw": text }));
        let envelope = json!({
            "response": {
                "status": status.to_string(),
                "data": data,
            }
        });

        let mut resp = ExecutorResponse::complete();
        for (local_key, path) in &config.response_mapping {
            match extract_path(&envelope, path) {
                Some(value) => resp.set_runtime(local_key, &value_to_string(value)),
                None => {
                    tracing::debug!(flow_id = %ctx.flow_id, path = %path, "response mapping path not found");
                }
            }
        }
        Ok(resp)
    }
}

/// Resolve every `{{ context.<name> }}` placeholder in `input`.
///
/// Unresolved placeholders (unknown names, names outside the `context.`
/// namespace, unterminated braces) are left intact. `userID` resolves only
/// from the authenticated user or runtime data, never from caller inputs.
fn resolve_placeholders(input: &str, ctx: &NodeContext) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let token = after[..end].trim();
        let resolved = token
            .strip_prefix("context.")
            .and_then(|name| resolve_context_value(name.trim(), ctx));
        match resolved {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

/// Resolve one placeholder name from flow state.
fn resolve_context_value(name: &str, ctx: &NodeContext) -> Option<String> {
    if name == runtime_keys::USER_ID {
        if let Some(user) = &ctx.authenticated_user {
            if !user.user_id.is_empty() {
                return Some(user.user_id.clone());
            }
        }
        return ctx
            .runtime_value(runtime_keys::USER_ID)
            .map(str::to_string);
    }
    ctx.runtime_value(name)
        .or_else(|| ctx.user_input(name))
        .map(str::to_string)
}

/// Recurse placeholder resolution into nested maps and lists.
fn resolve_json_placeholders(value: &Value, ctx: &NodeContext) -> Value {
    match value {
        Value::String(s) => Value::String(resolve_placeholders(s, ctx)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| resolve_json_placeholders(item, ctx))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), resolve_json_placeholders(v, ctx)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Walk a dotted path through a JSON value.
fn extract_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowgate_core::{AuthenticatedUser, FlowType};

    fn ctx() -> NodeContext {
        NodeContext::new("f1", FlowType::Authentication)
            .with_user_input("username", "newuser")
            .with_runtime_value("email", "test@example.com")
    }

    #[test]
    fn placeholders_resolve_from_runtime_then_inputs() {
        let resolved = resolve_placeholders("{{ context.email }}/{{ context.username }}", &ctx());
        assert_eq!(resolved, "test@example.com/newuser");
    }

    #[test]
    fn runtime_shadows_inputs() {
        let ctx = ctx().with_runtime_value("username", "stored");
        assert_eq!(resolve_placeholders("{{ context.username }}", &ctx), "stored");
    }

    #[test]
    fn user_id_never_resolves_from_inputs() {
        let ctx = NodeContext::new("f1", FlowType::Authentication)
            .with_user_input("userID", "spoofed");
        let input = "{{ context.userID }}";
        assert_eq!(resolve_placeholders(input, &ctx), input);

        let ctx = ctx.with_runtime_value("userID", "u1");
        assert_eq!(resolve_placeholders(input, &ctx), "u1");

        let ctx = ctx.with_authenticated_user(AuthenticatedUser {
            is_authenticated: true,
            user_id: "u2".to_string(),
            ..AuthenticatedUser::default()
        });
        assert_eq!(resolve_placeholders(input, &ctx), "u2");
    }

    #[test]
    fn unresolved_placeholders_stay_intact() {
        let input = "hello {{ context.missing }} and {{ not-context }} and {{ unterminated";
        assert_eq!(resolve_placeholders(input, &ctx()), input);
    }

    #[test]
    fn resolution_is_idempotent_without_placeholders() {
        let input = "plain text with } and { braces";
        assert_eq!(resolve_placeholders(input, &ctx()), input);
    }

    #[test]
    fn whitespace_inside_braces_is_tolerated() {
        assert_eq!(
            resolve_placeholders("{{context.email}} {{   context.email   }}", &ctx()),
            "test@example.com test@example.com"
        );
    }

    #[test]
    fn substitution_recurses_into_nested_structures() {
        let body = json!({
            "user": { "name": "{{ context.username }}" },
            "emails": ["{{ context.email }}", "static@example.com"],
            "count": 3,
        });
        let resolved = resolve_json_placeholders(&body, &ctx());
        assert_eq!(resolved["user"]["name"], "newuser");
        assert_eq!(resolved["emails"][0], "test@example.com");
        assert_eq!(resolved["count"], 3);
    }

    #[test]
    fn timeout_is_clamped() {
        for (configured, expected) in [(json!(0), 1), (json!(45), 30), (json!(15), 15)] {
            let ctx = NodeContext::new("f1", FlowType::Authentication)
                .with_node_property("url", json!("http://localhost/x"))
                .with_node_property("timeout", configured);
            let config = HttpNodeConfig::from_properties(&ctx).unwrap();
            assert_eq!(config.timeout, Duration::from_secs(expected));
        }
    }

    #[test]
    fn retry_policy_is_bounded() {
        let ctx = NodeContext::new("f1", FlowType::Authentication)
            .with_node_property("url", json!("http://localhost/x"))
            .with_node_property(
                "errorHandling",
                json!({"failOnError": true, "retryCount": 10, "retryDelay": 60000}),
            );
        let config = HttpNodeConfig::from_properties(&ctx).unwrap();
        assert!(config.error_handling.fail_on_error);
        assert_eq!(config.error_handling.retry_count, 3);
        assert_eq!(config.error_handling.retry_delay_ms, 5000);
    }

    #[test]
    fn missing_url_and_bad_method_are_config_errors() {
        let ctx = NodeContext::new("f1", FlowType::Authentication);
        assert_eq!(
            HttpNodeConfig::from_properties(&ctx).unwrap_err(),
            "url is required"
        );

        let ctx = ctx
            .with_node_property("url", json!("http://localhost/x"))
            .with_node_property("method", json!("TRACE"));
        assert_eq!(
            HttpNodeConfig::from_properties(&ctx).unwrap_err(),
            "invalid HTTP method"
        );
    }

    #[test]
    fn method_parse_is_case_insensitive() {
        assert_eq!(HttpMethod::parse("post"), Some(HttpMethod::Post));
        assert_eq!(HttpMethod::parse("DELETE"), Some(HttpMethod::Delete));
        assert_eq!(HttpMethod::parse("CONNECT"), None);
    }

    #[test]
    fn path_extraction_walks_the_envelope() {
        let envelope = json!({
            "response": {
                "status": "201",
                "data": { "user": { "id": "u1" } },
            }
        });
        assert_eq!(
            extract_path(&envelope, "response.data.user.id"),
            Some(&json!("u1"))
        );
        assert_eq!(extract_path(&envelope, "response.status"), Some(&json!("201")));
        assert_eq!(extract_path(&envelope, "response.data.missing"), None);
        assert_eq!(extract_path(&envelope, "body.data"), None);
    }
}
