//! SMS one-time-password executor.
//!
//! Two modes selected by the node's `executor_mode` tag:
//!
//! - `send` — resolve the destination mobile number, enforce the attempt
//!   limit, deliver a code, and persist the verification session token.
//! - `verify` — check the entered code against the session opened by the
//!   matching send and, in authentication flows, build the authenticated
//!   user from the stored record.
//!
//! The pre-declared prerequisite is a `mobileNumber` in runtime data. In
//! authentication flows the executor satisfies it itself by resolving a
//! user (context id, then mobile/username/email lookup) and reading the
//! stored `mobileNumber` attribute. In registration flows there is no
//! fallback: the number must already sit in runtime data or the step fails.

use std::collections::HashMap;

use flowgate_core::constants::{input_keys, modes, property_keys, runtime_keys};
use flowgate_core::{
    AuthenticatedUser, Executor, ExecutorBase, ExecutorError, ExecutorKind, ExecutorResponse,
    InputDescriptor, NodeContext,
};

use crate::executors::base::{authenticated_user_from_record, value_to_string, with_cancellation};
use crate::services::{OtpService, OtpVerificationStatus, SendOtpRequest, UserService,
    VerifyOtpRequest};

/// Maximum OTP deliveries per flow.
const MAX_ATTEMPTS: i64 = 3;

/// Sub-modes of the OTP executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OtpMode {
    Send,
    Verify,
}

impl OtpMode {
    fn parse(tag: &str) -> Result<Self, ExecutorError> {
        match tag {
            modes::SEND => Ok(Self::Send),
            modes::VERIFY => Ok(Self::Verify),
            other => Err(ExecutorError::UnsupportedMode(other.to_string())),
        }
    }
}

/// Two-mode SMS OTP authentication executor.
#[derive(Debug, Clone)]
pub struct SmsOtpExecutor<U, T> {
    base: ExecutorBase,
    users: U,
    otp: T,
}

impl<U, T> SmsOtpExecutor<U, T>
where
    U: UserService + Clone,
    T: OtpService + Clone,
{
    /// Create a new SMS OTP executor.
    #[must_use]
    pub fn new(users: U, otp: T) -> Self {
        Self {
            base: ExecutorBase::new(
                ExecutorKind::SmsOtp.as_str(),
                ExecutorKind::SmsOtp,
                vec![InputDescriptor::string(input_keys::OTP)],
                vec![InputDescriptor::string(runtime_keys::MOBILE_NUMBER)],
            ),
            users,
            otp,
        }
    }

    /// Resolve a user id: context first, then identifying-attribute lookups
    /// in `mobileNumber`, `username`, `email` order.
    async fn resolve_user_id(&self, ctx: &NodeContext) -> Result<Option<String>, ExecutorError> {
        if let Some(id) = self.base.user_id_from_context(ctx) {
            return Ok(Some(id));
        }
        for key in [
            input_keys::MOBILE_NUMBER,
            input_keys::USERNAME,
            runtime_keys::EMAIL,
        ] {
            let Some(value) = ctx.input_or_runtime(key) else {
                continue;
            };
            let mut attrs = HashMap::new();
            attrs.insert(key.to_string(), value.to_string());
            match with_cancellation(ctx, self.users.identify_user(&attrs)).await? {
                Ok(id) if !id.is_empty() => return Ok(Some(id)),
                Ok(_) => {}
                Err(e) if e.is_client() => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(None)
    }

    /// Satisfy the `mobileNumber` prerequisite.
    async fn resolve_mobile_number(
        &self,
        ctx: &NodeContext,
    ) -> Result<Option<String>, ExecutorError> {
        if let Some(mobile) = ctx.runtime_value(runtime_keys::MOBILE_NUMBER) {
            return Ok(Some(mobile.to_string()));
        }

        // Registration flows get no fallback: an unsatisfied prerequisite
        // fails immediately.
        if ctx.flow_type.is_registration() {
            return Ok(None);
        }

        // An already-authenticated user may enroll a number directly.
        if let Some(user) = &ctx.authenticated_user {
            if user.is_authenticated {
                if let Some(mobile) = ctx.user_input(input_keys::MOBILE_NUMBER) {
                    return Ok(Some(mobile.to_string()));
                }
            }
        }

        let Some(user_id) = self.resolve_user_id(ctx).await? else {
            return Ok(None);
        };
        let user = match with_cancellation(ctx, self.users.get_user(&user_id)).await? {
            Ok(user) => user,
            Err(e) if e.is_client() => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(user
            .parsed_attributes()?
            .get(runtime_keys::MOBILE_NUMBER)
            .map(value_to_string)
            .filter(|m| !m.is_empty()))
    }

    async fn execute_send(&self, ctx: &NodeContext) -> Result<ExecutorResponse, ExecutorError> {
        let Some(mobile) = self.resolve_mobile_number(ctx).await? else {
            return Ok(ExecutorResponse::failure(
                "prerequisite `mobileNumber` not met",
            ));
        };

        let mut attrs = HashMap::new();
        attrs.insert(runtime_keys::MOBILE_NUMBER.to_string(), mobile.clone());
        let user_id = match with_cancellation(ctx, self.users.identify_user(&attrs)).await? {
            Ok(id) if !id.is_empty() => Some(id),
            Ok(_) => None,
            Err(e) if e.is_user_not_found() => None,
            Err(e) if e.is_client() => return Ok(ExecutorResponse::failure(&e.description)),
            Err(e) => return Err(e.into()),
        };

        if ctx.flow_type.is_registration() {
            if user_id.is_some() {
                return Ok(ExecutorResponse::failure("User already exists"));
            }
        } else if user_id.is_none() {
            return Ok(ExecutorResponse::failure("User not found"));
        }

        let attempts: i64 = match ctx.runtime_value(runtime_keys::ATTEMPT_COUNT) {
            None => 0,
            Some(raw) => raw
                .parse()
                .map_err(|e: std::num::ParseIntError| ExecutorError::InvalidRuntimeValue {
                    key: runtime_keys::ATTEMPT_COUNT,
                    reason: e.to_string(),
                })?,
        };
        if attempts >= MAX_ATTEMPTS {
            return Ok(ExecutorResponse::failure("maximum OTP attempts reached"));
        }

        let sender_id = ctx
            .string_property(property_keys::SENDER_ID)
            .ok_or(ExecutorError::MissingProperty(property_keys::SENDER_ID))?;

        let request = SendOtpRequest {
            recipient: mobile.clone(),
            sender_id: sender_id.to_string(),
        };
        match with_cancellation(ctx, self.otp.send_otp(&request)).await? {
            Ok(sent) => {
                if sent.session_token.is_empty() {
                    return Err(ExecutorError::EmptyServiceResult("OTP session token"));
                }
                tracing::debug!(flow_id = %ctx.flow_id, "OTP delivered");
                let mut resp = ExecutorResponse::complete();
                resp.set_runtime(runtime_keys::OTP_SESSION_TOKEN, &sent.session_token);
                resp.set_runtime(runtime_keys::MOBILE_NUMBER, &mobile);
                if let Some(user_id) = user_id {
                    resp.set_runtime(runtime_keys::USER_ID, &user_id);
                }
                Ok(resp)
            }
            Err(e) if e.is_client() => Ok(ExecutorResponse::failure(&e.description)),
            Err(e) => Err(e.into()),
        }
    }

    async fn execute_verify(&self, ctx: &NodeContext) -> Result<ExecutorResponse, ExecutorError> {
        let Some(otp_code) = ctx.user_input(input_keys::OTP) else {
            return Ok(ExecutorResponse::failure("invalid OTP"));
        };
        let session_token = ctx
            .runtime_value(runtime_keys::OTP_SESSION_TOKEN)
            .ok_or(ExecutorError::MissingSessionToken(
                runtime_keys::OTP_SESSION_TOKEN,
            ))?;

        let request = VerifyOtpRequest {
            session_token: session_token.to_string(),
            otp_code: otp_code.to_string(),
        };
        match with_cancellation(ctx, self.otp.verify_otp(&request)).await? {
            Ok(verdict) => {
                if verdict.status == OtpVerificationStatus::Invalid {
                    return Ok(ExecutorResponse::failure("invalid OTP"));
                }
            }
            Err(e) if e.is_client() => return Ok(ExecutorResponse::failure("invalid OTP")),
            Err(e) => return Err(e.into()),
        }

        let mut resp = ExecutorResponse::complete();
        // The token is single-use; clear it on consumption.
        resp.set_runtime(runtime_keys::OTP_SESSION_TOKEN, "");

        if ctx.flow_type.is_registration() {
            let mut attributes = HashMap::new();
            if let Some(mobile) = ctx.runtime_value(runtime_keys::MOBILE_NUMBER) {
                attributes.insert(
                    runtime_keys::MOBILE_NUMBER.to_string(),
                    serde_json::Value::String(mobile.to_string()),
                );
            }
            resp.set_authenticated_user(AuthenticatedUser {
                is_authenticated: false,
                attributes,
                ..AuthenticatedUser::default()
            });
            return Ok(resp);
        }

        let user_id = ctx.runtime_value(runtime_keys::USER_ID).ok_or(
            ExecutorError::InvalidRuntimeValue {
                key: runtime_keys::USER_ID,
                reason: "missing after OTP send".to_string(),
            },
        )?;
        match with_cancellation(ctx, self.users.get_user(user_id)).await? {
            Ok(user) => {
                let authenticated = authenticated_user_from_record(&user, true)?;
                resp.set_runtime(runtime_keys::USER_ID, &user.id);
                resp.set_authenticated_user(authenticated);
                Ok(resp)
            }
            Err(e) if e.is_user_not_found() => Ok(ExecutorResponse::failure("User not found")),
            Err(e) if e.is_client() => Ok(ExecutorResponse::failure(&e.description)),
            Err(e) => Err(e.into()),
        }
    }
}

impl<U, T> Executor for SmsOtpExecutor<U, T>
where
    U: UserService + Clone,
    T: OtpService + Clone,
{
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
        match OtpMode::parse(&ctx.executor_mode)? {
            OtpMode::Send => self.execute_send(ctx).await,
            OtpMode::Verify => self.execute_verify(ctx).await,
        }
    }
}
