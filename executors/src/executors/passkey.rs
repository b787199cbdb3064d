//! Passkey (WebAuthn) executor.
//!
//! Four modes selected by the node's `executor_mode` tag:
//!
//! | Mode | Effect |
//! |------|--------|
//! | `challenge` | open an authentication ceremony, surface request options |
//! | `verify` | finish authentication; wrong credentials invite a retry |
//! | `register_start` | open a registration ceremony, surface creation options |
//! | `register_finish` | persist the new credential |
//!
//! Ceremony legs are linked by a session token carried in runtime data and
//! cleared on consumption. The ceremony crypto lives behind
//! [`PasskeyService`].

use flowgate_core::constants::{input_keys, modes, property_keys, runtime_keys};
use flowgate_core::{
    Executor, ExecutorBase, ExecutorError, ExecutorKind, ExecutorResponse, InputDescriptor,
    NodeContext,
};

use crate::executors::base::{authenticated_user_from_record, with_cancellation};
use crate::services::{
    FinishAuthenticationRequest, FinishRegistrationRequest, PasskeyAssertion, PasskeyAttestation,
    PasskeyService, RegistrationOptions, RelyingParty, StartAuthenticationRequest,
    StartRegistrationRequest, UserService,
};

/// Additional-data key carrying `PublicKeyCredentialRequestOptions`.
pub const ADDITIONAL_REQUEST_OPTIONS: &str = "requestOptions";

/// Additional-data key carrying `PublicKeyCredentialCreationOptions`.
pub const ADDITIONAL_CREATION_OPTIONS: &str = "creationOptions";

/// Client-visible reason for a rejected assertion or attestation.
const INVALID_CREDENTIALS: &str = "invalid passkey credentials";

/// Sub-modes of the passkey executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PasskeyMode {
    Challenge,
    Verify,
    RegisterStart,
    RegisterFinish,
}

impl PasskeyMode {
    fn parse(tag: &str) -> Result<Self, ExecutorError> {
        match tag {
            modes::CHALLENGE => Ok(Self::Challenge),
            modes::VERIFY => Ok(Self::Verify),
            modes::REGISTER_START => Ok(Self::RegisterStart),
            modes::REGISTER_FINISH => Ok(Self::RegisterFinish),
            other => Err(ExecutorError::UnsupportedMode(other.to_string())),
        }
    }
}

/// Four-mode WebAuthn ceremony executor.
#[derive(Debug, Clone)]
pub struct PasskeyExecutor<U, P> {
    base: ExecutorBase,
    users: U,
    passkeys: P,
}

impl<U, P> PasskeyExecutor<U, P>
where
    U: UserService + Clone,
    P: PasskeyService + Clone,
{
    /// Create a new passkey executor.
    #[must_use]
    pub fn new(users: U, passkeys: P) -> Self {
        Self {
            base: ExecutorBase::new(
                ExecutorKind::Passkey.as_str(),
                ExecutorKind::Passkey,
                vec![],
                vec![InputDescriptor::string(runtime_keys::USER_ID)],
            ),
            users,
            passkeys,
        }
    }

    /// The relying party identity from node properties.
    ///
    /// `relyingPartyId` is mandatory in every mode; `relyingPartyName`
    /// defaults to the id. Type-mismatched values read as absent.
    fn relying_party(&self, ctx: &NodeContext) -> Result<RelyingParty, ExecutorError> {
        let id = ctx
            .string_property(property_keys::RELYING_PARTY_ID)
            .ok_or(ExecutorError::MissingProperty(
                property_keys::RELYING_PARTY_ID,
            ))?;
        let name = ctx
            .string_property(property_keys::RELYING_PARTY_NAME)
            .unwrap_or(id);
        Ok(RelyingParty {
            id: id.to_string(),
            name: name.to_string(),
        })
    }

    /// Registration ceremony tuning from node properties.
    fn registration_options(&self, ctx: &NodeContext) -> RegistrationOptions {
        let authenticator_selection = ctx
            .node_properties
            .get(property_keys::AUTHENTICATOR_SELECTION)
            .filter(|v| v.is_object())
            .cloned();
        let attestation = ctx
            .string_property(property_keys::ATTESTATION)
            .unwrap_or("none")
            .to_string();
        RegistrationOptions {
            authenticator_selection,
            attestation,
        }
    }

    /// Inputs from `identifiers` that the caller has not supplied yet.
    fn missing_inputs(&self, ctx: &NodeContext, identifiers: &[&str]) -> Vec<InputDescriptor> {
        identifiers
            .iter()
            .filter(|id| ctx.input_or_runtime(id).is_none())
            .map(|id| InputDescriptor::string(id))
            .collect()
    }

    async fn execute_challenge(
        &self,
        ctx: &NodeContext,
        user_id: &str,
    ) -> Result<ExecutorResponse, ExecutorError> {
        let request = StartAuthenticationRequest {
            user_id: user_id.to_string(),
            relying_party: self.relying_party(ctx)?,
        };
        match with_cancellation(ctx, self.passkeys.start_authentication(&request)).await? {
            Ok(started) => {
                if started.session_token.is_empty() {
                    return Err(ExecutorError::EmptyServiceResult("passkey session token"));
                }
                let mut resp = ExecutorResponse::complete();
                resp.set_additional(
                    ADDITIONAL_REQUEST_OPTIONS,
                    &started.request_options.to_string(),
                );
                resp.set_runtime(runtime_keys::PASSKEY_SESSION_TOKEN, &started.session_token);
                Ok(resp)
            }
            Err(e) if e.is_client() => Ok(ExecutorResponse::failure(&e.description)),
            Err(e) => Err(e.into()),
        }
    }

    async fn execute_verify(
        &self,
        ctx: &NodeContext,
        user_id: &str,
    ) -> Result<ExecutorResponse, ExecutorError> {
        let required = [
            input_keys::CREDENTIAL_ID,
            input_keys::CLIENT_DATA_JSON,
            input_keys::AUTHENTICATOR_DATA,
            input_keys::SIGNATURE,
        ];
        let missing = self.missing_inputs(ctx, &required);
        if !missing.is_empty() {
            return Ok(ExecutorResponse::input_required(missing));
        }
        let session_token = ctx
            .runtime_value(runtime_keys::PASSKEY_SESSION_TOKEN)
            .ok_or(ExecutorError::MissingSessionToken(
                runtime_keys::PASSKEY_SESSION_TOKEN,
            ))?;

        let request = FinishAuthenticationRequest {
            session_token: session_token.to_string(),
            assertion: PasskeyAssertion {
                credential_id: ctx
                    .input_or_runtime(input_keys::CREDENTIAL_ID)
                    .unwrap_or_default()
                    .to_string(),
                client_data_json: ctx
                    .input_or_runtime(input_keys::CLIENT_DATA_JSON)
                    .unwrap_or_default()
                    .to_string(),
                authenticator_data: ctx
                    .input_or_runtime(input_keys::AUTHENTICATOR_DATA)
                    .unwrap_or_default()
                    .to_string(),
                signature: ctx
                    .input_or_runtime(input_keys::SIGNATURE)
                    .unwrap_or_default()
                    .to_string(),
                user_handle: ctx
                    .input_or_runtime(input_keys::USER_HANDLE)
                    .map(str::to_string),
            },
        };

        match with_cancellation(ctx, self.passkeys.finish_authentication(&request)).await? {
            Ok(finished) => {
                let verified_id = if finished.user_id.is_empty() {
                    user_id.to_string()
                } else {
                    finished.user_id
                };
                let user = match with_cancellation(ctx, self.users.get_user(&verified_id)).await? {
                    Ok(user) => user,
                    Err(e) if e.is_client() => {
                        return Ok(ExecutorResponse::failure(&e.description));
                    }
                    Err(e) => return Err(e.into()),
                };
                let authenticated = authenticated_user_from_record(&user, true)?;
                let mut resp = ExecutorResponse::complete();
                resp.set_runtime(runtime_keys::USER_ID, &user.id);
                resp.set_runtime(runtime_keys::PASSKEY_SESSION_TOKEN, "");
                resp.set_authenticated_user(authenticated);
                Ok(resp)
            }
            Err(e) if e.is_client() => {
                // Wrong credentials end a ceremony, not the flow; invite the
                // caller to retry with fresh authenticator output.
                tracing::debug!(flow_id = %ctx.flow_id, error = %e, "passkey assertion rejected");
                let mut resp = ExecutorResponse::input_required(
                    required
                        .iter()
                        .map(|id| InputDescriptor::string(id))
                        .collect(),
                );
                resp.failure_reason = INVALID_CREDENTIALS.to_string();
                Ok(resp)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn execute_register_start(
        &self,
        ctx: &NodeContext,
        user_id: &str,
    ) -> Result<ExecutorResponse, ExecutorError> {
        let request = StartRegistrationRequest {
            user_id: user_id.to_string(),
            relying_party: self.relying_party(ctx)?,
            options: self.registration_options(ctx),
        };
        match with_cancellation(ctx, self.passkeys.start_registration(&request)).await? {
            Ok(started) => {
                if started.session_token.is_empty() {
                    return Err(ExecutorError::EmptyServiceResult("passkey session token"));
                }
                let mut resp = ExecutorResponse::complete();
                resp.set_additional(
                    ADDITIONAL_CREATION_OPTIONS,
                    &started.creation_options.to_string(),
                );
                resp.set_runtime(runtime_keys::PASSKEY_SESSION_TOKEN, &started.session_token);
                Ok(resp)
            }
            Err(e) if e.is_client() => Ok(ExecutorResponse::failure(&e.description)),
            Err(e) => Err(e.into()),
        }
    }

    async fn execute_register_finish(
        &self,
        ctx: &NodeContext,
        user_id: &str,
    ) -> Result<ExecutorResponse, ExecutorError> {
        // Validate the relying party config up front so a misconfigured node
        // faults in every mode, not only on the start leg.
        self.relying_party(ctx)?;

        let required = [
            input_keys::CREDENTIAL_ID,
            input_keys::CLIENT_DATA_JSON,
            input_keys::ATTESTATION_OBJECT,
        ];
        let missing = self.missing_inputs(ctx, &required);
        if !missing.is_empty() {
            return Ok(ExecutorResponse::input_required(missing));
        }
        let session_token = ctx
            .runtime_value(runtime_keys::PASSKEY_SESSION_TOKEN)
            .ok_or(ExecutorError::MissingSessionToken(
                runtime_keys::PASSKEY_SESSION_TOKEN,
            ))?;

        let credential_name = ctx
            .user_input(input_keys::CREDENTIAL_NAME)
            .map(str::to_string);
        let request = FinishRegistrationRequest {
            session_token: session_token.to_string(),
            attestation: PasskeyAttestation {
                credential_id: ctx
                    .input_or_runtime(input_keys::CREDENTIAL_ID)
                    .unwrap_or_default()
                    .to_string(),
                client_data_json: ctx
                    .input_or_runtime(input_keys::CLIENT_DATA_JSON)
                    .unwrap_or_default()
                    .to_string(),
                attestation_object: ctx
                    .input_or_runtime(input_keys::ATTESTATION_OBJECT)
                    .unwrap_or_default()
                    .to_string(),
            },
            credential_name: credential_name.clone(),
        };

        match with_cancellation(ctx, self.passkeys.finish_registration(&request)).await? {
            Ok(finished) => {
                let mut resp = ExecutorResponse::complete();
                resp.set_runtime(runtime_keys::PASSKEY_CREDENTIAL_ID, &finished.credential_id);
                if let Some(name) = credential_name {
                    resp.set_runtime(runtime_keys::PASSKEY_CREDENTIAL_NAME, &name);
                }
                resp.set_runtime(runtime_keys::PASSKEY_SESSION_TOKEN, "");

                // Adding a passkey during authentication attaches the user;
                // during registration the provisioning node does that later.
                if !ctx.flow_type.is_registration() {
                    let user = match with_cancellation(ctx, self.users.get_user(user_id)).await? {
                        Ok(user) => user,
                        Err(e) if e.is_client() => {
                            return Ok(ExecutorResponse::failure(&e.description));
                        }
                        Err(e) => return Err(e.into()),
                    };
                    resp.set_runtime(runtime_keys::USER_ID, &user.id);
                    resp.set_authenticated_user(authenticated_user_from_record(&user, true)?);
                }
                Ok(resp)
            }
            Err(e) if e.is_client() => {
                tracing::debug!(flow_id = %ctx.flow_id, error = %e, "passkey attestation rejected");
                Ok(ExecutorResponse::failure(INVALID_CREDENTIALS))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl<U, P> Executor for PasskeyExecutor<U, P>
where
    U: UserService + Clone,
    P: PasskeyService + Clone,
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
        let mode = PasskeyMode::parse(&ctx.executor_mode)?;

        let mut resp = ExecutorResponse::default();
        if !self.base.validate_prerequisites(ctx, &mut resp) {
            return Ok(resp);
        }
        let Some(user_id) = self.base.user_id_from_context(ctx) else {
            return Ok(ExecutorResponse::failure("prerequisite `userID` not met"));
        };

        match mode {
            PasskeyMode::Challenge => self.execute_challenge(ctx, &user_id).await,
            PasskeyMode::Verify => self.execute_verify(ctx, &user_id).await,
            PasskeyMode::RegisterStart => self.execute_register_start(ctx, &user_id).await,
            PasskeyMode::RegisterFinish => self.execute_register_finish(ctx, &user_id).await,
        }
    }
}
