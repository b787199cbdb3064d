//! Organization unit creation executor.
//!
//! Registration-only: creates an organization unit from caller-supplied
//! name and handle, and hands its id to the provisioning node through
//! runtime data.

use flowgate_core::constants::{input_keys, runtime_keys};
use flowgate_core::{
    Executor, ExecutorBase, ExecutorError, ExecutorKind, ExecutorResponse, InputDescriptor,
    NodeContext,
};

use crate::executors::base::with_cancellation;
use crate::services::{CreateOrganizationUnitRequest, OrganizationUnitService};

/// Creates an organization unit during registration.
#[derive(Debug, Clone)]
pub struct OuCreateExecutor<Q> {
    base: ExecutorBase,
    org_units: Q,
}

impl<Q> OuCreateExecutor<Q>
where
    Q: OrganizationUnitService + Clone,
{
    /// Create a new OU-creation executor.
    #[must_use]
    pub fn new(org_units: Q) -> Self {
        Self {
            base: ExecutorBase::new(
                ExecutorKind::OuCreate.as_str(),
                ExecutorKind::OuCreate,
                vec![
                    InputDescriptor::string(input_keys::OU_NAME),
                    InputDescriptor::string(input_keys::OU_HANDLE),
                ],
                vec![],
            ),
            org_units,
        }
    }
}

impl<Q> Executor for OuCreateExecutor<Q>
where
    Q: OrganizationUnitService + Clone,
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
        // Organization units only come into existence through registration
        // journeys; anywhere else this node just asks for inputs it will
        // never act on.
        if !ctx.flow_type.is_registration() {
            return Ok(ExecutorResponse::input_required(
                self.base.default_inputs().to_vec(),
            ));
        }

        let mut resp = ExecutorResponse::default();
        if !self.base.has_required_inputs(ctx, &mut resp) {
            return Ok(resp);
        }

        let request = CreateOrganizationUnitRequest {
            name: ctx
                .input_or_runtime(input_keys::OU_NAME)
                .unwrap_or_default()
                .to_string(),
            handle: ctx
                .input_or_runtime(input_keys::OU_HANDLE)
                .unwrap_or_default()
                .to_string(),
        };

        match with_cancellation(ctx, self.org_units.create_organization_unit(&request)).await? {
            Ok(unit) => {
                if unit.id.is_empty() {
                    return Err(ExecutorError::EmptyServiceResult("organization unit id"));
                }
                tracing::info!(flow_id = %ctx.flow_id, ou_id = %unit.id, "created organization unit");
                let mut resp = ExecutorResponse::complete();
                resp.set_runtime(runtime_keys::OU_ID, &unit.id);
                Ok(resp)
            }
            Err(e) if e.is_conflict() => Ok(ExecutorResponse::failure(&format!(
                "Organization unit name or handle already exists: {}",
                e.description
            ))),
            Err(e) if e.is_client() => Ok(ExecutorResponse::failure(&e.description)),
            Err(e) => Err(e.into()),
        }
    }
}
