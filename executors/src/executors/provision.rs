//! Provisioning executor.
//!
//! The authoritative node for materializing a user record. It gathers
//! attributes from caller inputs, the resolved user, and runtime data
//! (later sources win), filters out reserved flow-state keys, creates the
//! user, and optionally assigns a group and a role.
//!
//! In authentication flows it only runs for federated users marked eligible
//! for just-in-time provisioning; otherwise it is a no-op.

use std::collections::HashMap;

use serde_json::Value;

use flowgate_core::constants::{
    is_identifying_attribute, is_reserved_attribute, property_keys, runtime_keys,
};
use flowgate_core::{
    Executor, ExecutorBase, ExecutorError, ExecutorKind, ExecutorResponse, InputDescriptor,
    NodeContext,
};

use crate::executors::base::{authenticated_user_from_record, value_to_string, with_cancellation};
use crate::services::{GroupMember, GroupService, GroupUpdate, RoleAssignment, RoleService, User,
    UserService};

/// Materializes a user record and assigns group/role memberships.
#[derive(Debug, Clone)]
pub struct ProvisioningExecutor<U, G, R> {
    base: ExecutorBase,
    users: U,
    groups: G,
    roles: R,
}

impl<U, G, R> ProvisioningExecutor<U, G, R>
where
    U: UserService + Clone,
    G: GroupService + Clone,
    R: RoleService + Clone,
{
    /// Create a new provisioning executor.
    #[must_use]
    pub fn new(users: U, groups: G, roles: R) -> Self {
        Self {
            base: ExecutorBase::new(
                ExecutorKind::Provision.as_str(),
                ExecutorKind::Provision,
                vec![],
                vec![],
            ),
            users,
            groups,
            roles,
        }
    }

    /// Declared inputs not satisfiable from inputs, runtime data, or the
    /// resolved user's attributes.
    fn unsatisfied_inputs(&self, ctx: &NodeContext) -> Vec<InputDescriptor> {
        let mut probe = ExecutorResponse::default();
        if self.base.has_required_inputs(ctx, &mut probe) {
            return Vec::new();
        }
        let attributes = ctx
            .authenticated_user
            .as_ref()
            .map(|user| &user.attributes);
        probe
            .inputs
            .into_iter()
            .filter(|input| {
                attributes.is_none_or(|attrs| !attrs.contains_key(&input.identifier))
            })
            .collect()
    }

    /// Merge inputs, resolved-user attributes, and runtime data (later
    /// sources win), then drop reserved flow-state keys.
    fn provisioning_attributes(&self, ctx: &NodeContext) -> HashMap<String, Value> {
        let mut merged: HashMap<String, Value> = HashMap::new();
        for (key, value) in &ctx.user_inputs {
            if !value.is_empty() {
                merged.insert(key.clone(), Value::String(value.clone()));
            }
        }
        if let Some(user) = &ctx.authenticated_user {
            for (key, value) in &user.attributes {
                merged.insert(key.clone(), value.clone());
            }
        }
        for (key, value) in &ctx.runtime_data {
            if !value.is_empty() {
                merged.insert(key.clone(), Value::String(value.clone()));
            }
        }
        merged.retain(|key, _| !is_reserved_attribute(key));
        merged
    }

    /// Attempt group and role assignment; returns `false` if either failed.
    ///
    /// Assignment errors never roll back the created user; details go to the
    /// log, the caller gets one combined reason.
    async fn assign_memberships(
        &self,
        ctx: &NodeContext,
        user_id: &str,
        user_type: &str,
    ) -> Result<bool, ExecutorError> {
        let mut assigned = true;

        if let Some(group_id) = ctx.string_property(property_keys::ASSIGN_GROUP) {
            let result = with_cancellation(ctx, self.groups.get_group(group_id)).await?;
            match result {
                Ok(group) => {
                    let mut members = group.members;
                    members.push(GroupMember {
                        id: user_id.to_string(),
                        member_type: "user".to_string(),
                    });
                    let update = GroupUpdate {
                        name: group.name,
                        description: group.description,
                        organization_unit_id: group.organization_unit_id,
                        members,
                    };
                    if let Err(e) =
                        with_cancellation(ctx, self.groups.update_group(group_id, &update)).await?
                    {
                        tracing::error!(flow_id = %ctx.flow_id, group_id, error = %e, "group assignment failed");
                        assigned = false;
                    }
                }
                Err(e) => {
                    tracing::error!(flow_id = %ctx.flow_id, group_id, error = %e, "group lookup failed");
                    assigned = false;
                }
            }
        }

        if let Some(role_id) = ctx.string_property(property_keys::ASSIGN_ROLE) {
            let assignments = [RoleAssignment {
                id: user_id.to_string(),
                assignee_type: user_type.to_string(),
            }];
            if let Err(e) =
                with_cancellation(ctx, self.roles.add_assignments(role_id, &assignments)).await?
            {
                tracing::error!(flow_id = %ctx.flow_id, role_id, error = %e, "role assignment failed");
                assigned = false;
            }
        }

        Ok(assigned)
    }
}

impl<U, G, R> Executor for ProvisioningExecutor<U, G, R>
where
    U: UserService + Clone,
    G: GroupService + Clone,
    R: RoleService + Clone,
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
        // Authentication flows only provision federated users the OAuth step
        // marked eligible.
        if !ctx.flow_type.is_registration()
            && !ctx.runtime_flag(runtime_keys::USER_ELIGIBLE_FOR_PROVISIONING)
        {
            return Ok(ExecutorResponse::complete());
        }

        let missing = self.unsatisfied_inputs(ctx);
        if !missing.is_empty() {
            return Ok(ExecutorResponse::input_required(missing));
        }

        let attributes = self.provisioning_attributes(ctx);

        // Refuse to double-provision a user that already exists.
        let identify_attrs: HashMap<String, String> = attributes
            .iter()
            .filter(|(key, _)| is_identifying_attribute(key))
            .map(|(key, value)| (key.clone(), value_to_string(value)))
            .collect();
        if !identify_attrs.is_empty() {
            match with_cancellation(ctx, self.users.identify_user(&identify_attrs)).await? {
                Ok(user_id) if !user_id.is_empty() => {
                    if ctx.flow_type.is_registration()
                        && ctx.runtime_flag(runtime_keys::SKIP_PROVISIONING)
                    {
                        // The federated step attached an existing user.
                        let mut resp = ExecutorResponse::complete();
                        resp.set_runtime(runtime_keys::USER_ID, &user_id);
                        return Ok(resp);
                    }
                    return Ok(ExecutorResponse::failure("User already exists"));
                }
                Ok(_) => {}
                Err(e) if e.is_user_not_found() => {}
                Err(e) if e.is_client() => return Ok(ExecutorResponse::failure(&e.description)),
                Err(e) => return Err(e.into()),
            }
        }

        let Some(ou_id) = ctx
            .runtime_value(runtime_keys::OU_ID)
            .or_else(|| ctx.runtime_value(runtime_keys::DEFAULT_OU_ID))
        else {
            tracing::error!(flow_id = %ctx.flow_id, "no organization unit resolved for provisioning");
            return Ok(ExecutorResponse::failure("Failed to create user"));
        };
        let Some(user_type) = ctx.runtime_value(runtime_keys::USER_TYPE) else {
            tracing::error!(flow_id = %ctx.flow_id, "no user type resolved for provisioning");
            return Ok(ExecutorResponse::failure("Failed to create user"));
        };

        let blob: serde_json::Map<String, Value> = attributes.into_iter().collect();
        let new_user = User {
            id: String::new(),
            organization_unit: ou_id.to_string(),
            user_type: user_type.to_string(),
            attributes: Value::Object(blob).to_string(),
        };

        let created = match with_cancellation(ctx, self.users.create_user(&new_user)).await? {
            Ok(user) => user,
            Err(e) if e.is_client() => return Ok(ExecutorResponse::failure(&e.description)),
            Err(e) => return Err(e.into()),
        };
        if created.id.is_empty() {
            return Ok(ExecutorResponse::failure(
                "Something went wrong while creating the user",
            ));
        }
        tracing::info!(flow_id = %ctx.flow_id, user_id = %created.id, "provisioned user");

        let assigned = self
            .assign_memberships(ctx, &created.id, &created.user_type)
            .await?;
        if !assigned {
            let mut resp = ExecutorResponse::failure("Failed to assign groups and roles");
            resp.set_runtime(runtime_keys::USER_ID, &created.id);
            return Ok(resp);
        }

        let is_authenticated = !ctx.flow_type.is_registration();
        let mut resp = ExecutorResponse::complete();
        resp.set_runtime(runtime_keys::USER_ID, &created.id);
        if is_authenticated {
            resp.set_runtime(runtime_keys::USER_AUTO_PROVISIONED, "true");
        }
        resp.set_authenticated_user(authenticated_user_from_record(&created, is_authenticated)?);
        Ok(resp)
    }
}
