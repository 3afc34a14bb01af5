//! Plan and apply
//!
//! Drives the resource handlers the way a Terraform host would:
//!
//! 1. `refresh` reads every resource recorded in state and drops those that
//!    no longer exist remotely.
//! 2. `plan` compares the manifest with state. It makes no remote calls.
//! 3. `apply` performs the planned actions one at a time, deletions first,
//!    recording each completed step in state.
//!
//! A change to a `force_new` attribute plans a `Replace`, which deletes the
//! old object before creating the new one.

use crate::error::ProviderError;
use crate::manifest::Manifest;
use crate::provider::Provider;
use crate::resource_data::ResourceData;
use crate::schema::AttributeChange;
use crate::state::{resource_address, ResourceState, State};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};

/// What apply will do to one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    NoOp,
    Create,
    Update,
    Replace,
    Delete,
}

impl Action {
    fn symbol(self) -> &'static str {
        match self {
            Action::NoOp => " ",
            Action::Create => "+",
            Action::Update => "~",
            Action::Replace => "-/+",
            Action::Delete => "-",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::NoOp => "no changes",
            Action::Create => "create",
            Action::Update => "update in-place",
            Action::Replace => "replace",
            Action::Delete => "destroy",
        };
        f.write_str(name)
    }
}

/// Planned action for one resource address
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedChange {
    pub address: String,
    pub resource_type: String,
    pub action: Action,
    /// Normalized configuration; `None` for deletions
    pub config: Option<Value>,
    pub changes: Vec<AttributeChange>,
}

impl fmt::Display for PlannedChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {} ({})", self.action.symbol(), self.address, self.action)?;
        for change in &self.changes {
            write!(f, "      {}: {} => {}", change.path, change.old, change.new)?;
            if change.force_new {
                write!(f, " (forces replacement)")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Ordered list of actions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    pub changes: Vec<PlannedChange>,
}

/// Counts of objects created, changed and destroyed by a plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanSummary {
    pub add: usize,
    pub change: usize,
    pub destroy: usize,
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to add, {} to change, {} to destroy.",
            self.add, self.change, self.destroy
        )
    }
}

impl Plan {
    pub fn has_changes(&self) -> bool {
        self.changes.iter().any(|c| c.action != Action::NoOp)
    }

    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary::default();
        for change in &self.changes {
            match change.action {
                Action::NoOp => {}
                Action::Create => summary.add += 1,
                Action::Update => summary.change += 1,
                Action::Replace => {
                    summary.add += 1;
                    summary.destroy += 1;
                }
                Action::Delete => summary.destroy += 1,
            }
        }
        summary
    }
}

/// Re-read every resource in state; returns the addresses dropped because the
/// remote object is gone.
pub async fn refresh(provider: &Provider, state: &mut State) -> Result<Vec<String>, ProviderError> {
    let mut removed = Vec::new();
    let addresses: Vec<String> = state.root_module().resources.keys().cloned().collect();

    for address in addresses {
        let Some(rs) = state.root_module().get(&address) else {
            continue;
        };
        let resource = provider.resource(&rs.resource_type)?;
        let mut d = rs.to_data();

        debug!("Refreshing {}", address);
        resource.read(&mut d, provider.client()).await?;

        if d.is_gone() {
            warn!("{} no longer exists remotely, removing from state", address);
            state.root_module_mut().remove(&address);
            removed.push(address);
        } else {
            state
                .root_module_mut()
                .insert(address, ResourceState::new(resource.type_name, d));
        }
    }

    Ok(removed)
}

/// Compare the manifest with state.
///
/// Configuration is normalized and validated here, so every problem in the
/// manifest surfaces before anything is changed remotely.
pub fn plan(provider: &Provider, manifest: &Manifest, state: &State) -> Result<Plan, ProviderError> {
    let mut deletions = Vec::new();
    let mut others = Vec::new();
    let mut wanted = HashSet::new();

    for block in &manifest.resources {
        let address = block.address();
        let resource = provider.resource(&block.resource_type)?;
        let config = resource.normalize(block.config.clone());
        resource.validate(&config).map_err(|e| match e {
            ProviderError::InvalidConfig { problems, .. } => ProviderError::InvalidConfig {
                resource: address.clone(),
                problems,
            },
            other => other,
        })?;
        wanted.insert(address.clone());

        let (action, changes) = match state.root_module().get(&address) {
            None => (Action::Create, Vec::new()),
            Some(prior) => {
                let diff = resource.diff(&prior.primary.attributes, &config);
                let action = if diff.is_empty() {
                    Action::NoOp
                } else if diff.requires_replace() {
                    Action::Replace
                } else {
                    Action::Update
                };
                (action, diff.changes)
            }
        };

        others.push(PlannedChange {
            address,
            resource_type: block.resource_type.clone(),
            action,
            config: Some(config),
            changes,
        });
    }

    for (address, rs) in &state.root_module().resources {
        if !wanted.contains(address) {
            deletions.push(delete_change(address, rs));
        }
    }

    deletions.extend(others);
    Ok(Plan { changes: deletions })
}

/// Plan that deletes everything in state
pub fn plan_destroy(state: &State) -> Plan {
    Plan {
        changes: state
            .root_module()
            .resources
            .iter()
            .map(|(address, rs)| delete_change(address, rs))
            .collect(),
    }
}

fn delete_change(address: &str, rs: &ResourceState) -> PlannedChange {
    PlannedChange {
        address: address.to_string(),
        resource_type: rs.resource_type.clone(),
        action: Action::Delete,
        config: None,
        changes: Vec::new(),
    }
}

/// Carry out `plan`, updating `state` after every completed step.
///
/// On error the state reflects the steps that finished, so the caller should
/// save it before reporting the error.
pub async fn apply(provider: &Provider, plan: &Plan, state: &mut State) -> Result<PlanSummary, ProviderError> {
    let mut done = PlanSummary::default();

    for change in &plan.changes {
        let resource = provider.resource(&change.resource_type)?;
        let config = change.config.clone().unwrap_or(Value::Null);

        match change.action {
            Action::NoOp => {}
            Action::Delete => {
                delete_recorded(provider, &change.address, state).await?;
                done.destroy += 1;
            }
            Action::Replace => {
                delete_recorded(provider, &change.address, state).await?;
                done.destroy += 1;
                create(provider, change, config, state).await?;
                done.add += 1;
            }
            Action::Create => {
                create(provider, change, config, state).await?;
                done.add += 1;
            }
            Action::Update => {
                let id = state
                    .root_module()
                    .get(&change.address)
                    .map(|rs| rs.primary.id.clone())
                    .unwrap_or_default();
                let mut d = ResourceData::with_id(id, config);

                info!("{}: updating", change.address);
                resource.update(&mut d, provider.client()).await?;
                state
                    .root_module_mut()
                    .insert(change.address.clone(), ResourceState::new(resource.type_name, d));
                done.change += 1;
            }
        }
    }

    Ok(done)
}

async fn create(
    provider: &Provider,
    change: &PlannedChange,
    config: Value,
    state: &mut State,
) -> Result<(), ProviderError> {
    let resource = provider.resource(&change.resource_type)?;
    let mut d = ResourceData::new(config);

    info!("{}: creating", change.address);
    let result = resource.create(&mut d, provider.client()).await;

    // The object may exist even if reading it back failed
    if !d.is_gone() {
        state
            .root_module_mut()
            .insert(change.address.clone(), ResourceState::new(resource.type_name, d));
    }
    result?;

    if state.root_module().get(&change.address).is_none() {
        return Err(ProviderError::ResourceVanished(change.address.clone()));
    }
    Ok(())
}

async fn delete_recorded(provider: &Provider, address: &str, state: &mut State) -> Result<(), ProviderError> {
    let Some(rs) = state.root_module().get(address) else {
        return Ok(());
    };
    let resource = provider.resource(&rs.resource_type)?;
    let mut d = rs.to_data();

    info!("{}: destroying", address);
    resource.delete(&mut d, provider.client()).await?;
    state.root_module_mut().remove(address);
    Ok(())
}

/// Adopt an existing remote object into state under `<resource_type>.<name>`.
pub async fn import(
    provider: &Provider,
    state: &mut State,
    resource_type: &str,
    name: &str,
    id: &str,
) -> Result<(), ProviderError> {
    let address = resource_address(resource_type, name);
    if state.root_module().get(&address).is_some() {
        return Err(ProviderError::DuplicateAddress(address));
    }

    let resource = provider.resource(resource_type)?;
    info!("{}: importing {}", address, id);
    let d = resource.import(id, provider.client()).await?;
    state
        .root_module_mut()
        .insert(address, ResourceState::new(resource.type_name, d));
    Ok(())
}

/// Delete every resource recorded in state.
pub async fn destroy(provider: &Provider, state: &mut State) -> Result<PlanSummary, ProviderError> {
    let plan = plan_destroy(state);
    apply(provider, &plan, state).await
}
