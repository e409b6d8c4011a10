//! Desired specs, update patches and remote states for each entity kind.
//!
//! Three shapes per kind:
//! - `*Spec`: the desired state handed to create. Optional attributes are
//!   `Option` so "absent" and "set" stay distinguishable.
//! - `*Patch`: the diff handed to update. Every attribute is optional and
//!   attributes that are immutable after creation are not present at all.
//! - `*State`: what the state store keeps between runs, including ids.

use serde::{Deserialize, Serialize};

use crate::{EntityId, Params, RepoKind};

/// Result of reading an entity back from the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome<T> {
    /// The entity still exists; here is its refreshed state.
    Present(T),
    /// The entity no longer exists remotely; local state must be purged.
    Gone,
}

impl<T> ReadOutcome<T> {
    /// True if the entity drifted away.
    pub fn is_gone(&self) -> bool {
        matches!(self, ReadOutcome::Gone)
    }

    /// The refreshed state, if still present.
    pub fn present(self) -> Option<T> {
        match self {
            ReadOutcome::Present(state) => Some(state),
            ReadOutcome::Gone => None,
        }
    }
}

// ===========================================
// Pipe
// ===========================================

/// Desired state of a pipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipeSpec {
    /// Pipe name.
    pub name: String,
    /// Owning organization.
    pub organization_id: EntityId,
    /// Whether the pipe is public.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
}

/// Mutable pipe attributes for update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipePatch {
    /// New name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New visibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
}

/// Remote state of a pipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipeState {
    /// Backend-assigned id.
    pub id: EntityId,
    /// Pipe name.
    pub name: String,
    /// Owning organization.
    pub organization_id: EntityId,
    /// Whether the pipe is public.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
}

impl PipeState {
    /// State for a freshly created pipe.
    pub fn from_spec(id: EntityId, spec: &PipeSpec) -> Self {
        Self {
            id,
            name: spec.name.clone(),
            organization_id: spec.organization_id.clone(),
            public: spec.public,
        }
    }

    /// Fold an applied patch into this state.
    pub fn apply(&mut self, patch: &PipePatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if patch.public.is_some() {
            self.public = patch.public;
        }
    }
}

// ===========================================
// Phase
// ===========================================

/// Desired state of a phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhaseSpec {
    /// Parent pipe (immutable after creation).
    pub pipe_id: EntityId,
    /// Phase name.
    pub name: String,
}

/// Mutable phase attributes for update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhasePatch {
    /// New name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Remote state of a phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseState {
    /// Backend-assigned id.
    pub id: EntityId,
    /// Parent pipe.
    pub pipe_id: EntityId,
    /// Phase name.
    pub name: String,
}

impl PhaseState {
    /// State for a freshly created phase.
    pub fn from_spec(id: EntityId, spec: &PhaseSpec) -> Self {
        Self {
            id,
            pipe_id: spec.pipe_id.clone(),
            name: spec.name.clone(),
        }
    }

    /// Fold an applied patch into this state.
    pub fn apply(&mut self, patch: &PhasePatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
    }
}

// ===========================================
// Field
// ===========================================

/// Desired state of a phase field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    /// Parent phase (immutable after creation).
    pub phase_id: EntityId,
    /// Field type (e.g. `short_text`).
    #[serde(rename = "type")]
    pub field_type: String,
    /// Field label.
    pub label: String,
    /// Whether the field is required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

/// Mutable field attributes for update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldPatch {
    /// New label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// New required flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

/// Remote state of a phase field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldState {
    /// Backend-assigned id (the field slug).
    pub id: EntityId,
    /// Secondary backend id, assigned on creation and refreshed on update.
    pub internal_id: EntityId,
    /// Parent phase.
    pub phase_id: EntityId,
    /// Field type.
    #[serde(rename = "type")]
    pub field_type: String,
    /// Field label.
    pub label: String,
    /// Whether the field is required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

impl FieldState {
    /// State for a freshly created field.
    pub fn from_spec(id: EntityId, internal_id: EntityId, spec: &FieldSpec) -> Self {
        Self {
            id,
            internal_id,
            phase_id: spec.phase_id.clone(),
            field_type: spec.field_type.clone(),
            label: spec.label.clone(),
            required: spec.required,
        }
    }

    /// Fold an applied patch into this state.
    pub fn apply(&mut self, patch: &FieldPatch) {
        if let Some(label) = &patch.label {
            self.label = label.clone();
        }
        if patch.required.is_some() {
            self.required = patch.required;
        }
    }
}

// ===========================================
// Automation
// ===========================================

/// Desired state of an automation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutomationSpec {
    /// Automation name.
    pub name: String,
    /// Event type the automation listens to.
    pub event_id: String,
    /// Action type the automation performs.
    pub action_id: String,
    /// Repository the event comes from (immutable after creation).
    pub event_repo_id: EntityId,
    /// Repository the action applies to.
    pub action_repo_id: EntityId,
    /// Event parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_params: Option<Params>,
    /// Action parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_params: Option<Params>,
    /// Execution condition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Params>,
    /// Whether the automation is active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// Mutable automation attributes for update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutomationPatch {
    /// New name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New event type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// New action type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
    /// New action repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_repo_id: Option<EntityId>,
    /// New event parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_params: Option<Params>,
    /// New action parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_params: Option<Params>,
    /// New condition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Params>,
    /// New active flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// Remote state of an automation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationState {
    /// Backend-assigned id.
    pub id: EntityId,
    /// Automation name.
    pub name: String,
    /// Event type.
    pub event_id: String,
    /// Action type.
    pub action_id: String,
    /// Event repository.
    pub event_repo_id: EntityId,
    /// Event repository type, once the backend reported it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_repo_kind: Option<RepoKind>,
    /// Action repository.
    pub action_repo_id: EntityId,
    /// Action repository type, once the backend reported it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_repo_kind: Option<RepoKind>,
    /// Event parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_params: Option<Params>,
    /// Action parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_params: Option<Params>,
    /// Execution condition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Params>,
    /// Whether the automation is active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl AutomationState {
    /// State for a freshly created automation.
    pub fn from_spec(id: EntityId, spec: &AutomationSpec) -> Self {
        Self {
            id,
            name: spec.name.clone(),
            event_id: spec.event_id.clone(),
            action_id: spec.action_id.clone(),
            event_repo_id: spec.event_repo_id.clone(),
            event_repo_kind: None,
            action_repo_id: spec.action_repo_id.clone(),
            action_repo_kind: None,
            event_params: spec.event_params.clone(),
            action_params: spec.action_params.clone(),
            condition: spec.condition.clone(),
            active: spec.active,
        }
    }

    /// Fold an applied patch into this state.
    pub fn apply(&mut self, patch: &AutomationPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(event_id) = &patch.event_id {
            self.event_id = event_id.clone();
        }
        if let Some(action_id) = &patch.action_id {
            self.action_id = action_id.clone();
        }
        if let Some(repo) = &patch.action_repo_id {
            if *repo != self.action_repo_id {
                self.action_repo_kind = None;
            }
            self.action_repo_id = repo.clone();
        }
        if patch.event_params.is_some() {
            self.event_params = patch.event_params.clone();
        }
        if patch.action_params.is_some() {
            self.action_params = patch.action_params.clone();
        }
        if patch.condition.is_some() {
            self.condition = patch.condition.clone();
        }
        if patch.active.is_some() {
            self.active = patch.active;
        }
    }
}
