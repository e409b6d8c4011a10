//! Phase field reconciler.
//!
//! Fields have no direct lookup: reads list the parent phase's fields and
//! scan for the id. Deletion needs the pipe's modern uuid, which is only
//! reachable from the phase through its legacy repo id, so a delete is a
//! three-hop chain (phase, pipe, mutation) that fails fast on the first
//! hop that comes back empty.

use super::{rejected, Reconciler, Remote};
use crate::error::{ReconcileError, Result};
use crate::transport::Transport;
use async_trait::async_trait;
use reconcile_core::responses::{FieldPayload, PhaseFields, PhaseRepo, PipeUuid};
use reconcile_core::{variables, Operation};
use reconcile_types::{EntityKind, FieldPatch, FieldSpec, FieldState, ReadOutcome};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Creates, reads, updates and deletes phase fields.
pub struct FieldReconciler<T> {
    remote: Remote<T>,
}

impl<T: Transport> FieldReconciler<T> {
    pub(crate) fn new(remote: Remote<T>) -> Self {
        Self { remote }
    }

    /// Resolve the uuid of the pipe that owns `prior`'s phase.
    async fn resolve_pipe_uuid(&self, prior: &FieldState, cancel: &CancellationToken) -> Result<String> {
        let chain_error = |step, reason: String| ReconcileError::ChainResolution {
            step,
            field_id: prior.id.clone(),
            reason,
        };

        let phase: Option<PhaseRepo> = self
            .remote
            .fetch(
                Operation::PhaseRepo,
                &variables::by_id("id", &prior.phase_id),
                prior.id.as_str(),
                cancel,
            )
            .await?;
        let phase = phase.ok_or_else(|| {
            chain_error(
                Operation::PhaseRepo,
                format!("phase {} not found", prior.phase_id),
            )
        })?;
        let repo_id = phase.usable().ok_or_else(|| {
            chain_error(
                Operation::PhaseRepo,
                format!("phase {} has no usable repo_id", prior.phase_id),
            )
        })?;

        let pipe: Option<PipeUuid> = self
            .remote
            .fetch(
                Operation::PipeUuid,
                &variables::by_id("id", &repo_id),
                prior.id.as_str(),
                cancel,
            )
            .await?;
        let uuid = pipe
            .as_ref()
            .and_then(PipeUuid::usable)
            .ok_or_else(|| chain_error(Operation::PipeUuid, format!("pipe {repo_id} has no uuid")))?;

        debug!(field_id = %prior.id, repo_id = %repo_id, "resolved pipe uuid");
        Ok(uuid.to_string())
    }
}

#[async_trait]
impl<T: Transport> Reconciler for FieldReconciler<T> {
    const KIND: EntityKind = EntityKind::Field;

    type Spec = FieldSpec;
    type Patch = FieldPatch;
    type State = FieldState;

    async fn create(&self, spec: &FieldSpec, cancel: &CancellationToken) -> Result<FieldState> {
        let operation = Operation::CreateField;
        let _guard = self.remote.lock(&spec.phase_id, cancel).await?;
        let payload: Option<FieldPayload> = self
            .remote
            .fetch(operation, &variables::create_field(spec), &spec.label, cancel)
            .await?;
        let field = payload
            .and_then(|p| p.phase_field)
            .filter(|field| !field.id.is_empty())
            .ok_or_else(|| rejected(operation, &spec.label, "no field returned"))?;

        let internal_id = field.internal_id.unwrap_or_default();
        if internal_id.is_empty() {
            warn!(field_id = %field.id, "created field has no internal_id");
        }
        info!(field_id = %field.id, phase_id = %spec.phase_id, "created field");
        Ok(FieldState::from_spec(field.id, internal_id, spec))
    }

    async fn read(
        &self,
        prior: &FieldState,
        cancel: &CancellationToken,
    ) -> Result<ReadOutcome<FieldState>> {
        let phase: Option<PhaseFields> = self
            .remote
            .fetch(
                Operation::PhaseFields,
                &variables::by_id("phaseId", &prior.phase_id),
                prior.id.as_str(),
                cancel,
            )
            .await?;
        let Some(phase) = phase else {
            warn!(field_id = %prior.id, phase_id = %prior.phase_id, "phase of field no longer exists");
            return Ok(ReadOutcome::Gone);
        };
        let Some(node) = phase.find(&prior.id) else {
            warn!(field_id = %prior.id, "field no longer exists");
            return Ok(ReadOutcome::Gone);
        };

        let mut state = prior.clone();
        if let Some(internal_id) = node.internal_id.clone().filter(|id| !id.is_empty()) {
            state.internal_id = internal_id;
        }
        if let Some(label) = &node.label {
            state.label = label.clone();
        }
        if let Some(field_type) = &node.field_type {
            state.field_type = field_type.clone();
        }
        if node.required.is_some() {
            state.required = node.required;
        }
        Ok(ReadOutcome::Present(state))
    }

    async fn update(
        &self,
        prior: &FieldState,
        patch: &FieldPatch,
        cancel: &CancellationToken,
    ) -> Result<FieldState> {
        let operation = Operation::UpdateField;
        let _guard = self.remote.lock(&prior.id, cancel).await?;
        let payload: Option<FieldPayload> = self
            .remote
            .fetch(
                operation,
                &variables::update_field(&prior.id, patch),
                prior.id.as_str(),
                cancel,
            )
            .await?;
        let field = payload
            .and_then(|p| p.phase_field)
            .ok_or_else(|| rejected(operation, prior.id.as_str(), "no field returned"))?;

        let mut state = prior.clone();
        state.apply(patch);
        if let Some(internal_id) = field.internal_id.filter(|id| !id.is_empty()) {
            state.internal_id = internal_id;
        }
        Ok(state)
    }

    async fn delete(&self, prior: &FieldState, cancel: &CancellationToken) -> Result<()> {
        let _guard = self.remote.lock(&prior.id, cancel).await?;
        let pipe_uuid = self.resolve_pipe_uuid(prior, cancel).await?;
        self.remote
            .delete(
                Operation::DeleteField,
                &variables::delete_field(&prior.id, &pipe_uuid),
                prior.id.as_str(),
                cancel,
            )
            .await
    }
}
