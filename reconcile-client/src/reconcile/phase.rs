//! Phase reconciler.

use super::{rejected, Reconciler, Remote};
use crate::error::{ReconcileError, Result};
use crate::transport::Transport;
use async_trait::async_trait;
use reconcile_core::responses::{PhaseNode, PhasePayload};
use reconcile_core::{variables, Operation};
use reconcile_types::{EntityId, EntityKind, PhasePatch, PhaseSpec, PhaseState, ReadOutcome};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Creates, reads, updates and deletes phases.
pub struct PhaseReconciler<T> {
    remote: Remote<T>,
}

impl<T: Transport> PhaseReconciler<T> {
    pub(crate) fn new(remote: Remote<T>) -> Self {
        Self { remote }
    }

    /// Fetch an existing phase by id.
    ///
    /// The owning pipe is taken from the phase's legacy repo id, and is
    /// empty if the backend does not report one.
    pub async fn lookup(&self, id: &EntityId, cancel: &CancellationToken) -> Result<PhaseState> {
        let node: Option<PhaseNode> = self
            .remote
            .fetch(Operation::ReadPhase, &variables::by_id("id", id), id.as_str(), cancel)
            .await?;
        let node = node.ok_or_else(|| ReconcileError::NotFound {
            kind: EntityKind::Phase,
            id: id.clone(),
        })?;

        Ok(PhaseState {
            pipe_id: node
                .repo_id
                .and_then(|repo| repo.usable())
                .unwrap_or_default(),
            id: node.id,
            name: node.name.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl<T: Transport> Reconciler for PhaseReconciler<T> {
    const KIND: EntityKind = EntityKind::Phase;

    type Spec = PhaseSpec;
    type Patch = PhasePatch;
    type State = PhaseState;

    async fn create(&self, spec: &PhaseSpec, cancel: &CancellationToken) -> Result<PhaseState> {
        let operation = Operation::CreatePhase;
        let _guard = self.remote.lock(&spec.pipe_id, cancel).await?;
        let payload: Option<PhasePayload> = self
            .remote
            .fetch(operation, &variables::create_phase(spec), &spec.name, cancel)
            .await?;
        let phase = payload
            .and_then(|p| p.phase)
            .filter(|phase| !phase.id.is_empty())
            .ok_or_else(|| rejected(operation, &spec.name, "no phase returned"))?;

        info!(phase_id = %phase.id, pipe_id = %spec.pipe_id, "created phase");
        Ok(PhaseState::from_spec(phase.id, spec))
    }

    async fn read(
        &self,
        prior: &PhaseState,
        cancel: &CancellationToken,
    ) -> Result<ReadOutcome<PhaseState>> {
        let node: Option<PhaseNode> = self
            .remote
            .fetch(
                Operation::ReadPhase,
                &variables::by_id("id", &prior.id),
                prior.id.as_str(),
                cancel,
            )
            .await?;
        let Some(node) = node else {
            warn!(phase_id = %prior.id, "phase no longer exists");
            return Ok(ReadOutcome::Gone);
        };

        let mut state = prior.clone();
        if let Some(name) = node.name {
            state.name = name;
        }
        Ok(ReadOutcome::Present(state))
    }

    async fn update(
        &self,
        prior: &PhaseState,
        patch: &PhasePatch,
        cancel: &CancellationToken,
    ) -> Result<PhaseState> {
        let operation = Operation::UpdatePhase;
        let _guard = self.remote.lock(&prior.id, cancel).await?;
        let payload: Option<PhasePayload> = self
            .remote
            .fetch(
                operation,
                &variables::update_phase(&prior.id, patch),
                prior.id.as_str(),
                cancel,
            )
            .await?;
        payload
            .and_then(|p| p.phase)
            .ok_or_else(|| rejected(operation, prior.id.as_str(), "no phase returned"))?;

        let mut state = prior.clone();
        state.apply(patch);
        Ok(state)
    }

    async fn delete(&self, prior: &PhaseState, cancel: &CancellationToken) -> Result<()> {
        let _guard = self.remote.lock(&prior.id, cancel).await?;
        self.remote
            .delete(
                Operation::DeletePhase,
                &variables::by_id("id", &prior.id),
                prior.id.as_str(),
                cancel,
            )
            .await
    }
}
