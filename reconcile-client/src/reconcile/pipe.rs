//! Pipe reconciler.

use super::{rejected, Reconciler, Remote};
use crate::compensator::remove_default_phases;
use crate::error::{ReconcileError, Result};
use crate::transport::Transport;
use async_trait::async_trait;
use reconcile_core::responses::{PipeNode, PipePayload};
use reconcile_core::{variables, Operation};
use reconcile_types::{EntityId, EntityKind, PipePatch, PipeSpec, PipeState, ReadOutcome};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Creates, reads, updates and deletes pipes.
pub struct PipeReconciler<T> {
    remote: Remote<T>,
}

impl<T: Transport> PipeReconciler<T> {
    pub(crate) fn new(remote: Remote<T>) -> Self {
        Self { remote }
    }

    /// Fetch an existing pipe by id.
    ///
    /// Unlike [`read`](Reconciler::read), absence is an error.
    pub async fn lookup(&self, id: &EntityId, cancel: &CancellationToken) -> Result<PipeState> {
        let node: Option<PipeNode> = self
            .remote
            .fetch(Operation::ReadPipe, &variables::by_id("id", id), id.as_str(), cancel)
            .await?;
        let node = node.ok_or_else(|| ReconcileError::NotFound {
            kind: EntityKind::Pipe,
            id: id.clone(),
        })?;

        Ok(PipeState {
            id: node.id,
            name: node.name.unwrap_or_default(),
            organization_id: node.organization.map(|org| org.id).unwrap_or_default(),
            public: node.public,
        })
    }
}

#[async_trait]
impl<T: Transport> Reconciler for PipeReconciler<T> {
    const KIND: EntityKind = EntityKind::Pipe;

    type Spec = PipeSpec;
    type Patch = PipePatch;
    type State = PipeState;

    async fn create(&self, spec: &PipeSpec, cancel: &CancellationToken) -> Result<PipeState> {
        let operation = Operation::CreatePipe;
        let payload: Option<PipePayload> = self
            .remote
            .fetch(operation, &variables::create_pipe(spec), &spec.name, cancel)
            .await?;
        let pipe = payload
            .and_then(|p| p.pipe)
            .filter(|pipe| !pipe.id.is_empty())
            .ok_or_else(|| rejected(operation, &spec.name, "no pipe returned"))?;

        let _guard = self.remote.lock(&pipe.id, cancel).await?;
        let removed = remove_default_phases(&self.remote, &pipe.id, cancel).await?;

        info!(pipe_id = %pipe.id, removed, "created pipe");
        Ok(PipeState::from_spec(pipe.id, spec))
    }

    async fn read(
        &self,
        prior: &PipeState,
        cancel: &CancellationToken,
    ) -> Result<ReadOutcome<PipeState>> {
        let node: Option<PipeNode> = self
            .remote
            .fetch(
                Operation::ReadPipe,
                &variables::by_id("id", &prior.id),
                prior.id.as_str(),
                cancel,
            )
            .await?;
        let Some(node) = node else {
            warn!(pipe_id = %prior.id, "pipe no longer exists");
            return Ok(ReadOutcome::Gone);
        };

        let mut state = prior.clone();
        if let Some(name) = node.name {
            state.name = name;
        }
        if let Some(org) = node.organization {
            state.organization_id = org.id;
        }
        if node.public.is_some() {
            state.public = node.public;
        }
        Ok(ReadOutcome::Present(state))
    }

    async fn update(
        &self,
        prior: &PipeState,
        patch: &PipePatch,
        cancel: &CancellationToken,
    ) -> Result<PipeState> {
        let operation = Operation::UpdatePipe;
        let _guard = self.remote.lock(&prior.id, cancel).await?;
        let payload: Option<PipePayload> = self
            .remote
            .fetch(
                operation,
                &variables::update_pipe(&prior.id, patch),
                prior.id.as_str(),
                cancel,
            )
            .await?;
        payload
            .and_then(|p| p.pipe)
            .ok_or_else(|| rejected(operation, prior.id.as_str(), "no pipe returned"))?;

        let mut state = prior.clone();
        state.apply(patch);
        Ok(state)
    }

    async fn delete(&self, prior: &PipeState, cancel: &CancellationToken) -> Result<()> {
        let _guard = self.remote.lock(&prior.id, cancel).await?;
        self.remote
            .delete(
                Operation::DeletePipe,
                &variables::by_id("id", &prior.id),
                prior.id.as_str(),
                cancel,
            )
            .await?;
        info!(pipe_id = %prior.id, "deleted pipe");
        Ok(())
    }
}
