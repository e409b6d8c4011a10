//! Automation reconciler.

use super::{rejected, Reconciler, Remote};
use crate::error::Result;
use crate::transport::Transport;
use async_trait::async_trait;
use reconcile_core::responses::{AutomationNode, AutomationPayload};
use reconcile_core::{variables, Operation};
use reconcile_types::{
    AutomationPatch, AutomationSpec, AutomationState, EntityKind, ReadOutcome,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Creates, reads, updates and deletes automations.
pub struct AutomationReconciler<T> {
    remote: Remote<T>,
}

impl<T: Transport> AutomationReconciler<T> {
    pub(crate) fn new(remote: Remote<T>) -> Self {
        Self { remote }
    }
}

/// The automation of a mutation payload, or the backend's rejection.
fn accepted(
    operation: Operation,
    target: &str,
    payload: Option<AutomationPayload>,
) -> Result<AutomationNode> {
    let payload =
        payload.ok_or_else(|| rejected(operation, target, "no automation payload returned"))?;
    let details = payload.rejection();
    payload
        .automation
        .filter(|automation| !automation.id.is_empty())
        .ok_or_else(|| rejected(operation, target, details))
}

#[async_trait]
impl<T: Transport> Reconciler for AutomationReconciler<T> {
    const KIND: EntityKind = EntityKind::Automation;

    type Spec = AutomationSpec;
    type Patch = AutomationPatch;
    type State = AutomationState;

    async fn create(
        &self,
        spec: &AutomationSpec,
        cancel: &CancellationToken,
    ) -> Result<AutomationState> {
        let operation = Operation::CreateAutomation;
        let _guard = self.remote.lock(&spec.event_repo_id, cancel).await?;
        let payload: Option<AutomationPayload> = self
            .remote
            .fetch(operation, &variables::create_automation(spec), &spec.name, cancel)
            .await?;
        let automation = accepted(operation, &spec.name, payload)?;

        info!(automation_id = %automation.id, event_repo_id = %spec.event_repo_id, "created automation");
        Ok(AutomationState::from_spec(automation.id, spec))
    }

    async fn read(
        &self,
        prior: &AutomationState,
        cancel: &CancellationToken,
    ) -> Result<ReadOutcome<AutomationState>> {
        let node: Option<AutomationNode> = self
            .remote
            .fetch(
                Operation::ReadAutomation,
                &variables::by_id("id", &prior.id),
                prior.id.as_str(),
                cancel,
            )
            .await?;
        let Some(node) = node else {
            warn!(automation_id = %prior.id, "automation no longer exists");
            return Ok(ReadOutcome::Gone);
        };

        let mut state = prior.clone();
        if let Some(name) = node.name {
            state.name = name;
        }
        if let Some(event_id) = node.event_id {
            state.event_id = event_id;
        }
        if let Some(action_id) = node.action_id {
            state.action_id = action_id;
        }
        if node.active.is_some() {
            state.active = node.active;
        }
        if let Some(repo) = node.event_repo.filter(|repo| !repo.id.is_empty()) {
            state.event_repo_id = repo.id;
            state.event_repo_kind = repo.kind;
        }
        if let Some(repo) = node.action_repo_v2.filter(|repo| !repo.id.is_empty()) {
            state.action_repo_id = repo.id;
            state.action_repo_kind = repo.kind;
        }
        Ok(ReadOutcome::Present(state))
    }

    async fn update(
        &self,
        prior: &AutomationState,
        patch: &AutomationPatch,
        cancel: &CancellationToken,
    ) -> Result<AutomationState> {
        let operation = Operation::UpdateAutomation;
        let _guard = self.remote.lock(&prior.id, cancel).await?;
        let payload: Option<AutomationPayload> = self
            .remote
            .fetch(
                operation,
                &variables::update_automation(&prior.id, patch),
                prior.id.as_str(),
                cancel,
            )
            .await?;
        accepted(operation, prior.id.as_str(), payload)?;

        let mut state = prior.clone();
        state.apply(patch);
        Ok(state)
    }

    async fn delete(&self, prior: &AutomationState, cancel: &CancellationToken) -> Result<()> {
        let _guard = self.remote.lock(&prior.id, cancel).await?;
        self.remote
            .delete(
                Operation::DeleteAutomation,
                &variables::by_id("id", &prior.id),
                prior.id.as_str(),
                cancel,
            )
            .await
    }
}
