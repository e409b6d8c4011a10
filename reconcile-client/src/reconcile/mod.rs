//! Reconcilers: create, read, update and delete for each entity kind.
//!
//! Every reconciler follows the same flow. It optionally takes the entity
//! lock, issues one or more operations through the [`Transport`], interprets
//! the payloads into a remote state, a drift signal, or an error, and
//! releases the lock.
//!
//! Lock keys:
//! - update and delete lock the entity's own id
//! - create locks the parent id (a phase's pipe, a field's phase, an
//!   automation's event repository); a new pipe locks its own id while its
//!   default phases are swept
//! - reads never lock

mod automation;
mod field;
mod phase;
mod pipe;

pub use automation::AutomationReconciler;
pub use field::FieldReconciler;
pub use phase::PhaseReconciler;
pub use pipe::PipeReconciler;

use crate::error::{ReconcileError, Result};
use crate::locks::{EntityGuard, EntityLocks};
use crate::transport::Transport;
use async_trait::async_trait;
use reconcile_core::responses::DeletePayload;
use reconcile_core::{decode_root, Operation, Variables};
use reconcile_types::{EntityId, EntityKind, ReadOutcome};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Lifecycle operations for one entity kind.
#[async_trait]
pub trait Reconciler: Send + Sync {
    /// Entity kind handled.
    const KIND: EntityKind;

    /// Desired attributes for creation.
    type Spec: Send + Sync;
    /// Mutable attributes that can be changed in place.
    type Patch: Send + Sync;
    /// Recorded remote state.
    type State: Send + Sync;

    /// Create the entity. On success the state carries the new id.
    async fn create(&self, spec: &Self::Spec, cancel: &CancellationToken) -> Result<Self::State>;

    /// Refresh `prior` from the backend, or report that it is gone.
    async fn read(
        &self,
        prior: &Self::State,
        cancel: &CancellationToken,
    ) -> Result<ReadOutcome<Self::State>>;

    /// Apply `patch` to the entity recorded in `prior`.
    async fn update(
        &self,
        prior: &Self::State,
        patch: &Self::Patch,
        cancel: &CancellationToken,
    ) -> Result<Self::State>;

    /// Delete the entity recorded in `prior`.
    async fn delete(&self, prior: &Self::State, cancel: &CancellationToken) -> Result<()>;
}

/// Shared handle reconcilers issue calls through.
pub(crate) struct Remote<T> {
    transport: Arc<T>,
    locks: Arc<EntityLocks>,
}

impl<T> Clone for Remote<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            locks: Arc::clone(&self.locks),
        }
    }
}

impl<T: Transport> Remote<T> {
    pub(crate) fn new(transport: Arc<T>, locks: Arc<EntityLocks>) -> Self {
        Self { transport, locks }
    }

    /// Take the lock on `id`, giving up if `cancel` fires.
    pub(crate) async fn lock(&self, id: &EntityId, cancel: &CancellationToken) -> Result<EntityGuard> {
        Ok(self.locks.acquire_cancellable(id.as_str(), cancel).await?)
    }

    /// Issue `operation` and decode its root field.
    ///
    /// `Ok(None)` means the root field was absent or null.
    pub(crate) async fn fetch<D: DeserializeOwned>(
        &self,
        operation: Operation,
        variables: &Variables,
        target: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<D>> {
        let wrap = |source| ReconcileError::Transport {
            operation,
            target: target.to_string(),
            source,
        };
        let data = self
            .transport
            .execute(operation, variables, cancel)
            .await
            .map_err(wrap)?;
        decode_root(data, operation.root_field()).map_err(wrap)
    }

    /// Issue a delete mutation; anything but `success: true` is a failure.
    pub(crate) async fn delete(
        &self,
        operation: Operation,
        variables: &Variables,
        target: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let payload: Option<DeletePayload> =
            self.fetch(operation, variables, target, cancel).await?;
        if !payload.is_some_and(|p| p.success) {
            return Err(ReconcileError::Unsuccessful {
                operation,
                target: target.to_string(),
            });
        }
        debug!(operation = %operation, target, "deleted");
        Ok(())
    }
}

/// Failure for a mutation that returned no entity.
pub(crate) fn rejected(operation: Operation, target: &str, details: impl Into<String>) -> ReconcileError {
    ReconcileError::Rejected {
        operation,
        target: target.to_string(),
        details: details.into(),
    }
}
