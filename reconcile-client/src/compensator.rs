//! Default-phase sweep after pipe creation.
//!
//! The backend seeds every new pipe with default phases. Declared phases
//! are the only ones that should exist, so the sweep lists the new pipe's
//! phases and deletes each of them, one after another. The first failure
//! aborts the sweep; phases already deleted stay deleted.

use crate::error::{ReconcileError, Result};
use crate::reconcile::Remote;
use crate::transport::Transport;
use reconcile_core::responses::PipePhases;
use reconcile_core::variables::by_id;
use reconcile_core::Operation;
use reconcile_types::EntityId;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Delete every phase of `pipe_id`. Returns how many were deleted.
///
/// The caller must hold the lock on `pipe_id`.
pub(crate) async fn remove_default_phases<T: Transport>(
    remote: &Remote<T>,
    pipe_id: &EntityId,
    cancel: &CancellationToken,
) -> Result<usize> {
    let phases: Option<PipePhases> = remote
        .fetch(
            Operation::PipePhases,
            &by_id("id", pipe_id),
            pipe_id.as_str(),
            cancel,
        )
        .await?;
    let phases = phases.map(|p| p.phases).unwrap_or_default();
    debug!(pipe_id = %pipe_id, count = phases.len(), "removing default phases");

    for phase in &phases {
        remote
            .delete(
                Operation::DeletePhase,
                &by_id("id", &phase.id),
                phase.id.as_str(),
                cancel,
            )
            .await
            .map_err(|source| {
                warn!(pipe_id = %pipe_id, phase_id = %phase.id, error = %source, "default phase removal failed");
                ReconcileError::Compensation {
                    pipe_id: pipe_id.clone(),
                    phase_id: phase.id.clone(),
                    source: Box::new(source),
                }
            })?;
    }

    Ok(phases.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locks::EntityLocks;
    use crate::transport::MockTransport;
    use serde_json::json;
    use std::sync::Arc;

    fn remote(mock: &MockTransport) -> Remote<MockTransport> {
        Remote::new(Arc::new(mock.clone()), Arc::new(EntityLocks::new()))
    }

    #[tokio::test]
    async fn deletes_in_backend_order() {
        let mock = MockTransport::new();
        mock.queue_data(
            Operation::PipePhases,
            json!({"pipe": {"phases": [{"id": "b"}, {"id": "a"}]}}),
        );
        mock.respond_data(Operation::DeletePhase, json!({"deletePhase": {"success": true}}));

        let removed = remove_default_phases(&remote(&mock), &"pipe_1".into(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(removed, 2);
        let ids: Vec<_> = mock
            .calls_for(Operation::DeletePhase)
            .into_iter()
            .map(|call| call.variables["id"].clone())
            .collect();
        assert_eq!(ids, vec![json!("b"), json!("a")]);
    }

    #[tokio::test]
    async fn absent_pipe_has_nothing_to_sweep() {
        let mock = MockTransport::new();
        mock.queue_data(Operation::PipePhases, json!({"pipe": null}));

        let removed = remove_default_phases(&remote(&mock), &"pipe_1".into(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(removed, 0);
        assert_eq!(mock.operations(), vec![Operation::PipePhases]);
    }

    #[tokio::test]
    async fn cancellation_stops_the_sweep() {
        let mock = MockTransport::new();
        mock.queue_data(
            Operation::PipePhases,
            json!({"pipe": {"phases": [{"id": "a"}, {"id": "b"}]}}),
        );
        mock.respond_data(Operation::DeletePhase, json!({"deletePhase": {"success": true}}));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = remove_default_phases(&remote(&mock), &"pipe_1".into(), &cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(mock.calls_for(Operation::DeletePhase).is_empty());
    }
}
