//! Error types for reconciler operations.

use crate::locks::LockCancelled;
use reconcile_core::{Operation, TransportError};
use reconcile_types::{EntityId, EntityKind};
use thiserror::Error;

/// Result alias for reconciler operations.
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Every way a reconciler operation can fail.
///
/// Drift is not an error: a read that finds nothing returns
/// [`ReadOutcome::Gone`](reconcile_types::ReadOutcome::Gone).
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A GraphQL call failed.
    #[error("{operation} failed for {target}: {source}")]
    Transport {
        /// Operation that failed.
        operation: Operation,
        /// Entity id (or name, before an id exists) the call was about.
        target: String,
        /// Classified transport failure.
        #[source]
        source: TransportError,
    },

    /// The backend accepted the call but returned no entity.
    #[error("{operation} rejected for {target}: {details}")]
    Rejected {
        /// Operation that was rejected.
        operation: Operation,
        /// Entity id or name.
        target: String,
        /// Backend-supplied details, if any.
        details: String,
    },

    /// A delete reported `success: false`.
    #[error("{operation} failed for {target}: backend reported success=false")]
    Unsuccessful {
        /// Delete operation.
        operation: Operation,
        /// Entity id.
        target: String,
    },

    /// A default phase could not be removed after creating a pipe.
    #[error("failed to delete default phase {phase_id} of new pipe {pipe_id}: {source}")]
    Compensation {
        /// The pipe that was created.
        pipe_id: EntityId,
        /// The phase whose deletion failed.
        phase_id: EntityId,
        /// Why it failed.
        #[source]
        source: Box<ReconcileError>,
    },

    /// An intermediate lookup of a multi-hop sequence returned nothing usable.
    #[error("delete field {field_id}: {step} returned nothing usable: {reason}")]
    ChainResolution {
        /// The lookup that came back empty.
        step: Operation,
        /// Field being deleted.
        field_id: EntityId,
        /// What was missing.
        reason: String,
    },

    /// A lookup by id found no entity.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Entity kind looked up.
        kind: EntityKind,
        /// Id looked up.
        id: EntityId,
    },

    /// The caller cancelled while waiting for an entity lock.
    #[error(transparent)]
    LockCancelled(#[from] LockCancelled),
}

impl ReconcileError {
    /// Whether the operation stopped because the caller cancelled it.
    pub fn is_cancelled(&self) -> bool {
        match self {
            ReconcileError::Transport { source, .. } => *source == TransportError::Cancelled,
            ReconcileError::Compensation { source, .. } => source.is_cancelled(),
            ReconcileError::LockCancelled(_) => true,
            _ => false,
        }
    }

    /// The transport failure behind this error, if any.
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            ReconcileError::Transport { source, .. } => Some(source),
            ReconcileError::Compensation { source, .. } => source.transport(),
            _ => None,
        }
    }
}
