//! Reconciliation session.
//!
//! A session owns one transport and one lock registry for the lifetime of a
//! reconciliation run. Every reconciler it hands out shares both, so
//! concurrent tasks serialize on the same entity ids.

use crate::config::{ConfigError, ProviderConfig};
use crate::locks::EntityLocks;
use crate::reconcile::{
    AutomationReconciler, FieldReconciler, PhaseReconciler, PipeReconciler, Remote,
};
use crate::transport::{HttpTransport, Transport};
use std::sync::Arc;
use tracing::info;

/// Shared transport and lock registry.
pub struct Session<T> {
    remote: Remote<T>,
    transport: Arc<T>,
    locks: Arc<EntityLocks>,
}

impl<T: Transport> Session<T> {
    /// Create a session with a fresh lock registry.
    pub fn new(transport: T) -> Self {
        Self::with_locks(Arc::new(transport), Arc::new(EntityLocks::new()))
    }

    /// Create a session from shared parts.
    pub fn with_locks(transport: Arc<T>, locks: Arc<EntityLocks>) -> Self {
        Self {
            remote: Remote::new(Arc::clone(&transport), Arc::clone(&locks)),
            transport,
            locks,
        }
    }

    /// The transport operations go through.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The lock registry.
    pub fn locks(&self) -> &EntityLocks {
        &self.locks
    }

    /// Pipe reconciler.
    pub fn pipes(&self) -> PipeReconciler<T> {
        PipeReconciler::new(self.remote.clone())
    }

    /// Phase reconciler.
    pub fn phases(&self) -> PhaseReconciler<T> {
        PhaseReconciler::new(self.remote.clone())
    }

    /// Field reconciler.
    pub fn fields(&self) -> FieldReconciler<T> {
        FieldReconciler::new(self.remote.clone())
    }

    /// Automation reconciler.
    pub fn automations(&self) -> AutomationReconciler<T> {
        AutomationReconciler::new(self.remote.clone())
    }
}

impl Session<HttpTransport> {
    /// Create an HTTP session from configuration.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ConfigError> {
        let transport = HttpTransport::from_config(config)?;
        info!(endpoint = %transport.endpoint(), "session ready");
        Ok(Self::new(transport))
    }
}

impl<T> Clone for Session<T> {
    fn clone(&self) -> Self {
        Self {
            remote: self.remote.clone(),
            transport: Arc::clone(&self.transport),
            locks: Arc::clone(&self.locks),
        }
    }
}
