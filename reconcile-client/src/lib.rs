//! # reconcile-client
//!
//! Async reconciliation client for Pipefy pipes, phases, fields and
//! automations.
//!
//! This is the library an orchestrator drives to converge remote entities
//! on their desired state.
//!
//! ## Features
//!
//! - **Transport Abstraction**: GraphQL over HTTP (reqwest) or a scripted mock
//! - **Credentials Channel**: static bearer token or OAuth2 client credentials
//! - **Per-Entity Serialization**: mutations on one entity never overlap
//! - **Compensation**: default phases created with a pipe are swept away
//! - **Cancellation**: every operation honours a caller-supplied token
//!
//! ## Example
//!
//! ```ignore
//! use reconcile_client::{ProviderConfig, Reconciler, Session};
//! use reconcile_types::PipeSpec;
//! use tokio_util::sync::CancellationToken;
//!
//! let config = ProviderConfig::from_file("pipefy.toml")?.with_env();
//! let session = Session::from_config(&config)?;
//!
//! let spec = PipeSpec { name: "My Pipe".into(), organization_id: "org_1".into(), public: None };
//! let state = session.pipes().create(&spec, &CancellationToken::new()).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
mod compensator;
pub mod config;
pub mod error;
pub mod locks;
pub mod reconcile;
pub mod session;
pub mod transport;

pub use channel::{Channel, TokenSource};
pub use config::{ClientCredentials, ConfigError, Credentials, ProviderConfig, Secret};
pub use error::{ReconcileError, Result};
pub use locks::{EntityGuard, EntityLocks, LockCancelled};
pub use reconcile::{
    AutomationReconciler, FieldReconciler, PhaseReconciler, PipeReconciler, Reconciler,
};
pub use session::Session;
pub use transport::{HttpTransport, MockEvent, MockTransport, RecordedCall, Transport};

pub use reconcile_core::{Operation, TransportError, Variables};
