//! Transport abstraction for the reconciliation engine.
//!
//! This module provides a pluggable transport layer that abstracts how a
//! GraphQL operation reaches the backend (HTTP, mock for testing).
//!
//! # Design
//!
//! The transport is request/response oriented: `execute()` sends one named
//! [`Operation`] with its variables and returns the classified outcome, the
//! `data` object of the envelope or a [`TransportError`]. It never
//! interprets the payload; reconcilers do that.
//!
//! # Example
//!
//! ```ignore
//! let transport = MockTransport::new();
//! transport.respond_data(Operation::DeletePhase, json!({"deletePhase": {"success": true}}));
//! let data = transport.execute(Operation::DeletePhase, &vars, &cancel).await?;
//! ```

mod http;
mod mock;

pub use http::HttpTransport;
pub use mock::{MockEvent, MockReply, MockTransport, RecordedCall};

use async_trait::async_trait;
use reconcile_core::{Operation, TransportError, Variables};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Transport trait for issuing GraphQL operations.
///
/// Implementations must be safe to call from many tasks at once.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute one operation.
    ///
    /// Returns `Ok(None)` when the response carried no `data` (or `null`);
    /// callers that expect a payload turn that into
    /// [`TransportError::MissingData`]. Returns
    /// [`TransportError::Cancelled`] if `cancel` fires first.
    async fn execute(
        &self,
        operation: Operation,
        variables: &Variables,
        cancel: &CancellationToken,
    ) -> Result<Option<Value>, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(
        &self,
        operation: Operation,
        variables: &Variables,
        cancel: &CancellationToken,
    ) -> Result<Option<Value>, TransportError> {
        (**self).execute(operation, variables, cancel).await
    }
}

/// Map a reqwest failure to a network error, naming timeouts explicitly.
pub(crate) fn network_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Network(format!("request timed out: {error}"))
    } else {
        TransportError::Network(error.to_string())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-process fake backends.

    use axum::Router;

    /// Serve `router` on an ephemeral local port, returning its base URL.
    pub(crate) async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }
}
