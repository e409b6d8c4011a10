//! Mock transport for testing.
//!
//! Allows scripting replies per operation and capturing every call for
//! verification. Clones share state, so a test can keep a handle while a
//! [`Session`](crate::Session) owns another.

use super::Transport;
use async_trait::async_trait;
use reconcile_core::{Operation, TransportError, Variables};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Outcome a scripted operation produces.
pub type MockReply = Result<Option<Value>, TransportError>;

/// One call received by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Operation issued.
    pub operation: Operation,
    /// Variables sent with it.
    pub variables: Variables,
}

/// Start and end markers, in the order the mock observed them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockEvent {
    /// A call entered the transport.
    Begin(Operation),
    /// A call left the transport.
    End(Operation),
}

/// Mock transport for testing.
#[derive(Debug, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    calls: Vec<RecordedCall>,
    events: Vec<MockEvent>,
    queued: HashMap<Operation, VecDeque<MockReply>>,
    sticky: HashMap<Operation, MockReply>,
    latency: Option<Duration>,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, MockTransportInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a reply for the next unanswered call of `operation`.
    pub fn queue(&self, operation: Operation, reply: MockReply) {
        self.inner()
            .queued
            .entry(operation)
            .or_default()
            .push_back(reply);
    }

    /// Queue a `data` object for the next unanswered call of `operation`.
    pub fn queue_data(&self, operation: Operation, data: Value) {
        self.queue(operation, Ok(Some(data)));
    }

    /// Reply to every call of `operation` once its queue is empty.
    pub fn respond(&self, operation: Operation, reply: MockReply) {
        self.inner().sticky.insert(operation, reply);
    }

    /// Reply with `data` to every call of `operation` once its queue is empty.
    pub fn respond_data(&self, operation: Operation, data: Value) {
        self.respond(operation, Ok(Some(data)));
    }

    /// Cause the next call of `operation` to fail with the given error.
    pub fn fail_next(&self, operation: Operation, error: TransportError) {
        self.inner()
            .queued
            .entry(operation)
            .or_default()
            .push_front(Err(error));
    }

    /// Hold every call for `latency` before replying.
    pub fn set_latency(&self, latency: Duration) {
        self.inner().latency = Some(latency);
    }

    /// Get all calls, in arrival order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.inner().calls.clone()
    }

    /// Get the operations called, in arrival order.
    pub fn operations(&self) -> Vec<Operation> {
        self.inner().calls.iter().map(|c| c.operation).collect()
    }

    /// Get the calls of one operation.
    pub fn calls_for(&self, operation: Operation) -> Vec<RecordedCall> {
        self.inner()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .cloned()
            .collect()
    }

    /// Get begin/end markers, in order.
    pub fn events(&self) -> Vec<MockEvent> {
        self.inner().events.clone()
    }

    /// Clear all state (calls, scripts, latency).
    pub fn reset(&self) {
        *self.inner() = MockTransportInner::default();
    }
}

impl Clone for MockTransport {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(
        &self,
        operation: Operation,
        variables: &Variables,
        cancel: &CancellationToken,
    ) -> Result<Option<Value>, TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }

        let (reply, latency) = {
            let mut inner = self.inner();
            inner.calls.push(RecordedCall {
                operation,
                variables: variables.clone(),
            });
            inner.events.push(MockEvent::Begin(operation));

            let queued = inner
                .queued
                .get_mut(&operation)
                .and_then(|queue| queue.pop_front());
            let reply = match queued {
                Some(reply) => reply,
                None => inner.sticky.get(&operation).cloned().unwrap_or_else(|| {
                    Err(TransportError::Network(format!(
                        "no mock reply scripted for {operation}"
                    )))
                }),
            };
            (reply, inner.latency)
        };

        if let Some(latency) = latency {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.inner().events.push(MockEvent::End(operation));
                    return Err(TransportError::Cancelled);
                }
                _ = tokio::time::sleep(latency) => {}
            }
        }

        self.inner().events.push(MockEvent::End(operation));
        reply
    }
}
