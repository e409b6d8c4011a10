//! Error types for reconcile-types.

use thiserror::Error;

/// Errors raised while accepting desired-state values.
#[derive(Debug, Error)]
pub enum TypesError {
    /// A structured attribute was not valid JSON.
    #[error("invalid {attribute} JSON: {source}")]
    InvalidParams {
        /// Attribute name (e.g. `event_params`).
        attribute: String,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// An entity id was empty.
    #[error("entity id must not be empty")]
    EmptyId,

    /// Unknown entity kind name.
    #[error("unknown entity kind: {0}")]
    UnknownKind(String),
}
