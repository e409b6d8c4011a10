//! # reconcile-core
//!
//! Pure logic for the Pipefy reconciliation engine (no I/O, instant tests).
//!
//! This crate holds everything about talking to the GraphQL endpoint that
//! does not need a socket:
//! - [`Operation`]: the catalogue of named operations and their documents
//! - [`envelope`]: the wire request/response envelope and the response
//!   classifier that turns `(status, content-type, body)` into data or a
//!   [`TransportError`]
//! - [`variables`]: builders that map specs and patches to GraphQL variables,
//!   omitting every attribute that is not set
//! - [`responses`]: payload shapes and helpers to interpret them
//!
//! The actual I/O is performed by `reconcile-client`, which feeds HTTP
//! responses through [`classify`] and interprets the payloads.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod envelope;
pub mod error;
pub mod operation;
pub mod responses;
pub mod variables;

pub use envelope::{classify, decode_root, preview, GraphQlRequest, GraphQlResponse, PREVIEW_CHARS};
pub use error::TransportError;
pub use operation::Operation;
pub use variables::Variables;
