//! # reconcile-types
//!
//! Entity and identity types for the Pipefy reconciliation engine.
//!
//! This crate provides the foundational types used across all reconcile crates:
//! - [`EntityId`], [`EntityKind`], [`RepoRef`] - Identity types
//! - [`Params`] - Structured JSON attributes, validated once at the boundary
//! - Desired specs, update patches and remote states for each entity kind
//! - [`ReadOutcome`] - Drift signal returned by reads
//! - [`TypesError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod entities;
mod error;
mod ids;
mod params;

pub use entities::{
    AutomationPatch, AutomationSpec, AutomationState, FieldPatch, FieldSpec, FieldState,
    PhasePatch, PhaseSpec, PhaseState, PipePatch, PipeSpec, PipeState, ReadOutcome,
};
pub use error::TypesError;
pub use ids::{EntityId, EntityKind, RepoKind, RepoRef};
pub use params::Params;
