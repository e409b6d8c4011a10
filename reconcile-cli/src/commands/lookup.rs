//! Fetch an existing pipe or phase by id.

use anyhow::Result;
use clap::ValueEnum;
use reconcile_client::{Session, Transport};
use reconcile_types::EntityId;
use tokio_util::sync::CancellationToken;

use super::print_json;

/// Kinds that can be looked up by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LookupKind {
    /// A pipe.
    Pipe,
    /// A phase.
    Phase,
}

/// Run the lookup command.
pub async fn run<T: Transport>(
    session: &Session<T>,
    kind: LookupKind,
    id: &str,
    cancel: &CancellationToken,
) -> Result<()> {
    let id = EntityId::parse(id)?;
    let state = match kind {
        LookupKind::Pipe => serde_json::to_value(session.pipes().lookup(&id, cancel).await?)?,
        LookupKind::Phase => serde_json::to_value(session.phases().lookup(&id, cancel).await?)?,
    };
    print_json(&state)
}
