//! Delete a recorded entity.

use anyhow::Result;
use reconcile_client::{Session, Transport};
use reconcile_types::EntityKind;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use super::{dispatch, Action};
use crate::state::StateStore;

/// Run the delete command.
pub async fn run<T: Transport>(
    session: &Session<T>,
    state_path: &Path,
    kind: EntityKind,
    address: &str,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut store = StateStore::load(state_path).await?;
    let prior = store.get(address, kind)?.clone();

    dispatch(session, kind, Action::Delete { prior }, cancel).await?;

    store.remove(address);
    store.save(state_path).await?;
    println!("{address}: {kind} deleted");
    Ok(())
}
