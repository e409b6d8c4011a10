//! Apply a patch to a recorded entity.

use anyhow::Result;
use reconcile_client::{Session, Transport};
use reconcile_types::EntityKind;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use super::{dispatch, print_json, read_json, Action};
use crate::state::StateStore;

/// Run the update command.
pub async fn run<T: Transport>(
    session: &Session<T>,
    state_path: &Path,
    kind: EntityKind,
    address: &str,
    patch_path: &Path,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut store = StateStore::load(state_path).await?;
    let prior = store.get(address, kind)?.clone();
    let patch = read_json(patch_path).await?;

    let state = dispatch(session, kind, Action::Update { prior, patch }, cancel)
        .await?
        .into_state()?;

    store.insert(address, kind, state.clone());
    store.save(state_path).await?;
    print_json(&state)
}
