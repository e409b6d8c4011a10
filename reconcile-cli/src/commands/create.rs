//! Create an entity and record it.

use anyhow::{bail, Result};
use reconcile_client::{Session, Transport};
use reconcile_types::EntityKind;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use super::{dispatch, print_json, read_json, Action};
use crate::state::StateStore;

/// Run the create command.
pub async fn run<T: Transport>(
    session: &Session<T>,
    state_path: &Path,
    kind: EntityKind,
    address: &str,
    spec_path: &Path,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut store = StateStore::load(state_path).await?;
    if store.contains(address) {
        bail!("{address} is already recorded; delete it or pick another address");
    }

    let spec = read_json(spec_path).await?;
    let state = dispatch(session, kind, Action::Create { spec }, cancel)
        .await?
        .into_state()?;

    store.insert(address, kind, state.clone());
    store.save(state_path).await?;
    print_json(&state)
}
