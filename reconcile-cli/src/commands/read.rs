//! Refresh a recorded entity.

use anyhow::Result;
use reconcile_client::{Session, Transport};
use reconcile_types::EntityKind;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::{dispatch, print_json, Action, Outcome};
use crate::state::StateStore;

/// Run the read command.
///
/// An entity that no longer exists remotely is dropped from the state file.
pub async fn run<T: Transport>(
    session: &Session<T>,
    state_path: &Path,
    kind: EntityKind,
    address: &str,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut store = StateStore::load(state_path).await?;
    let prior = store.get(address, kind)?.clone();

    match dispatch(session, kind, Action::Read { prior }, cancel).await? {
        Outcome::Gone => {
            warn!(address, %kind, "entity no longer exists remotely");
            store.remove(address);
            store.save(state_path).await?;
            println!("{address}: {kind} no longer exists, removed from state");
            Ok(())
        }
        outcome => {
            let state = outcome.into_state()?;
            store.insert(address, kind, state.clone());
            store.save(state_path).await?;
            print_json(&state)
        }
    }
}
