//! Print the state file.

use anyhow::Result;
use std::path::Path;

use crate::state::StateStore;

/// Run the show command.
pub async fn run(state_path: &Path) -> Result<()> {
    let store = StateStore::load(state_path).await?;
    if store.resources.is_empty() {
        println!("No entities recorded in {}", state_path.display());
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(&store)?);
    Ok(())
}
