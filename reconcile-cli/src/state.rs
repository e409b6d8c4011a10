//! Local record of created entities.
//!
//! The state file maps an address chosen by the user to the kind and last
//! known remote state of one entity. Reconcilers need the recorded state
//! (ids included) to target reads, updates and deletes.

use anyhow::{bail, Context, Result};
use reconcile_types::EntityKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// One recorded entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResource {
    /// Entity kind.
    pub kind: EntityKind,
    /// Last known remote state.
    pub state: Value,
}

/// All recorded entities, keyed by address.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StateStore {
    /// Recorded entities.
    #[serde(default)]
    pub resources: BTreeMap<String, StoredResource>,
}

impl StateStore {
    /// Load the state file. A missing file is an empty store.
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read state file {}", path.display()))
            }
        };
        serde_json::from_str(&contents)
            .with_context(|| format!("Invalid state file {}", path.display()))
    }

    /// Write the state file.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, contents)
            .await
            .with_context(|| format!("Failed to write state file {}", tmp.display()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .with_context(|| format!("Failed to replace state file {}", path.display()))?;
        Ok(())
    }

    /// Whether `address` is recorded.
    pub fn contains(&self, address: &str) -> bool {
        self.resources.contains_key(address)
    }

    /// The recorded state of `address`, which must be of `kind`.
    pub fn get(&self, address: &str, kind: EntityKind) -> Result<&Value> {
        let Some(resource) = self.resources.get(address) else {
            bail!("No {kind} recorded at {address}");
        };
        if resource.kind != kind {
            bail!(
                "{address} is recorded as a {}, not a {kind}",
                resource.kind
            );
        }
        Ok(&resource.state)
    }

    /// Record `state` at `address`, replacing any previous entry.
    pub fn insert(&mut self, address: &str, kind: EntityKind, state: Value) {
        self.resources
            .insert(address.to_string(), StoredResource { kind, state });
    }

    /// Forget `address`.
    pub fn remove(&mut self, address: &str) -> Option<StoredResource> {
        self.resources.remove(address)
    }
}
