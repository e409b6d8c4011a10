//! CLI command implementations.

pub mod create;
pub mod delete;
pub mod lookup;
pub mod read;
pub mod show;
pub mod update;

pub use lookup::LookupKind;

use anyhow::{bail, Context, Result};
use reconcile_client::{Reconciler, Session, Transport};
use reconcile_types::{EntityKind, ReadOutcome};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// A lifecycle operation with its JSON inputs.
pub(crate) enum Action {
    Create { spec: Value },
    Read { prior: Value },
    Update { prior: Value, patch: Value },
    Delete { prior: Value },
}

/// What an [`Action`] produced.
#[derive(Debug, PartialEq)]
pub(crate) enum Outcome {
    State(Value),
    Gone,
    Deleted,
}

impl Outcome {
    fn into_state(self) -> Result<Value> {
        match self {
            Outcome::State(state) => Ok(state),
            other => bail!("expected a remote state, got {other:?}"),
        }
    }
}

/// Run `action` with the reconciler for `kind`.
pub(crate) async fn dispatch<T: Transport>(
    session: &Session<T>,
    kind: EntityKind,
    action: Action,
    cancel: &CancellationToken,
) -> Result<Outcome> {
    match kind {
        EntityKind::Pipe => apply(&session.pipes(), action, cancel).await,
        EntityKind::Phase => apply(&session.phases(), action, cancel).await,
        EntityKind::Field => apply(&session.fields(), action, cancel).await,
        EntityKind::Automation => apply(&session.automations(), action, cancel).await,
    }
}

async fn apply<R>(reconciler: &R, action: Action, cancel: &CancellationToken) -> Result<Outcome>
where
    R: Reconciler,
    R::Spec: DeserializeOwned,
    R::Patch: DeserializeOwned,
    R::State: Serialize + DeserializeOwned,
{
    match action {
        Action::Create { spec } => {
            let spec: R::Spec = decode(spec, R::KIND, "spec")?;
            let state = reconciler.create(&spec, cancel).await?;
            Ok(Outcome::State(serde_json::to_value(state)?))
        }
        Action::Read { prior } => {
            let prior: R::State = decode(prior, R::KIND, "recorded state")?;
            match reconciler.read(&prior, cancel).await? {
                ReadOutcome::Present(state) => Ok(Outcome::State(serde_json::to_value(state)?)),
                ReadOutcome::Gone => Ok(Outcome::Gone),
            }
        }
        Action::Update { prior, patch } => {
            let prior: R::State = decode(prior, R::KIND, "recorded state")?;
            let patch: R::Patch = decode(patch, R::KIND, "patch")?;
            let state = reconciler.update(&prior, &patch, cancel).await?;
            Ok(Outcome::State(serde_json::to_value(state)?))
        }
        Action::Delete { prior } => {
            let prior: R::State = decode(prior, R::KIND, "recorded state")?;
            reconciler.delete(&prior, cancel).await?;
            Ok(Outcome::Deleted)
        }
    }
}

fn decode<D: DeserializeOwned>(value: Value, kind: EntityKind, what: &str) -> Result<D> {
    serde_json::from_value(value).with_context(|| format!("Invalid {kind} {what}"))
}

/// Read a JSON input file.
pub(crate) async fn read_json(path: &Path) -> Result<Value> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Print a value as pretty JSON on stdout.
pub(crate) fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted sessions and scratch state files.

    use reconcile_client::{MockTransport, Session};
    use std::path::PathBuf;
    use tempfile::TempDir;

    pub(crate) struct Fixture {
        pub mock: MockTransport,
        pub session: Session<MockTransport>,
        pub dir: TempDir,
    }

    impl Fixture {
        pub fn new() -> Self {
            let mock = MockTransport::new();
            Self {
                session: Session::new(mock.clone()),
                mock,
                dir: tempfile::tempdir().unwrap(),
            }
        }

        pub fn state_path(&self) -> PathBuf {
            self.dir.path().join("pipefy-state.json")
        }

        pub fn write(&self, name: &str, value: serde_json::Value) -> PathBuf {
            let path = self.dir.path().join(name);
            std::fs::write(&path, value.to_string()).unwrap();
            path
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile_client::{MockTransport, Operation};
    use serde_json::json;

    #[tokio::test]
    async fn dispatch_rejects_malformed_spec() {
        let session = Session::new(MockTransport::new());

        let err = dispatch(
            &session,
            EntityKind::Phase,
            Action::Create {
                spec: json!({"name": "To Do"}),
            },
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("Invalid phase spec"));
    }

    #[tokio::test]
    async fn dispatch_rejects_immutable_attribute_in_patch() {
        let session = Session::new(MockTransport::new());
        let prior = json!({"id": "pipe_1", "name": "p", "organization_id": "org_1"});

        let err = dispatch(
            &session,
            EntityKind::Pipe,
            Action::Update {
                prior,
                patch: json!({"organization_id": "org_2"}),
            },
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("Invalid pipe patch"));
    }

    #[tokio::test]
    async fn dispatch_reports_gone() {
        let mock = MockTransport::new();
        mock.queue_data(Operation::ReadPhase, json!({"phase": null}));
        let session = Session::new(mock.clone());
        let prior = json!({"id": "phase_1", "pipe_id": "pipe_1", "name": "To Do"});

        let outcome = dispatch(
            &session,
            EntityKind::Phase,
            Action::Read { prior },
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, Outcome::Gone);
        assert!(outcome.into_state().is_err());
    }
}
