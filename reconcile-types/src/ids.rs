//! Identity types for Pipefy entities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// Opaque remote identifier assigned by the backend on creation.
///
/// Ids are never minted locally; the only way to get one is from a
/// successful create response (or from the state store that recorded it).
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Parse a user-supplied id, rejecting empty strings.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TypesError::EmptyId);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the backend handed back an empty id.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

/// The entity kinds this engine reconciles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A pipe (process board).
    Pipe,
    /// A phase inside a pipe.
    Phase,
    /// A field inside a phase.
    Field,
    /// An automation rule.
    Automation,
}

impl EntityKind {
    /// Lowercase name used in messages and in the state store.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Pipe => "pipe",
            EntityKind::Phase => "phase",
            EntityKind::Field => "field",
            EntityKind::Automation => "automation",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pipe" => Ok(EntityKind::Pipe),
            "phase" => Ok(EntityKind::Phase),
            "field" => Ok(EntityKind::Field),
            "automation" => Ok(EntityKind::Automation),
            other => Err(TypesError::UnknownKind(other.to_string())),
        }
    }
}

/// Concrete repository type behind a polymorphic repo reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RepoKind {
    /// A pipe.
    Pipe,
    /// A database table.
    Table,
    /// Any other backend type name.
    Other(String),
}

impl From<String> for RepoKind {
    fn from(typename: String) -> Self {
        match typename.as_str() {
            "Pipe" => RepoKind::Pipe,
            "Table" => RepoKind::Table,
            _ => RepoKind::Other(typename),
        }
    }
}

impl From<RepoKind> for String {
    fn from(kind: RepoKind) -> Self {
        match kind {
            RepoKind::Pipe => "Pipe".to_string(),
            RepoKind::Table => "Table".to_string(),
            RepoKind::Other(name) => name,
        }
    }
}

/// A polymorphic repository reference (`event_repo`, `action_repo`).
///
/// Deserializes from the GraphQL shape `{ "__typename": "Pipe", "id": "1" }`;
/// the type name is optional because not every query selects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    /// Resolved repository type, when the backend reported it.
    #[serde(
        rename = "__typename",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<RepoKind>,
    /// Repository id.
    pub id: EntityId,
}
