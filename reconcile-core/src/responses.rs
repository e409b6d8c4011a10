//! Payload shapes, decoded from the root field of each operation.
//!
//! Every attribute the engine does not strictly need is optional, so a
//! backend that echoes less than was selected still decodes.

use reconcile_types::{EntityId, RepoRef};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// `{ id }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IdRef {
    /// Entity id.
    pub id: EntityId,
}

/// `{ success }` returned by every delete mutation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeletePayload {
    /// Whether the backend actually deleted the entity.
    #[serde(default)]
    pub success: bool,
}

// ===========================================
// Pipe
// ===========================================

/// A pipe node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PipeNode {
    /// Pipe id.
    pub id: EntityId,
    /// Pipe name.
    #[serde(default)]
    pub name: Option<String>,
    /// Visibility.
    #[serde(default)]
    pub public: Option<bool>,
    /// Owning organization.
    #[serde(default)]
    pub organization: Option<IdRef>,
}

/// `createPipe` / `updatePipe` payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PipePayload {
    /// The pipe, absent if the mutation was rejected.
    #[serde(default)]
    pub pipe: Option<PipeNode>,
}

/// Phases of a pipe.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PipePhases {
    /// Phase ids, in backend order.
    #[serde(default)]
    pub phases: Vec<IdRef>,
}

/// Modern uuid of a pipe.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PipeUuid {
    /// Uuid, absent or empty if the backend did not resolve it.
    #[serde(default)]
    pub uuid: Option<String>,
}

impl PipeUuid {
    /// The uuid, if usable.
    pub fn usable(&self) -> Option<&str> {
        self.uuid.as_deref().filter(|uuid| !uuid.is_empty())
    }
}

// ===========================================
// Phase
// ===========================================

/// Legacy integer repository id of a phase.
///
/// The backend reports it as a number, but some deployments serialize it as
/// a string; both decode. Zero means "unknown".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyRepoId(pub u64);

impl LegacyRepoId {
    /// The id as an [`EntityId`], if usable.
    pub fn usable(&self) -> Option<EntityId> {
        (self.0 != 0).then(|| EntityId::from(self.0.to_string()))
    }
}

impl<'de> Deserialize<'de> for LegacyRepoId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(LegacyRepoId(n)),
            Raw::Text(text) => text
                .trim()
                .parse()
                .map(LegacyRepoId)
                .map_err(|_| serde::de::Error::custom(format!("invalid repo_id {text:?}"))),
        }
    }
}

/// A phase node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PhaseNode {
    /// Phase id.
    pub id: EntityId,
    /// Phase name.
    #[serde(default)]
    pub name: Option<String>,
    /// Legacy repository id (the owning pipe).
    #[serde(default)]
    pub repo_id: Option<LegacyRepoId>,
}

/// `createPhase` / `updatePhase` payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PhasePayload {
    /// The phase, absent if the mutation was rejected.
    #[serde(default)]
    pub phase: Option<PhaseNode>,
}

/// Only the legacy repo id of a phase.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PhaseRepo {
    /// Legacy repository id.
    #[serde(default)]
    pub repo_id: Option<LegacyRepoId>,
}

impl PhaseRepo {
    /// The repo id, if usable.
    pub fn usable(&self) -> Option<EntityId> {
        self.repo_id.and_then(|id| id.usable())
    }
}

/// Fields of a phase.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PhaseFields {
    /// Field nodes, in backend order.
    #[serde(default)]
    pub fields: Vec<FieldNode>,
}

impl PhaseFields {
    /// Linear scan for the field with `id`.
    pub fn find(&self, id: &EntityId) -> Option<&FieldNode> {
        self.fields.iter().find(|field| field.id == *id)
    }
}

// ===========================================
// Field
// ===========================================

/// A phase field node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldNode {
    /// Field id.
    pub id: EntityId,
    /// Secondary id.
    #[serde(default)]
    pub internal_id: Option<EntityId>,
    /// Label.
    #[serde(default)]
    pub label: Option<String>,
    /// Field type.
    #[serde(default, rename = "type")]
    pub field_type: Option<String>,
    /// Required flag.
    #[serde(default)]
    pub required: Option<bool>,
}

/// `createPhaseField` / `updatePhaseField` payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldPayload {
    /// The field, absent if the mutation was rejected.
    #[serde(default)]
    pub phase_field: Option<FieldNode>,
}

// ===========================================
// Automation
// ===========================================

/// An automation node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AutomationNode {
    /// Automation id.
    pub id: EntityId,
    /// Name.
    #[serde(default)]
    pub name: Option<String>,
    /// Event type.
    #[serde(default)]
    pub event_id: Option<String>,
    /// Action type.
    #[serde(default)]
    pub action_id: Option<String>,
    /// Active flag.
    #[serde(default)]
    pub active: Option<bool>,
    /// Event repository.
    #[serde(default)]
    pub event_repo: Option<RepoRef>,
    /// Action repository (pipe or table).
    #[serde(default)]
    pub action_repo_v2: Option<RepoRef>,
}

/// `createAutomation` / `updateAutomation` payload.
///
/// The backend answers a rejected mutation with `automation: null` and a
/// populated `error_details` instead of a GraphQL error.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AutomationPayload {
    /// The automation, absent if rejected.
    #[serde(default)]
    pub automation: Option<AutomationNode>,
    /// Structured rejection details.
    #[serde(default)]
    pub error_details: Option<Value>,
}

impl AutomationPayload {
    /// Rejection details rendered for an error message.
    pub fn rejection(&self) -> String {
        match &self.error_details {
            Some(details) if !details.is_null() => details.to_string(),
            _ => "no automation returned and no error_details given".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decode_root, Operation};
    use reconcile_types::RepoKind;
    use serde_json::json;

    #[test]
    fn legacy_repo_id_accepts_number_and_string() {
        let n: PhaseRepo = serde_json::from_value(json!({"repo_id": 301})).unwrap();
        assert_eq!(n.usable(), Some(EntityId::from("301")));
        let s: PhaseRepo = serde_json::from_value(json!({"repo_id": "302"})).unwrap();
        assert_eq!(s.usable(), Some(EntityId::from("302")));
    }

    #[test]
    fn zero_or_missing_repo_id_is_unusable() {
        let zero: PhaseRepo = serde_json::from_value(json!({"repo_id": 0})).unwrap();
        assert_eq!(zero.usable(), None);
        let missing: PhaseRepo = serde_json::from_value(json!({})).unwrap();
        assert_eq!(missing.usable(), None);
    }

    #[test]
    fn garbage_repo_id_fails_to_decode() {
        let result: Result<PhaseRepo, _> = serde_json::from_value(json!({"repo_id": "abc"}));
        assert!(result.is_err());
    }

    #[test]
    fn empty_uuid_is_unusable() {
        let uuid: PipeUuid = serde_json::from_value(json!({"uuid": ""})).unwrap();
        assert_eq!(uuid.usable(), None);
    }

    #[test]
    fn phase_fields_scan_by_id() {
        let fields: PhaseFields = serde_json::from_value(json!({
            "fields": [
                {"id": "title", "internal_id": "1001", "label": "Title"},
                {"id": "due", "internal_id": "1002", "label": "Due"}
            ]
        }))
        .unwrap();
        let due = fields.find(&"due".into()).unwrap();
        assert_eq!(due.internal_id, Some(EntityId::from("1002")));
        assert!(fields.find(&"missing".into()).is_none());
    }

    #[test]
    fn automation_payload_surfaces_error_details() {
        let data = json!({
            "createAutomation": {
                "automation": null,
                "error_details": {"object_name": "Automation", "messages": ["invalid"]}
            }
        });
        let payload: AutomationPayload =
            decode_root(Some(data), Operation::CreateAutomation.root_field())
                .unwrap()
                .unwrap();
        assert!(payload.automation.is_none());
        assert!(payload.rejection().contains("invalid"));
    }

    #[test]
    fn automation_node_keeps_repo_kinds() {
        let node: AutomationNode = serde_json::from_value(json!({
            "id": "a1",
            "event_repo": {"__typename": "Pipe", "id": "1"},
            "action_repo_v2": {"__typename": "Table", "id": "t9"}
        }))
        .unwrap();
        assert_eq!(node.event_repo.unwrap().kind, Some(RepoKind::Pipe));
        let action = node.action_repo_v2.unwrap();
        assert_eq!(action.kind, Some(RepoKind::Table));
        assert_eq!(action.id.as_str(), "t9");
    }
}
