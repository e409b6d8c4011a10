//! Variable builders for every operation.
//!
//! Creates send every attribute that has a defined value. Updates send the
//! id plus the attributes set in the patch, so an absent attribute never
//! appears as a key (and can never reset a remote value), while an explicit
//! `false` or `""` is sent verbatim. Immutable attributes have no field in
//! the patch types and therefore cannot be sent.

use reconcile_types::{
    AutomationPatch, AutomationSpec, EntityId, FieldPatch, FieldSpec, Params, PhasePatch,
    PhaseSpec, PipePatch, PipeSpec,
};
use serde_json::Value;

/// Named GraphQL variables.
pub type Variables = serde_json::Map<String, Value>;

/// Builder for the `input` object most mutations take.
#[derive(Debug, Default)]
pub struct Input(Variables);

impl Input {
    /// Empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` unconditionally.
    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Set `key` only if `value` is present.
    pub fn set_opt<V: Into<Value>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.set(key, value),
            None => self,
        }
    }

    /// Set a structured attribute only if present.
    pub fn set_params(self, key: &str, value: Option<&Params>) -> Self {
        self.set_opt(key, value.map(|p| p.as_value().clone()))
    }

    /// The attributes collected so far.
    pub fn fields(&self) -> &Variables {
        &self.0
    }

    /// Wrap as `{"input": {...}}`.
    pub fn into_variables(self) -> Variables {
        let mut vars = Variables::new();
        vars.insert("input".to_string(), Value::Object(self.0));
        vars
    }
}

/// `{key: id}`.
pub fn by_id(key: &str, id: &EntityId) -> Variables {
    let mut vars = Variables::new();
    vars.insert(key.to_string(), Value::String(id.as_str().to_string()));
    vars
}

/// Variables for [`Operation::CreatePipe`](crate::Operation::CreatePipe).
pub fn create_pipe(spec: &PipeSpec) -> Variables {
    Input::new()
        .set("name", spec.name.as_str())
        .set("organization_id", spec.organization_id.as_str())
        .set_opt("public", spec.public)
        .into_variables()
}

/// Variables for [`Operation::UpdatePipe`](crate::Operation::UpdatePipe).
pub fn update_pipe(id: &EntityId, patch: &PipePatch) -> Variables {
    Input::new()
        .set("id", id.as_str())
        .set_opt("name", patch.name.as_deref())
        .set_opt("public", patch.public)
        .into_variables()
}

/// Variables for [`Operation::CreatePhase`](crate::Operation::CreatePhase).
pub fn create_phase(spec: &PhaseSpec) -> Variables {
    Input::new()
        .set("pipe_id", spec.pipe_id.as_str())
        .set("name", spec.name.as_str())
        .into_variables()
}

/// Variables for [`Operation::UpdatePhase`](crate::Operation::UpdatePhase).
pub fn update_phase(id: &EntityId, patch: &PhasePatch) -> Variables {
    Input::new()
        .set("id", id.as_str())
        .set_opt("name", patch.name.as_deref())
        .into_variables()
}

/// Variables for [`Operation::CreateField`](crate::Operation::CreateField).
pub fn create_field(spec: &FieldSpec) -> Variables {
    Input::new()
        .set("phase_id", spec.phase_id.as_str())
        .set("type", spec.field_type.as_str())
        .set("label", spec.label.as_str())
        .set_opt("required", spec.required)
        .into_variables()
}

/// Variables for [`Operation::UpdateField`](crate::Operation::UpdateField).
pub fn update_field(id: &EntityId, patch: &FieldPatch) -> Variables {
    Input::new()
        .set("id", id.as_str())
        .set_opt("label", patch.label.as_deref())
        .set_opt("required", patch.required)
        .into_variables()
}

/// Variables for [`Operation::DeleteField`](crate::Operation::DeleteField).
pub fn delete_field(id: &EntityId, pipe_uuid: &str) -> Variables {
    let mut vars = by_id("id", id);
    vars.insert("pipeUuid".to_string(), Value::String(pipe_uuid.to_string()));
    vars
}

/// Variables for [`Operation::CreateAutomation`](crate::Operation::CreateAutomation).
pub fn create_automation(spec: &AutomationSpec) -> Variables {
    Input::new()
        .set("name", spec.name.as_str())
        .set("action_id", spec.action_id.as_str())
        .set("event_id", spec.event_id.as_str())
        .set("event_repo_id", spec.event_repo_id.as_str())
        .set("action_repo_id", spec.action_repo_id.as_str())
        .set_params("event_params", spec.event_params.as_ref())
        .set_params("action_params", spec.action_params.as_ref())
        .set_params("condition", spec.condition.as_ref())
        .set_opt("active", spec.active)
        .into_variables()
}

/// Variables for [`Operation::UpdateAutomation`](crate::Operation::UpdateAutomation).
pub fn update_automation(id: &EntityId, patch: &AutomationPatch) -> Variables {
    Input::new()
        .set("id", id.as_str())
        .set_opt("name", patch.name.as_deref())
        .set_opt("event_id", patch.event_id.as_deref())
        .set_opt("action_id", patch.action_id.as_deref())
        .set_opt("action_repo_id", patch.action_repo_id.as_ref().map(EntityId::as_str))
        .set_params("event_params", patch.event_params.as_ref())
        .set_params("action_params", patch.action_params.as_ref())
        .set_params("condition", patch.condition.as_ref())
        .set_opt("active", patch.active)
        .into_variables()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(vars: &Variables) -> &Variables {
        vars["input"].as_object().unwrap()
    }

    #[test]
    fn create_pipe_sends_defined_attributes() {
        let spec = PipeSpec {
            name: "My Pipe".into(),
            organization_id: "org_1".into(),
            public: None,
        };
        let vars = create_pipe(&spec);
        assert_eq!(
            vars["input"],
            json!({"name": "My Pipe", "organization_id": "org_1"})
        );
    }

    #[test]
    fn update_omits_absent_attributes() {
        let vars = update_pipe(&"p1".into(), &PipePatch::default());
        assert_eq!(vars["input"], json!({"id": "p1"}));
    }

    #[test]
    fn update_sends_explicit_false_and_empty_string() {
        let patch = PipePatch {
            name: Some(String::new()),
            public: Some(false),
        };
        let vars = update_pipe(&"p1".into(), &patch);
        assert_eq!(vars["input"], json!({"id": "p1", "name": "", "public": false}));
    }

    #[test]
    fn field_update_never_sends_phase_or_type() {
        let patch = FieldPatch {
            label: Some("Title".into()),
            required: None,
        };
        let vars = update_field(&"title".into(), &patch);
        let keys: Vec<_> = input(&vars).keys().cloned().collect();
        assert_eq!(keys, vec!["id", "label"]);
    }

    #[test]
    fn create_field_includes_required_only_when_set() {
        let mut spec = FieldSpec {
            phase_id: "ph".into(),
            field_type: "short_text".into(),
            label: "Title".into(),
            required: None,
        };
        assert!(!input(&create_field(&spec)).contains_key("required"));
        spec.required = Some(false);
        assert_eq!(input(&create_field(&spec))["required"], json!(false));
    }

    #[test]
    fn automation_update_never_sends_event_repo() {
        let patch = AutomationPatch {
            name: Some("renamed".into()),
            action_params: Some(Params::from(json!({"to_phase_id": "3"}))),
            active: Some(false),
            ..Default::default()
        };
        let vars = update_automation(&"a1".into(), &patch);
        assert_eq!(
            vars["input"],
            json!({
                "id": "a1",
                "name": "renamed",
                "action_params": {"to_phase_id": "3"},
                "active": false
            })
        );
        assert!(!input(&vars).contains_key("event_repo_id"));
    }

    #[test]
    fn automation_create_sends_params_as_structured_values() {
        let spec = AutomationSpec {
            name: "Move".into(),
            event_id: "card_moved".into(),
            action_id: "move_single_card".into(),
            event_repo_id: "1".into(),
            action_repo_id: "2".into(),
            event_params: None,
            action_params: Some(Params::from(json!({"to_phase_id": "9"}))),
            condition: None,
            active: Some(true),
        };
        let vars = create_automation(&spec);
        let fields = input(&vars);
        assert_eq!(fields["action_params"], json!({"to_phase_id": "9"}));
        assert!(!fields.contains_key("event_params"));
        assert!(!fields.contains_key("condition"));
        assert_eq!(fields["event_repo_id"], json!("1"));
    }

    #[test]
    fn delete_field_carries_pipe_uuid() {
        let vars = delete_field(&"title".into(), "uuid-1");
        assert_eq!(json!(vars), json!({"id": "title", "pipeUuid": "uuid-1"}));
    }
}
