//! Structured JSON attributes (`event_params`, `action_params`, `condition`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::TypesError;

/// A structured attribute value: null, bool, number, string, ordered list or
/// ordered map of string to value.
///
/// Validated once when the desired state is accepted and carried as a value
/// from then on, so operations never re-parse text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(Value);

impl Params {
    /// Parse raw JSON text for `attribute`.
    ///
    /// Blank text means the attribute is absent and yields `Ok(None)`.
    pub fn parse(attribute: &str, text: &str) -> Result<Option<Self>, TypesError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(text)
            .map(|value| Some(Self(value)))
            .map_err(|source| TypesError::InvalidParams {
                attribute: attribute.to_string(),
                source,
            })
    }

    /// Borrow the underlying value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Params {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
