//! Wire envelope and response classification.
//!
//! Requests are a single JSON object `{"query": ..., "variables": ...}`;
//! responses are `{"data": ..., "errors": [{"message": ...}]}`.
//!
//! [`classify`] applies the classification order strictly:
//! 1. HTTP status outside `[200, 300)` → [`TransportError::HttpStatus`]
//! 2. body not an envelope → [`TransportError::Decode`]
//! 3. any envelope error → [`TransportError::Application`] (first message)
//! 4. otherwise the `data` object, or `None` when absent or null
//!
//! Network failures happen before a status exists and are classified by the
//! transport itself.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Operation, TransportError, Variables};

/// Number of characters kept in a decode-failure preview.
pub const PREVIEW_CHARS: usize = 200;

/// A GraphQL request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphQlRequest<'a> {
    /// Operation document.
    pub query: &'a str,
    /// Named variables, omitted when empty.
    #[serde(skip_serializing_if = "no_variables")]
    pub variables: &'a Variables,
}

fn no_variables(variables: &&Variables) -> bool {
    variables.is_empty()
}

impl<'a> GraphQlRequest<'a> {
    /// Build the request for `operation`.
    pub fn new(operation: Operation, variables: &'a Variables) -> Self {
        Self {
            query: operation.document(),
            variables,
        }
    }
}

/// A single application-level error.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GraphQlError {
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
}

/// A GraphQL response envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GraphQlResponse {
    /// Payload, if any.
    #[serde(default)]
    pub data: Option<Value>,
    /// Application errors, if any.
    #[serde(default)]
    pub errors: Option<Vec<GraphQlError>>,
}

/// Classify a raw HTTP response.
///
/// Returns `Ok(None)` for a successful response without data; callers that
/// expect a payload turn that into [`TransportError::MissingData`] through
/// [`decode_root`], fire-and-forget callers accept it.
pub fn classify(
    status: u16,
    content_type: &str,
    body: &[u8],
) -> Result<Option<Value>, TransportError> {
    if !(200..300).contains(&status) {
        return Err(TransportError::HttpStatus {
            status,
            content_type: content_type.to_string(),
            body: String::from_utf8_lossy(body).into_owned(),
        });
    }

    let envelope: GraphQlResponse =
        serde_json::from_slice(body).map_err(|e| TransportError::Decode {
            status: Some(status),
            reason: e.to_string(),
            preview: preview(&String::from_utf8_lossy(body)),
        })?;

    if let Some(first) = envelope.errors.as_deref().and_then(|errors| errors.first()) {
        return Err(TransportError::Application {
            message: first.message.clone(),
        });
    }

    Ok(envelope.data.filter(|data| !data.is_null()))
}

/// Extract and decode the payload under `root` from a classified response.
///
/// - `data` absent → [`TransportError::MissingData`]
/// - root field absent or null → `Ok(None)` (the entity does not exist, or
///   the mutation returned nothing)
/// - root field of the wrong shape → [`TransportError::Decode`] without a
///   status, since the HTTP status is no longer known at this point
pub fn decode_root<D: DeserializeOwned>(
    data: Option<Value>,
    root: &str,
) -> Result<Option<D>, TransportError> {
    let data = data.ok_or(TransportError::MissingData)?;
    let node = match data.get(root) {
        Some(node) if !node.is_null() => node,
        _ => return Ok(None),
    };
    D::deserialize(node)
        .map(Some)
        .map_err(|e| TransportError::Decode {
            status: None,
            reason: format!("{root}: {e}"),
            preview: preview(&node.to_string()),
        })
}

/// Bounded preview of `text`: the first [`PREVIEW_CHARS`] characters, with
/// `...` appended when truncated.
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ===========================================
    // Request Envelope Tests
    // ===========================================

    #[test]
    fn request_omits_empty_variables() {
        let vars = Variables::new();
        let req = GraphQlRequest::new(Operation::ReadPipe, &vars);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 1);
        assert_eq!(json["query"], Operation::ReadPipe.document());
    }

    #[test]
    fn request_carries_variables() {
        let mut vars = Variables::new();
        vars.insert("id".into(), json!("pipe_1"));
        let req = GraphQlRequest::new(Operation::ReadPipe, &vars);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["variables"], json!({"id": "pipe_1"}));
    }

    // ===========================================
    // Classification Tests
    // ===========================================

    #[test]
    fn non_2xx_is_http_status_error() {
        let err = classify(500, "text/plain", b"oops").unwrap_err();
        assert_eq!(
            err,
            TransportError::HttpStatus {
                status: 500,
                content_type: "text/plain".into(),
                body: "oops".into(),
            }
        );
    }

    #[test]
    fn status_is_checked_before_body() {
        // A 4xx carrying a GraphQL error body is still an HTTP status failure.
        let err = classify(401, "application/json", br#"{"errors":[{"message":"unauthorized"}]}"#)
            .unwrap_err();
        assert!(matches!(err, TransportError::HttpStatus { status: 401, .. }));
    }

    #[test]
    fn malformed_body_is_decode_error() {
        let err = classify(201, "application/json", b"not json").unwrap_err();
        match err {
            TransportError::Decode { status, reason, preview } => {
                assert_eq!(status, Some(201));
                assert!(reason.contains("expected"));
                assert_eq!(preview, "not json");
            }
            other => panic!("Expected Decode, got {:?}", other),
        }
    }

    #[test]
    fn first_graphql_error_wins() {
        let body = br#"{"errors":[{"message":"boom"},{"message":"second"}]}"#;
        let err = classify(200, "application/json", body).unwrap_err();
        assert_eq!(
            err,
            TransportError::Application {
                message: "boom".into()
            }
        );
    }

    #[test]
    fn errors_win_over_data() {
        let body = br#"{"data":{"pipe":null},"errors":[{"message":"not allowed"}]}"#;
        assert!(matches!(
            classify(200, "application/json", body),
            Err(TransportError::Application { .. })
        ));
    }

    #[test]
    fn empty_errors_list_is_success() {
        let body = br#"{"data":{"ok":true},"errors":[]}"#;
        let data = classify(200, "application/json", body).unwrap();
        assert_eq!(data, Some(json!({"ok": true})));
    }

    #[test]
    fn absent_and_null_data_are_none() {
        assert_eq!(classify(200, "", b"{}").unwrap(), None);
        assert_eq!(classify(204, "", br#"{"data":null}"#).unwrap(), None);
    }

    // ===========================================
    // Root Decoding Tests
    // ===========================================

    #[derive(Debug, Deserialize, PartialEq)]
    struct Node {
        id: String,
    }

    #[test]
    fn decode_root_requires_data() {
        let result: Result<Option<Node>, _> = decode_root(None, "pipe");
        assert_eq!(result.unwrap_err(), TransportError::MissingData);
    }

    #[test]
    fn decode_root_null_or_absent_is_none() {
        let none: Option<Node> = decode_root(Some(json!({"pipe": null})), "pipe").unwrap();
        assert!(none.is_none());
        let none: Option<Node> = decode_root(Some(json!({})), "pipe").unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn decode_root_decodes_shape() {
        let node: Option<Node> =
            decode_root(Some(json!({"pipe": {"id": "p1", "extra": 1}})), "pipe").unwrap();
        assert_eq!(node, Some(Node { id: "p1".into() }));
    }

    #[test]
    fn decode_root_wrong_shape_is_decode_error() {
        let result: Result<Option<Node>, _> = decode_root(Some(json!({"pipe": [1, 2]})), "pipe");
        match result.unwrap_err() {
            TransportError::Decode { status, reason, .. } => {
                assert_eq!(status, None);
                assert!(reason.starts_with("pipe: "));
            }
            other => panic!("Expected Decode, got {:?}", other),
        }
    }

    // ===========================================
    // Preview Tests
    // ===========================================

    #[test]
    fn preview_truncates_long_bodies() {
        let long = "x".repeat(500);
        let p = preview(&long);
        assert_eq!(p.len(), PREVIEW_CHARS + 3);
        assert!(p.ends_with("..."));
    }

    #[test]
    fn preview_counts_characters_not_bytes() {
        let text = "é".repeat(PREVIEW_CHARS + 1);
        let p = preview(&text);
        assert_eq!(p.chars().count(), PREVIEW_CHARS + 3);
    }

    #[test]
    fn preview_keeps_short_bodies() {
        assert_eq!(preview("short"), "short");
    }
}
