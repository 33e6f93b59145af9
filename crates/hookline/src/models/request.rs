use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{RelayError, RelayResult};

/// Body accepted by the hook endpoints.
///
/// Entries of `messages` and `system` are forwarded to the model untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestPayload {
    pub messages: Vec<Value>,
    #[serde(default)]
    pub system: Vec<Value>,
}

impl RequestPayload {
    /// Extract the payload from an already decoded request body.
    pub fn from_value(body: &Value) -> RelayResult<Self> {
        Self::deserialize(body).map_err(|e| RelayError::Validation(e.to_string()))
    }
}

/// Parameters of a single upstream converse-stream call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseRequest {
    pub messages: Vec<Value>,
    pub system: Vec<Value>,
    pub model_id: String,
}

impl ConverseRequest {
    pub fn new(payload: RequestPayload, model_id: impl Into<String>) -> Self {
        Self {
            messages: payload.messages,
            system: payload.system,
            model_id: model_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_system_defaults_to_empty() {
        let body = json!({"messages": [{"role": "user", "content": [{"text": "hi"}]}]});
        let payload = RequestPayload::from_value(&body).unwrap();
        assert_eq!(payload.messages.len(), 1);
        assert!(payload.system.is_empty());
    }

    #[test]
    fn test_missing_messages_is_rejected() {
        let err = RequestPayload::from_value(&json!({"system": []})).unwrap_err();
        assert!(matches!(err, RelayError::Validation(_)));
        assert!(err.to_string().contains("messages"));
    }

    #[test]
    fn test_non_object_body_is_rejected() {
        let err = RequestPayload::from_value(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, RelayError::Validation(_)));
    }

    #[test]
    fn test_converse_request_uses_camel_case_model_id() {
        let payload = RequestPayload {
            messages: vec![json!({"role": "user"})],
            system: vec![json!({"text": "be brief"})],
        };
        let request = ConverseRequest::new(payload, "mistral.mistral-large-2402-v1:0");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["modelId"], "mistral.mistral-large-2402-v1:0");
        assert_eq!(value["system"][0]["text"], "be brief");
    }
}
