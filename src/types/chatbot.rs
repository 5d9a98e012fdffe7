//! Chatbot conversation types and the semi-structured appointment payload

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Request to start a chatbot conversation. The user info is forwarded to
/// the conversational agent as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeChatRequest {
    #[serde(default)]
    pub user_info: Map<String, Value>,
}

/// Request to send one message to the chatbot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageRequest {
    pub message: String,
}

/// Reply from the external chatbot service. Passed through to the caller
/// verbatim apart from the `data` payload, which triggers reconciliation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatbotReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Chat message response: the chatbot reply, plus the id of the appointment
/// the reconciliation pipeline produced when the reply carried data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageResponse {
    #[serde(flatten)]
    pub reply: ChatbotReply,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<Uuid>,
}

/// Response to a chat reset: the pending appointment that was confirmed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetChatResponse {
    pub message: String,
    pub appointment_id: Uuid,
}

/// View over the semi-structured `data` payload produced by the chatbot.
///
/// The upstream agent is not consistent about shape: the payload may be a
/// map whose members are entity records plus scalar fields
/// (`{"closest_dealer": {...}, "car_immatriculation": "..."}`) or a plain
/// array of records. Records are the object-valued members either way;
/// scalar fields are looked up at the top level first, then inside records.
pub struct AppointmentData<'a> {
    raw: &'a Value,
}

impl<'a> AppointmentData<'a> {
    pub fn new(raw: &'a Value) -> Self {
        Self { raw }
    }

    /// The candidate entity records contained in the payload.
    pub fn records(&self) -> Vec<&'a Map<String, Value>> {
        match self.raw {
            Value::Object(map) => map.values().filter_map(Value::as_object).collect(),
            Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
            _ => Vec::new(),
        }
    }

    /// Look up a scalar field by name, as a string.
    pub fn field(&self, key: &str) -> Option<&'a str> {
        if let Value::Object(map) = self.raw {
            if let Some(value) = map.get(key).and_then(Value::as_str) {
                return Some(value);
            }
        }
        self.records()
            .into_iter()
            .find_map(|record| record.get(key).and_then(Value::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_records_from_map_payload() {
        let raw = json!({
            "closest_dealer": {"dealership_name": "Garage X", "city": "Paris"},
            "matched_operation": {"operation_name": "Oil change"},
            "car_immatriculation": "AB-123-CD",
            "preferred_datetime": "2024-06-01T10:00:00"
        });

        let data = AppointmentData::new(&raw);
        assert_eq!(data.records().len(), 2);
        assert_eq!(data.field("car_immatriculation"), Some("AB-123-CD"));
        assert_eq!(data.field("preferred_datetime"), Some("2024-06-01T10:00:00"));
    }

    #[test]
    fn test_records_from_array_payload() {
        let raw = json!([
            {"dealership_name": "Garage X", "city": "Paris", "car_immatriculation": "AB-123-CD"},
            {"operation_name": "Oil change", "category": "maintenance"},
            "stray scalar"
        ]);

        let data = AppointmentData::new(&raw);
        assert_eq!(data.records().len(), 2);
        // scalar lookup falls back to scanning records
        assert_eq!(data.field("car_immatriculation"), Some("AB-123-CD"));
        assert_eq!(data.field("preferred_datetime"), None);
    }

    #[test]
    fn test_scalar_payload_has_no_records() {
        let raw = json!("just a string");
        let data = AppointmentData::new(&raw);
        assert!(data.records().is_empty());
        assert_eq!(data.field("anything"), None);
    }

    #[test]
    fn test_chatbot_reply_captures_data_and_extra() {
        let json_reply = r#"{
            "session_id": "abc",
            "response": "Booked!",
            "data": {"car_immatriculation": "AB-123-CD"}
        }"#;

        let reply: ChatbotReply = serde_json::from_str(json_reply).unwrap();
        assert!(reply.data.is_some());
        assert_eq!(reply.extra.get("response").unwrap(), "Booked!");
    }

    #[test]
    fn test_chat_message_response_omits_missing_appointment() {
        let response = ChatMessageResponse {
            reply: ChatbotReply::default(),
            appointment_id: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("appointmentId"));
    }
}
