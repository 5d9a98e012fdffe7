//! Chatbot service abstraction
//!
//! The conversational agent lives in a separate service. This module keeps
//! the worker testable without it:
//! - MockChatbotClient for tests and development (deterministic, no network)
//! - HttpChatbotClient for production
//!
//! Configuration via the CHATBOT_BACKEND env variable:
//! - "http" → HttpChatbotClient against CHATBOT_URL (default)
//! - "mock" → MockChatbotClient

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::error::DomainError;
use crate::types::chatbot::ChatbotReply;

/// Chatbot API - abstraction over the external conversational agent
#[async_trait]
pub trait ChatbotApi: Send + Sync {
    /// Start a conversation, forwarding the user info to the agent
    async fn initialize(&self, user_info: &Map<String, Value>) -> Result<Value, DomainError>;

    /// Send one user message and return the agent's reply
    async fn send_message(&self, message: &str) -> Result<ChatbotReply, DomainError>;

    /// End the current conversation
    async fn reset(&self) -> Result<(), DomainError>;

    /// Get the name of this chatbot implementation
    fn name(&self) -> &'static str;
}

// ==========================================================================
// HttpChatbotClient Implementation
// ==========================================================================

/// HTTP client for the external chatbot service
pub struct HttpChatbotClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpChatbotClient {
    /// Create a new client
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("Atelio/1.0 (https://atelio.app)")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn upstream_error(&self, action: &str, status: reqwest::StatusCode) -> DomainError {
        DomainError::Upstream(format!("Chatbot service returned {status} while {action}"))
    }
}

#[async_trait]
impl ChatbotApi for HttpChatbotClient {
    async fn initialize(&self, user_info: &Map<String, Value>) -> Result<Value, DomainError> {
        let query: Vec<(String, String)> = user_info
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), value)
            })
            .collect();

        let response = self
            .client
            .get(format!("{}/initialize_chat", self.base_url))
            .query(&query)
            .send()
            .await
            .map_err(|e| DomainError::internal(format!("Error initializing chat: {e}")))?;

        if !response.status().is_success() {
            return Err(self.upstream_error("initializing chat", response.status()));
        }

        response
            .json()
            .await
            .map_err(|e| DomainError::internal(format!("Error parsing chat initialization: {e}")))
    }

    async fn send_message(&self, message: &str) -> Result<ChatbotReply, DomainError> {
        let response = self
            .client
            .post(format!("{}/chat", self.base_url))
            .json(&json!({ "message": message }))
            .send()
            .await
            .map_err(|e| DomainError::internal(format!("Error sending chat message: {e}")))?;

        if !response.status().is_success() {
            return Err(self.upstream_error("sending a message", response.status()));
        }

        response
            .json()
            .await
            .map_err(|e| DomainError::internal(format!("Error parsing chat reply: {e}")))
    }

    async fn reset(&self) -> Result<(), DomainError> {
        let response = self
            .client
            .post(format!("{}/reset_chat", self.base_url))
            .send()
            .await
            .map_err(|e| DomainError::internal(format!("Error resetting chat: {e}")))?;

        if !response.status().is_success() {
            return Err(self.upstream_error("resetting the chat", response.status()));
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

// ==========================================================================
// MockChatbotClient Implementation
// ==========================================================================

/// Mock chatbot for tests and development - deterministic, no network.
///
/// Replies echo the message; a message containing "confirm" produces a
/// canned `data` payload so the reconciliation pipeline can be exercised
/// end-to-end against the seed catalogue.
pub struct MockChatbotClient;

impl MockChatbotClient {
    pub fn new() -> Self {
        Self
    }

    fn canned_data() -> Value {
        json!({
            "closest_dealer": {
                "dealership_name": "Atelio Paris Nord",
                "city": "Paris",
                "address": "12 rue de la Chapelle",
                "zipcode": "75018",
                "latitude": "48.897500",
                "longitude": "2.359800"
            },
            "matched_operation": {
                "operation_name": "Oil change",
                "category": "maintenance",
                "price": 89
            },
            "car_immatriculation": "AB-123-CD",
            "preferred_datetime": "2024-06-01T10:00:00"
        })
    }
}

impl Default for MockChatbotClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatbotApi for MockChatbotClient {
    async fn initialize(&self, user_info: &Map<String, Value>) -> Result<Value, DomainError> {
        Ok(json!({
            "session_id": "mock-session",
            "message": "Hello! How can I help with your vehicle?",
            "user_info": user_info,
        }))
    }

    async fn send_message(&self, message: &str) -> Result<ChatbotReply, DomainError> {
        let mut extra = Map::new();
        extra.insert(
            "response".to_string(),
            Value::String(format!("Mock reply to '{message}'")),
        );

        let data = message.contains("confirm").then(Self::canned_data);

        Ok(ChatbotReply { data, extra })
    }

    async fn reset(&self) -> Result<(), DomainError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

// ==========================================================================
// Factory function
// ==========================================================================

/// Create a chatbot client based on the CHATBOT_BACKEND environment variable
///
/// # Environment Variables
///
/// - `CHATBOT_BACKEND`: "http" or "mock" (default: "http")
/// - `CHATBOT_URL`: base URL of the chatbot service (via Config)
pub fn create_chatbot_client(chatbot_url: &str) -> Box<dyn ChatbotApi> {
    let backend = std::env::var("CHATBOT_BACKEND").unwrap_or_else(|_| "http".to_string());

    match backend.as_str() {
        "mock" => {
            tracing::info!("Using MockChatbotClient");
            Box::new(MockChatbotClient::new())
        }
        "http" => {
            tracing::info!("Using HttpChatbotClient at {chatbot_url}");
            Box::new(HttpChatbotClient::new(chatbot_url))
        }
        other => {
            tracing::warn!("Unknown CHATBOT_BACKEND '{other}', using http");
            Box::new(HttpChatbotClient::new(chatbot_url))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_chatbot_replies_deterministically() {
        let chatbot = MockChatbotClient::new();

        let reply1 = chatbot.send_message("hello").await.unwrap();
        let reply2 = chatbot.send_message("hello").await.unwrap();

        assert_eq!(reply1.extra.get("response"), reply2.extra.get("response"));
        assert!(reply1.data.is_none());
    }

    #[tokio::test]
    async fn mock_chatbot_produces_data_on_confirm() {
        let chatbot = MockChatbotClient::new();

        let reply = chatbot.send_message("yes, confirm the booking").await.unwrap();

        let data = reply.data.expect("confirm message should carry data");
        assert_eq!(
            data.get("car_immatriculation").and_then(Value::as_str),
            Some("AB-123-CD")
        );
    }

    #[tokio::test]
    async fn mock_chatbot_initialize_echoes_user_info() {
        let chatbot = MockChatbotClient::new();
        let mut user_info = Map::new();
        user_info.insert("first_name".to_string(), Value::String("Jane".to_string()));

        let response = chatbot.initialize(&user_info).await.unwrap();
        assert_eq!(
            response.pointer("/user_info/first_name").and_then(Value::as_str),
            Some("Jane")
        );
    }

    #[tokio::test]
    async fn mock_chatbot_reset_succeeds() {
        let chatbot = MockChatbotClient::new();
        assert!(chatbot.reset().await.is_ok());
    }

    #[test]
    fn mock_chatbot_name_is_mock() {
        assert_eq!(MockChatbotClient::new().name(), "mock");
    }

    #[test]
    fn http_chatbot_trims_trailing_slash() {
        let chatbot = HttpChatbotClient::new("http://localhost:5005/");
        assert_eq!(chatbot.base_url, "http://localhost:5005");
        assert_eq!(chatbot.name(), "http");
    }
}
