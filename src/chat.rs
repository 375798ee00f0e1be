//! Request/response contract of the external Q&A service.
//!
//! Answers are passed through untouched; nothing here interprets them.

use crate::schema::EntityId;
use serde::{Deserialize, Serialize};

pub const GREETING: &str = "Hello! How can I assist you today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    #[serde(rename = "company", alias = "company_slug")]
    pub entity_context: EntityId,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

/// Conversation state for one entity's chat panel.
#[derive(Debug, Clone)]
pub struct ChatSession {
    entity: EntityId,
    history: Vec<ChatMessage>,
    last_error: Option<String>,
}

impl ChatSession {
    pub fn new(entity: EntityId) -> Self {
        Self {
            entity,
            history: vec![ChatMessage::assistant(GREETING)],
            last_error: None,
        }
    }

    pub fn entity(&self) -> &EntityId {
        &self.entity
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Appends the question and builds the request carrying the full history.
    /// Blank questions are ignored.
    pub fn begin(&mut self, question: &str) -> Option<ChatRequest> {
        let question = question.trim();
        if question.is_empty() {
            return None;
        }

        self.last_error = None;
        self.history.push(ChatMessage::user(question));

        Some(ChatRequest {
            question: question.to_string(),
            entity_context: self.entity.clone(),
            history: self.history.clone(),
        })
    }

    pub fn record_answer(&mut self, response: &ChatResponse) {
        self.history.push(ChatMessage::assistant(&response.answer));
    }

    /// Keeps the error as display text; the history is left as is.
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(format!("Error: {}", message.into()));
    }
}

#[cfg(feature = "remote")]
pub use client::ChatClient;

#[cfg(feature = "remote")]
mod client {
    use super::*;
    use crate::error::{MetricsError, Result};
    use log::{debug, warn};
    use reqwest::Client;
    use std::time::Duration;

    const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    #[derive(Clone)]
    pub struct ChatClient {
        client: Client,
        url: String,
    }

    impl ChatClient {
        pub fn new(url: impl Into<String>) -> Result<Self> {
            let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
            Ok(Self {
                client,
                url: url.into(),
            })
        }

        pub async fn ask(&self, request: &ChatRequest) -> Result<ChatResponse> {
            debug!(
                "Asking chat service about {} with {} history messages",
                request.entity_context,
                request.history.len()
            );

            let res = self.client.post(&self.url).json(request).send().await?;
            let status = res.status();

            if !status.is_success() {
                let body = res.text().await.unwrap_or_default();
                return Err(MetricsError::retrieval(
                    request.entity_context.as_str(),
                    format!("HTTP {}: {}", status.as_u16(), body),
                ));
            }

            Ok(res.json().await?)
        }

        /// Never fails: transport and status errors become the answer text.
        pub async fn ask_for_display(&self, request: &ChatRequest) -> String {
            match self.ask(request).await {
                Ok(response) => response.answer,
                Err(err) => {
                    warn!("Chat request failed: {}", err);
                    format!("Error: {}", display_detail(&err))
                }
            }
        }

        /// Runs one exchange on a session, recording the answer or the error.
        pub async fn send(&self, session: &mut ChatSession, question: &str) -> Option<ChatResponse> {
            let request = session.begin(question)?;
            match self.ask(&request).await {
                Ok(response) => {
                    session.record_answer(&response);
                    Some(response)
                }
                Err(err) => {
                    warn!("Chat request failed: {}", err);
                    session.record_error(display_detail(&err));
                    None
                }
            }
        }
    }

    fn display_detail(err: &MetricsError) -> String {
        match err {
            MetricsError::Retrieval { details, .. } => details.clone(),
            other => other.to_string(),
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let mut session = ChatSession::new(EntityId::from("dipped-products"));
        let request = session.begin("  What is the latest TTM net income?  ").unwrap();

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["company"], "dipped-products");
        assert_eq!(json["question"], "What is the latest TTM net income?");
        assert_eq!(json["history"][0]["role"], "assistant");
        assert_eq!(json["history"][1]["role"], "user");
        assert_eq!(json["history"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_request_accepts_slug_alias() {
        let request: ChatRequest = serde_json::from_str(
            r#"{"company_slug": "richard-pieris", "question": "hi"}"#,
        )
        .unwrap();
        assert_eq!(request.entity_context, EntityId::from("richard-pieris"));
        assert!(request.history.is_empty());
    }

    #[test]
    fn test_response_sources_default() {
        let response: ChatResponse = serde_json::from_str(r#"{"answer": "42"}"#).unwrap();
        assert_eq!(response.answer, "42");
        assert!(response.sources.is_empty());
    }

    #[test]
    fn test_session_flow() {
        let mut session = ChatSession::new(EntityId::from("a"));
        assert!(session.begin("   ").is_none());
        assert_eq!(session.history().len(), 1);

        session.begin("first").unwrap();
        session.record_error("HTTP 500: boom");
        assert_eq!(session.last_error(), Some("Error: HTTP 500: boom"));
        assert_eq!(session.history().len(), 2);

        session.begin("second").unwrap();
        assert_eq!(session.last_error(), None);
        session.record_answer(&ChatResponse {
            answer: "done".to_string(),
            sources: vec![],
        });
        let last = session.history().last().unwrap();
        assert_eq!(last.role, ChatRole::Assistant);
        assert_eq!(last.content, "done");
    }
}
