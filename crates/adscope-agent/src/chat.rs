//! Request and response shapes of the chat contract.

use adscope_core::{ActiveFilterSet, Campaign};
use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::llm::ChatMessage;

/// Roles a caller may replay in conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Assistant,
}

/// One prior turn of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: HistoryRole,
    pub content: String,
}

impl HistoryTurn {
    pub(crate) fn to_message(&self) -> ChatMessage {
        match self.role {
            HistoryRole::User => ChatMessage::user(self.content.clone()),
            HistoryRole::Assistant => ChatMessage::assistant(self.content.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub active_filters: Option<ActiveFilterSet>,
    #[serde(default)]
    pub history: Vec<HistoryTurn>,
}

impl ChatRequest {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_filters(mut self, filters: ActiveFilterSet) -> Self {
        self.active_filters = Some(filters);
        self
    }

    /// The trimmed, non-empty user message.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Validation`] when the message is missing or blank.
    pub fn validated_message(&self) -> Result<&str, AgentError> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| AgentError::Validation("message is required".to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub campaigns: Vec<Campaign>,
    pub total: usize,
    pub suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_filters: Option<ActiveFilterSet>,
}
