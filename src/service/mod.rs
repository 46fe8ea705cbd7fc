//! Client side of the remote chat service.
use anyhow::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::chat::Role;

pub mod http;
pub use http::HttpChatService;

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum HistoryRole {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "bot")]
    Bot,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct HistoryEntry {
    pub role: HistoryRole,
    pub content: String,
}

impl HistoryEntry {
    pub fn user(content: &str) -> Self {
        Self {
            role: HistoryRole::User,
            content: content.to_string(),
        }
    }

    pub fn bot(content: &str) -> Self {
        Self {
            role: HistoryRole::Bot,
            content: content.to_string(),
        }
    }
}

/// What the server already knows about the user, sent back to it on
/// each turn.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct Trajectory {
    pub data: Map<String, Value>,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trajectory: Option<Trajectory>,
}

impl ChatRequest {
    pub fn new(message: &str, role: &Role) -> Self {
        Self {
            message: message.to_string(),
            role: role.clone(),
            history: None,
            trajectory: None,
        }
    }

    pub fn with_history(mut self, history: Vec<HistoryEntry>, data: Map<String, Value>) -> Self {
        self.history = Some(history);
        self.trajectory = Some(Trajectory { data });
        self
    }
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct ChatReply {
    pub response: String,
    // Collected data echoed back by the server, when it tracks any
    #[serde(default)]
    pub trajectory: Option<Value>,
}

impl ChatReply {
    /// The collected data from the reply if the server sent an object.
    pub fn collected(&self) -> Option<Map<String, Value>> {
        match &self.trajectory {
            Some(Value::Object(data)) => Some(data.clone()),
            _ => None,
        }
    }
}

#[async_trait]
pub trait ChatService {
    /// Sends one message and returns the reply. Any failure (transport,
    /// status or body shape) is an error.
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, Error>;

    /// Asks the service for a greeting to open the session with.
    async fn greeting(&self) -> Result<String, Error>;
}

pub type BoxedChatService = std::sync::Arc<dyn ChatService + Send + Sync + 'static>;
