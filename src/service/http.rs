use std::time::Duration;

use anyhow::{Context, Error, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;

use super::{ChatReply, ChatRequest, ChatService};

#[derive(Deserialize)]
struct GreetingResponse {
    message: String,
}

/// Talks to the chat server over HTTP with JSON bodies.
#[derive(Clone, Debug)]
pub struct HttpChatService {
    server_url: String,
    timeout: Option<Duration>,
    client: reqwest::Client,
}

impl HttpChatService {
    pub fn new(server_url: &str) -> Self {
        Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            timeout: None,
            client: reqwest::Client::new(),
        }
    }

    /// No timeout is applied unless one is set here.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn chat_url(&self) -> String {
        format!("{}/chat", self.server_url)
    }

    pub fn greetings_url(&self) -> String {
        format!("{}/greetings", self.server_url)
    }
}

impl Default for HttpChatService {
    fn default() -> Self {
        Self::new("http://127.0.0.1:5000")
    }
}

#[async_trait]
impl ChatService for HttpChatService {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, Error> {
        let url = self.chat_url();
        tracing::debug!("POST {} role={}", url, request.role);

        let mut builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(request);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let reply = builder
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?
            .error_for_status()?
            .json::<ChatReply>()
            .await
            .with_context(|| "Attempted to parse chat reply from json")?;

        Ok(reply)
    }

    async fn greeting(&self) -> Result<String, Error> {
        let url = self.greetings_url();
        let mut builder = self.client.get(&url);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let resp: GreetingResponse = builder
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .with_context(|| "Attempted to parse greeting from json")?;

        let message = resp.message.trim();
        if message.is_empty() {
            return Err(anyhow!("Server sent an empty greeting"));
        }
        Ok(message.to_string())
    }
}
