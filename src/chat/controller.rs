//! Drives a chat: role selection, sending messages and putting the
//! replies on the transcript.
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Error, Result, anyhow, bail};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde_json::{Map, Value};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::models::{
    BOT_LABEL, CONNECTION_FAILURE_NOTICE, DEFAULT_GREETING, Outcome, Role, USER_LABEL,
};
use super::session::Session;
use super::transcript::BoxedRenderer;
use crate::core::{ChatConfig, ReplyOrder};
use crate::service::{BoxedChatService, ChatReply, ChatRequest};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiState {
    Selecting,
    Chatting,
}

/// Visibility of the two mutually exclusive panels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Panels {
    pub selection_visible: bool,
    pub chat_visible: bool,
}

/// Named UI actions the controller reacts to.
#[derive(Clone, Debug, PartialEq)]
pub enum UiAction {
    SelectRole(Role),
    Send,
}

impl UiAction {
    /// Trigger names and the action each one maps to.
    pub fn triggers() -> Vec<(&'static str, UiAction)> {
        vec![
            ("pro-btn", UiAction::SelectRole(Role::Pro)),
            ("chercheur-btn", UiAction::SelectRole(Role::Chercheur)),
            ("send-btn", UiAction::Send),
        ]
    }

    pub fn from_trigger(trigger: &str) -> Option<Self> {
        Self::triggers()
            .into_iter()
            .find(|(name, _)| *name == trigger)
            .map(|(_, action)| action)
    }
}

/// Longest a reply waits for the one sent before it to be rendered
/// when no request timeout is configured.
pub const DEFAULT_REPLY_WAIT: Duration = Duration::from_secs(30);

// Resolves once the previous reply has been rendered
type RenderGate = Shared<BoxFuture<'static, ()>>;

fn open_gate() -> RenderGate {
    futures::future::ready(()).boxed().shared()
}

/// Owns the session and wires the renderer to the chat service.
///
/// Use `ChatController::builder()` to construct one.
pub struct ChatController {
    renderer: BoxedRenderer,
    service: BoxedChatService,
    fetch_greeting: bool,
    include_history: bool,
    reply_order: ReplyOrder,
    reply_wait: Duration,
    session: Arc<Mutex<Option<Session>>>,
    input: Mutex<String>,
    gate: Mutex<RenderGate>,
}

impl ChatController {
    pub fn builder(renderer: BoxedRenderer, service: BoxedChatService) -> ChatControllerBuilder {
        ChatControllerBuilder::new(renderer, service)
    }

    pub fn state(&self) -> UiState {
        if self.lock_session().is_some() {
            UiState::Chatting
        } else {
            UiState::Selecting
        }
    }

    pub fn panels(&self) -> Panels {
        let chatting = self.state() == UiState::Chatting;
        Panels {
            selection_visible: !chatting,
            chat_visible: chatting,
        }
    }

    /// A snapshot of the active session, if a role was chosen.
    pub fn session(&self) -> Option<Session> {
        self.lock_session().clone()
    }

    pub fn input(&self) -> String {
        self.input.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replaces the pending input, like typing into the input field.
    pub fn set_input(&self, text: &str) {
        *self.input.lock().unwrap_or_else(PoisonError::into_inner) = text.to_string();
    }

    pub async fn dispatch(&self, action: UiAction) -> Result<Option<JoinHandle<()>>> {
        match action {
            UiAction::SelectRole(role) => {
                self.select_role(role).await?;
                Ok(None)
            }
            UiAction::Send => self.handle_send(),
        }
    }

    /// Starts the session with `role`, switches to the chat panel and
    /// greets the user. A session can only be started once.
    pub async fn select_role(&self, role: Role) -> Result<()> {
        {
            let mut session = self.lock_session();
            if let Some(active) = session.as_ref() {
                bail!(
                    "A session with role '{}' is already active, role can't be changed",
                    active.role
                );
            }
            let new_session = Session::begin(role);
            tracing::info!(
                "Starting session {} with role {}",
                new_session.id,
                new_session.role
            );
            *session = Some(new_session);
        }

        let greeting = if self.fetch_greeting {
            self.service.greeting().await.unwrap_or_else(|e| {
                tracing::warn!("Falling back to default greeting: {}", e);
                DEFAULT_GREETING.to_string()
            })
        } else {
            DEFAULT_GREETING.to_string()
        };
        self.renderer.append(BOT_LABEL, &greeting);

        Ok(())
    }

    /// Sends the pending input. The user's line is rendered before this
    /// returns and the round trip runs in a spawned task whose handle is
    /// returned. Blank input is ignored and returns `None`.
    pub fn handle_send(&self) -> Result<Option<JoinHandle<()>>> {
        let mut input = self.input.lock().unwrap_or_else(PoisonError::into_inner);
        let mut session = self.lock_session();
        let session = session
            .as_mut()
            .ok_or_else(|| anyhow!("Choose a role before sending a message"))?;

        let message = input.trim().to_string();
        if message.is_empty() {
            return Ok(None);
        }

        self.renderer.append(USER_LABEL, &message);
        input.clear();

        let mut request = ChatRequest::new(&message, &session.role);
        if self.include_history {
            request = request.with_history(session.history(), session.collected().clone());
        }
        let exchange_id = session.record_sent(&message);

        let (previous, done) = match self.reply_order {
            ReplyOrder::Sent => {
                let (tx, rx) = oneshot::channel::<()>();
                let next = async move {
                    let _ = rx.await;
                }
                .boxed()
                .shared();
                let mut gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
                (Some(std::mem::replace(&mut *gate, next)), Some(tx))
            }
            ReplyOrder::Completed => (None, None),
        };

        let service = Arc::clone(&self.service);
        let renderer = Arc::clone(&self.renderer);
        let shared_session = Arc::clone(&self.session);
        let reply_wait = self.reply_wait;

        let handle = tokio::spawn(async move {
            let result = service.send(&request).await;
            // A hung earlier request only costs its own line
            if let Some(previous) = previous
                && tokio::time::timeout(reply_wait, previous).await.is_err()
            {
                tracing::warn!(
                    "Earlier reply still pending after {:?}, rendering out of order",
                    reply_wait
                );
            }

            let (outcome, text, collected) = reply_outcome(result);
            if let Some(session) = shared_session
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .as_mut()
            {
                if let Some(data) = collected {
                    session.replace_collected(data);
                }
                session.resolve(exchange_id, outcome);
            }
            renderer.append(BOT_LABEL, &text);

            // Dropping the sender opens the gate for the next reply
            drop(done);
        });

        Ok(Some(handle))
    }

    fn lock_session(&self) -> std::sync::MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn reply_outcome(
    result: Result<ChatReply, Error>,
) -> (Outcome, String, Option<Map<String, Value>>) {
    match result {
        Ok(reply) => {
            let collected = reply.collected();
            (Outcome::Replied(reply.response.clone()), reply.response, collected)
        }
        Err(e) => {
            tracing::warn!("Chat request failed: {:#}", e);
            (Outcome::Failed, CONNECTION_FAILURE_NOTICE.to_string(), None)
        }
    }
}

pub struct ChatControllerBuilder {
    renderer: BoxedRenderer,
    service: BoxedChatService,
    fetch_greeting: bool,
    include_history: bool,
    reply_order: ReplyOrder,
    reply_wait: Duration,
}

impl ChatControllerBuilder {
    pub fn new(renderer: BoxedRenderer, service: BoxedChatService) -> Self {
        Self {
            renderer,
            service,
            fetch_greeting: false,
            include_history: false,
            reply_order: ReplyOrder::default(),
            reply_wait: DEFAULT_REPLY_WAIT,
        }
    }

    pub fn config(self, config: &ChatConfig) -> Self {
        let reply_wait = config.request_timeout.unwrap_or(DEFAULT_REPLY_WAIT);
        self.fetch_greeting(config.fetch_greeting)
            .include_history(config.include_history)
            .reply_order(config.reply_order)
            .reply_wait(reply_wait)
    }

    pub fn fetch_greeting(mut self, fetch_greeting: bool) -> Self {
        self.fetch_greeting = fetch_greeting;
        self
    }

    pub fn include_history(mut self, include_history: bool) -> Self {
        self.include_history = include_history;
        self
    }

    pub fn reply_order(mut self, reply_order: ReplyOrder) -> Self {
        self.reply_order = reply_order;
        self
    }

    /// Bounds how long a reply is held back behind an earlier one in
    /// `ReplyOrder::Sent`.
    pub fn reply_wait(mut self, reply_wait: Duration) -> Self {
        self.reply_wait = reply_wait;
        self
    }

    pub fn build(self) -> ChatController {
        ChatController {
            renderer: self.renderer,
            service: self.service,
            fetch_greeting: self.fetch_greeting,
            include_history: self.include_history,
            reply_order: self.reply_order,
            reply_wait: self.reply_wait,
            session: Arc::new(Mutex::new(None)),
            input: Mutex::new(String::new()),
            gate: Mutex::new(open_gate()),
        }
    }
}
