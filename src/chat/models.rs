//! The core models for a role based chat session.
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Label used for lines typed by the local user.
pub const USER_LABEL: &str = "Vous";

/// Label used for greetings, replies and failure notices.
pub const BOT_LABEL: &str = "bot";

pub const DEFAULT_GREETING: &str =
    "Bienvenue ! Discutons de tech et de votre parcours. Commencez par vous présenter.";

pub const CONNECTION_FAILURE_NOTICE: &str = "Erreur de connexion avec le serveur";

/// The persona selected for a session. Unknown values are carried
/// verbatim so the server decides what to do with them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Pro,
    Chercheur,
    Other(String),
}

impl Role {
    pub const KNOWN: [Role; 2] = [Role::Pro, Role::Chercheur];

    pub fn as_str(&self) -> &str {
        match self {
            Role::Pro => "pro",
            Role::Chercheur => "chercheur",
            Role::Other(s) => s.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Role::Other(_))
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pro" => Role::Pro,
            "chercheur" => Role::Chercheur,
            _ => Role::Other(value),
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Role::from(value.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for Role {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Role::from(s))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single rendered line of the transcript.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatLine {
    pub sender: String,
    pub text: String,
}

impl ChatLine {
    pub fn new(sender: &str, text: &str) -> Self {
        Self {
            sender: sender.to_string(),
            text: text.to_string(),
        }
    }

    pub fn user(text: &str) -> Self {
        Self::new(USER_LABEL, text)
    }

    pub fn bot(text: &str) -> Self {
        Self::new(BOT_LABEL, text)
    }
}

impl fmt::Display for ChatLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.sender, self.text)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reply", rename_all = "snake_case")]
pub enum Outcome {
    Pending,
    Replied(String),
    Failed,
}

/// One message sent during a session and what came back for it.
#[derive(Clone, Debug, Serialize)]
pub struct Exchange {
    pub id: Uuid,
    pub message: String,
    pub sent_at: DateTime<Utc>,
    pub outcome: Outcome,
}

impl Exchange {
    pub fn new(message: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: message.to_string(),
            sent_at: Utc::now(),
            outcome: Outcome::Pending,
        }
    }
}
