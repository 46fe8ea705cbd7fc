use std::env;
use std::time::Duration;

/// How replies to overlapping sends are put on the transcript.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ReplyOrder {
    /// Replies show up in the order their messages were sent
    #[default]
    Sent,
    /// Replies show up as soon as their request completes
    Completed,
}

impl ReplyOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "sent" => Some(ReplyOrder::Sent),
            "completed" => Some(ReplyOrder::Completed),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatConfig {
    pub server_url: String,
    pub fetch_greeting: bool,
    pub include_history: bool,
    pub reply_order: ReplyOrder,
    pub request_timeout: Option<Duration>,
}

impl ChatConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source. Missing or
    /// unparseable values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let server_url = lookup("ROLECHAT_SERVER_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(defaults.server_url);
        let fetch_greeting = lookup("ROLECHAT_FETCH_GREETING")
            .and_then(|v| parse_bool(&v))
            .unwrap_or(defaults.fetch_greeting);
        let include_history = lookup("ROLECHAT_INCLUDE_HISTORY")
            .and_then(|v| parse_bool(&v))
            .unwrap_or(defaults.include_history);
        let reply_order = lookup("ROLECHAT_REPLY_ORDER")
            .and_then(|v| ReplyOrder::parse(&v))
            .unwrap_or(defaults.reply_order);
        let request_timeout = lookup("ROLECHAT_REQUEST_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Self {
            server_url,
            fetch_greeting,
            include_history,
            reply_order,
            request_timeout,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            server_url: String::from("http://127.0.0.1:5000"),
            fetch_greeting: false,
            include_history: false,
            reply_order: ReplyOrder::Sent,
            request_timeout: None,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
