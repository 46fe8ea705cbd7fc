use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod chat;
pub mod send;

use crate::chat::{BoxedRenderer, ChatController, Role};
use crate::core::{ChatConfig, ReplyOrder};
use crate::service::HttpChatService;

/// Options that override values read from the environment
#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    /// Base URL of the chat server
    #[arg(long)]
    server_url: Option<String>,

    /// Ask the server for the greeting instead of using the built-in one
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    fetch_greeting: Option<bool>,

    /// Send the conversation history and collected data with each message
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    include_history: Option<bool>,

    /// Order replies are shown in when messages overlap
    #[arg(long, value_enum)]
    reply_order: Option<ReplyOrder>,

    /// Give up on a request after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl ConnectionArgs {
    pub fn apply(self, mut config: ChatConfig) -> ChatConfig {
        if let Some(url) = self.server_url {
            config.server_url = url;
        }
        if let Some(fetch_greeting) = self.fetch_greeting {
            config.fetch_greeting = fetch_greeting;
        }
        if let Some(include_history) = self.include_history {
            config.include_history = include_history;
        }
        if let Some(order) = self.reply_order {
            config.reply_order = order;
        }
        if let Some(secs) = self.timeout_secs.filter(|secs| *secs > 0) {
            config.request_timeout = Some(Duration::from_secs(secs));
        }
        config
    }
}

#[derive(Subcommand)]
enum Command {
    /// Start an interactive chat session
    Chat {
        /// Role to chat as, prompts for one when omitted
        #[arg(long)]
        role: Option<String>,

        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Send a single message and print the transcript
    Send {
        #[arg(long)]
        role: String,

        message: String,

        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// List the known roles
    Roles {},
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

/// Logs go to stderr so they never interleave with the transcript.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

pub fn controller(config: &ChatConfig, renderer: BoxedRenderer) -> ChatController {
    let service = HttpChatService::new(&config.server_url).with_timeout(config.request_timeout);
    ChatController::builder(renderer, Arc::new(service))
        .config(config)
        .build()
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    match args.command {
        Some(Command::Chat { role, connection }) => {
            init_tracing();
            let config = connection.apply(ChatConfig::from_env());
            chat::run(&config, role.map(Role::from)).await?;
        }
        Some(Command::Send {
            role,
            message,
            connection,
        }) => {
            init_tracing();
            let config = connection.apply(ChatConfig::from_env());
            send::run(&config, Role::from(role), &message).await?;
        }
        Some(Command::Roles {}) => {
            for role in Role::KNOWN.iter() {
                println!("{}", role);
            }
        }
        None => {}
    }

    Ok(())
}
