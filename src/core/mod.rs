pub mod config;
pub use config::{ChatConfig, ReplyOrder};
