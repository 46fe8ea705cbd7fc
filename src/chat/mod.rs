pub mod controller;
pub mod models;
pub mod session;
pub mod transcript;

pub use controller::{ChatController, ChatControllerBuilder, Panels, UiAction, UiState};
pub use models::{ChatLine, Exchange, Outcome, Role};
pub use session::Session;
pub use transcript::{BoxedRenderer, MemoryTranscript, Renderer, TerminalRenderer};
