//! Test utilities for integration tests
use std::sync::Arc;

use rolechat::chat::{ChatController, MemoryTranscript};
use rolechat::core::ChatConfig;
use rolechat::service::HttpChatService;

/// Creates a controller talking to `server_url` over HTTP with an
/// in-memory transcript that can be inspected by the test.
pub fn test_controller(server_url: &str, config: ChatConfig) -> (ChatController, MemoryTranscript) {
    let transcript = MemoryTranscript::new();
    let config = ChatConfig {
        server_url: server_url.to_string(),
        ..config
    };
    let service = HttpChatService::new(&config.server_url).with_timeout(config.request_timeout);
    let controller = ChatController::builder(Arc::new(transcript.clone()), Arc::new(service))
        .config(&config)
        .build();
    (controller, transcript)
}

/// Sets the input and waits for the reply, if anything was sent.
pub async fn send_and_wait(controller: &ChatController, text: &str) -> bool {
    controller.set_input(text);
    match controller.handle_send().expect("Send failed") {
        Some(handle) => {
            handle.await.expect("Reply task failed");
            true
        }
        None => false,
    }
}
