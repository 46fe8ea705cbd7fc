//! Integration tests for a full chat against a mocked chat server

mod test_utils;

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mockito::Matcher;
    use rolechat::chat::models::{CONNECTION_FAILURE_NOTICE, DEFAULT_GREETING};
    use rolechat::chat::{Outcome, Role, UiAction, UiState};
    use rolechat::core::ChatConfig;
    use serde_json::json;

    use crate::test_utils::{send_and_wait, test_controller};

    fn greeting_line() -> String {
        format!("bot: {}", DEFAULT_GREETING)
    }

    /// Tests the basic scenario of greeting, message and reply
    #[tokio::test]
    async fn it_chats_with_the_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"message": "Bonjour", "role": "pro"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"response":"Salut !"}"#)
            .expect(1)
            .create_async()
            .await;

        let (controller, transcript) = test_controller(&server.url(), ChatConfig::default());
        controller
            .dispatch(UiAction::from_trigger("pro-btn").unwrap())
            .await
            .unwrap();
        assert_eq!(controller.state(), UiState::Chatting);

        assert!(send_and_wait(&controller, "Bonjour").await);

        assert_eq!(
            transcript.rendered(),
            vec![
                greeting_line(),
                "Vous: Bonjour".to_string(),
                "bot: Salut !".to_string()
            ]
        );
        mock.assert_async().await;
    }

    /// Tests that blank input never reaches the server
    #[tokio::test]
    async fn it_ignores_blank_input() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .expect(0)
            .create_async()
            .await;

        let (controller, transcript) = test_controller(&server.url(), ChatConfig::default());
        controller.select_role(Role::Chercheur).await.unwrap();

        assert!(!send_and_wait(&controller, "").await);
        assert!(!send_and_wait(&controller, "   ").await);

        assert_eq!(transcript.rendered(), vec![greeting_line()]);
        mock.assert_async().await;
    }

    /// Tests that a server error is shown as the generic notice
    #[tokio::test]
    async fn it_shows_notice_on_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"Message vide ou rôle non reconnu."}"#)
            .create_async()
            .await;

        let (controller, transcript) = test_controller(&server.url(), ChatConfig::default());
        controller.select_role(Role::from("inconnu")).await.unwrap();
        send_and_wait(&controller, "Bonjour").await;

        assert_eq!(
            transcript.last().unwrap().to_string(),
            format!("bot: {}", CONNECTION_FAILURE_NOTICE)
        );
        assert_eq!(
            controller.session().unwrap().responses()[0].outcome,
            Outcome::Failed
        );
    }

    /// Tests that a reply without a `response` field is a failure
    #[tokio::test]
    async fn it_shows_notice_on_malformed_reply() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"reply":"Salut !"}"#)
            .create_async()
            .await;

        let (controller, transcript) = test_controller(&server.url(), ChatConfig::default());
        controller.select_role(Role::Pro).await.unwrap();
        send_and_wait(&controller, "Bonjour").await;

        assert_eq!(
            transcript.rendered()[1..],
            [
                "Vous: Bonjour".to_string(),
                format!("bot: {}", CONNECTION_FAILURE_NOTICE)
            ]
        );
    }

    /// Tests that an unreachable server is shown as the generic notice
    #[tokio::test]
    async fn it_shows_notice_when_server_is_unreachable() {
        let (controller, transcript) = test_controller(
            "http://127.0.0.1:1",
            ChatConfig {
                request_timeout: Some(Duration::from_secs(5)),
                ..ChatConfig::default()
            },
        );
        controller.select_role(Role::Pro).await.unwrap();
        send_and_wait(&controller, "Bonjour").await;

        assert_eq!(
            transcript.last().unwrap().to_string(),
            format!("bot: {}", CONNECTION_FAILURE_NOTICE)
        );
    }

    /// Tests the greeting fetched from the server
    #[tokio::test]
    async fn it_uses_server_greeting() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/greetings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"Bienvenue sur notre plateforme !"}"#)
            .create_async()
            .await;

        let config = ChatConfig {
            fetch_greeting: true,
            ..ChatConfig::default()
        };
        let (controller, transcript) = test_controller(&server.url(), config);
        controller.select_role(Role::Pro).await.unwrap();

        assert_eq!(
            transcript.rendered(),
            vec!["bot: Bienvenue sur notre plateforme !"]
        );
    }

    /// Tests that history and collected data are sent back to the server
    #[tokio::test]
    async fn it_sends_history_and_trajectory() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("POST", "/chat")
            .match_body(Matcher::Json(json!({
                "message": "Bonjour",
                "role": "pro",
                "history": [],
                "trajectory": {"data": {}}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"response":"Quel est ton domaine ?","trajectory":{}}"#)
            .create_async()
            .await;
        let second = server
            .mock("POST", "/chat")
            .match_body(Matcher::Json(json!({
                "message": "Le cloud",
                "role": "pro",
                "history": [
                    {"role": "user", "content": "Bonjour"},
                    {"role": "bot", "content": "Quel est ton domaine ?"}
                ],
                "trajectory": {"data": {}}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"response":"Super !","trajectory":{"domain":"cloud computing"}}"#)
            .create_async()
            .await;

        let config = ChatConfig {
            include_history: true,
            ..ChatConfig::default()
        };
        let (controller, transcript) = test_controller(&server.url(), config);
        controller.select_role(Role::Pro).await.unwrap();
        send_and_wait(&controller, "Bonjour").await;
        send_and_wait(&controller, "Le cloud").await;

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(transcript.last().unwrap().to_string(), "bot: Super !");

        let session = controller.session().unwrap();
        assert_eq!(
            session.collected().get("domain"),
            Some(&json!("cloud computing"))
        );
    }
}
