//! Notification delivery to the Telegram Bot API
//!
//! Reports are sent verbatim with `parse_mode=HTML`. Failed deliveries are
//! reported to the caller and never retried.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Public Telegram Bot API endpoint
pub const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Telegram API returned {status}: {description}")]
    Api { status: u16, description: String },
    #[error("Telegram API rejected the request: {0}")]
    Rejected(String),
}

/// Destination for formatted report text
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a message as-is
    async fn send(&self, text: &str) -> Result<(), NotifyError>;

    /// Check that the endpoint is reachable and the credentials are accepted
    async fn test_connection(&self) -> Result<(), NotifyError>;
}

/// Settings for [`TelegramNotifier`]
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub api_base_url: String,
    /// Timeout for sending a message
    pub request_timeout: Duration,
    /// Timeout for the connection test
    pub connect_test_timeout: Duration,
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            connect_test_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Serialize)]
struct SendMessageForm<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

/// Envelope of every Bot API response
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends messages through the Telegram Bot API
pub struct TelegramNotifier {
    client: Client,
    config: TelegramConfig,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.bot_token,
            method
        )
    }

    /// Turn a Bot API response into `Ok` only for a 2xx status with `"ok": true`
    async fn check_response(response: reqwest::Response) -> Result<(), NotifyError> {
        let status = response.status();
        let body = response.text().await?;
        let parsed = serde_json::from_str::<ApiResponse>(&body).ok();

        if !status.is_success() {
            let description = parsed
                .and_then(|r| r.description)
                .unwrap_or(body);
            return Err(NotifyError::Api {
                status: status.as_u16(),
                description,
            });
        }

        match parsed {
            Some(ApiResponse { ok: false, description }) => Err(NotifyError::Rejected(
                description.unwrap_or_else(|| "no description".to_string()),
            )),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let form = SendMessageForm {
            chat_id: &self.config.chat_id,
            text,
            parse_mode: "HTML",
        };

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .timeout(self.config.request_timeout)
            .form(&form)
            .send()
            .await?;

        Self::check_response(response).await?;
        debug!(bytes = text.len(), "Message sent");
        Ok(())
    }

    async fn test_connection(&self) -> Result<(), NotifyError> {
        let response = self
            .client
            .get(self.method_url("getMe"))
            .timeout(self.config.connect_test_timeout)
            .send()
            .await?;

        Self::check_response(response).await?;
        info!("Telegram bot connection verified");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn notifier(server: &mockito::ServerGuard) -> TelegramNotifier {
        let mut config = TelegramConfig::new("123:abc", "-100200");
        config.api_base_url = server.url();
        TelegramNotifier::new(config)
    }

    #[tokio::test]
    async fn test_send_posts_html_form() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bot123:abc/sendMessage")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("chat_id".into(), "-100200".into()),
                Matcher::UrlEncoded("text".into(), "📊 <b>CPU Usage:</b> 1.0%\n".into()),
                Matcher::UrlEncoded("parse_mode".into(), "HTML".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"ok":true,"result":{"message_id":1}}"#)
            .create_async()
            .await;

        notifier(&server)
            .send("📊 <b>CPU Usage:</b> 1.0%\n")
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_reports_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/bot123:abc/sendMessage")
            .with_status(400)
            .with_body(r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#)
            .create_async()
            .await;

        let err = notifier(&server).send("hello").await.unwrap_err();

        match err {
            NotifyError::Api {
                status,
                description,
            } => {
                assert_eq!(status, 400);
                assert_eq!(description, "Bad Request: chat not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_send_reports_rejection_with_ok_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/bot123:abc/sendMessage")
            .with_status(200)
            .with_body(r#"{"ok":false,"description":"Forbidden"}"#)
            .create_async()
            .await;

        let err = notifier(&server).send("hello").await.unwrap_err();
        assert!(matches!(err, NotifyError::Rejected(ref d) if d == "Forbidden"));
    }

    #[tokio::test]
    async fn test_connection_uses_get_me() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/bot123:abc/getMe")
            .with_status(200)
            .with_body(r#"{"ok":true,"result":{"id":123,"is_bot":true}}"#)
            .create_async()
            .await;

        notifier(&server).test_connection().await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_connection_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/bot123:abc/getMe")
            .with_status(401)
            .with_body(r#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#)
            .create_async()
            .await;

        let err = notifier(&server).test_connection().await.unwrap_err();
        assert!(err.to_string().contains("Unauthorized"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_http_error() {
        let mut config = TelegramConfig::new("123:abc", "1");
        config.api_base_url = "http://127.0.0.1:1".to_string();
        config.request_timeout = Duration::from_secs(2);

        let err = TelegramNotifier::new(config).send("hi").await.unwrap_err();
        assert!(matches!(err, NotifyError::Http(_)));
    }

    #[test]
    fn test_method_url_trims_trailing_slash() {
        let mut config = TelegramConfig::new("tok", "1");
        config.api_base_url = "https://example.test/".to_string();
        let notifier = TelegramNotifier::new(config);
        assert_eq!(
            notifier.method_url("getMe"),
            "https://example.test/bottok/getMe"
        );
    }
}
