// https://core.telegram.org/bots/api

use std::collections::HashMap;
use std::time::Duration;

pub mod models;
use reqwest::Client;
use thiserror::Error;

use crate::models::{ApiResponse, Message, Update};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Clone)]
pub struct TelegramOptions {
    pub bot_token: String,
    pub api_base: String,
}

impl TelegramOptions {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

/// Error returned by [`TelegramService`] calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TelegramError {
    /// The recipient blocked the bot or never started it (HTTP 403).
    #[error("recipient has blocked the bot")]
    Forbidden,

    /// Telegram answered with a non-success envelope.
    #[error("telegram api error: {0}")]
    Api(String),

    /// The request never completed or the body was not parseable.
    /// Never carries the request URL, which embeds the bot token.
    #[error("telegram transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        TelegramError::Transport(e.without_url().to_string())
    }
}

#[derive(Debug, Clone)]
pub struct TelegramService {
    options: TelegramOptions,
    client: Client,
}

impl TelegramService {
    pub fn new(options: TelegramOptions) -> Self {
        Self {
            options,
            client: Client::new(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{base}/bot{token}/{method}",
            base = self.options.api_base.trim_end_matches('/'),
            token = self.options.bot_token,
            method = method
        )
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<Message, TelegramError> {
        let chat_id = chat_id.to_string();
        let mut form_body: HashMap<&str, &str> = HashMap::new();
        form_body.insert("chat_id", &chat_id);
        form_body.insert("text", text);

        let res = self
            .client
            .post(self.method_url("sendMessage"))
            .form(&form_body)
            .send()
            .await;

        match res {
            Ok(response) => {
                let status = response.status();
                if status == reqwest::StatusCode::FORBIDDEN {
                    return Err(TelegramError::Forbidden);
                }

                let envelope = response.json::<ApiResponse<Message>>().await?;
                unwrap_envelope(envelope)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Long-poll for updates starting at `offset`.
    ///
    /// Only `channel_post` updates are requested; direct messages are left
    /// for whatever serves the holder-facing side of the bot.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout: Duration,
    ) -> Result<Vec<Update>, TelegramError> {
        let body = serde_json::json!({
            "offset": offset,
            "timeout": timeout.as_secs(),
            "allowed_updates": ["channel_post"],
        });

        let res = self
            .client
            .post(self.method_url("getUpdates"))
            .timeout(timeout + Duration::from_secs(10))
            .json(&body)
            .send()
            .await;

        match res {
            Ok(response) => {
                let envelope = response.json::<ApiResponse<Vec<Update>>>().await?;
                unwrap_envelope(envelope)
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn unwrap_envelope<T>(envelope: ApiResponse<T>) -> Result<T, TelegramError> {
    if envelope.error_code == Some(403) {
        return Err(TelegramError::Forbidden);
    }
    match (envelope.ok, envelope.result) {
        (true, Some(result)) => Ok(result),
        _ => Err(TelegramError::Api(
            envelope
                .description
                .unwrap_or_else(|| "no description".to_string()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_url_strips_trailing_slash() {
        let service = TelegramService::new(TelegramOptions {
            bot_token: "123:abc".to_string(),
            api_base: "http://localhost:8081/".to_string(),
        });
        assert_eq!(
            service.method_url("sendMessage"),
            "http://localhost:8081/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_forbidden_envelope_maps_to_forbidden() {
        let envelope: ApiResponse<Message> = ApiResponse {
            ok: false,
            result: None,
            description: Some("Forbidden: bot was blocked by the user".to_string()),
            error_code: Some(403),
        };
        assert_eq!(unwrap_envelope(envelope).unwrap_err(), TelegramError::Forbidden);
    }

    #[test]
    fn test_failed_envelope_keeps_description() {
        let envelope: ApiResponse<Vec<Update>> = ApiResponse {
            ok: false,
            result: None,
            description: Some("Bad Request: chat not found".to_string()),
            error_code: Some(400),
        };
        assert_eq!(
            unwrap_envelope(envelope).unwrap_err(),
            TelegramError::Api("Bad Request: chat not found".to_string())
        );
    }

    #[tokio::test]
    async fn test_transport_error_does_not_leak_token() {
        let service = TelegramService::new(TelegramOptions {
            bot_token: "123:SECRETTOKEN".to_string(),
            api_base: "http://127.0.0.1:1".to_string(),
        });

        let err = service.send_message(42, "hello").await.unwrap_err();

        assert!(matches!(err, TelegramError::Transport(_)));
        assert!(!err.to_string().contains("SECRETTOKEN"));
    }
}
