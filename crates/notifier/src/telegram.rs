use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use octorelay_common::error::RelayError;

use crate::Notifier;

/// Telegram Bot API client for `sendMessage`.
pub struct TelegramNotifier {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Envelope every Bot API method responds with.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

impl TelegramNotifier {
    /// `api_base` is the Bot API root, e.g. `https://api.telegram.org`.
    pub fn new(http: reqwest::Client, api_base: &str, bot_token: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, destination: &str, text: &str) -> Result<(), RelayError> {
        // reqwest errors carry the request URL, which embeds the bot token.
        let response = self
            .http
            .post(self.method_url("sendMessage"))
            .json(&SendMessage {
                chat_id: destination,
                text,
            })
            .send()
            .await
            .map_err(|e| RelayError::Delivery(e.without_url().to_string()))?;

        let status = response.status();
        let body: Option<ApiResponse> = response.json().await.ok();

        match body {
            Some(ApiResponse { ok: true, .. }) if status.is_success() => {
                tracing::debug!(chat_id = destination, "Telegram message delivered");
                Ok(())
            }
            Some(api) => {
                let mut reason = api
                    .description
                    .unwrap_or_else(|| format!("Telegram API returned status {status}"));
                if let Some(retry_after) = api.parameters.and_then(|p| p.retry_after) {
                    reason.push_str(&format!(" (retry after {retry_after}s)"));
                }
                Err(RelayError::Delivery(reason))
            }
            None => Err(RelayError::Delivery(format!(
                "Telegram API returned status {status} with an unreadable body"
            ))),
        }
    }
}
