use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};

use octorelay_common::error::RelayError;
use octorelay_common::types::{NotificationItem, RawNotification};

use crate::NotificationSource;

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const CLIENT_USER_AGENT: &str = concat!("octorelay/", env!("CARGO_PKG_VERSION"));

/// Client for the GitHub notifications endpoint.
pub struct GitHubClient {
    http: reqwest::Client,
    notifications_url: String,
    token: String,
}

impl GitHubClient {
    /// `base_url` is the API root, e.g. `https://api.github.com`.
    pub fn new(http: reqwest::Client, base_url: &str, token: impl Into<String>) -> Self {
        Self {
            http,
            notifications_url: format!("{}/notifications", base_url.trim_end_matches('/')),
            token: token.into(),
        }
    }

    /// One request to the notifications endpoint, returning every decoded item.
    async fn request(&self) -> Result<Vec<NotificationItem>, RelayError> {
        let response = self
            .http
            .get(&self.notifications_url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Fetch(format!(
                "GitHub API returned status {status}"
            )));
        }

        let raw: Vec<RawNotification> = response
            .json()
            .await
            .map_err(|e| RelayError::Fetch(format!("invalid notifications payload: {e}")))?;

        let total = raw.len();
        let items: Vec<NotificationItem> = raw
            .into_iter()
            .filter_map(NotificationItem::from_raw)
            .collect();
        if items.len() < total {
            tracing::warn!(
                skipped = total - items.len(),
                "Skipped notifications without a usable id"
            );
        }

        Ok(items)
    }
}

#[async_trait]
impl NotificationSource for GitHubClient {
    async fn fetch_unread(&self) -> Vec<NotificationItem> {
        match self.request().await {
            Ok(items) => {
                let total = items.len();
                let unread: Vec<_> = items.into_iter().filter(|n| n.unread).collect();
                tracing::debug!(total, unread = unread.len(), "Fetched notifications");
                unread
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch notifications from GitHub API");
                Vec::new()
            }
        }
    }
}
