pub mod github;

use async_trait::async_trait;

use octorelay_common::types::NotificationItem;

pub use github::GitHubClient;

/// Anything the poll loop can ask for unread notifications.
#[async_trait]
pub trait NotificationSource: Send + Sync {
    /// Fetch the currently unread items.
    ///
    /// Failures are logged by the implementation and reported as an empty
    /// list, so a bad poll never stops the loop.
    async fn fetch_unread(&self) -> Vec<NotificationItem>;
}
