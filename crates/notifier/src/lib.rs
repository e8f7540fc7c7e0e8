//! Delivery of relayed notifications to a chat destination.
//!
//! Only Telegram is implemented. Each call delivers exactly one message and
//! either succeeds or returns `RelayError::Delivery`; retries are left to the
//! poll loop's next cycle.

pub mod telegram;

use async_trait::async_trait;

use octorelay_common::error::RelayError;

pub use telegram::TelegramNotifier;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text` to `destination` (a chat or channel id).
    async fn send(&self, destination: &str, text: &str) -> Result<(), RelayError>;
}
