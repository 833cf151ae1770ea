//! Delivery and confirmation seams consumed by the organizer

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Why a delivery attempt failed.
///
/// The organizer treats both variants identically (fall back, then count);
/// the distinction exists for operator logs.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Permission or not-found class failure; the target will likely never
    /// become reachable again.
    #[error("target is unreachable: {0}")]
    Unreachable(String),

    /// Transient transport failure; the target may recover.
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Delivers formatted notifications to a channel, or directly to a user as
/// the fallback path.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver an embed to a channel, mentioning `mention` in the content.
    async fn deliver(
        &self,
        channel_id: u64,
        title: &str,
        body: &str,
        mention: &str,
    ) -> Result<(), DeliveryError>;

    /// Deliver an embed to a user's direct-message channel.
    async fn deliver_direct(
        &self,
        user_id: u64,
        title: &str,
        body: &str,
    ) -> Result<(), DeliveryError>;
}

/// Waits for a follow-up reply from a specific author in a specific channel,
/// used by the delete confirmation round-trip.
#[async_trait]
pub trait ConfirmationWaiter: Send + Sync {
    /// Resolve to the reply content, or `None` on timeout.
    async fn await_reply(
        &self,
        author_id: u64,
        channel_id: u64,
        timeout: Duration,
    ) -> Option<String>;
}
