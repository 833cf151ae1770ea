//! Discord (serenity) implementations of the delivery and confirmation seams

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serenity::builder::{CreateEmbed, CreateMessage};
use serenity::http::{Http, HttpError};
use serenity::model::id::{ChannelId, UserId};
use tokio::sync::broadcast;
use tracing::debug;

use remora_core::{EMBED_MAX_CHARACTERS, chunk_text};

use crate::notifier::{ConfirmationWaiter, DeliveryError, Notifier};

/// Delivers reminder embeds through the Discord REST API.
///
/// Bodies longer than the embed description limit are chunked and sent as a
/// sequence of embeds with the same title.
pub struct DiscordNotifier {
    http: Arc<Http>,
}

impl DiscordNotifier {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    fn build_messages(title: &str, body: &str, mention: Option<&str>) -> Vec<CreateMessage> {
        let chunks = if body.is_empty() {
            vec![String::new()]
        } else {
            chunk_text(body, EMBED_MAX_CHARACTERS)
        };
        chunks
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| {
                let embed = CreateEmbed::new().title(title).description(chunk);
                let mut message = CreateMessage::new().embed(embed);
                // Only the first message carries the mention
                if i == 0 {
                    if let Some(mention) = mention {
                        message = message.content(mention);
                    }
                }
                message
            })
            .collect()
    }

    fn map_error(err: serenity::Error) -> DeliveryError {
        if let serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) = &err {
            let status = response.status_code.as_u16();
            if status == 403 || status == 404 {
                return DeliveryError::Unreachable(err.to_string());
            }
        }
        DeliveryError::Transport(err.to_string())
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn deliver(
        &self,
        channel_id: u64,
        title: &str,
        body: &str,
        mention: &str,
    ) -> Result<(), DeliveryError> {
        let channel = ChannelId::new(channel_id);
        for message in Self::build_messages(title, body, Some(mention)) {
            channel
                .send_message(&self.http, message)
                .await
                .map_err(Self::map_error)?;
        }
        Ok(())
    }

    async fn deliver_direct(
        &self,
        user_id: u64,
        title: &str,
        body: &str,
    ) -> Result<(), DeliveryError> {
        let dm = UserId::new(user_id)
            .create_dm_channel(&self.http)
            .await
            .map_err(Self::map_error)?;
        for message in Self::build_messages(title, body, None) {
            dm.id
                .send_message(&self.http, message)
                .await
                .map_err(Self::map_error)?;
        }
        Ok(())
    }
}

/// A reply observed by the gateway event handler.
#[derive(Debug, Clone)]
pub struct IncomingReply {
    pub author_id: u64,
    pub channel_id: u64,
    pub content: String,
}

/// Routes gateway messages to pending confirmation waits.
///
/// The bot's message event handler feeds every non-bot message through
/// [`ReplyRouter::route`]; `await_reply` picks out the first one matching
/// the author and channel it cares about.
#[derive(Clone)]
pub struct ReplyRouter {
    tx: broadcast::Sender<IncomingReply>,
}

impl ReplyRouter {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    /// Feed a message from the gateway. Lossy when nothing is waiting.
    pub fn route(&self, reply: IncomingReply) {
        let _ = self.tx.send(reply);
    }
}

impl Default for ReplyRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfirmationWaiter for ReplyRouter {
    async fn await_reply(
        &self,
        author_id: u64,
        channel_id: u64,
        timeout: Duration,
    ) -> Option<String> {
        let mut rx = self.tx.subscribe();
        let wait = async {
            loop {
                match rx.recv().await {
                    Ok(reply) if reply.author_id == author_id && reply.channel_id == channel_id => {
                        return Some(reply.content);
                    }
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("reply router lagged, skipped {skipped} messages");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        };
        tokio::time::timeout(timeout, wait).await.ok().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_await_reply_matches_author_and_channel() {
        let router = ReplyRouter::new();
        let waiter = router.clone();
        let handle = tokio::spawn(async move {
            waiter.await_reply(1, 10, Duration::from_secs(1)).await
        });
        // Give the waiter time to subscribe
        tokio::time::sleep(Duration::from_millis(20)).await;

        router.route(IncomingReply {
            author_id: 2,
            channel_id: 10,
            content: "wrong author".to_string(),
        });
        router.route(IncomingReply {
            author_id: 1,
            channel_id: 99,
            content: "wrong channel".to_string(),
        });
        router.route(IncomingReply {
            author_id: 1,
            channel_id: 10,
            content: "yes".to_string(),
        });

        assert_eq!(handle.await.unwrap(), Some("yes".to_string()));
    }

    #[tokio::test]
    async fn test_await_reply_times_out() {
        let router = ReplyRouter::new();
        let reply = router.await_reply(1, 10, Duration::from_millis(30)).await;
        assert_eq!(reply, None);
    }

    #[test]
    fn test_build_messages_chunks_long_body() {
        let body = "x".repeat(EMBED_MAX_CHARACTERS * 2 + 10);
        let messages = DiscordNotifier::build_messages("Reminder", &body, Some("<@1>"));
        assert_eq!(messages.len(), 3);
    }

    #[test]
    fn test_build_messages_empty_body() {
        let messages = DiscordNotifier::build_messages("Reminder", "", None);
        assert_eq!(messages.len(), 1);
    }
}
