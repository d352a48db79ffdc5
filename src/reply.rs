//! Outbound replies. Handlers talk to a [`Responder`] so the command
//! layer can be exercised without a gateway; the live implementation
//! posts to the invoking text channel.
//!
//! `set_status` gives each command one editable status line: the first
//! call sends a message, later calls edit it in place, and a vanished
//! message falls back to sending a fresh one.

use std::sync::Arc;

use serenity::all::{ChannelId, CreateEmbed, CreateMessage, EditMessage, MessageId};
use serenity::async_trait;
use serenity::http::Http;
use tokio::sync::Mutex;
use tracing::debug;

use crate::Error;

#[async_trait]
pub trait Responder: Send + Sync {
    async fn say(&self, text: &str) -> Result<(), Error>;
    async fn send_embed(&self, embed: CreateEmbed) -> Result<(), Error>;
    /// Idempotent status line: send once, edit thereafter.
    async fn set_status(&self, text: &str) -> Result<(), Error>;
    /// Replace the status line with a final embed.
    async fn finish_status(&self, embed: CreateEmbed) -> Result<(), Error>;
}

pub struct ChannelResponder {
    http: Arc<Http>,
    channel: ChannelId,
    status: Mutex<Option<MessageId>>,
}

impl ChannelResponder {
    pub fn new(http: Arc<Http>, channel: ChannelId) -> Self {
        Self {
            http,
            channel,
            status: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Responder for ChannelResponder {
    async fn say(&self, text: &str) -> Result<(), Error> {
        self.channel.say(&self.http, text).await?;
        Ok(())
    }

    async fn send_embed(&self, embed: CreateEmbed) -> Result<(), Error> {
        self.channel
            .send_message(&self.http, CreateMessage::new().embed(embed))
            .await?;
        Ok(())
    }

    async fn set_status(&self, text: &str) -> Result<(), Error> {
        let mut status = self.status.lock().await;
        if let Some(message_id) = *status {
            let edit = EditMessage::new().content(text);
            if self
                .channel
                .edit_message(&self.http, message_id, edit)
                .await
                .is_ok()
            {
                return Ok(());
            }
            debug!("status message vanished, sending a new one");
        }
        let message = self.channel.say(&self.http, text).await?;
        *status = Some(message.id);
        Ok(())
    }

    async fn finish_status(&self, embed: CreateEmbed) -> Result<(), Error> {
        let mut status = self.status.lock().await;
        if let Some(message_id) = *status {
            let edit = EditMessage::new().content("").embed(embed.clone());
            if self
                .channel
                .edit_message(&self.http, message_id, edit)
                .await
                .is_ok()
            {
                return Ok(());
            }
        }
        let message = self
            .channel
            .send_message(&self.http, CreateMessage::new().embed(embed))
            .await?;
        *status = Some(message.id);
        Ok(())
    }
}
