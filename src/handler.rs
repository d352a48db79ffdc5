//! Gateway event handler: turns incoming messages into dispatches and
//! voice-state updates into engine events.

use std::sync::Arc;

use serenity::all::{ActivityData, Context, EventHandler, Message, Ready, VoiceState};
use serenity::async_trait;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::config::BotConfig;
use crate::player::{PlayerEvent, PlayerManager, Requester};
use crate::registry::{CommandContext, CommandRegistry};
use crate::reply::ChannelResponder;
use crate::sources::SourceRouter;

pub struct Handler {
    pub config: Arc<BotConfig>,
    pub registry: Arc<CommandRegistry>,
    pub players: Arc<PlayerManager>,
    pub sources: Arc<SourceRouter>,
    pub events: UnboundedSender<PlayerEvent>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            "{} connected with {} commands registered",
            ready.user.name,
            self.registry.len()
        );
        ctx.set_activity(Some(ActivityData::listening(format!(
            "{}help",
            self.config.prefix
        ))));
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot || !msg.content.starts_with(self.registry.prefix()) {
            return;
        }
        let Some(guild_id) = msg.guild_id else {
            debug!("ignoring command outside a guild");
            return;
        };

        let caller_voice = ctx.cache.guild(guild_id).and_then(|guild| {
            guild
                .voice_states
                .get(&msg.author.id)
                .and_then(|vs| vs.channel_id)
        });

        let command_ctx = CommandContext {
            config: self.config.clone(),
            players: self.players.clone(),
            sources: self.sources.clone(),
            guild: Some(guild_id),
            author: Requester {
                id: msg.author.id,
                name: msg.author.name.clone(),
            },
            caller_voice,
            text_channel: msg.channel_id,
            responder: Arc::new(ChannelResponder::new(ctx.http.clone(), msg.channel_id)),
        };

        self.registry.dispatch(&msg.content, &command_ctx).await;
    }

    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        let Some(guild_id) = new
            .guild_id
            .or_else(|| old.as_ref().and_then(|o| o.guild_id))
        else {
            return;
        };
        if self.players.get(guild_id).is_none() {
            return;
        }

        let bot_id = ctx.cache.current_user().id;

        // The bot itself dropped out of voice: tear the session down.
        if new.user_id == bot_id && new.channel_id.is_none() {
            info!("disconnected from voice in guild {}, removing session", guild_id);
            let _ = self.players.delete(guild_id).await;
            return;
        }

        let listeners = {
            let Some(guild) = ctx.cache.guild(guild_id) else {
                return;
            };
            let Some(bot_channel) = guild.voice_states.get(&bot_id).and_then(|vs| vs.channel_id)
            else {
                return;
            };
            guild
                .voice_states
                .values()
                .filter(|vs| vs.channel_id == Some(bot_channel) && vs.user_id != bot_id)
                .count()
        };

        let event = if listeners == 0 {
            PlayerEvent::ChannelEmpty { guild: guild_id }
        } else {
            PlayerEvent::ChannelOccupied { guild: guild_id }
        };
        let _ = self.events.send(event);
    }
}
