//! The `play` command: search, get-or-create the session, queue, start.

use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use tracing::{error, warn};

use crate::CommandResult;
use crate::commands::Precondition;
use crate::embeds;
use crate::player::SessionMetadata;
use crate::registry::{Command, CommandContext};
use crate::sources::{SearchOutcome, SourceRouter};

pub struct Play;

#[async_trait]
impl Command for Play {
    fn name(&self) -> &'static str {
        "play"
    }

    async fn run(&self, ctx: &CommandContext, args: &[&str]) -> CommandResult {
        let Some(guild) = ctx.guild else {
            ctx.responder
                .say("❌ This command only works in a server!")
                .await?;
            return Ok(());
        };
        if args.is_empty() {
            ctx.responder
                .say("❌ Please provide a song or playlist to play!")
                .await?;
            return Ok(());
        }
        let Some(caller_voice) = ctx.caller_voice else {
            ctx.responder
                .say(Precondition::NotInVoice.message())
                .await?;
            return Ok(());
        };

        let query = args.join(" ");
        ctx.responder.set_status("🔍 Searching...").await?;
        let source_label = if SourceRouter::is_spotify_query(&query) {
            "Spotify"
        } else {
            "YouTube"
        };
        ctx.responder
            .set_status(&format!("🔍 Searching {}...", source_label))
            .await?;

        let outcome = match ctx.sources.search(&query, &ctx.author).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("search for '{}' failed: {}", query, err);
                ctx.responder.set_status(&err.user_message()).await?;
                return Ok(());
            }
        };

        enqueue_outcome(ctx, guild, caller_voice, outcome).await
    }
}

/// Shared tail of `play` and `spotify`: obtain the session, verify the
/// channel, queue the tracks, start playback when idle, confirm.
pub(crate) async fn enqueue_outcome(
    ctx: &CommandContext,
    guild: GuildId,
    caller_voice: ChannelId,
    outcome: SearchOutcome,
) -> CommandResult {
    let metadata = SessionMetadata {
        responder: ctx.responder.clone(),
    };
    let session = match ctx.players.get_or_create(guild, caller_voice, metadata).await {
        Ok(session) => session,
        Err(err) => {
            error!("could not create session for guild {}: {}", guild, err);
            ctx.responder
                .set_status(&format!("❌ Could not join your voice channel: {}", err))
                .await?;
            return Ok(());
        }
    };

    if session.voice_channel() != caller_voice {
        ctx.responder
            .set_status(Precondition::DifferentChannel.message())
            .await?;
        return Ok(());
    }

    let playlist = outcome.playlist.clone();
    let total = outcome.total_duration();
    let first = outcome.tracks.first().cloned();
    let kind = outcome.tracks.first().map(|t| t.source);

    let ahead = session.queue_len().await;
    let (added, dropped) = session.enqueue(outcome.tracks).await;
    if added == 0 {
        ctx.responder
            .set_status("❌ The queue is full, nothing was added!")
            .await?;
        return Ok(());
    }
    if dropped > 0 {
        warn!("dropped {} track(s) over the queue limit", dropped);
    }

    session.play_if_idle().await;

    let embed = match (playlist, first, kind) {
        (Some(info), _, Some(kind)) => embeds::playlist_queued(&info, kind, added, total),
        (None, Some(track), _) => embeds::track_queued(&track, ahead),
        _ => return Ok(()),
    };
    ctx.responder.finish_status(embed).await?;
    Ok(())
}
