//! The `spotify` command: like `play`, but pinned to the Spotify
//! adapter. A bare text query becomes a Spotify search instead of an
//! auto search.

use serenity::async_trait;
use tracing::warn;

use crate::CommandResult;
use crate::commands::Precondition;
use crate::commands::play::enqueue_outcome;
use crate::registry::{Command, CommandContext};

pub struct Spotify;

#[async_trait]
impl Command for Spotify {
    fn name(&self) -> &'static str {
        "spotify"
    }

    async fn run(&self, ctx: &CommandContext, args: &[&str]) -> CommandResult {
        let Some(guild) = ctx.guild else {
            ctx.responder
                .say("❌ This command only works in a server!")
                .await?;
            return Ok(());
        };
        if !ctx.sources.spotify_configured() {
            ctx.responder
                .say(
                    "❌ Spotify is not configured! Set SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET.",
                )
                .await?;
            return Ok(());
        }
        if args.is_empty() {
            ctx.responder
                .say("❌ Please provide a Spotify song or playlist!")
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
        ctx.responder.set_status("🔍 Searching Spotify...").await?;

        let outcome = match ctx.sources.search_spotify(&query, &ctx.author).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("Spotify search for '{}' failed: {}", query, err);
                ctx.responder.set_status(&err.user_message()).await?;
                return Ok(());
            }
        };

        enqueue_outcome(ctx, guild, caller_voice, outcome).await
    }
}
