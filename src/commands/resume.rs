use serenity::async_trait;
use tracing::error;

use crate::CommandResult;
use crate::commands::{Precondition, session_for_mutation};
use crate::player::PlayerError;
use crate::registry::{Command, CommandContext, GENERIC_FAILURE};

pub struct Resume;

#[async_trait]
impl Command for Resume {
    fn name(&self) -> &'static str {
        "resume"
    }

    async fn run(&self, ctx: &CommandContext, _args: &[&str]) -> CommandResult {
        let session = match session_for_mutation(ctx) {
            Ok(session) => session,
            Err(p) => {
                ctx.responder.say(p.message()).await?;
                return Ok(());
            }
        };

        if !session.is_paused().await {
            ctx.responder.say("⚠️ Playback is not paused!").await?;
            return Ok(());
        }

        match session.resume().await {
            Ok(track) => {
                ctx.responder
                    .say(&format!("▶️ Resumed **{}**!", track.title))
                    .await?;
            }
            Err(PlayerError::NothingPlaying) => {
                ctx.responder
                    .say(Precondition::NothingPlaying.message())
                    .await?;
            }
            Err(err) => {
                error!("resume failed: {}", err);
                ctx.responder.say(GENERIC_FAILURE).await?;
            }
        }
        Ok(())
    }
}
