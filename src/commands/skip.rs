use serenity::async_trait;
use tracing::error;

use crate::CommandResult;
use crate::commands::{Precondition, session_for_mutation};
use crate::player::PlayerError;
use crate::registry::{Command, CommandContext, GENERIC_FAILURE};

pub struct Skip;

#[async_trait]
impl Command for Skip {
    fn name(&self) -> &'static str {
        "skip"
    }

    async fn run(&self, ctx: &CommandContext, _args: &[&str]) -> CommandResult {
        let session = match session_for_mutation(ctx) {
            Ok(session) => session,
            Err(p) => {
                ctx.responder.say(p.message()).await?;
                return Ok(());
            }
        };

        match session.skip().await {
            Ok(track) => {
                ctx.responder
                    .say(&format!("⏭️ **{}** skipped!", track.title))
                    .await?;
            }
            Err(PlayerError::NothingPlaying) => {
                ctx.responder
                    .say(Precondition::NothingPlaying.message())
                    .await?;
            }
            Err(err) => {
                error!("skip failed: {}", err);
                ctx.responder.say(GENERIC_FAILURE).await?;
            }
        }
        Ok(())
    }
}
