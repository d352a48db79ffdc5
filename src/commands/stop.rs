use serenity::async_trait;
use tracing::error;

use crate::CommandResult;
use crate::commands::session_for_mutation;
use crate::registry::{Command, CommandContext, GENERIC_FAILURE};

pub struct Stop;

#[async_trait]
impl Command for Stop {
    fn name(&self) -> &'static str {
        "stop"
    }

    async fn run(&self, ctx: &CommandContext, _args: &[&str]) -> CommandResult {
        let session = match session_for_mutation(ctx) {
            Ok(session) => session,
            Err(p) => {
                ctx.responder.say(p.message()).await?;
                return Ok(());
            }
        };

        match ctx.players.delete(session.guild()).await {
            Ok(()) => {
                ctx.responder
                    .say("🛑 Stopped playback and cleared the queue!")
                    .await?;
            }
            Err(err) => {
                error!("stop failed: {}", err);
                ctx.responder.say(GENERIC_FAILURE).await?;
            }
        }
        Ok(())
    }
}
