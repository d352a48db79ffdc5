use serenity::async_trait;

use crate::CommandResult;
use crate::commands::Precondition;
use crate::embeds;
use crate::registry::{Command, CommandContext};

pub struct Queue;

#[async_trait]
impl Command for Queue {
    fn name(&self) -> &'static str {
        "queue"
    }

    async fn run(&self, ctx: &CommandContext, _args: &[&str]) -> CommandResult {
        let Some(session) = ctx.guild.and_then(|guild| ctx.players.get(guild)) else {
            ctx.responder
                .say(Precondition::NothingPlaying.message())
                .await?;
            return Ok(());
        };

        let snapshot = session.snapshot().await;
        ctx.responder
            .send_embed(embeds::queue_overview(&snapshot))
            .await?;
        Ok(())
    }
}
