use serenity::async_trait;

use crate::CommandResult;
use crate::embeds;
use crate::registry::{Command, CommandContext};

pub struct Help;

#[async_trait]
impl Command for Help {
    fn name(&self) -> &'static str {
        "help"
    }

    async fn run(&self, ctx: &CommandContext, _args: &[&str]) -> CommandResult {
        ctx.responder
            .send_embed(embeds::help(&ctx.config.prefix))
            .await?;
        Ok(())
    }
}
