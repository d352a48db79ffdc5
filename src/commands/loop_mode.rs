//! The `loop` command: OFF → TRACK → QUEUE → OFF when invoked bare;
//! explicit arguments jump straight to the named mode.

use serenity::async_trait;

use crate::CommandResult;
use crate::commands::session_for_mutation;
use crate::player::RepeatMode;
use crate::registry::{Command, CommandContext};

pub struct Loop;

#[async_trait]
impl Command for Loop {
    fn name(&self) -> &'static str {
        "loop"
    }

    async fn run(&self, ctx: &CommandContext, args: &[&str]) -> CommandResult {
        let session = match session_for_mutation(ctx) {
            Ok(session) => session,
            Err(p) => {
                ctx.responder.say(p.message()).await?;
                return Ok(());
            }
        };

        let mode = match args.first() {
            Some(arg) => match RepeatMode::parse(arg) {
                Some(mode) => mode,
                None => {
                    ctx.responder
                        .say("❌ Use `loop off`, `loop track`, or `loop queue`.")
                        .await?;
                    return Ok(());
                }
            },
            None => session.repeat().await.cycled(),
        };

        session.set_repeat(mode).await;
        let confirmation = match mode {
            RepeatMode::Off => "🔄 Repeat disabled!",
            RepeatMode::Track => "🔂 Repeating the **current track**!",
            RepeatMode::Queue => "🔁 Repeating the **entire queue**!",
        };
        ctx.responder.say(confirmation).await?;
        Ok(())
    }
}
