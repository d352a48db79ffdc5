use serenity::async_trait;
use tracing::error;

use crate::CommandResult;
use crate::commands::{ensure_same_channel, session_and_voice};
use crate::registry::{Command, CommandContext, GENERIC_FAILURE};

pub struct Volume;

#[async_trait]
impl Command for Volume {
    fn name(&self) -> &'static str {
        "volume"
    }

    async fn run(&self, ctx: &CommandContext, args: &[&str]) -> CommandResult {
        let session = match session_and_voice(ctx) {
            Ok(session) => session,
            Err(p) => {
                ctx.responder.say(p.message()).await?;
                return Ok(());
            }
        };

        // Bare invocation just reports; no same-channel requirement.
        let Some(arg) = args.first() else {
            ctx.responder
                .say(&format!(
                    "🔊 The current volume is **{}%**",
                    session.volume().await
                ))
                .await?;
            return Ok(());
        };

        if let Err(p) = ensure_same_channel(ctx, &session) {
            ctx.responder.say(p.message()).await?;
            return Ok(());
        }

        let volume = match arg.parse::<i64>() {
            Ok(v) if (1..=100).contains(&v) => v as u8,
            Ok(_) => {
                ctx.responder
                    .say("❌ Volume must be between 1 and 100!")
                    .await?;
                return Ok(());
            }
            Err(_) => {
                ctx.responder
                    .say("❌ Please provide a valid number between 1 and 100!")
                    .await?;
                return Ok(());
            }
        };

        match session.set_volume(volume).await {
            Ok(()) => {
                ctx.responder
                    .say(&format!("🔊 Volume set to **{}%**", volume))
                    .await?;
            }
            Err(err) => {
                error!("volume change failed: {}", err);
                ctx.responder.say(GENERIC_FAILURE).await?;
            }
        }
        Ok(())
    }
}
