//! Command handlers: each validates caller state against the current
//! session, performs at most one mutating call, and replies.

pub(crate) mod help;
pub(crate) mod loop_mode;
pub(crate) mod pause;
pub(crate) mod play;
pub(crate) mod queue;
pub(crate) mod resume;
pub(crate) mod skip;
pub(crate) mod spotify;
pub(crate) mod stop;
pub(crate) mod volume;

use std::sync::Arc;

use crate::config::BotConfig;
use crate::player::SessionQueue;
use crate::registry::{CommandContext, CommandRegistry};

/// Build the full command table. Constructed once at startup.
pub fn registry(config: &BotConfig) -> CommandRegistry {
    let mut registry = CommandRegistry::new(config.prefix.clone());
    registry.register(Box::new(play::Play));
    registry.register(Box::new(spotify::Spotify));
    registry.register(Box::new(pause::Pause));
    registry.register(Box::new(resume::Resume));
    registry.register(Box::new(skip::Skip));
    registry.register(Box::new(stop::Stop));
    registry.register(Box::new(volume::Volume));
    registry.register(Box::new(loop_mode::Loop));
    registry.register(Box::new(queue::Queue));
    registry.register(Box::new(help::Help));
    registry.register(Box::new(test::Test));
    registry
}

/// Failed shared-validation step, with its user-facing reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Precondition {
    NothingPlaying,
    NotInVoice,
    DifferentChannel,
}

impl Precondition {
    pub(crate) fn message(&self) -> &'static str {
        match self {
            Precondition::NothingPlaying => "❌ Nothing is playing right now!",
            Precondition::NotInVoice => {
                "❌ You need to be in a voice channel to use this command!"
            }
            Precondition::DifferentChannel => {
                "❌ You need to be in the same voice channel as me!"
            }
        }
    }
}

/// Steps 1 and 2 of the shared validation order: resolve the session for
/// this destination, then require the caller to be in voice.
pub(crate) fn session_and_voice(
    ctx: &CommandContext,
) -> Result<Arc<SessionQueue>, Precondition> {
    let session = ctx
        .guild
        .and_then(|guild| ctx.players.get(guild))
        .ok_or(Precondition::NothingPlaying)?;
    ctx.caller_voice.ok_or(Precondition::NotInVoice)?;
    Ok(session)
}

/// Step 3: the bot must not be bound to a different channel than the
/// caller.
pub(crate) fn ensure_same_channel(
    ctx: &CommandContext,
    session: &SessionQueue,
) -> Result<(), Precondition> {
    match ctx.caller_voice {
        Some(channel) if channel == session.voice_channel() => Ok(()),
        Some(_) => Err(Precondition::DifferentChannel),
        None => Err(Precondition::NotInVoice),
    }
}

/// The full shared chain for state-mutating commands.
pub(crate) fn session_for_mutation(
    ctx: &CommandContext,
) -> Result<Arc<SessionQueue>, Precondition> {
    let session = session_and_voice(ctx)?;
    ensure_same_channel(ctx, &session)?;
    Ok(session)
}
