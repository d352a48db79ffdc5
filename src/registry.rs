//! The command table and dispatch boundary. Built once at startup and
//! threaded explicitly into the gateway handler; there is no ambient
//! command collection.

use std::collections::HashMap;
use std::sync::Arc;

use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use tracing::{debug, error, info};

use crate::CommandResult;
use crate::config::BotConfig;
use crate::player::{PlayerManager, Requester};
use crate::reply::Responder;
use crate::sources::SourceRouter;

/// Reply used whenever a handler fails unexpectedly.
pub const GENERIC_FAILURE: &str = "❌ Something went wrong while running that command!";

/// Everything a handler may touch, resolved per incoming message.
pub struct CommandContext {
    pub config: Arc<BotConfig>,
    pub players: Arc<PlayerManager>,
    pub sources: Arc<SourceRouter>,
    /// The destination the command targets; `None` outside a guild.
    pub guild: Option<GuildId>,
    pub author: Requester,
    /// Voice channel the caller is currently in, if any.
    pub caller_voice: Option<ChannelId>,
    pub text_channel: ChannelId,
    pub responder: Arc<dyn Responder>,
}

/// One registered command.
#[async_trait]
pub trait Command: Send + Sync {
    fn name(&self) -> &'static str;
    async fn run(&self, ctx: &CommandContext, args: &[&str]) -> CommandResult;
}

pub struct CommandRegistry {
    prefix: String,
    commands: HashMap<String, Box<dyn Command>>,
}

impl CommandRegistry {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            commands: HashMap::new(),
        }
    }

    pub fn register(&mut self, command: Box<dyn Command>) {
        self.commands.insert(command.name().to_lowercase(), command);
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Split a raw message into a case-folded command name and argument
    /// tokens. `None` when the prefix is missing or nothing follows it.
    pub fn parse<'a>(&self, content: &'a str) -> Option<(String, Vec<&'a str>)> {
        let rest = content.strip_prefix(self.prefix.as_str())?;
        let mut tokens = rest.split_whitespace();
        let name = tokens.next()?.to_lowercase();
        Some((name, tokens.collect()))
    }

    /// Dispatch one message. Unknown commands are ignored; a handler
    /// error is logged and turned into a single generic reply, never
    /// propagated.
    pub async fn dispatch(&self, content: &str, ctx: &CommandContext) {
        let Some((name, args)) = self.parse(content) else {
            return;
        };
        let Some(command) = self.commands.get(&name) else {
            debug!("ignoring unknown command '{}'", name);
            return;
        };

        info!("command '{}' invoked by {}", name, ctx.author.name);
        if let Err(err) = command.run(ctx, &args).await {
            error!("command '{}' failed: {}", name, err);
            let _ = ctx.responder.say(GENERIC_FAILURE).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn registry() -> CommandRegistry {
        CommandRegistry::new("!")
    }

    #[test]
    fn parse_requires_the_prefix() {
        assert!(registry().parse("play despacito").is_none());
        assert!(registry().parse("?play despacito").is_none());
    }

    #[test]
    fn parse_splits_name_and_args() {
        let r = registry();
        let (name, args) = r.parse("!play never gonna give you up").unwrap();
        assert_eq!(name, "play");
        assert_eq!(args, vec!["never", "gonna", "give", "you", "up"]);
    }

    #[test]
    fn parse_case_folds_the_command_name() {
        let r = registry();
        let (name, _) = r.parse("!PLaY x").unwrap();
        assert_eq!(name, "play");
    }

    #[test]
    fn parse_collapses_extra_whitespace() {
        let r = registry();
        let (name, args) = r.parse("!volume   57").unwrap();
        assert_eq!(name, "volume");
        assert_eq!(args, vec!["57"]);
    }

    #[test]
    fn bare_prefix_parses_to_nothing() {
        assert!(registry().parse("!").is_none());
        assert!(registry().parse("!   ").is_none());
    }
}
