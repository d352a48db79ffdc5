pub mod commands;
pub mod config;
pub mod embeds;
pub mod handler;
pub mod logging;
pub mod player;
pub mod registry;
pub mod reply;
pub mod sources;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type CommandResult = Result<(), Error>;
