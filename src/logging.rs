//! Tracing setup: console sink always, optional append-only file sink.
//!
//! Playback lifecycle lines use the `cadence::music` target via the
//! [`music!`](crate::music) macro so they can be filtered independently.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::BotConfig;

/// Install the global subscriber. Failures to open the log file are
/// reported on stderr and never abort startup.
pub fn init(config: &BotConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cadence=debug,warn"));

    let file_layer = config.log_file.as_ref().and_then(|path| {
        match std::fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Arc::new(file)),
            ),
            Err(e) => {
                eprintln!("could not open log file {}: {}", path.display(), e);
                None
            }
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .init();
}

/// Log a playback lifecycle line under the `cadence::music` target.
#[macro_export]
macro_rules! music {
    ($($arg:tt)*) => {
        tracing::info!(target: "cadence::music", $($arg)*)
    };
}
