use std::sync::Arc;

use dotenv::dotenv;
use serenity::all::{ClientBuilder, GatewayIntents};
use songbird::{SerenityInit, Songbird};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use cadence::commands;
use cadence::config::BotConfig;
use cadence::handler::Handler;
use cadence::logging;
use cadence::player::connector::SongbirdConnector;
use cadence::player::{PlayerManager, events};
use cadence::sources::spotify::SpotifySearch;
use cadence::sources::youtube::YoutubeSearch;
use cadence::sources::{SearchSource, SourceRouter};

#[tokio::main]
async fn main() -> Result<(), cadence::Error> {
    dotenv().ok();

    let config = Arc::new(BotConfig::load()?);
    logging::init(&config);
    info!(
        "starting cadence (prefix '{}', audio quality {})",
        config.prefix,
        config.audio_quality.label()
    );

    let token = BotConfig::discord_token()?;
    let http = reqwest::Client::new();
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    // One songbird instance shared between the gateway and the connector.
    let songbird = Songbird::serenity();
    let connector = Arc::new(SongbirdConnector::new(
        songbird.clone(),
        http.clone(),
        events_tx.clone(),
    ));
    let players = PlayerManager::new(connector, config.session_defaults(), events_tx.clone());

    let spotify = BotConfig::spotify_credentials()
        .map(|creds| Arc::new(SpotifySearch::new(creds, http.clone())) as Arc<dyn SearchSource>);
    if spotify.is_none() {
        warn!("Spotify credentials missing, the spotify command is disabled");
    }
    let sources = Arc::new(SourceRouter::new(Arc::new(YoutubeSearch::new()), spotify));

    let registry = Arc::new(commands::registry(&config));
    info!("{} commands registered", registry.len());

    events::spawn_event_loop(players.clone(), events_rx);

    let handler = Handler {
        config: config.clone(),
        registry,
        players,
        sources,
        events: events_tx,
    };

    let intents = GatewayIntents::non_privileged()
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_VOICE_STATES;

    let mut client = ClientBuilder::new(token, intents)
        .event_handler(handler)
        .register_songbird_with(songbird)
        .await?;

    tokio::select! {
        result = client.start() => {
            if let Err(e) = result {
                error!("client error: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
        }
    }
    Ok(())
}
