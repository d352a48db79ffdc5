//! Status reporter: renders queue and track state into user-facing
//! embeds. Absent fields fall back to fixed defaults instead of failing.

use std::time::Duration;

use serenity::all::{CreateEmbed, CreateEmbedFooter};

use crate::player::{QueueSnapshot, SourceKind, Track};
use crate::sources::PlaylistInfo;

const DEFAULT_THUMBNAIL: &str = "https://i.imgur.com/2KU57w2.png";
const DEFAULT_LINK: &str = "#";
/// Queue listings show at most this many pending entries.
const QUEUE_DISPLAY_LIMIT: usize = 10;

const COLOR_OK: u32 = 0x00ff00;
const COLOR_SPOTIFY: u32 = 0x1db954;
const COLOR_YOUTUBE: u32 = 0xff0000;

fn source_color(kind: SourceKind) -> u32 {
    match kind {
        SourceKind::Spotify => COLOR_SPOTIFY,
        SourceKind::Youtube => COLOR_YOUTUBE,
    }
}

/// Format a duration as `m:ss`, or `h:mm:ss` past the hour.
pub fn format_duration(duration: Duration) -> String {
    let seconds = duration.as_secs();
    let minutes = seconds / 60;
    let seconds = seconds % 60;

    if minutes >= 60 {
        let hours = minutes / 60;
        let minutes = minutes % 60;
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

fn duration_label(duration: Option<Duration>) -> String {
    duration.map(format_duration).unwrap_or_else(|| "0:00".to_string())
}

fn track_link(track: &Track) -> String {
    format!(
        "[{}]({})",
        track.title,
        track.url.as_deref().unwrap_or(DEFAULT_LINK)
    )
}

/// Announcement embed sent when a track starts playing.
pub fn now_playing(track: &Track, snapshot: &QueueSnapshot) -> CreateEmbed {
    CreateEmbed::new()
        .title(format!("🎵 Now Playing ({})", track.source.label()))
        .description(format!("**{}**", track_link(track)))
        .thumbnail(track.thumbnail.as_deref().unwrap_or(DEFAULT_THUMBNAIL))
        .color(source_color(track.source))
        .field(
            "Artist",
            track.author.clone().unwrap_or_else(|| "Unknown".to_string()),
            true,
        )
        .field("Duration", format!("`{}`", duration_label(track.duration)), true)
        .field(
            "Requested By",
            format!("<@{}>", track.requested_by.id),
            true,
        )
        .field(
            "Queue",
            format!("{} track(s) waiting", snapshot.pending.len()),
            true,
        )
        .footer(CreateEmbedFooter::new(format!(
            "Volume: {}% | Repeat: {}",
            snapshot.volume,
            snapshot.repeat.label()
        )))
}

/// Confirmation for a single queued track. `position` counts the tracks
/// ahead of it; zero means it starts right away.
pub fn track_queued(track: &Track, position: usize) -> CreateEmbed {
    let mut embed = if position == 0 {
        CreateEmbed::new().title("🎵 Now Playing")
    } else {
        CreateEmbed::new()
            .title("🎵 Added to Queue")
            .field("Position", format!("`#{}`", position), true)
    };

    embed = embed
        .description(format!("**{}**", track_link(track)))
        .field("Duration", format!("`{}`", duration_label(track.duration)), true)
        .color(COLOR_OK);

    if let Some(thumbnail) = &track.thumbnail {
        embed = embed.thumbnail(thumbnail);
    }
    embed
}

/// Confirmation for a queued playlist or album.
pub fn playlist_queued(
    info: &PlaylistInfo,
    kind: SourceKind,
    count: usize,
    total: Duration,
) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title("✅ Playlist Queued")
        .description(format!(
            "**{} tracks** from **{}** ({})",
            count,
            info.title,
            kind.label()
        ))
        .field("Total Length", format!("`{}`", format_duration(total)), true)
        .color(source_color(kind));

    if let Some(author) = &info.author {
        embed = embed.field("By", author.clone(), true);
    }
    embed
}

/// Body of the queue overview, separated out for testing.
fn queue_lines(snapshot: &QueueSnapshot) -> String {
    let mut out = String::new();

    match &snapshot.current {
        Some(track) => {
            out.push_str(&format!("**Now playing:** {}\n\n", track_link(track)));
        }
        None => out.push_str("**Nothing playing**\n\n"),
    }

    if snapshot.pending.is_empty() {
        out.push_str("The queue is empty.");
        return out;
    }

    for (index, track) in snapshot.pending.iter().take(QUEUE_DISPLAY_LIMIT).enumerate() {
        out.push_str(&format!(
            "{}. **{}** `{}` - <@{}>\n",
            index + 1,
            track_link(track),
            duration_label(track.duration),
            track.requested_by.id
        ));
    }
    if snapshot.pending.len() > QUEUE_DISPLAY_LIMIT {
        out.push_str(&format!(
            "...and {} more\n",
            snapshot.pending.len() - QUEUE_DISPLAY_LIMIT
        ));
    }
    out
}

/// Queue overview for the `queue` command.
pub fn queue_overview(snapshot: &QueueSnapshot) -> CreateEmbed {
    CreateEmbed::new()
        .title("📜 Queue")
        .description(queue_lines(snapshot))
        .color(COLOR_OK)
        .footer(CreateEmbedFooter::new(format!(
            "{} track(s) in queue | Volume: {}% | Repeat: {}",
            snapshot.pending.len(),
            snapshot.volume,
            snapshot.repeat.label()
        )))
}

/// Static command listing for the `help` command.
pub fn help(prefix: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title("🎵 Music Bot Commands")
        .description("Here is everything I can do:")
        .color(COLOR_OK)
        .field(
            format!("{}play <song or playlist>", prefix),
            "Play a song or playlist (YouTube or Spotify)",
            false,
        )
        .field(
            format!("{}spotify <song or playlist>", prefix),
            "Play from Spotify specifically",
            false,
        )
        .field(format!("{}pause", prefix), "Pause playback", true)
        .field(format!("{}resume", prefix), "Resume playback", true)
        .field(format!("{}skip", prefix), "Skip to the next track", true)
        .field(
            format!("{}stop", prefix),
            "Stop and clear the queue",
            true,
        )
        .field(
            format!("{}volume [1-100]", prefix),
            "Show or set the volume",
            true,
        )
        .field(
            format!("{}loop [off|track|queue]", prefix),
            "Cycle or set the repeat mode",
            true,
        )
        .field(format!("{}queue", prefix), "Show the queue", true)
        .field(format!("{}test", prefix), "Run a self-diagnostic", true)
        .field(format!("{}help", prefix), "Show this message", true)
}
