//! Sample tracks and search outcomes shared across tests.

use std::time::Duration;

use serenity::model::id::UserId;

use cadence::player::{Requester, SourceKind, Track};
use cadence::sources::{PlaylistInfo, SearchOutcome};

pub fn requester() -> Requester {
    Requester {
        id: UserId::new(4242),
        name: "tester".to_string(),
    }
}

pub fn track(title: &str) -> Track {
    Track {
        title: title.to_string(),
        url: Some(format!("https://www.youtube.com/watch?v={}", title)),
        search_hint: None,
        duration: Some(Duration::from_secs(212)),
        thumbnail: None,
        author: Some("Test Channel".to_string()),
        source: SourceKind::Youtube,
        requested_by: requester(),
    }
}

pub fn single(title: &str) -> SearchOutcome {
    SearchOutcome {
        tracks: vec![track(title)],
        playlist: None,
    }
}

pub fn playlist(title: &str, count: usize) -> SearchOutcome {
    SearchOutcome {
        tracks: (0..count).map(|i| track(&format!("{}-{}", title, i))).collect(),
        playlist: Some(PlaylistInfo {
            title: title.to_string(),
            author: Some("Playlist Author".to_string()),
        }),
    }
}
