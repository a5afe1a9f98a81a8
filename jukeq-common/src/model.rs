//! Wire data model shared by the queue server and this client
//!
//! These types are wholesale snapshots: the server replaces them on every
//! authoritative update and the client never mutates individual entries
//! (the only local mutation is the estimated playback position, which is
//! clamped to the current song's duration).

use serde::{Deserialize, Serialize};

use crate::time::Hms;

/// A song gotten from a video that is/was queued.
///
/// Identity is `id` (the video id); `start` is the offset in seconds to
/// begin playback from. `thumbnail` is the server-side filename of the
/// fetched thumbnail, absent in plain queue listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedSong {
    pub id: String,
    pub title: String,
    pub duration: Hms,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub start: u64,
}

impl QueuedSong {
    /// Watch-page URL for the underlying video.
    pub fn url(&self) -> String {
        format!("https://youtube.com/watch?v={}", self.id)
    }
}

/// Transport state of the song player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayState {
    Play,
    Pause,
}

impl std::fmt::Display for PlayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayState::Play => write!(f, "play"),
            PlayState::Pause => write!(f, "pause"),
        }
    }
}

/// The current state of the song player.
///
/// Wire form is `{"state": null}` when no song is loaded (position absent),
/// otherwise `{"state": "play"|"pause", "position": <ms>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub state: Option<PlayState>,
    /// Elapsed milliseconds for the current song.
    #[serde(default)]
    pub position: u64,
}

impl PlayerState {
    /// State for a freshly started song: playing from `start` seconds in.
    pub fn playing_from(start_secs: u64) -> Self {
        Self {
            state: Some(PlayState::Play),
            position: start_secs * 1000,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state == Some(PlayState::Play)
    }

    /// Advance the estimated position by `elapsed_ms`, clamped to
    /// `limit_ms` (the current song's duration).
    pub fn advance(&mut self, elapsed_ms: u64, limit_ms: u64) {
        self.position = self.position.saturating_add(elapsed_ms).min(limit_ms);
    }
}

/// The current state of the queue: now playing, pre-loaded next, and the
/// remaining queued songs in play order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueState {
    pub current: Option<QueuedSong>,
    pub next: Option<QueuedSong>,
    #[serde(default)]
    pub queue: Vec<QueuedSong>,
}

impl QueueState {
    /// The song that will play next, plus the index where the rendered
    /// queue list should start.
    ///
    /// The server only materializes `next` once it has pre-loaded it;
    /// until then the head of `queue` stands in, and the queue listing
    /// starts at its second entry.
    pub fn effective_next(&self) -> (Option<&QueuedSong>, usize) {
        match &self.next {
            Some(song) => (Some(song), 0),
            None => match self.queue.first() {
                Some(song) => (Some(song), 1),
                None => (None, 0),
            },
        }
    }

    /// Id of the currently playing song, if any.
    pub fn current_id(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.id.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.next.is_none() && self.queue.is_empty()
    }
}
