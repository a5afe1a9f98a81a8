//! Client-side state store
//!
//! [`ClientState`] holds the last-known player and queue snapshots and
//! applies the reconciliation rules: authoritative updates replace state
//! wholesale, `play_song` seeds a fresh playing state from the song's
//! start offset, and the locally estimated position is always clamped to
//! the current song's duration.
//!
//! All mutation happens on the UI task; this is plain data, not a lock.

use jukeq_common::events::{MusicEvent, SongNotice};
use jukeq_common::model::{PlayerState, QueueState, QueuedSong};

use crate::toast::Toast;

/// Follow-up work the event loop owes after an event is folded into the
/// store: fetches to spawn, ticker restart, toast activity.
#[derive(Debug, Default, PartialEq)]
pub struct EventOutcome {
    pub refresh_player: bool,
    pub refresh_queue: bool,
    /// Restart the progress ticker against the (possibly new) current song.
    pub restart_ticker: bool,
    /// The active toast is superseded by a now-playing transition.
    pub supersede_toast: bool,
    pub toast: Option<Toast>,
}

/// Last-known server state as seen by this client.
#[derive(Debug, Clone, Default)]
pub struct ClientState {
    /// Transport state; `None` until the first successful fetch or event.
    pub player: Option<PlayerState>,
    /// Queue snapshot; `None` until the first successful fetch.
    pub queue: Option<QueueState>,
    /// Whether the overlay mini-player is pinned.
    pub overlay_persistent: bool,
}

impl ClientState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The song currently playing, if known.
    pub fn current_song(&self) -> Option<&QueuedSong> {
        self.queue.as_ref()?.current.as_ref()
    }

    /// Identity of the current song.
    pub fn current_song_id(&self) -> Option<&str> {
        self.queue.as_ref()?.current_id()
    }

    /// Duration of the current song in milliseconds.
    pub fn current_duration_ms(&self) -> Option<u64> {
        self.current_song().map(|s| s.duration.as_millis())
    }

    pub fn is_playing(&self) -> bool {
        self.player.map(|p| p.is_playing()).unwrap_or(false)
    }

    /// Replace the player state wholesale (authoritative update).
    pub fn set_player(&mut self, player: PlayerState) {
        self.player = Some(player);
        self.clamp_position();
    }

    /// Forget the player state (e.g. after a successful skip, until the
    /// next authoritative update arrives).
    pub fn clear_player(&mut self) {
        self.player = None;
    }

    /// Replace the queue snapshot wholesale (authoritative update).
    pub fn set_queue(&mut self, queue: QueueState) {
        self.queue = Some(queue);
        self.clamp_position();
    }

    /// Apply a `play_song` notice: transport becomes `play` with position
    /// seeded from the song's start offset, and the song becomes current
    /// ahead of the follow-up queue refresh.
    pub fn apply_play_song(&mut self, notice: &SongNotice) {
        self.player = Some(PlayerState::playing_from(notice.start));

        let song: QueuedSong = notice.clone().into();
        match &mut self.queue {
            Some(queue) => queue.current = Some(song),
            None => {
                self.queue = Some(QueueState {
                    current: Some(song),
                    ..QueueState::default()
                });
            }
        }
        self.clamp_position();
    }

    /// Fold one push event into the store.
    ///
    /// The store is replaced (not merged) where the event carries state;
    /// a `queue_song` failure only produces a toast and never touches the
    /// queue snapshot.
    pub fn apply_event(&mut self, event: &MusicEvent) -> EventOutcome {
        let mut outcome = EventOutcome::default();

        match event {
            MusicEvent::ChangePlayerstate(player) => {
                self.set_player(*player);
                outcome.restart_ticker = true;
            }
            MusicEvent::PlaySong(notice) => {
                outcome.supersede_toast = true;
                if !self.overlay_persistent {
                    outcome.toast = Some(Toast::playing(notice));
                }
                self.apply_play_song(notice);
                outcome.restart_ticker = true;
                outcome.refresh_queue = true;
            }
            MusicEvent::QueueSong(notice) => {
                if notice.is_failure() {
                    outcome.toast = Some(Toast::failed(notice));
                } else {
                    outcome.toast = Some(Toast::queued(notice));
                    outcome.refresh_queue = true;
                }
            }
            MusicEvent::OverlayPersistenceChange { value } => {
                self.overlay_persistent = *value;
                if *value {
                    outcome.refresh_player = true;
                    outcome.refresh_queue = true;
                }
            }
        }

        outcome
    }

    /// Advance the estimated position by elapsed wall-clock time, clamped
    /// to the current song's duration. No-op when idle.
    pub fn advance_position(&mut self, elapsed_ms: u64) {
        let Some(limit) = self.current_duration_ms() else {
            return;
        };
        if let Some(player) = &mut self.player {
            player.advance(elapsed_ms, limit);
        }
    }

    /// Current position in milliseconds (0 when idle).
    pub fn position_ms(&self) -> u64 {
        self.player.map(|p| p.position).unwrap_or(0)
    }

    fn clamp_position(&mut self) {
        let Some(limit) = self.current_duration_ms() else {
            return;
        };
        if let Some(player) = &mut self.player {
            player.position = player.position.min(limit);
        }
    }
}
