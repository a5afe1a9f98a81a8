//! Local playback-progress estimation
//!
//! Between authoritative position updates the UI advances the displayed
//! position itself, from wall-clock time. [`ProgressTicker`] is that
//! estimator: an explicit, cancellable value owned by the app event loop
//! (which drives it from its frame interval), replacing the ad-hoc
//! interval callbacks of a browser client.
//!
//! Exactly one run is active at a time: starting a new run replaces the
//! previous one, and a run cancels itself as soon as the tracked song is
//! no longer current or the transport leaves `play`.

use tokio::time::Instant;
use tracing::debug;

use crate::state::ClientState;

/// Outcome of a single ticker tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Not running; nothing happened.
    Idle,
    /// Position advanced.
    Advanced,
    /// The run detected a stale identity or a non-playing transport and
    /// cancelled itself.
    Cancelled,
}

#[derive(Debug)]
struct TickerRun {
    song_id: String,
    last_tick: Instant,
}

/// Singleton progress estimator for the currently playing song.
#[derive(Debug, Default)]
pub struct ProgressTicker {
    run: Option<TickerRun>,
}

impl ProgressTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin (or restart) tracking `song_id`. Any previous run is
    /// replaced, so at most one run ever exists.
    pub fn start(&mut self, song_id: &str) {
        if self.run.is_some() {
            debug!("Progress ticker restarted for {}", song_id);
        } else {
            debug!("Progress ticker started for {}", song_id);
        }
        self.run = Some(TickerRun {
            song_id: song_id.to_string(),
            last_tick: Instant::now(),
        });
    }

    /// Stop tracking entirely.
    pub fn cancel(&mut self) {
        if self.run.take().is_some() {
            debug!("Progress ticker cancelled");
        }
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Identity the ticker is currently tracking.
    pub fn tracked_id(&self) -> Option<&str> {
        self.run.as_ref().map(|r| r.song_id.as_str())
    }

    /// Advance the estimated position by the wall-clock time elapsed since
    /// the previous tick, clamped to the current song's duration.
    pub fn tick(&mut self, state: &mut ClientState) -> Tick {
        let stale = match &self.run {
            None => return Tick::Idle,
            Some(run) => {
                state.current_song_id() != Some(run.song_id.as_str()) || !state.is_playing()
            }
        };

        if stale {
            self.run = None;
            debug!("Progress ticker self-cancelled");
            return Tick::Cancelled;
        }

        let now = Instant::now();
        if let Some(run) = &mut self.run {
            let elapsed_ms = now.duration_since(run.last_tick).as_millis() as u64;
            run.last_tick = now;
            state.advance_position(elapsed_ms);
        }
        Tick::Advanced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jukeq_common::events::SongNotice;
    use jukeq_common::model::{PlayState, PlayerState};
    use jukeq_common::time::Hms;
    use std::time::Duration;

    fn playing_state(id: &str, start: u64, duration_secs: u64) -> ClientState {
        let mut state = ClientState::new();
        state.apply_play_song(&SongNotice {
            id: id.to_string(),
            title: String::new(),
            duration: Hms::from_secs(duration_secs),
            thumbnail: None,
            start,
            b_track: false,
        });
        state
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_advances_by_elapsed_wall_clock() {
        let mut state = playing_state("abc", 0, 180);
        let mut ticker = ProgressTicker::new();
        ticker.start("abc");

        tokio::time::advance(Duration::from_millis(250)).await;
        assert_eq!(ticker.tick(&mut state), Tick::Advanced);
        assert_eq!(state.position_ms(), 250);

        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(ticker.tick(&mut state), Tick::Advanced);
        assert_eq!(state.position_ms(), 350);
    }

    #[tokio::test(start_paused = true)]
    async fn test_position_never_exceeds_duration() {
        let mut state = playing_state("abc", 0, 2);
        let mut ticker = ProgressTicker::new();
        ticker.start("abc");

        for _ in 0..50 {
            tokio::time::advance(Duration::from_millis(100)).await;
            ticker.tick(&mut state);
        }
        assert_eq!(state.position_ms(), 2_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_self_cancels_when_song_changes() {
        let mut state = playing_state("abc", 0, 180);
        let mut ticker = ProgressTicker::new();
        ticker.start("abc");

        // Another song becomes current while this run tracks "abc"
        state.apply_play_song(&SongNotice {
            id: "xyz".to_string(),
            title: String::new(),
            duration: Hms::from_secs(60),
            thumbnail: None,
            start: 0,
            b_track: false,
        });

        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(ticker.tick(&mut state), Tick::Cancelled);
        assert!(!ticker.is_running());
        // The stale run must not have advanced the new song's position
        assert_eq!(state.position_ms(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_self_cancels_when_not_playing() {
        let mut state = playing_state("abc", 0, 180);
        let mut ticker = ProgressTicker::new();
        ticker.start("abc");

        state.set_player(PlayerState {
            state: Some(PlayState::Pause),
            position: 1_000,
        });

        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(ticker.tick(&mut state), Tick::Cancelled);
        assert!(!ticker.is_running());
        assert_eq!(state.position_ms(), 1_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_replaces_previous_run() {
        let mut state = playing_state("abc", 0, 180);
        let mut ticker = ProgressTicker::new();

        ticker.start("abc");
        tokio::time::advance(Duration::from_millis(500)).await;

        // Restart for a new song; the half second above must not leak
        // into the new run's first tick.
        state.apply_play_song(&SongNotice {
            id: "xyz".to_string(),
            title: String::new(),
            duration: Hms::from_secs(60),
            thumbnail: None,
            start: 0,
            b_track: false,
        });
        ticker.start("xyz");
        assert_eq!(ticker.tracked_id(), Some("xyz"));

        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(ticker.tick(&mut state), Tick::Advanced);
        assert_eq!(state.position_ms(), 100);
    }

    #[test]
    fn test_tick_is_idle_without_a_run() {
        let mut state = ClientState::new();
        let mut ticker = ProgressTicker::new();
        assert_eq!(ticker.tick(&mut state), Tick::Idle);
        assert!(ticker.tracked_id().is_none());
    }
}
