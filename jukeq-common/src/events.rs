//! Push-channel event types and the client-side event bus
//!
//! The server's event channel delivers JSON messages of the form
//! `{"name": <event name>, "data": {...}}`. [`MusicEvent`] models that
//! envelope as an adjacently-tagged enum so decoding and exhaustive
//! matching happen in one place. Decoded events are fanned out to the
//! interested client components through [`EventBus`].

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::model::{PlayerState, QueuedSong};
use crate::time::Hms;

/// Song data carried by `play_song` notices.
///
/// Superset of [`QueuedSong`]: the event stream also flags background-track
/// (filler playlist) songs, which user-queued songs never are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongNotice {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub duration: Hms,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub start: u64,
    #[serde(default)]
    pub b_track: bool,
}

impl From<SongNotice> for QueuedSong {
    fn from(notice: SongNotice) -> Self {
        QueuedSong {
            id: notice.id,
            title: notice.title,
            duration: notice.duration,
            thumbnail: notice.thumbnail,
            start: notice.start,
        }
    }
}

/// Song data carried by `queue_song` notices.
///
/// `pos` is the 1-based queue position the song landed at (-1 on failure).
/// `success` defaults to true: only an explicit `false` marks a failed
/// queue attempt, in which case the other fields are best-effort (`id`
/// holds whatever the user submitted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSongNotice {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub duration: Hms,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub start: u64,
    #[serde(default)]
    pub b_track: bool,
    #[serde(default = "default_pos")]
    pub pos: i64,
    #[serde(default = "default_success")]
    pub success: bool,
}

fn default_pos() -> i64 {
    -1
}

fn default_success() -> bool {
    true
}

impl QueueSongNotice {
    /// True when the server reported an explicit failure to queue.
    pub fn is_failure(&self) -> bool {
        !self.success
    }
}

/// Events delivered over the push channel.
///
/// Wire form: `{"name": "<snake_case variant>", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "data", rename_all = "snake_case")]
pub enum MusicEvent {
    /// Transport state replaced wholesale (play/pause/idle + position).
    ChangePlayerstate(PlayerState),

    /// A song started playing. Implies transport `play` with position
    /// seeded from the song's start offset.
    PlaySong(SongNotice),

    /// A queue push was processed (successfully or not).
    QueueSong(QueueSongNotice),

    /// The overlay's persistent mini-player was toggled.
    OverlayPersistenceChange { value: bool },
}

impl MusicEvent {
    /// Get the wire event name for filtering and logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            MusicEvent::ChangePlayerstate(_) => "change_playerstate",
            MusicEvent::PlaySong(_) => "play_song",
            MusicEvent::QueueSong(_) => "queue_song",
            MusicEvent::OverlayPersistenceChange { .. } => "overlay_persistence_change",
        }
    }
}

/// Client-side event distribution bus.
///
/// The listener task decodes push-channel messages and emits them here;
/// the queue page, the overlay machinery, and tests subscribe
/// independently. Built on `tokio::sync::broadcast`, so a slow subscriber
/// never blocks the listener and dropped receivers clean up on their own.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<MusicEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` undelivered events per
    /// subscriber before old ones are dropped.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events. Events emitted before subscription
    /// are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<MusicEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers.
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: MusicEvent,
    ) -> Result<usize, broadcast::error::SendError<MusicEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening.
    pub fn emit_lossy(&self, event: MusicEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlayState;

    #[test]
    fn test_change_playerstate_wire_form() {
        let json = r#"{"name": "change_playerstate", "data": {"state": "pause", "position": 61500}}"#;
        let event: MusicEvent = serde_json::from_str(json).unwrap();
        match event {
            MusicEvent::ChangePlayerstate(state) => {
                assert_eq!(state.state, Some(PlayState::Pause));
                assert_eq!(state.position, 61500);
            }
            other => panic!("wrong event: {:?}", other),
        }
    }

    #[test]
    fn test_play_song_wire_form() {
        let json = r#"{
            "name": "play_song",
            "data": {
                "id": "abc123",
                "title": "A Song",
                "duration": "00:03:00",
                "thumbnail": "abc123.webp",
                "start": 30,
                "b_track": false
            }
        }"#;
        let event: MusicEvent = serde_json::from_str(json).unwrap();
        match event {
            MusicEvent::PlaySong(notice) => {
                assert_eq!(notice.id, "abc123");
                assert_eq!(notice.duration, Hms::from_secs(180));
                assert_eq!(notice.start, 30);
                assert!(!notice.b_track);
            }
            other => panic!("wrong event: {:?}", other),
        }
    }

    #[test]
    fn test_queue_song_success_defaults_true() {
        // Older success notices omit the flag entirely
        let json = r#"{
            "name": "queue_song",
            "data": {"id": "abc123", "title": "A Song", "duration": "00:03:00", "start": 0, "pos": 2}
        }"#;
        let event: MusicEvent = serde_json::from_str(json).unwrap();
        match event {
            MusicEvent::QueueSong(notice) => {
                assert!(!notice.is_failure());
                assert_eq!(notice.pos, 2);
            }
            other => panic!("wrong event: {:?}", other),
        }
    }

    #[test]
    fn test_queue_song_explicit_failure() {
        // Failure notices carry the raw submitted URL as id and no song data
        let json = r#"{
            "name": "queue_song",
            "data": {"id": "https://youtube.com/watch?v=bad", "title": "",
                     "duration": "00:00:00", "start": 0, "pos": -1, "success": false}
        }"#;
        let event: MusicEvent = serde_json::from_str(json).unwrap();
        match event {
            MusicEvent::QueueSong(notice) => {
                assert!(notice.is_failure());
                assert!(notice.duration.is_zero());
            }
            other => panic!("wrong event: {:?}", other),
        }
    }

    #[test]
    fn test_overlay_persistence_change_wire_form() {
        let json = r#"{"name": "overlay_persistence_change", "data": {"value": true}}"#;
        let event: MusicEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, MusicEvent::OverlayPersistenceChange { value: true });
    }

    #[test]
    fn test_serialization_uses_name_data_envelope() {
        let event = MusicEvent::OverlayPersistenceChange { value: false };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"name\":\"overlay_persistence_change\""));
        assert!(json.contains("\"data\":{\"value\":false}"));
    }

    #[test]
    fn test_event_name() {
        let events = [
            (
                MusicEvent::ChangePlayerstate(PlayerState {
                    state: None,
                    position: 0,
                }),
                "change_playerstate",
            ),
            (
                MusicEvent::OverlayPersistenceChange { value: true },
                "overlay_persistence_change",
            ),
        ];
        for (event, expected) in events {
            assert_eq!(event.event_name(), expected);
        }
    }

    #[test]
    fn test_unknown_event_name_is_rejected() {
        let json = r#"{"name": "definitely_not_an_event", "data": {}}"#;
        assert!(serde_json::from_str::<MusicEvent>(json).is_err());
    }

    #[test]
    fn test_song_notice_into_queued_song() {
        let notice = SongNotice {
            id: "abc".into(),
            title: "A Song".into(),
            duration: Hms::from_secs(90),
            thumbnail: None,
            start: 10,
            b_track: true,
        };
        let song: QueuedSong = notice.into();
        assert_eq!(song.id, "abc");
        assert_eq!(song.start, 10);
    }

    #[test]
    fn test_eventbus_emit_and_subscribe() {
        let bus = EventBus::new(16);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.capacity(), 16);

        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.emit(MusicEvent::OverlayPersistenceChange { value: true })
            .expect("emit should succeed");

        let r1 = rx1.try_recv().expect("rx1 should receive");
        let r2 = rx2.try_recv().expect("rx2 should receive");
        assert_eq!(r1.event_name(), "overlay_persistence_change");
        assert_eq!(r2.event_name(), "overlay_persistence_change");
    }

    #[test]
    fn test_eventbus_emit_lossy_without_subscribers() {
        let bus = EventBus::new(4);
        // No subscribers: emit_lossy must not panic or error
        bus.emit_lossy(MusicEvent::OverlayPersistenceChange { value: false });
        assert!(bus
            .emit(MusicEvent::OverlayPersistenceChange { value: false })
            .is_err());
    }
}
