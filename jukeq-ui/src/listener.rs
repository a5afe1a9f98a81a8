//! Push-channel listener
//!
//! Maintains the WebSocket connection to `/api/music/events`, decodes the
//! `{name, data}` messages into [`MusicEvent`]s, and fans them out on the
//! [`EventBus`]. The connection is not re-established after close or
//! error; the task ends and the UI keeps running on polled state alone.

use futures::StreamExt;
use jukeq_common::events::{EventBus, MusicEvent};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Connect to the event channel and pump events onto the bus until the
/// server closes the connection or the stream errors out.
pub async fn run(events_url: String, bus: EventBus) -> Result<()> {
    let (mut ws_stream, _) = tokio_tungstenite::connect_async(events_url.as_str()).await?;
    info!("Listening for events at {}", events_url);

    while let Some(message) = ws_stream.next().await {
        match message {
            Ok(Message::Text(text)) => dispatch(&text, &bus),
            Ok(Message::Close(frame)) => {
                info!("Event channel closed by server: {:?}", frame);
                break;
            }
            // Ping/pong is answered by the protocol layer; binary frames
            // are not part of this protocol.
            Ok(_) => {}
            Err(e) => {
                warn!("Event channel error: {}", e);
                break;
            }
        }
    }

    Ok(())
}

/// Decode one text frame and emit it. Unknown or malformed events are
/// dropped with a warning so a newer server cannot wedge the client.
fn dispatch(text: &str, bus: &EventBus) {
    match serde_json::from_str::<MusicEvent>(text) {
        Ok(event) => {
            debug!("Push event: {}", event.event_name());
            bus.emit_lossy(event);
        }
        Err(e) => warn!("Ignoring unparseable event: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jukeq_common::model::PlayState;

    #[test]
    fn test_dispatch_emits_parsed_event() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        dispatch(
            r#"{"name": "change_playerstate", "data": {"state": "play", "position": 500}}"#,
            &bus,
        );

        match rx.try_recv().expect("event should be emitted") {
            MusicEvent::ChangePlayerstate(state) => {
                assert_eq!(state.state, Some(PlayState::Play));
                assert_eq!(state.position, 500);
            }
            other => panic!("wrong event: {:?}", other),
        }
    }

    #[test]
    fn test_dispatch_drops_malformed_frames() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        dispatch("not json at all", &bus);
        dispatch(r#"{"name": "unknown_event", "data": {}}"#, &bus);

        assert!(rx.try_recv().is_err());
    }
}
