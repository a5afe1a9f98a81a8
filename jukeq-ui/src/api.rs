//! REST client for the music-queue server
//!
//! Thin command dispatcher over the server's `/api/music` endpoints. Every
//! public call resolves transport or decode failures to `None` so callers
//! can skip the dependent update: the server is an external collaborator
//! and may simply be gone. No retries are attempted.

use std::time::Duration;

use jukeq_common::model::{PlayState, PlayerState, QueueState};
use tracing::debug;

use crate::error::{Result, UiError};

/// Request timeout for all REST calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the queue server's REST surface.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    /// Create a client for the given base URL (scheme + host + port,
    /// no trailing slash).
    pub fn new(base: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    /// Configured server base URL.
    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// WebSocket URL of the push event channel, derived from the base URL.
    pub fn events_url(&self) -> String {
        let ws_base = if let Some(rest) = self.base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            format!("ws://{}", self.base)
        };
        format!("{}/api/music/events", ws_base)
    }

    /// URL a song thumbnail is served from.
    pub fn thumbnail_url(&self, name: &str) -> String {
        self.url(&format!("/music/thumbnail/{}", name))
    }

    /// GET the current player transport state.
    pub async fn player_state(&self) -> Option<PlayerState> {
        self.quiet("GET playerstate", self.try_player_state().await)
    }

    async fn try_player_state(&self) -> Result<PlayerState> {
        let response = self
            .http
            .get(self.url("/api/music/playerstate"))
            .send()
            .await?;
        Ok(response.error_for_status()?.json().await?)
    }

    /// POST a play/pause request; returns the resulting player state.
    pub async fn set_play_state(&self, state: PlayState) -> Option<PlayerState> {
        self.quiet("POST playerstate", self.try_set_play_state(state).await)
    }

    async fn try_set_play_state(&self, state: PlayState) -> Result<PlayerState> {
        let response = self
            .http
            .post(self.url("/api/music/playerstate"))
            .form(&[("state", state.to_string())])
            .send()
            .await?;
        Ok(response.error_for_status()?.json().await?)
    }

    /// Seek the current song to an absolute offset. Fire-and-forget.
    pub async fn seek(&self, seconds: u64) {
        let result: Result<()> = async {
            self.http
                .post(self.url("/api/music/seek"))
                .form(&[("seconds", seconds.to_string())])
                .send()
                .await?
                .error_for_status()?;
            Ok(())
        }
        .await;
        self.quiet("POST seek", result);
    }

    /// GET the full queue snapshot.
    pub async fn queue_state(&self) -> Option<QueueState> {
        self.quiet("GET queue", self.try_queue_state().await)
    }

    async fn try_queue_state(&self) -> Result<QueueState> {
        let response = self.http.get(self.url("/api/music/queue")).send().await?;
        Ok(response.error_for_status()?.json().await?)
    }

    /// POST a video URL onto the queue; returns the 1-based queue position
    /// the server assigned.
    pub async fn push_queue(&self, video_url: &str) -> Option<i64> {
        self.quiet("POST queue/push", self.try_push_queue(video_url).await)
    }

    async fn try_push_queue(&self, video_url: &str) -> Result<i64> {
        let response = self
            .http
            .post(self.url("/api/music/queue/push"))
            .form(&[("url", video_url)])
            .send()
            .await?;
        let body = response.error_for_status()?.text().await?;
        parse_count(&body)
    }

    /// POST a skip request; returns how many songs were actually skipped.
    pub async fn skip(&self, count: u64) -> Option<i64> {
        self.quiet("POST queue/skip", self.try_skip(count).await)
    }

    async fn try_skip(&self, count: u64) -> Result<i64> {
        let response = self
            .http
            .post(self.url("/api/music/queue/skip"))
            .form(&[("count", count.to_string())])
            .send()
            .await?;
        let body = response.error_for_status()?.text().await?;
        parse_count(&body)
    }

    /// POST the overlay persistence flag. Returns true on success.
    pub async fn set_overlay_persistence(&self, value: bool) -> bool {
        let result: Result<()> = async {
            self.http
                .post(self.url("/api/music/overlay/persistent"))
                .form(&[("value", value.to_string())])
                .send()
                .await?
                .error_for_status()?;
            Ok(())
        }
        .await;
        self.quiet("POST overlay/persistent", result).is_some()
    }

    /// Ask the server to open the queue file on its host. Fire-and-forget.
    pub async fn open_queue(&self) {
        let result: Result<()> = async {
            self.http
                .get(self.url("/api/music/open-queue"))
                .send()
                .await?
                .error_for_status()?;
            Ok(())
        }
        .await;
        self.quiet("GET open-queue", result);
    }

    /// Collapse a failed call to `None`, logging the cause at debug level.
    fn quiet<T>(&self, what: &str, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("{} failed: {}", what, e);
                None
            }
        }
    }
}

/// The skip and push endpoints answer with a bare decimal count.
fn parse_count(body: &str) -> Result<i64> {
    body.trim()
        .parse::<i64>()
        .map_err(|_| UiError::UnexpectedResponse(format!("expected a count, got {:?}", body)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_url_from_http_base() {
        let client = ApiClient::new("http://127.0.0.1:8080").unwrap();
        assert_eq!(client.events_url(), "ws://127.0.0.1:8080/api/music/events");
    }

    #[test]
    fn test_events_url_from_https_base() {
        let client = ApiClient::new("https://music.example.org").unwrap();
        assert_eq!(
            client.events_url(),
            "wss://music.example.org/api/music/events"
        );
    }

    #[test]
    fn test_base_trailing_slash_trimmed() {
        let client = ApiClient::new("http://host:8080/").unwrap();
        assert_eq!(client.url("/api/music/queue"), "http://host:8080/api/music/queue");
    }

    #[test]
    fn test_thumbnail_url() {
        let client = ApiClient::new("http://host:8080").unwrap();
        assert_eq!(
            client.thumbnail_url("abc123.webp"),
            "http://host:8080/music/thumbnail/abc123.webp"
        );
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("3").unwrap(), 3);
        assert_eq!(parse_count(" 0\n").unwrap(), 0);
        assert_eq!(parse_count("-1").unwrap(), -1);
        assert!(parse_count("not a number").is_err());
        assert!(parse_count("").is_err());
    }
}
