//! Application event loop
//!
//! `App` owns the client state, the progress ticker, the toast queue, and
//! the cached render panels. A single `tokio::select!` loop multiplexes
//! push events, terminal input, completed command results, and the frame
//! interval; all state mutation happens here, on this one task.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use crossterm::event::{Event as TermEvent, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use jukeq_common::events::{EventBus, MusicEvent};
use jukeq_common::model::{PlayState, PlayerState, QueueState};
use ratatui::backend::Backend;
use ratatui::Terminal;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::error::Result;
use crate::state::ClientState;
use crate::ticker::{ProgressTicker, Tick};
use crate::toast::ToastQueue;
use crate::view::{self, QueuePanel};

/// Cadence of the frame interval driving the ticker, the toast queue, and
/// redraws.
const FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// Activity log retention.
const LOG_CAPACITY: usize = 100;

/// Which surface is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// The full queue page: current/next/queue plus controls.
    Queue,
    /// The overlay: mini-player bar and toasts only.
    Overlay,
}

/// Text-entry state for the add-song line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    EditUrl,
}

/// Results of spawned command/fetch tasks, delivered back to the loop.
#[derive(Debug)]
enum AppMessage {
    PlayerFetched(Option<PlayerState>),
    QueueFetched(Option<QueueState>),
    Skipped(Option<i64>),
    Pushed { url: String, pos: Option<i64> },
    PersistenceSet { value: bool, ok: bool },
}

/// Rolling log of client activity shown in the UI (the terminal has no
/// devtools console).
#[derive(Debug)]
pub struct ActivityLog {
    entries: VecDeque<(DateTime<Local>, String)>,
    capacity: usize,
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((Local::now(), line.into()));
    }

    /// Most recent entries, newest last.
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &(DateTime<Local>, String)> {
        let skip = self.entries.len().saturating_sub(count);
        self.entries.iter().skip(skip)
    }
}

/// The UI application.
pub struct App {
    pub api: Arc<ApiClient>,
    pub bus: EventBus,
    pub state: ClientState,
    pub ticker: ProgressTicker,
    pub toasts: ToastQueue,
    pub queue_panel: QueuePanel,
    pub view: View,
    pub input_mode: InputMode,
    pub input: String,
    pub log: ActivityLog,
    msg_tx: mpsc::UnboundedSender<AppMessage>,
    msg_rx: Option<mpsc::UnboundedReceiver<AppMessage>>,
    dirty: bool,
    should_quit: bool,
}

impl App {
    pub fn new(api: ApiClient, bus: EventBus, view: View) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        Self {
            api: Arc::new(api),
            bus,
            state: ClientState::new(),
            ticker: ProgressTicker::new(),
            toasts: ToastQueue::new(),
            queue_panel: QueuePanel::new(),
            view,
            input_mode: InputMode::Normal,
            input: String::new(),
            log: ActivityLog::new(LOG_CAPACITY),
            msg_tx,
            msg_rx: Some(msg_rx),
            dirty: true,
            should_quit: false,
        }
    }

    /// Run the event loop until quit.
    pub async fn run<B: Backend>(mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let mut msg_rx = self
            .msg_rx
            .take()
            .ok_or_else(|| jukeq_common::Error::Internal("app already running".to_string()))?;

        let mut bus_rx = self.bus.subscribe();
        let mut term_events = EventStream::new();
        let mut frame = tokio::time::interval(FRAME_INTERVAL);
        frame.set_missed_tick_behavior(MissedTickBehavior::Skip);

        self.bootstrap();

        while !self.should_quit {
            tokio::select! {
                _ = frame.tick() => self.on_frame(),
                result = bus_rx.recv() => match result {
                    Ok(event) => self.on_push_event(event),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Dropped {} push events; refreshing", n);
                        self.fetch_player_state();
                        self.fetch_queue_state();
                    }
                    Err(broadcast::error::RecvError::Closed) => {}
                },
                Some(result) = term_events.next() => match result {
                    Ok(event) => self.on_terminal_event(event),
                    Err(e) => warn!("Terminal event error: {}", e),
                },
                Some(msg) = msg_rx.recv() => self.on_message(msg),
            }

            if self.dirty {
                terminal.draw(|f| view::draw(f, &self))?;
                self.dirty = false;
            }
        }

        info!("UI loop finished");
        Ok(())
    }

    /// Initial state load, mirroring the page-load fetches.
    fn bootstrap(&mut self) {
        self.log.push("fetching initial state");
        self.fetch_player_state();
        self.fetch_queue_state();
    }

    // ------------------------------------------------------------------
    // Push events (state reconciliation)
    // ------------------------------------------------------------------

    fn on_push_event(&mut self, event: MusicEvent) {
        self.log.push(format!("event: {}", event.event_name()));

        let outcome = self.state.apply_event(&event);

        if outcome.supersede_toast {
            self.toasts.notify_now_playing();
        }
        if let Some(toast) = outcome.toast {
            self.toasts.push(toast);
        }
        if outcome.restart_ticker {
            self.reconcile_ticker(true);
        }
        self.sync_panels();
        if outcome.refresh_player {
            self.fetch_player_state();
        }
        if outcome.refresh_queue {
            self.fetch_queue_state();
        }

        self.dirty = true;
    }

    /// Keep the ticker in step with the reconciled state: running exactly
    /// when a current song is playing, tracking its identity.
    fn reconcile_ticker(&mut self, force_restart: bool) {
        let current = self.state.current_song_id().map(str::to_string);
        match (self.state.is_playing(), current) {
            (true, Some(id)) => {
                if force_restart || self.ticker.tracked_id() != Some(id.as_str()) {
                    self.ticker.start(&id);
                }
            }
            _ => self.ticker.cancel(),
        }
    }

    fn sync_panels(&mut self) {
        if let Some(queue) = &self.state.queue {
            if self.queue_panel.sync(queue) {
                self.dirty = true;
            }
        }
    }

    // ------------------------------------------------------------------
    // Command results
    // ------------------------------------------------------------------

    fn on_message(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::PlayerFetched(Some(player)) => {
                self.state.set_player(player);
                self.reconcile_ticker(true);
                self.dirty = true;
            }
            AppMessage::QueueFetched(Some(queue)) => {
                self.state.set_queue(queue);
                self.reconcile_ticker(false);
                self.sync_panels();
                self.dirty = true;
            }
            // Failed fetches abort the dependent update silently
            AppMessage::PlayerFetched(None) | AppMessage::QueueFetched(None) => {}
            AppMessage::Skipped(Some(count)) if count > 0 => {
                self.ticker.cancel();
                self.state.clear_player();
                self.fetch_queue_state();
                self.log.push(format!("skipped {} song(s)", count));
                self.dirty = true;
            }
            AppMessage::Skipped(_) => {}
            AppMessage::Pushed { url, pos: Some(pos) } => {
                self.log.push(format!("queued {} at #{}", url, pos));
                self.dirty = true;
            }
            AppMessage::Pushed { url, pos: None } => {
                self.log.push(format!("failed to queue {}", url));
                self.dirty = true;
            }
            AppMessage::PersistenceSet { value, ok } => {
                if !ok {
                    self.log.push(format!("overlay persistence={} not accepted", value));
                    self.dirty = true;
                }
                // On success the confirmation arrives as a push event
            }
        }
    }

    // ------------------------------------------------------------------
    // Frame tick
    // ------------------------------------------------------------------

    fn on_frame(&mut self) {
        match self.ticker.tick(&mut self.state) {
            Tick::Advanced | Tick::Cancelled => self.dirty = true,
            Tick::Idle => {}
        }

        let start_top =
            self.state.overlay_persistent && self.state.player.and_then(|p| p.state).is_some();
        if self.toasts.tick(Instant::now(), start_top) {
            self.dirty = true;
        }
    }

    // ------------------------------------------------------------------
    // Terminal input (command dispatch)
    // ------------------------------------------------------------------

    fn on_terminal_event(&mut self, event: TermEvent) {
        match event {
            TermEvent::Key(key) if key.kind == KeyEventKind::Press => self.on_key(key),
            TermEvent::Resize(_, _) => self.dirty = true,
            _ => {}
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.input_mode {
            InputMode::EditUrl => self.on_edit_key(key),
            InputMode::Normal => self.on_normal_key(key),
        }
    }

    fn on_edit_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.submit_url(),
            KeyCode::Esc => {
                self.input.clear();
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
        self.dirty = true;
    }

    fn on_normal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char(' ') => self.toggle_play(),
            KeyCode::Char('n') => self.skip_song(),
            KeyCode::Char('a') => {
                self.input_mode = InputMode::EditUrl;
                self.dirty = true;
            }
            KeyCode::Char('p') => self.toggle_persistence(),
            KeyCode::Char('o') => self.open_queue(),
            KeyCode::Tab => {
                self.view = match self.view {
                    View::Queue => View::Overlay,
                    View::Overlay => View::Queue,
                };
                self.dirty = true;
            }
            KeyCode::Left => self.seek_relative(-5),
            KeyCode::Right => self.seek_relative(5),
            _ => {}
        }
    }

    /// Toggle play/pause; disabled while the transport state is unknown.
    fn toggle_play(&mut self) {
        let Some(player) = self.state.player else {
            return;
        };
        if player.state.is_none() {
            return;
        }
        let target = if player.state == Some(PlayState::Pause) {
            PlayState::Play
        } else {
            PlayState::Pause
        };

        let api = self.api.clone();
        let tx = self.msg_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(AppMessage::PlayerFetched(api.set_play_state(target).await));
        });
    }

    fn skip_song(&mut self) {
        let api = self.api.clone();
        let tx = self.msg_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(AppMessage::Skipped(api.skip(1).await));
        });
    }

    /// Seek relative to the estimated position, clamped to the song.
    fn seek_relative(&mut self, delta_secs: i64) {
        let Some(duration_ms) = self.state.current_duration_ms() else {
            return;
        };
        if self.state.player.and_then(|p| p.state).is_none() {
            return;
        }

        let pos = (self.state.position_ms() / 1000) as i64;
        let max = (duration_ms / 1000) as i64;
        let target = (pos + delta_secs).clamp(0, max) as u64;

        // Optimistic local update so the gauge follows the key press
        if let Some(player) = &mut self.state.player {
            player.position = target * 1000;
        }
        self.dirty = true;

        let api = self.api.clone();
        tokio::spawn(async move { api.seek(target).await });
    }

    fn submit_url(&mut self) {
        let url = self.input.trim().to_string();
        self.input.clear();
        self.input_mode = InputMode::Normal;
        if url.is_empty() {
            return;
        }

        let api = self.api.clone();
        let tx = self.msg_tx.clone();
        tokio::spawn(async move {
            let pos = api.push_queue(&url).await;
            let _ = tx.send(AppMessage::Pushed { url, pos });
        });
    }

    fn toggle_persistence(&mut self) {
        let value = !self.state.overlay_persistent;
        let api = self.api.clone();
        let tx = self.msg_tx.clone();
        tokio::spawn(async move {
            let ok = api.set_overlay_persistence(value).await;
            let _ = tx.send(AppMessage::PersistenceSet { value, ok });
        });
    }

    fn open_queue(&mut self) {
        self.log.push("asked server to open the queue file");
        self.dirty = true;
        let api = self.api.clone();
        tokio::spawn(async move { api.open_queue().await });
    }

    // ------------------------------------------------------------------
    // Fetches
    // ------------------------------------------------------------------

    fn fetch_player_state(&self) {
        let api = self.api.clone();
        let tx = self.msg_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(AppMessage::PlayerFetched(api.player_state().await));
        });
    }

    fn fetch_queue_state(&self) {
        let api = self.api.clone();
        let tx = self.msg_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(AppMessage::QueueFetched(api.queue_state().await));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_log_caps_entries() {
        let mut log = ActivityLog::new(3);
        for i in 0..5 {
            log.push(format!("line {}", i));
        }
        let lines: Vec<&str> = log.recent(10).map(|(_, l)| l.as_str()).collect();
        assert_eq!(lines, vec!["line 2", "line 3", "line 4"]);
    }

    #[test]
    fn test_activity_log_recent_window() {
        let mut log = ActivityLog::new(10);
        for i in 0..6 {
            log.push(format!("line {}", i));
        }
        let lines: Vec<&str> = log.recent(2).map(|(_, l)| l.as_str()).collect();
        assert_eq!(lines, vec!["line 4", "line 5"]);
    }
}
