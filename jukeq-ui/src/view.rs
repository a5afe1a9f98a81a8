//! Terminal rendering
//!
//! Projects [`ClientState`](crate::state::ClientState) into ratatui
//! widgets. Sections whose content derives from a song identity (the
//! next-song preview and the queue list) are cached in [`QueuePanel`] and
//! rebuilt only when the backing ids change; everything else is cheap
//! enough to lay out per frame.

use jukeq_common::model::{PlayState, QueueState, QueuedSong};
use jukeq_common::time::format_position_ms;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph};
use ratatui::Frame;

use crate::app::{App, InputMode, View};
use crate::toast::{Toast, ToastSlot};

/// Cached rows for the identity-keyed sections (next-song preview and
/// queue list). Rebuilt only when the underlying song ids change, so an
/// unrelated state update does not churn the whole listing.
#[derive(Debug, Default)]
pub struct QueuePanel {
    next_id: Option<String>,
    next_row: Option<String>,
    queue_ids: Vec<String>,
    queue_rows: Vec<String>,
}

impl QueuePanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-sync against a fresh queue snapshot. Returns true when any
    /// cached section was rebuilt.
    pub fn sync(&mut self, queue: &QueueState) -> bool {
        let mut changed = false;

        let (next, queue_start) = queue.effective_next();
        let next_id = next.map(|s| s.id.clone());
        if next_id != self.next_id {
            self.next_row = next.map(|s| format_song_row(1, s));
            self.next_id = next_id;
            changed = true;
        }

        let queue_ids: Vec<String> = queue
            .queue
            .iter()
            .skip(queue_start)
            .map(|s| s.id.clone())
            .collect();
        if queue_ids != self.queue_ids {
            self.queue_rows = queue
                .queue
                .iter()
                .skip(queue_start)
                .enumerate()
                .map(|(i, s)| format_song_row(i + 2, s))
                .collect();
            self.queue_ids = queue_ids;
            changed = true;
        }

        changed
    }

    pub fn next_row(&self) -> Option<&str> {
        self.next_row.as_deref()
    }

    pub fn queue_rows(&self) -> &[String] {
        &self.queue_rows
    }
}

/// One numbered listing row: position marker, title, start/duration.
pub fn format_song_row(num: usize, song: &QueuedSong) -> String {
    format!(
        "{}. {}  [{} / {}]",
        num,
        song.title,
        format_position_ms(song.start * 1000),
        song.duration
    )
}

/// Render the whole frame for the active view.
pub fn draw(f: &mut Frame, app: &App) {
    let area = f.size();
    match app.view {
        View::Queue => draw_queue_page(f, area, app),
        View::Overlay => draw_overlay(f, area, app),
    }
    draw_toast(f, area, app);
}

fn draw_queue_page(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Length(5), // current song card
            Constraint::Length(3), // next song
            Constraint::Min(3),    // queue
            Constraint::Length(3), // add-song input
            Constraint::Length(6), // activity log
            Constraint::Length(1), // key hints
        ])
        .split(area);

    draw_header(f, chunks[0], app);
    draw_current(f, chunks[1], app);
    draw_next(f, chunks[2], app);
    draw_queue_list(f, chunks[3], app);
    draw_input(f, chunks[4], app);
    draw_log(f, chunks[5], app);
    draw_hints(f, chunks[6]);
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let header = Line::from(vec![
        Span::styled(" jukeq ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(app.api.base(), Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(Paragraph::new(header), area);
}

fn draw_current(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default().borders(Borders::ALL).title("Now Playing");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let (song, player) = (app.state.current_song(), app.state.player);
    let (Some(song), Some(player)) = (song, player) else {
        // Same placeholder logic as the web page: distinguish "queue is
        // moving" from "nothing queued at all"
        let upcoming = app
            .state
            .queue
            .as_ref()
            .map(|q| q.next.is_some() || !q.queue.is_empty())
            .unwrap_or(false);
        let text = if upcoming {
            "Preparing Next Song"
        } else {
            "No Song is Currently Playing"
        };
        f.render_widget(
            Paragraph::new(text)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            inner,
        );
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let transport = match player.state {
        Some(PlayState::Play) => Span::styled("▶ ", Style::default().fg(Color::Green)),
        Some(PlayState::Pause) => Span::styled("⏸ ", Style::default().fg(Color::Yellow)),
        None => Span::raw("  "),
    };
    let title = Line::from(vec![
        transport,
        Span::styled(
            song.title.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ]);
    f.render_widget(Paragraph::new(title), rows[0]);

    let info = Line::from(vec![
        Span::styled(song.url(), Style::default().fg(Color::DarkGray)),
        Span::raw("  "),
        Span::raw(format!(
            "{} / {}",
            format_position_ms(player.position),
            song.duration
        )),
    ]);
    f.render_widget(Paragraph::new(info), rows[1]);

    let duration_ms = song.duration.as_millis();
    let ratio = if duration_ms == 0 {
        0.0
    } else {
        (player.position as f64 / duration_ms as f64).clamp(0.0, 1.0)
    };
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
        .ratio(ratio)
        .label(format_position_ms(player.position));
    f.render_widget(gauge, rows[2]);
}

fn draw_next(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default().borders(Borders::ALL).title("Up Next");
    let inner = block.inner(area);
    f.render_widget(block, area);

    match app.queue_panel.next_row() {
        Some(row) => f.render_widget(Paragraph::new(row), inner),
        None => f.render_widget(
            Paragraph::new("—").style(Style::default().fg(Color::DarkGray)),
            inner,
        ),
    }
}

fn draw_queue_list(f: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .queue_panel
        .queue_rows()
        .iter()
        .map(|row| ListItem::new(row.as_str()))
        .collect();
    let count = items.len();
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Queue ({})", count)),
    );
    f.render_widget(list, area);
}

fn draw_input(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default().borders(Borders::ALL).title("Add Song");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let text = match app.input_mode {
        InputMode::EditUrl => Line::from(vec![
            Span::raw(app.input.as_str()),
            Span::styled("▏", Style::default().fg(Color::Cyan)),
        ]),
        InputMode::Normal => Line::from(Span::styled(
            "press a to paste a video URL",
            Style::default().fg(Color::DarkGray),
        )),
    };
    f.render_widget(Paragraph::new(text), inner);
}

fn draw_log(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default().borders(Borders::ALL).title("Activity");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines: Vec<Line> = app
        .log
        .recent(inner.height as usize)
        .map(|(when, msg)| {
            Line::from(vec![
                Span::styled(
                    when.format("%H:%M:%S ").to_string(),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(msg.as_str()),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_hints(f: &mut Frame, area: Rect) {
    let hints = " space play/pause · n skip · ←/→ seek · a add · p pin overlay · o open queue · tab view · q quit";
    f.render_widget(
        Paragraph::new(hints).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

fn draw_overlay(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(4)])
        .split(area);

    let hint = Paragraph::new("overlay · tab for queue page")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Right);
    f.render_widget(hint, chunks[0]);

    // The mini-player bar only shows while pinned and a song is loaded
    if !app.state.overlay_persistent {
        return;
    }
    let (Some(song), Some(player)) = (app.state.current_song(), app.state.player) else {
        return;
    };

    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(chunks[1]);
    f.render_widget(block, chunks[1]);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    let title = Line::from(vec![
        Span::styled(
            song.title.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(
                "  {} / {}",
                format_position_ms(player.position),
                song.duration
            ),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    f.render_widget(Paragraph::new(title), rows[0]);

    let duration_ms = song.duration.as_millis();
    let ratio = if duration_ms == 0 {
        0.0
    } else {
        (player.position as f64 / duration_ms as f64).clamp(0.0, 1.0)
    };
    f.render_widget(
        Gauge::default()
            .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
            .ratio(ratio)
            .label(""),
        rows[1],
    );
}

/// Draw the active toast over whichever view is up.
fn draw_toast(f: &mut Frame, area: Rect, app: &App) {
    let Some((toast, slot)) = app.toasts.active() else {
        return;
    };

    let height: u16 = 4;
    if area.height < height + 2 || area.width < 24 {
        return;
    }
    let width = area.width.saturating_sub(4).min(60);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = match slot {
        ToastSlot::Top => area.y + 1,
        ToastSlot::Front => area.y + area.height.saturating_sub(height + 5),
    };
    let rect = Rect::new(x, y, width, height);

    f.render_widget(Clear, rect);
    f.render_widget(toast_widget(toast), rect);
}

fn toast_widget(toast: &Toast) -> Paragraph<'_> {
    let mut lines = vec![Line::from(Span::styled(
        toast.title.as_str(),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    if let Some(detail) = &toast.detail {
        lines.push(Line::from(Span::styled(
            detail.as_str(),
            Style::default().fg(Color::DarkGray),
        )));
    }
    Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("{} • • •", toast.kind)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use jukeq_common::time::Hms;

    fn song(id: &str, title: &str) -> QueuedSong {
        QueuedSong {
            id: id.to_string(),
            title: title.to_string(),
            duration: Hms::from_secs(212),
            thumbnail: None,
            start: 30,
        }
    }

    #[test]
    fn test_format_song_row() {
        assert_eq!(
            format_song_row(2, &song("a", "Some Song")),
            "2. Some Song  [00:00:30 / 00:03:32]"
        );
    }

    #[test]
    fn test_queue_panel_rebuilds_only_on_identity_change() {
        let mut panel = QueuePanel::new();
        let mut queue = QueueState {
            current: Some(song("cur", "Current")),
            next: Some(song("n", "Next")),
            queue: vec![song("a", "A"), song("b", "B")],
        };

        assert!(panel.sync(&queue));
        assert_eq!(panel.next_row(), Some("1. Next  [00:00:30 / 00:03:32]"));
        assert_eq!(panel.queue_rows().len(), 2);
        assert!(panel.queue_rows()[0].starts_with("2. A"));
        assert!(panel.queue_rows()[1].starts_with("3. B"));

        // Same identities: no rebuild
        assert!(!panel.sync(&queue));

        // Queue shrinks: rebuild
        queue.queue.pop();
        assert!(panel.sync(&queue));
        assert_eq!(panel.queue_rows().len(), 1);
    }

    #[test]
    fn test_queue_panel_falls_back_to_queue_head_for_next() {
        let mut panel = QueuePanel::new();
        let queue = QueueState {
            current: Some(song("cur", "Current")),
            next: None,
            queue: vec![song("a", "A"), song("b", "B")],
        };

        assert!(panel.sync(&queue));
        // Head of queue stands in as next; listing starts at its successor
        assert_eq!(panel.next_row(), Some("1. A  [00:00:30 / 00:03:32]"));
        assert_eq!(panel.queue_rows().len(), 1);
        assert!(panel.queue_rows()[0].starts_with("2. B"));
    }

    #[test]
    fn test_queue_panel_empty_queue() {
        let mut panel = QueuePanel::new();
        assert!(!panel.sync(&QueueState::default()));
        assert_eq!(panel.next_row(), None);
        assert!(panel.queue_rows().is_empty());
    }
}
