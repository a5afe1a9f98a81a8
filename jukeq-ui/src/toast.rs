//! Transient toast notifications
//!
//! Queue and playback events surface as toasts: short-lived cards shown
//! one at a time, in strict arrival order. An active toast lives for a
//! bounded duration, or collapses to the secondary "top" slot early when
//! a now-playing transition supersedes it. When the queue runs dry the
//! drain loop backs off briefly before checking again.

use std::collections::VecDeque;
use std::time::Duration;

use jukeq_common::events::{QueueSongNotice, SongNotice};
use jukeq_common::time::{format_position_ms, Hms};
use tokio::time::Instant;

/// How long a toast stays visible.
pub const TOAST_DURATION: Duration = Duration::from_secs(7);

/// Back-off before re-checking an empty queue.
pub const TOAST_IDLE_RECHECK: Duration = Duration::from_millis(750);

/// What a toast announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Playing,
    Queued,
    FailedToQueue,
}

impl std::fmt::Display for ToastKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToastKind::Playing => write!(f, "Playing"),
            ToastKind::Queued => write!(f, "Queued"),
            ToastKind::FailedToQueue => write!(f, "Failed to Queue"),
        }
    }
}

/// Where the active toast is anchored.
///
/// `Front` is the primary position; `Top` is the out-of-the-way slot used
/// when the mini-player occupies the front, or after a now-playing
/// transition supersedes the toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastSlot {
    Front,
    Top,
}

/// One pending or visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub title: String,
    /// `start / duration` line, absent for failures.
    pub detail: Option<String>,
    pub thumbnail: Option<String>,
}

impl Toast {
    /// Toast for a song that just started playing.
    pub fn playing(notice: &SongNotice) -> Self {
        let mut detail = song_detail(notice.start, notice.duration);
        if notice.b_track {
            detail.push_str(" · b-track");
        }
        Self {
            kind: ToastKind::Playing,
            title: notice.title.clone(),
            detail: Some(detail),
            thumbnail: notice.thumbnail.clone(),
        }
    }

    /// Toast for a successfully queued song.
    pub fn queued(notice: &QueueSongNotice) -> Self {
        let mut detail = song_detail(notice.start, notice.duration);
        if notice.pos >= 0 {
            detail.push_str(&format!(" · #{}", notice.pos));
        }
        if notice.b_track {
            detail.push_str(" · b-track");
        }
        Self {
            kind: ToastKind::Queued,
            title: notice.title.clone(),
            detail: Some(detail),
            thumbnail: notice.thumbnail.clone(),
        }
    }

    /// Toast for a failed queue attempt. The notice carries no song data,
    /// only the submitted input in `id`.
    pub fn failed(notice: &QueueSongNotice) -> Self {
        Self {
            kind: ToastKind::FailedToQueue,
            title: notice.id.clone(),
            detail: None,
            thumbnail: None,
        }
    }
}

fn song_detail(start_secs: u64, duration: Hms) -> String {
    format!("{} / {}", format_position_ms(start_secs * 1000), duration)
}

#[derive(Debug)]
struct ActiveToast {
    toast: Toast,
    slot: ToastSlot,
    expires_at: Instant,
}

/// Strictly-ordered, serially-drained toast queue.
#[derive(Debug, Default)]
pub struct ToastQueue {
    pending: VecDeque<Toast>,
    active: Option<ActiveToast>,
    idle_until: Option<Instant>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a toast; it will display after everything already pending.
    pub fn push(&mut self, toast: Toast) {
        self.pending.push_back(toast);
    }

    /// Number of toasts still waiting (not counting the visible one).
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// The currently visible toast, if any.
    pub fn active(&self) -> Option<(&Toast, ToastSlot)> {
        self.active.as_ref().map(|a| (&a.toast, a.slot))
    }

    /// Advance the drain state machine.
    ///
    /// `start_top` anchors newly shown toasts in the top slot (used while
    /// the persistent mini-player holds the front). Returns true when the
    /// visible toast changed.
    pub fn tick(&mut self, now: Instant, start_top: bool) -> bool {
        let mut changed = false;

        let expired = self
            .active
            .as_ref()
            .map(|a| now >= a.expires_at)
            .unwrap_or(false);
        if expired {
            self.active = None;
            // Next toast follows immediately, no idle back-off
            self.idle_until = None;
            changed = true;
        }

        if self.active.is_none() {
            if let Some(until) = self.idle_until {
                if now < until {
                    return changed;
                }
                self.idle_until = None;
            }

            match self.pending.pop_front() {
                Some(toast) => {
                    self.active = Some(ActiveToast {
                        toast,
                        slot: if start_top {
                            ToastSlot::Top
                        } else {
                            ToastSlot::Front
                        },
                        expires_at: now + TOAST_DURATION,
                    });
                    changed = true;
                }
                None => {
                    self.idle_until = Some(now + TOAST_IDLE_RECHECK);
                }
            }
        }

        changed
    }

    /// A new song started playing: a front-anchored toast is superseded
    /// and collapses to the top slot (its deadline is unchanged). Returns
    /// true if the visible toast moved.
    pub fn notify_now_playing(&mut self) -> bool {
        if let Some(active) = &mut self.active {
            if active.slot == ToastSlot::Front {
                active.slot = ToastSlot::Top;
                return true;
            }
        }
        false
    }
}
