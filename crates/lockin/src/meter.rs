use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Serialize;
use tokio::task::AbortHandle;

use crate::level::LockinLevel;
use crate::payload::{NotificationPayload, PayloadStyle};

pub const DEFAULT_STATUS_TTL: Duration = Duration::from_secs(5);

const REJECTED_MESSAGE: &str = "❌ Failed to send. Check your webhook URL.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub message: String,
    pub kind: StatusKind,
}

/// How a single submit ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Delivered,
    Rejected(StatusCode),
    Failed(String),
}

impl SubmitOutcome {
    pub fn status(&self, level: LockinLevel) -> Status {
        match self {
            SubmitOutcome::Delivered => Status {
                message: level.notification_text().to_string(),
                kind: StatusKind::Success,
            },
            SubmitOutcome::Rejected(_) => Status {
                message: REJECTED_MESSAGE.to_string(),
                kind: StatusKind::Error,
            },
            SubmitOutcome::Failed(reason) => {
                let reason = if reason.is_empty() { "Unknown error" } else { reason };
                Status {
                    message: format!("❌ Error: {reason}"),
                    kind: StatusKind::Error,
                }
            }
        }
    }
}

/// Slider level plus the in-flight flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeterState {
    pub level: LockinLevel,
    pub submitting: bool,
}

impl MeterState {
    pub fn set_level(&mut self, level: LockinLevel) {
        self.level = level;
    }

    /// Start a submit. Returns `None` while another one is still in flight.
    pub fn begin_submit(
        &mut self,
        style: &PayloadStyle,
        now: DateTime<Utc>,
    ) -> Option<(LockinLevel, NotificationPayload)> {
        if self.submitting {
            return None;
        }
        self.submitting = true;
        Some((self.level, NotificationPayload::build(self.level, style, now)))
    }

    pub fn finish_submit(&mut self, level: LockinLevel, outcome: &SubmitOutcome) -> Status {
        self.submitting = false;
        outcome.status(level)
    }
}

/// Holds the current status message and clears it after a fixed window.
///
/// Showing a new status replaces the pending clear, so a message always
/// stays up for the full window.
#[derive(Clone)]
pub struct StatusBoard {
    inner: Arc<Mutex<BoardInner>>,
    ttl: Duration,
}

#[derive(Default)]
struct BoardInner {
    current: Option<Status>,
    generation: u64,
    clear: Option<AbortHandle>,
}

fn lock(inner: &Mutex<BoardInner>) -> MutexGuard<'_, BoardInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl StatusBoard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BoardInner::default())),
            ttl,
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn show(&self, status: Status) {
        let mut board = lock(&self.inner);
        if let Some(pending) = board.clear.take() {
            pending.abort();
        }
        board.generation += 1;
        board.current = Some(status);

        let generation = board.generation;
        let shared = Arc::clone(&self.inner);
        let ttl = self.ttl;
        let task = tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let mut board = lock(&shared);
            // An aborted timer may already be past its sleep.
            if board.generation == generation {
                board.current = None;
                board.clear = None;
            }
        });
        board.clear = Some(task.abort_handle());
    }

    pub fn current(&self) -> Option<Status> {
        lock(&self.inner).current.clone()
    }

    pub fn clear(&self) {
        let mut board = lock(&self.inner);
        if let Some(pending) = board.clear.take() {
            pending.abort();
        }
        board.generation += 1;
        board.current = None;
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new(DEFAULT_STATUS_TTL)
    }
}

/// Meter state and status display shared by whatever drives the UI.
pub struct Meter {
    state: Mutex<MeterState>,
    board: StatusBoard,
    style: PayloadStyle,
}

impl Meter {
    pub fn new(style: PayloadStyle, status_ttl: Duration) -> Self {
        Self {
            state: Mutex::new(MeterState::default()),
            board: StatusBoard::new(status_ttl),
            style,
        }
    }

    pub fn level(&self) -> LockinLevel {
        self.state().level
    }

    pub fn set_level(&self, level: LockinLevel) {
        self.state().set_level(level);
    }

    pub fn is_submitting(&self) -> bool {
        self.state().submitting
    }

    pub fn begin_submit(&self, now: DateTime<Utc>) -> Option<(LockinLevel, NotificationPayload)> {
        self.state().begin_submit(&self.style, now)
    }

    /// Clear the in-flight flag and show the resulting status.
    pub fn finish_submit(&self, level: LockinLevel, outcome: &SubmitOutcome) -> Status {
        let status = self.state().finish_submit(level, outcome);
        self.board.show(status.clone());
        status
    }

    pub fn status(&self) -> Option<Status> {
        self.board.current()
    }

    fn state(&self) -> MutexGuard<'_, MeterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self::new(PayloadStyle::default(), DEFAULT_STATUS_TTL)
    }
}
