//! Sweep candidates, cursors and inclusion windows.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Minimal projection of a domain entity, produced transiently by the
/// generator; never persisted by the sweep machinery itself.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepCandidate {
    pub id: Uuid,
    /// Dedup handle for the failure set (e.g. `listing:<uuid>`).
    pub key: String,
    pub deadline: DateTime<Utc>,
    /// The fields the per-item action needs.
    pub payload: JsonValue,
}

/// First-class pagination cursor: inspectable, in-memory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub page_number: u32,
    pub page_size: u32,
}

impl PageCursor {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_number: 0,
            page_size,
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page_number) * u64::from(self.page_size)
    }
}

/// Inclusion predicate over `diff = deadline - now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepWindow {
    /// Already past the deadline (`diff <= 0`): remove-style sweeps.
    Overdue,
    /// Strictly ahead of the deadline but within `window`
    /// (`0 < diff <= window`): notify-style sweeps.
    Approaching { window: Duration },
}

impl SweepWindow {
    pub fn includes(&self, diff: Duration) -> bool {
        match self {
            SweepWindow::Overdue => diff <= Duration::zero(),
            SweepWindow::Approaching { window } => diff > Duration::zero() && diff <= *window,
        }
    }
}
