//! Lazy, paginated, time-windowed candidate generator.

use std::collections::VecDeque;

use chrono::Utc;

use roost_store::StoreError;

use crate::candidate::{PageCursor, SweepCandidate, SweepWindow};
use crate::source::CandidateSource;

/// Default page size for sweep pagination.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Produces a lazy sequence of eligible candidates, one page at a time.
///
/// Not restartable: the cursor is in-memory only, so a fresh generator is
/// constructed per sweep run. Pagination is offset-based over a collection
/// that mutates while the sweep runs; a candidate can be skipped or re-seen
/// if the matching set shrinks or grows between page fetches. Sweeps run on
/// a fixed interval and route removals through the idempotent pipeline, so
/// skipped items are picked up next run and re-seen items dedupe.
pub struct CursorSweepGenerator<S> {
    source: S,
    window: SweepWindow,
    cursor: PageCursor,
    buffer: VecDeque<SweepCandidate>,
    exhausted: bool,
}

impl<S: CandidateSource> CursorSweepGenerator<S> {
    pub fn new(source: S, window: SweepWindow) -> Self {
        Self {
            source,
            window,
            cursor: PageCursor::new(DEFAULT_PAGE_SIZE),
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.cursor = PageCursor::new(page_size);
        self
    }

    /// The current pagination position.
    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }

    /// Yield the next eligible candidate, fetching pages as needed.
    ///
    /// Terminates on the first short or empty page (normal end, not an
    /// error). Candidates failing the window predicate are dropped, not
    /// yielded.
    pub async fn next(&mut self) -> Result<Option<SweepCandidate>, StoreError> {
        loop {
            if let Some(candidate) = self.buffer.pop_front() {
                return Ok(Some(candidate));
            }
            if self.exhausted {
                return Ok(None);
            }

            let page = self.source.fetch_page(self.cursor).await?;
            if page.len() < self.cursor.page_size as usize {
                self.exhausted = true;
            }
            if page.is_empty() {
                return Ok(None);
            }

            let now = Utc::now();
            self.buffer.extend(
                page.into_iter()
                    .filter(|c| self.window.includes(c.deadline - now)),
            );
            self.cursor.page_number += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use chrono::Duration;
    use serde_json::json;
    use uuid::Uuid;

    use crate::source::InMemoryCandidateSource;

    fn overdue_candidate(n: u32) -> SweepCandidate {
        SweepCandidate {
            id: Uuid::now_v7(),
            key: format!("listing:{n}"),
            deadline: Utc::now() - Duration::hours(1),
            payload: json!({}),
        }
    }

    fn future_candidate(hours_ahead: i64) -> SweepCandidate {
        SweepCandidate {
            id: Uuid::now_v7(),
            key: format!("future:{hours_ahead}"),
            deadline: Utc::now() + Duration::hours(hours_ahead),
            payload: json!({}),
        }
    }

    /// Counts page fetches while delegating to an inner source.
    struct CountingSource {
        inner: InMemoryCandidateSource,
        fetches: Arc<AtomicU32>,
    }

    #[async_trait]
    impl CandidateSource for CountingSource {
        async fn fetch_page(&self, cursor: PageCursor) -> Result<Vec<SweepCandidate>, StoreError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_page(cursor).await
        }
    }

    #[tokio::test]
    async fn empty_collection_terminates_immediately() {
        let mut generator = CursorSweepGenerator::new(
            InMemoryCandidateSource::new(vec![]),
            SweepWindow::Overdue,
        );
        assert_eq!(generator.next().await.unwrap(), None);
        // Terminated; subsequent calls stay exhausted without refetching.
        assert_eq!(generator.next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn yields_all_matches_across_expected_page_fetches() {
        let candidates: Vec<_> = (0..250).map(overdue_candidate).collect();
        let fetches = Arc::new(AtomicU32::new(0));
        let source = CountingSource {
            inner: InMemoryCandidateSource::new(candidates),
            fetches: fetches.clone(),
        };

        let mut generator = CursorSweepGenerator::new(source, SweepWindow::Overdue);
        let mut yielded = 0;
        while generator.next().await.unwrap().is_some() {
            yielded += 1;
        }

        assert_eq!(yielded, 250);
        // ceil(250 / 100) pages: the short third page signals the end.
        assert_eq!(fetches.load(Ordering::SeqCst), 3);
        assert_eq!(generator.cursor().page_number, 3);
    }

    #[tokio::test]
    async fn window_predicate_filters_within_pages() {
        let source = InMemoryCandidateSource::new(vec![
            overdue_candidate(1),
            future_candidate(1),
            overdue_candidate(2),
            future_candidate(48),
        ]);

        let mut generator = CursorSweepGenerator::new(source, SweepWindow::Overdue);
        let mut keys = Vec::new();
        while let Some(c) = generator.next().await.unwrap() {
            keys.push(c.key);
        }
        assert_eq!(keys, vec!["listing:1", "listing:2"]);
    }

    #[tokio::test]
    async fn approaching_window_excludes_overdue_items() {
        let source = InMemoryCandidateSource::new(vec![
            overdue_candidate(1),
            future_candidate(1),
            future_candidate(48),
        ]);

        let mut generator = CursorSweepGenerator::new(
            source,
            SweepWindow::Approaching {
                window: Duration::hours(24),
            },
        );
        let mut keys = Vec::new();
        while let Some(c) = generator.next().await.unwrap() {
            keys.push(c.key);
        }
        assert_eq!(keys, vec!["future:1"]);
    }
}
