//! Candidate page sources.

use async_trait::async_trait;

use roost_store::StoreError;

use crate::candidate::{PageCursor, SweepCandidate};

/// Fetches one page of store-filtered candidates.
///
/// The store-level filter (status, deadline bounds) lives in the source;
/// the generator applies the per-candidate window predicate on top.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn fetch_page(&self, cursor: PageCursor) -> Result<Vec<SweepCandidate>, StoreError>;
}

/// Fixed candidate list, paged by offset. Tests/dev only.
#[derive(Debug, Default)]
pub struct InMemoryCandidateSource {
    candidates: Vec<SweepCandidate>,
}

impl InMemoryCandidateSource {
    pub fn new(candidates: Vec<SweepCandidate>) -> Self {
        Self { candidates }
    }
}

#[async_trait]
impl CandidateSource for InMemoryCandidateSource {
    async fn fetch_page(&self, cursor: PageCursor) -> Result<Vec<SweepCandidate>, StoreError> {
        let start = usize::try_from(cursor.offset()).unwrap_or(usize::MAX);
        Ok(self
            .candidates
            .iter()
            .skip(start)
            .take(cursor.page_size as usize)
            .cloned()
            .collect())
    }
}
