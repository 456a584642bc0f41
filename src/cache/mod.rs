//! In-memory caches used by the tracker.
//!
//! [`LruCache`] bounds both size and age of its entries. [`TtlMemo`] bounds only age. Both read
//! time through a [`Clock`] so that expiry can be driven by hand in tests.
//!
//! [`TrackerCache`] bundles the three caches that sit in front of the tracker's computations. It
//! is never partially invalidated: the tracker clears all of it whenever its data changes.

mod clock;
mod lru;
mod memo;

pub use clock::{Clock, ManualClock, SystemClock};
pub use lru::{LruCache, DEFAULT_TTL};
pub use memo::TtlMemo;

use crate::config::CacheSettings;
use crate::model::{MonthYear, Transaction, TransactionType};
use crate::reports::{CategoryAnalysis, MonthlySummary};
use crate::tracker::TransactionFilter;
use std::sync::Arc;
use tracing::trace;

/// The caches owned by a `Tracker`.
#[derive(Debug)]
pub struct TrackerCache {
    monthly_summaries: LruCache<MonthYear, MonthlySummary>,
    category_analyses: LruCache<TransactionType, Vec<CategoryAnalysis>>,
    queries: TtlMemo<TransactionFilter, Vec<Arc<Transaction>>>,
}

impl TrackerCache {
    pub fn new(settings: &CacheSettings) -> Self {
        Self {
            monthly_summaries: LruCache::new(
                settings.monthly_summary_capacity(),
                settings.monthly_summary_ttl(),
            ),
            category_analyses: LruCache::new(
                settings.category_analysis_capacity(),
                settings.category_analysis_ttl(),
            ),
            queries: TtlMemo::new(settings.query_ttl()),
        }
    }

    pub fn monthly_summary(&mut self, month: &MonthYear) -> Option<MonthlySummary> {
        let hit = self.monthly_summaries.get(month).cloned();
        trace!(
            "Monthly summary cache {} for {month}",
            if hit.is_some() { "hit" } else { "miss" }
        );
        hit
    }

    pub fn put_monthly_summary(&mut self, summary: MonthlySummary) {
        self.monthly_summaries.put(summary.month_year, summary);
    }

    pub fn category_analysis(
        &mut self,
        transaction_type: TransactionType,
    ) -> Option<Vec<CategoryAnalysis>> {
        self.category_analyses.get(&transaction_type).cloned()
    }

    pub fn put_category_analysis(
        &mut self,
        transaction_type: TransactionType,
        analysis: Vec<CategoryAnalysis>,
    ) {
        self.category_analyses.put(transaction_type, analysis);
    }

    /// Returns the memoized result of `filter`, running `query` when there is none.
    pub fn query<F>(&mut self, filter: &TransactionFilter, query: F) -> Vec<Arc<Transaction>>
    where
        F: FnOnce() -> Vec<Arc<Transaction>>,
    {
        self.queries.get_or_insert_with(filter.clone(), query).clone()
    }

    /// Drops stale entries from every cache.
    pub fn clear_expired(&mut self) -> usize {
        self.monthly_summaries.clear_expired()
            + self.category_analyses.clear_expired()
            + self.queries.cleanup_expired()
    }

    /// Discards everything.
    pub fn clear(&mut self) {
        self.monthly_summaries.clear();
        self.category_analyses.clear();
        self.queries.clear();
    }

    /// Number of entries across all caches, including any not yet swept after expiry.
    pub fn len(&self) -> usize {
        self.monthly_summaries.len() + self.category_analyses.len() + self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
