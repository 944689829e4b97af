//! # Aggregate Store
//!
//! Incrementally maintained dashboard statistics and the quality trend
//! series.
//!
//! Every committed review is folded into running counters under a single
//! write-lock acquisition, so the statistics never need a rescan of the
//! review set — but they must always equal what a rescan would produce,
//! and the property test in `aggregates_tests.rs` holds the two forms
//! together. Readers take the read lock and therefore always observe the
//! state after some prefix of completed `record` calls; a torn read of a
//! half-applied increment is not possible.

use std::sync::{PoisonError, RwLock};

use crate::models::{DashboardStats, MetricsPoint, Review};

#[cfg(test)]
#[path = "aggregates_tests.rs"]
mod tests;

#[derive(Debug, Default)]
struct AggregateState {
    review_count: u64,
    suggestion_total: u64,
    security_issue_total: u64,
    score_sum: f64,
    series: Vec<MetricsPoint>,
}

/// Incrementally maintained aggregates over all committed reviews.
#[derive(Debug, Default)]
pub struct AggregateStore {
    state: RwLock<AggregateState>,
}

impl AggregateStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one committed review into the aggregates.
    ///
    /// Must be called exactly once per committed review, after the review
    /// repository write succeeded — reviews that failed to commit are not
    /// part of the statistics.
    pub fn record(&self, review: &Review) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        state.review_count += 1;
        state.suggestion_total += review.suggestions.len() as u64;
        state.security_issue_total += review.security_issues.len() as u64;
        state.score_sum += review.quality_metrics.overall_score;
        state.series.push(MetricsPoint::from(review));
    }

    /// The current dashboard statistics.
    pub fn snapshot(&self) -> DashboardStats {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);

        let average_quality_score = if state.review_count == 0 {
            0.0
        } else {
            state.score_sum / state.review_count as f64
        };

        DashboardStats {
            total_prs_analyzed: state.review_count,
            total_suggestions: state.suggestion_total,
            total_security_issues: state.security_issue_total,
            average_quality_score,
        }
    }

    /// The quality trend series, in review commit order.
    pub fn series(&self) -> Vec<MetricsPoint> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .series
            .clone()
    }
}
