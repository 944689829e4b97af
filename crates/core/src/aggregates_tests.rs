use crate::aggregates::AggregateStore;
use crate::models::{
    DashboardStats, IssueSeverity, QualityMetrics, Review, SecurityIssue, Suggestion,
    SuggestionCategory, SuggestionSeverity,
};
use chrono::Utc;
use proptest::prelude::*;

fn review(id: usize, suggestion_count: usize, issue_count: usize, score: (f64, f64)) -> Review {
    let suggestions = (0..suggestion_count)
        .map(|i| Suggestion {
            file_path: format!("src/file{}.rs", i),
            line_number: None,
            category: SuggestionCategory::Maintainability,
            severity: SuggestionSeverity::Low,
            suggestion: "tidy up".to_string(),
        })
        .collect();

    let security_issues = (0..issue_count)
        .map(|i| SecurityIssue {
            file_path: format!("src/file{}.rs", i),
            line_number: None,
            issue_type: "issue".to_string(),
            severity: IssueSeverity::Medium,
            description: "desc".to_string(),
            recommendation: "fix it".to_string(),
        })
        .collect();

    Review {
        id: format!("review-{}", id),
        repository: "owner/repo".to_string(),
        pr_number: id as u64 + 1,
        author: None,
        summary: "summary".to_string(),
        quality_metrics: QualityMetrics::from_component_scores(score.0, score.1, issue_count),
        suggestions,
        security_issues,
        files_analyzed: 1,
        degraded: false,
        discarded_records: 0,
        created_at: Utc::now(),
    }
}

/// Recomputes the statistics from scratch, the way the incremental store
/// must behave as-if it did.
fn recompute(reviews: &[Review]) -> DashboardStats {
    let average = if reviews.is_empty() {
        0.0
    } else {
        reviews
            .iter()
            .map(|r| r.quality_metrics.overall_score)
            .sum::<f64>()
            / reviews.len() as f64
    };

    DashboardStats {
        total_prs_analyzed: reviews.len() as u64,
        total_suggestions: reviews.iter().map(|r| r.suggestions.len() as u64).sum(),
        total_security_issues: reviews
            .iter()
            .map(|r| r.security_issues.len() as u64)
            .sum(),
        average_quality_score: average,
    }
}

#[test]
fn test_empty_store_snapshot() {
    let store = AggregateStore::new();
    let stats = store.snapshot();

    assert_eq!(stats.total_prs_analyzed, 0);
    assert_eq!(stats.total_suggestions, 0);
    assert_eq!(stats.total_security_issues, 0);
    assert_eq!(stats.average_quality_score, 0.0);
}

#[test]
fn test_single_record() {
    let store = AggregateStore::new();
    let r = review(0, 3, 1, (80.0, 60.0));
    store.record(&r);

    let stats = store.snapshot();
    assert_eq!(stats.total_prs_analyzed, 1);
    assert_eq!(stats.total_suggestions, 3);
    assert_eq!(stats.total_security_issues, 1);
    assert_eq!(
        stats.average_quality_score,
        r.quality_metrics.overall_score
    );
}

#[test]
fn test_series_preserves_insertion_order() {
    let store = AggregateStore::new();

    for i in 0..5 {
        store.record(&review(i, 0, 0, (50.0, 50.0)));
    }

    let series = store.series();
    let ids: Vec<&str> = series.iter().map(|p| p.pr_id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["review-0", "review-1", "review-2", "review-3", "review-4"]
    );
}

#[test]
fn test_concurrent_reads_observe_a_record_prefix() {
    use std::sync::Arc;
    use std::thread;

    let store = Arc::new(AggregateStore::new());
    let writer_store = Arc::clone(&store);

    let writer = thread::spawn(move || {
        for i in 0..200 {
            writer_store.record(&review(i, 1, 0, (70.0, 70.0)));
        }
    });

    // Readers must always see internally consistent statistics: with every
    // review carrying exactly one suggestion, a torn read would show the
    // two counters disagreeing.
    for _ in 0..50 {
        let stats = store.snapshot();
        assert_eq!(stats.total_prs_analyzed, stats.total_suggestions);
        assert!(stats.total_prs_analyzed <= 200);
    }

    writer.join().unwrap();

    let stats = store.snapshot();
    assert_eq!(stats.total_prs_analyzed, 200);
}

proptest! {
    #[test]
    fn prop_incremental_stats_equal_full_recompute(
        specs in prop::collection::vec(
            (0usize..6, 0usize..5, 0.0f64..100.0, 0.0f64..100.0),
            0..25,
        )
    ) {
        let store = AggregateStore::new();
        let reviews: Vec<Review> = specs
            .iter()
            .enumerate()
            .map(|(i, &(s, n, c, m))| review(i, s, n, (c, m)))
            .collect();

        for r in &reviews {
            store.record(r);
        }

        let incremental = store.snapshot();
        let rescanned = recompute(&reviews);

        prop_assert_eq!(incremental.total_prs_analyzed, rescanned.total_prs_analyzed);
        prop_assert_eq!(incremental.total_suggestions, rescanned.total_suggestions);
        prop_assert_eq!(incremental.total_security_issues, rescanned.total_security_issues);
        prop_assert!(
            (incremental.average_quality_score - rescanned.average_quality_score).abs() < 1e-9
        );
    }
}
