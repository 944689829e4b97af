//! # Review Repository
//!
//! Durable storage for committed reviews.
//!
//! The repository is the downstream boundary of the pipeline: reviews are
//! append-only after commit and owned exclusively by the store. The trait
//! is deliberately synchronous — committing must not introduce a suspension
//! point between the analysis finishing and the review becoming visible,
//! so a committed review is observable atomically or not at all.

use std::sync::{PoisonError, RwLock};

use crate::models::{Review, ReviewSummary, TaggedSecurityIssue};

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

/// Error types for review storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The review could not be persisted.
    ///
    /// This is surfaced to the caller as "the analysis succeeded but the
    /// result was lost" so the request can be resubmitted; a computed
    /// review is never dropped silently.
    #[error("Failed to persist review: {0}")]
    WriteFailed(String),
}

/// Trait for storing and retrieving committed reviews.
pub trait ReviewRepository: Send + Sync {
    /// Commits a fully assembled review.
    ///
    /// The review must become visible to readers atomically: no reader may
    /// ever observe a partially stored review.
    fn commit(&self, review: Review) -> Result<(), StoreError>;

    /// Retrieves a review by id.
    fn get(&self, id: &str) -> Option<Review>;

    /// Lists condensed summaries of all reviews, most recent first.
    fn list_summaries(&self) -> Vec<ReviewSummary>;

    /// Flattens the security issues of all reviews, each tagged with its
    /// owning repository and pull request, in review commit order.
    fn security_issues(&self) -> Vec<TaggedSecurityIssue>;
}

/// An in-memory [`ReviewRepository`].
///
/// Reviews are pushed fully formed under the write lock, which gives the
/// required commit atomicity for free.
#[derive(Debug, Default)]
pub struct InMemoryReviewRepository {
    reviews: RwLock<Vec<Review>>,
}

impl InMemoryReviewRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of committed reviews.
    pub fn len(&self) -> usize {
        self.reviews
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no review has been committed yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReviewRepository for InMemoryReviewRepository {
    fn commit(&self, review: Review) -> Result<(), StoreError> {
        let mut reviews = self
            .reviews
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        reviews.push(review);
        Ok(())
    }

    fn get(&self, id: &str) -> Option<Review> {
        self.reviews
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|review| review.id == id)
            .cloned()
    }

    fn list_summaries(&self) -> Vec<ReviewSummary> {
        self.reviews
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .map(ReviewSummary::from)
            .collect()
    }

    fn security_issues(&self) -> Vec<TaggedSecurityIssue> {
        self.reviews
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .flat_map(|review| {
                review
                    .security_issues
                    .iter()
                    .map(|issue| TaggedSecurityIssue {
                        repository: review.repository.clone(),
                        pr_number: review.pr_number,
                        issue: issue.clone(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}
