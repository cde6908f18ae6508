//! Review ratings and tag counts.

use serde::{Deserialize, Serialize};

/// Usage count of one tag across all stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

/// Average rating over a set of reviews.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub review_count: i64,
    pub average_rating: f64,
}

impl RatingSummary {
    /// Stores need at least this many reviews to appear in the top list.
    pub const MIN_REVIEWS_FOR_TOP: i64 = 2;

    /// Summarize ratings, or `None` when there are no reviews.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // review counts are far below 2^52
    pub fn from_ratings(ratings: &[i16]) -> Option<Self> {
        if ratings.is_empty() {
            return None;
        }
        let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
        let count = ratings.len() as i64;
        Some(Self {
            review_count: count,
            average_rating: sum as f64 / count as f64,
        })
    }

    /// Whether this summary qualifies for the top-rated listing.
    #[must_use]
    pub const fn qualifies_for_top(&self) -> bool {
        self.review_count >= Self::MIN_REVIEWS_FOR_TOP
    }

    /// Average rounded to one decimal place for display.
    #[must_use]
    pub fn display_average(&self) -> String {
        format!("{:.1}", self.average_rating)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_ratings() {
        assert_eq!(RatingSummary::from_ratings(&[]), None);
    }

    #[test]
    fn test_average_is_arithmetic_mean() {
        let summary = RatingSummary::from_ratings(&[5, 4, 2]).unwrap();
        assert_eq!(summary.review_count, 3);
        assert!((summary.average_rating - 11.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.display_average(), "3.7");
    }

    #[test]
    fn test_single_review_does_not_qualify() {
        assert!(!RatingSummary::from_ratings(&[5]).unwrap().qualifies_for_top());
        assert!(RatingSummary::from_ratings(&[5, 1]).unwrap().qualifies_for_top());
    }
}
