//! Review types. Reviews are authored elsewhere and read here.

use chrono::{DateTime, Utc};
use serde::Serialize;

use delicious_core::{ReviewId, StoreId};

use super::Author;

/// A review with its author resolved.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub store: StoreId,
    pub author: Author,
    /// 1 to 5.
    pub rating: i16,
    pub text: String,
    pub created: DateTime<Utc>,
}

impl Review {
    /// Filled stars followed by empty ones, e.g. `★★★☆☆`.
    #[must_use]
    pub fn stars(&self) -> String {
        let filled = usize::try_from(self.rating.clamp(0, 5)).unwrap_or_default();
        format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delicious_core::UserId;

    fn review(rating: i16) -> Review {
        Review {
            id: ReviewId::new(1),
            store: StoreId::new(1),
            author: Author {
                id: UserId::new(1),
                name: "Wes".to_string(),
            },
            rating,
            text: String::new(),
            created: Utc::now(),
        }
    }

    #[test]
    fn test_stars() {
        assert_eq!(review(3).stars(), "★★★☆☆");
        assert_eq!(review(5).stars(), "★★★★★");
        assert_eq!(review(9).stars(), "★★★★★");
    }
}
