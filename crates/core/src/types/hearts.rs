//! A user's favorite ("hearted") stores.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::id::StoreId;

/// What a heart toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeartAction {
    Added,
    Removed,
}

/// Set of hearted store ids. No duplicates, iteration in id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hearts(BTreeSet<StoreId>);

impl Hearts {
    /// Whether `store` is hearted.
    #[must_use]
    pub fn contains(&self, store: StoreId) -> bool {
        self.0.contains(&store)
    }

    /// Add `store` if absent, remove it if present.
    ///
    /// Same semantics as the single-statement toggle the web crate runs
    /// against the hearts table.
    pub fn toggle(&mut self, store: StoreId) -> HeartAction {
        if self.0.remove(&store) {
            HeartAction::Removed
        } else {
            self.0.insert(store);
            HeartAction::Added
        }
    }

    /// Number of hearted stores.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is hearted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate hearted ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = StoreId> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<StoreId> for Hearts {
    fn from_iter<I: IntoIterator<Item = StoreId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
