//! Bundle index: derived summary of the stored sentences
//!
//! The index is always recomputed from the full record set, never patched
//! in place, so its counts cannot drift from the data file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{Category, Sentence};
use crate::fetcher::Mirror;

/// Current on-disk index format
pub const INDEX_VERSION: u32 = 1;

/// Where the bundle came from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Mirror the bundle was requested from
    pub mirror: Option<Mirror>,

    /// Base URL of that mirror
    pub source_url: Option<String>,

    pub downloaded_at: Option<DateTime<Utc>>,

    /// Categories no mirror could provide during the last download
    #[serde(default)]
    pub failed_categories: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleIndex {
    pub version: u32,

    /// When this index was computed
    pub indexed_at: DateTime<Utc>,

    pub total: usize,

    /// Sentence count per category; categories with no sentences are absent
    pub counts: BTreeMap<Category, usize>,

    #[serde(flatten)]
    pub provenance: Provenance,
}

impl BundleIndex {
    /// Compute an index over `records`
    pub fn compute(records: &[Sentence], provenance: Provenance) -> Self {
        let mut counts = BTreeMap::new();
        for record in records {
            *counts.entry(record.category).or_insert(0) += 1;
        }
        Self {
            version: INDEX_VERSION,
            indexed_at: Utc::now(),
            total: records.len(),
            counts,
            provenance,
        }
    }

    pub fn count(&self, category: Category) -> usize {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    /// Differences between this index's counts and `other`'s
    pub fn count_mismatches(&self, other: &BundleIndex) -> Vec<String> {
        let mut mismatches = Vec::new();
        if self.total != other.total {
            mismatches.push(format!("total: index says {}, bundle has {}", self.total, other.total));
        }
        for category in Category::ALL {
            let (expected, actual) = (self.count(category), other.count(category));
            if expected != actual {
                mismatches.push(format!(
                    "category {} ({}): index says {}, bundle has {}",
                    category,
                    category.name(),
                    expected,
                    actual
                ));
            }
        }
        mismatches
    }
}
