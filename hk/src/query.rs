//! Query engine: pick sentences from the bundle
//!
//! Selection is uniform over the records that match the criteria. The
//! caller supplies the random source, so a seeded RNG makes every query
//! reproducible.

use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::debug;

use crate::domain::{Criteria, Sentence};
use crate::error::BundleError;
use crate::store::BundleStore;

/// Read-only lookups against a [`BundleStore`]
pub struct QueryEngine<'a> {
    store: &'a BundleStore,
}

impl<'a> QueryEngine<'a> {
    pub fn new(store: &'a BundleStore) -> Self {
        Self { store }
    }

    /// Load the bundle and select one sentence matching `criteria`
    pub fn select<R: Rng + ?Sized>(&self, criteria: &Criteria, rng: &mut R) -> Result<Sentence, BundleError> {
        debug!(%criteria, "QueryEngine::select: called");
        let loaded = self.store.load()?;
        select_from(&loaded.records, criteria, rng).cloned()
    }

    /// Load the bundle and pick up to `count` distinct matching sentences
    pub fn sample<R: Rng + ?Sized>(
        &self,
        criteria: &Criteria,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<Sentence>, BundleError> {
        debug!(%criteria, count, "QueryEngine::sample: called");
        let loaded = self.store.load()?;
        Ok(sample_from(&loaded.records, criteria, count, rng)?
            .into_iter()
            .cloned()
            .collect())
    }
}

/// Select one sentence from `records`
///
/// An exact id short-circuits the other filters. Otherwise one of the
/// matching records is chosen uniformly at random; no match is `NotFound`.
pub fn select_from<'r, R: Rng + ?Sized>(
    records: &'r [Sentence],
    criteria: &Criteria,
    rng: &mut R,
) -> Result<&'r Sentence, BundleError> {
    if let Some(id) = &criteria.id {
        return records
            .iter()
            .find(|s| s.has_id(id))
            .ok_or_else(|| BundleError::NotFound(criteria.to_string()));
    }

    let matching: Vec<&Sentence> = records.iter().filter(|s| criteria.matches(s)).collect();
    debug!(matching = matching.len(), total = records.len(), "select_from: filtered");

    matching
        .choose(rng)
        .copied()
        .ok_or_else(|| BundleError::NotFound(criteria.to_string()))
}

/// Pick up to `count` distinct matching sentences
///
/// Returns fewer than `count` when fewer match; `NotFound` when none do.
pub fn sample_from<'r, R: Rng + ?Sized>(
    records: &'r [Sentence],
    criteria: &Criteria,
    count: usize,
    rng: &mut R,
) -> Result<Vec<&'r Sentence>, BundleError> {
    if criteria.id.is_some() {
        return select_from(records, criteria, rng).map(|s| vec![s]);
    }

    let matching: Vec<&Sentence> = records.iter().filter(|s| criteria.matches(s)).collect();
    if matching.is_empty() {
        return Err(BundleError::NotFound(criteria.to_string()));
    }
    if matching.len() < count {
        debug!(available = matching.len(), count, "sample_from: fewer matches than requested");
    }

    Ok(matching.choose_multiple(rng, count).copied().collect())
}
