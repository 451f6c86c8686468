use crate::hash::{hash_element, HashPair};

use super::{
    BloomError, BloomResult, Filter, FilterParams, DEFAULT_ERROR_RATE,
    MIN_ERROR_RATE,
};

/// Ordered chain of filters behind a single membership interface.
///
/// The chain is created empty; the first filter is allocated on the first
/// add. When the tail filter reaches its fill threshold the next add
/// appends a fresh filter whose geometry is derived from the chain's
/// error rate and the new filter's index. Filters are never removed or
/// resized, and the error rate freezes once the first filter exists.
#[derive(Clone, Debug)]
pub struct BloomChain {
    error_rate: f64,
    filters: Vec<Filter>,
}

impl BloomChain {
    /// Empty chain at the default error rate.
    pub fn new() -> Self {
        Self {
            error_rate: DEFAULT_ERROR_RATE,
            filters: Vec::new(),
        }
    }

    pub(super) fn from_parts(error_rate: f64, filters: Vec<Filter>) -> Self {
        Self {
            error_rate,
            filters,
        }
    }

    /// Target asymptotic false-positive rate.
    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }

    /// Number of filters currently in the chain.
    pub fn num_filters(&self) -> usize {
        self.filters.len()
    }

    /// Whether the chain has allocated no filter yet.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// The `index`-th filter, in creation order.
    pub fn filter(&self, index: usize) -> BloomResult<&Filter> {
        self.filters
            .get(index)
            .ok_or(BloomError::FilterIndexOutOfRange {
                index,
                num_filters: self.filters.len(),
            })
    }

    /// Change the target error rate.
    ///
    /// Only possible while no filter exists; re-setting the current value
    /// is accepted silently. Rates below [`MIN_ERROR_RATE`] are rejected.
    pub fn set_error_rate(&mut self, error_rate: f64) -> BloomResult<()> {
        if error_rate < MIN_ERROR_RATE {
            return Err(BloomError::ErrorRateTooSmall(error_rate));
        }
        if error_rate == self.error_rate {
            return Ok(());
        }
        if !self.filters.is_empty() {
            return Err(BloomError::ErrorRateFrozen);
        }
        self.error_rate = error_rate;
        Ok(())
    }

    /// Insert an element, growing the chain first if the tail is full.
    ///
    /// Returns the tail filter's verdict on novelty: whether any bit
    /// flipped for this element.
    pub fn add(&mut self, element: &[u8]) -> bool {
        self.add_hash(HashPair::from(hash_element(element)))
    }

    /// Insert by precomputed hash; same contract as [`Self::add`].
    pub fn add_hash(&mut self, hash: HashPair) -> bool {
        let grow_index = match self.filters.last() {
            None => Some(0),
            Some(tail) if tail.is_full() => Some(self.filters.len() as u32),
            Some(_) => None,
        };
        if let Some(index) = grow_index {
            self.filters
                .push(Filter::new(FilterParams::derive(self.error_rate, index)));
        }
        let tail = self.filters.len() - 1;
        self.filters[tail].add(hash)
    }

    /// Whether any filter in the chain reports the element.
    pub fn contains(&self, element: &[u8]) -> bool {
        let hash = HashPair::from(hash_element(element));
        self.filters.iter().any(|filter| filter.contains(hash))
    }

    /// Estimated count of distinct elements added, summed over the chain.
    pub fn estimate_cardinality(&self) -> u64 {
        self.filters
            .iter()
            .map(Filter::estimate_cardinality)
            .sum()
    }
}

impl Default for BloomChain {
    fn default() -> Self {
        Self::new()
    }
}
