//! Scalable (chained) partitioned bloom filter.
//!
//! A chain starts empty and grows by appending filters: when the active
//! tail filter reaches its fill threshold, a larger filter with a tighter
//! per-filter error rate is linked behind it. Each filter is partitioned,
//! one bit array per hash function, so saturation accounting stays local
//! to the filter. Membership is the union over the chain; the composite
//! false-positive rate stays bounded by the configured target because the
//! per-filter errors form a convergent geometric series.

mod chain;
mod error;
mod filter;
mod partition;
mod snapshot;

pub use chain::BloomChain;
pub use error::{BloomError, BloomResult};
pub use filter::{Filter, FilterParams};
pub use partition::Partition;
pub use snapshot::{ChainSnapshot, FilterSnapshot};

/// Byte size anchoring the first filter's geometry.
pub const BASE_SIZE_BYTES: u64 = 2048;

/// Fraction of set bits at which a filter is considered full.
pub const FILL_RATIO: f64 = 0.5;

/// Capacity growth factor between successive filters in a chain.
pub const GROWTH_FACTOR: f64 = 2.0;

/// Shrink factor applied to the per-filter target error across the chain.
pub const TIGHTENING_RATIO: f64 = 0.85;

/// Error rate used when the caller does not pick one.
pub const DEFAULT_ERROR_RATE: f64 = 0.003;

/// Smallest accepted error rate.
pub const MIN_ERROR_RATE: f64 = 1e-10;
