//! Scalable (chained) partitioned bloom filter with a key-value command
//! surface.
//!
//! HowTo:
//!    * Chain: a [`BloomChain`] starts empty and links a new, larger
//!      filter whenever the active tail reaches its fill threshold, so
//!      capacity is unbounded while the composite false-positive rate
//!      stays below the configured target.
//!    * Partitions: each filter keeps one bit array per hash function.
//!      A single MurmurHash64A digest is split in two 32-bit halves and
//!      walked across the partitions with a double-hashing recurrence.
//!    * Cardinality: the count of distinct inserted elements is
//!      estimated from the observed bit fill of every filter, no
//!      per-element bookkeeping needed.
//!    * Commands: `BFADD`, `BFEXIST`, `BFCOUNT` and the two `BFDEBUG`
//!      subcommands bind chains to named keyspace slots; the same
//!      surface is exposed over HTTP by the `server` binary.

pub mod api;
pub mod bloom;
pub mod commands;
pub mod hash;
pub mod keyspace;
pub mod types;

pub use bloom::{
    BloomChain, BloomError, BloomResult, ChainSnapshot, Filter,
    FilterParams, FilterSnapshot, Partition, BASE_SIZE_BYTES,
    DEFAULT_ERROR_RATE, FILL_RATIO, GROWTH_FACTOR, MIN_ERROR_RATE,
    TIGHTENING_RATIO,
};
pub use commands::{dispatch, CommandError, CommandResult, Reply};
pub use hash::{hash_element, murmurhash64a, HashPair, HASH_SEED};
pub use keyspace::{Keyspace, Value};
pub use types::{AppState, ServerConfig, ServerConfigBuilder};
