use crate::hash::{HashPair, reduce};

use super::{
    BloomError, BloomResult, Partition, BASE_SIZE_BYTES, FILL_RATIO,
    GROWTH_FACTOR, TIGHTENING_RATIO,
};

/// Geometry of one filter, fully determined by the chain's target error
/// rate and the filter's position in the chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterParams {
    /// Number of partitions (= number of hash functions).
    pub num_partitions: u32,
    /// Bits per partition; the modulus for index reduction.
    pub partition_bits: u64,
    /// Set-bit count at which the filter counts as full.
    pub max_bits_set: u64,
}

impl FilterParams {
    /// Derive the geometry for filter `index` of a chain targeting the
    /// composite error rate `error_rate`.
    ///
    /// The first filter is sized so its bit count lands near
    /// `BASE_SIZE_BYTES * 8`; capacity then grows by `GROWTH_FACTOR`
    /// per filter while the per-filter error shrinks by
    /// `TIGHTENING_RATIO`, keeping the summed error of an unbounded
    /// chain convergent.
    pub fn derive(error_rate: f64, index: u32) -> Self {
        // Bits-per-element shape factor of a partitioned filter at the
        // target fill ratio.
        let shape = FILL_RATIO.ln() * (1.0 - FILL_RATIO).ln();

        let base_capacity =
            (BASE_SIZE_BYTES * 8) as f64 * (shape / error_rate.ln().abs());
        let base_error = error_rate * (1.0 - TIGHTENING_RATIO) * 2.0;

        let capacity = base_capacity * GROWTH_FACTOR.powi(index as i32);
        let filter_error = base_error * TIGHTENING_RATIO.powi(index as i32);

        let num_partitions = (-filter_error.log2()).ceil() as u32;
        let total_bits = capacity / (shape / filter_error.ln().abs());
        let partition_bits = (total_bits / num_partitions as f64).floor() as u64;
        let max_bits_set = ((partition_bits * num_partitions as u64) as f64
            * FILL_RATIO)
            .floor() as u64;

        Self {
            num_partitions,
            partition_bits,
            max_bits_set,
        }
    }

    /// Total bit count across all partitions.
    pub fn total_bits(&self) -> u64 {
        self.partition_bits * self.num_partitions as u64
    }
}

/// The double-hashing walk producing one bit index per partition.
///
/// The advance is `a += b; b += j` after each partition, in wrapping
/// 32-bit arithmetic. The order is part of the data format: it fixes
/// both the false-positive behavior and the cardinality calibration.
struct IndexWalk {
    a: u32,
    b: u32,
    step: u32,
    num_partitions: u32,
    partition_bits: u64,
}

impl IndexWalk {
    fn new(hash: HashPair, params: &FilterParams) -> Self {
        Self {
            a: hash.a,
            b: hash.b,
            step: 0,
            num_partitions: params.num_partitions,
            partition_bits: params.partition_bits,
        }
    }
}

impl Iterator for IndexWalk {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.step == self.num_partitions {
            return None;
        }
        let bit = reduce(self.a, self.partition_bits);
        self.a = self.a.wrapping_add(self.b);
        self.b = self.b.wrapping_add(self.step);
        self.step += 1;
        Some(bit)
    }
}

/// A single ring of the chain: `k` zeroed partitions plus the saturation
/// counter that drives growth. Geometry never changes once built.
#[derive(Clone, Debug)]
pub struct Filter {
    params: FilterParams,
    bits_set: u64,
    parts: Vec<Partition>,
}

impl Filter {
    pub fn new(params: FilterParams) -> Self {
        let parts = (0..params.num_partitions)
            .map(|_| Partition::new(params.partition_bits))
            .collect();
        Self {
            params,
            bits_set: 0,
            parts,
        }
    }

    /// Rebuild a filter from persisted counters and partitions.
    pub(super) fn from_parts(
        params: FilterParams,
        bits_set: u64,
        parts: Vec<Partition>,
    ) -> BloomResult<Self> {
        if params.num_partitions == 0 || params.partition_bits == 0 {
            return Err(BloomError::CorruptSnapshot(
                "filter geometry must be non-zero".to_string(),
            ));
        }
        if parts.len() != params.num_partitions as usize {
            return Err(BloomError::CorruptSnapshot(format!(
                "expected {} partitions, got {}",
                params.num_partitions,
                parts.len()
            )));
        }
        if bits_set > params.total_bits() {
            return Err(BloomError::CorruptSnapshot(format!(
                "bit counter {bits_set} exceeds capacity {}",
                params.total_bits()
            )));
        }
        Ok(Self {
            params,
            bits_set,
            parts,
        })
    }

    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    /// Current count of set bits across all partitions.
    pub fn bits_set(&self) -> u64 {
        self.bits_set
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.parts
    }

    /// Whether the filter reached its fill threshold.
    pub fn is_full(&self) -> bool {
        self.bits_set >= self.params.max_bits_set
    }

    /// Set the element's bit in every partition.
    ///
    /// Returns whether any bit flipped, i.e. the element was novel to
    /// this filter.
    pub fn add(&mut self, hash: HashPair) -> bool {
        let walk = IndexWalk::new(hash, &self.params);
        let mut newly_set = 0u64;
        for (part, bit) in self.parts.iter_mut().zip(walk) {
            if !part.set(bit) {
                newly_set += 1;
            }
        }
        self.bits_set += newly_set;
        newly_set > 0
    }

    /// Test all partition bits for the element, short-circuiting on the
    /// first clear bit.
    pub fn contains(&self, hash: HashPair) -> bool {
        let walk = IndexWalk::new(hash, &self.params);
        self.parts
            .iter()
            .zip(walk)
            .all(|(part, bit)| part.get(bit))
    }

    /// Estimate how many distinct elements this filter absorbed, from
    /// the observed bit fill.
    pub fn estimate_cardinality(&self) -> u64 {
        if self.bits_set == 0 {
            return 0;
        }
        let consumed = self.bits_set as f64 / self.params.max_bits_set as f64;
        let fill = (consumed * FILL_RATIO).min(1.0 - f64::EPSILON);
        (self.params.partition_bits as f64 * -(1.0 - fill).ln() + 0.5).floor()
            as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_anchors_first_filter() {
        let params = FilterParams::derive(0.003, 0);
        // -log2(0.003 * 0.15 * 2) = 10.117..., so 11 partitions.
        assert_eq!(params.num_partitions, 11);
        assert_eq!(params.partition_bits, 1798);
        assert_eq!(params.max_bits_set, 9889);
    }

    #[test]
    fn derive_grows_and_tightens() {
        let e = 0.01;
        let mut prev = FilterParams::derive(e, 0);
        for index in 1..8 {
            let next = FilterParams::derive(e, index);
            let growth =
                next.total_bits() as f64 / prev.total_bits() as f64;
            // Bit size roughly doubles; a notch more whenever the
            // tighter error bumps the partition count.
            assert!(
                (1.9..2.4).contains(&growth),
                "growth {growth} out of range at index {index}"
            );
            assert!(next.num_partitions >= prev.num_partitions);
            assert_eq!(
                next.max_bits_set,
                next.total_bits() / 2,
                "fill threshold is half the capacity"
            );
            prev = next;
        }
    }

    #[test]
    fn walk_matches_recurrence() {
        let params = FilterParams {
            num_partitions: 3,
            partition_bits: 1000,
            max_bits_set: 1500,
        };
        let hash = HashPair {
            a: 1 << 31,
            b: 1 << 30,
        };
        // j=0: (2^31 * 1000) >> 32 = 500, then a=0xC0000000.
        // j=1: 750, then a wraps to 0 (b was not yet advanced by j=0).
        // j=2: 0.
        let walk = IndexWalk::new(hash, &params);
        assert_eq!(walk.collect::<Vec<_>>(), vec![500, 750, 0]);
    }

    #[test]
    fn walk_is_deterministic() {
        let params = FilterParams::derive(0.003, 0);
        let hash = HashPair::from(crate::hash::hash_element(b"abc"));
        let first: Vec<_> = IndexWalk::new(hash, &params).collect();
        let second: Vec<_> = IndexWalk::new(hash, &params).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), params.num_partitions as usize);
        assert!(first.iter().all(|&bit| bit < params.partition_bits));
    }

    #[test]
    fn add_reports_novelty() {
        let mut filter = Filter::new(FilterParams::derive(0.003, 0));
        let hash = HashPair::from(crate::hash::hash_element(b"element"));
        assert!(filter.add(hash));
        assert!(filter.contains(hash));
        assert!(!filter.add(hash), "second insert flips no bits");
        assert!(filter.bits_set() <= filter.params().num_partitions as u64);
    }

    #[test]
    fn bits_set_is_monotonic() {
        let mut filter = Filter::new(FilterParams::derive(0.01, 0));
        let mut last = 0;
        for i in 0..200u32 {
            let hash = HashPair::from(crate::hash::hash_element(
                format!("item-{i}").as_bytes(),
            ));
            filter.add(hash);
            assert!(filter.bits_set() >= last);
            last = filter.bits_set();
        }
        assert!(last <= filter.params().total_bits());
    }

    #[test]
    fn fills_up_under_load() {
        let params = FilterParams {
            num_partitions: 2,
            partition_bits: 64,
            max_bits_set: 64,
        };
        let mut filter = Filter::new(params);
        let mut i = 0u32;
        while !filter.is_full() {
            let hash = HashPair::from(crate::hash::hash_element(
                format!("fill-{i}").as_bytes(),
            ));
            filter.add(hash);
            i += 1;
            assert!(i < 10_000, "filter never saturated");
        }
        assert!(filter.bits_set() >= params.max_bits_set);
    }

    #[test]
    fn cardinality_tracks_inserts() {
        let mut filter = Filter::new(FilterParams::derive(0.01, 0));
        assert_eq!(filter.estimate_cardinality(), 0);
        for i in 0..500u32 {
            let hash = HashPair::from(crate::hash::hash_element(
                format!("card-{i}").as_bytes(),
            ));
            filter.add(hash);
        }
        let estimate = filter.estimate_cardinality() as f64;
        assert!(
            (estimate - 500.0).abs() / 500.0 < 0.1,
            "estimate {estimate} too far from 500"
        );
    }

    #[test]
    fn cardinality_clamps_overfull_counters() {
        let params = FilterParams {
            num_partitions: 1,
            partition_bits: 8,
            max_bits_set: 4,
        };
        let filter = Filter::from_parts(
            params,
            8,
            vec![Partition::from_bytes(8, vec![0xff]).unwrap()],
        )
        .unwrap();
        // p >= 1 must clamp to a finite estimate instead of faulting.
        let estimate = filter.estimate_cardinality();
        assert!(estimate > 0);
    }
}
