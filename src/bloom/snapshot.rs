use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use super::{
    BloomChain, BloomError, BloomResult, Filter, FilterParams, Partition,
    MIN_ERROR_RATE,
};

/// Wire image of a chain: the error rate plus each filter in creation
/// order. Partition payloads are the raw LSB-first byte blobs.
#[derive(Clone, Debug, Serialize, Deserialize, Decode, Encode)]
pub struct ChainSnapshot {
    pub error_rate: f64,
    pub filters: Vec<FilterSnapshot>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Decode, Encode)]
pub struct FilterSnapshot {
    pub num_partitions: u32,
    pub partition_bits: u64,
    pub bits_set: u64,
    pub max_bits_set: u64,
    pub parts: Vec<Vec<u8>>,
}

impl ChainSnapshot {
    pub fn to_bytes(&self) -> BloomResult<Vec<u8>> {
        bincode::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| BloomError::SnapshotCodec(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> BloomResult<Self> {
        bincode::decode_from_slice(bytes, bincode::config::standard())
            .map(|(snapshot, _)| snapshot)
            .map_err(|e| BloomError::SnapshotCodec(e.to_string()))
    }
}

impl From<&BloomChain> for ChainSnapshot {
    fn from(chain: &BloomChain) -> Self {
        let filters = (0..chain.num_filters())
            .filter_map(|index| chain.filter(index).ok())
            .map(|filter| FilterSnapshot {
                num_partitions: filter.params().num_partitions,
                partition_bits: filter.params().partition_bits,
                bits_set: filter.bits_set(),
                max_bits_set: filter.params().max_bits_set,
                parts: filter
                    .partitions()
                    .iter()
                    .map(|part| part.as_bytes().to_vec())
                    .collect(),
            })
            .collect();
        Self {
            error_rate: chain.error_rate(),
            filters,
        }
    }
}

impl TryFrom<ChainSnapshot> for BloomChain {
    type Error = BloomError;

    fn try_from(snapshot: ChainSnapshot) -> BloomResult<Self> {
        if !snapshot.error_rate.is_finite()
            || snapshot.error_rate < MIN_ERROR_RATE
        {
            return Err(BloomError::CorruptSnapshot(format!(
                "invalid error rate {}",
                snapshot.error_rate
            )));
        }
        let filters = snapshot
            .filters
            .into_iter()
            .map(|filter| {
                let params = FilterParams {
                    num_partitions: filter.num_partitions,
                    partition_bits: filter.partition_bits,
                    max_bits_set: filter.max_bits_set,
                };
                let parts = filter
                    .parts
                    .into_iter()
                    .map(|blob| {
                        Partition::from_bytes(filter.partition_bits, blob)
                    })
                    .collect::<BloomResult<Vec<_>>>()?;
                Filter::from_parts(params, filter.bits_set, parts)
            })
            .collect::<BloomResult<Vec<_>>>()?;
        Ok(BloomChain::from_parts(snapshot.error_rate, filters))
    }
}
