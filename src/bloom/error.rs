use thiserror::Error;

pub type BloomResult<T> = std::result::Result<T, BloomError>;

#[derive(Error, Debug)]
pub enum BloomError {
    #[error("error rate too small: {0}")]
    ErrorRateTooSmall(f64),

    #[error("error rate is frozen once the chain holds a filter")]
    ErrorRateFrozen,

    #[error("filter index out of range: {index} >= {num_filters}")]
    FilterIndexOutOfRange { index: usize, num_filters: usize },

    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    #[error("snapshot codec error: {0}")]
    SnapshotCodec(String),
}
