use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GcError {
    #[error("out of memory: requested {requested} bytes, {available} bytes free after collection")]
    OutOfMemory { requested: usize, available: usize },

    #[error("could not map a region of {size} bytes: {reason}")]
    RegionMapFailed { size: usize, reason: String },

    #[error("invalid heap configuration: {0}")]
    InvalidConfig(&'static str),
}
