use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Backing store I/O failure; only reachable with a remote backing
    #[error("Backing store failure: {0}")]
    Backing(String),

    /// Session ttl must be strictly positive
    #[error("Invalid session ttl")]
    InvalidTtl,
}

impl StoreError {
    /// Whether a single bounded retry is worth attempting
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Backing(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
