use thiserror::Error;

#[derive(Debug, Error)]
pub enum PagingError {
    #[error("malformed cursor: {0}")]
    Codec(#[from] serde_json::Error),
}
