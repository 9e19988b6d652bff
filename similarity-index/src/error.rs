use thiserror::Error;

/// Errors raised at the similarity index boundary
#[derive(Debug, Error)]
pub enum SimilarityError {
    /// The backing service could not be reached or refused the query
    #[error("Similarity index unavailable: {0}")]
    Unavailable(String),

    /// Every attempt at a query exceeded its deadline
    #[error("Similarity query for {product_id} timed out after {attempts} attempt(s)")]
    Timeout { product_id: String, attempts: u32 },

    /// Invalid query provided
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Vector does not match the index dimension
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimilarityError>;
