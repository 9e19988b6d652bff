use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecommendError {
    #[error("Product not found in catalog: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("Interaction data error: {0}")]
    Interaction(#[from] cobuy_interactions::InteractionError),

    #[error("Similarity index error: {0}")]
    Similarity(#[from] cobuy_similarity_index::SimilarityError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Worker task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, RecommendError>;
