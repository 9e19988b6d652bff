use thiserror::Error;

#[derive(Error, Debug)]
pub enum InteractionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Co-occurrence table is asymmetric for ({a}, {b}): {forward} vs {backward}")]
    Asymmetric {
        a: String,
        b: String,
        forward: u32,
        backward: u32,
    },

    #[error("Self co-occurrence recorded for {0}")]
    SelfPair(String),

    #[error("Invalid interaction record: {0}")]
    InvalidRecord(String),
}

pub type Result<T> = std::result::Result<T, InteractionError>;
