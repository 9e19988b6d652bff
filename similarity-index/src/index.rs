use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A product returned by a nearest-neighbor query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Id of the neighboring product
    pub product_id: String,

    /// Similarity to the queried product (higher is more similar)
    pub score: f64,
}

impl Neighbor {
    pub fn new(product_id: impl Into<String>, score: f64) -> Self {
        Self {
            product_id: product_id.into(),
            score,
        }
    }
}

/// Nearest-neighbor lookup over product content embeddings.
///
/// Implementations must exclude `product_id` from its own results, return at
/// most `k` neighbors ordered by descending score, and answer identically for
/// repeated queries against the same snapshot. An unknown product is not an
/// error: it simply has no neighbors.
#[async_trait]
pub trait SimilarityIndex: Send + Sync {
    async fn nearest(&self, product_id: &str, k: usize) -> Result<Vec<Neighbor>>;
}

/// Order neighbors by score descending, then id ascending. NaN scores
/// sort after every real score.
pub fn sort_neighbors(neighbors: &mut [Neighbor]) {
    let key = |score: f64| if score.is_nan() { f64::NEG_INFINITY } else { score };
    neighbors.sort_by(|a, b| {
        key(b.score)
            .total_cmp(&key(a.score))
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
}
