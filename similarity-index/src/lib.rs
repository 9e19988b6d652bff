//! # Cobuy Similarity Index
//!
//! The content-similarity side of the recommender. Product embeddings are
//! produced and indexed elsewhere; this crate only defines the lookup
//! contract the recommender consumes, plus a few local implementations of it.
//!
//! ## Contract
//!
//! `nearest(product_id, k)` returns at most `k` neighbors ordered by score
//! (higher is more similar), never includes `product_id` itself, and is
//! idempotent for a fixed snapshot of the underlying store.
//!
//! ## Implementations
//!
//! - [`EmbeddingIndex`]: in-memory cosine search over product vectors, persisted as JSON
//! - [`NeighborTable`]: precomputed neighbor lists (offline snapshots, tests)
//! - [`TimeoutIndex`]: wraps any index with per-query timeouts and retries
//!
//! ## Example
//!
//! ```no_run
//! use cobuy_similarity_index::{EmbeddingIndex, SimilarityIndex};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let index = EmbeddingIndex::load(Path::new("data/embeddings.json")).await?;
//!     let neighbors = index.nearest("gid://shop/Product/1", 10).await?;
//!
//!     for n in neighbors {
//!         println!("{} ({:.3})", n.product_id, n.score);
//!     }
//!     Ok(())
//! }
//! ```

mod embedding_index;
mod error;
mod index;
mod outcome;
mod table;
mod timeout;

pub use embedding_index::{EmbeddingIndex, EmbeddingIndexConfig};
pub use error::{Result, SimilarityError};
pub use index::{Neighbor, SimilarityIndex, sort_neighbors};
pub use outcome::{SignalOutcome, SignalStatus, fetch_neighbors};
pub use table::NeighborTable;
pub use timeout::{TimeoutConfig, TimeoutIndex};
