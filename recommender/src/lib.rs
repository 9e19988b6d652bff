//! # Cobuy Recommender
//!
//! Hybrid "customers also bought" recommendations: fuses lift over purchase
//! co-occurrence with content-embedding similarity into one ranked list per
//! catalog product.
//!
//! ## Pipeline
//!
//! For a target product `t`:
//!
//! 1. **Collaborative**: top `top_k_candidates` products by `lift(t, c)`
//! 2. **Content**: top `top_k_candidates` similarity neighbors of `t`
//! 3. **Enrichment**: top `top_m_enrichment` neighbors of every collaborative
//!    candidate, keeping the best similarity per product
//! 4. **Score**: `w_collab·lift + w_content·similarity + w_enrich·enrichment`
//! 5. **Rank**: score descending, id ascending, truncated to `top_n_recommendations`
//!
//! A signal that is missing or whose query failed contributes zero. Only an
//! id absent from the catalog is an error.
//!
//! ## Example
//!
//! ```no_run
//! use cobuy_interactions::InteractionLog;
//! use cobuy_recommender::{Catalog, Recommender, RecommenderConfig, RecommendationStore};
//! use cobuy_similarity_index::EmbeddingIndex;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let catalog = Catalog::load(Path::new("data/products.json"))?;
//!     let log = InteractionLog::load(Path::new("data/interactions.json"))?;
//!     let index = EmbeddingIndex::load(Path::new("data/embeddings.json")).await?;
//!
//!     let recommender = Recommender::from_interactions(
//!         catalog,
//!         &log,
//!         Arc::new(index),
//!         RecommenderConfig::default(),
//!     )?;
//!
//!     let batch = recommender.recommend_all().await;
//!     RecommendationStore::from_batch(&batch).save(Path::new("data/recommendations.json"))?;
//!     Ok(())
//! }
//! ```

mod candidates;
mod catalog;
mod config;
mod error;
mod rank;
mod recommender;
mod result;
mod scoring;
mod store;

pub use candidates::{CandidateGenerator, CandidatePool, CandidateScore};
pub use catalog::{Catalog, Product, Variant};
pub use config::RecommenderConfig;
pub use error::{RecommendError, Result};
pub use rank::rank;
pub use recommender::{BatchProgress, ProgressCallback, Recommender};
pub use result::{
    BatchResult, BatchSummary, CandidateStats, ComponentScores, ProductOutcome, Recommendation,
    RecommendationEntry,
};
pub use scoring::{HybridScorer, ScoreWeights};
pub use store::RecommendationStore;

pub use tokio_util::sync::CancellationToken;
