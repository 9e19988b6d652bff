// In-memory stand-in for the external vector service. Vectors are produced
// upstream; this index only stores and compares them.

use crate::error::{Result, SimilarityError};
use crate::index::{Neighbor, SimilarityIndex, sort_neighbors};
use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Configuration for the embedding index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingIndexConfig {
    /// Dimension of the embeddings. `None` adopts the first inserted vector's.
    #[serde(default)]
    pub dimension: Option<usize>,

    /// Minimum cosine similarity for a neighbor to be returned
    #[serde(default)]
    pub min_score: Option<f64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredEmbeddings {
    #[serde(default)]
    config: EmbeddingIndexConfig,
    vectors: BTreeMap<String, Vec<f32>>,
}

/// Brute-force cosine similarity index over product embeddings
#[derive(Debug, Default)]
pub struct EmbeddingIndex {
    config: EmbeddingIndexConfig,
    vectors: BTreeMap<String, Vec<f32>>,
}

impl EmbeddingIndex {
    pub fn new() -> Self {
        Self::with_config(EmbeddingIndexConfig::default())
    }

    pub fn with_config(config: EmbeddingIndexConfig) -> Self {
        Self {
            config,
            vectors: BTreeMap::new(),
        }
    }

    /// Load an index previously written with [`EmbeddingIndex::save`]
    pub async fn load(path: &Path) -> Result<Self> {
        info!("Loading embedding index from {}", path.display());

        let content = tokio::fs::read(path).await?;
        let stored: StoredEmbeddings = serde_json::from_slice(&content)?;

        let mut index = Self::with_config(stored.config);
        for (product_id, vector) in stored.vectors {
            index.insert(product_id, vector)?;
        }

        info!("Embedding index loaded with {} products", index.len());
        Ok(index)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let stored = StoredEmbeddings {
            config: self.config.clone(),
            vectors: self.vectors.clone(),
        };
        let content = serde_json::to_vec(&stored)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Add or replace a product's embedding
    pub fn insert(&mut self, product_id: impl Into<String>, vector: Vec<f32>) -> Result<()> {
        let product_id = product_id.into();

        if vector.is_empty() {
            return Err(SimilarityError::InvalidQuery(format!(
                "empty embedding for {product_id}"
            )));
        }

        match self.config.dimension {
            Some(expected) if expected != vector.len() => {
                return Err(SimilarityError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
            Some(_) => {}
            None => self.config.dimension = Some(vector.len()),
        }

        self.vectors.insert(product_id, vector);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.vectors.contains_key(product_id)
    }

    pub fn config(&self) -> &EmbeddingIndexConfig {
        &self.config
    }
}

#[async_trait]
impl SimilarityIndex for EmbeddingIndex {
    async fn nearest(&self, product_id: &str, k: usize) -> Result<Vec<Neighbor>> {
        let Some(query) = self.vectors.get(product_id) else {
            debug!("Product {product_id} has no embedding");
            return Ok(Vec::new());
        };

        let min_score = self.config.min_score.unwrap_or(f64::NEG_INFINITY);
        let mut neighbors: Vec<Neighbor> = self
            .vectors
            .iter()
            .filter(|(id, _)| id.as_str() != product_id)
            .map(|(id, vector)| Neighbor::new(id.clone(), cosine_similarity(query, vector)))
            .filter(|n| n.score >= min_score)
            .collect();

        sort_neighbors(&mut neighbors);
        neighbors.truncate(k);

        debug!("Found {} neighbors for {product_id}", neighbors.len());
        Ok(neighbors)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum();
    let mag_a: f64 = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}
