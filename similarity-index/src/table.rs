use crate::error::Result;
use crate::index::{Neighbor, SimilarityIndex, sort_neighbors};
use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Precomputed neighbor lists keyed by product id.
///
/// Useful as an offline snapshot of the vector service, and in tests where
/// exact scores matter. Lists are normalized on insert, so queries only slice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NeighborTable {
    rows: BTreeMap<String, Vec<Neighbor>>,
}

impl NeighborTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the neighbors of `product_id`, dropping self-references
    pub fn insert(&mut self, product_id: impl Into<String>, neighbors: Vec<Neighbor>) {
        let product_id = product_id.into();
        let mut neighbors: Vec<Neighbor> = neighbors
            .into_iter()
            .filter(|n| n.product_id != product_id)
            .collect();
        sort_neighbors(&mut neighbors);
        self.rows.insert(product_id, neighbors);
    }

    /// Builder-style [`NeighborTable::insert`] over `(id, score)` pairs
    pub fn with_row(mut self, product_id: &str, neighbors: &[(&str, f64)]) -> Self {
        let neighbors = neighbors
            .iter()
            .map(|(id, score)| Neighbor::new(*id, *score))
            .collect();
        self.insert(product_id, neighbors);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read(path).await?;
        let raw: BTreeMap<String, Vec<Neighbor>> = serde_json::from_slice(&content)?;

        let mut table = Self::new();
        for (product_id, neighbors) in raw {
            table.insert(product_id, neighbors);
        }

        info!(
            "Loaded neighbor table with {} products from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl SimilarityIndex for NeighborTable {
    async fn nearest(&self, product_id: &str, k: usize) -> Result<Vec<Neighbor>> {
        Ok(self
            .rows
            .get(product_id)
            .map(|row| row.iter().take(k).cloned().collect())
            .unwrap_or_default())
    }
}
