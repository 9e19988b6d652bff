use crate::error::Result;
use crate::result::{BatchResult, ProductOutcome, Recommendation};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Persisted output of the last batch run, keyed by product id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationStore {
    /// Version of the file format
    pub version: u32,

    /// When the batch that produced this store finished
    pub generated_at: Option<DateTime<Utc>>,

    pub products: BTreeMap<String, ProductOutcome>,
}

#[derive(Deserialize)]
struct VersionProbe {
    #[serde(default)]
    version: u32,
}

impl Default for RecommendationStore {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            generated_at: None,
            products: BTreeMap::new(),
        }
    }
}

impl RecommendationStore {
    pub const CURRENT_VERSION: u32 = 1;
    pub const FILENAME: &'static str = "recommendations.json";

    /// Snapshot a finished batch
    pub fn from_batch(batch: &BatchResult) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            generated_at: Some(Utc::now()),
            products: batch.outcomes.clone(),
        }
    }

    /// Load from disk.
    ///
    /// A missing file or a file from another format version yields an
    /// empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let probe: VersionProbe = serde_json::from_str(&content)?;
        if probe.version != Self::CURRENT_VERSION {
            warn!(
                "Recommendation store version mismatch: {} vs {}. Ignoring {}",
                probe.version,
                Self::CURRENT_VERSION,
                path.display()
            );
            return Ok(Self::default());
        }

        Ok(serde_json::from_str(&content)?)
    }

    /// Replace the file on disk with this store
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!(
            "Saved recommendations for {} products to {}",
            self.products.len(),
            path.display()
        );

        Ok(())
    }

    pub fn get(&self, product_id: &str) -> Option<&ProductOutcome> {
        self.products.get(product_id)
    }

    /// Stored recommendation, if the product succeeded in the last run
    pub fn recommendation(&self, product_id: &str) -> Option<&Recommendation> {
        self.get(product_id).and_then(ProductOutcome::recommendation)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Products whose last computation failed
    pub fn failed_count(&self) -> usize {
        self.products.values().filter(|o| o.is_failed()).count()
    }
}
