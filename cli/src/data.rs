use anyhow::{Context, Result};
use cobuy_interactions::{CoOccurrenceTable, InteractionLog, LiftTable};
use cobuy_recommender::{Catalog, RecommendationStore};
use cobuy_similarity_index::{
    EmbeddingIndex, NeighborTable, SimilarityIndex, TimeoutConfig, TimeoutIndex,
};
use log::{info, warn};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const PRODUCTS_FILE: &str = "products.json";
pub const INTERACTIONS_FILE: &str = "interactions.json";
pub const CO_OCCURRENCE_FILE: &str = "co_occurrence.json";
pub const LIFT_SCORES_FILE: &str = "lift_scores.json";
pub const NEIGHBORS_FILE: &str = "neighbors.json";
pub const EMBEDDINGS_FILE: &str = "embeddings.json";

/// Well-known files inside the data directory
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

/// Where similarity answers come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexSource {
    Neighbors(usize),
    Embeddings(usize),
    Missing,
}

impl fmt::Display for IndexSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexSource::Neighbors(n) => write!(f, "{NEIGHBORS_FILE} ({n} products)"),
            IndexSource::Embeddings(n) => write!(f, "{EMBEDDINGS_FILE} ({n} vectors)"),
            IndexSource::Missing => write!(f, "none"),
        }
    }
}

/// Tables rebuilt from the current interaction log
pub struct BuiltTables {
    pub interactions: usize,
    pub co_occurrence: CoOccurrenceTable,
    pub lift: LiftTable,
}

pub struct LoadedIndex {
    pub index: Arc<dyn SimilarityIndex>,
    pub source: IndexSource,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn products(&self) -> PathBuf {
        self.root.join(PRODUCTS_FILE)
    }

    pub fn interactions(&self) -> PathBuf {
        self.root.join(INTERACTIONS_FILE)
    }

    pub fn co_occurrence(&self) -> PathBuf {
        self.root.join(CO_OCCURRENCE_FILE)
    }

    pub fn lift_scores(&self) -> PathBuf {
        self.root.join(LIFT_SCORES_FILE)
    }

    pub fn recommendations(&self) -> PathBuf {
        self.root.join(RecommendationStore::FILENAME)
    }

    pub fn neighbors(&self) -> PathBuf {
        self.root.join(NEIGHBORS_FILE)
    }

    pub fn embeddings(&self) -> PathBuf {
        self.root.join(EMBEDDINGS_FILE)
    }

    pub fn load_catalog(&self) -> Result<Catalog> {
        let path = self.products();
        Catalog::load(&path)
            .with_context(|| format!("Failed to load catalog from {}", path.display()))
    }

    pub fn load_interactions(&self) -> Result<InteractionLog> {
        let path = self.interactions();
        InteractionLog::load(&path)
            .with_context(|| format!("Failed to load interactions from {}", path.display()))
    }

    pub fn load_store(&self) -> Result<RecommendationStore> {
        let path = self.recommendations();
        RecommendationStore::load(&path).with_context(|| {
            format!(
                "Failed to read stored recommendations from {}",
                path.display()
            )
        })
    }

    /// Saved tables when both files exist, otherwise rebuilt from the log
    pub fn load_tables(&self) -> Result<(CoOccurrenceTable, LiftTable)> {
        let co_path = self.co_occurrence();
        let lift_path = self.lift_scores();

        if co_path.exists() && lift_path.exists() {
            let co_occurrence = CoOccurrenceTable::load(&co_path)
                .with_context(|| format!("Failed to load {}", co_path.display()))?;
            let lift = LiftTable::load(&lift_path)
                .with_context(|| format!("Failed to load {}", lift_path.display()))?;
            return Ok((co_occurrence, lift));
        }

        info!(
            "No saved tables in {}, building from interactions",
            self.root.display()
        );
        let log = self.load_interactions()?;
        let co_occurrence = CoOccurrenceTable::build(&log);
        let lift = LiftTable::compute(&co_occurrence, &log);
        Ok((co_occurrence, lift))
    }

    /// Rebuild both tables from interactions.json and save them
    pub fn rebuild_tables(&self) -> Result<BuiltTables> {
        let log = self.load_interactions()?;
        let co_occurrence = CoOccurrenceTable::build(&log);
        let lift = LiftTable::compute(&co_occurrence, &log);

        let co_path = self.co_occurrence();
        co_occurrence
            .save(&co_path)
            .with_context(|| format!("Failed to save {}", co_path.display()))?;
        let lift_path = self.lift_scores();
        lift.save(&lift_path)
            .with_context(|| format!("Failed to save {}", lift_path.display()))?;

        Ok(BuiltTables {
            interactions: log.len(),
            co_occurrence,
            lift,
        })
    }

    /// Precomputed neighbors win over embeddings. Without either, content
    /// and enrichment signals are absent for every product.
    pub async fn load_index(&self, timeout: TimeoutConfig) -> Result<LoadedIndex> {
        let neighbors_path = self.neighbors();
        if neighbors_path.exists() {
            let table = NeighborTable::load(&neighbors_path)
                .await
                .with_context(|| format!("Failed to load {}", neighbors_path.display()))?;
            let source = IndexSource::Neighbors(table.len());
            return Ok(LoadedIndex {
                index: Arc::new(TimeoutIndex::new(table, timeout)),
                source,
            });
        }

        let embeddings_path = self.embeddings();
        if embeddings_path.exists() {
            let index = EmbeddingIndex::load(&embeddings_path)
                .await
                .with_context(|| format!("Failed to load {}", embeddings_path.display()))?;
            let source = IndexSource::Embeddings(index.len());
            return Ok(LoadedIndex {
                index: Arc::new(TimeoutIndex::new(index, timeout)),
                source,
            });
        }

        warn!(
            "No {NEIGHBORS_FILE} or {EMBEDDINGS_FILE} in {}; similarity signals will be absent",
            self.root.display()
        );
        Ok(LoadedIndex {
            index: Arc::new(NeighborTable::new()),
            source: IndexSource::Missing,
        })
    }
}
