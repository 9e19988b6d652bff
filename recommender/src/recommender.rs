use crate::candidates::CandidateGenerator;
use crate::catalog::Catalog;
use crate::config::RecommenderConfig;
use crate::error::{RecommendError, Result};
use crate::rank::rank;
use crate::result::{BatchResult, BatchSummary, ProductOutcome, Recommendation};
use crate::scoring::{HybridScorer, ScoreWeights};
use cobuy_interactions::{CoOccurrenceTable, InteractionLog, LiftTable};
use cobuy_similarity_index::SimilarityIndex;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Progress callback for batch runs
pub type ProgressCallback = Arc<dyn Fn(BatchProgress) + Send + Sync>;

/// Reported once per finished product
#[derive(Debug, Clone)]
pub struct BatchProgress {
    pub current: usize,
    pub total: usize,
    pub product_id: String,
}

/// Hybrid co-purchase and similarity recommender.
///
/// Holds one read-only snapshot of catalog, interaction tables and
/// similarity index. Cloning is cheap and clones share the snapshot.
#[derive(Clone)]
pub struct Recommender {
    catalog: Arc<Catalog>,
    co_occurrence: Arc<CoOccurrenceTable>,
    lift: Arc<LiftTable>,
    index: Arc<dyn SimilarityIndex>,
    config: Arc<RecommenderConfig>,
    scorer: HybridScorer,
    progress: Option<ProgressCallback>,
}

impl Recommender {
    pub fn new(
        catalog: Catalog,
        co_occurrence: CoOccurrenceTable,
        lift: LiftTable,
        index: Arc<dyn SimilarityIndex>,
        config: RecommenderConfig,
    ) -> Result<Self> {
        config.validate().map_err(RecommendError::InvalidConfig)?;

        let scorer = HybridScorer::new(ScoreWeights::from(&config));
        Ok(Self {
            catalog: Arc::new(catalog),
            co_occurrence: Arc::new(co_occurrence),
            lift: Arc::new(lift),
            index,
            config: Arc::new(config),
            scorer,
            progress: None,
        })
    }

    /// Build the co-occurrence and lift tables from `log`, then construct
    pub fn from_interactions(
        catalog: Catalog,
        log: &InteractionLog,
        index: Arc<dyn SimilarityIndex>,
        config: RecommenderConfig,
    ) -> Result<Self> {
        let co_occurrence = CoOccurrenceTable::build(log);
        let lift = LiftTable::compute(&co_occurrence, log);
        Self::new(catalog, co_occurrence, lift, index, config)
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn co_occurrence(&self) -> &CoOccurrenceTable {
        &self.co_occurrence
    }

    pub fn lift(&self) -> &LiftTable {
        &self.lift
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    /// Compute the ranked recommendations for one catalog product.
    ///
    /// Missing or failing signals shrink the list; only an id absent from
    /// the catalog is an error.
    pub async fn recommend_for(&self, product_id: &str) -> Result<Recommendation> {
        if !self.catalog.contains(product_id) {
            return Err(RecommendError::NotFound(product_id.to_string()));
        }

        let generator = CandidateGenerator {
            catalog: &self.catalog,
            co_occurrence: &self.co_occurrence,
            lift: &self.lift,
            index: self.index.as_ref(),
            config: &self.config,
        };
        let pool = generator.generate(product_id).await;

        let entries = self.scorer.score_pool(&pool);
        let recommendations = rank(entries, self.config.top_n_recommendations);
        debug!(
            "Ranked {} of {} candidates for {product_id}",
            recommendations.len(),
            pool.len()
        );

        Ok(Recommendation {
            target_product_id: product_id.to_string(),
            recommendations,
            stats: pool.stats,
        })
    }

    /// Compute recommendations for every catalog product
    pub async fn recommend_all(&self) -> BatchResult {
        self.recommend_all_with_cancel(CancellationToken::new())
            .await
    }

    /// Like [`Recommender::recommend_all`], stopping early once `cancel` fires.
    ///
    /// Products already started run to completion and keep their outcome;
    /// the rest are counted as skipped.
    pub async fn recommend_all_with_cancel(&self, cancel: CancellationToken) -> BatchResult {
        let total = self.catalog.len();
        if total == 0 {
            info!("Catalog is empty, nothing to recommend");
            return BatchResult::default();
        }

        info!(
            "Computing recommendations for {total} products ({} concurrent)",
            self.config.max_concurrent
        );

        let mut summary = BatchSummary::default();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent));
        let mut tasks = Vec::with_capacity(total);

        for product_id in self.catalog.ids() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    summary.cancelled = true;
                    break;
                }
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(e) => {
                        warn!("Semaphore closed before {product_id} could start: {e}");
                        break;
                    }
                },
            };

            let recommender = self.clone();
            let id = product_id.to_string();
            let task = tokio::spawn(async move {
                let result = recommender.recommend_for(&id).await;
                drop(permit);
                result
            });

            tasks.push((product_id.to_string(), task));
        }

        summary.attempted = tasks.len();
        summary.skipped = total - summary.attempted;
        if summary.cancelled {
            info!(
                "Batch cancelled after starting {} of {total} products",
                summary.attempted
            );
        }

        let mut outcomes = BTreeMap::new();
        for (idx, (product_id, task)) in tasks.into_iter().enumerate() {
            let outcome = match task.await {
                Ok(Ok(recommendation)) => {
                    summary.succeeded += 1;
                    ProductOutcome::Recommended(recommendation)
                }
                Ok(Err(e)) => {
                    warn!("Recommendation for {product_id} failed: {e}");
                    summary.failed += 1;
                    ProductOutcome::Failed {
                        error: e.to_string(),
                    }
                }
                Err(e) => {
                    let e = RecommendError::Task(e.to_string());
                    warn!("Recommendation for {product_id} failed: {e}");
                    summary.failed += 1;
                    ProductOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };

            self.report_progress(idx + 1, summary.attempted, &product_id);
            outcomes.insert(product_id, outcome);
        }

        info!(
            "Batch complete: {} attempted, {} succeeded, {} failed, {} skipped",
            summary.attempted, summary.succeeded, summary.failed, summary.skipped
        );

        BatchResult { outcomes, summary }
    }

    fn report_progress(&self, current: usize, total: usize, product_id: &str) {
        if let Some(cb) = &self.progress {
            cb(BatchProgress {
                current,
                total,
                product_id: product_id.to_string(),
            });
        }
    }
}
