use cobuy_similarity_index::SignalStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw signals behind one recommended product
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    /// Lift of the candidate given the target
    pub collaborative_score: f64,

    /// Similarity of the candidate to the target
    pub content_score: f64,

    /// Best similarity of the candidate to any collaborative candidate
    pub enrichment_score: f64,

    /// Distinct users who touched both target and candidate
    pub collaborative_interactions: u32,
}

/// A single ranked recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationEntry {
    pub product_id: String,

    /// Weighted sum of the component scores
    pub final_score: f64,

    pub components: ComponentScores,
}

/// How the candidate pool for one target was assembled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateStats {
    pub collaborative_candidates: usize,
    pub content_candidates: usize,
    pub enrichment_candidates: usize,

    /// Size of the deduplicated pool that was scored
    pub total_candidates: usize,

    /// Candidates dropped because the catalog does not know them
    pub dropped_unknown: usize,

    /// State of the similarity query for the target itself
    pub content_signal: SignalStatus,

    /// Enrichment queries that failed upstream
    pub enrichment_upstream_errors: usize,
}

impl Default for CandidateStats {
    fn default() -> Self {
        Self {
            collaborative_candidates: 0,
            content_candidates: 0,
            enrichment_candidates: 0,
            total_candidates: 0,
            dropped_unknown: 0,
            content_signal: SignalStatus::Absent,
            enrichment_upstream_errors: 0,
        }
    }
}

/// Ranked recommendations for one target product.
///
/// Immutable once produced; a later run replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub target_product_id: String,

    /// Best first, at most `top_n_recommendations` long
    pub recommendations: Vec<RecommendationEntry>,

    pub stats: CandidateStats,
}

impl Recommendation {
    pub fn len(&self) -> usize {
        self.recommendations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }

    pub fn product_ids(&self) -> Vec<&str> {
        self.recommendations
            .iter()
            .map(|entry| entry.product_id.as_str())
            .collect()
    }
}

/// Outcome of computing one product during a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProductOutcome {
    Recommended(Recommendation),
    Failed { error: String },
}

impl ProductOutcome {
    pub fn recommendation(&self) -> Option<&Recommendation> {
        match self {
            ProductOutcome::Recommended(recommendation) => Some(recommendation),
            ProductOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ProductOutcome::Failed { .. })
    }
}

/// Counts for a batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Products whose computation was started
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,

    /// Products never started because the run was cancelled
    pub skipped: usize,

    pub cancelled: bool,
}

/// Every product's outcome plus the run summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResult {
    pub outcomes: BTreeMap<String, ProductOutcome>,
    pub summary: BatchSummary,
}

impl BatchResult {
    pub fn recommendation(&self, product_id: &str) -> Option<&Recommendation> {
        self.outcomes
            .get(product_id)
            .and_then(ProductOutcome::recommendation)
    }

    /// Ids of products whose computation failed
    pub fn failed_ids(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_failed())
            .map(|(id, _)| id.as_str())
            .collect()
    }
}
