use crate::candidates::{CandidatePool, CandidateScore};
use crate::config::RecommenderConfig;
use crate::result::{ComponentScores, RecommendationEntry};

/// Weights of the three component signals; they need not sum to 1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub collaborative: f64,
    pub content: f64,
    pub enrichment: f64,
}

impl From<&RecommenderConfig> for ScoreWeights {
    fn from(config: &RecommenderConfig) -> Self {
        Self {
            collaborative: config.collaborative_weight,
            content: config.content_weight,
            enrichment: config.enrichment_weight,
        }
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self::from(&RecommenderConfig::default())
    }
}

/// Weighted linear blend of the component scores
#[derive(Debug, Clone, Copy, Default)]
pub struct HybridScorer {
    weights: ScoreWeights,
}

impl HybridScorer {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> ScoreWeights {
        self.weights
    }

    pub fn score(&self, candidate: &CandidateScore) -> f64 {
        self.weights.collaborative * candidate.collaborative
            + self.weights.content * candidate.content
            + self.weights.enrichment * candidate.enrichment
    }

    /// Score every candidate, keeping the breakdown next to the final score
    pub fn score_pool(&self, pool: &CandidatePool) -> Vec<RecommendationEntry> {
        pool.candidates
            .iter()
            .map(|(product_id, candidate)| RecommendationEntry {
                product_id: product_id.clone(),
                final_score: self.score(candidate),
                components: ComponentScores {
                    collaborative_score: candidate.collaborative,
                    content_score: candidate.content,
                    enrichment_score: candidate.enrichment,
                    collaborative_interactions: candidate.collaborative_interactions,
                },
            })
            .collect()
    }
}
