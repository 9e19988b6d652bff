use crate::catalog::Catalog;
use crate::config::RecommenderConfig;
use crate::result::CandidateStats;
use cobuy_interactions::{CoOccurrenceTable, LiftTable};
use cobuy_similarity_index::{Neighbor, SignalOutcome, SimilarityIndex, fetch_neighbors};
use futures::future::join_all;
use log::{debug, warn};
use std::collections::BTreeMap;

/// Raw component scores of one candidate.
///
/// A component the candidate was not found by stays at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CandidateScore {
    pub collaborative: f64,
    pub content: f64,
    pub enrichment: f64,
    pub collaborative_interactions: u32,
}

/// Deduplicated candidates for one target, keyed by candidate id
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    pub target: String,
    pub candidates: BTreeMap<String, CandidateScore>,
    pub stats: CandidateStats,
}

impl CandidatePool {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn get(&self, candidate: &str) -> Option<&CandidateScore> {
        self.candidates.get(candidate)
    }
}

/// Gathers collaborative, content and enrichment candidates for a target.
///
/// Issues one similarity query for the target (`top_k_candidates`) and one
/// per collaborative candidate (`top_m_enrichment`). Nothing is re-queried
/// later; scoring reads the pool built here.
pub struct CandidateGenerator<'a> {
    pub catalog: &'a Catalog,
    pub co_occurrence: &'a CoOccurrenceTable,
    pub lift: &'a LiftTable,
    pub index: &'a dyn SimilarityIndex,
    pub config: &'a RecommenderConfig,
}

impl CandidateGenerator<'_> {
    pub async fn generate(&self, target: &str) -> CandidatePool {
        let top_k = self.config.top_k_candidates;
        let top_m = self.config.top_m_enrichment;
        let mut candidates: BTreeMap<String, CandidateScore> = BTreeMap::new();
        let mut stats = CandidateStats::default();

        let collaborative = self.lift.top_candidates(target, top_k);
        stats.collaborative_candidates = collaborative.len();
        for (candidate, lift) in &collaborative {
            let entry = candidates.entry(candidate.clone()).or_default();
            entry.collaborative = *lift;
            entry.collaborative_interactions = self.co_occurrence.count(target, candidate);
        }

        let content = fetch_neighbors(self.index, target, top_k).await;
        stats.content_signal = content.status();
        if let SignalOutcome::Present(neighbors) = &content {
            stats.content_candidates = neighbors.len();
            for neighbor in neighbors {
                candidates
                    .entry(neighbor.product_id.clone())
                    .or_default()
                    .content = neighbor.score;
            }
        }

        let enrichment_queries = collaborative
            .iter()
            .map(|(candidate, _)| fetch_neighbors(self.index, candidate, top_m));
        let outcomes = join_all(enrichment_queries).await;

        let mut enrichment: BTreeMap<String, f64> = BTreeMap::new();
        for ((source, _), outcome) in collaborative.iter().zip(outcomes) {
            match outcome {
                SignalOutcome::Present(neighbors) => merge_max(&mut enrichment, neighbors),
                SignalOutcome::Absent => {}
                SignalOutcome::UpstreamError(detail) => {
                    warn!("Enrichment for {target} lost neighbors of {source}: {detail}");
                    stats.enrichment_upstream_errors += 1;
                }
            }
        }
        enrichment.remove(target);
        stats.enrichment_candidates = enrichment.len();
        for (candidate, score) in enrichment {
            candidates.entry(candidate).or_default().enrichment = score;
        }

        candidates.remove(target);

        if self.config.drop_unknown_candidates {
            let before = candidates.len();
            candidates.retain(|candidate, _| self.catalog.contains(candidate));
            stats.dropped_unknown = before - candidates.len();
            if stats.dropped_unknown > 0 {
                debug!(
                    "Dropped {} candidates of {target} missing from the catalog",
                    stats.dropped_unknown
                );
            }
        }

        stats.total_candidates = candidates.len();
        debug!(
            "Candidates for {target}: {} collaborative, {} content, {} enrichment, {} total",
            stats.collaborative_candidates,
            stats.content_candidates,
            stats.enrichment_candidates,
            stats.total_candidates
        );

        CandidatePool {
            target: target.to_string(),
            candidates,
            stats,
        }
    }
}

/// Keep the highest similarity seen for each neighbor
fn merge_max(merged: &mut BTreeMap<String, f64>, neighbors: Vec<Neighbor>) {
    for neighbor in neighbors {
        merged
            .entry(neighbor.product_id)
            .and_modify(|best| *best = best.max(neighbor.score))
            .or_insert(neighbor.score);
    }
}
