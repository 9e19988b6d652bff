use crate::cooccurrence::CoOccurrenceTable;
use crate::error::Result;
use crate::event::InteractionLog;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Lift of every co-occurring product pair.
///
/// `lift(a, b) = P(a,b) / (P(a)·P(b))` with probabilities taken over distinct
/// users. Pairs that never co-occur, or whose marginals are zero, score 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiftTable {
    /// Distinct users in the log the table was computed from
    pub total_users: usize,

    /// Distinct users per product
    pub frequencies: BTreeMap<String, usize>,

    /// product → candidate → lift
    pub scores: BTreeMap<String, BTreeMap<String, f64>>,
}

impl LiftTable {
    pub fn compute(co_occurrence: &CoOccurrenceTable, log: &InteractionLog) -> Self {
        let total_users = log.total_users();
        let frequencies = log.product_frequencies();
        let mut scores: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();

        if total_users == 0 {
            return Self::default();
        }

        let total = total_users as f64;
        for (a, row) in co_occurrence.rows() {
            let lifts = scores.entry(a.clone()).or_default();
            let p_a = frequencies.get(a).copied().unwrap_or(0) as f64 / total;

            for (b, &count) in row {
                let p_b = frequencies.get(b).copied().unwrap_or(0) as f64 / total;
                let p_ab = f64::from(count) / total;

                let lift = if p_a > 0.0 && p_b > 0.0 {
                    p_ab / (p_a * p_b)
                } else {
                    0.0
                };
                lifts.insert(b.clone(), lift);
            }
        }

        info!(
            "Computed lift scores for {} products over {total_users} users",
            scores.len()
        );

        Self {
            total_users,
            frequencies,
            scores,
        }
    }

    /// Lift of `candidate` given `product`; zero when unknown
    pub fn lift(&self, product: &str, candidate: &str) -> f64 {
        self.scores
            .get(product)
            .and_then(|row| row.get(candidate))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn row(&self, product: &str) -> Option<&BTreeMap<String, f64>> {
        self.scores.get(product)
    }

    /// Highest-lift candidates for `product`, ties broken by id ascending
    pub fn top_candidates(&self, product: &str, k: usize) -> Vec<(String, f64)> {
        let Some(row) = self.scores.get(product) else {
            return Vec::new();
        };

        let mut ranked: Vec<(String, f64)> = row
            .iter()
            .filter(|(candidate, _)| candidate.as_str() != product)
            .map(|(candidate, lift)| (candidate.clone(), *lift))
            .collect();

        let key = |lift: f64| if lift.is_nan() { f64::NEG_INFINITY } else { lift };
        ranked.sort_by(|a, b| key(b.1).total_cmp(&key(a.1)).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(k);
        ranked
    }

    pub fn frequency(&self, product: &str) -> usize {
        self.frequencies.get(product).copied().unwrap_or(0)
    }

    /// Number of products with a lift row
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
