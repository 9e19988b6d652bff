use crate::error::{InteractionError, Result};
use crate::event::InteractionLog;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Number of distinct users who touched both products of a pair.
///
/// Stored as a full square (both `a → b` and `b → a`) so a row lookup answers
/// every pair involving one product. The diagonal is always empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoOccurrenceTable {
    counts: BTreeMap<String, BTreeMap<String, u32>>,
}

impl CoOccurrenceTable {
    /// Count co-occurrences over every user's distinct product set
    pub fn build(log: &InteractionLog) -> Self {
        let mut counts: BTreeMap<String, BTreeMap<String, u32>> = BTreeMap::new();

        for (user, products) in log.products_by_user() {
            debug!("User {user} contributes {} products", products.len());
            for a in &products {
                for b in &products {
                    if a == b {
                        continue;
                    }
                    *counts
                        .entry((*a).to_string())
                        .or_default()
                        .entry((*b).to_string())
                        .or_default() += 1;
                }
            }
        }

        let table = Self { counts };
        info!(
            "Built co-occurrence table: {} products, {} pairs",
            table.len(),
            table.pair_count()
        );
        table
    }

    /// Co-occurrence count of `a` and `b`; zero when they never co-occur
    pub fn count(&self, a: &str, b: &str) -> u32 {
        self.counts
            .get(a)
            .and_then(|row| row.get(b))
            .copied()
            .unwrap_or(0)
    }

    pub fn row(&self, product_id: &str) -> Option<&BTreeMap<String, u32>> {
        self.counts.get(product_id)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, u32>)> {
        self.counts.iter()
    }

    /// Number of products with at least one co-occurring partner
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of unordered pairs with a non-zero count
    pub fn pair_count(&self) -> usize {
        self.counts.values().map(BTreeMap::len).sum::<usize>() / 2
    }

    /// Check the diagonal is empty and both directions agree
    pub fn validate(&self) -> Result<()> {
        for (a, row) in &self.counts {
            for (b, &forward) in row {
                if a == b {
                    return Err(InteractionError::SelfPair(a.clone()));
                }
                let backward = self.count(b, a);
                if forward != backward {
                    return Err(InteractionError::Asymmetric {
                        a: a.clone(),
                        b: b.clone(),
                        forward,
                        backward,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let table: Self = serde_json::from_str(&content)?;
        table.validate()?;
        Ok(table)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventType, InteractionEvent};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn log_of(pairs: &[(&str, &str)]) -> InteractionLog {
        InteractionLog::from_events(
            pairs
                .iter()
                .map(|(user, product)| InteractionEvent::new(*user, *product, EventType::View))
                .collect(),
        )
        .expect("valid log")
    }

    #[test]
    fn test_counts_distinct_users_per_pair() {
        let log = log_of(&[
            ("u1", "A"),
            ("u1", "B"),
            ("u1", "B"), // repeated touch earns no extra credit
            ("u2", "A"),
            ("u2", "B"),
            ("u3", "A"),
            ("u3", "C"),
        ]);

        let table = CoOccurrenceTable::build(&log);

        assert_eq!(table.count("A", "B"), 2);
        assert_eq!(table.count("B", "A"), 2);
        assert_eq!(table.count("A", "C"), 1);
        assert_eq!(table.count("B", "C"), 0);
        assert_eq!(table.pair_count(), 2);
    }

    #[test]
    fn test_never_counts_self() {
        let log = log_of(&[("u1", "A"), ("u1", "A"), ("u2", "A"), ("u2", "B")]);
        let table = CoOccurrenceTable::build(&log);

        assert_eq!(table.count("A", "A"), 0);
        assert!(table.validate().is_ok());
    }

    #[test]
    fn test_empty_log_gives_empty_table() {
        let table = CoOccurrenceTable::build(&InteractionLog::default());
        assert!(table.is_empty());
    }

    #[test]
    fn test_order_independent() {
        let forward = log_of(&[("u1", "A"), ("u1", "B"), ("u2", "B"), ("u2", "C")]);
        let reversed = log_of(&[("u2", "C"), ("u2", "B"), ("u1", "B"), ("u1", "A")]);

        assert_eq!(
            CoOccurrenceTable::build(&forward),
            CoOccurrenceTable::build(&reversed)
        );
    }

    #[test]
    fn test_load_rejects_asymmetric_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("co_occurrence.json");
        fs::write(&path, r#"{"A": {"B": 2}, "B": {"A": 1}}"#).expect("Failed to write");

        let result = CoOccurrenceTable::load(&path);
        assert!(matches!(result, Err(InteractionError::Asymmetric { .. })));
    }

    #[test]
    fn test_persistence() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("co_occurrence.json");
        let table = CoOccurrenceTable::build(&log_of(&[("u1", "A"), ("u1", "B")]));

        table.save(&path).expect("Failed to save");
        let loaded = CoOccurrenceTable::load(&path).expect("Failed to load");

        assert_eq!(loaded, table);
    }
}
