use crate::error::{RecommendError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::Semaphore;

/// Configuration for the hybrid recommender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommenderConfig {
    /// Weight of the lift-based collaborative signal
    #[serde(default = "default_collaborative_weight")]
    pub collaborative_weight: f64,

    /// Weight of the target's own embedding similarity
    #[serde(default = "default_content_weight")]
    pub content_weight: f64,

    /// Weight of similarity to the collaborative candidates
    #[serde(default = "default_enrichment_weight")]
    pub enrichment_weight: f64,

    /// Length of each recommendation list
    #[serde(default = "default_top_n_recommendations")]
    pub top_n_recommendations: usize,

    /// Collaborative and content candidates taken per target
    #[serde(default = "default_top_k_candidates")]
    pub top_k_candidates: usize,

    /// Neighbors taken per collaborative candidate during enrichment
    #[serde(default = "default_top_m_enrichment")]
    pub top_m_enrichment: usize,

    /// Products computed concurrently during a batch run
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Drop candidates that are not in the catalog before scoring
    #[serde(default = "default_true")]
    pub drop_unknown_candidates: bool,
}

fn default_collaborative_weight() -> f64 {
    0.4
}

fn default_content_weight() -> f64 {
    0.4
}

fn default_enrichment_weight() -> f64 {
    0.2
}

fn default_top_n_recommendations() -> usize {
    5
}

fn default_top_k_candidates() -> usize {
    10
}

fn default_top_m_enrichment() -> usize {
    5
}

fn default_max_concurrent() -> usize {
    num_cpus::get()
}

fn default_true() -> bool {
    true
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            collaborative_weight: default_collaborative_weight(),
            content_weight: default_content_weight(),
            enrichment_weight: default_enrichment_weight(),
            top_n_recommendations: default_top_n_recommendations(),
            top_k_candidates: default_top_k_candidates(),
            top_m_enrichment: default_top_m_enrichment(),
            max_concurrent: default_max_concurrent(),
            drop_unknown_candidates: true,
        }
    }
}

impl RecommenderConfig {
    /// Validate configuration.
    ///
    /// Weights must be finite and non-negative but need not sum to 1.0.
    pub fn validate(&self) -> std::result::Result<(), String> {
        for (name, weight) in [
            ("collaborative_weight", self.collaborative_weight),
            ("content_weight", self.content_weight),
            ("enrichment_weight", self.enrichment_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(format!("{name} must be a finite value >= 0, got {weight}"));
            }
        }

        if self.top_n_recommendations == 0 {
            return Err("top_n_recommendations must be > 0".to_string());
        }

        if self.top_k_candidates == 0 {
            return Err("top_k_candidates must be > 0".to_string());
        }

        if self.top_m_enrichment == 0 {
            return Err("top_m_enrichment must be > 0".to_string());
        }

        if self.max_concurrent == 0 {
            return Err("max_concurrent must be > 0".to_string());
        }

        if self.max_concurrent > Semaphore::MAX_PERMITS {
            return Err(format!(
                "max_concurrent must be <= {}, got {}",
                Semaphore::MAX_PERMITS,
                self.max_concurrent
            ));
        }

        Ok(())
    }

    /// Load from a TOML file; missing keys take their defaults
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            RecommendError::InvalidConfig(format!("{}: {e}", path.display()))
        })?;
        config.validate().map_err(RecommendError::InvalidConfig)?;
        Ok(config)
    }

    /// Only the purchase signal
    pub fn collaborative_only() -> Self {
        Self {
            collaborative_weight: 1.0,
            content_weight: 0.0,
            enrichment_weight: 0.0,
            ..Default::default()
        }
    }

    /// Only embedding similarity of the target itself
    pub fn content_only() -> Self {
        Self {
            collaborative_weight: 0.0,
            content_weight: 1.0,
            enrichment_weight: 0.0,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_valid() {
        let config = RecommenderConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.max_concurrent > 0);
    }

    #[test]
    fn test_weights_need_not_sum_to_one() {
        let config = RecommenderConfig {
            collaborative_weight: 3.0,
            content_weight: 2.0,
            enrichment_weight: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_weight_validation() {
        let mut config = RecommenderConfig::default();
        config.content_weight = -0.1;
        assert!(config.validate().is_err());

        config.content_weight = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_size_validation() {
        let mut config = RecommenderConfig::default();
        config.top_n_recommendations = 0;
        assert!(config.validate().is_err());

        let mut config = RecommenderConfig::default();
        config.top_m_enrichment = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_concurrent_bounded_by_semaphore() {
        let mut config = RecommenderConfig::default();
        config.max_concurrent = usize::MAX;
        let err = config.validate().unwrap_err();
        assert!(err.contains("max_concurrent must be <="), "{err}");

        config.max_concurrent = Semaphore::MAX_PERMITS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_preset_configs() {
        assert!(RecommenderConfig::collaborative_only().validate().is_ok());
        assert!(RecommenderConfig::content_only().validate().is_ok());
    }

    #[test]
    fn test_toml_partial_override() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("cobuy.toml");
        std::fs::write(&path, "content_weight = 0.7\ntop_n_recommendations = 3\n")
            .expect("Failed to write");

        let config = RecommenderConfig::from_toml_file(&path).expect("Failed to load");

        assert_eq!(config.content_weight, 0.7);
        assert_eq!(config.top_n_recommendations, 3);
        assert_eq!(config.collaborative_weight, 0.4);
        assert_eq!(config.top_k_candidates, 10);
    }

    #[test]
    fn test_toml_invalid_values_rejected() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("cobuy.toml");
        std::fs::write(&path, "top_k_candidates = 0\n").expect("Failed to write");

        let result = RecommenderConfig::from_toml_file(&path);
        assert!(matches!(result, Err(RecommendError::InvalidConfig(_))));
    }
}
