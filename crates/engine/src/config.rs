//! Engine configuration.
//!
//! Every knob has a default, so `EngineConfig::default()` is a complete
//! configuration. A JSON file may override any subset of fields.

use crate::error::{EngineError, Result};
use pipeline::NutritionPolicy;
use scorers::popularity::DEFAULT_POSITIVE_THRESHOLD;
use scorers::user_context::DEFAULT_MEALS_PER_DAY;
use scorers::{ScorerKind, SvdConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ratings strictly above this count toward popularity
    pub positive_threshold: f64,

    /// Truncated SVD settings for the collaborative scorer
    pub svd: SvdConfig,

    /// Minimum document frequency, as a proportion of recipes
    pub min_df: f64,
    /// Maximum document frequency, as a proportion of recipes
    pub max_df: f64,
    /// Word n-gram range (inclusive)
    pub ngram_range: (usize, usize),

    /// Daily budget is split evenly across this many meals
    pub meals_per_day: u32,

    /// Nutrition policy applied when a request does not pick one
    pub default_policy: NutritionPolicy,
    pub default_top_n: usize,

    /// Hybrid sources, most significant first
    pub hybrid_sources: Vec<ScorerKind>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            positive_threshold: DEFAULT_POSITIVE_THRESHOLD,
            svd: SvdConfig::default(),
            min_df: 0.01,
            max_df: 0.8,
            ngram_range: (1, 3),
            meals_per_day: DEFAULT_MEALS_PER_DAY,
            default_policy: NutritionPolicy::quota(),
            default_top_n: 10,
            hybrid_sources: vec![ScorerKind::Content, ScorerKind::Popularity],
        }
    }
}

impl EngineConfig {
    /// Read a (possibly partial) config from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: EngineConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_positive_threshold(mut self, threshold: f64) -> Self {
        self.positive_threshold = threshold;
        self
    }

    pub fn with_svd(mut self, svd: SvdConfig) -> Self {
        self.svd = svd;
        self
    }

    pub fn with_document_frequency(mut self, min_df: f64, max_df: f64) -> Self {
        self.min_df = min_df;
        self.max_df = max_df;
        self
    }

    pub fn with_meals_per_day(mut self, meals: u32) -> Self {
        self.meals_per_day = meals;
        self
    }

    pub fn with_default_policy(mut self, policy: NutritionPolicy) -> Self {
        self.default_policy = policy;
        self
    }

    pub fn with_hybrid_sources(mut self, sources: Vec<ScorerKind>) -> Self {
        self.hybrid_sources = sources;
        self
    }

    /// Check the settings that would otherwise fail deep inside a scorer
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(EngineError::InvalidConfig(msg));

        if !self.positive_threshold.is_finite() {
            return invalid(format!("positive_threshold {} is not finite", self.positive_threshold));
        }
        if !(0.0..=1.0).contains(&self.min_df) || !(0.0..=1.0).contains(&self.max_df) {
            return invalid(format!(
                "document frequency bounds must lie in [0, 1], got min_df={} max_df={}",
                self.min_df, self.max_df
            ));
        }
        if self.min_df > self.max_df {
            return invalid(format!("min_df {} exceeds max_df {}", self.min_df, self.max_df));
        }
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return invalid(format!("invalid n-gram range ({}, {})", min_n, max_n));
        }
        if self.meals_per_day == 0 {
            return invalid("meals_per_day must be at least 1".to_string());
        }
        if self.hybrid_sources.is_empty() {
            return invalid("hybrid_sources is empty".to_string());
        }
        if self.hybrid_sources.contains(&ScorerKind::Hybrid) {
            return invalid("hybrid_sources cannot contain Hybrid".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.svd.rank, 100);
        assert_eq!(config.meals_per_day, 3);
        assert_eq!(config.hybrid_sources, vec![ScorerKind::Content, ScorerKind::Popularity]);
    }

    #[test]
    fn test_validation_failures() {
        let bad = [
            EngineConfig::default().with_document_frequency(0.9, 0.1),
            EngineConfig::default().with_document_frequency(-0.1, 0.8),
            EngineConfig::default().with_meals_per_day(0),
            EngineConfig::default().with_hybrid_sources(vec![]),
            EngineConfig::default().with_hybrid_sources(vec![ScorerKind::Hybrid]),
            EngineConfig::default().with_positive_threshold(f64::NAN),
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_partial_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "meals_per_day": 4, "svd": {{ "rank": 8 }} }}"#).unwrap();

        let config = EngineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.meals_per_day, 4);
        assert_eq!(config.svd.rank, 8);
        assert_eq!(config.svd.seed, 42);
        assert_eq!(config.max_df, 0.8);
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::from_json_file(Path::new("/nonexistent/engine.json")).unwrap_err();
        assert!(matches!(err, EngineError::Io { .. }));
    }
}
