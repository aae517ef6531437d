//! Configuration for the comparison engine.
//!
//! `CompareConfig` centralizes the thresholds and behavioral knobs so no
//! algorithm constant is hardcoded at a call site. Out-of-range values never
//! abort a comparison: the engine clamps them to the nearest valid value via
//! [`CompareConfig::sanitized`] and degrades diff quality instead of failing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub(crate) const DEFAULT_MOVE_SIMILARITY: f64 = 0.8;
pub(crate) const DEFAULT_MOVE_MIN_WORDS: u32 = 3;
pub(crate) const DEFAULT_MIN_MATCH_LENGTH: u32 = 3;
pub(crate) const DEFAULT_MAX_REFINE_DEPTH: u32 = 2;
pub(crate) const DEFAULT_LCS_WORK_LIMIT: usize = 4_000_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// Enables move detection; when `false` all changes surface as plain
    /// insert/delete.
    pub detect_moves: bool,
    /// Minimum Jaccard word-overlap similarity to accept a move pairing.
    #[serde(alias = "move_similarity")]
    pub move_similarity_threshold: f64,
    /// Minimum word count on the shorter side of a move pairing.
    #[serde(alias = "move_min_words")]
    pub move_minimum_word_count: u32,
    /// Case-fold text before equality and similarity comparison.
    pub case_insensitive: bool,
    /// Rewrite move markup into plain insert/delete for consumers that do not
    /// understand move constructs.
    pub simplify_move_markup: bool,
    /// Author stamped on every emitted revision construct.
    pub author: String,
    /// RFC 3339 date stamped on constructs; `None` stamps the current time.
    pub revision_date: Option<String>,
    /// Equal runs shorter than this many atoms between edits are demoted to
    /// insert+delete to avoid pathological fragmentation.
    pub min_match_length: u32,
    /// Extra refinement levels below paragraph granularity (1 = word,
    /// 2 = word then character).
    pub max_refine_depth: u32,
    /// LCS dynamic-programming cell budget; above it the engine falls back to
    /// a whole-range replace and records a warning.
    pub lcs_work_limit: usize,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            detect_moves: true,
            move_similarity_threshold: DEFAULT_MOVE_SIMILARITY,
            move_minimum_word_count: DEFAULT_MOVE_MIN_WORDS,
            case_insensitive: false,
            simplify_move_markup: false,
            author: "redline".to_owned(),
            revision_date: None,
            min_match_length: DEFAULT_MIN_MATCH_LENGTH,
            max_refine_depth: DEFAULT_MAX_REFINE_DEPTH,
            lcs_work_limit: DEFAULT_LCS_WORK_LIMIT,
        }
    }
}

impl CompareConfig {
    pub fn builder() -> CompareConfigBuilder {
        CompareConfigBuilder {
            inner: CompareConfig::default(),
        }
    }

    /// Returns a copy with every out-of-range value clamped to the nearest
    /// valid one. The engine calls this once on entry; callers never see an
    /// error for a sloppy threshold.
    pub fn sanitized(&self) -> CompareConfig {
        let mut cfg = self.clone();
        if !cfg.move_similarity_threshold.is_finite() {
            cfg.move_similarity_threshold = DEFAULT_MOVE_SIMILARITY;
        } else {
            cfg.move_similarity_threshold = cfg.move_similarity_threshold.clamp(0.0, 1.0);
        }
        cfg.move_minimum_word_count = cfg.move_minimum_word_count.max(1);
        cfg.min_match_length = cfg.min_match_length.max(1);
        cfg.lcs_work_limit = cfg.lcs_work_limit.max(1);
        cfg
    }

    /// Strict validation for callers that prefer an error over clamping.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.move_similarity_threshold.is_finite()
            || self.move_similarity_threshold < 0.0
            || self.move_similarity_threshold > 1.0
        {
            return Err(ConfigError::InvalidSimilarity {
                value: self.move_similarity_threshold,
            });
        }
        ensure_non_zero(self.move_minimum_word_count, "move_minimum_word_count")?;
        ensure_non_zero(self.min_match_length, "min_match_length")?;
        if self.lcs_work_limit == 0 {
            return Err(ConfigError::NonPositiveLimit {
                field: "lcs_work_limit",
                value: 0,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error(
        "[REDLINE_CFG_001] move_similarity_threshold must be in [0.0, 1.0] and finite (got {value})"
    )]
    InvalidSimilarity { value: f64 },
    #[error("[REDLINE_CFG_002] {field} must be greater than zero (got {value})")]
    NonPositiveLimit { field: &'static str, value: u64 },
}

fn ensure_non_zero(value: u32, field: &'static str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::NonPositiveLimit {
            field,
            value: value as u64,
        });
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct CompareConfigBuilder {
    inner: CompareConfig,
}

impl Default for CompareConfigBuilder {
    fn default() -> Self {
        CompareConfig::builder()
    }
}

impl CompareConfigBuilder {
    pub fn detect_moves(mut self, value: bool) -> Self {
        self.inner.detect_moves = value;
        self
    }

    pub fn move_similarity_threshold(mut self, value: f64) -> Self {
        self.inner.move_similarity_threshold = value;
        self
    }

    pub fn move_minimum_word_count(mut self, value: u32) -> Self {
        self.inner.move_minimum_word_count = value;
        self
    }

    pub fn case_insensitive(mut self, value: bool) -> Self {
        self.inner.case_insensitive = value;
        self
    }

    pub fn simplify_move_markup(mut self, value: bool) -> Self {
        self.inner.simplify_move_markup = value;
        self
    }

    pub fn author(mut self, value: impl Into<String>) -> Self {
        self.inner.author = value.into();
        self
    }

    pub fn revision_date(mut self, value: impl Into<String>) -> Self {
        self.inner.revision_date = Some(value.into());
        self
    }

    pub fn min_match_length(mut self, value: u32) -> Self {
        self.inner.min_match_length = value;
        self
    }

    pub fn max_refine_depth(mut self, value: u32) -> Self {
        self.inner.max_refine_depth = value;
        self
    }

    pub fn lcs_work_limit(mut self, value: usize) -> Self {
        self.inner.lcs_work_limit = value;
        self
    }

    /// Builds the configuration, clamping out-of-range values.
    pub fn build(self) -> CompareConfig {
        self.inner.sanitized()
    }
}
