//! Configuration types for model training.
//!
//! This module provides [`TrainingConfig`] and its builder, as well as the
//! [`Algorithm`] enum.
//!
//! # Example
//!
//! ```
//! use climate_learning::{Algorithm, TrainingConfig};
//!
//! let config = TrainingConfig::builder()
//!     .algorithm(Algorithm::DecisionTree)
//!     .test_size(0.3)
//!     .max_depth(6)
//!     .build()
//!     .expect("valid config");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{LearningError, Result};

/// Smallest accepted test fraction.
pub const MIN_TEST_SIZE: f64 = 0.10;
/// Largest accepted test fraction.
pub const MAX_TEST_SIZE: f64 = 0.50;

/// Regression algorithm to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Ordinary least squares with an intercept.
    #[default]
    LinearRegression,

    /// CART regression tree with squared-error splits.
    DecisionTree,
}

impl Algorithm {
    pub const ALL: [Algorithm; 2] = [Algorithm::LinearRegression, Algorithm::DecisionTree];

    /// Returns the identifier used in configs and scripts.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::LinearRegression => "linear_regression",
            Algorithm::DecisionTree => "decision_tree",
        }
    }

    /// Returns the name shown in the model picker.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Algorithm::LinearRegression => "Linear Regression",
            Algorithm::DecisionTree => "Decision Tree",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Algorithm {
    type Err = LearningError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "linear_regression" | "linear" => Ok(Algorithm::LinearRegression),
            "decision_tree" | "tree" => Ok(Algorithm::DecisionTree),
            _ => Err(LearningError::InvalidConfig(format!(
                "unknown algorithm '{}'; expected one of: linear_regression, decision_tree",
                s
            ))),
        }
    }
}

/// Configuration for one training run.
///
/// Use [`TrainingConfig::builder()`] to construct a validated configuration.
///
/// # Validation
///
/// [`build()`](TrainingConfigBuilder::build) checks that:
/// - `test_size` lies in `[0.10, 0.50]`
/// - `max_depth`, when set, is at least 1
/// - `min_samples_split` is at least 2
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// The regression algorithm (default: linear regression).
    pub algorithm: Algorithm,

    /// Fraction of rows held out for evaluation (default: 0.2).
    pub test_size: f64,

    /// Seed for the train/test shuffle (default: 42).
    pub random_seed: u64,

    /// Maximum tree depth; `None` grows until leaves are pure.
    ///
    /// Ignored by linear regression.
    pub max_depth: Option<usize>,

    /// Minimum rows a tree node needs before it may split (default: 2).
    pub min_samples_split: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            test_size: 0.2,
            random_seed: 42,
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

impl TrainingConfig {
    /// Create a new builder for `TrainingConfig`.
    #[must_use]
    pub fn builder() -> TrainingConfigBuilder {
        TrainingConfigBuilder::default()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_TEST_SIZE..=MAX_TEST_SIZE).contains(&self.test_size) {
            return Err(LearningError::InvalidConfig(format!(
                "test_size must be between {:.2} and {:.2}, got {}",
                MIN_TEST_SIZE, MAX_TEST_SIZE, self.test_size
            )));
        }

        if self.max_depth == Some(0) {
            return Err(LearningError::InvalidConfig(
                "max_depth must be at least 1".to_string(),
            ));
        }

        if self.min_samples_split < 2 {
            return Err(LearningError::InvalidConfig(
                "min_samples_split must be at least 2".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`TrainingConfig`].
#[derive(Debug, Clone, Default)]
pub struct TrainingConfigBuilder {
    config: TrainingConfig,
}

impl TrainingConfigBuilder {
    /// Set the algorithm.
    #[must_use]
    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.config.algorithm = algorithm;
        self
    }

    /// Set the test fraction (default: 0.2).
    ///
    /// [`build()`](Self::build) rejects values outside `[0.10, 0.50]`.
    #[must_use]
    pub fn test_size(mut self, size: f64) -> Self {
        self.config.test_size = size;
        self
    }

    /// Set the test fraction from a whole percentage, as the slider does.
    #[must_use]
    pub fn test_percent(self, percent: u32) -> Self {
        self.test_size(f64::from(percent) / 100.0)
    }

    /// Set the shuffle seed (default: 42).
    #[must_use]
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = seed;
        self
    }

    /// Limit the depth of a decision tree.
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = Some(depth);
        self
    }

    /// Set the minimum rows needed to split a tree node (default: 2).
    #[must_use]
    pub fn min_samples_split(mut self, samples: usize) -> Self {
        self.config.min_samples_split = samples;
        self
    }

    /// Build the configuration, validating all settings.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidConfig`] if any setting is out of range.
    pub fn build(self) -> Result<TrainingConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
