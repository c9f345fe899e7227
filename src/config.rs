//! Hyperparameters of the target encoder.
//!
//! [`TargetEncoderConfig`] is plain data: it can be built in code with the
//! `with_*` methods or loaded from a TOML file. Table-independent checks live in
//! [`TargetEncoderConfig::validate`]; checks that need the training table run at
//! fit time.
//!
//! ```toml
//! response_column = "survived"
//! positive_class = "yes"
//! fold_column = "fold"
//! encoded_columns = ["cabin", "embarked"]
//! data_leakage_handling = "KFold"
//! blending = true
//! inflection_point = 3.0
//! smoothing = 1.0
//! noise_level = 0.0
//! seed = 42
//! ```

use crate::encoding::blending::{BlendingParams, DEFAULT_INFLECTION_POINT, DEFAULT_SMOOTHING};
use crate::encoding::leakage::LeakageStrategy;
use crate::encoding::noise::DEFAULT_NOISE_LEVEL;
use crate::error::EncodingError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default seed for training-time noise.
pub const DEFAULT_SEED: u64 = 1234;

fn default_inflection_point() -> f64 {
    DEFAULT_INFLECTION_POINT
}

fn default_smoothing() -> f64 {
    DEFAULT_SMOOTHING
}

fn default_noise_level() -> f64 {
    DEFAULT_NOISE_LEVEL
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

/// Configuration for [`crate::encoding::target::TargetEncoder`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetEncoderConfig {
    /// Column holding the numeric or binary response.
    pub response_column: String,
    /// Label counted as 1 in a categorical response. Required when the
    /// training response has a single level.
    #[serde(default)]
    pub positive_class: Option<String>,
    /// Column assigning rows to cross-validation folds.
    #[serde(default)]
    pub fold_column: Option<String>,
    /// Columns to encode. Empty means every categorical column except the
    /// response and fold columns.
    #[serde(default)]
    pub encoded_columns: Vec<String>,
    #[serde(default)]
    pub data_leakage_handling: LeakageStrategy,
    #[serde(default)]
    pub blending: bool,
    #[serde(default = "default_inflection_point")]
    pub inflection_point: f64,
    #[serde(default = "default_smoothing")]
    pub smoothing: f64,
    /// Amplitude of uniform noise added at training time.
    #[serde(default = "default_noise_level")]
    pub noise_level: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl TargetEncoderConfig {
    pub fn new(response_column: &str) -> Self {
        Self {
            response_column: response_column.to_string(),
            positive_class: None,
            fold_column: None,
            encoded_columns: Vec::new(),
            data_leakage_handling: LeakageStrategy::default(),
            blending: false,
            inflection_point: DEFAULT_INFLECTION_POINT,
            smoothing: DEFAULT_SMOOTHING,
            noise_level: DEFAULT_NOISE_LEVEL,
            seed: DEFAULT_SEED,
        }
    }

    pub fn with_positive_class(mut self, label: &str) -> Self {
        self.positive_class = Some(label.to_string());
        self
    }

    pub fn with_fold_column(mut self, column: &str) -> Self {
        self.fold_column = Some(column.to_string());
        self
    }

    pub fn with_encoded_columns<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.encoded_columns = columns.iter().map(|c| c.as_ref().to_string()).collect();
        self
    }

    pub fn with_data_leakage_handling(mut self, strategy: LeakageStrategy) -> Self {
        self.data_leakage_handling = strategy;
        self
    }

    pub fn with_blending(mut self, blending: bool) -> Self {
        self.blending = blending;
        self
    }

    pub fn with_inflection_point(mut self, k: f64) -> Self {
        self.inflection_point = k;
        self
    }

    pub fn with_smoothing(mut self, f: f64) -> Self {
        self.smoothing = f;
        self
    }

    pub fn with_noise_level(mut self, level: f64) -> Self {
        self.noise_level = level;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Blending parameters from `inflection_point` and `smoothing`.
    pub fn blending_params(&self) -> BlendingParams {
        BlendingParams::new(self.inflection_point, self.smoothing)
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, EncodingError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, EncodingError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check the values that do not depend on a table.
    pub fn validate(&self) -> Result<(), EncodingError> {
        if self.response_column.trim().is_empty() {
            return Err(EncodingError::InvalidParameter(
                "response_column must not be empty".to_string(),
            ));
        }
        if self.positive_class.as_deref() == Some("") {
            return Err(EncodingError::InvalidParameter(
                "positive_class must not be empty".to_string(),
            ));
        }
        if !self.inflection_point.is_finite() {
            return Err(EncodingError::InvalidParameter(format!(
                "inflection_point must be finite, got {}",
                self.inflection_point
            )));
        }
        if !(self.smoothing.is_finite() && self.smoothing > 0.0) {
            return Err(EncodingError::InvalidParameter(format!(
                "smoothing must be positive and finite, got {}",
                self.smoothing
            )));
        }
        if !(self.noise_level.is_finite() && self.noise_level >= 0.0) {
            return Err(EncodingError::InvalidParameter(format!(
                "noise_level must be non-negative and finite, got {}",
                self.noise_level
            )));
        }
        if self.data_leakage_handling.needs_folds() && self.fold_column.is_none() {
            return Err(EncodingError::InvalidParameter(
                "KFold data leakage handling requires a fold_column".to_string(),
            ));
        }
        for column in &self.encoded_columns {
            if *column == self.response_column {
                return Err(EncodingError::InvalidParameter(format!(
                    "response column '{}' cannot be encoded",
                    column
                )));
            }
            if self.fold_column.as_deref() == Some(column.as_str()) {
                return Err(EncodingError::InvalidParameter(format!(
                    "fold column '{}' cannot be encoded",
                    column
                )));
            }
        }
        Ok(())
    }
}
