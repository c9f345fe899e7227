//! Training-time target encoder.
//!
//! [`TargetEncoder`] learns per-category response statistics from a table and
//! produces a [`FittedTargetEncoder`]. The fitted encoder owns the
//! fold-independent [`EncodingArtifact`] and, for `KFold`, the per-fold
//! aggregates needed to encode training rows out of fold.
//!
//! # Example
//!
//! ```rust
//! use target_encoding::config::TargetEncoderConfig;
//! use target_encoding::dataset::Frame;
//! use target_encoding::encoding::TargetEncoder;
//! use target_encoding::traits::{FittedTransformer, Transformer};
//!
//! let frame = Frame::new()
//!     .with_categorical("city", &[Some("Oslo"), Some("Rome"), Some("Oslo"), None])
//!     .unwrap()
//!     .with_numeric("clicked", vec![1.0, 0.0, 0.0, 1.0])
//!     .unwrap();
//!
//! let encoder = TargetEncoder::new(TargetEncoderConfig::new("clicked").with_noise_level(0.0));
//! let fitted = encoder.fit(&frame).unwrap();
//! let encoded = fitted.transform(&frame).unwrap();
//! assert_eq!(encoded.numeric_values("city_te").unwrap()[0], 0.5);
//! ```

use crate::artifact::{encoded_column_name, ColumnEncoding, EncodingArtifact};
use crate::config::TargetEncoderConfig;
use crate::dataset::{
    categorical, fold_ids, response_positive_class, response_values, CategoryId, Column,
    ColumnData, ColumnRef, Frame, TableSource, Value,
};
use crate::encoding::leakage::{LeakageResolver, LeakageStrategy};
use crate::encoding::noise::NoiseGenerator;
use crate::encoding::stats::{ColumnEncodingMap, FoldedEncodingMap, StatAggregator};
use crate::error::EncodingError;
use crate::traits::{FittedTransformer, Transformer};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shared flag a caller sets to stop a running fit between stages.
#[derive(Clone, Debug, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), EncodingError> {
        if self.is_aborted() {
            Err(EncodingError::Aborted)
        } else {
            Ok(())
        }
    }
}

/// Overrides for a training-time transform. Unset fields fall back to the config.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TransformOptions {
    pub strategy: Option<LeakageStrategy>,
    pub noise_level: Option<f64>,
    pub seed: Option<u64>,
}

impl TransformOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(mut self, strategy: LeakageStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_noise_level(mut self, level: f64) -> Self {
        self.noise_level = Some(level);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Unfitted target encoder.
#[derive(Clone, Debug)]
pub struct TargetEncoder {
    config: TargetEncoderConfig,
}

impl TargetEncoder {
    pub fn new(config: TargetEncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TargetEncoderConfig {
        &self.config
    }

    pub fn with_data_leakage_handling(mut self, strategy: LeakageStrategy) -> Self {
        self.config = self.config.with_data_leakage_handling(strategy);
        self
    }

    pub fn with_blending(mut self, blending: bool) -> Self {
        self.config = self.config.with_blending(blending);
        self
    }

    pub fn with_noise_level(mut self, level: f64) -> Self {
        self.config = self.config.with_noise_level(level);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config = self.config.with_seed(seed);
        self
    }

    /// Columns to encode: the configured list, or every categorical column
    /// other than the response and fold columns.
    fn columns_to_encode<T: TableSource + ?Sized>(&self, data: &T) -> Result<Vec<String>, EncodingError> {
        if !self.config.encoded_columns.is_empty() {
            for column in &self.config.encoded_columns {
                categorical(data, column)?;
            }
            return Ok(self.config.encoded_columns.clone());
        }
        let fold = self.config.fold_column.as_deref();
        Ok(data
            .column_names()
            .into_iter()
            .filter(|name| *name != self.config.response_column && Some(*name) != fold)
            .filter(|name| matches!(data.column(name), Ok(ColumnRef::Categorical(_))))
            .map(str::to_string)
            .collect())
    }

    /// Fit on any table source, checking `abort` between stages and columns.
    ///
    /// # Errors
    /// Configuration errors, missing or mistyped columns, a response without
    /// any value, or [`EncodingError::Aborted`].
    pub fn fit_with_abort<T: TableSource + ?Sized>(
        &self,
        data: &T,
        abort: &AbortSignal,
    ) -> Result<FittedTargetEncoder, EncodingError> {
        let config = &self.config;
        config.validate()?;
        abort.check()?;

        let positive_class =
            response_positive_class(data, &config.response_column, config.positive_class.as_deref())?;
        let responses = response_values(data, &config.response_column, positive_class.as_deref())?;
        let strategy = config.data_leakage_handling;
        let fold = config.fold_column.as_deref();
        let fold_labels = match fold.map(|f| data.column(f)).transpose()? {
            Some(ColumnRef::Categorical(view)) if strategy.needs_folds() => Some(view.domain.to_vec()),
            _ => None,
        };
        let columns = self.columns_to_encode(data)?;
        if columns.is_empty() {
            return Err(EncodingError::EmptyData(
                "no categorical columns to encode".to_string(),
            ));
        }

        let total = StatAggregator::default().total(&responses);
        let prior_mean = total.posterior_mean().ok_or_else(|| {
            EncodingError::EmptyData(format!(
                "response column '{}' has no values",
                config.response_column
            ))
        })?;
        info!(
            rows = data.n_rows(),
            columns = columns.len(),
            strategy = %strategy,
            prior_mean,
            "fitting target encoder"
        );

        let mut encodings = Vec::with_capacity(columns.len());
        let mut fold_aggregates = BTreeMap::new();
        for column in &columns {
            abort.check()?;
            let view = categorical(data, column)?;
            let group_fold = if strategy.needs_folds() { fold } else { None };
            let grouped = data.group_sum_count(
                column,
                group_fold,
                &config.response_column,
                positive_class.as_deref(),
            )?;
            let map = if strategy.needs_folds() {
                let folded = FoldedEncodingMap::from_grouped(&grouped);
                debug!(
                    column = %column,
                    folds = folded.folds().len(),
                    categories = folded.n_categories(),
                    "aggregated per fold"
                );
                let regrouped = folded.regroup();
                fold_aggregates.insert(column.clone(), folded);
                regrouped
            } else {
                ColumnEncodingMap::from_grouped(&grouped)
            };
            debug!(
                column = %column,
                levels = view.domain.len(),
                categories = map.len(),
                missing = view.has_missing(),
                "aggregated column"
            );
            encodings.push(ColumnEncoding::new(view.domain.to_vec(), view.has_missing(), map));
        }

        abort.check()?;
        let mut artifact = EncodingArtifact::new(prior_mean, config.blending, config.blending_params());
        for (column, encoding) in columns.iter().zip(encodings) {
            artifact.columns.insert(column.clone(), encoding);
        }
        info!(columns = artifact.n_columns(), "target encoder fitted");

        Ok(FittedTargetEncoder {
            config: config.clone(),
            columns,
            artifact,
            positive_class,
            fold_labels,
            fold_aggregates: strategy.needs_folds().then_some(fold_aggregates),
        })
    }
}

impl Transformer for TargetEncoder {
    type Input = Frame;
    type Output = Frame;
    type Params = TargetEncoderParams;
    type Fitted = FittedTargetEncoder;

    fn fit(&self, data: &Frame) -> Result<FittedTargetEncoder, EncodingError> {
        self.fit_with_abort(data, &AbortSignal::new())
    }

    fn fit_transform(&self, data: &Frame) -> Result<Frame, EncodingError> {
        let fitted = self.fit(data)?;
        fitted.transform_training(data, &TransformOptions::default())
    }
}

/// Learned state of a [`FittedTargetEncoder`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetEncoderParams {
    pub config: TargetEncoderConfig,
    /// Encoded columns in output order.
    pub columns: Vec<String>,
    pub artifact: EncodingArtifact,
    /// Response label counted as 1, for a categorical response.
    pub positive_class: Option<String>,
    /// Training fold labels in fold-id order, for a categorical fold column.
    pub fold_labels: Option<Vec<String>>,
    pub fold_aggregates: Option<BTreeMap<String, FoldedEncodingMap>>,
}

/// Per-column line of a [`ModelSummary`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub encoded_column: String,
    pub n_categories: usize,
    pub missing_value_present: bool,
}

/// Description of a fitted encoder.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModelSummary {
    pub prior_mean: f64,
    pub with_blending: bool,
    pub data_leakage_handling: LeakageStrategy,
    pub columns: Vec<ColumnSummary>,
}

/// Fitted target encoder.
#[derive(Clone, Debug)]
pub struct FittedTargetEncoder {
    config: TargetEncoderConfig,
    columns: Vec<String>,
    artifact: EncodingArtifact,
    positive_class: Option<String>,
    fold_labels: Option<Vec<String>>,
    fold_aggregates: Option<BTreeMap<String, FoldedEncodingMap>>,
}

impl FittedTargetEncoder {
    pub fn config(&self) -> &TargetEncoderConfig {
        &self.config
    }

    pub fn artifact(&self) -> &EncodingArtifact {
        &self.artifact
    }

    /// Encoded columns in output order.
    pub fn encoded_columns(&self) -> &[String] {
        &self.columns
    }

    pub fn prior_mean(&self) -> f64 {
        self.artifact.prior_mean
    }

    /// Response label counted as 1, `None` for a numeric response.
    pub fn positive_class(&self) -> Option<&str> {
        self.positive_class.as_deref()
    }

    pub fn has_fold_aggregates(&self) -> bool {
        self.fold_aggregates.is_some()
    }

    /// Drop the per-fold aggregates. A `KFold` training transform is no longer
    /// possible afterwards.
    pub fn release_fold_aggregates(&mut self) {
        if let Some(released) = self.fold_aggregates.take() {
            info!(columns = released.len(), "released per-fold aggregates");
        }
    }

    /// Release the per-fold aggregates and hand over the artifact.
    pub fn into_artifact(mut self) -> EncodingArtifact {
        self.release_fold_aggregates();
        self.artifact
    }

    pub fn summary(&self) -> ModelSummary {
        let columns = self
            .columns
            .iter()
            .filter_map(|name| {
                let encoding = self.artifact.column(name)?;
                Some(ColumnSummary {
                    column: name.clone(),
                    encoded_column: encoded_column_name(name),
                    n_categories: encoding.map().len(),
                    missing_value_present: encoding.missing_value_present(),
                })
            })
            .collect();
        ModelSummary {
            prior_mean: self.artifact.prior_mean,
            with_blending: self.artifact.with_blending,
            data_leakage_handling: self.config.data_leakage_handling,
            columns,
        }
    }

    /// Training-time transform: applies leakage handling and noise.
    ///
    /// `LeaveOneOut` needs the response column and `KFold` the fold column in
    /// `frame`; `KFold` also needs the per-fold aggregates to still be held.
    /// Responses and fold labels are read the way they were during fitting, so
    /// any subset or reordering of the training rows encodes each row the same.
    pub fn transform_training(
        &self,
        frame: &Frame,
        options: &TransformOptions,
    ) -> Result<Frame, EncodingError> {
        let strategy = options.strategy.unwrap_or(self.config.data_leakage_handling);
        let noise_level = options.noise_level.unwrap_or(self.config.noise_level);
        let seed = options.seed.unwrap_or(self.config.seed);
        if !(noise_level.is_finite() && noise_level >= 0.0) {
            return Err(EncodingError::InvalidParameter(format!(
                "noise_level must be non-negative and finite, got {}",
                noise_level
            )));
        }
        self.encode_frame(frame, strategy, noise_level, seed)
    }

    fn encode_frame(
        &self,
        frame: &Frame,
        strategy: LeakageStrategy,
        noise_level: f64,
        seed: u64,
    ) -> Result<Frame, EncodingError> {
        let responses = match strategy {
            LeakageStrategy::LeaveOneOut => Some(response_values(
                frame,
                &self.config.response_column,
                self.positive_class.as_deref(),
            )?),
            LeakageStrategy::None | LeakageStrategy::KFold => None,
        };
        let (folds, fold_aggregates) = match strategy {
            LeakageStrategy::KFold => {
                let aggregates = self.fold_aggregates.as_ref().ok_or_else(|| {
                    EncodingError::InvalidParameter(
                        "KFold transform requires per-fold aggregates, which were not kept or already released"
                            .to_string(),
                    )
                })?;
                let fold = self.config.fold_column.as_deref().ok_or_else(|| {
                    EncodingError::InvalidParameter("KFold transform requires a fold_column".to_string())
                })?;
                if self.fold_labels.is_none() {
                    if let ColumnRef::Categorical(_) = frame.column(fold)? {
                        return Err(EncodingError::ColumnType {
                            column: fold.to_string(),
                            expected: "numeric".to_string(),
                        });
                    }
                }
                let ids = fold_ids(frame, fold, self.fold_labels.as_deref())?;
                (Some(ids), Some(aggregates))
            }
            LeakageStrategy::None | LeakageStrategy::LeaveOneOut => (None, None),
        };

        let mut out = frame.clone();
        for (index, column) in self.columns.iter().enumerate() {
            let encoding = self
                .artifact
                .column(column)
                .ok_or_else(|| EncodingError::MissingColumn(column.clone()))?;
            let ids = lookup_ids(frame, column, encoding)?;
            let resolver = LeakageResolver::new(
                strategy,
                encoding.map(),
                fold_aggregates.and_then(|a| a.get(column)),
            )?;

            let artifact = &self.artifact;
            let mut values: Vec<f64> = (0..ids.len())
                .into_par_iter()
                .map(|row| {
                    let fold = folds.as_ref().map(|f| f[row]);
                    let response = responses.as_ref().and_then(|r| r[row]);
                    artifact.value_of(resolver.row_stat(ids[row], fold, response))
                })
                .collect();

            if noise_level > 0.0 {
                let mut noise = NoiseGenerator::new(seed, index, noise_level);
                for value in values.iter_mut() {
                    *value += noise.next_noise();
                }
            }

            out.push_column(Column {
                name: encoded_column_name(column),
                data: ColumnData::Numeric(values),
            })?;
        }
        info!(
            rows = frame.n_rows(),
            columns = self.columns.len(),
            strategy = %strategy,
            noise_level,
            "target encoding applied"
        );
        Ok(out)
    }
}

/// Per-row lookup id of `column` in the training domain.
///
/// Labels are matched by text, so a frame with a different domain order or
/// unseen levels resolves the same way the scorer does.
fn lookup_ids(
    frame: &Frame,
    column: &str,
    encoding: &ColumnEncoding,
) -> Result<Vec<Option<CategoryId>>, EncodingError> {
    Ok(match frame.column(column)? {
        ColumnRef::Categorical(view) => {
            let remap: Vec<Option<CategoryId>> =
                view.domain.iter().map(|label| encoding.label_id(label)).collect();
            let unseen = remap.iter().filter(|id| id.is_none()).count();
            if unseen > 0 {
                warn!(column = %column, unseen, "levels not seen during training");
            }
            view.codes
                .iter()
                .map(|code| encoding.lookup_id(code.and_then(|c| remap[c as usize])))
                .collect()
        }
        ColumnRef::Numeric(values) => values
            .iter()
            .map(|&v| encoding.lookup_id(encoding.resolve(&Value::Num(v))))
            .collect(),
    })
}

impl FittedTransformer for FittedTargetEncoder {
    type Input = Frame;
    type Output = Frame;
    type Params = TargetEncoderParams;

    /// Scoring-time transform: no leakage handling and no noise.
    fn transform(&self, data: &Frame) -> Result<Frame, EncodingError> {
        self.encode_frame(data, LeakageStrategy::None, 0.0, self.config.seed)
    }

    fn extract_params(&self) -> TargetEncoderParams {
        TargetEncoderParams {
            config: self.config.clone(),
            columns: self.columns.clone(),
            artifact: self.artifact.clone(),
            positive_class: self.positive_class.clone(),
            fold_labels: self.fold_labels.clone(),
            fold_aggregates: self.fold_aggregates.clone(),
        }
    }

    fn from_params(params: TargetEncoderParams) -> Result<Self, EncodingError> {
        params.config.validate()?;
        if let Some(missing) = params
            .columns
            .iter()
            .find(|c| params.artifact.column(c).is_none())
        {
            return Err(EncodingError::InvalidParameter(format!(
                "column '{}' has no encoding in the artifact",
                missing
            )));
        }
        Ok(Self {
            config: params.config,
            columns: params.columns,
            artifact: params.artifact,
            positive_class: params.positive_class,
            fold_labels: params.fold_labels,
            fold_aggregates: params.fold_aggregates,
        })
    }

    fn n_features_in(&self) -> usize {
        self.columns.len()
    }
}
