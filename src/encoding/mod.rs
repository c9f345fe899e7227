//! Target encoding of categorical columns.
//!
//! # Components
//!
//! - [`stats`]: per-category `(sum, count)` aggregation, optionally per fold
//! - [`leakage`]: how training rows avoid seeing their own label
//! - [`blending`]: shrinkage of the posterior mean toward the prior
//! - [`noise`]: reproducible training-time noise
//! - [`target`]: the encoder tying these together
//!
//! The scoring side, which only reads a persisted artifact, lives in
//! [`crate::scorer`].

pub mod blending;
pub mod leakage;
pub mod noise;
pub mod stats;
pub mod target;

pub use blending::{BlendingParams, DEFAULT_INFLECTION_POINT, DEFAULT_SMOOTHING};
pub use leakage::LeakageStrategy;
pub use noise::DEFAULT_NOISE_LEVEL;
pub use stats::{CategoryStat, ColumnEncodingMap, FoldedEncodingMap, Stat, StatAggregator};
pub use target::{
    AbortSignal, ColumnSummary, FittedTargetEncoder, ModelSummary, TargetEncoder,
    TargetEncoderParams, TransformOptions,
};
