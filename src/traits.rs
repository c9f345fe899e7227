//! Core traits for target encoders.
//!
//! - [`Transformer`]: the configurable, unfitted encoder that learns from a table.
//! - [`FittedTransformer`]: the fitted encoder, ready for transformation and persistence.

use crate::error::EncodingError;
use crate::serialization::SerializableParams;

/// Trait for unfitted transformers with hyperparameters.
///
/// # Type Parameters
/// - `Input`: Input data type (typically a [`crate::dataset::TableSource`]).
/// - `Output`: Output data type (typically a [`crate::dataset::Frame`]).
/// - `Params`: Serializable representation of learned parameters.
/// - `Fitted`: The corresponding fitted transformer type.
pub trait Transformer: Clone {
    /// Input data type for fitting and transformation.
    type Input: ?Sized;
    /// Output data type after transformation.
    type Output;
    /// Serializable representation of learned parameters.
    type Params: SerializableParams;
    /// The fitted transformer type ready for inference.
    type Fitted: FittedTransformer<Params = Self::Params, Input = Self::Input, Output = Self::Output>;

    /// Fit the transformer to the training data.
    ///
    /// # Errors
    /// Returns [`EncodingError`] if the configuration does not match the data
    /// (missing columns, wrong column kinds) or there is nothing to learn from.
    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, EncodingError>;

    /// Fit the transformer and transform the same data in one step.
    ///
    /// For target encoders this is the training-time transform, which applies
    /// the configured leakage handling and noise.
    fn fit_transform(&self, data: &Self::Input) -> Result<Self::Output, EncodingError>;
}

/// Trait for fitted transformers ready for inference.
///
/// # Guarantees
/// - `extract_params()` + `from_params()` is a round-trip.
/// - `save_to_file` / `load_from_file` round-trip within one library version.
pub trait FittedTransformer: Clone {
    /// Input data type for transformation.
    type Input: ?Sized;
    /// Output data type after transformation.
    type Output;
    /// Serializable representation of learned parameters.
    type Params: SerializableParams;

    /// Transform data using learned parameters, without leakage handling or noise.
    fn transform(&self, data: &Self::Input) -> Result<Self::Output, EncodingError>;

    /// Extract learned parameters as a serializable representation.
    fn extract_params(&self) -> Self::Params;

    /// Reconstruct a fitted transformer from parameters.
    fn from_params(params: Self::Params) -> Result<Self, EncodingError>
    where
        Self: Sized;

    /// Save the fitted transformer to a file.
    fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> std::io::Result<()> {
        let params = self.extract_params();
        let bytes = params.to_bytes().map_err(std::io::Error::other)?;
        std::fs::write(path, bytes)
    }

    /// Load a fitted transformer from a file.
    fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, EncodingError>
    where
        Self: Sized,
    {
        let bytes = std::fs::read(path)?;
        let params = Self::Params::from_bytes(&bytes)
            .map_err(|e| EncodingError::Serialization(e.to_string()))?;
        Self::from_params(params)
    }

    /// Returns the number of columns this transformer encodes.
    fn n_features_in(&self) -> usize;
}
