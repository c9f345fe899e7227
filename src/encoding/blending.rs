//! Shrinkage of a category's posterior mean toward the prior mean.

use crate::encoding::stats::Stat;
use serde::{Deserialize, Serialize};

/// Default inflection point `k`: the count at which posterior and prior weigh equally.
pub const DEFAULT_INFLECTION_POINT: f64 = 20.0;

/// Default smoothing `f`: steepness of the transition between prior and posterior.
pub const DEFAULT_SMOOTHING: f64 = 10.0;

/// Parameters of the logistic blending weight.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlendingParams {
    /// Inflection point.
    pub k: f64,
    /// Smoothing.
    pub f: f64,
}

impl BlendingParams {
    pub const DEFAULT: BlendingParams = BlendingParams {
        k: DEFAULT_INFLECTION_POINT,
        f: DEFAULT_SMOOTHING,
    };

    pub fn new(k: f64, f: f64) -> Self {
        Self { k, f }
    }

    /// `1 / (1 + exp(-(count - k) / f))`
    pub fn lambda(&self, count: i64) -> f64 {
        1.0 / (1.0 + (-(count as f64 - self.k) / self.f).exp())
    }

    /// Weighted mix of posterior and prior for a category backed by `count` rows.
    pub fn blend(&self, posterior_mean: f64, prior_mean: f64, count: i64) -> f64 {
        let lambda = self.lambda(count);
        lambda * posterior_mean + (1.0 - lambda) * prior_mean
    }
}

impl Default for BlendingParams {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Encoding value for a resolved statistic.
///
/// No statistic, or one with `count <= 0`, yields `prior_mean`. Otherwise the
/// posterior mean is returned, blended when `blending` is given.
pub fn encoding_value(stat: Option<Stat>, prior_mean: f64, blending: Option<&BlendingParams>) -> f64 {
    let Some(stat) = stat else {
        return prior_mean;
    };
    match (stat.posterior_mean(), blending) {
        (None, _) => prior_mean,
        (Some(posterior), None) => posterior,
        (Some(posterior), Some(params)) => params.blend(posterior, prior_mean, stat.count),
    }
}
