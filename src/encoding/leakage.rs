//! Data leakage handling strategies.
//!
//! A strategy decides which statistic a *training* row is encoded with. The
//! persisted map is always the fold-independent aggregate, whatever the strategy.

use crate::dataset::{CategoryId, FoldId};
use crate::encoding::stats::{ColumnEncodingMap, FoldedEncodingMap, Stat};
use crate::error::EncodingError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How training rows avoid seeing their own label.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LeakageStrategy {
    /// Every row is encoded with the global aggregate.
    #[default]
    None,
    /// Rows are encoded with the aggregate of every other fold.
    KFold,
    /// Rows are encoded with the global aggregate minus their own contribution.
    LeaveOneOut,
}

impl LeakageStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeakageStrategy::None => "None",
            LeakageStrategy::KFold => "KFold",
            LeakageStrategy::LeaveOneOut => "LeaveOneOut",
        }
    }

    /// Tag byte used by the legacy model format.
    pub fn to_byte(self) -> u8 {
        match self {
            LeakageStrategy::LeaveOneOut => 0,
            LeakageStrategy::KFold => 1,
            LeakageStrategy::None => 2,
        }
    }

    /// Whether the strategy aggregates per fold.
    pub fn needs_folds(&self) -> bool {
        matches!(self, LeakageStrategy::KFold)
    }
}

impl fmt::Display for LeakageStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeakageStrategy {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "none" => Ok(LeakageStrategy::None),
            "kfold" => Ok(LeakageStrategy::KFold),
            "leaveoneout" => Ok(LeakageStrategy::LeaveOneOut),
            _ => Err(EncodingError::UnsupportedStrategy(s.to_string())),
        }
    }
}

impl TryFrom<String> for LeakageStrategy {
    type Error = EncodingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LeakageStrategy> for String {
    fn from(value: LeakageStrategy) -> Self {
        value.as_str().to_string()
    }
}

impl TryFrom<u8> for LeakageStrategy {
    type Error = EncodingError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(LeakageStrategy::LeaveOneOut),
            1 => Ok(LeakageStrategy::KFold),
            2 => Ok(LeakageStrategy::None),
            other => Err(EncodingError::UnsupportedStrategy(format!("tag {}", other))),
        }
    }
}

/// Resolves the statistic a single training row is encoded with.
///
/// Holds only shared references to immutable aggregates; every call is a pure
/// function of the aggregates and the row.
#[derive(Clone, Copy, Debug)]
pub struct LeakageResolver<'a> {
    strategy: LeakageStrategy,
    global: &'a ColumnEncodingMap,
    folded: Option<&'a FoldedEncodingMap>,
}

impl<'a> LeakageResolver<'a> {
    /// # Errors
    /// [`EncodingError::InvalidParameter`] when `KFold` is requested without per-fold aggregates.
    pub fn new(
        strategy: LeakageStrategy,
        global: &'a ColumnEncodingMap,
        folded: Option<&'a FoldedEncodingMap>,
    ) -> Result<Self, EncodingError> {
        if strategy.needs_folds() && folded.is_none() {
            return Err(EncodingError::InvalidParameter(
                "KFold encoding requires per-fold aggregates".to_string(),
            ));
        }
        Ok(Self {
            strategy,
            global,
            folded,
        })
    }

    pub fn strategy(&self) -> LeakageStrategy {
        self.strategy
    }

    /// Statistic for a training row, or `None` when no rows back it.
    ///
    /// `fold` is only consulted for `KFold`, `response` only for `LeaveOneOut`
    /// (a row with a missing response was never aggregated, so nothing is removed).
    pub fn row_stat(
        &self,
        category: Option<CategoryId>,
        fold: Option<FoldId>,
        response: Option<f64>,
    ) -> Option<Stat> {
        let category = category?;
        let stat = match self.strategy {
            LeakageStrategy::None => self.global.get(category)?,
            LeakageStrategy::KFold => match (self.folded, fold) {
                (Some(folded), Some(fold)) => folded.out_of_fold(category, fold),
                _ => self.global.get(category)?,
            },
            LeakageStrategy::LeaveOneOut => {
                let stat = self.global.get(category)?;
                match response {
                    Some(y) => stat.without(y),
                    None => stat,
                }
            }
        };
        (stat.count > 0).then_some(stat)
    }
}
