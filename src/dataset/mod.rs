//! Tabular data abstractions consumed by the target encoder.
//!
//! The encoder never depends on a concrete table engine. It talks to a
//! [`TableSource`], which exposes columns by name, categorical domains, and a
//! group-by-sum/count primitive. [`Frame`] is the in-memory implementation used
//! by the command-line front end and the tests.
//!
//! # Core Concepts
//!
//! - **Categorical column**: an ordered domain of labels plus one code per row;
//!   `None` marks a missing value.
//! - **Numeric column**: one `f64` per row; `NaN` marks a missing value.
//! - **Row**: a name → [`Value`] mapping, the unit consumed by the standalone scorer.
//!
//! # Example
//!
//! ```rust
//! use target_encoding::dataset::{Frame, TableSource};
//!
//! let frame = Frame::new()
//!     .with_categorical("city", &[Some("Oslo"), Some("Rome"), None])
//!     .unwrap()
//!     .with_numeric("clicked", vec![1.0, 0.0, 1.0])
//!     .unwrap();
//!
//! assert_eq!(frame.n_rows(), 3);
//! let stats = frame.group_sum_count("city", None, "clicked", None).unwrap();
//! assert_eq!(stats.len(), 3); // Oslo, Rome, and the missing level
//! ```

use crate::encoding::stats::{GroupedStats, StatAggregator};
use crate::error::EncodingError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod csv_io;
pub mod memory;
pub use self::memory::{Column, ColumnData, Frame};

/// Ordinal of a category within its column's training domain.
///
/// The missing level uses the id equal to the domain length.
pub type CategoryId = u32;

/// Identifier of a cross-validation fold.
pub type FoldId = i64;

/// A single raw cell value, as seen by the scorer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// A categorical label or any textual value.
    Str(String),
    /// A numeric value. `NaN` is treated as missing.
    Num(f64),
    /// An explicit missing marker.
    Missing,
}

impl Value {
    /// Whether the value should be treated as missing.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Num(v) => v.is_nan(),
            Value::Str(_) => false,
        }
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Num(v) if !v.is_nan() => Some(*v),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Num(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Missing)
    }
}

/// A row keyed by column name.
pub type Row = HashMap<String, Value>;

/// Borrowed view of a categorical column.
#[derive(Clone, Copy, Debug)]
pub struct CategoricalView<'a> {
    /// Ordered labels; a label's position is its [`CategoryId`].
    pub domain: &'a [String],
    /// One code per row, `None` for a missing value.
    pub codes: &'a [Option<CategoryId>],
}

impl CategoricalView<'_> {
    /// Id of the dedicated missing level for this domain.
    pub fn missing_id(&self) -> CategoryId {
        self.domain.len() as CategoryId
    }

    /// Whether any row holds a missing value.
    pub fn has_missing(&self) -> bool {
        self.codes.iter().any(Option::is_none)
    }
}

/// Borrowed view of a column, by kind.
#[derive(Clone, Copy, Debug)]
pub enum ColumnRef<'a> {
    Categorical(CategoricalView<'a>),
    Numeric(&'a [f64]),
}

/// Abstract tabular data source.
///
/// Implementors only need to expose columns; the group-by primitive has a
/// default implementation on top of [`StatAggregator`], which engines with a
/// native group-by may override.
pub trait TableSource: Sync {
    /// Number of rows in the table.
    fn n_rows(&self) -> usize;

    /// Column names in table order.
    fn column_names(&self) -> Vec<&str>;

    /// Borrow a column by name.
    ///
    /// # Errors
    /// [`EncodingError::MissingColumn`] if no column has this name.
    fn column(&self, name: &str) -> Result<ColumnRef<'_>, EncodingError>;

    /// Whether a column with this name exists.
    fn has_column(&self, name: &str) -> bool {
        self.column(name).is_ok()
    }

    /// Group rows by `key` (and `fold`, if given) and accumulate `(sum, count)` of `response`.
    ///
    /// Rows with a missing key are grouped under the missing level; rows with a
    /// missing response are skipped. `positive_class` is required for a
    /// categorical response, see [`response_values`].
    fn group_sum_count(
        &self,
        key: &str,
        fold: Option<&str>,
        response: &str,
        positive_class: Option<&str>,
    ) -> Result<GroupedStats, EncodingError> {
        let categories = categorical(self, key)?;
        let responses = response_values(self, response, positive_class)?;
        let folds = fold.map(|f| fold_ids(self, f, None)).transpose()?;
        Ok(StatAggregator::default().aggregate(categories, &responses, folds.as_deref()))
    }
}

/// Borrow a column and require it to be categorical.
pub fn categorical<'a, T: TableSource + ?Sized>(
    source: &'a T,
    name: &str,
) -> Result<CategoricalView<'a>, EncodingError> {
    match source.column(name)? {
        ColumnRef::Categorical(view) => Ok(view),
        ColumnRef::Numeric(_) => Err(EncodingError::ColumnType {
            column: name.to_string(),
            expected: "categorical".to_string(),
        }),
    }
}

/// Decide the positive class of a response column before fitting.
///
/// A numeric response has none. A categorical response must have at most two
/// levels; the configured class wins, otherwise the second of two sorted
/// levels is positive. A single-level response needs a configured class.
pub fn response_positive_class<T: TableSource + ?Sized>(
    source: &T,
    name: &str,
    configured: Option<&str>,
) -> Result<Option<String>, EncodingError> {
    let view = match source.column(name)? {
        ColumnRef::Numeric(_) if configured.is_some() => {
            return Err(EncodingError::InvalidParameter(format!(
                "positive_class is set but response column '{}' is numeric",
                name
            )))
        }
        ColumnRef::Numeric(_) => return Ok(None),
        ColumnRef::Categorical(view) => view,
    };
    if view.domain.len() > 2 {
        return Err(EncodingError::InvalidParameter(format!(
            "categorical response column '{}' must be binary, found {} levels",
            name,
            view.domain.len()
        )));
    }
    match (configured, view.domain) {
        (Some(positive), domain) if domain.len() == 2 && !domain.iter().any(|l| l == positive) => {
            Err(EncodingError::InvalidParameter(format!(
                "positive class '{}' is not a level of response column '{}'",
                positive, name
            )))
        }
        (Some(positive), _) => Ok(Some(positive.to_string())),
        (None, [_, positive]) => Ok(Some(positive.clone())),
        (None, [only]) => Err(EncodingError::InvalidParameter(format!(
            "response column '{}' has the single level '{}'; set positive_class",
            name, only
        ))),
        (None, _) => Err(EncodingError::EmptyData(format!(
            "response column '{}' has no values",
            name
        ))),
    }
}

/// Extract the response column as per-row values, `None` for missing.
///
/// A numeric response is used as-is. A categorical response is read against
/// its positive class: that label is 1, any other label 0, so the values do
/// not depend on which levels the table happens to contain.
pub fn response_values<T: TableSource + ?Sized>(
    source: &T,
    name: &str,
    positive_class: Option<&str>,
) -> Result<Vec<Option<f64>>, EncodingError> {
    match (source.column(name)?, positive_class) {
        (ColumnRef::Numeric(values), None) => {
            if let Some(bad) = values.iter().find(|v| v.is_infinite()) {
                return Err(EncodingError::InvalidParameter(format!(
                    "response column '{}' contains a non-finite value {}",
                    name, bad
                )));
            }
            Ok(values
                .iter()
                .map(|&v| if v.is_nan() { None } else { Some(v) })
                .collect())
        }
        (ColumnRef::Numeric(_), Some(_)) => Err(EncodingError::ColumnType {
            column: name.to_string(),
            expected: "categorical".to_string(),
        }),
        (ColumnRef::Categorical(view), Some(positive)) => {
            if view.domain.len() > 2 {
                return Err(EncodingError::InvalidParameter(format!(
                    "categorical response column '{}' must be binary, found {} levels",
                    name,
                    view.domain.len()
                )));
            }
            let positive_id = view
                .domain
                .iter()
                .position(|l| l == positive)
                .map(|i| i as CategoryId);
            Ok(view
                .codes
                .iter()
                .map(|c| c.map(|c| if Some(c) == positive_id { 1.0 } else { 0.0 }))
                .collect())
        }
        (ColumnRef::Categorical(_), None) => Err(EncodingError::InvalidParameter(format!(
            "categorical response column '{}' needs a positive class",
            name
        ))),
    }
}

/// Extract fold ids for every row.
///
/// Numeric fold columns must hold integral, non-missing values and the value
/// is the fold id. For categorical fold columns `labels` fixes the fold id of
/// each label as its position in that list, so tables with a different fold
/// domain agree on the ids; without `labels` the column's own domain is used.
/// A label outside `labels` is an error.
pub fn fold_ids<T: TableSource + ?Sized>(
    source: &T,
    name: &str,
    labels: Option<&[String]>,
) -> Result<Vec<FoldId>, EncodingError> {
    match source.column(name)? {
        ColumnRef::Numeric(_) if labels.is_some() => Err(EncodingError::ColumnType {
            column: name.to_string(),
            expected: "categorical".to_string(),
        }),
        ColumnRef::Numeric(values) => values
            .iter()
            .enumerate()
            .map(|(row, &v)| {
                if v.is_finite() && v.fract() == 0.0 {
                    Ok(v as FoldId)
                } else {
                    Err(EncodingError::InvalidParameter(format!(
                        "fold column '{}' has a non-integral or missing value {} at row {}",
                        name, v, row
                    )))
                }
            })
            .collect(),
        ColumnRef::Categorical(view) => {
            let labels = labels.unwrap_or(view.domain);
            let remap: Vec<Option<FoldId>> = view
                .domain
                .iter()
                .map(|label| labels.iter().position(|l| l == label).map(|i| i as FoldId))
                .collect();
            view.codes
                .iter()
                .enumerate()
                .map(|(row, code)| {
                    let code = code.ok_or_else(|| {
                        EncodingError::InvalidParameter(format!(
                            "fold column '{}' has a missing value at row {}",
                            name, row
                        ))
                    })?;
                    remap[code as usize].ok_or_else(|| {
                        EncodingError::InvalidParameter(format!(
                            "fold column '{}' has the label '{}' at row {}, which was not seen during fitting",
                            name, view.domain[code as usize], row
                        ))
                    })
                })
                .collect()
        }
    }
}
