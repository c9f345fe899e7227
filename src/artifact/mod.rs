//! Engine-independent encoding artifact.
//!
//! An [`EncodingArtifact`] holds everything a scorer needs: the prior mean, the
//! blending configuration, and per encoded column its training domain, whether
//! a missing level was seen, and the fold-independent `(sum, count)` map. It is
//! an immutable value once built; see [`codec`] for the text layout.

use crate::dataset::{CategoryId, Value};
use crate::encoding::blending::{encoding_value, BlendingParams};
use crate::encoding::stats::{ColumnEncodingMap, Stat};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub mod codec;

pub use codec::{read_artifact, write_artifact, DirectoryStore, MemoryStore, SectionReader, SectionWriter};

/// Suffix appended to the name of every encoded column.
pub const ENCODED_COLUMN_SUFFIX: &str = "_te";

/// Name of the output column for an encoded input column.
pub fn encoded_column_name(column: &str) -> String {
    format!("{}{}", column, ENCODED_COLUMN_SUFFIX)
}

#[derive(Serialize, Deserialize)]
struct RawColumnEncoding {
    domain: Vec<String>,
    missing_value_present: bool,
    map: ColumnEncodingMap,
}

/// Encoding state of one column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawColumnEncoding", into = "RawColumnEncoding")]
pub struct ColumnEncoding {
    domain: Vec<String>,
    missing_value_present: bool,
    map: ColumnEncodingMap,
    index: HashMap<String, CategoryId>,
}

impl From<RawColumnEncoding> for ColumnEncoding {
    fn from(raw: RawColumnEncoding) -> Self {
        ColumnEncoding::new(raw.domain, raw.missing_value_present, raw.map)
    }
}

impl From<ColumnEncoding> for RawColumnEncoding {
    fn from(column: ColumnEncoding) -> Self {
        RawColumnEncoding {
            domain: column.domain,
            missing_value_present: column.missing_value_present,
            map: column.map,
        }
    }
}

impl ColumnEncoding {
    pub fn new(domain: Vec<String>, missing_value_present: bool, map: ColumnEncodingMap) -> Self {
        let index = domain
            .iter()
            .enumerate()
            .map(|(i, label)| (label.clone(), i as CategoryId))
            .collect();
        Self {
            domain,
            missing_value_present,
            map,
            index,
        }
    }

    /// Training-time domain; a label's position is its category id.
    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    /// Whether any training row was missing this column.
    pub fn missing_value_present(&self) -> bool {
        self.missing_value_present
    }

    pub fn map(&self) -> &ColumnEncodingMap {
        &self.map
    }

    /// Category id of the missing level.
    pub fn missing_id(&self) -> CategoryId {
        self.domain.len() as CategoryId
    }

    /// Id of a training-domain label.
    pub fn label_id(&self, label: &str) -> Option<CategoryId> {
        self.index.get(label).copied()
    }

    /// Id of a raw value within the training domain, `None` when missing or unseen.
    ///
    /// Numbers match labels by their textual form, so `3.0` resolves `"3"` or `"3.0"`.
    pub fn resolve(&self, value: &Value) -> Option<CategoryId> {
        match value {
            Value::Missing => None,
            Value::Str(label) => self.label_id(label),
            Value::Num(v) if v.is_nan() => None,
            Value::Num(v) => self.label_id(&v.to_string()).or_else(|| {
                if v.fract() == 0.0 {
                    self.label_id(&format!("{:.1}", v))
                } else {
                    None
                }
            }),
        }
    }

    /// Category id to look up for a resolved (or unresolved) value.
    ///
    /// Unresolved values use the missing level when one was seen during
    /// training, otherwise there is nothing to look up.
    pub fn lookup_id(&self, resolved: Option<CategoryId>) -> Option<CategoryId> {
        match resolved {
            Some(id) => Some(id),
            None if self.missing_value_present => Some(self.missing_id()),
            None => None,
        }
    }

    /// Persisted statistic for a lookup id.
    pub fn stat(&self, id: Option<CategoryId>) -> Option<Stat> {
        id.and_then(|id| self.map.get(id))
    }
}

/// Immutable result of fitting a target encoder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncodingArtifact {
    /// Mean response over every training row with a response.
    pub prior_mean: f64,
    /// Whether encodings are blended with the prior.
    pub with_blending: bool,
    /// Blending parameters; written only when blending is enabled.
    pub blending: BlendingParams,
    /// Encoded columns, by original name.
    pub columns: BTreeMap<String, ColumnEncoding>,
}

impl EncodingArtifact {
    pub fn new(prior_mean: f64, with_blending: bool, blending: BlendingParams) -> Self {
        Self {
            prior_mean,
            with_blending,
            blending,
            columns: BTreeMap::new(),
        }
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnEncoding> {
        self.columns.get(name)
    }

    /// Blending parameters in effect, `None` when blending is disabled.
    pub fn blending_params(&self) -> Option<&BlendingParams> {
        self.with_blending.then_some(&self.blending)
    }

    /// Encoding value for a (possibly leakage-adjusted) statistic.
    pub fn value_of(&self, stat: Option<Stat>) -> f64 {
        encoding_value(stat, self.prior_mean, self.blending_params())
    }

    /// Encode one raw value of `column`; `None` when the column is not encoded.
    pub fn encode(&self, column: &str, value: &Value) -> Option<f64> {
        let encoding = self.column(column)?;
        let id = encoding.lookup_id(encoding.resolve(value));
        Some(self.value_of(encoding.stat(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::stats::CategoryStat;

    fn artifact(missing: bool) -> EncodingArtifact {
        let mut map = ColumnEncodingMap::new();
        map.insert(CategoryStat {
            category_id: 0,
            sum: 3.0,
            count: 4,
        });
        map.insert(CategoryStat {
            category_id: 2,
            sum: 1.0,
            count: 1,
        });
        let mut artifact = EncodingArtifact::new(0.25, false, BlendingParams::DEFAULT);
        artifact.columns.insert(
            "city".to_string(),
            ColumnEncoding::new(vec!["Oslo".to_string(), "3".to_string()], missing, map),
        );
        artifact
    }

    #[test]
    fn test_encode_known_and_unseen() {
        let a = artifact(true);
        assert_eq!(a.encode("city", &Value::from("Oslo")), Some(0.75));
        // known label without statistics
        assert_eq!(a.encode("city", &Value::from("3")), Some(0.25));
        assert_eq!(a.encode("other", &Value::from("Oslo")), None);
    }

    #[test]
    fn test_missing_uses_na_level_when_present() {
        let a = artifact(true);
        assert_eq!(a.encode("city", &Value::Missing), Some(1.0));
        assert_eq!(a.encode("city", &Value::from("Paris")), Some(1.0));

        let b = artifact(false);
        assert_eq!(b.encode("city", &Value::Missing), Some(0.25));
        assert_eq!(b.encode("city", &Value::from("Paris")), Some(0.25));
    }

    #[test]
    fn test_numeric_values_match_labels() {
        let a = artifact(false);
        let column = a.column("city").unwrap();
        assert_eq!(column.resolve(&Value::Num(3.0)), Some(1));
        assert_eq!(column.resolve(&Value::Num(f64::NAN)), None);
    }

    #[test]
    fn test_bincode_rebuilds_index() {
        let a = artifact(true);
        let bytes = bincode::serialize(&a).unwrap();
        let back: EncodingArtifact = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, a);
        assert_eq!(back.column("city").unwrap().label_id("Oslo"), Some(0));
    }
}
