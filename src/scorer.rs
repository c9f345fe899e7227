//! Standalone scorer.
//!
//! A [`Scorer`] applies a persisted [`EncodingArtifact`] to rows or frames. It
//! performs no aggregation, never applies noise, and holds no mutable state,
//! so scoring the same row twice yields the same output and batches can be
//! scored in parallel.

use crate::artifact::{encoded_column_name, read_artifact, EncodingArtifact, SectionReader};
use crate::dataset::{Column, ColumnData, Frame, Row, TableSource, Value};
use crate::error::EncodingError;
use rayon::prelude::*;
use tracing::{info, warn};

static MISSING: Value = Value::Missing;

#[derive(Clone, Debug)]
pub struct Scorer {
    artifact: EncodingArtifact,
}

impl Scorer {
    pub fn new(artifact: EncodingArtifact) -> Self {
        Self { artifact }
    }

    /// Load the artifact from its sections.
    pub fn from_reader<R: SectionReader + ?Sized>(reader: &R) -> Result<Self, EncodingError> {
        Ok(Self::new(read_artifact(reader)?))
    }

    pub fn artifact(&self) -> &EncodingArtifact {
        &self.artifact
    }

    /// Encoded columns in output order.
    pub fn encoded_columns(&self) -> impl Iterator<Item = &str> {
        self.artifact.columns.keys().map(String::as_str)
    }

    /// Encoded values of a row, one per encoded column. Absent columns count as missing.
    pub fn encode_row(&self, row: &Row) -> Vec<f64> {
        self.encoded_columns()
            .map(|column| {
                let value = row.get(column).unwrap_or(&MISSING);
                self.artifact.encode(column, value).unwrap_or(self.artifact.prior_mean)
            })
            .collect()
    }

    /// The row plus a `<column>_te` value per encoded column.
    pub fn score_row(&self, row: &Row) -> Row {
        let mut scored = row.clone();
        for (column, value) in self.encoded_columns().zip(self.encode_row(row)) {
            scored.insert(encoded_column_name(column), Value::Num(value));
        }
        scored
    }

    /// Score rows in parallel, preserving order.
    pub fn score_batch(&self, rows: &[Row]) -> Vec<Row> {
        rows.par_iter().map(|row| self.score_row(row)).collect()
    }

    /// Append a `<column>_te` column per encoded column to a copy of `frame`.
    pub fn score_frame(&self, frame: &Frame) -> Result<Frame, EncodingError> {
        let rows: Vec<Row> = (0..frame.n_rows()).into_par_iter().map(|i| frame.row(i)).collect();
        let mut out = frame.clone();
        for column in self.encoded_columns() {
            if !frame.has_column(column) {
                warn!(column = %column, "encoded column absent from input; scoring as missing");
            }
            let values: Vec<f64> = rows
                .par_iter()
                .map(|row| {
                    let value = row.get(column).unwrap_or(&MISSING);
                    self.artifact.encode(column, value).unwrap_or(self.artifact.prior_mean)
                })
                .collect();
            out.push_column(Column {
                name: encoded_column_name(column),
                data: ColumnData::Numeric(values),
            })?;
        }
        info!(
            rows = frame.n_rows(),
            columns = self.artifact.n_columns(),
            "scored frame"
        );
        Ok(out)
    }
}
