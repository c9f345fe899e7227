//! CSV import and export for [`Frame`].
//!
//! Empty cells and `NA` are read as missing. A column becomes numeric when every
//! non-missing cell parses as a number and the caller did not force it to be
//! categorical; otherwise it becomes categorical with a sorted domain.

use crate::dataset::{ColumnData, Frame, TableSource};
use crate::error::EncodingError;
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

const MISSING_MARKERS: [&str; 2] = ["", "NA"];

fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell.trim())
}

impl Frame {
    /// Load a frame from a CSV file with a header row.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use target_encoding::dataset::Frame;
    ///
    /// let frame = Frame::from_csv("titanic.csv", &["pclass"]).unwrap();
    /// ```
    pub fn from_csv<P: AsRef<Path>>(path: P, categorical: &[&str]) -> Result<Self, EncodingError> {
        let file = File::open(path)?;
        Self::from_csv_reader(BufReader::new(file), categorical)
    }

    /// Load a frame from any CSV reader with a header row.
    pub fn from_csv_reader<R: Read>(reader: R, categorical: &[&str]) -> Result<Self, EncodingError> {
        let mut rdr = ReaderBuilder::new().from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for result in rdr.records() {
            let record = result?;
            if record.len() != headers.len() {
                return Err(EncodingError::InvalidParameter(format!(
                    "CSV record has {} fields, header has {}",
                    record.len(),
                    headers.len()
                )));
            }
            for (col, field) in record.iter().enumerate() {
                cells[col].push(field.to_string());
            }
        }

        let mut frame = Frame::new();
        for (name, column) in headers.iter().zip(cells) {
            let numeric = if categorical.contains(&name.as_str()) {
                None
            } else {
                parse_numeric(&column)
            };
            frame = match numeric {
                Some(values) => frame.with_numeric(name, values)?,
                None => {
                    let labels: Vec<Option<&str>> = column
                        .iter()
                        .map(|c| if is_missing(c) { None } else { Some(c.as_str()) })
                        .collect();
                    frame.with_categorical(name, &labels)?
                }
            };
        }
        Ok(frame)
    }

    /// Write the frame as CSV with a header row. Missing values become empty cells.
    pub fn to_csv_writer<W: Write>(&self, writer: W) -> Result<(), EncodingError> {
        let mut wtr = WriterBuilder::new().from_writer(writer);
        wtr.write_record(self.columns().iter().map(|c| c.name.as_str()))?;
        for row in 0..self.n_rows() {
            let record: Vec<String> = self
                .columns()
                .iter()
                .map(|c| match &c.data {
                    ColumnData::Categorical { domain, codes } => codes[row]
                        .map(|code| domain[code as usize].clone())
                        .unwrap_or_default(),
                    ColumnData::Numeric(values) if values[row].is_nan() => String::new(),
                    ColumnData::Numeric(values) => values[row].to_string(),
                })
                .collect();
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Write the frame to a CSV file.
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), EncodingError> {
        let file = File::create(path)?;
        self.to_csv_writer(file)
    }
}

fn parse_numeric(column: &[String]) -> Option<Vec<f64>> {
    column
        .iter()
        .map(|cell| {
            if is_missing(cell) {
                Some(f64::NAN)
            } else {
                cell.trim().parse::<f64>().ok()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "city,pclass,survived\nOslo,1,1\nRome,3,0\n,1,NA\nOslo,2,1\n";

    #[test]
    fn test_from_csv_infers_column_kinds() {
        let frame = Frame::from_csv_reader(CSV.as_bytes(), &["pclass"]).unwrap();
        assert_eq!(frame.n_rows(), 4);
        assert!(matches!(
            frame.get("city").unwrap().data,
            ColumnData::Categorical { .. }
        ));
        assert!(matches!(
            frame.get("pclass").unwrap().data,
            ColumnData::Categorical { .. }
        ));
        let survived = frame.numeric_values("survived").unwrap();
        assert_eq!(survived[0], 1.0);
        assert!(survived[2].is_nan());
    }

    #[test]
    fn test_csv_roundtrip() {
        let frame = Frame::from_csv_reader(CSV.as_bytes(), &[]).unwrap();
        let mut out = Vec::new();
        frame.to_csv_writer(&mut out).unwrap();
        let reloaded = Frame::from_csv_reader(out.as_slice(), &[]).unwrap();
        assert_eq!(reloaded.rows(), frame.rows());
    }

    #[test]
    fn test_ragged_csv_is_rejected() {
        let ragged = "a,b\n1,2\n3\n";
        assert!(Frame::from_csv_reader(ragged.as_bytes(), &[]).is_err());
    }
}
