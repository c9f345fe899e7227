use crate::dataset::{CategoricalView, CategoryId, ColumnRef, Row, TableSource, Value};
use crate::error::EncodingError;
use std::collections::{BTreeSet, HashMap};

/// Storage for one column.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnData {
    /// Ordered domain of labels plus one code per row (`None` = missing).
    Categorical {
        domain: Vec<String>,
        codes: Vec<Option<CategoryId>>,
    },
    /// One value per row (`NaN` = missing).
    Numeric(Vec<f64>),
}

impl ColumnData {
    fn len(&self) -> usize {
        match self {
            ColumnData::Categorical { codes, .. } => codes.len(),
            ColumnData::Numeric(values) => values.len(),
        }
    }

    fn value(&self, row: usize) -> Value {
        match self {
            ColumnData::Categorical { domain, codes } => match codes[row] {
                Some(code) => Value::Str(domain[code as usize].clone()),
                None => Value::Missing,
            },
            ColumnData::Numeric(values) => {
                let v = values[row];
                if v.is_nan() {
                    Value::Missing
                } else {
                    Value::Num(v)
                }
            }
        }
    }
}

/// A named column.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

/// In-memory column-oriented table.
///
/// Categorical columns built from raw labels get a lexicographically sorted
/// domain, so the same set of labels always yields the same category ids.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Frame {
    /// Create an empty frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a categorical column from raw labels (`None` = missing).
    pub fn with_categorical<S: AsRef<str>>(
        mut self,
        name: &str,
        values: &[Option<S>],
    ) -> Result<Self, EncodingError> {
        let domain: Vec<String> = values
            .iter()
            .flatten()
            .map(|s| AsRef::<str>::as_ref(s).to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let codes: Vec<Option<CategoryId>> = {
            let index: HashMap<&str, CategoryId> = domain
                .iter()
                .enumerate()
                .map(|(i, label)| (label.as_str(), i as CategoryId))
                .collect();
            values
                .iter()
                .map(|v| {
                    v.as_ref().map(|s| {
                        let label: &str = s.as_ref();
                        index[label]
                    })
                })
                .collect()
        };
        let data = ColumnData::Categorical { domain, codes };
        self.push_column(Column {
            name: name.to_string(),
            data,
        })?;
        Ok(self)
    }

    /// Add a categorical column with an explicit domain and codes.
    pub fn with_categorical_codes(
        mut self,
        name: &str,
        domain: Vec<String>,
        codes: Vec<Option<CategoryId>>,
    ) -> Result<Self, EncodingError> {
        if let Some(bad) = codes.iter().flatten().find(|&&c| c as usize >= domain.len()) {
            return Err(EncodingError::InvalidParameter(format!(
                "code {} out of range for column '{}' with {} levels",
                bad,
                name,
                domain.len()
            )));
        }
        self.push_column(Column {
            name: name.to_string(),
            data: ColumnData::Categorical { domain, codes },
        })?;
        Ok(self)
    }

    /// Add a numeric column (`NaN` = missing).
    pub fn with_numeric(mut self, name: &str, values: Vec<f64>) -> Result<Self, EncodingError> {
        self.push_column(Column {
            name: name.to_string(),
            data: ColumnData::Numeric(values),
        })?;
        Ok(self)
    }

    /// Append a column, checking its length and name uniqueness.
    pub fn push_column(&mut self, column: Column) -> Result<(), EncodingError> {
        if self.get(&column.name).is_some() {
            return Err(EncodingError::InvalidParameter(format!(
                "duplicate column name '{}'",
                column.name
            )));
        }
        let len = column.data.len();
        if self.columns.is_empty() {
            self.n_rows = len;
        } else if len != self.n_rows {
            return Err(EncodingError::InvalidParameter(format!(
                "column '{}' has {} rows, frame has {}",
                column.name, len, self.n_rows
            )));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Look up a column by name.
    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// All columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Numeric values of a column, if it is numeric.
    pub fn numeric_values(&self, name: &str) -> Option<&[f64]> {
        match &self.get(name)?.data {
            ColumnData::Numeric(values) => Some(values),
            ColumnData::Categorical { .. } => None,
        }
    }

    /// Materialize one row as a name → value map.
    pub fn row(&self, index: usize) -> Row {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.data.value(index)))
            .collect()
    }

    /// Materialize every row.
    pub fn rows(&self) -> Vec<Row> {
        (0..self.n_rows).map(|i| self.row(i)).collect()
    }
}

impl TableSource for Frame {
    fn n_rows(&self) -> usize {
        self.n_rows
    }

    fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    fn column(&self, name: &str) -> Result<ColumnRef<'_>, EncodingError> {
        let column = self
            .get(name)
            .ok_or_else(|| EncodingError::MissingColumn(name.to_string()))?;
        Ok(match &column.data {
            ColumnData::Categorical { domain, codes } => {
                ColumnRef::Categorical(CategoricalView { domain, codes })
            }
            ColumnData::Numeric(values) => ColumnRef::Numeric(values),
        })
    }
}
