//! Lightweight labeled tables for raw and encoded feature data.
//!
//! # Overview
//!
//! A [`Frame`] is an ordered collection of equal-length, uniquely named
//! [`Column`]s. It is the exchange type for every schema transform: raw
//! feature tables go in, encoded/normalized tables come out. Missing entries
//! are `f64::NAN` in numeric columns and `None` in categorical columns.
//!
//! [`FeatureValue`] is the cell-level companion used when a caller supplies a
//! single query row as plain values rather than a prebuilt table.

use ndarray::{Array2, ArrayView2};

use crate::error::FrameError;

// ============================================================================
// Column
// ============================================================================

/// A single named column of tabular data.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Numeric values. `f64::NAN` marks a missing entry.
    Numeric { name: String, values: Vec<f64> },
    /// Categorical string values. `None` marks a missing entry.
    Categorical {
        name: String,
        values: Vec<Option<String>>,
    },
}

impl Column {
    /// Creates a numeric column.
    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self::Numeric {
            name: name.into(),
            values,
        }
    }

    /// Creates a categorical column where every entry is present.
    pub fn categorical<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Categorical {
            name: name.into(),
            values: values.into_iter().map(|v| Some(v.into())).collect(),
        }
    }

    /// Creates a categorical column with explicit missing entries.
    pub fn categorical_with_missing(
        name: impl Into<String>,
        values: Vec<Option<String>>,
    ) -> Self {
        Self::Categorical {
            name: name.into(),
            values,
        }
    }

    /// Column name.
    #[inline]
    pub fn name(&self) -> &str {
        match self {
            Self::Numeric { name, .. } | Self::Categorical { name, .. } => name,
        }
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric { values, .. } => values.len(),
            Self::Categorical { values, .. } => values.len(),
        }
    }

    /// Returns `true` if the column has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` for [`Column::Numeric`].
    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric { .. })
    }

    /// Last `n` rows as a new column. Returns the whole column when `n`
    /// exceeds the row count.
    fn tail(&self, n: usize) -> Self {
        let skip = self.len().saturating_sub(n);
        match self {
            Self::Numeric { name, values } => Self::Numeric {
                name: name.clone(),
                values: values[skip..].to_vec(),
            },
            Self::Categorical { name, values } => Self::Categorical {
                name: name.clone(),
                values: values[skip..].to_vec(),
            },
        }
    }
}

// ============================================================================
// Frame
// ============================================================================

/// An ordered collection of equal-length, uniquely named columns.
///
/// # Example
///
/// ```
/// use counterfeat::frame::{Column, Frame};
///
/// let frame = Frame::from_columns(vec![
///     Column::numeric("age", vec![22.0, 41.5]),
///     Column::categorical("color", ["red", "blue"]),
/// ])
/// .unwrap();
///
/// assert_eq!(frame.n_rows(), 2);
/// assert_eq!(frame.column_names().collect::<Vec<_>>(), ["age", "color"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Frame {
    /// Creates an empty frame with no columns and no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a frame from columns, validating shape and name uniqueness.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::LengthMismatch`] when column lengths differ and
    /// [`FrameError::DuplicateColumn`] when two columns share a name.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, FrameError> {
        let n_rows = columns.first().map_or(0, Column::len);
        for column in &columns {
            if column.len() != n_rows {
                return Err(FrameError::LengthMismatch {
                    column: column.name().to_string(),
                    expected: n_rows,
                    got: column.len(),
                });
            }
        }
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name() == column.name()) {
                return Err(FrameError::DuplicateColumn(column.name().to_string()));
            }
        }
        Ok(Self { columns, n_rows })
    }

    /// Builds a frame from columns already known to be equal-length and
    /// uniquely named.
    pub(crate) fn from_columns_unchecked(columns: Vec<Column>) -> Self {
        let n_rows = columns.first().map_or(0, Column::len);
        debug_assert!(columns.iter().all(|c| c.len() == n_rows));
        debug_assert!(columns
            .iter()
            .enumerate()
            .all(|(i, c)| columns[..i].iter().all(|p| p.name() != c.name())));
        Self { columns, n_rows }
    }

    /// Number of rows.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    #[inline]
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the frame has no columns.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// All columns in order.
    #[inline]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(Column::name)
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Returns `true` if a column with this name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Stacks `other` below `self`, aligning columns by name.
    ///
    /// The result keeps `self`'s column order followed by columns that only
    /// `other` has. Entries without a counterpart on the other side are
    /// filled with missing values.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::ColumnTypeMismatch`] when a shared name maps to
    /// a numeric column on one side and a categorical column on the other.
    pub fn append_rows(&self, other: &Frame) -> Result<Frame, FrameError> {
        let mut columns = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let extended = match (column, other.column(column.name())) {
                (Column::Numeric { name, values }, None) => {
                    let mut values = values.clone();
                    values.resize(self.n_rows + other.n_rows, f64::NAN);
                    Column::Numeric {
                        name: name.clone(),
                        values,
                    }
                }
                (
                    Column::Numeric { name, values },
                    Some(Column::Numeric { values: tail, .. }),
                ) => {
                    let mut values = values.clone();
                    values.extend_from_slice(tail);
                    Column::Numeric {
                        name: name.clone(),
                        values,
                    }
                }
                (Column::Categorical { name, values }, None) => {
                    let mut values = values.clone();
                    values.resize(self.n_rows + other.n_rows, None);
                    Column::Categorical {
                        name: name.clone(),
                        values,
                    }
                }
                (
                    Column::Categorical { name, values },
                    Some(Column::Categorical { values: tail, .. }),
                ) => {
                    let mut values = values.clone();
                    values.extend_from_slice(tail);
                    Column::Categorical {
                        name: name.clone(),
                        values,
                    }
                }
                _ => {
                    return Err(FrameError::ColumnTypeMismatch(
                        column.name().to_string(),
                    ))
                }
            };
            columns.push(extended);
        }
        for column in &other.columns {
            if self.has_column(column.name()) {
                continue;
            }
            let filled = match column {
                Column::Numeric { name, values } => {
                    let mut padded = vec![f64::NAN; self.n_rows];
                    padded.extend_from_slice(values);
                    Column::Numeric {
                        name: name.clone(),
                        values: padded,
                    }
                }
                Column::Categorical { name, values } => {
                    let mut padded = vec![None; self.n_rows];
                    padded.extend_from_slice(values);
                    Column::Categorical {
                        name: name.clone(),
                        values: padded,
                    }
                }
            };
            columns.push(filled);
        }
        Ok(Frame {
            columns,
            n_rows: self.n_rows + other.n_rows,
        })
    }

    /// Last `n` rows of every column. Returns a clone of the whole frame when
    /// `n` exceeds the row count.
    pub fn tail(&self, n: usize) -> Frame {
        Frame {
            columns: self.columns.iter().map(|c| c.tail(n)).collect(),
            n_rows: self.n_rows.min(n),
        }
    }

    /// Converts an all-numeric frame into a sample-major matrix of shape
    /// `(n_rows, n_columns)`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::NotNumeric`] if any column is categorical.
    pub fn to_matrix(&self) -> Result<Array2<f64>, FrameError> {
        let mut data = Vec::with_capacity(self.n_rows * self.columns.len());
        for row in 0..self.n_rows {
            for column in &self.columns {
                match column {
                    Column::Numeric { values, .. } => data.push(values[row]),
                    Column::Categorical { name, .. } => {
                        return Err(FrameError::NotNumeric(name.clone()))
                    }
                }
            }
        }
        let matrix = Array2::from_shape_vec((self.n_rows, self.columns.len()), data)
            .expect("row-major buffer matches the frame shape");
        Ok(matrix)
    }

    /// Builds an all-numeric frame from a sample-major matrix, one column
    /// name per matrix column.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::ShapeMismatch`] when the matrix width differs
    /// from `names.len()`, and [`FrameError::DuplicateColumn`] on repeated
    /// names.
    pub fn from_matrix(names: &[String], data: ArrayView2<'_, f64>) -> Result<Frame, FrameError> {
        if data.ncols() != names.len() {
            return Err(FrameError::ShapeMismatch {
                expected: names.len(),
                got: data.ncols(),
            });
        }
        let columns = names
            .iter()
            .zip(data.columns())
            .map(|(name, column)| Column::numeric(name, column.to_vec()))
            .collect();
        Self::from_columns(columns)
    }
}

// ============================================================================
// FeatureValue
// ============================================================================

/// A single raw feature value supplied in a query row.
///
/// Serializes untagged, so a JSON query row reads as a plain mixed array:
/// `[22, "Private", 45]`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    /// A continuous value.
    Numeric(f64),
    /// A categorical level.
    Categorical(String),
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        Self::Numeric(value)
    }
}

impl From<i64> for FeatureValue {
    fn from(value: i64) -> Self {
        Self::Numeric(value as f64)
    }
}

impl From<i32> for FeatureValue {
    fn from(value: i32) -> Self {
        Self::Numeric(value as f64)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        Self::Categorical(value.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(value: String) -> Self {
        Self::Categorical(value)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn sample_frame() -> Frame {
        Frame::from_columns(vec![
            Column::numeric("age", vec![22.0, 41.5, 60.0]),
            Column::categorical("color", ["red", "blue", "red"]),
        ])
        .unwrap()
    }

    #[test]
    fn from_columns_rejects_unequal_lengths() {
        let result = Frame::from_columns(vec![
            Column::numeric("age", vec![22.0, 41.5]),
            Column::categorical("color", ["red"]),
        ]);
        assert!(matches!(
            result,
            Err(FrameError::LengthMismatch { expected: 2, got: 1, .. })
        ));
    }

    #[test]
    fn from_columns_rejects_duplicate_names() {
        let result = Frame::from_columns(vec![
            Column::numeric("age", vec![22.0]),
            Column::numeric("age", vec![23.0]),
        ]);
        assert!(matches!(result, Err(FrameError::DuplicateColumn(name)) if name == "age"));
    }

    #[test]
    fn empty_frame_has_no_rows() {
        let frame = Frame::new();
        assert_eq!(frame.n_rows(), 0);
        assert_eq!(frame.n_columns(), 0);
        assert!(frame.is_empty());
    }

    #[test]
    fn column_lookup_by_name() {
        let frame = sample_frame();
        assert!(frame.has_column("color"));
        assert!(!frame.has_column("weight"));
        assert_eq!(frame.column("age").map(Column::len), Some(3));
    }

    #[test]
    fn append_rows_aligns_shared_columns() {
        let base = sample_frame();
        let extra = Frame::from_columns(vec![
            Column::categorical("color", ["green"]),
            Column::numeric("age", vec![30.0]),
        ])
        .unwrap();

        let stacked = base.append_rows(&extra).unwrap();
        assert_eq!(stacked.n_rows(), 4);
        assert_eq!(stacked.column_names().collect::<Vec<_>>(), ["age", "color"]);
        match stacked.column("age").unwrap() {
            Column::Numeric { values, .. } => assert_eq!(values, &[22.0, 41.5, 60.0, 30.0]),
            _ => panic!("age should stay numeric"),
        }
    }

    #[test]
    fn append_rows_fills_missing_on_both_sides() {
        let base = Frame::from_columns(vec![Column::numeric("age", vec![22.0])]).unwrap();
        let extra = Frame::from_columns(vec![Column::categorical("color", ["red"])]).unwrap();

        let stacked = base.append_rows(&extra).unwrap();
        assert_eq!(stacked.n_rows(), 2);
        match stacked.column("age").unwrap() {
            Column::Numeric { values, .. } => {
                assert_eq!(values[0], 22.0);
                assert!(values[1].is_nan());
            }
            _ => panic!("age should stay numeric"),
        }
        match stacked.column("color").unwrap() {
            Column::Categorical { values, .. } => {
                assert_eq!(values, &[None, Some("red".to_string())]);
            }
            _ => panic!("color should stay categorical"),
        }
    }

    #[test]
    fn append_rows_rejects_type_conflicts() {
        let base = Frame::from_columns(vec![Column::numeric("color", vec![1.0])]).unwrap();
        let extra = Frame::from_columns(vec![Column::categorical("color", ["red"])]).unwrap();
        assert!(matches!(
            base.append_rows(&extra),
            Err(FrameError::ColumnTypeMismatch(name)) if name == "color"
        ));
    }

    #[test]
    fn tail_keeps_last_rows() {
        let frame = sample_frame();
        let tail = frame.tail(1);
        assert_eq!(tail.n_rows(), 1);
        match tail.column("age").unwrap() {
            Column::Numeric { values, .. } => assert_eq!(values, &[60.0]),
            _ => panic!("age should stay numeric"),
        }

        // Oversized n returns everything.
        assert_eq!(frame.tail(10).n_rows(), 3);
    }

    #[test]
    fn matrix_round_trip() {
        let frame = Frame::from_columns(vec![
            Column::numeric("a", vec![1.0, 3.0]),
            Column::numeric("b", vec![2.0, 4.0]),
        ])
        .unwrap();

        let matrix = frame.to_matrix().unwrap();
        assert_eq!(matrix, array![[1.0, 2.0], [3.0, 4.0]]);

        let names = vec!["a".to_string(), "b".to_string()];
        let back = Frame::from_matrix(&names, matrix.view()).unwrap();
        assert_eq!(back, frame);
    }

    #[test]
    fn to_matrix_rejects_categorical_columns() {
        let frame = sample_frame();
        assert!(matches!(
            frame.to_matrix(),
            Err(FrameError::NotNumeric(name)) if name == "color"
        ));
    }

    #[test]
    fn from_matrix_rejects_width_mismatch() {
        let names = vec!["a".to_string()];
        let data = array![[1.0, 2.0]];
        assert!(matches!(
            Frame::from_matrix(&names, data.view()),
            Err(FrameError::ShapeMismatch { expected: 1, got: 2 })
        ));
    }

    #[test]
    fn feature_value_deserializes_untagged() {
        let row: Vec<FeatureValue> = serde_json::from_str(r#"[22, "Private", 45.5]"#).unwrap();
        assert_eq!(
            row,
            vec![
                FeatureValue::Numeric(22.0),
                FeatureValue::Categorical("Private".to_string()),
                FeatureValue::Numeric(45.5),
            ]
        );
    }

    #[test]
    fn feature_value_conversions() {
        assert_eq!(FeatureValue::from(22), FeatureValue::Numeric(22.0));
        assert_eq!(
            FeatureValue::from("red"),
            FeatureValue::Categorical("red".to_string())
        );
    }
}
