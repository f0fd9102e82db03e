//! Feature schema: a metadata-only description of a tabular dataset and the
//! transforms between raw and encoded feature space.
//!
//! # Overview
//!
//! A [`FeatureSchema`] is built from declarations alone, for settings where
//! feature ranges and level sets are shareable but the data itself is not.
//! From those declarations it derives a fixed one-hot [`EncodedLayout`] and
//! provides every transform an explanation engine needs on top of it:
//! range normalization, one-hot encoding and decoding, encoded-space bounds
//! and index groups, and validated query-row preparation.
//!
//! # Example
//!
//! ```
//! use counterfeat::frame::FeatureValue;
//! use counterfeat::schema::FeatureSchema;
//!
//! let schema = FeatureSchema::builder()
//!     .continuous("age", 18.0, 65.0)
//!     .categorical("color", ["red", "green", "blue"])
//!     .outcome("label")
//!     .build()?;
//!
//! assert_eq!(
//!     schema.encoded_feature_names(),
//!     &["age", "color_blue", "color_green", "color_red"]
//! );
//!
//! let row = [FeatureValue::from(41.5), FeatureValue::from("green")];
//! let encoded = schema.query_input(&row, true)?;
//! assert_eq!(encoded.n_rows(), 1);
//! # Ok::<(), counterfeat::error::ConfigurationError>(())
//! ```

mod builder;
mod config;
mod layout;

pub use builder::SchemaBuilder;
pub use config::{FeatureSpec, Precision, SchemaConfig};
pub use layout::{EncodedLayout, OneHotGroup};

use std::collections::HashMap;

use ndarray::{Array1, ArrayView2};
use tracing::{debug, trace};

use crate::error::{ConfigurationError, FrameError, UnsupportedError};
use crate::frame::{Column, FeatureValue, Frame};

// ============================================================================
// Supporting types
// ============================================================================

/// Selection of features an explanation search may perturb.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FeaturesToVary {
    /// Every encoded column.
    #[default]
    All,
    /// Only the named raw features. A categorical name selects its whole
    /// one-hot group.
    Only(Vec<String>),
}

impl FeaturesToVary {
    /// Selection limited to the named raw features.
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(names.into_iter().map(Into::into).collect())
    }
}

/// Optimizer-facing description of the encoded search space.
#[derive(Debug, Clone, PartialEq)]
pub struct DataParams {
    /// Per-position lower bounds in normalized encoded space.
    pub minx: Array1<f64>,
    /// Per-position upper bounds in normalized encoded space.
    pub maxx: Array1<f64>,
    /// Encoded positions of continuous features.
    pub continuous_indexes: Vec<usize>,
    /// Encoded positions of each categorical feature's one-hot columns, one
    /// group per feature in declaration order.
    pub categorical_groups: Vec<Vec<usize>>,
}

/// One declared feature with its resolved kind and distance weight.
#[derive(Debug, Clone)]
struct Feature {
    name: String,
    kind: FeatureKind,
    mad: f64,
}

#[derive(Debug, Clone)]
enum FeatureKind {
    Continuous {
        min: f64,
        max: f64,
        precision: Precision,
    },
    Categorical {
        /// Levels in declaration order.
        levels: Vec<String>,
        /// The same levels in lexicographic order, matching the encoded
        /// layout.
        sorted_levels: Vec<String>,
    },
}

// ============================================================================
// FeatureSchema
// ============================================================================

/// Metadata-only description of a tabular dataset.
///
/// Holds per-feature declarations (permitted range or level set), the
/// outcome column name, and the derived encoded layout. All transforms are
/// pure: they read the schema and build fresh [`Frame`]s.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    outcome_name: String,
    features: Vec<Feature>,
    name_index: HashMap<String, usize>,
    layout: EncodedLayout,
}

impl FeatureSchema {
    /// Starts a [`SchemaBuilder`].
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Validates a [`SchemaConfig`] and builds the schema.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] describing the first violated
    /// construction rule: empty declarations, duplicate names, an outcome
    /// that is also a feature, an invalid continuous range, an empty or
    /// duplicated level set, precision metadata on unknown or categorical
    /// features, a mad list of the wrong length, or two declarations mapping
    /// to the same encoded column name.
    pub fn from_config(config: SchemaConfig) -> Result<Self, ConfigurationError> {
        let SchemaConfig {
            features: declared,
            outcome_name,
            precision,
            mad,
        } = config;

        if declared.is_empty() {
            return Err(ConfigurationError::EmptyFeatures);
        }
        if outcome_name.is_empty() {
            return Err(ConfigurationError::EmptyOutcome);
        }

        let mut name_index = HashMap::with_capacity(declared.len());
        for (index, (name, _)) in declared.iter().enumerate() {
            if name_index.insert(name.clone(), index).is_some() {
                return Err(ConfigurationError::DuplicateFeature(name.clone()));
            }
        }
        if name_index.contains_key(&outcome_name) {
            return Err(ConfigurationError::OutcomeIsFeature(outcome_name));
        }

        let mads = match mad {
            Some(values) if values.len() != declared.len() => {
                return Err(ConfigurationError::MadLength {
                    expected: declared.len(),
                    got: values.len(),
                })
            }
            Some(values) => values,
            None => vec![1.0; declared.len()],
        };

        for name in precision.keys() {
            match name_index.get(name) {
                None => return Err(ConfigurationError::UnknownFeature(name.clone())),
                Some(&index) if declared[index].1.is_categorical() => {
                    return Err(ConfigurationError::PrecisionOnCategorical(name.clone()))
                }
                Some(_) => {}
            }
        }

        let mut precision = precision;
        let mut features = Vec::with_capacity(declared.len());
        for ((name, spec), mad) in declared.into_iter().zip(mads) {
            let kind = match spec {
                FeatureSpec::Continuous { min, max } => {
                    if !min.is_finite() || !max.is_finite() || min >= max {
                        return Err(ConfigurationError::InvalidRange {
                            feature: name,
                            min,
                            max,
                        });
                    }
                    let precision = precision.remove(&name).unwrap_or_default();
                    FeatureKind::Continuous {
                        min,
                        max,
                        precision,
                    }
                }
                FeatureSpec::Categorical { levels } => {
                    if levels.is_empty() {
                        return Err(ConfigurationError::EmptyLevels(name));
                    }
                    let mut sorted_levels = levels.clone();
                    sorted_levels.sort();
                    if let Some(pair) = sorted_levels.windows(2).find(|w| w[0] == w[1]) {
                        return Err(ConfigurationError::DuplicateLevel {
                            feature: name,
                            level: pair[0].clone(),
                        });
                    }
                    FeatureKind::Categorical {
                        levels,
                        sorted_levels,
                    }
                }
            };
            features.push(Feature { name, kind, mad });
        }

        let layout = EncodedLayout::build(&features);
        let mut encoded_names = layout.names().to_vec();
        encoded_names.sort();
        if let Some(pair) = encoded_names.windows(2).find(|w| w[0] == w[1]) {
            return Err(ConfigurationError::EncodedNameClash(pair[0].clone()));
        }

        debug!(
            n_features = features.len(),
            n_encoded = layout.n_columns(),
            outcome = %outcome_name,
            "feature schema constructed"
        );

        Ok(Self {
            outcome_name,
            features,
            name_index,
            layout,
        })
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Name of the predicted column.
    #[inline]
    pub fn outcome_name(&self) -> &str {
        &self.outcome_name
    }

    /// Number of declared features.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    /// Feature names in declaration order.
    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|f| f.name.as_str())
    }

    /// Position of a feature in declaration order.
    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.name_index.get(name).copied()
    }

    /// Continuous feature names in declaration order.
    pub fn continuous_feature_names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().filter_map(|f| match f.kind {
            FeatureKind::Continuous { .. } => Some(f.name.as_str()),
            FeatureKind::Categorical { .. } => None,
        })
    }

    /// Categorical feature names in declaration order.
    pub fn categorical_feature_names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().filter_map(|f| match f.kind {
            FeatureKind::Categorical { .. } => Some(f.name.as_str()),
            FeatureKind::Continuous { .. } => None,
        })
    }

    /// Declaration-order positions of continuous features.
    pub fn continuous_indexes(&self) -> Vec<usize> {
        self.features
            .iter()
            .enumerate()
            .filter_map(|(i, f)| match f.kind {
                FeatureKind::Continuous { .. } => Some(i),
                FeatureKind::Categorical { .. } => None,
            })
            .collect()
    }

    /// Declaration-order positions of categorical features.
    pub fn categorical_indexes(&self) -> Vec<usize> {
        self.features
            .iter()
            .enumerate()
            .filter_map(|(i, f)| match f.kind {
                FeatureKind::Categorical { .. } => Some(i),
                FeatureKind::Continuous { .. } => None,
            })
            .collect()
    }

    /// Permitted `[min, max]` range of a continuous feature.
    pub fn permitted_range(&self, feature: &str) -> Option<(f64, f64)> {
        match &self.features[self.feature_index(feature)?].kind {
            FeatureKind::Continuous { min, max, .. } => Some((*min, *max)),
            FeatureKind::Categorical { .. } => None,
        }
    }

    /// Declared levels of a categorical feature, in declaration order.
    pub fn levels(&self, feature: &str) -> Option<&[String]> {
        match &self.features[self.feature_index(feature)?].kind {
            FeatureKind::Categorical { levels, .. } => Some(levels),
            FeatureKind::Continuous { .. } => None,
        }
    }

    /// The derived encoded-column layout.
    #[inline]
    pub fn layout(&self) -> &EncodedLayout {
        &self.layout
    }

    /// Encoded column names: continuous features first, then one-hot dummy
    /// columns per categorical feature.
    #[inline]
    pub fn encoded_feature_names(&self) -> &[String] {
        self.layout.names()
    }

    /// Median absolute deviation per feature, in declaration order.
    ///
    /// The `normalized` flag is accepted for interface parity with
    /// data-backed schemas; a metadata-only schema returns the declared (or
    /// default 1.0) deviations either way.
    pub fn mads(&self, _normalized: bool) -> Vec<f64> {
        self.features.iter().map(|f| f.mad).collect()
    }

    /// Decimal precision per feature, in declaration order. Categorical
    /// features report zero.
    pub fn decimal_precisions(&self) -> Vec<u32> {
        self.features
            .iter()
            .map(|f| match &f.kind {
                FeatureKind::Continuous { precision, .. } => precision.decimals(),
                FeatureKind::Categorical { .. } => 0,
            })
            .collect()
    }

    fn is_categorical_feature(&self, name: &str) -> bool {
        self.feature_index(name)
            .is_some_and(|i| matches!(self.features[i].kind, FeatureKind::Categorical { .. }))
    }

    fn max_level_count(&self) -> usize {
        self.features
            .iter()
            .map(|f| match &f.kind {
                FeatureKind::Categorical { levels, .. } => levels.len(),
                FeatureKind::Continuous { .. } => 0,
            })
            .max()
            .unwrap_or(0)
    }

    // ------------------------------------------------------------------------
    // Range normalization
    // ------------------------------------------------------------------------

    /// Maps continuous feature columns onto `[0, 1]` by their permitted
    /// range. Other columns pass through untouched; missing entries stay
    /// missing.
    pub fn normalize(&self, frame: &Frame) -> Frame {
        self.scale_continuous(frame, |value, min, max| (value - min) / (max - min))
    }

    /// Maps normalized continuous feature columns back onto their permitted
    /// range. Inverse of [`FeatureSchema::normalize`].
    pub fn denormalize(&self, frame: &Frame) -> Frame {
        self.scale_continuous(frame, |value, min, max| value * (max - min) + min)
    }

    fn scale_continuous(&self, frame: &Frame, op: impl Fn(f64, f64, f64) -> f64) -> Frame {
        let columns = frame
            .columns()
            .iter()
            .map(|column| match column {
                Column::Numeric { name, values } => match self.permitted_range(name) {
                    Some((min, max)) => Column::Numeric {
                        name: name.clone(),
                        values: values.iter().map(|&v| op(v, min, max)).collect(),
                    },
                    None => column.clone(),
                },
                Column::Categorical { .. } => column.clone(),
            })
            .collect();
        Frame::from_columns_unchecked(columns)
    }

    // ------------------------------------------------------------------------
    // Encoded-space parameters
    // ------------------------------------------------------------------------

    /// Per-position lower and upper bounds over the encoded columns.
    ///
    /// Normalized bounds are all `0.0` and `1.0`. De-normalized bounds carry
    /// each continuous feature's permitted range at its position; one-hot
    /// positions stay at `(0.0, 1.0)` in both modes.
    pub fn encoded_bounds(&self, normalized: bool) -> (Array1<f64>, Array1<f64>) {
        let width = self.layout.n_columns();
        let mut minx = Array1::zeros(width);
        let mut maxx = Array1::ones(width);
        if !normalized {
            let mut position = 0;
            for feature in &self.features {
                if let FeatureKind::Continuous { min, max, .. } = feature.kind {
                    minx[position] = min;
                    maxx[position] = max;
                    position += 1;
                }
            }
        }
        (minx, maxx)
    }

    /// Bundles normalized bounds and encoded index groups for an optimizer.
    pub fn data_params(&self) -> DataParams {
        let (minx, maxx) = self.encoded_bounds(true);
        DataParams {
            minx,
            maxx,
            continuous_indexes: self.layout.continuous_positions().collect(),
            categorical_groups: self
                .layout
                .groups()
                .iter()
                .map(|g| g.positions().collect())
                .collect(),
        }
    }

    /// Resolves a feature selection to ascending encoded positions.
    ///
    /// A continuous name selects its single column; a categorical name
    /// selects its whole one-hot group. Names are resolved against the
    /// declared features, so `color` never picks up columns of an unrelated
    /// `colorful` feature.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownFeature`] when a name was never
    /// declared.
    pub fn vary_indexes(
        &self,
        selection: &FeaturesToVary,
    ) -> Result<Vec<usize>, ConfigurationError> {
        let names = match selection {
            FeaturesToVary::All => return Ok((0..self.layout.n_columns()).collect()),
            FeaturesToVary::Only(names) => names,
        };
        let mut mask = vec![false; self.layout.n_columns()];
        for name in names {
            let index = self
                .feature_index(name)
                .ok_or_else(|| ConfigurationError::UnknownFeature(name.clone()))?;
            match &self.features[index].kind {
                FeatureKind::Continuous { .. } => {
                    let position = self
                        .layout
                        .continuous_position(name)
                        .expect("declared continuous feature has an encoded position");
                    mask[position] = true;
                }
                FeatureKind::Categorical { .. } => {
                    let group = self
                        .layout
                        .group(name)
                        .expect("declared categorical feature has a one-hot group");
                    for position in group.positions() {
                        mask[position] = true;
                    }
                }
            }
        }
        Ok(mask
            .iter()
            .enumerate()
            .filter_map(|(i, &selected)| selected.then_some(i))
            .collect())
    }

    // ------------------------------------------------------------------------
    // One-hot encoding
    // ------------------------------------------------------------------------

    /// One-hot encodes every declared categorical column of `frame`.
    ///
    /// Columns that are not declared categorical features pass through first
    /// in their original relative order. Each categorical feature then
    /// contributes one `1.0`/`0.0` dummy column per level observed in the
    /// frame, levels in lexicographic order. Missing entries produce all-zero
    /// rows. Encoding the [`FeatureSchema::encoding_template`] (or any table
    /// stacked on it) therefore yields exactly the full encoded layout.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::MissingColumn`] when a declared categorical
    /// feature has no column in `frame` and
    /// [`FrameError::ColumnTypeMismatch`] when its column is numeric.
    pub fn one_hot_encode(&self, frame: &Frame) -> Result<Frame, FrameError> {
        let mut columns: Vec<Column> = frame
            .columns()
            .iter()
            .filter(|c| !self.is_categorical_feature(c.name()))
            .cloned()
            .collect();

        for feature in &self.features {
            if !matches!(feature.kind, FeatureKind::Categorical { .. }) {
                continue;
            }
            let column = frame
                .column(&feature.name)
                .ok_or_else(|| FrameError::MissingColumn(feature.name.clone()))?;
            let values = match column {
                Column::Categorical { values, .. } => values,
                Column::Numeric { .. } => {
                    return Err(FrameError::ColumnTypeMismatch(feature.name.clone()))
                }
            };

            let mut observed: Vec<&String> = values.iter().flatten().collect();
            observed.sort();
            observed.dedup();

            for level in observed {
                let dummies = values
                    .iter()
                    .map(|v| match v {
                        Some(current) if current == level => 1.0,
                        _ => 0.0,
                    })
                    .collect();
                columns.push(Column::Numeric {
                    name: format!("{}_{}", feature.name, level),
                    values: dummies,
                });
            }
        }

        Frame::from_columns(columns)
    }

    /// Reverses one-hot encoding back to categorical columns.
    ///
    /// For each declared categorical feature the dummy columns present in
    /// `frame` are scanned in lexicographic level order and each row decodes
    /// to the level with the largest value; ties keep the first level in
    /// that order. Columns that are not dummy columns of the layout pass
    /// through, and decoded categorical columns are appended after them in
    /// declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::MissingColumn`] when none of a feature's dummy
    /// columns are present and [`FrameError::ColumnTypeMismatch`] when a
    /// dummy column is not numeric.
    pub fn decode(&self, frame: &Frame) -> Result<Frame, FrameError> {
        let mut columns: Vec<Column> = frame
            .columns()
            .iter()
            .filter(|c| !self.layout.is_dummy(c.name()))
            .cloned()
            .collect();

        for group in self.layout.groups() {
            let encoded_names = &self.layout.names()[group.positions()];
            let mut observed: Vec<(&str, &[f64])> = Vec::new();
            for (level, encoded_name) in group.levels().iter().zip(encoded_names) {
                match frame.column(encoded_name) {
                    Some(Column::Numeric { values, .. }) => {
                        observed.push((level.as_str(), values.as_slice()));
                    }
                    Some(Column::Categorical { .. }) => {
                        return Err(FrameError::ColumnTypeMismatch(encoded_name.clone()))
                    }
                    None => {}
                }
            }
            if observed.is_empty() {
                return Err(FrameError::MissingColumn(group.feature().to_string()));
            }

            let mut decoded = Vec::with_capacity(frame.n_rows());
            for row in 0..frame.n_rows() {
                let mut best = 0;
                let mut best_value = f64::NEG_INFINITY;
                for (i, (_, values)) in observed.iter().enumerate() {
                    if values[row] > best_value {
                        best_value = values[row];
                        best = i;
                    }
                }
                decoded.push(Some(observed[best].0.to_string()));
            }
            columns.push(Column::Categorical {
                name: group.feature().to_string(),
                values: decoded,
            });
        }

        Frame::from_columns(columns)
    }

    /// Decodes a bare sample-major matrix whose columns follow
    /// [`FeatureSchema::encoded_feature_names`].
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::ShapeMismatch`] when the matrix width differs
    /// from the encoded layout, plus any [`FeatureSchema::decode`] error.
    pub fn decode_matrix(&self, data: ArrayView2<'_, f64>) -> Result<Frame, FrameError> {
        let frame = Frame::from_matrix(self.encoded_feature_names(), data)?;
        self.decode(&frame)
    }

    // ------------------------------------------------------------------------
    // Query preparation
    // ------------------------------------------------------------------------

    /// A table with one column per feature where each categorical column
    /// holds its declared levels and each continuous column is all-missing,
    /// padded to the longest level set.
    ///
    /// Stacking rows on this table before encoding guarantees every level of
    /// every categorical feature is observed, so the encoded columns always
    /// span the full layout.
    pub fn encoding_template(&self) -> Frame {
        let depth = self.max_level_count();
        let columns = self
            .features
            .iter()
            .map(|feature| match &feature.kind {
                FeatureKind::Continuous { .. } => Column::Numeric {
                    name: feature.name.clone(),
                    values: vec![f64::NAN; depth],
                },
                FeatureKind::Categorical { levels, .. } => {
                    let mut values: Vec<Option<String>> =
                        levels.iter().cloned().map(Some).collect();
                    values.resize(depth, None);
                    Column::Categorical {
                        name: feature.name.clone(),
                        values,
                    }
                }
            })
            .collect();
        Frame::from_columns_unchecked(columns)
    }

    /// Validates one raw query row and prepares it for the explanation
    /// engine.
    ///
    /// Values follow feature declaration order. With `encode` set the row is
    /// stacked on the encoding template, one-hot encoded, normalized, and
    /// the final row returned, so the result always spans the full encoded
    /// layout. Without `encode` the row is only normalized.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::QueryLength`] on a wrong value count,
    /// [`ConfigurationError::QueryType`] when a value's kind contradicts the
    /// declaration, and [`ConfigurationError::UnknownLevel`] for a level the
    /// schema never declared.
    pub fn query_input(
        &self,
        values: &[FeatureValue],
        encode: bool,
    ) -> Result<Frame, ConfigurationError> {
        if values.len() != self.features.len() {
            return Err(ConfigurationError::QueryLength {
                expected: self.features.len(),
                got: values.len(),
            });
        }

        let mut columns = Vec::with_capacity(values.len());
        for (feature, value) in self.features.iter().zip(values) {
            let column = match (&feature.kind, value) {
                (FeatureKind::Continuous { .. }, FeatureValue::Numeric(v)) => {
                    Column::numeric(&feature.name, vec![*v])
                }
                (FeatureKind::Categorical { levels, .. }, FeatureValue::Categorical(level)) => {
                    if !levels.contains(level) {
                        return Err(ConfigurationError::UnknownLevel {
                            feature: feature.name.clone(),
                            level: level.clone(),
                        });
                    }
                    Column::categorical_with_missing(&feature.name, vec![Some(level.clone())])
                }
                (FeatureKind::Continuous { .. }, FeatureValue::Categorical(_)) => {
                    return Err(ConfigurationError::QueryType {
                        feature: feature.name.clone(),
                        expected: "numeric",
                    })
                }
                (FeatureKind::Categorical { .. }, FeatureValue::Numeric(_)) => {
                    return Err(ConfigurationError::QueryType {
                        feature: feature.name.clone(),
                        expected: "categorical",
                    })
                }
            };
            columns.push(column);
        }
        let query = Frame::from_columns_unchecked(columns);

        trace!(encode, n_features = values.len(), "building query input");

        if !encode {
            return Ok(self.normalize(&query));
        }

        let staged = self
            .encoding_template()
            .append_rows(&query)
            .expect("template and query columns align by construction");
        let encoded = self
            .one_hot_encode(&staged)
            .expect("template supplies every declared categorical column");
        Ok(self.normalize(&encoded).tail(query.n_rows()))
    }

    /// Development data cannot be derived from metadata alone.
    ///
    /// # Errors
    ///
    /// Always returns [`UnsupportedError`].
    pub fn dev_data(&self) -> Result<Frame, UnsupportedError> {
        Err(UnsupportedError)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use ndarray::array;

    use super::*;

    pub(super) fn feature_fixtures() -> Vec<Feature> {
        vec![
            Feature {
                name: "age".to_string(),
                kind: FeatureKind::Continuous {
                    min: 18.0,
                    max: 65.0,
                    precision: Precision::Int,
                },
                mad: 1.0,
            },
            Feature {
                name: "color".to_string(),
                kind: FeatureKind::Categorical {
                    levels: vec!["red".to_string(), "green".to_string(), "blue".to_string()],
                    sorted_levels: vec![
                        "blue".to_string(),
                        "green".to_string(),
                        "red".to_string(),
                    ],
                },
                mad: 1.0,
            },
            Feature {
                name: "hours".to_string(),
                kind: FeatureKind::Continuous {
                    min: 20.0,
                    max: 80.0,
                    precision: Precision::Float { decimals: 2 },
                },
                mad: 1.0,
            },
            Feature {
                name: "size".to_string(),
                kind: FeatureKind::Categorical {
                    levels: vec!["S".to_string(), "L".to_string()],
                    sorted_levels: vec!["L".to_string(), "S".to_string()],
                },
                mad: 1.0,
            },
        ]
    }

    fn mixed_schema() -> FeatureSchema {
        FeatureSchema::builder()
            .continuous("age", 18.0, 65.0)
            .categorical("color", ["red", "green", "blue"])
            .continuous("hours", 20.0, 80.0)
            .categorical("size", ["S", "L"])
            .precision("hours", Precision::Float { decimals: 2 })
            .outcome("label")
            .build()
            .unwrap()
    }

    #[test]
    fn construction_rejects_bad_configs() {
        let empty = FeatureSchema::from_config(SchemaConfig {
            features: vec![],
            outcome_name: "label".to_string(),
            precision: BTreeMap::new(),
            mad: None,
        });
        assert!(matches!(empty, Err(ConfigurationError::EmptyFeatures)));

        let outcome_clash = FeatureSchema::builder()
            .continuous("age", 18.0, 65.0)
            .outcome("age")
            .build();
        assert!(matches!(
            outcome_clash,
            Err(ConfigurationError::OutcomeIsFeature(name)) if name == "age"
        ));

        let inverted = FeatureSchema::builder()
            .continuous("age", 65.0, 18.0)
            .outcome("label")
            .build();
        assert!(matches!(
            inverted,
            Err(ConfigurationError::InvalidRange { .. })
        ));

        let nan_bound = FeatureSchema::builder()
            .continuous("age", f64::NAN, 65.0)
            .outcome("label")
            .build();
        assert!(matches!(
            nan_bound,
            Err(ConfigurationError::InvalidRange { .. })
        ));

        let no_levels = FeatureSchema::builder()
            .categorical("color", Vec::<String>::new())
            .outcome("label")
            .build();
        assert!(matches!(
            no_levels,
            Err(ConfigurationError::EmptyLevels(name)) if name == "color"
        ));

        let repeated_level = FeatureSchema::builder()
            .categorical("color", ["red", "red"])
            .outcome("label")
            .build();
        assert!(matches!(
            repeated_level,
            Err(ConfigurationError::DuplicateLevel { level, .. }) if level == "red"
        ));

        let repeated_feature = FeatureSchema::builder()
            .continuous("age", 18.0, 65.0)
            .continuous("age", 20.0, 70.0)
            .outcome("label")
            .build();
        assert!(matches!(
            repeated_feature,
            Err(ConfigurationError::DuplicateFeature(name)) if name == "age"
        ));
    }

    #[test]
    fn construction_rejects_bad_precision_metadata() {
        let unknown = FeatureSchema::builder()
            .continuous("age", 18.0, 65.0)
            .precision("weight", Precision::Int)
            .outcome("label")
            .build();
        assert!(matches!(
            unknown,
            Err(ConfigurationError::UnknownFeature(name)) if name == "weight"
        ));

        let on_categorical = FeatureSchema::builder()
            .categorical("color", ["red", "green"])
            .precision("color", Precision::Int)
            .outcome("label")
            .build();
        assert!(matches!(
            on_categorical,
            Err(ConfigurationError::PrecisionOnCategorical(name)) if name == "color"
        ));
    }

    #[test]
    fn construction_rejects_mad_length_mismatch() {
        let result = FeatureSchema::builder()
            .continuous("age", 18.0, 65.0)
            .categorical("color", ["red", "green"])
            .mad(vec![1.0])
            .outcome("label")
            .build();
        assert!(matches!(
            result,
            Err(ConfigurationError::MadLength { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn construction_rejects_encoded_name_clashes() {
        let result = FeatureSchema::builder()
            .continuous("color_red", 0.0, 1.0)
            .categorical("color", ["red", "green"])
            .outcome("label")
            .build();
        assert!(matches!(
            result,
            Err(ConfigurationError::EncodedNameClash(name)) if name == "color_red"
        ));
    }

    #[test]
    fn accessors_follow_declaration_order() {
        let schema = mixed_schema();

        assert_eq!(schema.outcome_name(), "label");
        assert_eq!(schema.n_features(), 4);
        assert_eq!(
            schema.feature_names().collect::<Vec<_>>(),
            ["age", "color", "hours", "size"]
        );
        assert_eq!(
            schema.continuous_feature_names().collect::<Vec<_>>(),
            ["age", "hours"]
        );
        assert_eq!(
            schema.categorical_feature_names().collect::<Vec<_>>(),
            ["color", "size"]
        );
        assert_eq!(schema.continuous_indexes(), [0, 2]);
        assert_eq!(schema.categorical_indexes(), [1, 3]);
        assert_eq!(schema.feature_index("hours"), Some(2));
        assert_eq!(schema.feature_index("label"), None);
        assert_eq!(schema.permitted_range("age"), Some((18.0, 65.0)));
        assert_eq!(schema.permitted_range("color"), None);
        assert_eq!(
            schema.levels("color").unwrap(),
            &["red", "green", "blue"]
        );
        assert!(schema.levels("age").is_none());
    }

    #[test]
    fn encoded_names_put_continuous_first() {
        let schema = mixed_schema();
        assert_eq!(
            schema.encoded_feature_names(),
            &[
                "age",
                "hours",
                "color_blue",
                "color_green",
                "color_red",
                "size_L",
                "size_S"
            ]
        );
    }

    #[test]
    fn normalize_maps_range_onto_unit_interval() {
        let schema = mixed_schema();
        let frame = Frame::from_columns(vec![
            Column::numeric("age", vec![18.0, 41.5, 65.0]),
            Column::categorical("color", ["red", "green", "blue"]),
        ])
        .unwrap();

        let normalized = schema.normalize(&frame);
        match normalized.column("age").unwrap() {
            Column::Numeric { values, .. } => assert_eq!(values, &[0.0, 0.5, 1.0]),
            _ => panic!("age should stay numeric"),
        }
        assert_eq!(normalized.column("color"), frame.column("color"));

        let round_tripped = schema.denormalize(&normalized);
        match round_tripped.column("age").unwrap() {
            Column::Numeric { values, .. } => assert_eq!(values, &[18.0, 41.5, 65.0]),
            _ => panic!("age should stay numeric"),
        }
    }

    #[test]
    fn normalize_ignores_undeclared_columns() {
        let schema = mixed_schema();
        let frame = Frame::from_columns(vec![Column::numeric("label", vec![1.0])]).unwrap();
        assert_eq!(schema.normalize(&frame), frame);
    }

    #[test]
    fn encoded_bounds_cover_both_modes() {
        let schema = mixed_schema();

        let (minx, maxx) = schema.encoded_bounds(true);
        assert_eq!(minx, Array1::<f64>::zeros(7));
        assert_eq!(maxx, Array1::<f64>::ones(7));

        let (minx, maxx) = schema.encoded_bounds(false);
        assert_eq!(minx, array![18.0, 20.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(maxx, array![65.0, 80.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn data_params_bundle_matches_layout() {
        let schema = mixed_schema();
        let params = schema.data_params();

        assert_eq!(params.minx.len(), 7);
        assert_eq!(params.maxx.len(), 7);
        assert_eq!(params.continuous_indexes, [0, 1]);
        assert_eq!(params.categorical_groups, [vec![2, 3, 4], vec![5, 6]]);
    }

    #[test]
    fn vary_indexes_resolves_groups_exactly() {
        let schema = mixed_schema();

        assert_eq!(
            schema.vary_indexes(&FeaturesToVary::All).unwrap(),
            (0..7).collect::<Vec<_>>()
        );
        assert_eq!(
            schema
                .vary_indexes(&FeaturesToVary::only(["color", "age"]))
                .unwrap(),
            [0, 2, 3, 4]
        );
        assert!(matches!(
            schema.vary_indexes(&FeaturesToVary::only(["weight"])),
            Err(ConfigurationError::UnknownFeature(name)) if name == "weight"
        ));
    }

    #[test]
    fn vary_indexes_does_not_match_by_prefix() {
        let schema = FeatureSchema::builder()
            .categorical("work", ["a", "b"])
            .categorical("workclass", ["x", "y"])
            .outcome("label")
            .build()
            .unwrap();

        // "work" must select only its own group, not workclass dummies.
        assert_eq!(
            schema
                .vary_indexes(&FeaturesToVary::only(["work"]))
                .unwrap(),
            [0, 1]
        );
    }

    #[test]
    fn one_hot_encode_uses_observed_levels() {
        let schema = mixed_schema();
        let frame = Frame::from_columns(vec![
            Column::numeric("age", vec![22.0, 30.0]),
            Column::categorical("color", ["red", "blue"]),
            Column::numeric("hours", vec![40.0, 50.0]),
            Column::categorical("size", ["S", "S"]),
        ])
        .unwrap();

        let encoded = schema.one_hot_encode(&frame).unwrap();
        assert_eq!(
            encoded.column_names().collect::<Vec<_>>(),
            ["age", "hours", "color_blue", "color_red", "size_S"]
        );
        match encoded.column("color_red").unwrap() {
            Column::Numeric { values, .. } => assert_eq!(values, &[1.0, 0.0]),
            _ => panic!("dummy columns are numeric"),
        }
    }

    #[test]
    fn one_hot_encode_maps_missing_entries_to_zero_rows() {
        let schema = FeatureSchema::builder()
            .categorical("color", ["red", "green"])
            .outcome("label")
            .build()
            .unwrap();
        let frame = Frame::from_columns(vec![Column::categorical_with_missing(
            "color",
            vec![Some("red".to_string()), None],
        )])
        .unwrap();

        let encoded = schema.one_hot_encode(&frame).unwrap();
        match encoded.column("color_red").unwrap() {
            Column::Numeric { values, .. } => assert_eq!(values, &[1.0, 0.0]),
            _ => panic!("dummy columns are numeric"),
        }
        assert!(encoded.column("color_green").is_none());
    }

    #[test]
    fn one_hot_encode_requires_declared_columns() {
        let schema = mixed_schema();
        let frame = Frame::from_columns(vec![Column::numeric("age", vec![22.0])]).unwrap();
        assert!(matches!(
            schema.one_hot_encode(&frame),
            Err(FrameError::MissingColumn(name)) if name == "color"
        ));

        let wrong_type = Frame::from_columns(vec![
            Column::numeric("color", vec![1.0]),
            Column::categorical("size", ["S"]),
        ])
        .unwrap();
        assert!(matches!(
            schema.one_hot_encode(&wrong_type),
            Err(FrameError::ColumnTypeMismatch(name)) if name == "color"
        ));
    }

    #[test]
    fn decode_picks_largest_dummy() {
        let schema = mixed_schema();
        let frame = Frame::from_columns(vec![
            Column::numeric("age", vec![0.5]),
            Column::numeric("hours", vec![0.25]),
            Column::numeric("color_blue", vec![0.1]),
            Column::numeric("color_green", vec![0.7]),
            Column::numeric("color_red", vec![0.2]),
            Column::numeric("size_L", vec![0.9]),
            Column::numeric("size_S", vec![0.1]),
        ])
        .unwrap();

        let decoded = schema.decode(&frame).unwrap();
        assert_eq!(
            decoded.column_names().collect::<Vec<_>>(),
            ["age", "hours", "color", "size"]
        );
        match decoded.column("color").unwrap() {
            Column::Categorical { values, .. } => {
                assert_eq!(values, &[Some("green".to_string())]);
            }
            _ => panic!("decoded columns are categorical"),
        }
    }

    #[test]
    fn decode_breaks_ties_towards_first_sorted_level() {
        let schema = FeatureSchema::builder()
            .categorical("color", ["red", "green", "blue"])
            .outcome("label")
            .build()
            .unwrap();
        let frame = Frame::from_columns(vec![
            Column::numeric("color_blue", vec![0.5]),
            Column::numeric("color_green", vec![0.5]),
            Column::numeric("color_red", vec![0.5]),
        ])
        .unwrap();

        let decoded = schema.decode(&frame).unwrap();
        match decoded.column("color").unwrap() {
            Column::Categorical { values, .. } => {
                assert_eq!(values, &[Some("blue".to_string())]);
            }
            _ => panic!("decoded columns are categorical"),
        }
    }

    #[test]
    fn decode_requires_at_least_one_dummy_per_feature() {
        let schema = mixed_schema();
        let frame = Frame::from_columns(vec![
            Column::numeric("age", vec![0.5]),
            Column::numeric("color_red", vec![1.0]),
        ])
        .unwrap();
        assert!(matches!(
            schema.decode(&frame),
            Err(FrameError::MissingColumn(name)) if name == "size"
        ));
    }

    #[test]
    fn decode_matrix_follows_encoded_layout() {
        let schema = mixed_schema();
        let data = array![[0.5, 0.25, 0.0, 1.0, 0.0, 0.0, 1.0]];

        let decoded = schema.decode_matrix(data.view()).unwrap();
        match decoded.column("color").unwrap() {
            Column::Categorical { values, .. } => {
                assert_eq!(values, &[Some("green".to_string())]);
            }
            _ => panic!("decoded columns are categorical"),
        }
        match decoded.column("size").unwrap() {
            Column::Categorical { values, .. } => {
                assert_eq!(values, &[Some("S".to_string())]);
            }
            _ => panic!("decoded columns are categorical"),
        }

        let narrow = array![[0.5, 0.25]];
        assert!(matches!(
            schema.decode_matrix(narrow.view()),
            Err(FrameError::ShapeMismatch { expected: 7, got: 2 })
        ));
    }

    #[test]
    fn encoding_template_pads_to_longest_level_set() {
        let schema = mixed_schema();
        let template = schema.encoding_template();

        assert_eq!(template.n_rows(), 3);
        assert_eq!(
            template.column_names().collect::<Vec<_>>(),
            ["age", "color", "hours", "size"]
        );
        match template.column("size").unwrap() {
            Column::Categorical { values, .. } => {
                assert_eq!(
                    values,
                    &[Some("S".to_string()), Some("L".to_string()), None]
                );
            }
            _ => panic!("size should be categorical"),
        }
        match template.column("age").unwrap() {
            Column::Numeric { values, .. } => assert!(values.iter().all(|v| v.is_nan())),
            _ => panic!("age should be numeric"),
        }
    }

    #[test]
    fn encoding_template_without_categoricals_is_empty() {
        let schema = FeatureSchema::builder()
            .continuous("age", 18.0, 65.0)
            .outcome("label")
            .build()
            .unwrap();
        let template = schema.encoding_template();
        assert_eq!(template.n_rows(), 0);
        assert_eq!(template.n_columns(), 1);
    }

    #[test]
    fn query_input_normalizes_without_encoding() {
        let schema = mixed_schema();
        let row = [
            FeatureValue::from(41.5),
            FeatureValue::from("green"),
            FeatureValue::from(50.0),
            FeatureValue::from("S"),
        ];

        let prepared = schema.query_input(&row, false).unwrap();
        assert_eq!(prepared.n_rows(), 1);
        assert_eq!(
            prepared.column_names().collect::<Vec<_>>(),
            ["age", "color", "hours", "size"]
        );
        match prepared.column("age").unwrap() {
            Column::Numeric { values, .. } => assert_eq!(values, &[0.5]),
            _ => panic!("age should stay numeric"),
        }
    }

    #[test]
    fn query_input_encodes_over_full_layout() {
        let schema = mixed_schema();
        let row = [
            FeatureValue::from(41.5),
            FeatureValue::from("green"),
            FeatureValue::from(50.0),
            FeatureValue::from("S"),
        ];

        let prepared = schema.query_input(&row, true).unwrap();
        assert_eq!(prepared.n_rows(), 1);
        assert_eq!(
            prepared.column_names().collect::<Vec<_>>(),
            schema
                .encoded_feature_names()
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
        );

        let matrix = prepared.to_matrix().unwrap();
        assert_eq!(matrix, array![[0.5, 0.5, 0.0, 1.0, 0.0, 0.0, 1.0]]);
    }

    #[test]
    fn query_input_validates_the_row() {
        let schema = mixed_schema();

        let short = [FeatureValue::from(41.5)];
        assert!(matches!(
            schema.query_input(&short, true),
            Err(ConfigurationError::QueryLength { expected: 4, got: 1 })
        ));

        let swapped = [
            FeatureValue::from("green"),
            FeatureValue::from(41.5),
            FeatureValue::from(50.0),
            FeatureValue::from("S"),
        ];
        assert!(matches!(
            schema.query_input(&swapped, true),
            Err(ConfigurationError::QueryType { expected: "numeric", .. })
        ));

        let unknown = [
            FeatureValue::from(41.5),
            FeatureValue::from("mauve"),
            FeatureValue::from(50.0),
            FeatureValue::from("S"),
        ];
        assert!(matches!(
            schema.query_input(&unknown, true),
            Err(ConfigurationError::UnknownLevel { level, .. }) if level == "mauve"
        ));
    }

    #[test]
    fn decimal_precisions_use_feature_positions() {
        let schema = mixed_schema();
        // hours sits at declaration position 2, after the color block.
        assert_eq!(schema.decimal_precisions(), [0, 0, 2, 0]);
    }

    #[test]
    fn mads_default_to_one() {
        let schema = mixed_schema();
        assert_eq!(schema.mads(false), [1.0; 4]);
        assert_eq!(schema.mads(true), [1.0; 4]);

        let weighted = FeatureSchema::builder()
            .continuous("age", 18.0, 65.0)
            .categorical("color", ["red", "green"])
            .mad(vec![4.5, 1.0])
            .outcome("label")
            .build()
            .unwrap();
        assert_eq!(weighted.mads(false), [4.5, 1.0]);
    }

    #[test]
    fn dev_data_is_unsupported() {
        let schema = mixed_schema();
        assert!(matches!(schema.dev_data(), Err(UnsupportedError)));
    }

    #[test]
    fn schema_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FeatureSchema>();
        assert_send_sync::<DataParams>();
    }
}
