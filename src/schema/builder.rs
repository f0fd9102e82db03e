//! Chained construction of [`FeatureSchema`](super::FeatureSchema).

use std::collections::BTreeMap;

use crate::error::ConfigurationError;

use super::config::{FeatureSpec, Precision, SchemaConfig};
use super::FeatureSchema;

/// Builder for [`FeatureSchema`](super::FeatureSchema).
///
/// Declaration order is preserved and becomes the schema's feature order.
///
/// # Example
///
/// ```
/// use counterfeat::schema::{FeatureSchema, Precision};
///
/// let schema = FeatureSchema::builder()
///     .continuous("age", 18.0, 65.0)
///     .categorical("color", ["red", "green", "blue"])
///     .precision("age", Precision::Int)
///     .outcome("label")
///     .build()
///     .unwrap();
///
/// assert_eq!(schema.n_features(), 2);
/// assert_eq!(schema.encoded_feature_names().len(), 4);
/// ```
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    features: Vec<(String, FeatureSpec)>,
    outcome: Option<String>,
    precision: BTreeMap<String, Precision>,
    mad: Option<Vec<f64>>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a continuous feature with permitted range `[min, max]`.
    pub fn continuous(mut self, name: impl Into<String>, min: f64, max: f64) -> Self {
        self.features
            .push((name.into(), FeatureSpec::continuous(min, max)));
        self
    }

    /// Declares a categorical feature with an explicit level set.
    pub fn categorical<I, S>(mut self, name: impl Into<String>, levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features
            .push((name.into(), FeatureSpec::categorical(levels)));
        self
    }

    /// Declares a feature from an already-built [`FeatureSpec`].
    pub fn feature(mut self, name: impl Into<String>, spec: FeatureSpec) -> Self {
        self.features.push((name.into(), spec));
        self
    }

    /// Sets the outcome column name.
    pub fn outcome(mut self, name: impl Into<String>) -> Self {
        self.outcome = Some(name.into());
        self
    }

    /// Sets the value type and precision of a continuous feature.
    pub fn precision(mut self, name: impl Into<String>, precision: Precision) -> Self {
        self.precision.insert(name.into(), precision);
        self
    }

    /// Sets the median absolute deviation per feature, in declaration order.
    pub fn mad(mut self, mad: Vec<f64>) -> Self {
        self.mad = Some(mad);
        self
    }

    /// Validates the declarations and builds the schema.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] describing the first violated
    /// construction rule.
    pub fn build(self) -> Result<FeatureSchema, ConfigurationError> {
        FeatureSchema::from_config(SchemaConfig {
            features: self.features,
            outcome_name: self.outcome.unwrap_or_default(),
            precision: self.precision,
            mad: self.mad,
        })
    }
}
