//! Declarative construction input for [`FeatureSchema`](super::FeatureSchema).
//!
//! A [`SchemaConfig`] mirrors the JSON handed over by callers that describe
//! their data instead of sharing it: a name-to-declaration map for features,
//! the outcome column name, and optional precision and deviation metadata.
//!
//! The wire format keeps feature declarations compact. A two-number array is
//! a continuous range, an array of strings is a categorical level set:
//!
//! ```json
//! {
//!   "features": { "age": [18, 65], "color": ["red", "green", "blue"] },
//!   "outcome_name": "label",
//!   "precision": { "age": "int" }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// FeatureSpec
// ============================================================================

/// Declared shape of a single feature.
///
/// Classification happens once, at parse or construction time. Every
/// downstream transform dispatches on this enum rather than re-inspecting
/// values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "FeatureSpecRepr", into = "FeatureSpecRepr")]
pub enum FeatureSpec {
    /// Continuous feature with an inclusive permitted range.
    Continuous { min: f64, max: f64 },
    /// Categorical feature with an explicit level set.
    Categorical { levels: Vec<String> },
}

impl FeatureSpec {
    /// Continuous declaration with permitted range `[min, max]`.
    pub fn continuous(min: f64, max: f64) -> Self {
        Self::Continuous { min, max }
    }

    /// Categorical declaration from an ordered level set.
    pub fn categorical<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Categorical {
            levels: levels.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns `true` for [`FeatureSpec::Continuous`].
    #[inline]
    pub fn is_continuous(&self) -> bool {
        matches!(self, Self::Continuous { .. })
    }

    /// Returns `true` for [`FeatureSpec::Categorical`].
    #[inline]
    pub fn is_categorical(&self) -> bool {
        matches!(self, Self::Categorical { .. })
    }
}

/// Wire shape of [`FeatureSpec`]: `[min, max]` or `["level", ...]`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum FeatureSpecRepr {
    Range(f64, f64),
    Levels(Vec<String>),
}

impl From<FeatureSpecRepr> for FeatureSpec {
    fn from(repr: FeatureSpecRepr) -> Self {
        match repr {
            FeatureSpecRepr::Range(min, max) => Self::Continuous { min, max },
            FeatureSpecRepr::Levels(levels) => Self::Categorical { levels },
        }
    }
}

impl From<FeatureSpec> for FeatureSpecRepr {
    fn from(spec: FeatureSpec) -> Self {
        match spec {
            FeatureSpec::Continuous { min, max } => Self::Range(min, max),
            FeatureSpec::Categorical { levels } => Self::Levels(levels),
        }
    }
}

// ============================================================================
// Precision
// ============================================================================

/// Value type and decimal precision of a continuous feature.
///
/// The wire shape is `"int"` for integer features and `["float", d]` for
/// float features rounded to `d` decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "PrecisionRepr", into = "PrecisionRepr")]
pub enum Precision {
    /// Integer-valued.
    #[default]
    Int,
    /// Float-valued with a declared number of decimal places.
    Float { decimals: u32 },
}

impl Precision {
    /// Decimal places to keep when rounding de-normalized values.
    #[inline]
    pub fn decimals(&self) -> u32 {
        match self {
            Self::Int => 0,
            Self::Float { decimals } => *decimals,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PrecisionRepr {
    Kind(String),
    KindWithDecimals(String, u32),
}

impl TryFrom<PrecisionRepr> for Precision {
    type Error = String;

    fn try_from(repr: PrecisionRepr) -> Result<Self, Self::Error> {
        match repr {
            PrecisionRepr::Kind(kind) if kind == "int" => Ok(Self::Int),
            PrecisionRepr::KindWithDecimals(kind, decimals) if kind == "float" => {
                Ok(Self::Float { decimals })
            }
            PrecisionRepr::Kind(kind) | PrecisionRepr::KindWithDecimals(kind, _) => {
                Err(format!("unknown precision kind: {kind}"))
            }
        }
    }
}

impl From<Precision> for PrecisionRepr {
    fn from(precision: Precision) -> Self {
        match precision {
            Precision::Int => Self::Kind("int".to_string()),
            Precision::Float { decimals } => Self::KindWithDecimals("float".to_string(), decimals),
        }
    }
}

// ============================================================================
// SchemaConfig
// ============================================================================

/// Declarative description of a feature schema.
///
/// Feature order is load-bearing: raw tables, query rows, and precision
/// vectors all follow it. Deserialization therefore preserves the order the
/// JSON object was written in and rejects duplicate keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Feature declarations in the order they were written.
    #[serde(with = "ordered_features")]
    pub features: Vec<(String, FeatureSpec)>,
    /// Name of the predicted column.
    pub outcome_name: String,
    /// Value type and precision for continuous features. Keyed with a
    /// `BTreeMap` so serialized output is deterministic.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub precision: BTreeMap<String, Precision>,
    /// Median absolute deviation per declared feature, in declaration order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mad: Option<Vec<f64>>,
}

/// Serde adapter keeping `features` in declaration order.
///
/// A plain map type would lose JSON key order and silently drop duplicate
/// keys.
mod ordered_features {
    use std::fmt;

    use serde::de::{Error as DeError, MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    use super::FeatureSpec;

    pub(super) fn serialize<S>(
        features: &[(String, FeatureSpec)],
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(features.len()))?;
        for (name, spec) in features {
            map.serialize_entry(name, spec)?;
        }
        map.end()
    }

    pub(super) fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<Vec<(String, FeatureSpec)>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = Vec<(String, FeatureSpec)>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a map of feature names to range or level declarations")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut features: Vec<(String, FeatureSpec)> =
                    Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, spec)) = access.next_entry::<String, FeatureSpec>()? {
                    if features.iter().any(|(existing, _)| *existing == name) {
                        return Err(A::Error::custom(format!(
                            "duplicate feature name: {name}"
                        )));
                    }
                    features.push((name, spec));
                }
                Ok(features)
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}
