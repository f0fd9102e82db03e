//! Encoded-space layout: the fixed one-hot column contract.

use std::ops::Range;

use super::{Feature, FeatureKind};

/// One categorical feature's block of one-hot columns.
#[derive(Debug, Clone, PartialEq)]
pub struct OneHotGroup {
    feature: String,
    levels: Vec<String>,
    start: usize,
}

impl OneHotGroup {
    /// Raw feature name the block belongs to.
    #[inline]
    pub fn feature(&self) -> &str {
        &self.feature
    }

    /// Levels in lexicographic order, one encoded column each.
    #[inline]
    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    /// Encoded positions covered by the block.
    #[inline]
    pub fn positions(&self) -> Range<usize> {
        self.start..self.start + self.levels.len()
    }
}

/// The encoded-column layout derived from a schema's declarations.
///
/// Continuous features occupy the leading positions in declaration order.
/// Each categorical feature then contributes one column per level, levels in
/// lexicographic order, named `<feature>_<level>`. Every transform that
/// touches encoded space resolves positions through this layout, so the
/// contract holds no matter which values a particular table happens to
/// contain.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedLayout {
    names: Vec<String>,
    n_continuous: usize,
    groups: Vec<OneHotGroup>,
}

impl EncodedLayout {
    pub(super) fn build(features: &[Feature]) -> Self {
        let mut names = Vec::new();
        for feature in features {
            if let FeatureKind::Continuous { .. } = feature.kind {
                names.push(feature.name.clone());
            }
        }
        let n_continuous = names.len();

        let mut groups = Vec::new();
        for feature in features {
            if let FeatureKind::Categorical { sorted_levels, .. } = &feature.kind {
                let start = names.len();
                for level in sorted_levels {
                    names.push(format!("{}_{}", feature.name, level));
                }
                groups.push(OneHotGroup {
                    feature: feature.name.clone(),
                    levels: sorted_levels.clone(),
                    start,
                });
            }
        }

        Self {
            names,
            n_continuous,
            groups,
        }
    }

    /// Number of encoded columns.
    #[inline]
    pub fn n_columns(&self) -> usize {
        self.names.len()
    }

    /// Encoded column names in layout order.
    #[inline]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of leading continuous positions.
    #[inline]
    pub fn n_continuous(&self) -> usize {
        self.n_continuous
    }

    /// Encoded positions of continuous features.
    #[inline]
    pub fn continuous_positions(&self) -> Range<usize> {
        0..self.n_continuous
    }

    /// One-hot blocks in declaration order of their categorical features.
    #[inline]
    pub fn groups(&self) -> &[OneHotGroup] {
        &self.groups
    }

    /// Looks up the one-hot block of a categorical feature.
    pub fn group(&self, feature: &str) -> Option<&OneHotGroup> {
        self.groups.iter().find(|g| g.feature == feature)
    }

    /// Position of an encoded column by name.
    pub fn position(&self, encoded_name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == encoded_name)
    }

    /// Position of a continuous feature among the leading columns.
    pub fn continuous_position(&self, feature: &str) -> Option<usize> {
        self.names[..self.n_continuous]
            .iter()
            .position(|n| n == feature)
    }

    /// Returns `true` if `name` is one of the one-hot dummy columns.
    pub fn is_dummy(&self, name: &str) -> bool {
        self.names[self.n_continuous..].iter().any(|n| n == name)
    }
}
