//! counterfeat: feature-schema metadata for counterfactual explanation engines.
//!
//! A [`FeatureSchema`] describes a tabular dataset from declarations alone,
//! for settings where feature ranges and level sets are shareable but the
//! data itself is not. It derives a fixed one-hot encoded layout from those
//! declarations and provides the transforms an explanation engine runs on
//! top of it.
//!
//! # Key Types
//!
//! - [`FeatureSchema`] - The schema and all of its transforms
//! - [`SchemaConfig`] / [`SchemaBuilder`] - Declarative and chained construction
//! - [`Frame`] / [`Column`] - Lightweight labeled tables
//! - [`EncodedLayout`] - The derived one-hot column contract
//!
//! # Building a Schema
//!
//! Use [`FeatureSchema::builder()`] for code, or deserialize a
//! [`SchemaConfig`] from JSON. See the [`schema`] module for details.
//!
//! ```
//! use counterfeat::{FeatureSchema, FeatureValue};
//!
//! let schema = FeatureSchema::builder()
//!     .continuous("age", 18.0, 65.0)
//!     .categorical("color", ["red", "green", "blue"])
//!     .outcome("label")
//!     .build()?;
//!
//! let row = [FeatureValue::from(22), FeatureValue::from("red")];
//! let encoded = schema.query_input(&row, true)?;
//! assert_eq!(encoded.n_columns(), schema.encoded_feature_names().len());
//! # Ok::<(), counterfeat::ConfigurationError>(())
//! ```

pub mod error;
pub mod frame;
pub mod schema;

// =============================================================================
// Convenience Re-exports
// =============================================================================

// Schema and construction
pub use schema::{
    DataParams, EncodedLayout, FeatureSchema, FeatureSpec, FeaturesToVary, OneHotGroup,
    Precision, SchemaBuilder, SchemaConfig,
};

// Tables and values
pub use frame::{Column, FeatureValue, Frame};

// Errors
pub use error::{ConfigurationError, FrameError, UnsupportedError};
