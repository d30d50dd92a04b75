//! # Feature Engineering Crate
//!
//! Derived columns for the tables the pipeline pulls out of the assessment
//! database.
//!
//! ## Public API
//!
//! - `cyclical_features`: Pure function producing the `{column}_sin` / `{column}_cos` pair.
//! - `CyclicalFeaturesExt`: Adds the pair to a `DataFrame` in place.
//! - `DatasetOwner` / `add_cyclical_features`: The same, for any type that owns a frame.
//! - `FeatureError`: The specific error types that can be returned from this crate.

pub mod cyclical;
pub mod error;

pub use cyclical::{CyclicalFeaturesExt, DatasetOwner, add_cyclical_features, cyclical_features};
pub use error::FeatureError;
