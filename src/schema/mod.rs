//! Discovered record schema
//!
//! The registry grows while records are flattened; once the document is done,
//! [`materialize_columns`] turns it into the destination's column list.

pub mod materialize;
pub mod registry;

pub use materialize::materialize_columns;
pub use registry::{Column, ColumnGroup};
