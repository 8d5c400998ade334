//! CLI command implementations.

pub mod anchors;
pub mod decompress;
pub mod diff;
pub mod frames;
pub mod infer_schema;
