//! Core ALTO transforms: schema classification, namespace rewriting, image
//! binding, geometry normalization, and structural flattening.

pub mod geometry;
pub mod image;
pub mod namespace;
pub mod schema;
pub mod structure;
