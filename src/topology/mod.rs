//! Boundary representation of trimmed surfaces: faces bounded by loops of edges joined at vertices
pub mod builder;
pub mod entity;
pub mod geometry;

pub use builder::*;
pub use entity::*;
pub use geometry::*;

#[cfg(test)]
mod tests;
