//! Lofted wing shell model: airfoil sections, loft, trimmed cutout, mesh and shell model
pub mod airfoil;
pub mod wing_options;
pub mod wing_pipeline;

pub use airfoil::*;
pub use wing_options::*;
pub use wing_pipeline::*;

#[cfg(test)]
mod tests;
