//! Legacy ASCII VTK export of surfaces, meshes and finite-element models
pub mod model_exporter;
pub mod vtk;

pub use model_exporter::*;
pub use vtk::*;
