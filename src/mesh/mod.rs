pub mod mesh_options;
pub mod mesher;
pub mod quad_mesh;

pub use mesh_options::*;
pub use mesher::*;
pub use quad_mesh::*;

#[cfg(test)]
mod tests;
