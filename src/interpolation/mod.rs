pub mod curve_interpolation;
pub use curve_interpolation::*;
