pub mod curve_lofter;
pub use curve_lofter::*;
