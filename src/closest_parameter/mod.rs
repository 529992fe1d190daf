pub mod closest_parameter_newton;
pub mod curve_closest_parameter_problem;
pub mod surface_closest_parameter_newton;
pub mod surface_closest_parameter_problem;
pub use closest_parameter_newton::*;
pub use curve_closest_parameter_problem::*;
pub use surface_closest_parameter_newton::*;
pub use surface_closest_parameter_problem::*;
