//! Shell finite-element model: constitutive law, elements and model assembly
pub mod constitutive;
pub mod creator;
pub mod element;
pub mod model;
pub mod shell_element;

pub use constitutive::*;
pub use creator::*;
pub use element::*;
pub use model::*;
pub use shell_element::*;
