#![allow(clippy::needless_range_loop)]

mod closest_parameter;
mod curve;
mod fe;
mod interpolation;
mod io;
mod knot;
mod loft;
mod mesh;
mod misc;
mod surface;
mod topology;
mod wing;

pub mod prelude {
    pub use crate::closest_parameter::*;
    pub use crate::curve::*;
    pub use crate::fe::*;
    pub use crate::interpolation::*;
    pub use crate::io::*;
    pub use crate::knot::*;
    pub use crate::loft::*;
    pub use crate::mesh::*;
    pub use crate::misc::*;
    pub use crate::surface::*;
    pub use crate::topology::*;
    pub use crate::wing::*;
}
