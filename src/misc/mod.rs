pub mod binomial;
pub mod floating_point;
pub mod transpose;
pub mod trigonometry;

pub use binomial::*;
pub use floating_point::*;
pub use transpose::*;
pub use trigonometry::*;
