//! Mathematical utilities: lever rule, regression and composition arithmetic.

pub mod composition;
pub mod lever;
pub mod ols;
pub mod poly;

pub use composition::*;
pub use lever::*;
pub use ols::*;
pub use poly::*;
