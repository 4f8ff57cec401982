//! Input/output helpers.
//!
//! - CSV and text exports (`export`)
//! - boundary-fit JSON read/write (`fits`)

pub mod export;
pub mod fits;

pub use export::*;
pub use fits::*;
