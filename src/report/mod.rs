//! Terminal report: generic formatting plus the text of each analysis.

pub mod format;
pub mod sections;

pub use format::*;
pub use sections::*;
