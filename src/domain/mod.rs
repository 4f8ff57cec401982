//! Domain types used throughout the report.
//!
//! This module defines:
//!
//! - literature constants for Fe-C and Fe-Cr-C (`constants`)
//! - elements, fraction maps and run configuration (`types`)
//! - analysis outputs shared by reporting and exports (`CriticalPoint`, `QuadraticFit`)

pub mod constants;
pub mod types;

pub use constants::*;
pub use types::*;
