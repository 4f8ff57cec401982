//! `fe-phase` library crate.
//!
//! The binary (`fephase`) is a thin wrapper around this library so that:
//!
//! - the analyses are testable without spawning processes
//! - the equilibrium engine and plotting are reusable on their own
//! - code stays easy to navigate as the project grows

pub mod analysis;
pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod math;
pub mod plot;
pub mod report;
pub mod thermo;
