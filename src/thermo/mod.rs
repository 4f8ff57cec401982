//! Minimal CALPHAD equilibrium engine: TDB reading, compound-energy Gibbs
//! models and a convex-hull minimizer.

pub mod databases;
pub mod energy;
pub mod equilibrium;
pub mod expr;
pub mod tdb;

pub use databases::{FE_C_FILE, FE_C_TDB, FE_CR_C_FILE, FE_CR_C_TDB, load_or_create};
pub use equilibrium::{
    Conditions, ERROR_LABEL, EquilibriumCalculator, EquilibriumResult, NONE_LABEL, PhaseAmount,
    PhaseMap, SampleSet, equilibrium,
};
pub use tdb::Database;
