//! Literature constants for the Fe-C and Fe-Cr-C systems.
//!
//! Compositions are in wt% unless the name says otherwise; temperatures in kelvin.

/// Molar masses (g/mol).
pub const M_FE: f64 = 55.845;
pub const M_CR: f64 = 51.996;
pub const M_C: f64 = 12.011;

/// Carbon content of cementite as used by the phase-fraction analyses.
///
/// The stoichiometric value `M_C / (3 M_FE + M_C)` is 6.6896 wt%; the analyses
/// use the rounded textbook number.
pub const C_CEMENTITE_WT: f64 = 6.69;

/// Maximum carbon solubility in α-ferrite near the eutectoid temperature.
pub const C_FERRITE_WT: f64 = 0.02;

/// Eutectoid reaction `γ → α + Fe₃C`.
pub const T_EUTECTOID_K: f64 = 1000.0;
pub const C_EUTECTOID_WT: f64 = 0.76;

/// Eutectic reaction `L → γ + Fe₃C`.
pub const T_EUTECTIC_K: f64 = 1420.0;
pub const C_EUTECTIC_WT: f64 = 4.3;

/// Room temperature used for the "fully cooled" analyses.
pub const T_ROOM_K: f64 = 298.0;

/// Standard pressure used for every equilibrium calculation (Pa).
pub const PRESSURE_PA: f64 = 101_325.0;

/// Ideal gas constant (J/mol/K).
pub const GAS_CONSTANT: f64 = 8.314_462_618;

/// Offset between kelvin and Celsius.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Type 410 martensitic stainless steel nominal composition.
pub const TYPE_410_CR_WT: f64 = 12.5;
pub const TYPE_410_C_WT: f64 = 0.15;

/// Stoichiometric carbon content of Fe₃C, derived from molar masses.
pub fn stoichiometric_cementite_carbon_wt() -> f64 {
    M_C / (3.0 * M_FE + M_C) * 100.0
}

pub fn kelvin_to_celsius(t_k: f64) -> f64 {
    t_k - KELVIN_OFFSET
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounded_cementite_carbon_matches_stoichiometry() {
        let exact = stoichiometric_cementite_carbon_wt();
        assert!((exact - C_CEMENTITE_WT).abs() < 0.005, "got {exact}");
    }
}
