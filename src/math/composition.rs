//! Weight-fraction ↔ mole-fraction conversion and composition helpers.

use crate::domain::{Element, Fractions};
use crate::error::AppError;

/// Convert weight fractions to mole fractions using fixed molar masses.
pub fn wt_to_mole_fraction(wt: &Fractions) -> Result<Fractions, AppError> {
    normalize_scaled(wt, |el, w| w / el.molar_mass(), "weight")
}

/// Convert mole fractions to weight fractions using fixed molar masses.
pub fn mole_to_wt_fraction(mole: &Fractions) -> Result<Fractions, AppError> {
    normalize_scaled(mole, |el, x| x * el.molar_mass(), "mole")
}

fn normalize_scaled(
    input: &Fractions,
    scale: impl Fn(Element, f64) -> f64,
    kind: &str,
) -> Result<Fractions, AppError> {
    if let Some((el, v)) = input.iter().find(|(_, v)| !v.is_finite() || **v < 0.0) {
        return Err(AppError::new(
            3,
            format!("Invalid {kind} fraction for {}: {v}", el.display_name()),
        ));
    }

    let scaled: Fractions = input.iter().map(|(&el, &v)| (el, scale(el, v))).collect();
    let total: f64 = scaled.values().sum();
    if total <= 0.0 {
        return Err(AppError::new(3, format!("{kind} fractions sum to zero.")));
    }

    Ok(scaled.into_iter().map(|(el, v)| (el, v / total)).collect())
}

/// Weight fractions of an Fe-Cr-C alloy given in wt% Cr and wt% C (Fe balance).
pub fn alloy_wt_fractions(cr_wt_pct: f64, c_wt_pct: f64) -> Result<Fractions, AppError> {
    let fe = 100.0 - cr_wt_pct - c_wt_pct;
    if cr_wt_pct < 0.0 || c_wt_pct < 0.0 || fe < 0.0 {
        return Err(AppError::new(
            3,
            format!("Invalid alloy composition: {cr_wt_pct} wt% Cr, {c_wt_pct} wt% C."),
        ));
    }

    let mut out = Fractions::new();
    out.insert(Element::Fe, fe / 100.0);
    if cr_wt_pct > 0.0 {
        out.insert(Element::Cr, cr_wt_pct / 100.0);
    }
    out.insert(Element::C, c_wt_pct / 100.0);
    Ok(out)
}

/// Format a weight-fraction map as `Fe-XXCr-YYC`, `Fe-YYC` or `Fe-XX`.
pub fn format_composition(wt: &Fractions) -> String {
    let pct = |el| wt.get(&el).copied().unwrap_or(0.0) * 100.0;
    let fe = pct(Element::Fe);
    let cr = pct(Element::Cr);
    let c = pct(Element::C);

    if cr > 0.01 && c > 0.001 {
        format!("Fe-{cr:.2}Cr-{c:.2}C")
    } else if c > 0.001 {
        format!("Fe-{c:.2}C")
    } else {
        format!("Fe-{fe:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn eutectoid_carbon_as_mole_fraction() {
        let wt = alloy_wt_fractions(0.0, 0.76).unwrap();
        let x = wt_to_mole_fraction(&wt).unwrap();
        // 0.76 wt% C is about 3.44 at% C.
        assert!((x[&Element::C] - 0.0344).abs() < 1e-4, "x_C={}", x[&Element::C]);
        assert!(!x.contains_key(&Element::Cr));
    }

    #[test]
    fn rejects_negative_and_empty_input() {
        let mut bad = Fractions::new();
        bad.insert(Element::C, -0.1);
        assert_eq!(wt_to_mole_fraction(&bad).unwrap_err().exit_code(), 3);
        assert!(mole_to_wt_fraction(&Fractions::new()).is_err());
        assert!(alloy_wt_fractions(60.0, 50.0).is_err());
    }

    #[test]
    fn formats_like_alloy_designations() {
        assert_eq!(
            format_composition(&alloy_wt_fractions(12.5, 0.15).unwrap()),
            "Fe-12.50Cr-0.15C"
        );
        assert_eq!(format_composition(&alloy_wt_fractions(0.0, 0.76).unwrap()), "Fe-0.76C");
        assert_eq!(format_composition(&alloy_wt_fractions(0.0, 0.0).unwrap()), "Fe-100.00");
    }

    proptest! {
        #[test]
        fn wt_mole_round_trip(cr in 0.0f64..30.0, c in 0.0f64..7.0) {
            let wt = alloy_wt_fractions(cr, c).unwrap();
            let back = mole_to_wt_fraction(&wt_to_mole_fraction(&wt).unwrap()).unwrap();
            for (el, w) in &wt {
                prop_assert!((back[el] - w).abs() < 1e-12);
            }
        }
    }
}
