//! Report text for each analysis.

use chrono::{DateTime, Utc};

use crate::analysis::part_a::{
    BoundaryFits, DiagramSpec, EutectoidSteel, HypereutectoidSteel, HypoeutectoidSteel,
    PhaseDiagram, SolidusLimit, SteelRow,
};
use crate::analysis::part_b::{IsothermRegion, ScanRow, TernaryAlloy, max_carbon_before_cementite};
use crate::domain::{C_CEMENTITE_WT, C_FERRITE_WT, CriticalPoint, QuadraticFit, T_ROOM_K};
use crate::report::format::{Align, Table, fmt_fraction, fmt_temperature};
use crate::thermo::ERROR_LABEL;

const SUB_RULE_WIDTH: usize = 60;

fn push(out: &mut String, line: impl AsRef<str>) {
    out.push_str(line.as_ref());
    out.push('\n');
}

/// Upper-case heading between `=` rules, used inside a section.
fn sub_header(out: &mut String, title: &str) {
    let rule = "=".repeat(SUB_RULE_WIDTH);
    push(out, format!("\n{rule}"));
    push(out, title);
    push(out, rule);
}

pub fn format_phase_diagram(spec: &DiagramSpec, diagram: &PhaseDiagram) -> String {
    let mut out = String::new();
    push(
        &mut out,
        format!(
            "Phase map: {} temperatures × {} compositions",
            diagram.map.temperatures.len(),
            diagram.carbon_wt.len()
        ),
    );

    let total: usize = diagram.region_counts().iter().map(|(_, n)| n).sum();
    let mut table = Table::new()
        .column("Stable phases", Align::Left)
        .column("Cells", Align::Right)
        .column("Share", Align::Right);
    for (label, n) in diagram.region_counts() {
        let share = 100.0 * n as f64 / total.max(1) as f64;
        table.row([label, n.to_string(), format!("{share:.1}%")]);
    }
    out.push_str(&table.render());

    let errors = diagram.map.error_count();
    if errors > 0 {
        push(&mut out, format!("{errors} cells did not converge and are marked {ERROR_LABEL}"));
    }

    push(&mut out, "Phase diagram generated");
    push(&mut out, "\nLabeled regions:");
    for (name, ..) in spec.labels {
        push(&mut out, format!("  ✓ {name}"));
    }
    out
}

pub fn format_critical_point(point: &CriticalPoint, reaction: &str) -> String {
    let mut out = String::new();
    push(&mut out, format!("{} Point (from phase diagram analysis):", point.name));
    push(
        &mut out,
        format!("  Temperature: {} K ({:.1} °C)", point.temperature_k, point.temperature_c),
    );
    push(&mut out, format!("  Composition: {} wt% C", point.composition_wt));
    push(&mut out, format!("  Reaction: {reaction}"));
    out
}

pub fn format_solidus_limits(eutectic: &CriticalPoint, limits: &[SolidusLimit]) -> String {
    let mut out = String::new();
    push(&mut out, "Detailed Analysis:");
    for l in limits {
        push(&mut out, format!("\nAt T = {}:", fmt_temperature(l.temperature_k)));
        if l.above_eutectic {
            push(
                &mut out,
                format!("  Temperature is ABOVE eutectic ({} K)", eutectic.temperature_k),
            );
            push(&mut out, format!("  Maximum carbon content: {} C", l.max_carbon));
            push(&mut out, "  Reason: Above this C content, liquid phase will be present");
        } else {
            push(
                &mut out,
                format!("  Temperature is BELOW eutectic ({} K)", eutectic.temperature_k),
            );
            push(&mut out, "  All compositions 0-5 wt% C are fully SOLID");
            push(&mut out, "  Reason: Below eutectic temperature, no liquid can exist");
        }
    }
    out
}

fn quadratic_line(fit: &QuadraticFit) -> String {
    format!("  T[K] = {:.4}*[wt% C]² + {:.4}*[wt% C] + {:.4}", fit.a, fit.b, fit.c)
}

pub fn format_boundary_fits(fits: &BoundaryFits) -> String {
    let mut out = String::new();
    push(&mut out, "Low-carbon branch (α-ferrite + γ-austenite):");
    push(&mut out, quadratic_line(&fits.low));
    push(&mut out, format!("  RMSE = {:.4} K over {} points", fits.low.rmse, fits.low.n));
    push(&mut out, "\nHigh-carbon branch (γ-austenite + cementite):");
    push(&mut out, quadratic_line(&fits.high));
    push(&mut out, format!("  RMSE = {:.4} K over {} points", fits.high.rmse, fits.high.n));
    out
}

pub fn format_eutectoid_steel(steel: &EutectoidSteel) -> String {
    let mut out = String::new();
    push(
        &mut out,
        format!("Cooling γ-austenite with eutectoid composition ({} wt% C)", steel.carbon_wt),
    );
    push(&mut out, format!("from 1100 K to just below {} K", steel.temperature_k));
    push(&mut out, "\nPhases present after cooling:");
    push(&mut out, "  - α-ferrite (BCC)");
    push(&mut out, "  - Cementite (Fe₃C)");
    push(&mut out, "  - Microstructure: Pearlite (lamellar α + Fe₃C)");
    push(&mut out, "\nPhase compositions:");
    push(
        &mut out,
        format!(
            "  α-ferrite: {} wt% C, {:.2} wt% Fe",
            steel.ferrite_carbon_wt,
            100.0 - steel.ferrite_carbon_wt
        ),
    );
    push(
        &mut out,
        format!(
            "  Cementite: {} wt% C, {:.2} wt% Fe",
            steel.cementite_carbon_wt,
            100.0 - steel.cementite_carbon_wt
        ),
    );
    push(&mut out, "\nMass fractions (lever rule):");
    push(&mut out, format!("  α-ferrite: {}", fmt_fraction(steel.split.left)));
    push(&mut out, format!("  Cementite: {}", fmt_fraction(steel.split.right)));
    push(&mut out, format!("  Check sum: {:.4}", steel.split.total()));
    out
}

pub fn format_hypoeutectoid_steel(steel: &HypoeutectoidSteel, eutectoid: &CriticalPoint) -> String {
    let te = steel.eutectoid_k;
    let mut out = String::new();
    push(&mut out, format!("Analyzing hypoeutectoid steel: {} wt% C", steel.carbon_wt));
    push(
        &mut out,
        format!("(Below eutectoid composition of {} wt% C)", eutectoid.composition_wt),
    );

    push(&mut out, format!("\n1) Just ABOVE eutectoid temperature (T = {te} + δT):"));
    push(&mut out, "  Phases: α-ferrite + γ-austenite");
    push(&mut out, format!("  Proeutectoid α-ferrite: {}", fmt_fraction(steel.above.left)));
    push(&mut out, format!("  γ-austenite: {}", fmt_fraction(steel.above.right)));

    push(&mut out, format!("\n2) Just BELOW eutectoid temperature (T = {te} - δT):"));
    push(&mut out, "  Phases: α-ferrite + cementite");
    push(&mut out, format!("  Total α-ferrite: {}", fmt_fraction(steel.below.left)));
    push(&mut out, format!("  Cementite: {}", fmt_fraction(steel.below.right)));
    push(&mut out, "  γ-austenite: 0.0000 (transformed to pearlite)");

    push(&mut out, "\n3) α-ferrite breakdown:");
    push(
        &mut out,
        format!("  Proeutectoid α-ferrite: {}", fmt_fraction(steel.proeutectoid_ferrite())),
    );
    push(&mut out, "    (formed ABOVE eutectoid temperature)");
    push(&mut out, format!("  Eutectoid α-ferrite: {}", fmt_fraction(steel.eutectoid_ferrite)));
    push(&mut out, "    (formed FROM γ-austenite at eutectoid temperature)");

    push(&mut out, "\nMicrostructure explanation:");
    push(&mut out, "  - Proeutectoid α-ferrite forms first as large grains");
    push(&mut out, "  - Remaining γ-austenite transforms to pearlite at eutectoid temperature");
    push(&mut out, "  - Pearlite consists of lamellar α-ferrite + cementite");
    out
}

pub fn format_hypereutectoid_steel(steel: &HypereutectoidSteel) -> String {
    let mut out = String::new();
    push(
        &mut out,
        format!("Given: Weight fraction of eutectoid cementite = {}", steel.eutectoid_cementite),
    );
    push(&mut out, "Find: Overall carbon content of the steel");

    push(&mut out, "\nEutectoid transformation (γ → α + Fe₃C):");
    push(&mut out, format!("  Cementite in pearlite: {:.4}", steel.cementite_in_pearlite));
    push(&mut out, format!("\nPearlite fraction: {}", fmt_fraction(steel.pearlite)));
    push(
        &mut out,
        format!("Proeutectoid cementite: {}", fmt_fraction(steel.proeutectoid_cementite)),
    );
    push(&mut out, format!("\nCalculated overall carbon content: {:.4} wt% C", steel.carbon_wt));

    push(&mut out, format!("\n2) At T = {T_ROOM_K} K (room temperature):"));
    push(&mut out, format!("  α-ferrite: {}", fmt_fraction(steel.room.left)));
    push(&mut out, format!("  Cementite: {}", fmt_fraction(steel.room.right)));

    push(&mut out, "\n3) Discrepancy at room temperature:");
    push(&mut out, "  Experimentalist measures HIGHER α-ferrite than predicted");
    push(&mut out, "  Explanation:");
    push(&mut out, "    - Cementite (Fe₃C) is metastable; graphite is thermodynamically favored");
    push(
        &mut out,
        "    - Over long times, cementite slowly decomposes: Fe₃C → 3Fe + C(graphite)",
    );
    push(&mut out, "    - This releases Fe, increasing α-ferrite content");
    push(&mut out, "    - Sign of error: Positive (more α-ferrite than equilibrium prediction)");
    out
}

/// Plain-text record of the A8 calculation.
pub fn hypereutectoid_summary(steel: &HypereutectoidSteel, generated: DateTime<Utc>) -> String {
    let mut out = String::new();
    push(&mut out, "A8: Hypereutectoid Steel Analysis");
    push(&mut out, format!("Generated: {}", generated.format("%Y-%m-%d %H:%M:%S UTC")));
    push(&mut out, "");
    push(&mut out, "Inputs");
    push(&mut out, format!("  Eutectoid cementite fraction: {}", steel.eutectoid_cementite));
    push(&mut out, format!("  Eutectoid composition: {} wt% C", steel.eutectoid_wt));
    push(&mut out, format!("  α-ferrite carbon: {C_FERRITE_WT} wt% C"));
    push(&mut out, format!("  Cementite carbon: {C_CEMENTITE_WT} wt% C"));
    push(&mut out, "");
    push(&mut out, "Results");
    push(&mut out, format!("  Cementite in pearlite: {:.4}", steel.cementite_in_pearlite));
    push(&mut out, format!("  Pearlite fraction: {}", fmt_fraction(steel.pearlite)));
    push(
        &mut out,
        format!("  Proeutectoid cementite: {}", fmt_fraction(steel.proeutectoid_cementite)),
    );
    push(&mut out, format!("  Overall carbon: {:.4} wt% C", steel.carbon_wt));
    push(&mut out, format!("  α-ferrite at {T_ROOM_K} K: {}", fmt_fraction(steel.room.left)));
    push(&mut out, format!("  Cementite at {T_ROOM_K} K: {}", fmt_fraction(steel.room.right)));
    push(&mut out, "");
    push(
        &mut out,
        "Measured α-ferrite above prediction: slow Fe₃C → 3Fe + C(graphite) decomposition.",
    );
    out
}

pub fn format_steel_series(rows: &[SteelRow]) -> String {
    let mut out = String::new();
    push(&mut out, format!("Carbon Steel Properties at {T_ROOM_K} K:"));
    let mut table = Table::new()
        .column("C_wt%", Align::Right)
        .column("Cementite", Align::Right)
        .column("Pearlite", Align::Right);
    for r in rows {
        table.row([
            format!("{:.1}", r.carbon_wt),
            format!("{:.2}", r.cementite_pct),
            format!("{:.2}", r.pearlite_pct),
        ]);
    }
    out.push_str(&table.render());

    push(&mut out, "\nTrends explanation:");
    push(&mut out, "  - Hardness increases with carbon content due to increased cementite");
    push(&mut out, "  - Cementite is hard but brittle");
    push(&mut out, "  - Toughness decreases with carbon due to brittle cementite");
    push(&mut out, "  - Pearlite provides intermediate properties");
    push(&mut out, "\nDesign recommendation:");
    push(&mut out, "  For hardness > 160 BHN and toughness > 75 J:");
    push(&mut out, "  Optimal range: 0.4-0.6 wt% C (medium carbon steel)");
    out
}

pub fn format_isotherm(t: f64, regions: &[IsothermRegion], scan: &[ScanRow]) -> String {
    let mut out = String::new();
    sub_header(&mut out, &format!("PHASE REGIONS ALONG T = {t} K ISOTHERM:"));
    for r in regions {
        push(&mut out, format!("  {} - {} wt% C: {}", r.from_wt, r.to_wt, r.phases));
    }

    let mut table = Table::new()
        .column("C wt%", Align::Right)
        .column("Engine phases", Align::Left);
    for row in scan.iter().filter(|r| (r.temperature_k - t).abs() < 1e-9) {
        table.row([format!("{:4.1}", row.carbon_wt), row.phases.clone()]);
    }
    if !table.is_empty() {
        push(&mut out, "\nEquilibrium engine along the same isotherm:");
        out.push_str(&table.render());
    }
    out
}

pub fn format_carbon_limits(temperatures: &[f64]) -> String {
    let mut out = String::new();
    sub_header(&mut out, "MAXIMUM CARBON CONTENT BEFORE CEMENTITE FORMATION:");
    for &t in temperatures {
        match max_carbon_before_cementite(t) {
            Some(c) => push(&mut out, format!("  At {t} K: ~{c:.1} wt% C")),
            None => push(&mut out, format!("  At {t} K: outside tabulated range")),
        }
    }
    push(&mut out, "\n  Above these limits, cementite (Fe₃C) forms");
    push(&mut out, "  Cementite reduces strength and corrosion resistance");
    out
}

pub fn format_carburization(surface_wt: f64, t: f64, bulk_wt: f64, engine: Option<&str>) -> String {
    let mut out = String::new();
    sub_header(
        &mut out,
        &format!("CARBURIZATION ANALYSIS: Surface at {surface_wt} wt% C, T = {t} K"),
    );
    push(&mut out, "\nInitial condition:");
    push(&mut out, format!("  - Surface: {surface_wt} wt% C (carburized)"));
    push(&mut out, format!("  - Bulk: {bulk_wt} wt% C (base composition)"));
    push(&mut out, format!("  - Operating temperature: {t} K"));

    push(&mut out, format!("\nAt {t} K with {surface_wt} wt% C:"));
    push(&mut out, "  - Expected phases: Chromium carbides (M₇C₃, M₂₃C₆)");
    push(&mut out, "  - May also have some cementite (over-carburized)");
    push(&mut out, "  - FCC (austenite) matrix");
    if let Some(label) = engine {
        push(&mut out, format!("  - Equilibrium engine: {label}"));
    }

    push(&mut out, "\nLong-term behavior:");
    push(&mut out, "  ✓ Carbon diffuses from surface → bulk");
    push(&mut out, "  ✓ Creates composition gradient");
    push(&mut out, "  ✓ Surface hardness increases (carbides)");
    push(&mut out, "  ✗ If cementite forms → strength decreases");
    push(&mut out, "  ✗ Excessive carbides → reduced ductility");

    push(&mut out, "\nRecommendation:");
    push(&mut out, "  - Limit carburization to < 3.0 wt% C at 1350 K");
    push(&mut out, "  - Monitor operating temperature");
    push(&mut out, "  - Balance hardness vs ductility");
    out
}

pub fn format_ternary_alloys(alloys: &[TernaryAlloy], engine: &[String]) -> String {
    let mut out = String::new();
    sub_header(&mut out, "DETAILED COMPOSITION ANALYSIS:");
    for (i, (alloy, label)) in alloys.iter().zip(engine).enumerate() {
        push(&mut out, format!("\n{}. {}:", i + 1, alloy.name));
        push(&mut out, format!("   Phases present: {}", alloy.phases.join(", ")));
        push(&mut out, "   Phase compositions:");
        for pc in alloy.phase_compositions {
            push(&mut out, format!("     - {pc}"));
        }
        push(&mut out, format!("   Notes: {}", alloy.description));
        push(&mut out, format!("   Equilibrium engine: {label}"));
    }

    sub_header(&mut out, "KEY OBSERVATIONS:");
    push(&mut out, "  • Low C (< 0.1%): Single phase BCC");
    push(&mut out, "  • Intermediate C (0.2-1.0%): Two phases (BCC or FCC + carbides)");
    push(&mut out, "  • High C (> 2%): Multiple carbide phases");
    push(&mut out, "  • Higher Cr: Stabilizes BCC and promotes carbide formation");
    push(&mut out, "  • At 1500 K: FCC (austenite) stable for moderate C content");

    sub_header(&mut out, "TIE LINES (for two-phase regions):");
    push(&mut out, "  To find exact compositions:");
    push(&mut out, "  1. Locate overall composition on diagram");
    push(&mut out, "  2. Draw tie line through point");
    push(&mut out, "  3. Endpoints give phase compositions");
    push(&mut out, "  4. Use lever rule for phase fractions");
    out
}

pub fn format_part_b_summary() -> String {
    [
        "Type 410 Martensitic Stainless Steel: Fe-12.5Cr-0.15C",
        "",
        "Key Properties:",
        "  - High strength from martensitic structure",
        "  - Corrosion resistance from Cr (>11% Cr forms passive oxide)",
        "  - Carbon provides hardenability",
        "",
        "Carburization Effects:",
        "  - Increases surface hardness",
        "  - Forms chromium carbides (M23C6, M7C3, M3C)",
        "  - Excessive carburization → cementite formation → reduced strength",
        "",
        "Design Guidelines:",
        "  1. Maintain Cr > 11% for passivation",
        "  2. Keep C < 0.15-0.20% for base composition",
        "  3. Surface carburization: optimize C content to avoid cementite",
        "  4. At 1350 K: max ~3.2 wt% C before cementite",
        "  5. At 1200 K: max ~2.3 wt% C before cementite",
        "",
        "Phase Stability:",
        "  - BCC (ferrite/martensite) stable at low C",
        "  - FCC (austenite) stable at high T and intermediate C",
        "  - Chromium carbides form before cementite",
        "  - Cementite formation indicates over-carburization",
        "",
        "Operating Temperature Considerations:",
        "  - At 1525 K with 3.5 wt% C surface:",
        "    * May be in multi-phase region",
        "    * Carbon diffusion will create gradient",
        "    * Monitor for excessive softening if cementite forms",
    ]
    .iter()
    .map(|l| format!("{l}\n"))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::part_a::{
        CriticalPoints, GIVEN_EUTECTOID_CEMENTITE, SOLIDUS_CHECK_TEMPERATURES,
        fit_austenite_boundaries, hypereutectoid_steel, solidus_limits,
    };
    use chrono::TimeZone;

    #[test]
    fn fit_lines_use_four_decimals() {
        let text = format_boundary_fits(&fit_austenite_boundaries().unwrap());
        assert!(
            text.contains("T[K] = 37.7495*[wt% C]² + -225.1836*[wt% C] + 1003.5836"),
            "{text}"
        );
        assert!(text.contains("High-carbon branch"));
    }

    #[test]
    fn solidus_text_distinguishes_above_and_below() {
        let points = CriticalPoints::literature();
        let limits = solidus_limits(&points.eutectic, &SOLIDUS_CHECK_TEMPERATURES);
        let text = format_solidus_limits(&points.eutectic, &limits);
        assert_eq!(text.matches("ABOVE eutectic").count(), 2);
        assert_eq!(text.matches("BELOW eutectic").count(), 1);
        assert!(text.contains("At T = 1600 K (1327°C):"));
    }

    #[test]
    fn summary_is_stamped() {
        let eutectoid = CriticalPoints::literature().eutectoid;
        let steel = hypereutectoid_steel(GIVEN_EUTECTOID_CEMENTITE, &eutectoid).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let text = hypereutectoid_summary(&steel, at);
        assert!(text.contains("Generated: 2024-03-01 12:00:00 UTC"));
        assert!(text.contains("Overall carbon: 1.1846 wt% C"));
    }

    #[test]
    fn carbon_limits_report_interpolated_values() {
        let text = format_carbon_limits(&[1350.0, 1200.0, 900.0]);
        assert!(text.contains("At 1350 K: ~3.2 wt% C"));
        assert!(text.contains("At 1200 K: ~2.3 wt% C"));
        assert!(text.contains("At 900 K: outside tabulated range"));
    }

    #[test]
    fn isotherm_lists_only_matching_scan_rows() {
        let scan = vec![
            ScanRow { temperature_k: 1350.0, carbon_wt: 0.0, phases: "BCC_A2".into() },
            ScanRow { temperature_k: 1200.0, carbon_wt: 0.0, phases: "FCC_A1".into() },
        ];
        let text = format_isotherm(1350.0, &crate::analysis::part_b::ISOTHERM_1350_REGIONS, &scan);
        assert!(text.contains("BCC_A2"));
        assert!(!text.contains("FCC_A1"));
        assert!(text.contains("0.5 - 2 wt% C: FCC (austenite)"));
    }

    #[test]
    fn carburization_mentions_engine_when_known() {
        let known = format_carburization(3.5, 1525.0, 0.15, Some("FCC_A1+M7C3"));
        assert!(known.contains("engine: FCC_A1+M7C3"));
        assert!(!format_carburization(3.5, 1525.0, 0.15, None).contains("engine"));
    }
}
