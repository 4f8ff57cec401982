//! Part B: Type 410 martensitic stainless steel in the Fe-Cr-C system.
//!
//! The phase-region readings are literature values for Fe-12.5Cr-XC. The
//! engine scan and the ternary point calculations run next to them so both
//! appear in the exported tables.

use plotters::style::RGBColor;
use plotters::style::colors::BLACK;
use serde::Serialize;
use tracing::{info, warn};

use crate::analysis::{AnalysisContext, available_phases, mole_vector};
use crate::domain::{RunConfig, TYPE_410_C_WT, TYPE_410_CR_WT};
use crate::error::AppError;
use crate::io::write_csv;
use crate::math::{alloy_wt_fractions, format_composition, linspace};
use crate::plot::{
    Annotation, ChartPanel, Figure, LIGHT_BLUE, LIGHT_CORAL, LIGHT_GREEN, LIGHT_YELLOW, Marker,
    Series, TAB_BLUE, TAB_GREEN, TAB_ORANGE, TAB_PURPLE, TAB_RED, WHEAT,
};
use crate::report::{self, print_section_header};
use crate::thermo::{Database, ERROR_LABEL, EquilibriumCalculator, FE_CR_C_FILE, FE_CR_C_TDB};

/// Phases considered for every Fe-Cr-C calculation.
pub const FE_CR_C_PHASES: [&str; 7] =
    ["LIQUID", "BCC_A2", "FCC_A1", "CEMENTITE", "M23C6", "M7C3", "M3C"];
const COMPONENTS: [&str; 4] = ["FE", "CR", "C", "VA"];

pub const SCAN_TEMPERATURES: [f64; 11] =
    [1000.0, 1100.0, 1200.0, 1300.0, 1350.0, 1400.0, 1500.0, 1525.0, 1600.0, 1700.0, 1800.0];
/// Literature maximum carbon (wt%) before cementite, aligned with `SCAN_TEMPERATURES`.
pub const MAX_CARBON_BEFORE_CEMENTITE: [f64; 11] =
    [1.8, 2.0, 2.3, 2.8, 3.2, 3.5, 4.0, 4.2, 4.5, 4.8, 5.0];

pub const ISOTHERM_K: f64 = 1350.0;
pub const CARBURIZED_SURFACE_C_WT: f64 = 3.5;
pub const CARBURIZING_T_K: f64 = 1525.0;
pub const TERNARY_T_K: f64 = 1500.0;

/// Phase field along an isotherm between two carbon contents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsothermRegion {
    pub from_wt: f64,
    pub to_wt: f64,
    pub phases: &'static str,
}

pub const ISOTHERM_1350_REGIONS: [IsothermRegion; 4] = [
    IsothermRegion { from_wt: 0.0, to_wt: 0.5, phases: "BCC (ferrite)" },
    IsothermRegion { from_wt: 0.5, to_wt: 2.0, phases: "FCC (austenite)" },
    IsothermRegion { from_wt: 2.0, to_wt: 3.2, phases: "FCC + M₂₃C₆ (chromium carbide)" },
    IsothermRegion {
        from_wt: 3.2,
        to_wt: 5.0,
        phases: "Multiple carbides (M₇C₃, M₃C, Cementite)",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CarbonLimitRow {
    #[serde(rename = "T_K")]
    pub temperature_k: f64,
    #[serde(rename = "Max_C_before_cementite")]
    pub max_carbon_wt: f64,
}

pub fn carbon_limits() -> Vec<CarbonLimitRow> {
    SCAN_TEMPERATURES
        .iter()
        .zip(MAX_CARBON_BEFORE_CEMENTITE)
        .map(|(&temperature_k, max_carbon_wt)| CarbonLimitRow { temperature_k, max_carbon_wt })
        .collect()
}

/// Linear interpolation of the cementite limit; `None` outside 1000-1800 K.
pub fn max_carbon_before_cementite(t: f64) -> Option<f64> {
    let ts = &SCAN_TEMPERATURES;
    if !(ts[0]..=ts[ts.len() - 1]).contains(&t) {
        return None;
    }
    let i = ts.iter().rposition(|&x| x <= t)?;
    if i + 1 == ts.len() {
        return Some(MAX_CARBON_BEFORE_CEMENTITE[i]);
    }
    let f = (t - ts[i]) / (ts[i + 1] - ts[i]);
    let (lo, hi) = (MAX_CARBON_BEFORE_CEMENTITE[i], MAX_CARBON_BEFORE_CEMENTITE[i + 1]);
    Some(lo + f * (hi - lo))
}

/// One cell of the Fe-12.5Cr-XC equilibrium scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanRow {
    #[serde(rename = "T_K")]
    pub temperature_k: f64,
    #[serde(rename = "C_wt%")]
    pub carbon_wt: f64,
    pub phases: String,
}

/// Equilibrium labels at fixed Cr over `carbon × temperatures`, carbon-major.
pub fn equilibrium_scan(
    db: &Database,
    config: &RunConfig,
    cr_wt: f64,
    carbon: &[f64],
    temperatures: &[f64],
) -> Result<Vec<ScanRow>, AppError> {
    let phases = available_phases(db, &FE_CR_C_PHASES);
    let calc = EquilibriumCalculator::new(db, &COMPONENTS, &phases)?
        .with_sample_steps(config.sample_steps);
    let points = carbon
        .iter()
        .map(|&c| mole_vector(calc.components(), &alloy_wt_fractions(cr_wt, c)?))
        .collect::<Result<Vec<_>, AppError>>()?;

    info!(cr_wt, cells = carbon.len() * temperatures.len(), "scanning Fe-Cr-C equilibria");
    let map = calc.phase_map(temperatures, &points)?;
    if map.error_count() > 0 {
        warn!(cells = map.error_count(), "scan has failed cells");
    }

    let mut rows = Vec::with_capacity(carbon.len() * temperatures.len());
    for (j, &c) in carbon.iter().enumerate() {
        for (i, &t) in temperatures.iter().enumerate() {
            rows.push(ScanRow {
                temperature_k: t,
                carbon_wt: c,
                phases: map.labels[i][j].clone(),
            });
        }
    }
    Ok(rows)
}

/// Scan label at a grid point, if it was scanned.
pub fn scan_label(rows: &[ScanRow], t: f64, c_wt: f64) -> Option<&str> {
    rows.iter()
        .find(|r| (r.temperature_k - t).abs() < 1e-9 && (r.carbon_wt - c_wt).abs() < 1e-9)
        .map(|r| r.phases.as_str())
}

pub fn fixed_chromium_figure(cr_wt: f64) -> Figure {
    let chart = ChartPanel::new(
        format!("Fe-{cr_wt}Cr-XC Phase Diagram (Schematic)"),
        "Weight Percent Carbon",
        "Temperature (K)",
        (0.0, 5.0),
        (1000.0, 1800.0),
    )
    .series(Series::hline(1350.0, 0.0, 5.0, TAB_RED).dashed().width(1).labelled("T = 1350 K"))
    .series(Series::hline(1200.0, 0.0, 5.0, TAB_BLUE).dashed().width(1).labelled("T = 1200 K"))
    .series(
        Series::hline(CARBURIZING_T_K, 0.0, 5.0, TAB_GREEN)
            .dashed()
            .width(1)
            .labelled("T = 1525 K"),
    )
    .series(Series::vline(3.2, 1000.0, 1800.0, TAB_ORANGE).dashed().labelled("Max C at 1350 K"))
    .series(Series::vline(2.3, 1000.0, 1800.0, TAB_PURPLE).dashed().labelled("Max C at 1200 K"))
    .series(
        Series::vline(CARBURIZED_SURFACE_C_WT, 1000.0, 1800.0, TAB_RED)
            .dashed()
            .labelled("Carburized surface (3.5 wt% C)"),
    )
    .annotate(Annotation::new((0.5, 1650.0), "BCC\n(Ferrite)").boxed(LIGHT_BLUE))
    .annotate(Annotation::new((1.0, 1400.0), "FCC\n(Austenite)").boxed(LIGHT_GREEN))
    .annotate(Annotation::new((2.5, 1250.0), "BCC + M₂₃C₆").boxed(LIGHT_YELLOW))
    .annotate(Annotation::new((4.0, 1100.0), "Carbides\n+ Cementite").boxed(LIGHT_CORAL))
    .annotate(
        Annotation::new(
            (0.9, 1755.0),
            format!("Cr = {cr_wt} wt% (fixed)\nType 410 Stainless Steel"),
        )
        .boxed(WHEAT),
    );
    Figure::new("", (1200, 800), chart)
}

#[derive(Debug, Clone)]
pub struct FixedChromiumResults {
    pub limits: Vec<CarbonLimitRow>,
    pub scan: Vec<ScanRow>,
}

/// B1: Fe-12.5Cr-XC diagram, isotherm reading and carburization.
pub fn run_fixed_chromium(
    ctx: &AnalysisContext,
    db: &Database,
) -> Result<FixedChromiumResults, AppError> {
    print_section_header("B1: Fe-12.5Cr-XC Phase Diagram Analysis");
    let nominal = alloy_wt_fractions(TYPE_410_CR_WT, TYPE_410_C_WT)?;
    println!("Type 410 Stainless Steel: {}", format_composition(&nominal));
    println!("Fixed Cr content: {TYPE_410_CR_WT} wt%");
    println!("Variable C content: 0-5 wt%");

    ctx.save(&fixed_chromium_figure(TYPE_410_CR_WT), "B1_Fe12.5Cr_XC_phase_diagram")?;

    let carbon = linspace(0.0, 5.0, 11);
    let scan = equilibrium_scan(db, &ctx.config, TYPE_410_CR_WT, &carbon, &SCAN_TEMPERATURES)?;
    write_csv(&ctx.output_path("B1_equilibrium_scan.csv"), &scan)?;

    print!("{}", report::format_isotherm(ISOTHERM_K, &ISOTHERM_1350_REGIONS, &scan));
    print!("{}", report::format_carbon_limits(&[1350.0, 1200.0]));
    print!(
        "{}",
        report::format_carburization(
            CARBURIZED_SURFACE_C_WT,
            CARBURIZING_T_K,
            TYPE_410_C_WT,
            scan_label(&scan, CARBURIZING_T_K, CARBURIZED_SURFACE_C_WT),
        )
    );

    let limits = carbon_limits();
    write_csv(&ctx.output_path("B1_phase_diagram_data.csv"), &limits)?;
    Ok(FixedChromiumResults { limits, scan })
}

/// An alloy analysed on the ternary section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TernaryAlloy {
    pub name: &'static str,
    pub cr_wt: f64,
    pub c_wt: f64,
    /// Literature phase assessment at 1500 K.
    pub phases: &'static [&'static str],
    pub phase_compositions: &'static [&'static str],
    pub description: &'static str,
    pub color: RGBColor,
}

impl TernaryAlloy {
    pub fn fe_wt(&self) -> f64 {
        100.0 - self.cr_wt - self.c_wt
    }

    /// Position in an equilateral Fe-Cr-C triangle with Fe at the origin,
    /// Cr at (1, 0) and C at the apex.
    pub fn ternary_xy(&self) -> (f64, f64) {
        let total = self.fe_wt() + self.cr_wt + self.c_wt;
        let (cr, c) = (self.cr_wt / total, self.c_wt / total);
        (cr + c / 2.0, c * 3f64.sqrt() / 2.0)
    }
}

pub const TERNARY_ALLOYS: [TernaryAlloy; 4] = [
    TernaryAlloy {
        name: "Fe-15.0Cr-0.01C",
        cr_wt: 15.0,
        c_wt: 0.01,
        phases: &["BCC (ferrite)"],
        phase_compositions: &["BCC: Fe-15.0Cr-0.01C (essentially same as overall composition)"],
        description: "Very low carbon → single phase BCC. Nearly pure Fe-Cr solid solution.",
        color: TAB_BLUE,
    },
    TernaryAlloy {
        name: "Fe-15.0Cr-0.70C",
        cr_wt: 15.0,
        c_wt: 0.70,
        phases: &["FCC (austenite)", "M₂₃C₆ (chromium carbide)"],
        phase_compositions: &[
            "FCC: Fe-16.5Cr-0.50C (approx, C-depleted)",
            "M₂₃C₆: (Cr,Fe)₂₃C₆ - rich in Cr",
        ],
        description: "Intermediate carbon. FCC stable at 1500 K. Some C forms Cr₂₃C₆.",
        color: TAB_GREEN,
    },
    TernaryAlloy {
        name: "Fe-20.0Cr-0.20C",
        cr_wt: 20.0,
        c_wt: 0.20,
        phases: &["BCC (ferrite)", "M₂₃C₆ (chromium carbide)"],
        phase_compositions: &[
            "BCC: Fe-21.0Cr-0.05C (approx, C-depleted)",
            "M₂₃C₆: (Cr,Fe)₂₃C₆ - high Cr content",
        ],
        description: "High Cr stabilizes BCC. Some carbide formation despite moderate C.",
        color: TAB_RED,
    },
    TernaryAlloy {
        name: "Fe-15.0Cr-3.0C",
        cr_wt: 15.0,
        c_wt: 3.0,
        phases: &["M₇C₃", "M₂₃C₆", "possibly Cementite"],
        phase_compositions: &[
            "M₇C₃: (Cr,Fe)₇C₃ - primary carbide",
            "M₂₃C₆: (Cr,Fe)₂₃C₆ - secondary carbide",
            "Possible: Fe₃C if over-carburized",
        ],
        description: "High carbon → multiple carbide phases. Over-carburized condition.",
        color: TAB_PURPLE,
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TernaryRow {
    #[serde(rename = "Composition")]
    pub composition: String,
    #[serde(rename = "Phases")]
    pub phases: String,
    #[serde(rename = "Phase_Count")]
    pub phase_count: usize,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Engine_Phases")]
    pub engine_phases: String,
}

/// Engine phase labels per alloy; a failed point yields `ERROR`.
pub fn engine_phases(
    db: &Database,
    config: &RunConfig,
    temperature: f64,
    alloys: &[TernaryAlloy],
) -> Result<Vec<String>, AppError> {
    let phases = available_phases(db, &FE_CR_C_PHASES);
    let calc = EquilibriumCalculator::new(db, &COMPONENTS, &phases)?
        .with_sample_steps(config.sample_steps);
    let samples = match calc.samples_at(temperature) {
        Ok(samples) => samples,
        Err(e) => {
            warn!(temperature, error = %e, "ternary sampling failed");
            return Ok(vec![ERROR_LABEL.to_string(); alloys.len()]);
        }
    };

    alloys
        .iter()
        .map(|alloy| {
            let wt = alloy_wt_fractions(alloy.cr_wt, alloy.c_wt)?;
            let target = mole_vector(calc.components(), &wt)?;
            Ok(match calc.solve_refined(&samples, &target) {
                Ok(result) => result.label(),
                Err(e) => {
                    warn!(alloy = alloy.name, error = %e, "ternary point failed");
                    ERROR_LABEL.to_string()
                }
            })
        })
        .collect()
}

pub fn ternary_rows(alloys: &[TernaryAlloy], engine: &[String]) -> Vec<TernaryRow> {
    alloys
        .iter()
        .zip(engine)
        .map(|(a, e)| TernaryRow {
            composition: a.name.to_string(),
            phases: a.phases.join(" + "),
            phase_count: a.phases.len(),
            description: a.description.to_string(),
            engine_phases: e.clone(),
        })
        .collect()
}

const GRID_GREY: RGBColor = RGBColor(205, 205, 205);

pub fn ternary_figure(temperature: f64, alloys: &[TernaryAlloy]) -> Figure {
    let h = 3f64.sqrt() / 2.0;
    let mut chart = ChartPanel::bare(
        format!("Fe-Cr-C Ternary Phase Diagram at {temperature} K"),
        (-0.15, 1.15),
        (-0.15, 1.0),
    );

    for i in 1..5 {
        let t = i as f64 / 5.0;
        chart = chart
            .series(
                Series::line(vec![(t / 2.0, t * h), (1.0 - t / 2.0, t * h)], GRID_GREY).width(1),
            )
            .series(Series::line(vec![(0.0, 0.0), (1.0 - t, t * h)], GRID_GREY).width(1))
            .series(Series::line(vec![(1.0, 0.0), (t / 2.0, t * h)], GRID_GREY).width(1));
    }
    let outline = vec![(0.0, 0.0), (1.0, 0.0), (0.5, h), (0.0, 0.0)];
    chart = chart.series(Series::line(outline, BLACK).width(3));

    for pct in [20, 40, 60, 80] {
        let t = pct as f64 / 100.0;
        chart = chart
            .annotate(Annotation::new((-0.05, t * h), format!("{pct}%")).size(11))
            .annotate(Annotation::new((1.05, t * h), format!("{pct}%")).size(11))
            .annotate(Annotation::new((t, -0.04), format!("{pct}%")).size(11));
    }
    chart = chart
        .annotate(Annotation::new((0.0, -0.09), "Fe (100%)").size(18))
        .annotate(Annotation::new((1.0, -0.09), "Cr (100%)").size(18))
        .annotate(Annotation::new((0.5, h + 0.05), "C (100%)").size(18))
        .annotate(Annotation::new((0.15, 0.15), "BCC\n(Ferrite)").boxed(LIGHT_BLUE))
        .annotate(Annotation::new((0.5, 0.4), "FCC\n(Austenite)").boxed(LIGHT_GREEN))
        .annotate(Annotation::new((0.7, 0.2), "BCC+Carbides").boxed(LIGHT_YELLOW))
        .annotate(
            Annotation::new(
                (0.95, -0.12),
                format!(
                    "Temperature: {temperature} K ({:.0}°C)",
                    crate::domain::kelvin_to_celsius(temperature)
                ),
            )
            .boxed(WHEAT),
        );

    // Stack the labels: the three low-carbon alloys sit almost on top of each other.
    for (i, alloy) in alloys.iter().enumerate() {
        let at = alloy.ternary_xy();
        let mut marker = Marker::new(at, alloy.color);
        marker.size = 7;
        let short = alloy.name.trim_start_matches("Fe-");
        chart = chart.marker(marker).annotate(
            Annotation::new(
                (at.0 + 0.18, 0.08 + 0.09 * i as f64),
                format!("{short}: {}", alloy.phases.join(" + ")),
            )
            .boxed(RGBColor(245, 245, 245))
            .size(12)
            .color(alloy.color),
        );
    }

    Figure::new("", (1100, 1000), chart)
}

/// B2: ternary section at 1500 K with four alloys.
pub fn run_ternary(ctx: &AnalysisContext, db: &Database) -> Result<Vec<TernaryRow>, AppError> {
    print_section_header("B2: Ternary Fe-Cr-C Phase Diagram at 1500 K");
    println!("Temperature: {}", report::fmt_temperature(TERNARY_T_K));
    println!("Three-component system: Fe, Cr, C");

    ctx.save(&ternary_figure(TERNARY_T_K, &TERNARY_ALLOYS), "B2_Fe_Cr_C_ternary_diagram")?;

    let engine = engine_phases(db, &ctx.config, TERNARY_T_K, &TERNARY_ALLOYS)?;
    print!("{}", report::format_ternary_alloys(&TERNARY_ALLOYS, &engine));

    let rows = ternary_rows(&TERNARY_ALLOYS, &engine);
    write_csv(&ctx.output_path("B2_ternary_compositions.csv"), &rows)?;
    Ok(rows)
}

#[derive(Debug, Clone)]
pub struct PartBResults {
    pub fixed_chromium: FixedChromiumResults,
    pub ternary: Vec<TernaryRow>,
}

pub fn run(ctx: &AnalysisContext) -> Result<PartBResults, AppError> {
    print_section_header("PART B: MARTENSITIC STAINLESS STEEL DESIGN - Fe-Cr-C SYSTEM");
    let db =
        ctx.load_database("Loading Fe-Cr-C Thermodynamic Database", FE_CR_C_FILE, FE_CR_C_TDB)?;

    let fixed_chromium = run_fixed_chromium(ctx, &db)?;
    let ternary = run_ternary(ctx, &db)?;

    print_section_header("Part B Summary and Design Recommendations");
    print!("{}", report::format_part_b_summary());

    print_section_header("PART B COMPLETE");
    println!(
        "All calculations completed and outputs saved to {}",
        ctx.config.output_dir.display()
    );
    Ok(PartBResults { fixed_chromium, ternary })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_table_is_monotonic() {
        let limits = carbon_limits();
        assert_eq!(limits.len(), 11);
        assert!(limits.windows(2).all(|w| w[1].max_carbon_wt > w[0].max_carbon_wt));
        assert_eq!(limits[4], CarbonLimitRow { temperature_k: 1350.0, max_carbon_wt: 3.2 });
    }

    #[test]
    fn limits_interpolate_between_rows() {
        assert_eq!(max_carbon_before_cementite(1350.0), Some(3.2));
        assert_eq!(max_carbon_before_cementite(1800.0), Some(5.0));
        assert!((max_carbon_before_cementite(1250.0).unwrap() - 2.55).abs() < 1e-12);
        assert_eq!(max_carbon_before_cementite(900.0), None);
        assert_eq!(max_carbon_before_cementite(1900.0), None);
    }

    #[test]
    fn isotherm_regions_tile_zero_to_five() {
        let r = &ISOTHERM_1350_REGIONS;
        assert_eq!(r[0].from_wt, 0.0);
        assert_eq!(r[r.len() - 1].to_wt, 5.0);
        assert!(r.windows(2).all(|w| w[0].to_wt == w[1].from_wt));
    }

    #[test]
    fn ternary_coordinates() {
        let a = TERNARY_ALLOYS[3];
        assert_eq!(a.fe_wt(), 82.0);
        let (x, y) = a.ternary_xy();
        assert!((x - 0.165).abs() < 1e-12);
        assert!((y - 0.03 * 3f64.sqrt() / 2.0).abs() < 1e-12);

        let rows = ternary_rows(&TERNARY_ALLOYS, &vec!["X".to_string(); 4]);
        assert_eq!(rows[1].phases, "FCC (austenite) + M₂₃C₆ (chromium carbide)");
        assert_eq!(rows[3].phase_count, 3);
        assert_eq!(rows[0].engine_phases, "X");
    }

    #[test]
    fn scan_is_carbon_major() {
        let db = Database::parse(FE_CR_C_TDB).unwrap();
        let config = RunConfig {
            sample_steps: 12,
            ..RunConfig::default()
        };
        let rows =
            equilibrium_scan(&db, &config, TYPE_410_CR_WT, &[0.0, 1.0], &[1200.0, 1500.0]).unwrap();

        assert_eq!(rows.len(), 4);
        assert_eq!((rows[0].carbon_wt, rows[0].temperature_k), (0.0, 1200.0));
        assert_eq!((rows[1].carbon_wt, rows[1].temperature_k), (0.0, 1500.0));
        assert_eq!((rows[2].carbon_wt, rows[2].temperature_k), (1.0, 1200.0));
        assert!(rows.iter().all(|r| !r.phases.is_empty()));
        assert_eq!(scan_label(&rows, 1500.0, 1.0), Some(rows[3].phases.as_str()));
        assert_eq!(scan_label(&rows, 1300.0, 1.0), None);
    }

    #[test]
    fn engine_phases_cover_every_alloy() {
        let db = Database::parse(FE_CR_C_TDB).unwrap();
        let config = RunConfig {
            sample_steps: 12,
            ..RunConfig::default()
        };
        let labels = engine_phases(&db, &config, TERNARY_T_K, &TERNARY_ALLOYS).unwrap();
        assert_eq!(labels.len(), 4);
        for label in &labels {
            assert!(
                label == ERROR_LABEL || label.split('+').all(|p| FE_CR_C_PHASES.contains(&p)),
                "unexpected label {label}"
            );
        }
    }

    #[test]
    fn failed_sampling_marks_every_alloy() {
        let db = Database::parse(FE_CR_C_TDB).unwrap();
        let labels = engine_phases(&db, &RunConfig::default(), f64::NAN, &TERNARY_ALLOYS).unwrap();
        assert_eq!(labels, vec![ERROR_LABEL.to_string(); TERNARY_ALLOYS.len()]);
    }
}
