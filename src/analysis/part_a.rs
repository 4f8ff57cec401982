//! Part A: carbon steel design on the binary Fe-C diagram.
//!
//! A1/A2 are equilibrium phase maps from the embedded database. A3..A9 work
//! from the literature critical points with the lever rule and quadratic
//! regression.

use chrono::Utc;
use plotters::style::RGBColor;
use plotters::style::colors::BLACK;
use serde::Serialize;
use tracing::{info, warn};

use crate::analysis::{AnalysisContext, available_phases, mole_vector};
use crate::domain::{
    C_CEMENTITE_WT, C_EUTECTIC_WT, C_EUTECTOID_WT, C_FERRITE_WT, CriticalPoint, PhaseSplit,
    QuadraticFit, RunConfig, T_EUTECTIC_K, T_EUTECTOID_K, T_ROOM_K, kelvin_to_celsius,
};
use crate::error::AppError;
use crate::io::{BoundaryFit, FitFile, write_csv, write_fit_json, write_text};
use crate::math::{
    alloy_wt_fractions, lever_rule, linspace, overall_from_fraction, quadratic_fit,
    sample_quadratic,
};
use crate::plot::{
    Annotation, ChartPanel, Figure, LIGHT_BLUE, LIGHT_CORAL, LIGHT_GREEN, LIGHT_YELLOW, Layout,
    Marker, PiePanel, Region, Series, TAB_BLUE, TAB_GREEN, TAB_PURPLE, TAB_RED, TextPanel,
    region_color,
};
use crate::report::{self, print_section_header};
use crate::thermo::{Database, ERROR_LABEL, EquilibriumCalculator, FE_C_FILE, FE_C_TDB, PhaseMap};

const PINK: RGBColor = RGBColor(255, 192, 203);
const PLUM: RGBColor = RGBColor(221, 160, 221);
const ERROR_FILL: RGBColor = RGBColor(210, 210, 210);

const DIAGRAM_T_RANGE: (f64, f64) = (500.0, 2000.0);
const DIAGRAM_C_RANGE: (f64, f64) = (0.0, 7.0);

/// A binary Fe-C phase map request.
#[derive(Debug, Clone, Copy)]
pub struct DiagramSpec {
    pub stem: &'static str,
    pub header: &'static str,
    pub title: &'static str,
    pub phases: &'static [&'static str],
    /// Region names placed at (wt% C, K).
    pub labels: &'static [(&'static str, f64, f64, RGBColor)],
    pub note: Option<&'static str>,
}

pub const A1_DIAGRAM: DiagramSpec = DiagramSpec {
    stem: "A1_phase_diagram_with_graphite",
    header: "A1: Fe-C Phase Diagram (with Graphite)",
    title: "Fe-C Phase Diagram (with Graphite)",
    phases: &["LIQUID", "BCC_A2", "FCC_A1", "CEMENTITE", "GRAPHITE"],
    labels: &[
        ("δ-ferrite", 0.5, 1700.0, LIGHT_BLUE),
        ("γ-austenite", 2.0, 1300.0, LIGHT_GREEN),
        ("α-ferrite", 0.2, 800.0, LIGHT_YELLOW),
        ("Liquid", 5.5, 1400.0, LIGHT_CORAL),
        ("Graphite", 6.7, 700.0, RGBColor(190, 190, 190)),
        ("Cementite", 6.5, 900.0, PINK),
    ],
    note: None,
};

pub const A2_DIAGRAM: DiagramSpec = DiagramSpec {
    stem: "A2_phase_diagram_without_graphite",
    header: "A2: Fe-C Phase Diagram (without Graphite)",
    title: "Fe-C Phase Diagram (without Graphite) - Engineering Relevant",
    phases: &["LIQUID", "BCC_A2", "FCC_A1", "CEMENTITE"],
    labels: &[
        ("δ-ferrite", 0.5, 1700.0, LIGHT_BLUE),
        ("γ-austenite", 1.5, 1300.0, LIGHT_GREEN),
        ("α-ferrite", 0.2, 800.0, LIGHT_YELLOW),
        ("Liquid", 5.5, 1500.0, LIGHT_CORAL),
        ("Cementite", 6.7, 900.0, PINK),
    ],
    note: Some(
        "Graphite is excluded because cementite formation is kinetically favored\n\
         in practical steelmaking, even though graphite is thermodynamically stable.",
    ),
};

/// Equilibrium phase labels over the Fe-C temperature × wt% C grid.
#[derive(Debug, Clone)]
pub struct PhaseDiagram {
    pub phases: Vec<String>,
    pub carbon_wt: Vec<f64>,
    pub carbon_x: Vec<f64>,
    pub map: PhaseMap,
}

/// One grid cell of a phase map, as exported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseCell {
    #[serde(rename = "T_K")]
    pub temperature_k: f64,
    #[serde(rename = "C_wt%")]
    pub carbon_wt: f64,
    #[serde(rename = "X_C")]
    pub carbon_x: f64,
    pub phases: String,
}

impl PhaseDiagram {
    pub fn cells(&self) -> Vec<PhaseCell> {
        let mut out = Vec::with_capacity(self.map.temperatures.len() * self.carbon_wt.len());
        for (t, row) in self.map.temperatures.iter().zip(&self.map.labels) {
            for ((c, x), label) in self.carbon_wt.iter().zip(&self.carbon_x).zip(row) {
                out.push(PhaseCell {
                    temperature_k: *t,
                    carbon_wt: *c,
                    carbon_x: *x,
                    phases: label.clone(),
                });
            }
        }
        out
    }

    /// Label of the grid cell nearest to `(t, c_wt)`.
    pub fn label_at(&self, t: f64, c_wt: f64) -> Option<&str> {
        let i = nearest(&self.map.temperatures, t)?;
        let j = nearest(&self.carbon_wt, c_wt)?;
        self.map.labels.get(i)?.get(j).map(String::as_str)
    }

    /// Cells per distinct label, in first-seen order.
    pub fn region_counts(&self) -> Vec<(String, usize)> {
        self.map
            .regions()
            .into_iter()
            .map(|r| {
                let n = self.map.labels.iter().flatten().filter(|l| l.as_str() == r).count();
                (r.to_string(), n)
            })
            .collect()
    }
}

fn nearest(values: &[f64], v: f64) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .min_by(|a, b| (a.1 - v).abs().total_cmp(&(b.1 - v).abs()))
        .map(|(i, _)| i)
}

/// Compute an Fe-C phase map for the given phases on the configured grid.
pub fn compute_phase_diagram(
    db: &Database,
    phases: &[&str],
    config: &RunConfig,
) -> Result<PhaseDiagram, AppError> {
    let phases = available_phases(db, phases);
    let calc = EquilibriumCalculator::new(db, &["FE", "C", "VA"], &phases)?
        .with_sample_steps(config.sample_steps);
    let c_index = calc
        .components()
        .iter()
        .position(|c| c == "C")
        .ok_or_else(|| AppError::new(3, "Database has no carbon component."))?;

    let carbon_wt = linspace(DIAGRAM_C_RANGE.0, DIAGRAM_C_RANGE.1, config.grid_c.max(2));
    let temperatures = linspace(DIAGRAM_T_RANGE.0, DIAGRAM_T_RANGE.1, config.grid_t.max(2));
    let points = carbon_wt
        .iter()
        .map(|&c| mole_vector(calc.components(), &alloy_wt_fractions(0.0, c)?))
        .collect::<Result<Vec<_>, AppError>>()?;

    info!(
        phases = ?calc.phase_names(),
        rows = temperatures.len(),
        columns = points.len(),
        "computing Fe-C phase map"
    );
    let map = calc.phase_map(&temperatures, &points)?;
    if map.error_count() > 0 {
        warn!(cells = map.error_count(), "phase map has failed cells");
    }

    Ok(PhaseDiagram {
        phases: calc.phase_names().iter().map(|s| s.to_string()).collect(),
        carbon_x: points.iter().map(|p| p[c_index]).collect(),
        carbon_wt,
        map,
    })
}

/// Cell edges halfway to the neighbouring grid values.
fn cell_bounds(values: &[f64], i: usize) -> (f64, f64) {
    let lo = if i == 0 { values[0] } else { 0.5 * (values[i - 1] + values[i]) };
    let hi = if i + 1 == values.len() { values[i] } else { 0.5 * (values[i] + values[i + 1]) };
    (lo, hi)
}

pub fn phase_diagram_figure(spec: &DiagramSpec, diagram: &PhaseDiagram) -> Figure {
    let names = diagram.map.regions();
    let mut regions = Vec::with_capacity(diagram.map.temperatures.len() * diagram.carbon_wt.len());
    for (i, row) in diagram.map.labels.iter().enumerate() {
        let y = cell_bounds(&diagram.map.temperatures, i);
        for (j, label) in row.iter().enumerate() {
            let color = if label == ERROR_LABEL {
                ERROR_FILL
            } else {
                region_color(names.iter().position(|n| n == label).unwrap_or(0))
            };
            regions.push(Region {
                label: label.clone(),
                x: cell_bounds(&diagram.carbon_wt, j),
                y,
                color,
            });
        }
    }

    let mut chart = ChartPanel::new(
        spec.title,
        "Weight Percent Carbon",
        "Temperature (K)",
        DIAGRAM_C_RANGE,
        DIAGRAM_T_RANGE,
    )
    .regions(regions);
    for (text, c, t, bg) in spec.labels {
        chart = chart.annotate(Annotation::new((*c, *t), *text).boxed(*bg));
    }
    Figure::new("", (1200, 800), chart)
}

pub fn run_phase_diagram(
    ctx: &AnalysisContext,
    db: &Database,
    spec: &DiagramSpec,
) -> Result<PhaseDiagram, AppError> {
    print_section_header(spec.header);
    println!("Computing equilibrium for phases: {:?}", available_phases(db, spec.phases));
    if let Some(note) = spec.note {
        println!("{note}");
    }

    let diagram = compute_phase_diagram(db, spec.phases, &ctx.config)?;
    print!("{}", report::format_phase_diagram(spec, &diagram));

    write_csv(&ctx.output_path(&format!("{}_cells.csv", spec.stem)), &diagram.cells())?;
    ctx.save(&phase_diagram_figure(spec, &diagram), spec.stem)?;
    Ok(diagram)
}

/// The two invariant reactions used by the rest of Part A.
#[derive(Debug, Clone, PartialEq)]
pub struct CriticalPoints {
    pub eutectic: CriticalPoint,
    pub eutectoid: CriticalPoint,
}

impl CriticalPoints {
    pub fn literature() -> Self {
        CriticalPoints {
            eutectic: CriticalPoint {
                name: "Eutectic".to_string(),
                temperature_k: T_EUTECTIC_K,
                temperature_c: kelvin_to_celsius(T_EUTECTIC_K),
                composition_wt: C_EUTECTIC_WT,
                reaction: "L → γ + Fe₃C".to_string(),
            },
            eutectoid: CriticalPoint {
                name: "Eutectoid".to_string(),
                temperature_k: T_EUTECTOID_K,
                temperature_c: kelvin_to_celsius(T_EUTECTOID_K),
                composition_wt: C_EUTECTOID_WT,
                reaction: "γ → α + Fe₃C".to_string(),
            },
        }
    }
}

/// Isotherms checked for the "remain fully solid" restriction.
pub const SOLIDUS_CHECK_TEMPERATURES: [f64; 3] = [1600.0, 1500.0, 1400.0];

/// Maximum carbon for a fully solid alloy at one temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct SolidusLimit {
    pub temperature_k: f64,
    pub above_eutectic: bool,
    pub max_carbon: String,
    pub restriction: String,
}

pub fn solidus_limits(eutectic: &CriticalPoint, temperatures: &[f64]) -> Vec<SolidusLimit> {
    temperatures
        .iter()
        .map(|&t| {
            let above = t > eutectic.temperature_k;
            if above {
                SolidusLimit {
                    temperature_k: t,
                    above_eutectic: true,
                    max_carbon: format!("< {} wt%", eutectic.composition_wt),
                    restriction: "Below eutectic composition".to_string(),
                }
            } else {
                SolidusLimit {
                    temperature_k: t,
                    above_eutectic: false,
                    max_carbon: "0-5 wt% (all solid)".to_string(),
                    restriction: "Below eutectic temperature".to_string(),
                }
            }
        })
        .collect()
}

fn eutectic_figure(eutectic: &CriticalPoint, limits: &[SolidusLimit]) -> Figure {
    let liquidus: Vec<(f64, f64)> = linspace(0.0, 7.0, 100)
        .into_iter()
        .map(|c| (c, 1811.0 - 80.0 * c))
        .collect();
    let (c, t) = (eutectic.composition_wt, eutectic.temperature_k);

    let chart = ChartPanel::new(
        "Fe-C Phase Diagram - Eutectic Point",
        "Weight Percent Carbon",
        "Temperature (K)",
        (0.0, 7.0),
        (1300.0, 1900.0),
    )
    .series(Series::line(liquidus, TAB_RED).labelled("Liquidus (approx)"))
    .series(Series::hline(1600.0, 0.0, 7.0, TAB_BLUE).dashed().width(1).labelled("T = 1600 K"))
    .series(Series::hline(1500.0, 0.0, 7.0, TAB_GREEN).dashed().width(1).labelled("T = 1500 K"))
    .series(Series::hline(1400.0, 0.0, 7.0, TAB_PURPLE).dashed().width(1).labelled("T = 1400 K"))
    .series(Series::hline(t, 0.0, 7.0, LIGHT_CORAL).dashed())
    .marker(Marker::new((c, t), TAB_RED))
    .annotate(
        Annotation::new((c + 1.0, t + 150.0), format!("Eutectic {t} K, {c} wt% C"))
            .boxed(RGBColor(255, 255, 0)),
    );

    let mut lines = vec!["Maximum C content to remain fully solid:".to_string(), String::new()];
    for l in limits {
        lines.push(report::fmt_temperature(l.temperature_k));
        lines.push(format!("    {}  ({})", l.max_carbon, l.restriction));
    }
    let table = TextPanel::new(Some("Solidus Restrictions (Max Operating Temperatures)"), lines);

    Figure::new(
        "A3: Eutectic Analysis",
        (1600, 640),
        Layout::Row(vec![(3, chart.into()), (2, table.into())]),
    )
}

fn eutectoid_figure(eutectoid: &CriticalPoint) -> Figure {
    let (c0, t0) = (eutectoid.composition_wt, eutectoid.temperature_k);
    let range = linspace(0.0, 2.0, 100);
    let alpha_gamma: Vec<(f64, f64)> =
        range.iter().map(|&c| (c, t0 - 50.0 * (c - C_FERRITE_WT).powi(2))).collect();
    let gamma_cem: Vec<(f64, f64)> =
        range.iter().map(|&c| (c, t0 - 30.0 * (c - c0).powi(2))).collect();

    let chart = ChartPanel::new(
        "Fe-C Phase Diagram - Eutectoid Region (Zoomed)",
        "Weight Percent Carbon",
        "Temperature (K)",
        (0.0, 2.0),
        (900.0, 1150.0),
    )
    .series(Series::line(alpha_gamma, TAB_BLUE).labelled("α + γ boundary"))
    .series(Series::line(gamma_cem, TAB_RED).labelled("γ + Fe₃C boundary"))
    .series(Series::hline(t0, 0.0, 2.0, TAB_GREEN).dashed())
    .marker(Marker::new((c0, t0), TAB_GREEN))
    .annotate(
        Annotation::new(
            (c0 + 0.45, t0 + 30.0),
            format!("Eutectoid {t0} K ({:.0}°C), {c0} wt% C", eutectoid.temperature_c),
        )
        .boxed(LIGHT_GREEN),
    )
    .annotate(Annotation::new((0.3, 950.0), "α + γ").boxed(LIGHT_BLUE))
    .annotate(Annotation::new((1.2, 950.0), "γ + Fe₃C").boxed(LIGHT_CORAL))
    .annotate(Annotation::new((c0, 1050.0), "γ-austenite").boxed(LIGHT_GREEN))
    .annotate(Annotation::new((c0, 920.0), "α + Fe₃C (Pearlite)").boxed(LIGHT_YELLOW));

    let text = TextPanel::new(
        Some("Eutectoid Transformation"),
        vec![
            "Upon cooling through the eutectoid temperature:".to_string(),
            String::new(),
            "    γ-austenite (FCC)".to_string(),
            "        ↓".to_string(),
            "    α-ferrite (BCC) + Cementite (Fe₃C)".to_string(),
            String::new(),
            "Microstructure: PEARLITE".to_string(),
            "Lamellar structure of alternating".to_string(),
            "α-ferrite and cementite layers".to_string(),
            String::new(),
            "Properties:".to_string(),
            "  • Intermediate hardness".to_string(),
            "  • Good strength".to_string(),
            "  • Moderate ductility".to_string(),
        ],
    );

    Figure::new(
        "A4: Eutectoid Analysis",
        (1600, 640),
        Layout::Row(vec![(1, chart.into()), (1, text.into())]),
    )
}

/// A3 and A4: report the invariant points and export them.
pub fn run_critical_points(ctx: &AnalysisContext) -> Result<CriticalPoints, AppError> {
    let points = CriticalPoints::literature();
    let limits = solidus_limits(&points.eutectic, &SOLIDUS_CHECK_TEMPERATURES);

    print_section_header("A3: Eutectic Point Analysis");
    print!(
        "{}",
        report::format_critical_point(&points.eutectic, "LIQUID → γ-AUSTENITE + CEMENTITE")
    );
    println!("  This is the lowest melting point composition");
    ctx.save(&eutectic_figure(&points.eutectic, &limits), "A3_eutectic_analysis")?;

    print_section_header("A4: Eutectoid Point Analysis");
    print!(
        "{}",
        report::format_critical_point(&points.eutectoid, "γ-AUSTENITE → α-FERRITE + CEMENTITE")
    );
    println!("  This forms the characteristic 'pearlite' microstructure");
    ctx.save(&eutectoid_figure(&points.eutectoid), "A4_eutectoid_analysis")?;

    print_section_header("A3 continued: Maximum Operating Temperatures");
    print!("{}", report::format_solidus_limits(&points.eutectic, &limits));

    write_csv(
        &ctx.output_path("A3_A4_critical_points.csv"),
        &[points.eutectic.clone(), points.eutectoid.clone()],
    )?;
    Ok(points)
}

/// Literature points on the low-carbon (α+γ / γ) austenite boundary.
pub const LOW_BRANCH_C: [f64; 6] = [0.02, 0.10, 0.20, 0.30, 0.40, 0.50];
pub const LOW_BRANCH_T: [f64; 6] = [1000.0, 980.0, 960.0, 940.0, 920.0, 900.0];
/// Literature points on the high-carbon (γ / γ+Fe₃C) austenite boundary.
pub const HIGH_BRANCH_C: [f64; 6] = [0.80, 1.00, 1.20, 1.40, 1.60, 1.80];
pub const HIGH_BRANCH_T: [f64; 6] = [995.0, 985.0, 970.0, 950.0, 925.0, 900.0];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryFits {
    pub low: QuadraticFit,
    pub high: QuadraticFit,
}

pub fn fit_austenite_boundaries() -> Result<BoundaryFits, AppError> {
    Ok(BoundaryFits {
        low: quadratic_fit(&LOW_BRANCH_C, &LOW_BRANCH_T)?,
        high: quadratic_fit(&HIGH_BRANCH_C, &HIGH_BRANCH_T)?,
    })
}

fn fit_panel(title: &str, cs: &[f64], ts: &[f64], fit: &QuadraticFit) -> ChartPanel {
    let (c_lo, c_hi) = (cs[0], cs[cs.len() - 1]);
    let t_lo = ts.iter().copied().fold(f64::INFINITY, f64::min);
    let t_hi = ts.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let pad_c = 0.08 * (c_hi - c_lo);
    let pad_t = 0.10 * (t_hi - t_lo);

    let data: Vec<(f64, f64)> = cs.iter().copied().zip(ts.iter().copied()).collect();
    ChartPanel::new(
        title,
        "Weight % Carbon",
        "Temperature (K)",
        (c_lo - pad_c, c_hi + pad_c),
        (t_lo - pad_t, t_hi + pad_t),
    )
    .series(Series::scatter(data, TAB_RED).labelled("Data points"))
    .series(
        Series::line(sample_quadratic(fit, c_lo, c_hi, 100), TAB_BLUE).labelled("Quadratic fit"),
    )
}

/// A5: quadratic regression of both austenite boundary branches.
pub fn run_boundary_fits(ctx: &AnalysisContext) -> Result<BoundaryFits, AppError> {
    print_section_header("A5: Austenite Phase Boundary Regression");
    let fits = fit_austenite_boundaries()?;
    print!("{}", report::format_boundary_fits(&fits));

    let figure = Figure::new(
        "A5: Austenite Boundary Fits",
        (1400, 600),
        Layout::Row(vec![
            (
                1,
                fit_panel("Low-Carbon Branch Fit", &LOW_BRANCH_C, &LOW_BRANCH_T, &fits.low).into(),
            ),
            (
                1,
                fit_panel("High-Carbon Branch Fit", &HIGH_BRANCH_C, &HIGH_BRANCH_T, &fits.high)
                    .into(),
            ),
        ]),
    );
    ctx.save(&figure, "A5_austenite_boundary_fits")?;

    let file = FitFile::new(vec![
        BoundaryFit::new("low_carbon", "α+γ / γ", &LOW_BRANCH_C, &LOW_BRANCH_T, fits.low),
        BoundaryFit::new("high_carbon", "γ / γ+Fe₃C", &HIGH_BRANCH_C, &HIGH_BRANCH_T, fits.high),
    ]);
    write_fit_json(&ctx.output_path("A5_austenite_boundary_fits.json"), &file)?;
    Ok(fits)
}

/// A6: eutectoid steel just below the eutectoid temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct EutectoidSteel {
    pub carbon_wt: f64,
    pub temperature_k: f64,
    pub ferrite_carbon_wt: f64,
    pub cementite_carbon_wt: f64,
    pub split: PhaseSplit,
}

pub fn eutectoid_steel(eutectoid: &CriticalPoint) -> EutectoidSteel {
    let (ferrite, cementite) = lever_rule(eutectoid.composition_wt, C_FERRITE_WT, C_CEMENTITE_WT);
    EutectoidSteel {
        carbon_wt: eutectoid.composition_wt,
        temperature_k: eutectoid.temperature_k,
        ferrite_carbon_wt: C_FERRITE_WT,
        cementite_carbon_wt: C_CEMENTITE_WT,
        split: PhaseSplit {
            left_name: "α-ferrite".to_string(),
            right_name: "Cementite".to_string(),
            left: ferrite,
            right: cementite,
        },
    }
}

fn eutectoid_steel_figure(steel: &EutectoidSteel) -> Figure {
    let (c, t) = (steel.carbon_wt, steel.temperature_k);
    let end = t - 10.0;
    let path: Vec<(f64, f64)> = linspace(1100.0, end, 20).into_iter().map(|tt| (c, tt)).collect();

    let chart = ChartPanel::new(
        "A6: Eutectoid Steel Cooling Path",
        "Weight % Carbon",
        "Temperature (K)",
        (0.0, 1.5),
        (900.0, 1200.0),
    )
    .series(Series::hline(t, 0.0, 1.5, TAB_GREEN).dashed().labelled("Eutectoid T"))
    .series(Series::vline(c, 900.0, 1200.0, LIGHT_BLUE).dashed())
    .series(Series::line(path, TAB_RED).width(4).with_markers().labelled("Cooling Path"))
    .marker(Marker::new((c, 1100.0), TAB_GREEN).labelled("Start (1100 K)"))
    .marker(Marker::new((c, end), TAB_RED).labelled(format!("End ({end} K)")))
    .annotate(Annotation::new((c, 1050.0), "γ-austenite (single phase)").boxed(LIGHT_GREEN))
    .annotate(Annotation::new((c, 950.0), "α + Fe₃C (Pearlite)").boxed(LIGHT_YELLOW));

    let compositions = TextPanel::new(
        Some("Phase Compositions"),
        vec![
            "α-ferrite (BCC):".to_string(),
            format!("  {} wt% C", steel.ferrite_carbon_wt),
            format!("  {:.2} wt% Fe", 100.0 - steel.ferrite_carbon_wt),
            String::new(),
            "Cementite (Fe₃C):".to_string(),
            format!("  {} wt% C", steel.cementite_carbon_wt),
            format!("  {:.2} wt% Fe", 100.0 - steel.cementite_carbon_wt),
        ],
    );
    let pie = PiePanel {
        title: "Mass Fractions".to_string(),
        slices: vec![
            (steel.split.left_name.clone(), steel.split.left, LIGHT_BLUE),
            (steel.split.right_name.clone(), steel.split.right, PINK),
        ],
    };

    Figure::new(
        "",
        (1600, 600),
        Layout::Row(vec![(2, chart.into()), (1, compositions.into()), (1, pie.into())]),
    )
}

pub fn run_eutectoid_steel(
    ctx: &AnalysisContext,
    points: &CriticalPoints,
) -> Result<EutectoidSteel, AppError> {
    print_section_header("A6: Eutectoid Steel Analysis");
    let steel = eutectoid_steel(&points.eutectoid);
    print!("{}", report::format_eutectoid_steel(&steel));
    ctx.save(&eutectoid_steel_figure(&steel), "A6_eutectoid_steel")?;
    Ok(steel)
}

/// Carbon content of the A7 hypoeutectoid steel (wt%).
pub const HYPOEUTECTOID_C_WT: f64 = 0.52;

/// A7: hypoeutectoid steel just above and just below the eutectoid.
#[derive(Debug, Clone, PartialEq)]
pub struct HypoeutectoidSteel {
    pub carbon_wt: f64,
    pub eutectoid_k: f64,
    /// Proeutectoid α-ferrite + γ-austenite at T_eutectoid + δT.
    pub above: PhaseSplit,
    /// Total α-ferrite + cementite at T_eutectoid − δT.
    pub below: PhaseSplit,
    pub eutectoid_ferrite: f64,
}

impl HypoeutectoidSteel {
    pub fn proeutectoid_ferrite(&self) -> f64 {
        self.above.left
    }
}

pub fn hypoeutectoid_steel(carbon_wt: f64, eutectoid: &CriticalPoint) -> HypoeutectoidSteel {
    let (pro_ferrite, austenite) = lever_rule(carbon_wt, C_FERRITE_WT, eutectoid.composition_wt);
    let (total_ferrite, cementite) = lever_rule(carbon_wt, C_FERRITE_WT, C_CEMENTITE_WT);
    HypoeutectoidSteel {
        carbon_wt,
        eutectoid_k: eutectoid.temperature_k,
        above: PhaseSplit {
            left_name: "Proeutectoid α-ferrite".to_string(),
            right_name: "γ-austenite".to_string(),
            left: pro_ferrite,
            right: austenite,
        },
        below: PhaseSplit {
            left_name: "Total α-ferrite".to_string(),
            right_name: "Cementite".to_string(),
            left: total_ferrite,
            right: cementite,
        },
        eutectoid_ferrite: total_ferrite - pro_ferrite,
    }
}

/// Schematic boundaries used by the cooling-path figures.
fn schematic_boundaries(eutectoid: f64, c_range: (f64, f64)) -> (Vec<(f64, f64)>, Vec<(f64, f64)>) {
    let cs = linspace(c_range.0, c_range.1, 100);
    let top = T_EUTECTOID_K + 200.0;
    let alpha_gamma = cs.iter().map(|&c| (c, top - 180.0 * (c - C_FERRITE_WT).powi(2))).collect();
    let gamma_cem = cs.iter().map(|&c| (c, top - 150.0 * (c - eutectoid).powi(2))).collect();
    (alpha_gamma, gamma_cem)
}

fn hypoeutectoid_figure(steel: &HypoeutectoidSteel, eutectoid_wt: f64) -> Figure {
    let c = steel.carbon_wt;
    let te = steel.eutectoid_k;
    let (alpha_gamma, gamma_cem) = schematic_boundaries(eutectoid_wt, (0.0, 1.5));
    let stops = [
        (1075.0, TAB_GREEN, "d: Start 1075 K, γ-austenite".to_string(), LIGHT_GREEN),
        (te + 5.0, RGBColor(230, 200, 0), format!("e: T={te}+ K, α + γ"), LIGHT_YELLOW),
        (te - 5.0, TAB_RED, format!("f: T={te}- K, α + Fe₃C"), LIGHT_CORAL),
        (950.0, TAB_PURPLE, "Final 950 K, α + Fe₃C".to_string(), PLUM),
    ];

    let mut chart = ChartPanel::new(
        format!("A7: Hypoeutectoid Steel ({c} wt% C) - Cooling Path"),
        "Weight % Carbon",
        "Temperature (K)",
        (0.0, 1.5),
        (900.0, 1200.0),
    )
    .series(Series::line(alpha_gamma, TAB_BLUE).labelled("α + γ boundary"))
    .series(Series::line(gamma_cem, TAB_RED).labelled("γ + Fe₃C boundary"))
    .series(
        Series::hline(te, 0.0, 1.5, TAB_GREEN)
            .dashed()
            .labelled(format!("Eutectoid T = {te} K")),
    )
    .series(Series::line(stops.iter().map(|s| (c, s.0)).collect(), BLACK).width(4))
    .annotate(Annotation::new((0.3, 1050.0), "α + γ").boxed(LIGHT_BLUE))
    .annotate(Annotation::new((1.0, 1050.0), "γ + Fe₃C").boxed(LIGHT_CORAL))
    .annotate(Annotation::new((eutectoid_wt, 1150.0), "γ-austenite").boxed(LIGHT_GREEN))
    .annotate(
        Annotation::new((c, 920.0), "α + Fe₃C (Pearlite + Proeutectoid α)").boxed(LIGHT_YELLOW),
    );
    for (t, color, text, bg) in &stops {
        chart = chart
            .marker(Marker::new((c, *t), *color))
            .annotate(Annotation::new((c + 0.3, *t), text.clone()).boxed(*bg).size(12));
    }

    let pct = |f: f64| format!("{:.1}%", f * 100.0);
    let explanation = TextPanel::new(
        Some("Microstructure Evolution"),
        vec![
            "Point d (1075 K): single phase γ-austenite (FCC),".to_string(),
            "  all carbon dissolved, homogeneous.".to_string(),
            format!("Point e (T = {te}+ K): α-ferrite + γ-austenite"),
            format!("  Proeutectoid α {}, γ {}", pct(steel.above.left), pct(steel.above.right)),
            format!("Point f (T = {te}- K): α-ferrite + cementite"),
            format!("  Total α {}, cementite {}", pct(steel.below.left), pct(steel.below.right)),
            "  γ transformed to pearlite (α + Fe₃C)".to_string(),
            "Proeutectoid α forms ABOVE T_eutectoid:".to_string(),
            "  large blocky grains at grain boundaries".to_string(),
            "Eutectoid α forms FROM γ at T_eutectoid:".to_string(),
            "  fine lamellae inside pearlite".to_string(),
        ],
    );
    let above = PiePanel {
        title: "Above Eutectoid (Point e)".to_string(),
        slices: vec![
            ("Proeutectoid α".to_string(), steel.above.left, LIGHT_BLUE),
            ("γ-austenite".to_string(), steel.above.right, LIGHT_GREEN),
        ],
    };
    let below = TextPanel::new(
        Some("Below Eutectoid (Point f)"),
        vec![
            format!("Total α-ferrite: {}", pct(steel.below.left)),
            format!("  • Proeutectoid: {}", pct(steel.proeutectoid_ferrite())),
            format!("  • Eutectoid: {}", pct(steel.eutectoid_ferrite)),
            format!("Cementite: {}", pct(steel.below.right)),
        ],
    );

    Figure::new(
        "",
        (1800, 1000),
        Layout::Column(vec![
            (6, chart.into()),
            (5, Layout::Row(vec![(3, explanation.into()), (2, above.into()), (2, below.into())])),
        ]),
    )
}

pub fn run_hypoeutectoid_steel(
    ctx: &AnalysisContext,
    points: &CriticalPoints,
) -> Result<HypoeutectoidSteel, AppError> {
    print_section_header("A7: Hypoeutectoid Steel Analysis");
    let steel = hypoeutectoid_steel(HYPOEUTECTOID_C_WT, &points.eutectoid);
    print!("{}", report::format_hypoeutectoid_steel(&steel, &points.eutectoid));
    ctx.save(
        &hypoeutectoid_figure(&steel, points.eutectoid.composition_wt),
        "A7_hypoeutectoid_steel",
    )?;
    Ok(steel)
}

/// Measured weight fraction of eutectoid cementite in the A8 steel.
pub const GIVEN_EUTECTOID_CEMENTITE: f64 = 0.103;

/// A8: hypereutectoid steel reconstructed from its eutectoid cementite.
#[derive(Debug, Clone, PartialEq)]
pub struct HypereutectoidSteel {
    pub eutectoid_cementite: f64,
    pub eutectoid_wt: f64,
    pub cementite_in_pearlite: f64,
    pub pearlite: f64,
    pub proeutectoid_cementite: f64,
    pub carbon_wt: f64,
    /// α-ferrite + cementite at room temperature.
    pub room: PhaseSplit,
}

pub fn hypereutectoid_steel(
    eutectoid_cementite: f64,
    eutectoid: &CriticalPoint,
) -> Result<HypereutectoidSteel, AppError> {
    let c_eut = eutectoid.composition_wt;
    let (_, cementite_in_pearlite) = lever_rule(c_eut, C_FERRITE_WT, C_CEMENTITE_WT);
    if !(eutectoid_cementite > 0.0 && eutectoid_cementite <= cementite_in_pearlite) {
        return Err(AppError::new(
            3,
            format!(
                "Eutectoid cementite fraction {eutectoid_cementite} must lie in \
                 (0, {cementite_in_pearlite:.4}]."
            ),
        ));
    }

    let pearlite = eutectoid_cementite / cementite_in_pearlite;
    let proeutectoid_cementite = 1.0 - pearlite;
    let carbon_wt = overall_from_fraction(proeutectoid_cementite, c_eut, C_CEMENTITE_WT);
    let (ferrite_rt, cementite_rt) = lever_rule(carbon_wt, C_FERRITE_WT, C_CEMENTITE_WT);

    Ok(HypereutectoidSteel {
        eutectoid_cementite,
        eutectoid_wt: c_eut,
        cementite_in_pearlite,
        pearlite,
        proeutectoid_cementite,
        carbon_wt,
        room: PhaseSplit {
            left_name: "α-ferrite".to_string(),
            right_name: "Cementite".to_string(),
            left: ferrite_rt,
            right: cementite_rt,
        },
    })
}

fn hypereutectoid_figure(steel: &HypereutectoidSteel) -> Figure {
    let c = steel.carbon_wt;
    let (alpha_gamma, gamma_cem) = schematic_boundaries(steel.eutectoid_wt, (0.5, 2.5));
    let stops = [
        (1500.0, TAB_GREEN, format!("Start {c:.2} wt% C"), LIGHT_GREEN),
        (
            T_EUTECTOID_K + 5.0,
            RGBColor(230, 200, 0),
            "Above eutectoid: γ + Fe₃C".to_string(),
            LIGHT_YELLOW,
        ),
        (T_EUTECTOID_K - 5.0, TAB_RED, "Below eutectoid: α + Fe₃C".to_string(), LIGHT_CORAL),
        (T_ROOM_K, TAB_BLUE, format!("Room temp {T_ROOM_K} K"), LIGHT_BLUE),
    ];
    // Offsets keep the two eutectoid labels apart.
    let label_t = [1500.0, T_EUTECTOID_K + 50.0, 950.0, 550.0];

    let mut chart = ChartPanel::new(
        format!("A8: Hypereutectoid Steel ({c:.3} wt% C) - Cooling Path"),
        "Weight % Carbon",
        "Temperature (K)",
        (0.5, 2.5),
        (200.0, 1600.0),
    )
    .series(Series::line(alpha_gamma, TAB_BLUE).labelled("α + γ boundary"))
    .series(Series::line(gamma_cem, TAB_RED).labelled("γ + Fe₃C boundary"))
    .series(Series::hline(T_EUTECTOID_K, 0.5, 2.5, TAB_GREEN).dashed().labelled("Eutectoid T"))
    .series(Series::hline(T_ROOM_K, 0.5, 2.5, TAB_BLUE).dashed().labelled("Room T (298 K)"))
    .series(Series::line(stops.iter().map(|s| (c, s.0)).collect(), BLACK).width(4));
    for ((t, color, text, bg), lt) in stops.iter().zip(label_t) {
        chart = chart
            .marker(Marker::new((c, *t), *color))
            .annotate(Annotation::new((c + 0.45, lt), text.clone()).boxed(*bg).size(12));
    }

    let calculation = TextPanel::new(
        Some("Carbon Content Calculation"),
        vec![
            format!("Given eutectoid cementite = {}", steel.eutectoid_cementite),
            format!("Cementite in pearlite: {:.4}", steel.cementite_in_pearlite),
            format!(
                "W_pearlite = {}/{:.4} = {:.4}",
                steel.eutectoid_cementite, steel.cementite_in_pearlite, steel.pearlite
            ),
            format!("W_pro_cem = 1 - {:.4} = {:.4}", steel.pearlite, steel.proeutectoid_cementite),
            "Overall carbon (lever rule):".to_string(),
            format!(
                "C = {:.4}×({}-{}) + {}",
                steel.proeutectoid_cementite, C_CEMENTITE_WT, steel.eutectoid_wt, steel.eutectoid_wt
            ),
            format!("C = {:.4} wt%", steel.carbon_wt),
        ],
    );
    let pie = PiePanel {
        title: "Microstructure Fractions".to_string(),
        slices: vec![
            ("Pearlite".to_string(), steel.pearlite, LIGHT_YELLOW),
            ("Proeutectoid Fe₃C".to_string(), steel.proeutectoid_cementite, PINK),
        ],
    };
    let room = TextPanel::new(
        Some("Room Temperature Analysis"),
        vec![
            format!("α-ferrite: {:.2}%", steel.room.left * 100.0),
            format!("Cementite: {:.2}%", steel.room.right * 100.0),
            "Measured α > predicted α:".to_string(),
            "  Fe₃C is metastable; graphite is favored.".to_string(),
            "  Slow Fe₃C → 3Fe + C(graphite) releases Fe,".to_string(),
            "  raising the α-ferrite content.".to_string(),
            "  Sign: POSITIVE error.".to_string(),
            "Pearlite fraction does not change".to_string(),
            "on further cooling.".to_string(),
        ],
    );

    Figure::new(
        "",
        (1800, 1000),
        Layout::Column(vec![
            (6, chart.into()),
            (5, Layout::Row(vec![(1, calculation.into()), (1, pie.into()), (1, room.into())])),
        ]),
    )
}

pub fn run_hypereutectoid_steel(
    ctx: &AnalysisContext,
    points: &CriticalPoints,
) -> Result<HypereutectoidSteel, AppError> {
    print_section_header("A8: Hypereutectoid Steel Analysis");
    let steel = hypereutectoid_steel(GIVEN_EUTECTOID_CEMENTITE, &points.eutectoid)?;
    print!("{}", report::format_hypereutectoid_steel(&steel));
    ctx.save(&hypereutectoid_figure(&steel), "A8_hypereutectoid_steel")?;
    write_text(
        &ctx.output_path("A8_hypereutectoid_summary.txt"),
        &report::hypereutectoid_summary(&steel, Utc::now()),
    )?;
    Ok(steel)
}

/// Carbon contents of the A9 steel series (wt%).
pub const STEEL_SERIES_C: [f64; 6] = [0.0, 0.2, 0.4, 0.6, 0.8, 1.0];

/// Room-temperature constituents of one plain carbon steel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SteelRow {
    #[serde(rename = "C_wt%")]
    pub carbon_wt: f64,
    #[serde(rename = "Cementite")]
    pub cementite_pct: f64,
    #[serde(rename = "Pearlite")]
    pub pearlite_pct: f64,
}

/// Cementite and pearlite percentages; fractions are clamped to `[0, 1]` so
/// carbon below ferrite solubility reads as zero rather than negative.
pub fn steel_series(carbon: &[f64], eutectoid: &CriticalPoint) -> Vec<SteelRow> {
    let c_eut = eutectoid.composition_wt;
    carbon
        .iter()
        .map(|&c| {
            let (_, cementite) = lever_rule(c, C_FERRITE_WT, C_CEMENTITE_WT);
            let pearlite = if c < c_eut {
                lever_rule(c, C_FERRITE_WT, c_eut).1
            } else if c > c_eut {
                lever_rule(c, c_eut, C_CEMENTITE_WT).0
            } else {
                1.0
            };
            SteelRow {
                carbon_wt: c,
                cementite_pct: cementite.clamp(0.0, 1.0) * 100.0,
                pearlite_pct: pearlite.clamp(0.0, 1.0) * 100.0,
            }
        })
        .collect()
}

fn steel_series_figure(rows: &[SteelRow]) -> Figure {
    let panel = |title: &str, y_label: &str, y_max: f64, pts: Vec<(f64, f64)>, color| {
        ChartPanel::new(title, "Carbon Content (wt%)", y_label, (-0.05, 1.05), (0.0, y_max))
            .series(Series::line(pts, color).with_markers())
            .without_legend()
    };
    let cementite = rows.iter().map(|r| (r.carbon_wt, r.cementite_pct)).collect();
    let pearlite = rows.iter().map(|r| (r.carbon_wt, r.pearlite_pct)).collect();

    Figure::new(
        "A9: Steel Microstructure vs Carbon",
        (1400, 600),
        Layout::Row(vec![
            (
                1,
                panel(
                    "Cementite vs Carbon Content",
                    "Cementite Content (%)",
                    16.0,
                    cementite,
                    TAB_BLUE,
                )
                .into(),
            ),
            (
                1,
                panel(
                    "Pearlite vs Carbon Content",
                    "Pearlite Content (%)",
                    105.0,
                    pearlite,
                    TAB_RED,
                )
                .into(),
            ),
        ]),
    )
}

pub fn run_steel_series(
    ctx: &AnalysisContext,
    points: &CriticalPoints,
) -> Result<Vec<SteelRow>, AppError> {
    print_section_header("A9: Carbon Steel Series Analysis");
    let rows = steel_series(&STEEL_SERIES_C, &points.eutectoid);
    print!("{}", report::format_steel_series(&rows));
    write_csv(&ctx.output_path("A9_steel_properties.csv"), &rows)?;
    ctx.save(&steel_series_figure(&rows), "A9_steel_microstructure_vs_carbon")?;
    Ok(rows)
}

/// Everything Part A computes, for callers that want the numbers.
#[derive(Debug, Clone)]
pub struct PartAResults {
    pub with_graphite: PhaseDiagram,
    pub without_graphite: PhaseDiagram,
    pub critical: CriticalPoints,
    pub fits: BoundaryFits,
    pub eutectoid: EutectoidSteel,
    pub hypoeutectoid: HypoeutectoidSteel,
    pub hypereutectoid: HypereutectoidSteel,
    pub series: Vec<SteelRow>,
}

pub fn run(ctx: &AnalysisContext) -> Result<PartAResults, AppError> {
    print_section_header("PART A: CARBON STEEL DESIGN - Fe-C BINARY SYSTEM");
    let db = ctx.load_database("Loading Thermodynamic Database", FE_C_FILE, FE_C_TDB)?;

    let with_graphite = run_phase_diagram(ctx, &db, &A1_DIAGRAM)?;
    let without_graphite = run_phase_diagram(ctx, &db, &A2_DIAGRAM)?;
    let critical = run_critical_points(ctx)?;
    let fits = run_boundary_fits(ctx)?;
    let eutectoid = run_eutectoid_steel(ctx, &critical)?;
    let hypoeutectoid = run_hypoeutectoid_steel(ctx, &critical)?;
    let hypereutectoid = run_hypereutectoid_steel(ctx, &critical)?;
    let series = run_steel_series(ctx, &critical)?;

    print_section_header("PART A COMPLETE");
    println!(
        "All calculations completed and outputs saved to {}",
        ctx.config.output_dir.display()
    );

    Ok(PartAResults {
        with_graphite,
        without_graphite,
        critical,
        fits,
        eutectoid,
        hypoeutectoid,
        hypereutectoid,
        series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eutectoid() -> CriticalPoint {
        CriticalPoints::literature().eutectoid
    }

    #[test]
    fn critical_points_carry_celsius_and_reactions() {
        let p = CriticalPoints::literature();
        assert!((p.eutectic.temperature_c - 1146.85).abs() < 1e-9);
        assert!((p.eutectoid.temperature_c - 726.85).abs() < 1e-9);
        assert_eq!(p.eutectoid.reaction, "γ → α + Fe₃C");
    }

    #[test]
    fn solidus_limits_switch_at_the_eutectic() {
        let eutectic = CriticalPoints::literature().eutectic;
        let limits = solidus_limits(&eutectic, &SOLIDUS_CHECK_TEMPERATURES);
        assert_eq!(limits.len(), 3);
        assert!(limits[0].above_eutectic && limits[1].above_eutectic);
        assert_eq!(limits[0].max_carbon, "< 4.3 wt%");
        assert!(!limits[2].above_eutectic);
        assert_eq!(limits[2].max_carbon, "0-5 wt% (all solid)");
    }

    #[test]
    fn boundary_fits_match_least_squares_solution() {
        let fits = fit_austenite_boundaries().unwrap();
        assert!((fits.low.a - 37.7495).abs() < 1e-3, "{:?}", fits.low);
        assert!((fits.low.b + 225.1836).abs() < 1e-3);
        assert!((fits.low.c - 1003.5836).abs() < 1e-3);
        assert!((fits.high.a + 51.3393).abs() < 1e-3, "{:?}", fits.high);
        assert!((fits.high.b - 37.0536).abs() < 1e-3);
        assert!((fits.high.c - 998.75).abs() < 1e-3);
        assert!(fits.low.rmse < 1.0 && fits.high.rmse < 1.0);
    }

    #[test]
    fn eutectoid_steel_is_mostly_ferrite() {
        let steel = eutectoid_steel(&eutectoid());
        assert!((steel.split.left - 0.889055).abs() < 1e-6);
        assert!((steel.split.right - 0.110945).abs() < 1e-6);
        assert!((steel.split.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn hypoeutectoid_ferrite_splits_into_proeutectoid_and_eutectoid() {
        let steel = hypoeutectoid_steel(HYPOEUTECTOID_C_WT, &eutectoid());
        assert!((steel.proeutectoid_ferrite() - 0.324324).abs() < 1e-6);
        assert!((steel.above.right - 0.675676).abs() < 1e-6);
        assert!((steel.below.left - 0.925037).abs() < 1e-6);
        assert!((steel.below.right - 0.074963).abs() < 1e-6);
        assert!((steel.eutectoid_ferrite - 0.600713).abs() < 1e-6);
    }

    #[test]
    fn hypereutectoid_carbon_from_eutectoid_cementite() {
        let steel = hypereutectoid_steel(GIVEN_EUTECTOID_CEMENTITE, &eutectoid()).unwrap();
        assert!((steel.pearlite - 0.928392).abs() < 1e-6);
        assert!((steel.proeutectoid_cementite - 0.071608).abs() < 1e-6);
        assert!((steel.carbon_wt - 1.184636).abs() < 1e-6);
        assert!((steel.room.left - 0.825392).abs() < 1e-6);

        assert_eq!(hypereutectoid_steel(0.2, &eutectoid()).unwrap_err().exit_code(), 3);
        assert!(hypereutectoid_steel(0.0, &eutectoid()).is_err());
    }

    #[test]
    fn steel_series_percentages() {
        let rows = steel_series(&STEEL_SERIES_C, &eutectoid());
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].cementite_pct, 0.0);
        assert_eq!(rows[0].pearlite_pct, 0.0);
        assert!((rows[1].cementite_pct - 2.698651).abs() < 1e-5);
        assert!((rows[1].pearlite_pct - 24.324324).abs() < 1e-5);
        assert!((rows[4].pearlite_pct - 99.325464).abs() < 1e-5);
        assert!((rows[5].cementite_pct - 14.692654).abs() < 1e-5);
        assert!((rows[5].pearlite_pct - 95.952782).abs() < 1e-5);

        let exact = steel_series(&[C_EUTECTOID_WT], &eutectoid());
        assert_eq!(exact[0].pearlite_pct, 100.0);
    }

    #[test]
    fn coarse_phase_map_finds_pure_iron_phases() {
        let db = Database::parse(FE_C_TDB).unwrap();
        let config = RunConfig {
            grid_t: 3,
            grid_c: 3,
            sample_steps: 20,
            ..RunConfig::default()
        };
        let diagram = compute_phase_diagram(&db, A2_DIAGRAM.phases, &config).unwrap();

        assert_eq!(diagram.map.temperatures, vec![500.0, 1250.0, 2000.0]);
        assert_eq!(diagram.carbon_wt, vec![0.0, 3.5, 7.0]);
        assert_eq!(diagram.carbon_x[0], 0.0);
        assert_eq!(diagram.label_at(2000.0, 0.0), Some("LIQUID"));
        assert_eq!(diagram.label_at(1250.0, 0.0), Some("FCC_A1"));
        assert_eq!(diagram.cells().len(), 9);
        assert_eq!(
            diagram.region_counts().iter().map(|(_, n)| n).sum::<usize>(),
            9
        );
        assert!(!diagram.phases.contains(&"GRAPHITE".to_string()));
    }

    #[test]
    fn phase_diagram_figure_has_one_region_per_cell() {
        let diagram = PhaseDiagram {
            phases: vec!["FCC_A1".into()],
            carbon_wt: vec![0.0, 1.0],
            carbon_x: vec![0.0, 0.04],
            map: PhaseMap {
                temperatures: vec![1000.0, 1100.0],
                labels: vec![
                    vec!["FCC_A1".into(), ERROR_LABEL.into()],
                    vec!["FCC_A1".into(), "FCC_A1+CEMENTITE".into()],
                ],
            },
        };
        let figure = phase_diagram_figure(&A2_DIAGRAM, &diagram);
        let Layout::Panel(panel) = &figure.layout else {
            panic!("expected a single panel");
        };
        let crate::plot::Panel::Chart(chart) = panel.as_ref() else {
            panic!("expected a chart");
        };
        assert_eq!(chart.regions.len(), 4);
        assert_eq!(chart.regions[1].color, ERROR_FILL);
        assert_eq!(chart.regions[0].x, (0.0, 0.5));
        assert_eq!(chart.annotations.len(), A2_DIAGRAM.labels.len());
        assert_eq!(cell_bounds(&[0.0, 1.0, 3.0], 1), (0.5, 2.0));
    }
}
