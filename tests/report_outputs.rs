use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use fe_phase::analysis::{AnalysisContext, part_a, part_b};
use fe_phase::domain::RunConfig;
use fe_phase::io::read_fit_json;
use fe_phase::thermo::{ERROR_LABEL, NONE_LABEL};

fn quick_config(root: &Path) -> RunConfig {
    RunConfig {
        output_dir: root.join("outputs"),
        db_dir: root.to_path_buf(),
        grid_t: 4,
        grid_c: 5,
        sample_steps: 10,
        figures: false,
        ..RunConfig::default()
    }
}

fn csv_rows(path: &Path) -> Vec<csv::StringRecord> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader.records().map(|r| r.unwrap()).collect()
}

fn csv_headers(path: &Path) -> Vec<String> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader.headers().unwrap().iter().map(str::to_string).collect()
}

#[test]
fn part_a_writes_every_table() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = AnalysisContext::new(quick_config(dir.path())).unwrap();
    let results = part_a::run(&ctx).unwrap();
    let out = dir.path().join("outputs");

    assert!(dir.path().join("fe_c.tdb").is_file());

    let cells = out.join("A1_phase_diagram_with_graphite_cells.csv");
    assert_eq!(csv_headers(&cells), ["T_K", "C_wt%", "X_C", "phases"]);
    assert_eq!(csv_rows(&cells).len(), 20);
    assert!(out.join("A2_phase_diagram_without_graphite_cells.csv").is_file());
    assert!(!results.without_graphite.phases.iter().any(|p| p == "GRAPHITE"));

    let points = out.join("A3_A4_critical_points.csv");
    assert_eq!(
        csv_headers(&points),
        ["Critical_Point", "Temperature_K", "Temperature_C", "Composition_wt%C", "Reaction"]
    );
    let rows = csv_rows(&points);
    assert_eq!(&rows[0][0], "Eutectic");
    assert_eq!(&rows[1][4], "γ → α + Fe₃C");

    let fits = read_fit_json(&out.join("A5_austenite_boundary_fits.json")).unwrap();
    assert_eq!(fits.fits.len(), 2);
    assert!((fits.fits[0].fit.a - results.fits.low.a).abs() < 1e-12);

    let summary = std::fs::read_to_string(out.join("A8_hypereutectoid_summary.txt")).unwrap();
    assert!(summary.contains("Overall carbon: 1.1846 wt% C"));

    let series = csv_rows(&out.join("A9_steel_properties.csv"));
    assert_eq!(series.len(), 6);
    assert_eq!(&series[0][1], "0.0");

    // Figures are off: nothing but tables and text.
    assert!(std::fs::read_dir(&out).unwrap().all(|e| {
        let path = e.unwrap().path();
        !matches!(path.extension().and_then(|s| s.to_str()), Some("png" | "svg"))
    }));
}

#[test]
fn part_b_scan_covers_the_grid() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = AnalysisContext::new(quick_config(dir.path())).unwrap();
    let results = part_b::run(&ctx).unwrap();
    let out = dir.path().join("outputs");

    let limits = csv_rows(&out.join("B1_phase_diagram_data.csv"));
    assert_eq!(limits.len(), 11);
    assert_eq!(
        csv_headers(&out.join("B1_phase_diagram_data.csv")),
        ["T_K", "Max_C_before_cementite"]
    );

    let scan = csv_rows(&out.join("B1_equilibrium_scan.csv"));
    assert_eq!(scan.len(), 121);
    assert!(scan.iter().all(|r| !r[2].is_empty()));
    assert_eq!(results.fixed_chromium.scan.len(), 121);

    let ternary = out.join("B2_ternary_compositions.csv");
    assert_eq!(
        csv_headers(&ternary),
        ["Composition", "Phases", "Phase_Count", "Description", "Engine_Phases"]
    );
    let rows = csv_rows(&ternary);
    assert_eq!(rows.len(), 4);
    assert_eq!(&rows[2][0], "Fe-20.0Cr-0.20C");
    let known = |label: &str| {
        label == ERROR_LABEL
            || label == NONE_LABEL
            || label.split('+').all(|p| part_b::FE_CR_C_PHASES.contains(&p))
    };
    for row in &results.ternary {
        assert!(known(&row.engine_phases), "unexpected label {}", row.engine_phases);
    }
    assert!(scan.iter().all(|r| known(&r[2])));
}

fn fephase(args: &[&str], stdin: &str) -> std::process::Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_fephase"))
        .args(args)
        .env_remove("FEPHASE_OUTPUT_DIR")
        .env_remove("FEPHASE_DB_DIR")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(stdin.as_bytes()).unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn invalid_menu_choice_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("out");
    let output = fephase(&["--no-figures", "--output-dir", out_dir.to_str().unwrap()], "9\n");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("3. Run Both Parts"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid choice. Please run again."));
}

#[test]
fn exit_choice_is_clean() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("out");
    let output = fephase(
        &["menu", "--no-figures", "--output-dir", out_dir.to_str().unwrap()],
        "4\n",
    );

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Exiting..."));
}

#[test]
fn check_runs_without_a_font() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("out");
    let output = fephase(&["check", "--output-dir", out_dir.to_str().unwrap()], "");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Equilibrium engine"));
    assert!(out_dir.is_dir());
}
