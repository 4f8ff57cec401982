//! Global Gibbs-energy minimization over sampled phase configurations.
//!
//! Every phase is discretized into points `(x, G)` and the equilibrium is the
//! lower convex hull of those points at the target composition, found with a
//! revised simplex on
//!
//! ```text
//! minimize  Σ λ_i G_i   subject to  Σ λ_i x_i = X,  λ ≥ 0
//! ```

use std::collections::BTreeMap;

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::domain::PRESSURE_PA;
use crate::error::AppError;
use crate::thermo::energy::{PhaseEnergy, PhaseModel, neighbours};
use crate::thermo::tdb::{Database, VACANCY};

/// Label recorded for a table cell whose equilibrium could not be computed.
pub const ERROR_LABEL: &str = "ERROR";
/// Label for a converged result without any phase above the reporting threshold.
pub const NONE_LABEL: &str = "NONE";

/// Phases with a smaller atom fraction are not reported.
pub const MIN_PHASE_FRACTION: f64 = 1e-6;
/// Basis points of one phase closer than this (max per-component difference) merge.
const MERGE_DISTANCE: f64 = 0.02;
const MAX_ITERATIONS: usize = 5_000;
const REDUCED_COST_TOL: f64 = 1e-7;
const PIVOT_TOL: f64 = 1e-12;
const DEFAULT_SAMPLE_STEPS: usize = 60;
/// Halvings of the off-grid move per refinement pass.
const REFINE_ROUNDS: usize = 10;
const REFINE_PASSES: usize = 3;
/// A sampled point this far (J/mol) below a refined hull means a missed region.
const HULL_CHECK_TOL: f64 = 1e-3;

/// State variables of a single-point calculation.
#[derive(Debug, Clone)]
pub struct Conditions {
    pub temperature: f64,
    pub pressure: f64,
    /// Mole fractions of every component except the dependent one.
    pub mole_fractions: BTreeMap<String, f64>,
}

impl Conditions {
    pub fn new(temperature: f64) -> Self {
        Conditions {
            temperature,
            pressure: PRESSURE_PA,
            mole_fractions: BTreeMap::new(),
        }
    }

    pub fn with_x(mut self, component: &str, x: f64) -> Self {
        self.mole_fractions.insert(component.to_ascii_uppercase(), x);
        self
    }

    /// Full mole-fraction vector in `components` order, with the unspecified
    /// component taking the balance.
    pub fn target(&self, components: &[String]) -> Result<Vec<f64>, AppError> {
        if !(self.pressure.is_finite() && self.pressure > 0.0) {
            return Err(AppError::new(3, format!("Invalid pressure {} Pa.", self.pressure)));
        }
        if let Some(unknown) = self.mole_fractions.keys().find(|k| !components.contains(*k)) {
            return Err(AppError::new(
                3,
                format!("Composition condition on {unknown}, which is not a component."),
            ));
        }
        if self.mole_fractions.len() + 1 != components.len() {
            return Err(AppError::new(
                3,
                format!(
                    "Need mole fractions for {} of the {} components, got {}.",
                    components.len() - 1,
                    components.len(),
                    self.mole_fractions.len()
                ),
            ));
        }

        let mut target = Vec::with_capacity(components.len());
        let mut dependent = None;
        for (i, c) in components.iter().enumerate() {
            match self.mole_fractions.get(c) {
                Some(&x) => target.push(x),
                None => {
                    dependent = Some(i);
                    target.push(0.0);
                }
            }
        }
        if let Some(i) = dependent {
            target[i] = 1.0 - target.iter().sum::<f64>();
            // Round-off from wt% conversion.
            if target[i] < 0.0 && target[i] > -1e-12 {
                target[i] = 0.0;
            }
        }

        validate_target(&target, components.len())?;
        Ok(target)
    }
}

fn validate_target(target: &[f64], n: usize) -> Result<(), AppError> {
    if target.len() != n {
        return Err(AppError::new(
            3,
            format!("Composition has {} entries for {n} components.", target.len()),
        ));
    }
    if target.iter().any(|x| !x.is_finite() || *x < 0.0 || *x > 1.0) {
        return Err(AppError::new(3, format!("Mole fractions out of range: {target:?}.")));
    }
    if (target.iter().sum::<f64>() - 1.0).abs() > 1e-9 {
        return Err(AppError::new(3, format!("Mole fractions do not sum to 1: {target:?}.")));
    }
    Ok(())
}

/// One phase in an equilibrium result.
#[derive(Debug, Clone)]
pub struct PhaseAmount {
    pub name: String,
    /// Fraction of all atoms in this phase.
    pub fraction: f64,
    /// Atom fractions per component, in calculator component order.
    pub composition: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct EquilibriumResult {
    pub temperature: f64,
    pub components: Vec<String>,
    /// Stable phases, ordered as in the calculator's phase list.
    pub phases: Vec<PhaseAmount>,
    /// Molar Gibbs energy of the system (J/mol of atoms).
    pub gibbs_energy: f64,
    /// Chemical potential of each component (J/mol).
    pub chemical_potentials: Vec<f64>,
}

impl EquilibriumResult {
    /// Distinct stable phase names joined by `+`, or `NONE`.
    pub fn label(&self) -> String {
        let names = self.phase_names();
        if names.is_empty() {
            NONE_LABEL.to_string()
        } else {
            names.join("+")
        }
    }

    pub fn phase_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for p in &self.phases {
            if !names.contains(&p.name.as_str()) {
                names.push(&p.name);
            }
        }
        names
    }

    /// Total atom fraction of `phase` (all composition sets).
    pub fn fraction_of(&self, phase: &str) -> f64 {
        self.phases
            .iter()
            .filter(|p| p.name == phase)
            .map(|p| p.fraction)
            .sum()
    }
}

/// A sampled configuration: phase index, site fractions, atom fractions and
/// molar Gibbs energy.
#[derive(Debug, Clone)]
pub struct SamplePoint {
    pub phase: usize,
    /// Site fractions per sublattice; empty for points not built from a model.
    pub y: Vec<Vec<f64>>,
    pub x: Vec<f64>,
    pub g: f64,
}

impl SamplePoint {
    /// A component absent from the target can only sit in points without it.
    fn fits(&self, target: &[f64]) -> bool {
        self.x.iter().zip(target).all(|(&xi, &ti)| ti > 0.0 || xi <= 0.0)
    }

    fn reduced_cost(&self, potentials: &[f64]) -> f64 {
        self.g - potentials.iter().zip(&self.x).map(|(mu, x)| mu * x).sum::<f64>()
    }
}

/// Lower-hull vertices with their atom fractions, and the chemical potentials.
#[derive(Debug, Clone)]
pub struct HullSolution {
    pub vertices: Vec<(SamplePoint, f64)>,
    pub potentials: Vec<f64>,
}

/// All sampled points of all phases at one temperature.
#[derive(Debug, Clone)]
pub struct SampleSet {
    temperature: f64,
    components: Vec<String>,
    phase_names: Vec<String>,
    points: Vec<SamplePoint>,
}

impl SampleSet {
    pub fn new(
        temperature: f64,
        components: Vec<String>,
        phase_names: Vec<String>,
        points: Vec<SamplePoint>,
    ) -> Self {
        SampleSet {
            temperature,
            components,
            phase_names,
            points,
        }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Minimize the total Gibbs energy at overall composition `target` over the
    /// sampled points only.
    pub fn solve(&self, target: &[f64]) -> Result<EquilibriumResult, AppError> {
        validate_target(target, self.components.len())?;
        let candidates = self.compatible(target)?;
        let hull = self.minimize(&candidates, target)?;
        Ok(self.result(hull))
    }

    fn compatible(&self, target: &[f64]) -> Result<Vec<&SamplePoint>, AppError> {
        let candidates: Vec<&SamplePoint> = self.points.iter().filter(|p| p.fits(target)).collect();
        if candidates.is_empty() {
            return Err(AppError::new(
                4,
                format!("No sampled configuration is compatible with {target:?}."),
            ));
        }
        Ok(candidates)
    }

    /// Revised simplex over `candidates`, seeded with artificial pure-component
    /// vertices that must all leave the basis.
    pub fn minimize(
        &self,
        candidates: &[&SamplePoint],
        target: &[f64],
    ) -> Result<HullSolution, AppError> {
        let m = self.components.len();

        let max_g = candidates
            .iter()
            .map(|p| p.g.abs())
            .fold(0.0_f64, f64::max);
        let artificial_g = 10.0 * max_g + 1e6;

        // Columns 0..m are artificial pure-component vertices.
        let column = |j: usize| -> (DVector<f64>, f64) {
            if j < m {
                let mut x = DVector::zeros(m);
                x[j] = 1.0;
                (x, artificial_g)
            } else {
                let p = candidates[j - m];
                (DVector::from_column_slice(&p.x), p.g)
            }
        };
        let n_columns = m + candidates.len();

        let mut basis: Vec<usize> = (0..m).collect();
        let mut lambda = DVector::from_column_slice(target);
        let mut degenerate = false;

        for iteration in 0..MAX_ITERATIONS {
            let mut b = DMatrix::<f64>::zeros(m, m);
            let mut cost = DVector::<f64>::zeros(m);
            for (k, &j) in basis.iter().enumerate() {
                let (x, g) = column(j);
                b.set_column(k, &x);
                cost[k] = g;
            }

            let potentials = b
                .transpose()
                .lu()
                .solve(&cost)
                .ok_or_else(|| AppError::new(4, "Singular basis in equilibrium solve."))?;

            // Dantzig pricing, or Bland's rule after a degenerate pivot.
            let mut entering: Option<(usize, f64)> = None;
            for j in m..n_columns {
                if basis.contains(&j) {
                    continue;
                }
                let reduced = candidates[j - m].reduced_cost(potentials.as_slice());
                if reduced < -REDUCED_COST_TOL {
                    match entering {
                        None => entering = Some((j, reduced)),
                        Some((_, best)) if !degenerate && reduced < best => {
                            entering = Some((j, reduced))
                        }
                        _ => {}
                    }
                    if degenerate {
                        break;
                    }
                }
            }

            let Some((enter, _)) = entering else {
                debug!(iteration, "simplex converged");
                return self.vertices(&basis, &lambda, candidates, potentials.as_slice(), m);
            };

            let (x_enter, _) = column(enter);
            let direction = b
                .lu()
                .solve(&x_enter)
                .ok_or_else(|| AppError::new(4, "Singular basis in equilibrium solve."))?;

            let mut leave: Option<(usize, f64)> = None;
            for k in 0..m {
                if direction[k] > PIVOT_TOL {
                    let ratio = lambda[k] / direction[k];
                    match leave {
                        Some((_, best)) if ratio >= best => {}
                        _ => leave = Some((k, ratio)),
                    }
                }
            }
            let Some((row, theta)) = leave else {
                return Err(AppError::new(4, "Unbounded equilibrium problem."));
            };

            for k in 0..m {
                lambda[k] -= theta * direction[k];
                if lambda[k] < 0.0 {
                    lambda[k] = 0.0;
                }
            }
            lambda[row] = theta;
            basis[row] = enter;
            degenerate = theta <= PIVOT_TOL;
        }

        Err(AppError::new(
            4,
            format!(
                "Equilibrium did not converge in {MAX_ITERATIONS} iterations at {} K.",
                self.temperature
            ),
        ))
    }

    fn vertices(
        &self,
        basis: &[usize],
        lambda: &DVector<f64>,
        candidates: &[&SamplePoint],
        potentials: &[f64],
        m: usize,
    ) -> Result<HullSolution, AppError> {
        if let Some((k, _)) = basis
            .iter()
            .enumerate()
            .find(|&(k, &j)| j < m && lambda[k] > 1e-9)
        {
            return Err(AppError::new(
                4,
                format!(
                    "No feasible phase assemblage at {} K ({} left unassigned).",
                    self.temperature, self.components[basis[k]]
                ),
            ));
        }

        let vertices = basis
            .iter()
            .enumerate()
            .filter(|&(k, &j)| j >= m && lambda[k] > 0.0)
            .map(|(k, &j)| (candidates[j - m].clone(), lambda[k]))
            .collect();
        Ok(HullSolution {
            vertices,
            potentials: potentials.to_vec(),
        })
    }

    /// True when no candidate lies below the hull plane given by `potentials`.
    fn priced_out(&self, candidates: &[&SamplePoint], potentials: &[f64]) -> bool {
        candidates
            .iter()
            .all(|p| p.reduced_cost(potentials) >= -HULL_CHECK_TOL)
    }

    /// Merge hull vertices into phases.
    pub fn result(&self, hull: HullSolution) -> EquilibriumResult {
        let mut merged: Vec<(usize, f64, Vec<f64>)> = Vec::new();
        let mut gibbs = 0.0;
        for (p, w) in &hull.vertices {
            gibbs += w * p.g;

            let close = merged.iter_mut().find(|(phase, _, x)| {
                *phase == p.phase
                    && x.iter().zip(&p.x).all(|(a, b)| (a - b).abs() <= MERGE_DISTANCE)
            });
            match close {
                Some((_, total, x)) => {
                    for (xi, pi) in x.iter_mut().zip(&p.x) {
                        *xi = (*xi * *total + pi * w) / (*total + w);
                    }
                    *total += w;
                }
                None => merged.push((p.phase, *w, p.x.clone())),
            }
        }

        merged.retain(|(_, f, _)| *f > MIN_PHASE_FRACTION);
        merged.sort_by(|a, b| a.0.cmp(&b.0).then(a.2[0].total_cmp(&b.2[0])));

        EquilibriumResult {
            temperature: self.temperature,
            components: self.components.clone(),
            phases: merged
                .into_iter()
                .map(|(phase, fraction, composition)| PhaseAmount {
                    name: self.phase_names[phase].clone(),
                    fraction,
                    composition,
                })
                .collect(),
            gibbs_energy: gibbs,
            chemical_potentials: hull.potentials,
        }
    }
}

/// Compiled phase models for one component set.
#[derive(Debug, Clone)]
pub struct EquilibriumCalculator<'a> {
    db: &'a Database,
    components: Vec<String>,
    models: Vec<PhaseModel>,
    sample_steps: usize,
}

impl<'a> EquilibriumCalculator<'a> {
    /// `comps` may include `VA`; it enables vacancies and is not a composition axis.
    pub fn new(db: &'a Database, comps: &[&str], phases: &[&str]) -> Result<Self, AppError> {
        let mut components = Vec::new();
        let mut vacancy = false;
        for c in comps {
            let c = c.trim().to_ascii_uppercase();
            if c == VACANCY {
                vacancy = true;
                continue;
            }
            if !db.element_names().contains(&c) {
                return Err(AppError::new(3, format!("Component {c} is not in the database.")));
            }
            if components.contains(&c) {
                return Err(AppError::new(3, format!("Component {c} listed twice.")));
            }
            components.push(c);
        }
        if components.len() < 2 {
            return Err(AppError::new(3, "Equilibrium needs at least two components."));
        }
        if phases.is_empty() {
            return Err(AppError::new(3, "Equilibrium needs at least one phase."));
        }

        let mut models = Vec::new();
        for name in phases {
            let phase = db
                .phase(name)
                .ok_or_else(|| AppError::new(3, format!("Phase {name} is not in the database.")))?;
            match PhaseModel::compile(phase, &components, vacancy) {
                Some(model) => models.push(model),
                None => debug!(phase = %phase.name, "phase cannot form in this system"),
            }
        }
        if models.is_empty() {
            return Err(AppError::new(
                3,
                format!("None of the phases {phases:?} can form from {components:?}."),
            ));
        }

        Ok(EquilibriumCalculator {
            db,
            components,
            models,
            sample_steps: DEFAULT_SAMPLE_STEPS,
        })
    }

    pub fn with_sample_steps(mut self, steps: usize) -> Self {
        self.sample_steps = steps.max(2);
        self
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn phase_names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name.as_str()).collect()
    }

    fn energies_at(&self, temperature: f64) -> Result<Vec<PhaseEnergy<'_>>, AppError> {
        if !(temperature.is_finite() && temperature > 0.0) {
            return Err(AppError::new(3, format!("Invalid temperature {temperature} K.")));
        }
        self.models
            .iter()
            .map(|model| model.at_temperature(temperature, &self.db.functions))
            .collect()
    }

    pub fn samples_at(&self, temperature: f64) -> Result<SampleSet, AppError> {
        let energies = self.energies_at(temperature)?;

        let n = self.components.len();
        let mut points = Vec::new();
        for (index, (model, energy)) in self.models.iter().zip(&energies).enumerate() {
            for y in model.configurations(self.sample_steps) {
                if let Some((x, g)) = energy.evaluate(&y, n) {
                    points.push(SamplePoint { phase: index, y, x, g });
                }
            }
        }

        Ok(SampleSet::new(
            temperature,
            self.components.clone(),
            self.models.iter().map(|m| m.name.clone()).collect(),
            points,
        ))
    }

    /// Equilibrium at `target` from a sampled hull, refined off the grid.
    ///
    /// Each round re-samples every hull vertex one move away in site fractions
    /// and re-solves over the vertices and their moves, halving the move each
    /// round. The refined hull is then checked against every sampled point; a
    /// point below it restarts refinement from a full solve that includes the
    /// refined vertices.
    pub fn solve_refined(
        &self,
        samples: &SampleSet,
        target: &[f64],
    ) -> Result<EquilibriumResult, AppError> {
        validate_target(target, self.components.len())?;
        let energies = self.energies_at(samples.temperature())?;
        let n = self.components.len();
        let candidates = samples.compatible(target)?;

        let mut hull = samples.minimize(&candidates, target)?;
        let mut found: Vec<SamplePoint> = Vec::new();
        for pass in 0..REFINE_PASSES {
            let mut step = 1.0 / self.sample_steps as f64;
            for _ in 0..REFINE_ROUNDS {
                let mut local: Vec<SamplePoint> =
                    hull.vertices.iter().map(|(p, _)| p.clone()).collect();
                for (p, _) in &hull.vertices {
                    if p.y.is_empty() {
                        continue;
                    }
                    for y in neighbours(&p.y, step) {
                        if let Some((x, g)) = energies[p.phase].evaluate(&y, n) {
                            let q = SamplePoint { phase: p.phase, y, x, g };
                            if q.fits(target) {
                                local.push(q);
                            }
                        }
                    }
                }
                let refs: Vec<&SamplePoint> = local.iter().collect();
                hull = samples.minimize(&refs, target)?;
                step *= 0.5;
            }

            if pass + 1 == REFINE_PASSES || samples.priced_out(&candidates, &hull.potentials) {
                break;
            }
            debug!(
                pass,
                temperature = samples.temperature(),
                "refined hull missed a sampled point"
            );
            found.extend(hull.vertices.iter().map(|(p, _)| p.clone()));
            let mut all = candidates.clone();
            all.extend(found.iter());
            hull = samples.minimize(&all, target)?;
        }

        Ok(samples.result(hull))
    }

    pub fn solve(&self, conditions: &Conditions) -> Result<EquilibriumResult, AppError> {
        let target = conditions.target(&self.components)?;
        let samples = self.samples_at(conditions.temperature)?;
        self.solve_refined(&samples, &target)
    }

    /// Phase labels on a temperature × composition grid.
    ///
    /// `points` are full mole-fraction vectors in component order. Rows are
    /// computed in parallel; a failed cell is labelled [`ERROR_LABEL`].
    pub fn phase_map(
        &self,
        temperatures: &[f64],
        points: &[Vec<f64>],
    ) -> Result<PhaseMap, AppError> {
        for p in points {
            validate_target(p, self.components.len())?;
        }

        let labels: Vec<Vec<String>> = temperatures
            .par_iter()
            .map(|&t| match self.samples_at(t) {
                Ok(samples) => points
                    .iter()
                    .map(|p| match self.solve_refined(&samples, p) {
                        Ok(result) => result.label(),
                        Err(e) => {
                            debug!(temperature = t, error = %e, "phase map cell failed");
                            ERROR_LABEL.to_string()
                        }
                    })
                    .collect(),
                Err(e) => {
                    warn!(temperature = t, error = %e, "phase map row failed");
                    vec![ERROR_LABEL.to_string(); points.len()]
                }
            })
            .collect();

        Ok(PhaseMap {
            temperatures: temperatures.to_vec(),
            labels,
        })
    }
}

/// Single-point equilibrium, building a calculator for the call.
pub fn equilibrium(
    db: &Database,
    comps: &[&str],
    phases: &[&str],
    conditions: &Conditions,
) -> Result<EquilibriumResult, AppError> {
    EquilibriumCalculator::new(db, comps, phases)?.solve(conditions)
}

/// Phase labels per temperature row and composition column.
#[derive(Debug, Clone)]
pub struct PhaseMap {
    pub temperatures: Vec<f64>,
    pub labels: Vec<Vec<String>>,
}

impl PhaseMap {
    /// Distinct labels in first-seen order.
    pub fn regions(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for label in self.labels.iter().flatten() {
            if !out.contains(&label.as_str()) {
                out.push(label);
            }
        }
        out
    }

    pub fn error_count(&self) -> usize {
        self.labels
            .iter()
            .flatten()
            .filter(|l| l.as_str() == ERROR_LABEL)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thermo::databases::{FE_C_TDB, FE_CR_C_TDB};

    fn synthetic(points: Vec<(usize, f64, f64)>) -> SampleSet {
        SampleSet::new(
            1000.0,
            vec!["A".into(), "B".into()],
            vec!["ALPHA".into(), "BETA".into()],
            points
                .into_iter()
                .map(|(phase, xb, g)| SamplePoint {
                    phase,
                    y: Vec::new(),
                    x: vec![1.0 - xb, xb],
                    g,
                })
                .collect(),
        )
    }

    #[test]
    fn two_phase_tie_line_follows_the_lever_rule() {
        let set = synthetic(vec![
            (0, 0.0, 0.0),
            (0, 0.1, -10.0),
            (0, 0.5, 5.0),
            (1, 0.9, -10.0),
            (1, 1.0, 0.0),
        ]);
        let r = set.solve(&[0.7, 0.3]).unwrap();

        assert_eq!(r.label(), "ALPHA+BETA");
        assert!((r.fraction_of("ALPHA") - 0.75).abs() < 1e-9);
        assert!((r.fraction_of("BETA") - 0.25).abs() < 1e-9);
        assert!((r.gibbs_energy + 10.0).abs() < 1e-9);
    }

    #[test]
    fn single_phase_when_a_point_sits_on_the_target() {
        let set = synthetic(vec![(0, 0.0, 0.0), (1, 0.5, -50.0), (1, 1.0, 0.0)]);
        let r = set.solve(&[0.5, 0.5]).unwrap();
        assert_eq!(r.label(), "BETA");
        assert!((r.phases[0].fraction - 1.0).abs() < 1e-9);
        assert!((r.phases[0].composition[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn nearby_points_of_one_phase_merge() {
        let set =
            synthetic(vec![(0, 0.0, 0.0), (0, 0.40, -100.0), (0, 0.41, -100.0), (0, 1.0, 0.0)]);
        let r = set.solve(&[0.595, 0.405]).unwrap();
        assert_eq!(r.phases.len(), 1);
        assert!((r.phases[0].composition[1] - 0.405).abs() < 1e-9);
    }

    #[test]
    fn uncovered_composition_is_an_error() {
        // Nothing reaches pure B, so x_B = 0.9 is infeasible.
        let set = synthetic(vec![(0, 0.0, 0.0), (0, 0.5, -10.0)]);
        assert_eq!(set.solve(&[0.1, 0.9]).unwrap_err().exit_code(), 4);
        assert_eq!(set.solve(&[0.5, 0.6]).unwrap_err().exit_code(), 3);
    }

    #[test]
    fn conditions_fill_in_the_dependent_component() {
        let comps = vec!["FE".to_string(), "C".to_string()];
        let t = Conditions::new(1000.0).with_x("c", 0.25).target(&comps).unwrap();
        assert_eq!(t, vec![0.75, 0.25]);

        assert!(Conditions::new(1000.0).target(&comps).is_err());
        assert!(Conditions::new(1000.0).with_x("CR", 0.1).target(&comps).is_err());
        assert!(Conditions::new(1000.0).with_x("C", 1.5).target(&comps).is_err());
    }

    #[test]
    fn calculator_validates_inputs() {
        let db = Database::parse(FE_C_TDB).unwrap();
        assert!(EquilibriumCalculator::new(&db, &["FE", "C", "VA"], &["LIQUID"]).is_ok());
        assert!(EquilibriumCalculator::new(&db, &["FE", "CR"], &["LIQUID"]).is_err());
        assert!(EquilibriumCalculator::new(&db, &["FE", "C"], &["M23C6"]).is_err());
        assert!(EquilibriumCalculator::new(&db, &["FE", "C"], &[]).is_err());
        assert!(EquilibriumCalculator::new(&db, &["FE"], &["LIQUID"]).is_err());

        let calc = EquilibriumCalculator::new(&db, &["FE", "C", "VA"], &["FCC_A1"]).unwrap();
        assert_eq!(calc.samples_at(-5.0).unwrap_err().exit_code(), 3);
    }

    #[test]
    fn pure_iron_is_fcc_in_the_solid_and_liquid_when_hot() {
        let db = Database::parse(FE_C_TDB).unwrap();
        let comps = ["FE", "C", "VA"];
        let phases = ["LIQUID", "BCC_A2", "FCC_A1", "CEMENTITE"];

        // Without the magnetic term, FCC iron is below BCC over the whole solid range.
        let pure_fe = |t: f64| Conditions::new(t).with_x("C", 0.0);
        let cold = equilibrium(&db, &comps, &phases, &pure_fe(1000.0)).unwrap();
        assert_eq!(cold.label(), "FCC_A1");

        let hot = equilibrium(&db, &comps, &phases, &pure_fe(2000.0)).unwrap();
        assert_eq!(hot.label(), "LIQUID");
    }

    #[test]
    fn results_conserve_mass() {
        let db = Database::parse(FE_C_TDB).unwrap();
        let calc = EquilibriumCalculator::new(&db, &["FE", "C", "VA"], &db.phase_names())
            .unwrap()
            .with_sample_steps(30);

        for x_c in [0.01, 0.05, 0.15, 0.3] {
            let r = calc.solve(&Conditions::new(1100.0).with_x("C", x_c)).unwrap();
            let total: f64 = r.phases.iter().map(|p| p.fraction).sum();
            let carbon: f64 = r.phases.iter().map(|p| p.fraction * p.composition[1]).sum();
            assert!((total - 1.0).abs() < 1e-6, "x_c={x_c}: total {total}");
            assert!((carbon - x_c).abs() < 1e-6, "x_c={x_c}: carbon {carbon}");
        }
    }

    #[test]
    fn refined_phase_boundaries_do_not_follow_the_grid() {
        let db = Database::parse(FE_C_TDB).unwrap();
        let phases = ["LIQUID", "BCC_A2", "FCC_A1", "CEMENTITE"];
        let calc = |steps| {
            EquilibriumCalculator::new(&db, &["FE", "C", "VA"], &phases)
                .unwrap()
                .with_sample_steps(steps)
        };
        let (coarse, fine) = (calc(20), calc(80));

        let points = [
            (1000.0, 0.02),
            (1400.0, 0.10),
            (1600.0, 0.05),
            (1700.0, 0.03),
            (1300.0, 0.20),
        ];
        for (t, x_c) in points {
            let conditions = Conditions::new(t).with_x("C", x_c);
            let a = coarse.solve(&conditions).unwrap();
            let b = fine.solve(&conditions).unwrap();

            assert_eq!(a.label(), b.label(), "T={t} X(C)={x_c}");
            assert!(
                (a.gibbs_energy - b.gibbs_energy).abs() < 0.5,
                "T={t} X(C)={x_c}: G {} vs {}",
                a.gibbs_energy,
                b.gibbs_energy
            );
            for (pa, pb) in a.phases.iter().zip(&b.phases) {
                assert!(
                    (pa.composition[1] - pb.composition[1]).abs() < 2e-3,
                    "T={t} X(C)={x_c} {}: {} vs {}",
                    pa.name,
                    pa.composition[1],
                    pb.composition[1]
                );
            }
        }
    }

    #[test]
    fn refinement_never_raises_the_energy() {
        let db = Database::parse(FE_C_TDB).unwrap();
        let phases = ["LIQUID", "FCC_A1", "CEMENTITE"];
        let calc = EquilibriumCalculator::new(&db, &["FE", "C", "VA"], &phases)
            .unwrap()
            .with_sample_steps(15);
        let samples = calc.samples_at(1450.0).unwrap();

        for x_c in [0.03, 0.12, 0.2] {
            let target = [1.0 - x_c, x_c];
            let grid = samples.solve(&target).unwrap();
            let refined = calc.solve_refined(&samples, &target).unwrap();
            assert!(refined.gibbs_energy <= grid.gibbs_energy + 1e-9, "X(C)={x_c}");
        }
    }

    #[test]
    fn ternary_point_converges() {
        let db = Database::parse(FE_CR_C_TDB).unwrap();
        let r = equilibrium(
            &db,
            &["FE", "CR", "C", "VA"],
            &db.phase_names(),
            &Conditions::new(1500.0).with_x("CR", 0.14).with_x("C", 0.03),
        )
        .unwrap();
        assert!(!r.phases.is_empty());
        assert!((r.phases.iter().map(|p| p.fraction).sum::<f64>() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn phase_map_marks_failed_rows() {
        let db = Database::parse(FE_C_TDB).unwrap();
        let calc = EquilibriumCalculator::new(&db, &["FE", "C", "VA"], &["LIQUID", "FCC_A1"])
            .unwrap()
            .with_sample_steps(20);
        let points = vec![vec![1.0, 0.0], vec![0.9, 0.1]];
        let map = calc.phase_map(&[1000.0, f64::NAN], &points).unwrap();

        assert_eq!(map.labels.len(), 2);
        assert_eq!(map.labels[1], vec![ERROR_LABEL, ERROR_LABEL]);
        assert_eq!(map.labels[0][0], "FCC_A1");
        assert_eq!(map.error_count(), 2);

        assert!(calc.phase_map(&[1000.0], &[vec![0.5, 0.6]]).is_err());
    }
}
