//! Compound-energy-formalism Gibbs energies and site-fraction sampling.

use tracing::debug;

use crate::domain::GAS_CONSTANT;
use crate::error::AppError;
use crate::math::linspace;
use crate::thermo::expr::{FunctionTable, Piecewise};
use crate::thermo::tdb::{Parameter, Phase, VACANCY};

/// Extra site-fraction values close to the pure ends, where dilute solutions live.
const DILUTE_FRACTIONS: [f64; 10] = [1e-7, 1e-6, 1e-5, 1e-4, 3e-4, 1e-3, 3e-3, 1e-2, 3e-2, 6e-2];

/// Species on a sublattice: a component index or a vacancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Species {
    Component(usize),
    Vacancy,
}

#[derive(Debug, Clone)]
struct Endmember {
    /// Species index within each sublattice.
    occupancy: Vec<usize>,
    function: Piecewise,
}

/// Binary Redlich-Kister term on one sublattice.
#[derive(Debug, Clone)]
struct Interaction {
    sublattice: usize,
    /// Species index within each sublattice; the entry for `sublattice` is unused.
    occupancy: Vec<usize>,
    first: usize,
    second: usize,
    order: u32,
    function: Piecewise,
}

/// A phase restricted to a component set.
#[derive(Debug, Clone)]
pub struct PhaseModel {
    pub name: String,
    sites: Vec<f64>,
    species: Vec<Vec<Species>>,
    endmembers: Vec<Endmember>,
    interactions: Vec<Interaction>,
}

impl PhaseModel {
    /// Restrict `phase` to `components` (plus vacancies when `vacancy` is set).
    ///
    /// Returns `None` when some sublattice has no species left, i.e. the phase
    /// cannot exist in this system.
    pub fn compile(phase: &Phase, components: &[String], vacancy: bool) -> Option<PhaseModel> {
        let species: Vec<Vec<Species>> = phase
            .constituents
            .iter()
            .map(|sublattice| {
                sublattice
                    .iter()
                    .filter_map(|name| resolve_species(name, components, vacancy))
                    .collect::<Vec<_>>()
            })
            .collect();

        if species.iter().any(Vec::is_empty) {
            debug!(phase = %phase.name, "phase has an empty sublattice in this system");
            return None;
        }

        let mut model = PhaseModel {
            name: phase.name.clone(),
            sites: phase.sites.clone(),
            species,
            endmembers: Vec::new(),
            interactions: Vec::new(),
        };

        for param in &phase.parameters {
            model.add_parameter(param, components, vacancy);
        }

        // Every surviving configuration is built from one species per sublattice.
        if model.endmembers.is_empty() {
            debug!(phase = %phase.name, "phase has no endmember parameters in this system");
            return None;
        }

        Some(model)
    }

    fn add_parameter(&mut self, param: &Parameter, components: &[String], vacancy: bool) {
        // Position of each listed species within its sublattice, or None when it
        // is outside the system.
        let mut positions: Vec<Vec<usize>> = Vec::with_capacity(param.constituents.len());
        for (s, names) in param.constituents.iter().enumerate() {
            let mut sub = Vec::with_capacity(names.len());
            for name in names {
                let Some(sp) = resolve_species(name, components, vacancy) else {
                    return;
                };
                let Some(pos) = self.species[s].iter().position(|x| *x == sp) else {
                    return;
                };
                sub.push(pos);
            }
            positions.push(sub);
        }

        if param.is_endmember() {
            self.endmembers.push(Endmember {
                occupancy: positions.iter().map(|p| p[0]).collect(),
                function: param.function.clone(),
            });
            return;
        }

        let mixing: Vec<usize> = positions
            .iter()
            .enumerate()
            .filter(|(_, p)| p.len() > 1)
            .map(|(s, _)| s)
            .collect();
        match mixing.as_slice() {
            [s] if positions[*s].len() == 2 => {
                let s = *s;
                self.interactions.push(Interaction {
                    sublattice: s,
                    occupancy: positions.iter().map(|p| p[0]).collect(),
                    first: positions[s][0],
                    second: positions[s][1],
                    order: param.order,
                    function: param.function.clone(),
                });
            }
            _ => debug!(
                phase = %self.name,
                constituents = ?param.constituents,
                "skipping higher-order interaction"
            ),
        }
    }

    /// Evaluate all temperature-dependent parameters at `t`.
    pub fn at_temperature(
        &self,
        t: f64,
        funcs: &FunctionTable,
    ) -> Result<PhaseEnergy<'_>, AppError> {
        let endmember_g = self
            .endmembers
            .iter()
            .map(|e| e.function.eval(t, funcs))
            .collect::<Result<Vec<_>, _>>()?;
        let interaction_l = self
            .interactions
            .iter()
            .map(|i| i.function.eval(t, funcs))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(bad) = endmember_g.iter().chain(&interaction_l).find(|v| !v.is_finite()) {
            return Err(AppError::new(
                4,
                format!("Phase {} has a non-finite parameter ({bad}) at {t} K.", self.name),
            ));
        }

        Ok(PhaseEnergy {
            model: self,
            temperature: t,
            endmember_g,
            interaction_l,
        })
    }

    /// Site-fraction configurations on a grid with `steps` uniform intervals,
    /// refined near the pure ends.
    pub fn configurations(&self, steps: usize) -> Vec<Vec<Vec<f64>>> {
        let grid = site_fraction_grid(steps);
        let per_sublattice: Vec<Vec<Vec<f64>>> = self
            .species
            .iter()
            .map(|sp| simplex_points(sp.len(), &grid))
            .collect();

        let mut out: Vec<Vec<Vec<f64>>> = vec![Vec::new()];
        for options in &per_sublattice {
            let mut next = Vec::with_capacity(out.len() * options.len());
            for prefix in &out {
                for option in options {
                    let mut config = prefix.clone();
                    config.push(option.clone());
                    next.push(config);
                }
            }
            out = next;
        }
        out
    }
}

fn resolve_species(name: &str, components: &[String], vacancy: bool) -> Option<Species> {
    if name.eq_ignore_ascii_case(VACANCY) {
        return vacancy.then_some(Species::Vacancy);
    }
    components
        .iter()
        .position(|c| c.eq_ignore_ascii_case(name))
        .map(Species::Component)
}

/// A phase model with its parameters evaluated at one temperature.
#[derive(Debug, Clone)]
pub struct PhaseEnergy<'a> {
    model: &'a PhaseModel,
    temperature: f64,
    endmember_g: Vec<f64>,
    interaction_l: Vec<f64>,
}

impl PhaseEnergy<'_> {
    /// Atom fractions per component and Gibbs energy per mole of atoms for the
    /// site fractions `y` (one vector per sublattice).
    ///
    /// Returns `None` for configurations without atoms (all vacancies).
    pub fn evaluate(&self, y: &[Vec<f64>], n_components: usize) -> Option<(Vec<f64>, f64)> {
        let model = self.model;

        let mut x = vec![0.0; n_components];
        for ((fractions, species), &a) in y.iter().zip(&model.species).zip(&model.sites) {
            for (&yi, sp) in fractions.iter().zip(species) {
                if let Species::Component(c) = sp {
                    x[*c] += a * yi;
                }
            }
        }
        let atoms: f64 = x.iter().sum();
        if atoms <= 1e-12 {
            return None;
        }

        let reference: f64 = model
            .endmembers
            .iter()
            .zip(&self.endmember_g)
            .map(|(e, g)| product(y, &e.occupancy, None) * g)
            .sum();

        let ideal: f64 = y
            .iter()
            .zip(&model.sites)
            .map(|(fractions, a)| {
                a * fractions
                    .iter()
                    .filter(|&&v| v > 0.0)
                    .map(|v| v * v.ln())
                    .sum::<f64>()
            })
            .sum::<f64>()
            * GAS_CONSTANT
            * self.temperature;

        let excess: f64 = model
            .interactions
            .iter()
            .zip(&self.interaction_l)
            .map(|(term, l)| {
                let yi = y[term.sublattice][term.first];
                let yj = y[term.sublattice][term.second];
                product(y, &term.occupancy, Some(term.sublattice))
                    * yi
                    * yj
                    * l
                    * (yi - yj).powi(term.order as i32)
            })
            .sum();

        for v in &mut x {
            *v /= atoms;
        }
        Some((x, (reference + ideal + excess) / atoms))
    }
}

fn product(y: &[Vec<f64>], occupancy: &[usize], skip: Option<usize>) -> f64 {
    occupancy
        .iter()
        .enumerate()
        .filter(|(s, _)| Some(*s) != skip)
        .map(|(s, &i)| y[s][i])
        .product()
}

/// Values in `[0, 1]`: a uniform grid plus dilute values at both ends.
pub fn site_fraction_grid(steps: usize) -> Vec<f64> {
    let mut grid = linspace(0.0, 1.0, steps.max(1) + 1);
    for v in DILUTE_FRACTIONS {
        grid.push(v);
        grid.push(1.0 - v);
    }
    grid.sort_by(f64::total_cmp);
    grid.dedup_by(|a, b| (*a - *b).abs() < 1e-12);
    grid
}

/// Configurations one move away from `y`: on a single sublattice, shift site
/// fraction from species `i` to species `j` by `step`, by half of `y_i`, or by
/// `y_j` (doubling it). Every move keeps each sublattice summing to one.
pub fn neighbours(y: &[Vec<f64>], step: f64) -> Vec<Vec<Vec<f64>>> {
    let mut out = Vec::new();
    for (s, fractions) in y.iter().enumerate() {
        for (i, &yi) in fractions.iter().enumerate() {
            if yi <= 0.0 {
                continue;
            }
            for (j, &yj) in fractions.iter().enumerate() {
                if i == j {
                    continue;
                }
                for amount in [step, 0.5 * yi, yj] {
                    let d = amount.min(yi);
                    if d <= 1e-12 {
                        continue;
                    }
                    let mut moved = y.to_vec();
                    moved[s][i] = (yi - d).max(0.0);
                    moved[s][j] = yj + d;
                    out.push(moved);
                }
            }
        }
    }
    out
}

/// Points on the `k`-species simplex whose free coordinates come from `grid`.
fn simplex_points(k: usize, grid: &[f64]) -> Vec<Vec<f64>> {
    fn recurse(
        k: usize,
        remaining: f64,
        grid: &[f64],
        prefix: &mut Vec<f64>,
        out: &mut Vec<Vec<f64>>,
    ) {
        if k == 1 {
            let mut point = prefix.clone();
            point.push(remaining.max(0.0));
            out.push(point);
            return;
        }
        for &v in grid.iter().take_while(|&&v| v <= remaining + 1e-12) {
            prefix.push(v.min(remaining));
            recurse(k - 1, remaining - v, grid, prefix, out);
            prefix.pop();
        }
    }

    let mut out = Vec::new();
    recurse(k, 1.0, grid, &mut Vec::with_capacity(k), &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thermo::databases::{FE_C_TDB, FE_CR_C_TDB};
    use crate::thermo::tdb::Database;

    fn comps(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn grid_is_sorted_and_bounded() {
        let g = site_fraction_grid(10);
        assert_eq!(g.first(), Some(&0.0));
        assert_eq!(g.last(), Some(&1.0));
        assert!(g.windows(2).all(|w| w[0] < w[1]));
        assert!(g.contains(&1e-7));
    }

    #[test]
    fn simplex_points_sum_to_one() {
        let grid = site_fraction_grid(4);
        let pts = simplex_points(3, &grid);
        assert!(!pts.is_empty());
        for p in &pts {
            assert_eq!(p.len(), 3);
            assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            assert!(p.iter().all(|&v| v >= 0.0));
        }
        assert_eq!(simplex_points(1, &grid), vec![vec![1.0]]);
    }

    #[test]
    fn neighbours_stay_on_each_sublattice_simplex() {
        let y = vec![vec![1.0], vec![0.25, 0.75]];
        let moves = neighbours(&y, 0.1);

        // Two directions on the mixing sublattice, three amounts each.
        assert_eq!(moves.len(), 6);
        for m in &moves {
            assert_eq!(m[0], vec![1.0]);
            assert!((m[1].iter().sum::<f64>() - 1.0).abs() < 1e-12);
            assert!(m[1].iter().all(|&v| v >= 0.0));
        }
        assert!(moves.iter().any(|m| (m[1][0] - 0.15).abs() < 1e-12));
        assert!(moves.iter().any(|m| (m[1][0] - 0.5).abs() < 1e-12));
    }

    #[test]
    fn empty_species_only_receive() {
        let moves = neighbours(&[vec![0.0, 1.0]], 0.05);
        // From the second species only; `y_j` = 0 gives no move.
        assert_eq!(moves.len(), 2);
        assert!(moves.iter().all(|m| m[0][0] > 0.0));
    }

    #[test]
    fn chromium_phases_drop_out_of_the_binary() {
        let db = Database::parse(FE_CR_C_TDB).unwrap();
        let c = comps(&["FE", "C"]);
        let bcc = PhaseModel::compile(db.phase("BCC_A2").unwrap(), &c, true).unwrap();
        // FE:VA and FE:C survive; the CR terms and the FE,CR interaction do not.
        assert_eq!(bcc.endmembers.len(), 2);
        assert!(bcc.interactions.is_empty());

        // Without vacancies BCC is limited to FE:C.
        let no_va = PhaseModel::compile(db.phase("BCC_A2").unwrap(), &c, false).unwrap();
        assert_eq!(no_va.species[1].len(), 1);
    }

    #[test]
    fn pure_fcc_iron_matches_its_endmember() {
        let db = Database::parse(FE_C_TDB).unwrap();
        let c = comps(&["FE", "C"]);
        let fcc = PhaseModel::compile(db.phase("FCC_A1").unwrap(), &c, true).unwrap();
        let energy = fcc.at_temperature(1000.0, &db.functions).unwrap();

        // Species order in the second sublattice is C, VA.
        let (x, g) = energy.evaluate(&[vec![1.0], vec![0.0, 1.0]], 2).unwrap();
        assert_eq!(x, vec![1.0, 0.0]);

        let ghser = db.functions["GHSERFE"].eval(1000.0, &db.functions).unwrap();
        let t: f64 = 1000.0;
        let lattice = -1462.4 + 8.282 * t - 1.15 * t * t.ln() + 6.4e-4 * t * t;
        assert!((g - (ghser + lattice)).abs() < 1e-6);
    }

    #[test]
    fn liquid_mixing_adds_ideal_and_excess_terms() {
        let db = Database::parse(FE_C_TDB).unwrap();
        let c = comps(&["FE", "C"]);
        let liq = PhaseModel::compile(db.phase("LIQUID").unwrap(), &c, true).unwrap();
        let t = 1500.0;
        let energy = liq.at_temperature(t, &db.functions).unwrap();

        let (_, g_fe) = energy.evaluate(&[vec![1.0, 0.0]], 2).unwrap();
        let (_, g_c) = energy.evaluate(&[vec![0.0, 1.0]], 2).unwrap();
        let (x, g_mid) = energy.evaluate(&[vec![0.5, 0.5]], 2).unwrap();

        assert_eq!(x, vec![0.5, 0.5]);
        let ideal = GAS_CONSTANT * t * 0.5f64.ln();
        let excess = 0.25 * (-124320.0 + 28.5 * t);
        let expected = 0.5 * g_fe + 0.5 * g_c + ideal + excess;
        assert!((g_mid - expected).abs() < 1e-6, "{g_mid} vs {expected}");
    }

    #[test]
    fn cementite_energy_is_per_mole_of_atoms() {
        let db = Database::parse(FE_C_TDB).unwrap();
        let c = comps(&["FE", "C"]);
        let cem = PhaseModel::compile(db.phase("CEMENTITE").unwrap(), &c, true).unwrap();
        let configs = cem.configurations(20);
        assert_eq!(configs.len(), 1);

        let energy = cem.at_temperature(1000.0, &db.functions).unwrap();
        let (x, g) = energy.evaluate(&configs[0], 2).unwrap();
        assert!((x[1] - 0.25).abs() < 1e-12);

        let fe = db.functions["GHSERFE"].eval(1000.0, &db.functions).unwrap();
        let cc = db.functions["GHSERCC"].eval(1000.0, &db.functions).unwrap();
        assert!((g - (3.0 * fe + cc + 13500.0) / 4.0).abs() < 1e-6);
    }

    #[test]
    fn all_vacancy_configuration_has_no_atoms() {
        let phase = Phase {
            name: "TEST".into(),
            sites: vec![1.0],
            constituents: vec![vec!["C".into(), "VA".into()]],
            parameters: vec![Parameter {
                kind: crate::thermo::tdb::ParameterKind::G,
                constituents: vec![vec!["C".into()]],
                order: 0,
                function: Piecewise::parse("298.15 0; 6000 N").unwrap(),
            }],
        };
        let model = PhaseModel::compile(&phase, &comps(&["C"]), true).unwrap();
        let energy = model.at_temperature(500.0, &FunctionTable::new()).unwrap();
        assert!(energy.evaluate(&[vec![0.0, 1.0]], 1).is_none());
    }
}
