//! Reader for the subset of the TDB database format used by the Fe-C and
//! Fe-Cr-C models.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::AppError;
use crate::thermo::expr::{FunctionTable, Piecewise};

/// Species name for a vacant interstitial site.
pub const VACANCY: &str = "VA";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// Gibbs energy (endmember, or interaction when a sublattice lists two species).
    G,
    /// Interaction parameter.
    L,
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub kind: ParameterKind,
    /// Species per sublattice, e.g. `[["FE"], ["C", "VA"]]` for `FE:C,VA`.
    pub constituents: Vec<Vec<String>>,
    /// Redlich-Kister order.
    pub order: u32,
    pub function: Piecewise,
}

impl Parameter {
    pub fn is_endmember(&self) -> bool {
        self.constituents.iter().all(|s| s.len() == 1)
    }
}

#[derive(Debug, Clone)]
pub struct Phase {
    pub name: String,
    /// Site ratios per sublattice.
    pub sites: Vec<f64>,
    pub constituents: Vec<Vec<String>>,
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, Default)]
pub struct Database {
    elements: Vec<String>,
    pub functions: FunctionTable,
    phases: Vec<Phase>,
}

impl Database {
    pub fn from_file(path: &Path) -> Result<Database, AppError> {
        let text = fs::read_to_string(path).map_err(|e| {
            AppError::new(2, format!("Failed to read database {}: {e}", path.display()))
        })?;
        Database::parse(&text).map_err(|e| {
            AppError::new(e.exit_code(), format!("{}: {}", path.display(), e.message()))
        })
    }

    pub fn parse(text: &str) -> Result<Database, AppError> {
        let mut db = Database::default();
        let mut pending: Vec<(String, Parameter)> = Vec::new();

        for command in commands(text) {
            let (keyword, rest) = split_keyword(&command);
            match keyword.as_str() {
                "ELEMENT" => {
                    let name = rest
                        .split_whitespace()
                        .next()
                        .ok_or_else(|| AppError::new(3, "ELEMENT without a name."))?;
                    db.elements.push(name.to_ascii_uppercase());
                }
                "FUNCTION" => {
                    let (name, body) = split_keyword(rest);
                    if name.is_empty() {
                        return Err(AppError::new(3, "FUNCTION without a name."));
                    }
                    let f = Piecewise::parse(body).map_err(|e| {
                        AppError::new(3, format!("FUNCTION {name}: {}", e.message()))
                    })?;
                    db.functions.insert(name, f);
                }
                "PHASE" => db.phases.push(parse_phase(rest)?),
                "CONSTITUENT" => {
                    let (name, constituents) = parse_constituents(rest)?;
                    let phase = db.phase_mut(&name).ok_or_else(|| {
                        AppError::new(3, format!("CONSTITUENT for undeclared phase {name}."))
                    })?;
                    if constituents.len() != phase.sites.len() {
                        return Err(AppError::new(
                            3,
                            format!(
                                "Phase {name} has {} sublattices but CONSTITUENT lists {}.",
                                phase.sites.len(),
                                constituents.len()
                            ),
                        ));
                    }
                    phase.constituents = constituents;
                }
                "PARAMETER" => {
                    if let Some(entry) = parse_parameter(rest)? {
                        pending.push(entry);
                    }
                }
                other => debug!(keyword = other, "skipping TDB command"),
            }
        }

        for (phase_name, param) in pending {
            let phase = db.phase_mut(&phase_name).ok_or_else(|| {
                AppError::new(3, format!("PARAMETER references undeclared phase {phase_name}."))
            })?;
            if param.constituents.len() != phase.sites.len() {
                return Err(AppError::new(
                    3,
                    format!(
                        "PARAMETER for {phase_name} lists {} sublattices, phase has {}.",
                        param.constituents.len(),
                        phase.sites.len()
                    ),
                ));
            }
            phase.parameters.push(param);
        }

        if let Some(phase) = db.phases.iter().find(|p| p.constituents.is_empty()) {
            return Err(AppError::new(
                3,
                format!("Phase {} has no CONSTITUENT declaration.", phase.name),
            ));
        }

        Ok(db)
    }

    pub fn element_names(&self) -> &[String] {
        &self.elements
    }

    /// Phase names in declaration order.
    pub fn phase_names(&self) -> Vec<&str> {
        self.phases.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn phase(&self, name: &str) -> Option<&Phase> {
        self.phases.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn has_phase(&self, name: &str) -> bool {
        self.phase(name).is_some()
    }

    fn phase_mut(&mut self, name: &str) -> Option<&mut Phase> {
        self.phases.iter_mut().find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

/// Split the source into `!`-terminated commands with `$` comment lines removed
/// and whitespace collapsed.
fn commands(text: &str) -> Vec<String> {
    let body: String = text
        .lines()
        .filter(|line| !line.trim_start().starts_with('$'))
        .collect::<Vec<_>>()
        .join(" ");

    body.split('!')
        .map(|c| c.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|c| !c.is_empty())
        .collect()
}

fn split_keyword(s: &str) -> (String, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(idx) => (s[..idx].to_ascii_uppercase(), &s[idx..]),
        None => (s.to_ascii_uppercase(), ""),
    }
}

/// `LIQUID:L` -> `LIQUID`
fn base_phase_name(token: &str) -> String {
    token.split(':').next().unwrap_or(token).to_ascii_uppercase()
}

fn parse_number(token: Option<&str>, what: &str, context: &str) -> Result<f64, AppError> {
    token
        .and_then(|t| t.parse::<f64>().ok())
        .ok_or_else(|| AppError::new(3, format!("Invalid {what} in '{context}'.")))
}

/// `NAME:L % 2 1 3`
fn parse_phase(rest: &str) -> Result<Phase, AppError> {
    let mut tokens = rest.split_whitespace();
    let name = tokens
        .next()
        .map(base_phase_name)
        .ok_or_else(|| AppError::new(3, "PHASE without a name."))?;
    // Type codes such as `%`.
    tokens.next();

    let count = parse_number(tokens.next(), "sublattice count", rest)?;
    if count < 1.0 || count.fract() != 0.0 {
        return Err(AppError::new(3, format!("Invalid sublattice count for phase {name}.")));
    }

    let mut sites = Vec::with_capacity(count as usize);
    for _ in 0..count as usize {
        let site = parse_number(tokens.next(), "site ratio", rest)?;
        if site <= 0.0 {
            return Err(AppError::new(3, format!("Non-positive site ratio for phase {name}.")));
        }
        sites.push(site);
    }

    Ok(Phase {
        name,
        sites,
        constituents: Vec::new(),
        parameters: Vec::new(),
    })
}

fn parse_species_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|sp| sp.trim().trim_end_matches('%').to_ascii_uppercase())
        .filter(|sp| !sp.is_empty())
        .collect()
}

/// `BCC_A2 : FE : C,VA :`
fn parse_constituents(rest: &str) -> Result<(String, Vec<Vec<String>>), AppError> {
    let rest = rest.trim_start();
    let (name_token, tail) = match rest.find(char::is_whitespace) {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, ""),
    };
    let name = base_phase_name(name_token);

    let tail = tail.trim().trim_start_matches(':').trim_end_matches(':');
    let sublattices: Vec<Vec<String>> = tail.split(':').map(parse_species_list).collect();
    if sublattices.iter().any(Vec::is_empty) {
        return Err(AppError::new(3, format!("Empty sublattice in CONSTITUENT for {name}.")));
    }

    Ok((name, sublattices))
}

/// `G(BCC_A2,FE:C;0) 298.15 expr; 6000 N`
fn parse_parameter(rest: &str) -> Result<Option<(String, Parameter)>, AppError> {
    let open = rest.find('(');
    let close = rest.find(')');
    let (Some(open), Some(close)) = (open, close) else {
        return Err(AppError::new(3, format!("Malformed PARAMETER '{}'.", rest.trim())));
    };
    if close < open {
        return Err(AppError::new(3, format!("Malformed PARAMETER '{}'.", rest.trim())));
    }

    let kind = match rest[..open].trim().to_ascii_uppercase().as_str() {
        "G" => ParameterKind::G,
        "L" => ParameterKind::L,
        other => {
            debug!(kind = other, "skipping unsupported parameter type");
            return Ok(None);
        }
    };

    let inside = &rest[open + 1..close];
    let (head, order) = match inside.split_once(';') {
        Some((head, order)) => (head, order.trim()),
        None => (inside, "0"),
    };
    let order = order
        .parse::<u32>()
        .map_err(|_| AppError::new(3, format!("Invalid parameter order in '{inside}'.")))?;

    let (phase, spec) = head
        .split_once(',')
        .ok_or_else(|| AppError::new(3, format!("Parameter '{inside}' names no constituents.")))?;
    let constituents: Vec<Vec<String>> = spec.split(':').map(parse_species_list).collect();
    if constituents.iter().any(Vec::is_empty) {
        return Err(AppError::new(3, format!("Empty sublattice in parameter '{inside}'.")));
    }

    let function = Piecewise::parse(&rest[close + 1..])
        .map_err(|e| AppError::new(3, format!("PARAMETER {inside}: {}", e.message())))?;

    Ok(Some((
        base_phase_name(phase.trim()),
        Parameter {
            kind,
            constituents,
            order,
            function,
        },
    )))
}
