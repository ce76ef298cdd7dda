/// Module to calculate the molar mass and elemental breakdown of a chemical formula,
/// and the quantities derived from it: grams <-> moles, molarity and dilution
///
use crate::Calculator::calc_errors::{CalcError, CalcOutcome};
use crate::Calculator::formula_parser::{FormulaCounts, parse_formula};
use log::{info, warn};
use serde::{Deserialize, Serialize};

// Define a struct to hold element data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    pub symbol: &'static str,
    pub atomic_weight: f64,
}

const fn el(symbol: &'static str, atomic_weight: f64) -> Element {
    Element {
        symbol,
        atomic_weight,
    }
}

// standard atomic weights, g/mol
static ELEMENTS: &[Element] = &[
    el("H", 1.00794),
    el("He", 4.002602),
    el("Li", 6.941),
    el("Be", 9.012182),
    el("B", 10.811),
    el("C", 12.0107),
    el("N", 14.0067),
    el("O", 15.9994),
    el("F", 18.9984032),
    el("Ne", 20.1797),
    el("Na", 22.98976928),
    el("Mg", 24.3050),
    el("Al", 26.9815386),
    el("Si", 28.0855),
    el("P", 30.973762),
    el("S", 32.065),
    el("Cl", 35.453),
    el("Ar", 39.948),
    el("K", 39.0983),
    el("Ca", 40.078),
    el("Sc", 44.955912),
    el("Ti", 47.867),
    el("V", 50.9415),
    el("Cr", 51.9961),
    el("Mn", 54.938045),
    el("Fe", 55.845),
    el("Co", 58.933195),
    el("Ni", 58.6934),
    el("Cu", 63.546),
    el("Zn", 65.38),
    el("Ga", 69.723),
    el("Ge", 72.64),
    el("As", 74.92160),
    el("Se", 78.96),
    el("Br", 79.904),
    el("Kr", 83.798),
    el("Rb", 85.4678),
    el("Sr", 87.62),
    el("Y", 88.90585),
    el("Zr", 91.224),
    el("Nb", 92.90638),
    el("Mo", 95.96),
    el("Tc", 98.0),
    el("Ru", 101.07),
    el("Rh", 102.90550),
    el("Pd", 106.42),
    el("Ag", 107.8682),
    el("Cd", 112.411),
    el("In", 114.818),
    el("Sn", 118.710),
    el("Sb", 121.760),
    el("Te", 127.60),
    el("I", 126.90447),
    el("Xe", 131.293),
    el("Cs", 132.9054519),
    el("Ba", 137.327),
    el("W", 183.84),
    el("Pt", 195.084),
    el("Au", 196.966569),
    el("Hg", 200.59),
    el("Pb", 207.2),
    el("U", 238.02891),
];

/// all elements of the atomic weight table
pub fn elements() -> &'static [Element] {
    ELEMENTS
}

/// atomic weight of an element symbol, None if the symbol is not in the table
pub fn atomic_weight(symbol: &str) -> Option<f64> {
    ELEMENTS
        .iter()
        .find(|e| e.symbol == symbol)
        .map(|e| e.atomic_weight)
}

/// rounds to a fixed number of decimal places
pub fn round_to_decimals(x: f64, decimals: usize) -> f64 {
    format!("{:.*}", decimals, x).parse().unwrap_or(x)
}

/// keeps `digits` significant digits
pub fn to_significant(x: f64, digits: usize) -> f64 {
    if x == 0.0 || !x.is_finite() || digits == 0 {
        return x;
    }
    format!("{:.*e}", digits - 1, x).parse().unwrap_or(x)
}

/// contribution of one element to the molar mass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementContribution {
    pub element: String,
    pub count: usize,
    pub atomic_weight: f64,
    pub mass: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MolarMass {
    /// g/mol, rounded to 6 decimals
    pub molar_mass: f64,
    pub breakdown: Vec<ElementContribution>,
}

impl MolarMass {
    /// mass percent of every element of the breakdown, zeros for a zero molar mass
    pub fn mass_percents(&self) -> Vec<(String, f64)> {
        self.breakdown
            .iter()
            .map(|c| {
                let pct = if self.molar_mass > 0.0 {
                    100.0 * c.mass / self.molar_mass
                } else {
                    0.0
                };
                (c.element.clone(), pct)
            })
            .collect()
    }
}

/// molar mass of already parsed counts; the first element missing from the table is reported
pub fn molar_mass_of_counts(counts: &FormulaCounts) -> CalcOutcome<MolarMass> {
    if let Some(el) = counts.overflow() {
        return Err(CalcError::CountOverflow(el.to_string()));
    }
    let mut total = 0.0;
    let mut breakdown = Vec::with_capacity(counts.len());
    for (element, count) in counts.iter() {
        let aw = atomic_weight(element).ok_or_else(|| {
            warn!("element {} not found in the atomic weight table", element);
            CalcError::UnknownElement(element.to_string())
        })?;
        let mass = aw * count as f64;
        breakdown.push(ElementContribution {
            element: element.to_string(),
            count,
            atomic_weight: aw,
            mass,
        });
        total += mass;
    }
    Ok(MolarMass {
        molar_mass: round_to_decimals(total, 6),
        breakdown,
    })
}

// Function to calculate the molar mass of a substance given its chemical formula
pub fn compute_molar_mass(formula: &str) -> CalcOutcome<MolarMass> {
    let counts = parse_formula(formula);
    let result = molar_mass_of_counts(&counts)?;
    info!("molar mass of {}: {} g/mol", formula, result.molar_mass);
    Ok(result)
}

// Function to calculate the molar mass of a vector of chemical formulas
pub fn molar_masses(vec_of_formulae: &[&str]) -> CalcOutcome<Vec<f64>> {
    vec_of_formulae
        .iter()
        .map(|formula| compute_molar_mass(formula).map(|m| m.molar_mass))
        .collect()
}

/// mass fraction of every element, percent
pub fn mass_percent_composition(formula: &str) -> CalcOutcome<Vec<(String, f64)>> {
    let result = compute_molar_mass(formula)?;
    if result.molar_mass <= 0.0 {
        return Err(CalcError::InvalidFormula(formula.to_string()));
    }
    Ok(result.mass_percents())
}

/// molar mass that can be used as a divisor
fn positive_molar_mass(formula: &str) -> CalcOutcome<f64> {
    let mm = compute_molar_mass(formula)?.molar_mass;
    if mm <= 0.0 {
        warn!("formula '{}' has zero molar mass", formula);
        return Err(CalcError::InvalidFormula(formula.to_string()));
    }
    Ok(mm)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MolesResult {
    pub moles: f64,
    pub molar_mass: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GramsResult {
    pub grams: f64,
    pub molar_mass: f64,
}

/// moles = grams / M, 6 significant digits
pub fn grams_to_moles(grams: f64, formula: &str) -> CalcOutcome<MolesResult> {
    let molar_mass = positive_molar_mass(formula)?;
    Ok(MolesResult {
        moles: to_significant(grams / molar_mass, 6),
        molar_mass,
    })
}

/// grams = moles * M, rounded to 6 decimals
pub fn moles_to_grams(moles: f64, formula: &str) -> CalcOutcome<GramsResult> {
    let molar_mass = positive_molar_mass(formula)?;
    Ok(GramsResult {
        grams: round_to_decimals(moles * molar_mass, 6),
        molar_mass,
    })
}

/// molarity (mol/L) of `grams` of substance dissolved in `volume_l` liters
pub fn molarity_from_mass(grams: f64, formula: &str, volume_l: f64) -> CalcOutcome<f64> {
    if volume_l <= 0.0 || volume_l.is_nan() {
        return Err(CalcError::NonPositiveVolume);
    }
    let conv = grams_to_moles(grams, formula)?;
    Ok(to_significant(conv.moles / volume_l, 6))
}

/// concentrations and volumes before (1) and after (2) dilution; exactly one must be None
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dilution {
    #[serde(rename = "M1", default)]
    pub m1: Option<f64>,
    #[serde(rename = "V1", default)]
    pub v1: Option<f64>,
    #[serde(rename = "M2", default)]
    pub m2: Option<f64>,
    #[serde(rename = "V2", default)]
    pub v2: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DilutionVariable {
    M1,
    V1,
    M2,
    V2,
}

impl std::fmt::Display for DilutionVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DilutionVariable::M1 => "M1",
            DilutionVariable::V1 => "V1",
            DilutionVariable::M2 => "M2",
            DilutionVariable::V2 => "V2",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DilutionSolution {
    pub variable: DilutionVariable,
    pub value: f64,
}

fn checked_div(numerator: f64, divisor: f64, name: &'static str) -> CalcOutcome<f64> {
    if divisor == 0.0 {
        return Err(CalcError::ZeroDivisor(name));
    }
    Ok(numerator / divisor)
}

/// solves M1*V1 = M2*V2 for the single missing value
pub fn solve_dilution(d: &Dilution) -> CalcOutcome<DilutionSolution> {
    let missing = [d.m1, d.v1, d.m2, d.v2]
        .iter()
        .filter(|v| v.is_none())
        .count();
    if missing != 1 {
        return Err(CalcError::InvalidDilution);
    }
    let (variable, value) = match (d.m1, d.v1, d.m2, d.v2) {
        (None, Some(v1), Some(m2), Some(v2)) => {
            (DilutionVariable::M1, checked_div(m2 * v2, v1, "V1")?)
        }
        (Some(m1), None, Some(m2), Some(v2)) => {
            (DilutionVariable::V1, checked_div(m2 * v2, m1, "M1")?)
        }
        (Some(m1), Some(v1), None, Some(v2)) => {
            (DilutionVariable::M2, checked_div(m1 * v1, v2, "V2")?)
        }
        (Some(m1), Some(v1), Some(m2), None) => {
            (DilutionVariable::V2, checked_div(m1 * v1, m2, "M2")?)
        }
        _ => return Err(CalcError::InvalidDilution),
    };
    Ok(DilutionSolution { variable, value })
}
