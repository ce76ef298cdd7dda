//! Routes a typed calculation request to the molar mass engine or the equation balancer
//! and formats a human-readable `CalcResult`. Failures never escape as `Err`: they are
//! turned into a result whose summary is "Error" and whose details carry the message.
use crate::Calculator::calc_errors::{CalcError, CalcOutcome};
use crate::Calculator::equation_balancer::balance_equation_with;
use crate::Calculator::formula_parser::parse_formula_strict;
use crate::Calculator::molmass::{
    Dilution, compute_molar_mass, grams_to_moles, molarity_from_mass, moles_to_grams,
    solve_dilution, to_significant,
};
use crate::settings::CalcSettings;
use log::{info, warn};
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};
use std::fmt;

fn one() -> f64 {
    1.0
}

/// mass of reactant A -> mass of product P
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoichRequest {
    #[serde(default = "one")]
    pub coef_a: f64,
    #[serde(default = "one")]
    pub coef_p: f64,
    pub formula_a: String,
    pub formula_p: String,
    pub mass_a: f64,
}

/// two reactants A and B with their masses, product P
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitingRequest {
    #[serde(default = "one")]
    pub coef_a: f64,
    #[serde(default = "one")]
    pub coef_b: f64,
    pub formula_a: String,
    pub formula_b: String,
    pub mass_a: f64,
    pub mass_b: f64,
    #[serde(default = "one")]
    pub coef_p: f64,
    pub formula_p: String,
}

/// calculation request, one variant per operation. JSON form is tagged by "mode",
/// e.g. {"mode":"molar-mass","formula":"H2O"}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum CalcRequest {
    MolarMass {
        formula: String,
    },
    GramsToMoles {
        formula: String,
        grams: f64,
    },
    MolesToGrams {
        formula: String,
        moles: f64,
    },
    Molarity {
        formula: String,
        grams: f64,
        #[serde(rename = "volumeL")]
        volume_l: f64,
    },
    Dilution(Dilution),
    Balance {
        lhs: Vec<String>,
        rhs: Vec<String>,
    },
    Stoich(StoichRequest),
    Limiting(LimitingRequest),
}

impl CalcRequest {
    /// formulae the request refers to
    fn formulas(&self) -> Vec<&str> {
        match self {
            CalcRequest::MolarMass { formula }
            | CalcRequest::GramsToMoles { formula, .. }
            | CalcRequest::MolesToGrams { formula, .. }
            | CalcRequest::Molarity { formula, .. } => vec![formula.as_str()],
            CalcRequest::Dilution(_) => Vec::new(),
            CalcRequest::Balance { lhs, rhs } => {
                lhs.iter().chain(rhs.iter()).map(|s| s.as_str()).collect()
            }
            CalcRequest::Stoich(r) => vec![r.formula_a.as_str(), r.formula_p.as_str()],
            CalcRequest::Limiting(r) => vec![
                r.formula_a.as_str(),
                r.formula_b.as_str(),
                r.formula_p.as_str(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub label: String,
    pub value: String,
}

/// formatted outcome of a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalcResult {
    pub title: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<Vec<TableRow>>,
}

impl CalcResult {
    fn new(title: &str, summary: String) -> Self {
        Self {
            title: title.to_string(),
            summary,
            details: None,
            table: None,
        }
    }

    fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }

    fn error(title: &str, err: &CalcError) -> Self {
        warn!("{}: {}", title, err);
        CalcResult::new(title, "Error".to_string()).with_details(err.to_string())
    }

    pub fn is_error(&self) -> bool {
        self.summary == "Error"
    }
}

impl fmt::Display for CalcResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", self.summary)?;
        if let Some(details) = &self.details {
            writeln!(f, "{}", details)?;
        }
        if let Some(rows) = &self.table {
            let mut table = Table::new();
            for row in rows {
                table.add_row(Row::new(vec![Cell::new(&row.label), Cell::new(&row.value)]));
            }
            write!(f, "{}", table)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoichReport {
    pub moles_a: f64,
    pub moles_product: f64,
    pub grams_product: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reagent {
    A,
    B,
}

impl fmt::Display for Reagent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reagent::A => write!(f, "A"),
            Reagent::B => write!(f, "B"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimitingReport {
    pub limiting: Reagent,
    pub moles_product: f64,
    pub grams_product: f64,
}

fn check_coefficient(coef: f64, label: &str) -> CalcOutcome<()> {
    if coef > 0.0 && coef.is_finite() {
        Ok(())
    } else {
        Err(CalcError::InvalidCoefficient(label.to_string()))
    }
}

/// moles of A from its mass, scaled by coefP/coefA and converted into grams of P
pub fn stoichiometry(req: &StoichRequest) -> CalcOutcome<StoichReport> {
    check_coefficient(req.coef_a, &req.formula_a)?;
    check_coefficient(req.coef_p, &req.formula_p)?;
    let moles_a = grams_to_moles(req.mass_a, &req.formula_a)?.moles;
    let moles_product = moles_a * (req.coef_p / req.coef_a);
    let grams_product = moles_to_grams(moles_product, &req.formula_p)?.grams;
    Ok(StoichReport {
        moles_a,
        moles_product,
        grams_product,
    })
}

/// the reactant giving fewer moles of product limits the reaction; on a tie B is reported
pub fn limiting_reagent(req: &LimitingRequest) -> CalcOutcome<LimitingReport> {
    check_coefficient(req.coef_a, &req.formula_a)?;
    check_coefficient(req.coef_b, &req.formula_b)?;
    check_coefficient(req.coef_p, &req.formula_p)?;
    let moles_a = grams_to_moles(req.mass_a, &req.formula_a)?.moles;
    let moles_b = grams_to_moles(req.mass_b, &req.formula_b)?.moles;
    let p_from_a = moles_a * (req.coef_p / req.coef_a);
    let p_from_b = moles_b * (req.coef_p / req.coef_b);
    let (limiting, moles_product) = if p_from_a < p_from_b {
        (Reagent::A, p_from_a)
    } else {
        (Reagent::B, p_from_b)
    };
    let grams_product = moles_to_grams(moles_product, &req.formula_p)?.grams;
    Ok(LimitingReport {
        limiting,
        moles_product: to_significant(moles_product, 6),
        grams_product,
    })
}

fn title_of(req: &CalcRequest) -> &'static str {
    match req {
        CalcRequest::MolarMass { .. } => "Molar mass",
        CalcRequest::GramsToMoles { .. } => "Grams → Moles",
        CalcRequest::MolesToGrams { .. } => "Moles → Grams",
        CalcRequest::Molarity { .. } => "Molarity",
        CalcRequest::Dilution(_) => "Dilution (M1V1=M2V2)",
        CalcRequest::Balance { .. } => "Balance equation",
        CalcRequest::Stoich(_) => "Stoichiometry",
        CalcRequest::Limiting(_) => "Limiting reagent",
    }
}

fn perform(req: &CalcRequest, settings: &CalcSettings) -> CalcOutcome<CalcResult> {
    if settings.strict_formulas {
        for formula in req.formulas() {
            parse_formula_strict(formula)?;
        }
    }
    let title = title_of(req);
    let result = match req {
        CalcRequest::MolarMass { formula } => {
            let formula = formula.trim();
            let mm = compute_molar_mass(formula)?;
            let percents = mm.mass_percents();
            let details = mm
                .breakdown
                .iter()
                .map(|b| {
                    format!(
                        "{} × {} × {} = {:.4} g",
                        b.element, b.count, b.atomic_weight, b.mass
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");
            let table = mm
                .breakdown
                .iter()
                .zip(percents.iter())
                .map(|(b, (_, pct))| TableRow {
                    label: format!("{} ({})", b.element, b.count),
                    value: format!("{:.4} g ({:.2} %)", b.mass, pct),
                })
                .collect();
            let mut result = CalcResult::new(
                title,
                format!("{} → {} g·mol⁻¹", formula, mm.molar_mass),
            )
            .with_details(details);
            result.table = Some(table);
            result
        }
        CalcRequest::GramsToMoles { formula, grams } => {
            let r = grams_to_moles(*grams, formula)?;
            CalcResult::new(
                title,
                format!("{} g of {} = {} mol", grams, formula, r.moles),
            )
            .with_details(format!("Molar mass: {} g·mol⁻¹", r.molar_mass))
        }
        CalcRequest::MolesToGrams { formula, moles } => {
            let r = moles_to_grams(*moles, formula)?;
            CalcResult::new(
                title,
                format!("{} mol of {} = {} g", moles, formula, r.grams),
            )
            .with_details(format!("Molar mass: {} g·mol⁻¹", r.molar_mass))
        }
        CalcRequest::Molarity {
            formula,
            grams,
            volume_l,
        } => {
            let m = molarity_from_mass(*grams, formula, *volume_l)?;
            CalcResult::new(title, format!("{} M", m))
                .with_details(format!("{} g in {} L", grams, volume_l))
        }
        CalcRequest::Dilution(d) => {
            let solution = solve_dilution(d)?;
            CalcResult::new("Dilution", format!("{} = {}", solution.variable, solution.value))
        }
        CalcRequest::Balance { lhs, rhs } => {
            let balanced = balance_equation_with(lhs, rhs, &settings.balance_method)?;
            CalcResult::new("Balanced equation", balanced.format(lhs, rhs))
        }
        CalcRequest::Stoich(r) => {
            let report = stoichiometry(r)?;
            CalcResult::new(
                title,
                format!(
                    "From {} g {} → {} mol {} = {} g",
                    r.mass_a, r.formula_a, report.moles_product, r.formula_p, report.grams_product
                ),
            )
        }
        CalcRequest::Limiting(r) => {
            let report = limiting_reagent(r)?;
            let formula = match report.limiting {
                Reagent::A => &r.formula_a,
                Reagent::B => &r.formula_b,
            };
            CalcResult::new(
                title,
                format!("Limiting: {} ({})", report.limiting, formula),
            )
            .with_details(format!(
                "Product: {} mol = {} g",
                report.moles_product, report.grams_product
            ))
        }
    };
    Ok(result)
}

/// evaluate with default settings
pub fn evaluate(req: &CalcRequest) -> CalcResult {
    evaluate_with(req, &CalcSettings::default())
}

pub fn evaluate_with(req: &CalcRequest, settings: &CalcSettings) -> CalcResult {
    info!("evaluating request {:?}", req);
    match perform(req, settings) {
        Ok(result) => result,
        Err(e) => CalcResult::error(title_of(req), &e),
    }
}

/// evaluates a JSON-encoded request; malformed JSON becomes an error result
pub fn evaluate_json(json: &str, settings: &CalcSettings) -> CalcResult {
    match serde_json::from_str::<CalcRequest>(json) {
        Ok(req) => evaluate_with(&req, settings),
        Err(e) => CalcResult::error("Request", &CalcError::from(e)),
    }
}
