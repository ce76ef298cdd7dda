/// error types shared by all calculator modules
pub mod calc_errors;
/// eng
/// Splits a chemical formula into element symbols, numbers and brackets and counts atoms,
/// including nested bracket groups like K4(Fe(CN)6). Characters that are neither element symbols,
/// numbers nor brackets are skipped, unbalanced brackets are tolerated. A strict parser is provided
/// for callers that prefer malformed formulae rejected.
/// Chemical formulae may contain special names for chemical groups, e.g. Me (methyl) group, which is
/// converted into {"C":1, "H":3} when the groups are passed to the parser
///
///  # Examples
/// ```
/// use ChemCalc::Calculator::formula_parser::parse_formula;
/// let counts = parse_formula("Mg(OH)2");
/// assert_eq!(counts.get("Mg"), Some(1));
/// assert_eq!(counts.get("O"), Some(2));
/// assert_eq!(counts.get("H"), Some(2));
/// ```
pub mod formula_parser;
/// Module to calculate the molar mass of a chemical formula together with the contribution of every
/// element, and the quantities derived from it: grams <-> moles, molarity, dilution (M1V1 = M2V2)
///
///  # Examples
/// ```
/// use ChemCalc::Calculator::molmass::{compute_molar_mass, grams_to_moles};
/// let water = compute_molar_mass("H2O").unwrap();
/// assert_eq!(water.molar_mass, 18.01528);
/// let conv = grams_to_moles(36.03056, "H2O").unwrap();
/// assert_eq!(conv.moles, 2.0);
/// ```
pub mod molmass;
/// The module takes two vectors of formulae (reactants and products) and produces the smallest
/// positive integer stoichiometric coefficients conserving every element:
/// 1) the formulae are parsed into element counts
/// 2) the stoichiometric matrix (elements x molecules) is built, product columns negated
/// 3) an integer vector of its null space with all components positive is searched
///
///  # Examples
/// ```
/// use ChemCalc::Calculator::equation_balancer::balance_equation;
/// let balanced = balance_equation(&["CH4", "O2"], &["CO2", "H2O"]).unwrap();
/// assert_eq!(balanced.reactants, vec![1, 2]);
/// assert_eq!(balanced.products, vec![1, 2]);
/// ```
pub mod equation_balancer;
/// Calculation requests (molar mass, grams <-> moles, molarity, dilution, balancing, stoichiometry,
/// limiting reagent) and their formatted results
///
///  # Examples
/// ```
/// use ChemCalc::Calculator::dispatcher::{CalcRequest, evaluate};
/// let result = evaluate(&CalcRequest::Balance {
///     lhs: vec!["H2".to_string(), "O2".to_string()],
///     rhs: vec!["H2O".to_string()],
/// });
/// assert_eq!(result.summary, "2 H2 + 1 O2 → 2 H2O");
/// ```
pub mod dispatcher;

mod dispatcher_tests;
