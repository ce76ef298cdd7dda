//! Tokenizer and recursive parser of chemical formulae like "H2O", "Mg(OH)2" or "K4(Fe(CN)6)".
//!
//! The permissive parser silently skips everything that is not an element symbol, a number
//! or a bracket, and it tolerates unbalanced brackets. `parse_formula_strict` is the
//! validating counterpart for callers that want malformed input rejected.
use crate::Calculator::calc_errors::{CalcError, CalcOutcome};
use log::{debug, warn};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// named chemical groups, e.g. { "Me":{"C":1, "H":3} }
pub type Groups = HashMap<String, HashMap<String, usize>>;

/// single lexical unit of a formula
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// one uppercase letter optionally followed by one lowercase letter
    Element(String),
    /// decimal integer
    Count(usize),
    Open,
    Close,
}

fn token_regex() -> &'static Regex {
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    TOKEN_RE.get_or_init(|| {
        Regex::new(r"[A-Z][a-z]?|[0-9]+|\(|\)").expect("token pattern is a valid regex")
    })
}

fn token_from_str(s: &str) -> Token {
    match s {
        "(" => Token::Open,
        ")" => Token::Close,
        _ if s.starts_with(|c: char| c.is_ascii_digit()) => {
            // numbers too long for usize saturate, FormulaCounts reports them as overflow
            Token::Count(s.parse().unwrap_or(usize::MAX))
        }
        _ => Token::Element(s.to_string()),
    }
}

/// splits formula into element symbols, numbers and brackets. Unmatched characters are skipped
pub fn tokenize_formula(formula: &str) -> Vec<Token> {
    token_regex()
        .find_iter(formula)
        .map(|m| token_from_str(m.as_str()))
        .collect()
}

/// element -> number of atoms, in order of first appearance in the formula.
/// A count reaching usize::MAX is saturated: the element is remembered as overflowed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormulaCounts {
    entries: Vec<(String, usize)>,
    overflow: Option<String>,
}

impl FormulaCounts {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            overflow: None,
        }
    }

    /// additive update: existing count of the same element accumulates
    pub fn add(&mut self, element: &str, count: usize) {
        self.add_scaled(element, count, 1);
    }

    /// adds `count * multiplier` atoms of `element`
    pub fn add_scaled(&mut self, element: &str, count: usize, multiplier: usize) {
        let i = match self.entries.iter().position(|(el, _)| el == element) {
            Some(i) => i,
            None => {
                self.entries.push((element.to_string(), 0));
                self.entries.len() - 1
            }
        };
        let total = count
            .checked_mul(multiplier)
            .and_then(|n| n.checked_add(self.entries[i].1))
            .filter(|&n| n < usize::MAX);
        match total {
            Some(n) => self.entries[i].1 = n,
            None => {
                self.entries[i].1 = usize::MAX;
                self.mark_overflow(element);
            }
        }
    }

    /// merge other counts multiplied by `multiplier`
    pub fn merge_scaled(&mut self, other: &FormulaCounts, multiplier: usize) {
        for (el, n) in other.iter() {
            self.add_scaled(el, n, multiplier);
        }
        if let Some(el) = other.overflow() {
            self.mark_overflow(el);
        }
    }

    fn mark_overflow(&mut self, element: &str) {
        if self.overflow.is_none() {
            self.overflow = Some(element.to_string());
        }
    }

    /// first element whose count did not fit
    pub fn overflow(&self) -> Option<&str> {
        self.overflow.as_deref()
    }

    pub fn get(&self, element: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(el, _)| el == element)
            .map(|(_, n)| *n)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(el, n)| (el.as_str(), *n))
    }

    pub fn elements(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(el, _)| el.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// unordered view, handy for comparisons
    pub fn to_hashmap(&self) -> HashMap<String, usize> {
        self.entries.iter().cloned().collect()
    }
}

impl FromIterator<(String, usize)> for FormulaCounts {
    fn from_iter<I: IntoIterator<Item = (String, usize)>>(iter: I) -> Self {
        let mut counts = FormulaCounts::new();
        for (el, n) in iter {
            counts.add(&el, n);
        }
        counts
    }
}

/// cursor over the token stream
struct GroupParser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> GroupParser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    /// consumes a number token if it is the next one
    fn take_count(&mut self) -> Option<usize> {
        match self.tokens.get(self.pos) {
            Some(Token::Count(n)) => {
                self.pos += 1;
                Some(*n)
            }
            _ => None,
        }
    }

    /// parses until the tokens run out or a closing bracket is consumed
    fn parse_group(&mut self) -> FormulaCounts {
        let mut counts = FormulaCounts::new();
        while let Some(token) = self.tokens.get(self.pos) {
            self.pos += 1;
            match token {
                Token::Open => {
                    let inner = self.parse_group();
                    let multiplier = self.take_count().unwrap_or(1);
                    counts.merge_scaled(&inner, multiplier);
                }
                Token::Close => break,
                Token::Element(el) => {
                    let n = self.take_count().unwrap_or(1);
                    counts.add(el, n);
                }
                // stray number
                Token::Count(_) => {}
            }
        }
        counts
    }
}

/// Function to parse a chemical formula and return element counts in order of first appearance
pub fn parse_formula(formula: &str) -> FormulaCounts {
    let tokens = tokenize_formula(formula);
    let counts = GroupParser::new(&tokens).parse_group();
    if let Some(el) = counts.overflow() {
        warn!("atom count of {} in {} is too large", el, formula);
    }
    debug!("parsed formula {} into {:?}", formula, counts);
    counts
}

// Chemical formulae may contain special names for chemical groups i.e. groups of atoms, e.g. Me (methyl) group, which is converted into {"C":1, "H":3}
// so we need to convert them into regular elements
fn handle_groups(counts: FormulaCounts, groups: &Groups) -> FormulaCounts {
    let mut expanded = FormulaCounts::new();
    if let Some(el) = counts.overflow() {
        expanded.mark_overflow(el);
    }
    for (el, n) in counts.iter() {
        match groups.get(el) {
            Some(atomic_composition) => {
                // HashMap order is arbitrary, sort to keep the output deterministic
                let mut atoms: Vec<(&String, &usize)> = atomic_composition.iter().collect();
                atoms.sort();
                for (atom, quantity) in atoms {
                    expanded.add_scaled(atom, *quantity, n);
                }
            }
            None => expanded.add(el, n),
        }
    }
    expanded
}

/// parse_formula with optional named chemical groups ("C6H4(Me)2" with Me = CH3)
pub fn parse_formula_with_groups(formula: &str, groups: Option<&Groups>) -> FormulaCounts {
    let counts = parse_formula(formula);
    match groups {
        Some(groups) => handle_groups(counts, groups),
        None => counts,
    }
}

/// Validating parser: rejects empty formulae, characters the tokenizer would skip,
/// numbers without a preceding element or group and unbalanced brackets
pub fn parse_formula_strict(formula: &str) -> CalcOutcome<FormulaCounts> {
    let malformed = |message: String| CalcError::MalformedFormula {
        formula: formula.to_string(),
        message,
    };
    let trimmed = formula.trim();
    if trimmed.is_empty() {
        return Err(malformed("formula is empty".to_string()));
    }
    let mut expected_start = 0;
    let mut tokens = Vec::new();
    for m in token_regex().find_iter(trimmed) {
        if m.start() != expected_start {
            let bad = trimmed[expected_start..].chars().next().unwrap_or(' ');
            return Err(malformed(format!(
                "unexpected character '{}' at position {}",
                bad, expected_start
            )));
        }
        expected_start = m.end();
        tokens.push(token_from_str(m.as_str()));
    }
    if expected_start != trimmed.len() {
        let bad = trimmed[expected_start..].chars().next().unwrap_or(' ');
        return Err(malformed(format!(
            "unexpected character '{}' at position {}",
            bad, expected_start
        )));
    }

    let mut depth = 0usize;
    let mut previous: Option<&Token> = None;
    for token in tokens.iter() {
        match token {
            Token::Open => depth += 1,
            Token::Close => {
                if depth == 0 {
                    return Err(malformed("unmatched ')'".to_string()));
                }
                if previous == Some(&Token::Open) {
                    return Err(malformed("empty group '()'".to_string()));
                }
                depth -= 1;
            }
            Token::Count(_) => match previous {
                Some(Token::Element(_)) | Some(Token::Close) => {}
                _ => {
                    return Err(malformed(
                        "number must follow an element or a closing bracket".to_string(),
                    ));
                }
            },
            Token::Element(_) => {}
        }
        previous = Some(token);
    }
    if depth != 0 {
        return Err(malformed(format!("{} unclosed '('", depth)));
    }
    let counts = GroupParser::new(&tokens).parse_group();
    if let Some(el) = counts.overflow() {
        return Err(malformed(format!("atom count of {} is too large", el)));
    }
    if counts.is_empty() {
        warn!("formula {} contains no elements", formula);
        return Err(malformed("formula contains no elements".to_string()));
    }
    Ok(counts)
}

/// splits one side of an equation "H2 + O2" into molecules ["H2", "O2"]
pub fn parse_equation_side(side: &str) -> Vec<String> {
    side.split('+')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// splits an equation like "H2 + O2 -> H2O" into reactants and products.
/// Accepted arrows are "->", "=>", "→" and "="
pub fn parse_equation(equation: &str) -> CalcOutcome<(Vec<String>, Vec<String>)> {
    for arrow in ["->", "=>", "→", "="] {
        if let Some((lhs, rhs)) = equation.split_once(arrow) {
            return Ok((parse_equation_side(lhs), parse_equation_side(rhs)));
        }
    }
    Err(CalcError::Request(format!(
        "equation '{}' has no arrow (->, =>, →, =)",
        equation
    )))
}
