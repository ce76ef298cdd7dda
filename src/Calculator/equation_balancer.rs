use crate::Calculator::calc_errors::{CalcError, CalcOutcome};
use crate::Calculator::formula_parser::{FormulaCounts, parse_formula};
use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

const PIVOT_TOL: f64 = 1e-9;
/// weights tried for every basis vector when the null space has more than one dimension
const MAX_COMBINATION_WEIGHT: i128 = 8;
const MAX_NULLITY: usize = 4;

/// How integer coefficients are searched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BalanceMethod {
    /// exact fraction-free elimination over integers
    #[default]
    Exact,
    /// fix the last coefficient to 1..=limit, least squares for the rest, then rationalize
    TrialScale { limit: usize, max_denominator: u64 },
}

impl BalanceMethod {
    pub fn trial_scale() -> Self {
        BalanceMethod::TrialScale {
            limit: 12,
            max_denominator: 1_000_000,
        }
    }
}

/// Signed element x molecule matrix. Columns are [reactants..., products...],
/// reactant columns hold atom counts, product columns their negation
#[derive(Debug, Clone, PartialEq)]
pub struct StoichMatrix {
    /// union of elements in order of first appearance
    pub elements: Vec<String>,
    pub molecules: Vec<String>,
    pub n_reactants: usize,
    pub matrix: DMatrix<i64>,
}

impl StoichMatrix {
    /// fails when an atom count does not fit into the matrix
    pub fn new<S: AsRef<str>>(reactants: &[S], products: &[S]) -> CalcOutcome<Self> {
        let molecules: Vec<String> = reactants
            .iter()
            .chain(products.iter())
            .map(|m| m.as_ref().to_string())
            .collect();
        let compositions: Vec<FormulaCounts> =
            molecules.iter().map(|m| parse_formula(m)).collect();
        let mut elements: Vec<String> = Vec::new();
        for counts in compositions.iter() {
            if let Some(el) = counts.overflow() {
                return Err(CalcError::CountOverflow(el.to_string()));
            }
            for el in counts.elements() {
                if !elements.iter().any(|e| e == el) {
                    elements.push(el.to_string());
                }
            }
        }
        let n_reactants = reactants.len();
        let mut matrix = DMatrix::<i64>::zeros(elements.len(), molecules.len());
        for (j, counts) in compositions.iter().enumerate() {
            for (i, el) in elements.iter().enumerate() {
                if let Some(n) = counts.get(el) {
                    let n = i64::try_from(n).map_err(|_| CalcError::CountOverflow(el.clone()))?;
                    matrix[(i, j)] = if j < n_reactants { n } else { -n };
                }
            }
        }
        debug!("stoichiometric matrix for {:?}: {}", molecules, matrix);
        Ok(Self {
            elements,
            molecules,
            n_reactants,
            matrix,
        })
    }

    /// molecules whose column holds no atoms
    pub fn empty_molecules(&self) -> Vec<&str> {
        (0..self.ncols())
            .filter(|&j| self.matrix.column(j).iter().all(|&x| x == 0))
            .map(|j| self.molecules[j].as_str())
            .collect()
    }

    pub fn nrows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn to_f64(&self) -> DMatrix<f64> {
        self.matrix.map(|x| x as f64)
    }

    /// matrix * coefficients == 0, i.e. every element is conserved
    pub fn is_conserved(&self, coefficients: &[i64]) -> bool {
        if coefficients.len() != self.ncols() {
            return false;
        }
        (0..self.nrows()).all(|i| {
            (0..self.ncols())
                .map(|j| self.matrix[(i, j)] as i128 * coefficients[j] as i128)
                .sum::<i128>()
                == 0
        })
    }
}

/// Gauss-Jordan elimination to reduced row-echelon form; returns the reduced matrix and its rank
pub fn row_echelon(matrix: &DMatrix<f64>) -> (DMatrix<f64>, usize) {
    let mut a = matrix.clone();
    let (rows, cols) = a.shape();
    let mut row = 0;
    for col in 0..cols {
        if row == rows {
            break;
        }
        let Some(sel) = (row..rows).find(|&r| a[(r, col)].abs() > PIVOT_TOL) else {
            continue;
        };
        a.swap_rows(sel, row);
        let pivot = a[(row, col)];
        for c in col..cols {
            a[(row, c)] /= pivot;
        }
        for r in 0..rows {
            if r == row {
                continue;
            }
            let factor = a[(r, col)];
            if factor.abs() > PIVOT_TOL {
                for c in col..cols {
                    let sub = factor * a[(row, c)];
                    a[(r, c)] -= sub;
                }
            }
        }
        row += 1;
    }
    (a, row)
}

/// balanced coefficients, positionally matching the input molecules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balanced {
    pub reactants: Vec<u64>,
    pub products: Vec<u64>,
}

impl Balanced {
    pub fn coefficients(&self) -> Vec<u64> {
        self.reactants
            .iter()
            .chain(self.products.iter())
            .copied()
            .collect()
    }

    /// "2 H2 + 1 O2 → 2 H2O"
    pub fn format<S: AsRef<str>>(&self, reactants: &[S], products: &[S]) -> String {
        let side = |coefs: &[u64], mols: &[S]| {
            coefs
                .iter()
                .zip(mols.iter())
                .map(|(c, m)| format!("{} {}", c, m.as_ref()))
                .collect::<Vec<_>>()
                .join(" + ")
        };
        format!(
            "{} → {}",
            side(&self.reactants, reactants),
            side(&self.products, products)
        )
    }
}

fn gcd_u128(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

fn gcd_of(values: &[i128]) -> u128 {
    values
        .iter()
        .fold(0, |g, &x| gcd_u128(g, x.unsigned_abs()))
}

fn lcm_i128(a: i128, b: i128) -> Option<i128> {
    let (a, b) = (a.unsigned_abs(), b.unsigned_abs());
    if a == 0 || b == 0 {
        return Some(0);
    }
    let l = (a / gcd_u128(a, b)).checked_mul(b)?;
    i128::try_from(l).ok()
}

/// divides a vector by the gcd of its entries
fn reduce(values: &mut [i128]) {
    let g = gcd_of(values);
    if g > 1 {
        let g = g as i128;
        values.iter_mut().for_each(|x| *x /= g);
    }
}

/// fraction-free Gauss-Jordan elimination over integers, rows kept gcd-reduced.
/// Returns the pivot columns, None on overflow
fn integer_rref(a: &mut [Vec<i128>], ncols: usize) -> Option<Vec<usize>> {
    let nrows = a.len();
    let mut pivots = Vec::new();
    let mut r = 0;
    for c in 0..ncols {
        if r == nrows {
            break;
        }
        let Some(sel) = (r..nrows).find(|&i| a[i][c] != 0) else {
            continue;
        };
        a.swap(r, sel);
        for i in 0..nrows {
            if i == r || a[i][c] == 0 {
                continue;
            }
            let p = a[r][c];
            let f = a[i][c];
            for k in 0..ncols {
                let lhs = a[i][k].checked_mul(p)?;
                let rhs = a[r][k].checked_mul(f)?;
                a[i][k] = lhs.checked_sub(rhs)?;
            }
            reduce(&mut a[i]);
        }
        reduce(&mut a[r]);
        pivots.push(c);
        r += 1;
    }
    Some(pivots)
}

/// integer basis of the null space: one vector per free column, positive in that column
fn null_space_basis(a: &[Vec<i128>], pivots: &[usize], ncols: usize) -> Option<Vec<Vec<i128>>> {
    let free = (0..ncols).filter(|c| !pivots.contains(c));
    let mut basis = Vec::new();
    for f in free {
        // common multiple of the pivots keeps every pivot variable integer
        let mut l: i128 = 1;
        for (r, &pc) in pivots.iter().enumerate() {
            if a[r][f] != 0 {
                l = lcm_i128(l, a[r][pc])?;
            }
        }
        let mut v = vec![0i128; ncols];
        v[f] = l;
        for (r, &pc) in pivots.iter().enumerate() {
            if a[r][f] != 0 {
                v[pc] = a[r][f].checked_neg()?.checked_mul(l / a[r][pc])?;
            }
        }
        reduce(&mut v);
        basis.push(v);
    }
    Some(basis)
}

/// Smallest strictly positive integer vector spanned by the basis. Every basis vector is
/// positive in its own free column and zero in the others, so all weights must be positive
fn positive_combination(basis: &[Vec<i128>]) -> Option<Vec<i128>> {
    let ncols = basis.first()?.len();
    let mut weights = vec![1i128; basis.len()];
    let mut best: Option<(i128, Vec<i128>)> = None;
    loop {
        let mut v = vec![0i128; ncols];
        for (w, b) in weights.iter().zip(basis.iter()) {
            for (vi, bi) in v.iter_mut().zip(b.iter()) {
                *vi = vi.checked_add(w.checked_mul(*bi)?)?;
            }
        }
        if v.iter().all(|&x| x > 0) {
            reduce(&mut v);
            let total: i128 = v.iter().sum();
            if best.as_ref().is_none_or(|(t, _)| total < *t) {
                best = Some((total, v));
            }
        }
        // odometer over weights 1..=MAX_COMBINATION_WEIGHT
        let mut k = 0;
        loop {
            if k == weights.len() {
                return best.map(|(_, v)| v);
            }
            if weights[k] < MAX_COMBINATION_WEIGHT {
                weights[k] += 1;
                break;
            }
            weights[k] = 1;
            k += 1;
        }
    }
}

fn balance_exact(sm: &StoichMatrix) -> Option<Vec<i64>> {
    let ncols = sm.ncols();
    let mut a: Vec<Vec<i128>> = (0..sm.nrows())
        .map(|i| (0..ncols).map(|j| sm.matrix[(i, j)] as i128).collect())
        .collect();
    let pivots = integer_rref(&mut a, ncols)?;
    let basis = null_space_basis(&a, &pivots, ncols)?;
    debug!("null space of dimension {}: {:?}", basis.len(), basis);
    if basis.is_empty() || basis.len() > MAX_NULLITY {
        warn!("null space dimension {} is out of range", basis.len());
        return None;
    }
    let solution = positive_combination(&basis)?;
    solution.into_iter().map(|x| i64::try_from(x).ok()).collect()
}

fn gcd_i64(a: i64, b: i64) -> i64 {
    gcd_u128(a.unsigned_abs() as u128, b.unsigned_abs() as u128) as i64
}

/// Bounded-denominator rational approximation of every component, scaled by the lcm
/// of denominators and divided by the overall gcd
pub fn rationalize(values: &[f64], max_denominator: u64) -> Option<Vec<i64>> {
    const TOL: f64 = 1e-9;
    let mut fracs = Vec::with_capacity(values.len());
    for &v in values {
        if !v.is_finite() {
            return None;
        }
        let mut denom: u64 = 1;
        let mut numer = v;
        while (numer.round() - numer).abs() > TOL && denom < max_denominator {
            denom += 1;
            numer = v * denom as f64;
        }
        fracs.push((numer.round() as i64, denom as i64));
    }
    let mut scale: i64 = 1;
    for &(_, den) in fracs.iter() {
        scale = (scale / gcd_i64(scale, den)).checked_mul(den)?;
    }
    let mut ints = fracs
        .iter()
        .map(|&(num, den)| num.checked_mul(scale / den))
        .collect::<Option<Vec<i64>>>()?;
    let g = ints.iter().fold(0, |g, &x| gcd_i64(g, x));
    if g > 1 {
        ints.iter_mut().for_each(|x| *x /= g);
    }
    Some(ints)
}

fn balance_trial_scale(sm: &StoichMatrix, limit: usize, max_denominator: u64) -> Option<Vec<i64>> {
    let cols = sm.ncols();
    let a = sm.to_f64();
    let vars = cols - 1;
    let b = a.columns(0, vars).into_owned();
    let last: DVector<f64> = a.column(vars).into_owned();
    // least squares solution tolerates rank deficient systems
    let pinv = match b.pseudo_inverse(PIVOT_TOL) {
        Ok(p) => p,
        Err(e) => {
            warn!("pseudo inverse failed: {}", e);
            return None;
        }
    };
    for scale in 1..=limit {
        let y = last.clone() * (-(scale as f64));
        let v = &pinv * y;
        let mut candidate: Vec<f64> = v.iter().copied().collect();
        candidate.push(scale as f64);
        let Some(ints) = rationalize(&candidate, max_denominator) else {
            continue;
        };
        debug!("trial scale {}: candidate {:?}", scale, ints);
        if sm.is_conserved(&ints) && ints.iter().all(|&x| x > 0) {
            return Some(ints);
        }
    }
    None
}

/// balance with the exact method
pub fn balance_equation<S: AsRef<str>>(reactants: &[S], products: &[S]) -> CalcOutcome<Balanced> {
    balance_equation_with(reactants, products, &BalanceMethod::Exact)
}

/// Finds the smallest positive integer coefficients (gcd 1) conserving every element
pub fn balance_equation_with<S: AsRef<str>>(
    reactants: &[S],
    products: &[S],
    method: &BalanceMethod,
) -> CalcOutcome<Balanced> {
    if reactants.is_empty() || products.is_empty() {
        warn!("both sides of the equation must contain molecules");
        return Err(CalcError::BalanceFailed);
    }
    let sm = StoichMatrix::new(reactants, products)?;
    if sm.nrows() == 0 {
        warn!("no elements found in {:?}", sm.molecules);
        return Err(CalcError::BalanceFailed);
    }
    // a molecule without atoms would take any coefficient
    let empty = sm.empty_molecules();
    if !empty.is_empty() {
        warn!("molecules without atoms: {:?}", empty);
        return Err(CalcError::BalanceFailed);
    }
    let (_, rank) = row_echelon(&sm.to_f64());
    info!(
        "balancing {:?}: {} elements, {} molecules, rank {}",
        sm.molecules,
        sm.nrows(),
        sm.ncols(),
        rank
    );
    let solution = match method {
        BalanceMethod::Exact => balance_exact(&sm),
        BalanceMethod::TrialScale {
            limit,
            max_denominator,
        } => balance_trial_scale(&sm, *limit, *max_denominator),
    };
    let solution = solution
        .filter(|x| sm.is_conserved(x) && x.iter().all(|&c| c > 0))
        .ok_or(CalcError::BalanceFailed)?;
    let coefficients: Vec<u64> = solution.iter().map(|&x| x as u64).collect();
    let (lhs, rhs) = coefficients.split_at(sm.n_reactants);
    info!("balanced coefficients: {:?} -> {:?}", lhs, rhs);
    Ok(Balanced {
        reactants: lhs.to_vec(),
        products: rhs.to_vec(),
    })
}
