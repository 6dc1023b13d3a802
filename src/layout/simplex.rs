//! Dense two-phase simplex over exact rational arithmetic.
//!
//! Sized for the tiny programs built by the packer (tens of variables and
//! rows), where exactness matters more than speed : solutions are compared
//! for strict equality and must be bit-identical across runs. All variables
//! are nonnegative. Bland's pivoting rule is used in both phases, so the
//! iteration always terminates.

use std::cmp::Ordering;

/// Numeric failure inside the solver. Both variants indicate a broken model
/// or inputs far outside the supported range, and abort the whole layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Failure {
    Overflow,
    Unbounded,
}

/// Exact rational, kept reduced with a positive denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Ratio {
    num: i128,
    den: i128,
}

fn gcd(mut a: i128, mut b: i128) -> i128 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a.abs()
}

impl Ratio {
    pub(super) const ZERO: Ratio = Ratio { num: 0, den: 1 };

    pub(super) fn from_int(value: i64) -> Ratio {
        Ratio {
            num: i128::from(value),
            den: 1,
        }
    }

    fn new(num: i128, den: i128) -> Result<Ratio, Failure> {
        debug_assert_ne!(den, 0);
        let g = gcd(num, den);
        let (mut num, mut den) = (num / g, den / g);
        if den < 0 {
            num = num.checked_neg().ok_or(Failure::Overflow)?;
            den = den.checked_neg().ok_or(Failure::Overflow)?;
        }
        Ok(Ratio { num, den })
    }

    pub(super) fn add(self, rhs: Ratio) -> Result<Ratio, Failure> {
        let num = i128::checked_add(
            self.num.checked_mul(rhs.den).ok_or(Failure::Overflow)?,
            rhs.num.checked_mul(self.den).ok_or(Failure::Overflow)?,
        )
        .ok_or(Failure::Overflow)?;
        let den = self.den.checked_mul(rhs.den).ok_or(Failure::Overflow)?;
        Ratio::new(num, den)
    }

    pub(super) fn sub(self, rhs: Ratio) -> Result<Ratio, Failure> {
        self.add(Ratio {
            num: rhs.num.checked_neg().ok_or(Failure::Overflow)?,
            den: rhs.den,
        })
    }

    pub(super) fn mul(self, rhs: Ratio) -> Result<Ratio, Failure> {
        let num = self.num.checked_mul(rhs.num).ok_or(Failure::Overflow)?;
        let den = self.den.checked_mul(rhs.den).ok_or(Failure::Overflow)?;
        Ratio::new(num, den)
    }

    pub(super) fn div(self, rhs: Ratio) -> Result<Ratio, Failure> {
        debug_assert!(!rhs.is_zero());
        let num = self.num.checked_mul(rhs.den).ok_or(Failure::Overflow)?;
        let den = self.den.checked_mul(rhs.num).ok_or(Failure::Overflow)?;
        Ratio::new(num, den)
    }

    pub(super) fn is_zero(self) -> bool {
        self.num == 0
    }
    pub(super) fn is_negative(self) -> bool {
        self.num < 0
    }
    pub(super) fn is_positive(self) -> bool {
        self.num > 0
    }

    /// Comparison can overflow on extreme operands, like the other operations.
    pub(super) fn try_cmp(self, rhs: Ratio) -> Result<Ordering, Failure> {
        Ok(self.sub(rhs)?.num.cmp(&0))
    }

    /// Exact integer value, if the rational is one and fits an `i64`.
    pub(super) fn as_integer(self) -> Option<i64> {
        if self.den == 1 {
            i64::try_from(self.num).ok()
        } else {
            None
        }
    }
}

///////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Op {
    LessEq,
    GreaterEq,
    Eq,
}

/// One linear constraint `coeffs . x (op) rhs` over the structural variables.
#[derive(Debug, Clone)]
pub(super) struct Constraint {
    pub coeffs: Vec<i64>,
    pub op: Op,
    pub rhs: i64,
}

impl Constraint {
    pub(super) fn new(coeffs: Vec<i64>, op: Op, rhs: i64) -> Constraint {
        Constraint { coeffs, op, rhs }
    }
}

#[derive(Debug)]
pub(super) enum Outcome {
    /// Minimum value of the objective over the feasible set.
    Optimal(Ratio),
    Infeasible,
}

/// Minimize `objective . x` subject to `constraints` and `x >= 0`.
pub(super) fn minimize(
    nb_variables: usize,
    constraints: &[Constraint],
    objective: &[i64],
) -> Result<Outcome, Failure> {
    assert_eq!(objective.len(), nb_variables);
    let mut tableau = Tableau::build(nb_variables, constraints);
    match tableau.solve_phase1()? {
        Feasibility::Empty => return Ok(Outcome::Infeasible),
        Feasibility::Feasible => (),
    }
    let value = tableau.solve_phase2(objective)?;
    Ok(Outcome::Optimal(value))
}

///////////////////////////////////////////////////////////////////////////////

enum Feasibility {
    Feasible,
    Empty,
}

/// Canonical tableau : every row has a basic column forming a unit vector,
/// and all right-hand sides stay nonnegative. Column layout is
/// `[structural | slack | artificial]`, with the right-hand side held apart.
struct Tableau {
    nb_structural: usize,
    nb_columns: usize,
    artificial_start: usize,
    rows: Vec<Vec<Ratio>>,
    rhs: Vec<Ratio>,
    /// Column basic in each row.
    basis: Vec<usize>,
}

impl Tableau {
    fn build(nb_structural: usize, constraints: &[Constraint]) -> Tableau {
        let nb_rows = constraints.len();
        let nb_slack = constraints
            .iter()
            .filter(|c| c.op != Op::Eq)
            .count();
        let artificial_start = nb_structural + nb_slack;
        let nb_columns = artificial_start + nb_rows;

        let mut rows = Vec::with_capacity(nb_rows);
        let mut rhs = Vec::with_capacity(nb_rows);
        let mut basis = Vec::with_capacity(nb_rows);
        let mut next_slack = nb_structural;
        for (i, constraint) in constraints.iter().enumerate() {
            assert_eq!(constraint.coeffs.len(), nb_structural);
            let mut row = vec![Ratio::ZERO; nb_columns];
            // Flip the row if needed to keep the right-hand side nonnegative,
            // so that the artificial basis below is feasible.
            let flip = constraint.rhs < 0;
            let sign = if flip { -1 } else { 1 };
            for (j, &coeff) in constraint.coeffs.iter().enumerate() {
                row[j] = Ratio::from_int(coeff * sign);
            }
            match constraint.op {
                Op::Eq => (),
                Op::LessEq => {
                    row[next_slack] = Ratio::from_int(sign);
                    next_slack += 1;
                }
                Op::GreaterEq => {
                    row[next_slack] = Ratio::from_int(-sign);
                    next_slack += 1;
                }
            }
            row[artificial_start + i] = Ratio::from_int(1);
            rows.push(row);
            rhs.push(Ratio::from_int(constraint.rhs.abs()));
            basis.push(artificial_start + i);
        }
        Tableau {
            nb_structural,
            nb_columns,
            artificial_start,
            rows,
            rhs,
            basis,
        }
    }

    /// Reduced costs and objective value for the given full cost vector,
    /// priced against the current basis : `r = c - c_B . B^-1 A`.
    fn price_out(&self, costs: &[Ratio]) -> Result<(Vec<Ratio>, Ratio), Failure> {
        let mut reduced = costs.to_vec();
        let mut value = Ratio::ZERO;
        for (i, row) in self.rows.iter().enumerate() {
            let basic_cost = costs[self.basis[i]];
            if basic_cost.is_zero() {
                continue;
            }
            for j in 0..self.nb_columns {
                reduced[j] = reduced[j].sub(basic_cost.mul(row[j])?)?;
            }
            value = value.add(basic_cost.mul(self.rhs[i])?)?;
        }
        Ok((reduced, value))
    }

    fn pivot(&mut self, leaving_row: usize, entering: usize, reduced: &mut [Ratio]) -> Result<(), Failure> {
        let pivot = self.rows[leaving_row][entering];
        debug_assert!(!pivot.is_zero());
        for j in 0..self.nb_columns {
            self.rows[leaving_row][j] = self.rows[leaving_row][j].div(pivot)?;
        }
        self.rhs[leaving_row] = self.rhs[leaving_row].div(pivot)?;
        for i in 0..self.rows.len() {
            if i == leaving_row {
                continue;
            }
            let factor = self.rows[i][entering];
            if factor.is_zero() {
                continue;
            }
            for j in 0..self.nb_columns {
                let delta = factor.mul(self.rows[leaving_row][j])?;
                self.rows[i][j] = self.rows[i][j].sub(delta)?;
            }
            self.rhs[i] = self.rhs[i].sub(factor.mul(self.rhs[leaving_row])?)?;
        }
        let factor = reduced[entering];
        if !factor.is_zero() {
            for j in 0..self.nb_columns {
                let delta = factor.mul(self.rows[leaving_row][j])?;
                reduced[j] = reduced[j].sub(delta)?;
            }
        }
        self.basis[leaving_row] = entering;
        Ok(())
    }

    /// Run pivots until no reduced cost is negative (Bland's rule : smallest
    /// entering column index, leaving row by minimum ratio with smallest
    /// basic column as tie-break). `allowed` bounds the entering columns.
    fn optimize(&mut self, reduced: &mut [Ratio], allowed: usize) -> Result<(), Failure> {
        loop {
            let entering = match (0..allowed).find(|&j| reduced[j].is_negative()) {
                Some(j) => j,
                None => return Ok(()),
            };
            let mut leaving: Option<(usize, Ratio)> = None;
            for i in 0..self.rows.len() {
                if !self.rows[i][entering].is_positive() {
                    continue;
                }
                let ratio = self.rhs[i].div(self.rows[i][entering])?;
                let replace = match &leaving {
                    None => true,
                    Some((row, best)) => match ratio.try_cmp(*best)? {
                        Ordering::Less => true,
                        Ordering::Equal => self.basis[i] < self.basis[*row],
                        Ordering::Greater => false,
                    },
                };
                if replace {
                    leaving = Some((i, ratio));
                }
            }
            let (leaving_row, _) = leaving.ok_or(Failure::Unbounded)?;
            self.pivot(leaving_row, entering, reduced)?;
        }
    }

    /// Minimize the sum of artificial variables. On success the artificial
    /// columns are pivoted or dropped out of the problem entirely.
    fn solve_phase1(&mut self) -> Result<Feasibility, Failure> {
        let mut costs = vec![Ratio::ZERO; self.nb_columns];
        for j in self.artificial_start..self.nb_columns {
            costs[j] = Ratio::from_int(1);
        }
        let (mut reduced, _) = self.price_out(&costs)?;
        // Artificial columns may not re-enter once left.
        self.optimize(&mut reduced, self.artificial_start)?;
        let (_, value) = self.price_out(&costs)?;
        if value.is_positive() {
            return Ok(Feasibility::Empty);
        }
        // Pivot residual artificials out of the basis ; their value is zero,
        // so these pivots are degenerate and keep feasibility.
        for i in 0..self.rows.len() {
            if self.basis[i] < self.artificial_start {
                continue;
            }
            let replacement = (0..self.artificial_start).find(|&j| !self.rows[i][j].is_zero());
            if let Some(entering) = replacement {
                self.pivot(i, entering, &mut reduced)?;
            }
        }
        // Rows still basic in an artificial are all-zero over real columns :
        // redundant, drop them along with the artificial columns.
        let mut kept_rows = Vec::new();
        let mut kept_rhs = Vec::new();
        let mut kept_basis = Vec::new();
        for i in 0..self.rows.len() {
            if self.basis[i] >= self.artificial_start {
                continue;
            }
            let mut row = std::mem::take(&mut self.rows[i]);
            row.truncate(self.artificial_start);
            kept_rows.push(row);
            kept_rhs.push(self.rhs[i]);
            kept_basis.push(self.basis[i]);
        }
        self.rows = kept_rows;
        self.rhs = kept_rhs;
        self.basis = kept_basis;
        self.nb_columns = self.artificial_start;
        Ok(Feasibility::Feasible)
    }

    fn solve_phase2(&mut self, objective: &[i64]) -> Result<Ratio, Failure> {
        let mut costs = vec![Ratio::ZERO; self.nb_columns];
        for (j, &cost) in objective.iter().enumerate() {
            costs[j] = Ratio::from_int(cost);
        }
        let (mut reduced, _) = self.price_out(&costs)?;
        self.optimize(&mut reduced, self.nb_columns)?;
        let (_, value) = self.price_out(&costs)?;
        Ok(value)
    }
}

///////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn optimal(nb: usize, constraints: &[Constraint], objective: &[i64]) -> i64 {
        match minimize(nb, constraints, objective).expect("numeric failure") {
            Outcome::Optimal(value) => value.as_integer().expect("integral optimum"),
            Outcome::Infeasible => panic!("expected a feasible program"),
        }
    }

    fn infeasible(nb: usize, constraints: &[Constraint], objective: &[i64]) -> bool {
        matches!(
            minimize(nb, constraints, objective).expect("numeric failure"),
            Outcome::Infeasible
        )
    }

    #[test]
    fn ratio_arithmetic() {
        let half = Ratio::from_int(1).div(Ratio::from_int(2)).unwrap();
        let third = Ratio::from_int(1).div(Ratio::from_int(3)).unwrap();
        let sum = half.add(third).unwrap();
        assert_eq!(sum, Ratio::from_int(5).div(Ratio::from_int(6)).unwrap());
        assert_eq!(sum.as_integer(), None);
        assert_eq!(half.mul(Ratio::from_int(2)).unwrap(), Ratio::from_int(1));
        assert_eq!(half.try_cmp(third).unwrap(), Ordering::Greater);
        assert!(half.sub(half).unwrap().is_zero());
        // Negative denominators are normalized away.
        assert_eq!(Ratio::new(3, -6).unwrap(), Ratio::new(-1, 2).unwrap());
        assert!(Ratio::new(3, -6).unwrap().is_negative());
    }

    #[test]
    fn single_variable_bounds() {
        // min x, x >= 3
        let rows = [Constraint::new(vec![1], Op::GreaterEq, 3)];
        assert_eq!(optimal(1, &rows, &[1]), 3);
        // min -x, x <= 5 (x pushed to its upper bound)
        let rows = [Constraint::new(vec![1], Op::LessEq, 5)];
        assert_eq!(optimal(1, &rows, &[-1]), -5);
        // min x with no constraint other than x >= 0
        assert_eq!(optimal(1, &[], &[1]), 0);
    }

    #[test]
    fn detects_infeasibility() {
        let rows = [
            Constraint::new(vec![1], Op::GreaterEq, 3),
            Constraint::new(vec![1], Op::LessEq, 2),
        ];
        assert!(infeasible(1, &rows, &[1]));
        // Equality out of reach of x >= 0
        let rows = [Constraint::new(vec![1], Op::Eq, -2)];
        assert!(infeasible(1, &rows, &[1]));
    }

    #[test]
    fn detects_unboundedness() {
        // min -x with x free upwards
        let outcome = minimize(1, &[], &[-1]);
        assert_eq!(outcome.unwrap_err(), Failure::Unbounded);
    }

    #[test]
    fn equality_and_difference_constraints() {
        // Variables (x, y) : x + y = 10, x - y >= 2, min y -> (10, 0)
        let rows = [
            Constraint::new(vec![1, 1], Op::Eq, 10),
            Constraint::new(vec![1, -1], Op::GreaterEq, 2),
        ];
        assert_eq!(optimal(2, &rows, &[0, 1]), 0);
        // Same system, min x : y = 10 - x and x - y = 2x - 10 >= 2 -> x >= 6
        assert_eq!(optimal(2, &rows, &[1, 0]), 6);
    }

    #[test]
    fn absolute_value_gadget() {
        // Variables (u, v, d) : d >= u - v + 4, d >= v - u - 4, u = 0, v = 10.
        // min d is the distance |u - v + 4| = 6.
        let rows = [
            Constraint::new(vec![-1, 1, 1], Op::GreaterEq, 4),
            Constraint::new(vec![1, -1, 1], Op::GreaterEq, -4),
            Constraint::new(vec![1, 0, 0], Op::Eq, 0),
            Constraint::new(vec![0, 1, 0], Op::Eq, 10),
        ];
        assert_eq!(optimal(3, &rows, &[0, 0, 1]), 6);
    }

    #[test]
    fn packing_shaped_program() {
        // Two segments of lengths 30 and 20 on a line of width w <= 100 :
        // variables (w, x0, x1), x1 >= x0 + 30, w >= x1 + 20, w >= 60.
        let rows = [
            Constraint::new(vec![1, 0, 0], Op::LessEq, 100),
            Constraint::new(vec![1, 0, 0], Op::GreaterEq, 60),
            Constraint::new(vec![0, -1, 1], Op::GreaterEq, 30),
            Constraint::new(vec![1, 0, -1], Op::GreaterEq, 20),
        ];
        // Tightest packing gap
        assert_eq!(optimal(3, &rows, &[0, -1, 1]), 30);
        // Minimal width is the explicit lower bound
        assert_eq!(optimal(3, &rows, &[1, 0, 0]), 60);
        // Pushing x0 as far right as possible : x0 <= x1 - 30 <= w - 50
        assert_eq!(optimal(3, &rows, &[0, -1, 0]), -50);
    }

    #[test]
    fn redundant_equalities_are_harmless() {
        // The same equality twice must not confuse the basis cleanup.
        let rows = [
            Constraint::new(vec![1, 1], Op::Eq, 4),
            Constraint::new(vec![1, 1], Op::Eq, 4),
            Constraint::new(vec![1, -1], Op::Eq, 0),
        ];
        assert_eq!(optimal(2, &rows, &[1, 0]), 2);
        assert_eq!(optimal(2, &rows, &[-1, -1]), -4);
    }
}
