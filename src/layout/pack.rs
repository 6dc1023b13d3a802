//! Search for an optimal screen placement.
//!
//! The search is in two stages. Sequence pairs enumerate every placement
//! template (relative directions between screens, no coordinates yet).
//! Templates passing the user relation filter are instantiated by
//! [`Packer`] : a small integer linear program whose lexicographically
//! minimal point gives concrete coordinates and a packing penalty. The
//! template with the lowest penalty wins.

use super::simplex::{self, Constraint, Op, Outcome, Ratio};
use super::{Error, RelationMatrix, Solution};
use crate::geometry::{Direction, Vec2d};
use std::collections::HashSet;

///////////////////////////////////////////////////////////////////////////////

/// Find the lexicographically next permutation (`std::next_permutation`).
/// Returns `false` and restores sorted order once the sequence wraps around.
fn next_permutation(values: &mut [usize]) -> bool {
    if values.len() < 2 {
        return false;
    }
    // Find the longest non-increasing suffix ; the element before it is the pivot.
    let mut i = values.len() - 1;
    while i > 0 && values[i - 1] >= values[i] {
        i -= 1;
    }
    if i == 0 {
        values.reverse();
        return false;
    }
    // Swap the pivot with the rightmost element greater than it, reverse the suffix.
    let mut j = values.len() - 1;
    while values[j] <= values[i - 1] {
        j -= 1;
    }
    values.swap(i - 1, j);
    values[i..].reverse();
    true
}

/// Placement template enumeration state : a pair of permutations of the
/// screen indexes. Relative order of two screens in the two permutations
/// encodes their relative direction, and stepping through all permutation
/// pairs visits every packing topology at least once.
pub(super) struct SequencePair {
    a: Vec<usize>,
    b: Vec<usize>,
}

impl SequencePair {
    pub fn new(nb_screens: usize) -> SequencePair {
        SequencePair {
            a: Vec::from_iter(0..nb_screens),
            b: Vec::from_iter(0..nb_screens),
        }
    }

    /// Step to the next pair, in lexicographic order over `(a, b)`.
    /// Returns `false` when both permutations have cycled back to identity.
    pub fn advance(&mut self) -> bool {
        next_permutation(&mut self.a) || next_permutation(&mut self.b)
    }

    /// Direction of `sa` relative to `sb` induced by the current pair.
    /// `sa` and `sb` must differ.
    pub fn ordering(&self, sa: usize, sb: usize) -> Direction {
        debug_assert_ne!(sa, sb);
        let left_diff = self.a[sb] as isize - self.a[sa] as isize;
        let right_diff = self.b[sb] as isize - self.b[sa] as isize;
        // The differences are never zero for distinct screens.
        match (left_diff > 0, right_diff > 0) {
            (true, true) => Direction::LeftOf,
            (true, false) => Direction::Above,
            (false, true) => Direction::Under,
            (false, false) => Direction::RightOf,
        }
    }
}

///////////////////////////////////////////////////////////////////////////////

/// Solution of one template instantiation.
struct Packed {
    /// Packing penalty : constrained-axis gaps plus cross-axis center distances.
    objective: i64,
    vscreen: Vec2d,
    positions: Vec<Vec2d>,
}

/// Integer linear program giving concrete coordinates for one template.
///
/// Variables are the virtual screen dimensions, the top-left corner of each
/// screen, and one distance helper per screen pair ; all nonnegative. The
/// solution is the lexicographically minimal point of the feasible set, in
/// variable order `[penalty, height, width, y.., x..]` so that the penalty
/// dominates and height is reduced before width.
struct Packer {
    nb_screens: usize,
    nb_variables: usize,
    constraints: Vec<Constraint>,
    objective: Vec<i64>,
}

impl Packer {
    // Variable indexes. All y coordinates come before all x coordinates.
    fn v_height(&self) -> usize {
        0
    }
    fn v_width(&self) -> usize {
        1
    }
    fn v_y(&self, screen: usize) -> usize {
        2 + screen
    }
    fn v_x(&self, screen: usize) -> usize {
        2 + self.nb_screens + screen
    }
    fn v_dist(&self, pair: usize) -> usize {
        2 + 2 * self.nb_screens + pair
    }

    fn new(vmin: Vec2d, vmax: Vec2d, sizes: &[Vec2d], template: &SequencePair) -> Packer {
        let n = sizes.len();
        let nb_pairs = (n * (n - 1)) / 2;
        let mut packer = Packer {
            nb_screens: n,
            nb_variables: 2 + 2 * n + nb_pairs,
            constraints: Vec::new(),
            objective: vec![0; 2 + 2 * n + nb_pairs],
        };
        let width = |s: usize| i64::from(sizes[s].x);
        let height = |s: usize| i64::from(sizes[s].y);
        let (v_width, v_height) = (packer.v_width(), packer.v_height());

        // Virtual screen boundaries
        packer.bound(v_width, i64::from(vmin.x), i64::from(vmax.x));
        packer.bound(v_height, i64::from(vmin.y), i64::from(vmax.y));

        // Screens inside the virtual screen (coordinates are nonnegative by construction)
        for s in 0..n {
            let (x, y) = (packer.v_x(s), packer.v_y(s));
            packer.offseted_less_than(x, width(s), v_width);
            packer.offseted_less_than(y, height(s), v_height);
        }

        // Template ordering constraints, and the packing penalty. The penalty
        // counts, for every pair, the coordinate gap along the constrained
        // axis plus the distance between screen centers on the other axis.
        let mut pair = 0;
        for sa in 0..n {
            for sb in 0..sa {
                let (xa, ya) = (packer.v_x(sa), packer.v_y(sa));
                let (xb, yb) = (packer.v_x(sb), packer.v_y(sb));
                match template.ordering(sa, sb) {
                    Direction::LeftOf => {
                        packer.offseted_less_than(xa, width(sa), xb);
                        packer.objective[xa] -= 1;
                        packer.objective[xb] += 1;
                        packer.center_distance(pair, ya, height(sa), yb, height(sb));
                    }
                    Direction::RightOf => {
                        packer.offseted_less_than(xb, width(sb), xa);
                        packer.objective[xb] -= 1;
                        packer.objective[xa] += 1;
                        packer.center_distance(pair, yb, height(sb), ya, height(sa));
                    }
                    Direction::Above => {
                        packer.offseted_less_than(ya, height(sa), yb);
                        packer.objective[ya] -= 1;
                        packer.objective[yb] += 1;
                        packer.center_distance(pair, xa, width(sa), xb, width(sb));
                    }
                    Direction::Under => {
                        packer.offseted_less_than(yb, height(sb), ya);
                        packer.objective[yb] -= 1;
                        packer.objective[ya] += 1;
                        packer.center_distance(pair, xb, width(sb), xa, width(sa));
                    }
                }
                let dist = packer.v_dist(pair);
                packer.objective[dist] += 1;
                pair += 1;
            }
        }
        packer
    }

    /// `min <= variable <= max`
    fn bound(&mut self, variable: usize, min: i64, max: i64) {
        let mut coeffs = vec![0; self.nb_variables];
        coeffs[variable] = 1;
        self.constraints
            .push(Constraint::new(coeffs.clone(), Op::GreaterEq, min));
        self.constraints.push(Constraint::new(coeffs, Op::LessEq, max));
    }

    /// `variable + offset <= other`
    fn offseted_less_than(&mut self, variable: usize, offset: i64, other: usize) {
        let mut coeffs = vec![0; self.nb_variables];
        coeffs[variable] = -1;
        coeffs[other] = 1;
        self.constraints
            .push(Constraint::new(coeffs, Op::GreaterEq, offset));
    }

    /// Make distance helper `pair` equal (once minimized) to the distance
    /// between the centers of two screen extents : `u + u_size/2` and
    /// `v + v_size/2`. Encoded as `{ u - v + delta <= d, v - u - delta <= d }`
    /// with `delta` the half size difference, rounded towards zero.
    fn center_distance(&mut self, pair: usize, u: usize, u_size: i64, v: usize, v_size: i64) {
        let delta = (u_size - v_size) / 2;
        let d = self.v_dist(pair);
        let mut coeffs = vec![0; self.nb_variables];
        coeffs[u] = -1;
        coeffs[v] = 1;
        coeffs[d] = 1;
        self.constraints
            .push(Constraint::new(coeffs, Op::GreaterEq, delta));
        let mut coeffs = vec![0; self.nb_variables];
        coeffs[u] = 1;
        coeffs[v] = -1;
        coeffs[d] = 1;
        self.constraints
            .push(Constraint::new(coeffs, Op::GreaterEq, -delta));
    }

    /// Lexicographically minimal feasible point : minimize the penalty, then
    /// with the penalty pinned minimize the height, the width, and each
    /// coordinate in variable order, pinning every optimum in turn.
    fn solve(mut self) -> Result<Option<Packed>, Error> {
        let penalty_row = self.objective.clone();
        let objective = match self.minimize_step(&penalty_row)? {
            None => return Ok(None),
            Some(value) => value,
        };
        let mut order = vec![self.v_height(), self.v_width()];
        order.extend((0..self.nb_screens).map(|s| self.v_y(s)));
        order.extend((0..self.nb_screens).map(|s| self.v_x(s)));
        let mut coordinates = Vec::with_capacity(order.len());
        for variable in order {
            let mut unit = vec![0; self.nb_variables];
            unit[variable] = 1;
            let value = self
                .minimize_step(&unit)?
                .ok_or(Error::Internal("lexicographic refinement lost feasibility"))?;
            coordinates.push(value);
        }
        let n = self.nb_screens;
        let vscreen = Vec2d::new(to_coord(coordinates[1])?, to_coord(coordinates[0])?);
        let positions = (0..n)
            .map(|s| -> Result<Vec2d, Error> {
                Ok(Vec2d::new(
                    to_coord(coordinates[2 + n + s])?,
                    to_coord(coordinates[2 + s])?,
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(Packed {
            objective,
            vscreen,
            positions,
        }))
    }

    /// Minimize one objective over the current constraints, then pin the
    /// optimum with an equality so later steps cannot degrade it.
    /// `None` means the constraints admit no solution at all.
    fn minimize_step(&mut self, objective: &[i64]) -> Result<Option<i64>, Error> {
        let outcome = simplex::minimize(self.nb_variables, &self.constraints, objective)
            .map_err(failure_error)?;
        match outcome {
            Outcome::Infeasible => Ok(None),
            Outcome::Optimal(value) => {
                let value = integer_value(value)?;
                self.constraints
                    .push(Constraint::new(objective.to_vec(), Op::Eq, value));
                Ok(Some(value))
            }
        }
    }
}

fn failure_error(failure: simplex::Failure) -> Error {
    match failure {
        simplex::Failure::Overflow => Error::Internal("numeric overflow while solving"),
        simplex::Failure::Unbounded => Error::Internal("unbounded placement program"),
    }
}

/// The feasible sets built above only have integer extreme points, so every
/// optimum must come out integral ; anything else is a solver defect.
fn integer_value(value: Ratio) -> Result<i64, Error> {
    value
        .as_integer()
        .ok_or(Error::Internal("expected an integer optimum"))
}

fn to_coord(value: i64) -> Result<i32, Error> {
    i32::try_from(value).map_err(|_| Error::Internal("coordinate does not fit output range"))
}

///////////////////////////////////////////////////////////////////////////////

/// Is the template compatible with every user supplied relation ?
fn relations_allow(relations: &RelationMatrix, template: &SequencePair) -> bool {
    let n = relations.size();
    for sa in 0..n {
        for sb in 0..sa {
            match relations.get(sa, sb) {
                None => (),
                Some(direction) => {
                    if direction != template.ordering(sa, sb) {
                        return false;
                    }
                }
            }
        }
    }
    true
}

/// Direction of every `sa > sb` pair, in fixed order. Distinct sequence
/// pairs inducing equal keys build identical programs, so only the first
/// needs to be packed.
fn template_key(template: &SequencePair, nb_screens: usize) -> Vec<Direction> {
    let mut key = Vec::with_capacity((nb_screens * (nb_screens - 1)) / 2);
    for sa in 0..nb_screens {
        for sb in 0..sa {
            key.push(template.ordering(sa, sb));
        }
    }
    key
}

/// Enumerate templates, pack the compatible ones, and keep the best result.
/// Lower penalty wins ; on equal penalty the smaller virtual screen
/// (lexicographic, width first) wins ; remaining ties keep the earliest
/// enumerated template, making the outcome deterministic.
pub(super) fn optimize(
    vmin: Vec2d,
    vmax: Vec2d,
    sizes: &[Vec2d],
    relations: &RelationMatrix,
) -> Result<Option<Solution>, Error> {
    let mut sequence_pair = SequencePair::new(sizes.len());
    let mut packed_templates = HashSet::new();
    let mut best: Option<Packed> = None;
    loop {
        if relations_allow(relations, &sequence_pair) {
            let key = template_key(&sequence_pair, sizes.len());
            if packed_templates.insert(key) {
                let packer = Packer::new(vmin, vmax, sizes, &sequence_pair);
                if let Some(candidate) = packer.solve()? {
                    let improves = match &best {
                        None => true,
                        Some(best) => {
                            candidate.objective < best.objective
                                || (candidate.objective == best.objective
                                    && candidate.vscreen < best.vscreen)
                        }
                    };
                    if improves {
                        log::debug!(
                            "packing: new best, penalty {} in virtual screen {}",
                            candidate.objective,
                            candidate.vscreen
                        );
                        best = Some(candidate);
                    }
                }
            }
        }
        if !sequence_pair.advance() {
            break;
        }
    }
    Ok(best.map(|packed| Solution {
        vscreen_size: packed.vscreen,
        positions: packed.positions,
    }))
}

///////////////////////////////////////////////////////////////////////////////
