use crate::geometry::{Direction, Vec2d};
use std::cmp::Ordering;

/// Compute screen positions optimization problem code (lengthy).
mod pack;
/// Exact linear program support for [`pack`].
mod simplex;

///////////////////////////////////////////////////////////////////////////////

/// Stores the user-supplied directional relations between screens.
/// Semantically a symmetric `Map<(usize,usize), Option<Direction>>` with
/// `get(a, b) == get(b, a).inverse()` and a [`None`] diagonal.
/// Relations are only stored for `lhs < rhs` and inverted on access if necessary.
/// Invalid indexes will trigger a [`panic!`].
#[derive(Debug, Clone)]
pub struct RelationMatrix {
    size: usize,
    /// `size * (size - 1) / 2` relations
    array: Vec<Option<Direction>>,
}

/// Buffer size for triangular matrix : `n * (n-1) / 2`.
fn buffer_size(nb_screens: usize) -> usize {
    (nb_screens * nb_screens.saturating_sub(1)) / 2
}

impl RelationMatrix {
    /// Create a matrix with `size` screens and no relations.
    pub fn new(size: usize) -> RelationMatrix {
        RelationMatrix {
            size,
            array: vec![None; buffer_size(size)],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Compute linearized index for `0 <= low < high < size`.
    /// Linearized layout : `[(0,1),(0-1,2),(0-2,3),(0-3,4),...]`.
    fn linearized_index(&self, low: usize, high: usize) -> usize {
        assert!(low < high, "expected {} < {}", low, high);
        assert!(high < self.size);
        let high_offset = (high * (high - 1)) / 2; // 0, 1, 3, 6, ...
        high_offset + low
    }

    /// Relation of `lhs` with respect to `rhs`.
    pub fn get(&self, lhs: usize, rhs: usize) -> Option<Direction> {
        match Ord::cmp(&lhs, &rhs) {
            Ordering::Less => self.array[self.linearized_index(lhs, rhs)],
            Ordering::Greater => self.array[self.linearized_index(rhs, lhs)].map(Direction::inverse),
            Ordering::Equal => None,
        }
    }

    /// Set relation of `lhs` with respect to `rhs` ; the symmetric entry is kept coherent.
    /// Setting a relation of a screen with itself is ignored.
    pub fn set(&mut self, lhs: usize, rhs: usize, relation: Option<Direction>) {
        match Ord::cmp(&lhs, &rhs) {
            Ordering::Less => {
                let index = self.linearized_index(lhs, rhs);
                self.array[index] = relation
            }
            Ordering::Greater => {
                let index = self.linearized_index(rhs, lhs);
                self.array[index] = relation.map(Direction::inverse)
            }
            Ordering::Equal => (),
        }
    }

    /// Check if the relations connect all screens together.
    /// An unconnected matrix is still valid solver input, but the resulting
    /// placement is mostly decided by the packing objective alone.
    pub fn is_single_connected_component(&self) -> bool {
        // Union find structure with indexes : map[0..size] -> 0..size
        fn get_representative(map: &[usize], i: usize) -> usize {
            let mut result = i;
            loop {
                let repr = map[result];
                if repr == result {
                    return result;
                }
                result = repr
            }
        }
        let mut representatives = Vec::from_iter(0..self.size);
        // Start with all screens as singular components. Merge them every time there is a relation.
        for rhs in 1..self.size {
            for lhs in 0..rhs {
                if self.get(lhs, rhs).is_some() {
                    // Merge connected components towards min index.
                    let lhs = get_representative(&representatives, lhs);
                    let rhs = get_representative(&representatives, rhs);
                    representatives[std::cmp::max(lhs, rhs)] = std::cmp::min(lhs, rhs)
                }
            }
        }
        (0..self.size).all(|screen| get_representative(&representatives, screen) == 0)
    }
}

///////////////////////////////////////////////////////////////////////////////

/// Reasons for [`compute_layout`] to give up. Infeasibility is not one of
/// them : it is reported as `Ok(None)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A precondition on the inputs does not hold.
    InvalidInput(&'static str),
    /// The solver failed in a way that cannot be recovered (numeric overflow, lost feasibility).
    Internal(&'static str),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::InvalidInput(reason) => write!(f, "invalid input: {}", reason),
            Error::Internal(reason) => write!(f, "internal solver error: {}", reason),
        }
    }
}

impl std::error::Error for Error {}

/// A successful placement of all screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    /// Chosen virtual screen dimensions, within the requested bounds.
    pub vscreen_size: Vec2d,
    /// Top-left corner of each screen, indexed like the input sizes.
    /// Origin is the virtual screen top-left, `y` downwards.
    pub positions: Vec<Vec2d>,
}

/// Compute an optimal placement of screens of the given `sizes` inside a
/// virtual screen of dimensions within `[vscreen_min, vscreen_max]`,
/// honoring the directional `relations`.
///
/// Placements never overlap and are chosen to minimize a packing penalty :
/// the sum of coordinate gaps along each constrained axis, plus the sum of
/// center distances along the other axis for each pair of screens. Among
/// equal penalties the smallest virtual screen wins (width compared before
/// height), and further ties keep the first candidate found.
///
/// Returns `Ok(None)` when no placement fits the bounds and relations.
pub fn compute_layout(
    vscreen_min: Vec2d,
    vscreen_max: Vec2d,
    sizes: &[Vec2d],
    relations: &RelationMatrix,
) -> Result<Option<Solution>, Error> {
    if sizes.is_empty() {
        return Err(Error::InvalidInput("at least one screen is required"));
    }
    if relations.size() != sizes.len() {
        return Err(Error::InvalidInput(
            "relation matrix size must match the number of screens",
        ));
    }
    if sizes.iter().any(|size| size.x <= 0 || size.y <= 0) {
        return Err(Error::InvalidInput("screen sizes must be positive"));
    }
    let bounds_ordered = 0 <= vscreen_min.x
        && vscreen_min.x <= vscreen_max.x
        && 0 <= vscreen_min.y
        && vscreen_min.y <= vscreen_max.y;
    if !bounds_ordered {
        return Err(Error::InvalidInput(
            "virtual screen bounds must satisfy 0 <= min <= max",
        ));
    }
    let best = pack::optimize(vscreen_min, vscreen_max, sizes, relations)?;
    match &best {
        Some(solution) => log::debug!(
            "layout: selected virtual screen {} for {} screens",
            solution.vscreen_size,
            sizes.len()
        ),
        None => log::debug!("layout: no feasible placement for {} screens", sizes.len()),
    }
    Ok(best)
}

///////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
#[test]
fn test_relation_matrix_basic() {
    // Check buffer size
    assert_eq!(buffer_size(0), 0);
    assert_eq!(buffer_size(1), 0);
    assert_eq!(buffer_size(2), 1);
    assert_eq!(buffer_size(3), 3);
    // Basic ops
    let size = 10;
    let mut matrix = RelationMatrix::new(size);
    // Check linearization
    {
        let mut manual_offset = 0;
        for n in 1..size {
            for m in 0..n {
                assert_eq!(matrix.linearized_index(m, n), manual_offset);
                manual_offset += 1;
            }
        }
        assert_eq!(manual_offset, matrix.array.len())
    }
    // Sanity check for store/load logic
    matrix.set(2, 3, Some(Direction::LeftOf));
    assert_eq!(matrix.get(2, 3), Some(Direction::LeftOf));
    assert_eq!(matrix.get(3, 2), Some(Direction::RightOf));
    matrix.set(3, 2, Some(Direction::Above));
    assert_eq!(matrix.get(2, 3), Some(Direction::Under));
    // Diagonal is always empty
    matrix.set(4, 4, Some(Direction::LeftOf));
    assert_eq!(matrix.get(4, 4), None);
}

#[cfg(test)]
#[test]
fn test_relation_matrix_connexity() {
    fn check(n: usize, is_connex: bool, relations: &[(usize, usize)]) {
        let mut matrix = RelationMatrix::new(n);
        for (i, j) in relations {
            // direction itself does not matter
            matrix.set(*i, *j, Some(Direction::LeftOf))
        }
        assert!(
            matrix.is_single_connected_component() == is_connex,
            "case: n={} rels={:?}",
            n,
            relations
        )
    }
    check(1, true, &[]);

    check(2, false, &[]);
    check(2, true, &[(0, 1)]);

    check(3, false, &[]);
    check(3, false, &[(0, 1)]);
    check(3, false, &[(0, 2)]);
    check(3, false, &[(1, 2)]);
    check(3, true, &[(1, 2), (0, 1)]);
    check(3, true, &[(0, 2), (0, 1)]);
    check(3, true, &[(0, 1), (1, 2), (0, 2)]);

    check(4, false, &[(0, 1), (1, 2), (0, 2)]);
    check(4, false, &[(0, 1), (2, 3)]);
    check(4, true, &[(0, 3), (1, 2), (0, 2)]);
    check(4, true, &[(0, 1), (1, 2), (2, 3)]);

    check(5, false, &[(0, 1), (1, 2), (2, 1), (3, 4)]);
    check(5, true, &[(0, 4), (4, 2), (2, 1), (1, 3)]);
}

#[cfg(test)]
#[test]
fn test_input_validation() {
    let size = Vec2d::new(800, 600);
    let bound = Vec2d::new(1000, 1000);
    let zero = Vec2d::new(0, 0);
    // No screens
    assert_eq!(
        compute_layout(zero, bound, &[], &RelationMatrix::new(0)),
        Err(Error::InvalidInput("at least one screen is required"))
    );
    // Matrix size mismatch
    assert!(matches!(
        compute_layout(zero, bound, &[size], &RelationMatrix::new(2)),
        Err(Error::InvalidInput(_))
    ));
    // Non-positive screen size
    assert!(matches!(
        compute_layout(zero, bound, &[Vec2d::new(800, 0)], &RelationMatrix::new(1)),
        Err(Error::InvalidInput(_))
    ));
    // Inverted bounds
    assert!(matches!(
        compute_layout(bound, zero, &[size], &RelationMatrix::new(1)),
        Err(Error::InvalidInput(_))
    ));
    // Negative min bound
    assert!(matches!(
        compute_layout(Vec2d::new(-1, 0), bound, &[size], &RelationMatrix::new(1)),
        Err(Error::InvalidInput(_))
    ));
}

#[cfg(test)]
mod layout_tests {
    use super::*;
    use crate::geometry::Rect;

    fn rects(solution: &Solution, sizes: &[Vec2d]) -> Vec<Rect> {
        Iterator::zip(solution.positions.iter(), sizes.iter())
            .map(|(pos, size)| Rect::new(*pos, *size))
            .collect()
    }

    /// Invariants that every successful layout must satisfy.
    fn check_solution(
        solution: &Solution,
        vmin: Vec2d,
        vmax: Vec2d,
        sizes: &[Vec2d],
        relations: &RelationMatrix,
    ) {
        let vscreen = solution.vscreen_size;
        assert!(vmin.x <= vscreen.x && vscreen.x <= vmax.x);
        assert!(vmin.y <= vscreen.y && vscreen.y <= vmax.y);
        let rects = rects(solution, sizes);
        for (i, rect) in rects.iter().enumerate() {
            // Containment
            assert!(rect.top_left.x >= 0 && rect.top_left.y >= 0, "screen {}", i);
            let corner = rect.bottom_right();
            assert!(corner.x <= vscreen.x && corner.y <= vscreen.y, "screen {}", i);
            // Non overlap
            for (j, other) in rects.iter().enumerate().take(i) {
                assert!(!rect.overlaps(other), "screens {} and {}", i, j);
            }
        }
        // Constraint compliance
        for sa in 0..sizes.len() {
            for sb in 0..sa {
                match relations.get(sa, sb) {
                    None => (),
                    Some(Direction::LeftOf) => {
                        assert!(rects[sa].bottom_right().x <= rects[sb].top_left.x)
                    }
                    Some(Direction::RightOf) => {
                        assert!(rects[sb].bottom_right().x <= rects[sa].top_left.x)
                    }
                    Some(Direction::Above) => {
                        assert!(rects[sa].bottom_right().y <= rects[sb].top_left.y)
                    }
                    Some(Direction::Under) => {
                        assert!(rects[sb].bottom_right().y <= rects[sa].top_left.y)
                    }
                }
            }
        }
    }

    fn layout_checked(
        vmin: Vec2d,
        vmax: Vec2d,
        sizes: &[Vec2d],
        relations: &RelationMatrix,
    ) -> Solution {
        let solution = compute_layout(vmin, vmax, sizes, relations)
            .expect("solver error")
            .expect("expected a feasible layout");
        check_solution(&solution, vmin, vmax, sizes, relations);
        solution
    }

    #[test]
    fn single_screen() {
        let sizes = [Vec2d::new(800, 600)];
        let solution = layout_checked(
            Vec2d::new(0, 0),
            Vec2d::new(1000, 1000),
            &sizes,
            &RelationMatrix::new(1),
        );
        assert_eq!(solution.vscreen_size, Vec2d::new(800, 600));
        assert_eq!(solution.positions, vec![Vec2d::new(0, 0)]);
    }

    #[test]
    fn single_screen_min_bound() {
        // The virtual screen is padded up to the minimum bound.
        let sizes = [Vec2d::new(800, 600)];
        let solution = layout_checked(
            Vec2d::new(1024, 640),
            Vec2d::new(2000, 2000),
            &sizes,
            &RelationMatrix::new(1),
        );
        assert_eq!(solution.vscreen_size, Vec2d::new(1024, 640));
        assert_eq!(solution.positions, vec![Vec2d::new(0, 0)]);
    }

    #[test]
    fn two_screens_left_of() {
        // The smaller screen ends up centered vertically against the bigger one.
        let sizes = [Vec2d::new(1920, 1080), Vec2d::new(1280, 1024)];
        let mut relations = RelationMatrix::new(2);
        relations.set(0, 1, Some(Direction::LeftOf));
        let solution = layout_checked(
            Vec2d::new(0, 0),
            Vec2d::new(4000, 2000),
            &sizes,
            &relations,
        );
        assert_eq!(solution.vscreen_size, Vec2d::new(3200, 1080));
        assert_eq!(
            solution.positions,
            vec![Vec2d::new(0, 0), Vec2d::new(1920, 28)]
        );
    }

    #[test]
    fn two_screens_above() {
        let sizes = [Vec2d::new(1920, 1080), Vec2d::new(1920, 1080)];
        let mut relations = RelationMatrix::new(2);
        relations.set(0, 1, Some(Direction::Above));
        let solution = layout_checked(
            Vec2d::new(0, 0),
            Vec2d::new(4000, 4000),
            &sizes,
            &relations,
        );
        assert_eq!(solution.vscreen_size, Vec2d::new(1920, 2160));
        assert_eq!(
            solution.positions,
            vec![Vec2d::new(0, 0), Vec2d::new(0, 1080)]
        );
    }

    #[test]
    fn three_screens_in_a_row() {
        let size = Vec2d::new(1920, 1080);
        let sizes = [size, size, size];
        let mut relations = RelationMatrix::new(3);
        relations.set(0, 1, Some(Direction::LeftOf));
        relations.set(1, 2, Some(Direction::LeftOf));
        let solution = layout_checked(
            Vec2d::new(0, 0),
            Vec2d::new(10000, 4000),
            &sizes,
            &relations,
        );
        assert_eq!(solution.vscreen_size, Vec2d::new(5760, 1080));
        assert_eq!(
            solution.positions,
            vec![Vec2d::new(0, 0), Vec2d::new(1920, 0), Vec2d::new(3840, 0)]
        );
    }

    #[test]
    fn row_forced_by_tight_bounds() {
        // Maximum bounds leave exactly the space for a single row. With no
        // relation given, the gap penalty (the left screen's width when packed
        // tight) puts the smaller screen on the left.
        let sizes = [Vec2d::new(1920, 1080), Vec2d::new(1280, 1024)];
        let solution = layout_checked(
            Vec2d::new(0, 0),
            Vec2d::new(3200, 1080),
            &sizes,
            &RelationMatrix::new(2),
        );
        assert_eq!(solution.vscreen_size, Vec2d::new(3200, 1080));
        assert_eq!(
            solution.positions,
            vec![Vec2d::new(1280, 0), Vec2d::new(0, 28)]
        );
    }

    #[test]
    fn infeasible_bounds() {
        let sizes = [Vec2d::new(1920, 1080), Vec2d::new(1920, 1080)];
        let mut relations = RelationMatrix::new(2);
        relations.set(0, 1, Some(Direction::LeftOf));
        let result = compute_layout(
            Vec2d::new(0, 0),
            Vec2d::new(3000, 2000),
            &sizes,
            &relations,
        );
        assert_eq!(result, Ok(None));
    }

    #[test]
    fn free_orientation_is_deterministic() {
        // Two identical unconstrained screens : both stacked orientations tie on
        // the packing penalty, the vertical one wins on virtual screen size
        // (width compared first), and among the two vertical candidates the
        // first enumerated is kept. This choice is part of the contract.
        let sizes = [Vec2d::new(1000, 1000), Vec2d::new(1000, 1000)];
        let solution = layout_checked(
            Vec2d::new(0, 0),
            Vec2d::new(3000, 3000),
            &sizes,
            &RelationMatrix::new(2),
        );
        assert_eq!(solution.vscreen_size, Vec2d::new(1000, 2000));
        assert_eq!(
            solution.positions,
            vec![Vec2d::new(0, 1000), Vec2d::new(0, 0)]
        );
    }

    #[test]
    fn index_permutation_symmetry() {
        // Swapping screen indexes (and relations accordingly) permutes the output.
        let sizes = [Vec2d::new(1920, 1080), Vec2d::new(1280, 1024)];
        let mut relations = RelationMatrix::new(2);
        relations.set(0, 1, Some(Direction::LeftOf));
        let solution = layout_checked(
            Vec2d::new(0, 0),
            Vec2d::new(4000, 2000),
            &sizes,
            &relations,
        );

        let swapped_sizes = [sizes[1], sizes[0]];
        let mut swapped_relations = RelationMatrix::new(2);
        swapped_relations.set(1, 0, Some(Direction::LeftOf));
        let swapped = layout_checked(
            Vec2d::new(0, 0),
            Vec2d::new(4000, 2000),
            &swapped_sizes,
            &swapped_relations,
        );
        assert_eq!(swapped.vscreen_size, solution.vscreen_size);
        assert_eq!(swapped.positions[0], solution.positions[1]);
        assert_eq!(swapped.positions[1], solution.positions[0]);
    }

    #[test]
    fn rerun_with_materialized_relations_is_identical() {
        // Derive relations back from a solved placement, then solve again with
        // them added : the placement must not change.
        let sizes = [
            Vec2d::new(1920, 1080),
            Vec2d::new(1280, 1024),
            Vec2d::new(1920, 1080),
        ];
        let mut relations = RelationMatrix::new(3);
        relations.set(0, 1, Some(Direction::LeftOf));
        relations.set(2, 0, Some(Direction::Above));
        let vmin = Vec2d::new(0, 0);
        let vmax = Vec2d::new(8000, 8000);
        let solution = layout_checked(vmin, vmax, &sizes, &relations);

        let mut materialized = relations.clone();
        let rects = rects(&solution, &sizes);
        for sa in 0..sizes.len() {
            for sb in 0..sa {
                if let Some(direction) = rects[sa].adjacent_direction(&rects[sb]) {
                    materialized.set(sa, sb, Some(direction));
                }
            }
        }
        let rerun = layout_checked(vmin, vmax, &sizes, &materialized);
        assert_eq!(rerun, solution);
    }
}
