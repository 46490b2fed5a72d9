//! Geometric checks for computed layouts.
//!
//! The layout engine does not reposition cubes; these helpers only report
//! where a computed layout collides with itself or leaves the pallet.

use crate::model::{Cube, Pallet, Placement};
use crate::types::{Dimensional, EPSILON_GENERAL, Footprint};

/// Footprint a cube covers on the pallet when centred at `placement`.
pub fn footprint_of(cube: &Cube, placement: &Placement) -> Footprint {
    Footprint::around(*placement, cube.dimensions())
}

/// Returns every pair of indices `(i, j)` with `i < j` whose footprints overlap.
///
/// # Example
/// ```
/// use cube_store::geometry::find_overlaps;
/// use cube_store::types::Footprint;
///
/// let fps = [
///     Footprint::new(0.0, 0.0, 2.0, 2.0),
///     Footprint::new(1.0, 1.0, 3.0, 3.0),
///     Footprint::new(5.0, 5.0, 6.0, 6.0),
/// ];
/// assert_eq!(find_overlaps(&fps), vec![(0, 1)]);
/// ```
pub fn find_overlaps(footprints: &[Footprint]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for (i, a) in footprints.iter().enumerate() {
        for (j, b) in footprints.iter().enumerate().skip(i + 1) {
            if a.intersects(b, EPSILON_GENERAL) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// Returns the indices of footprints that extend beyond the pallet border.
pub fn outside_pallet(pallet: &Pallet, footprints: &[Footprint]) -> Vec<usize> {
    let surface = pallet.footprint();
    footprints
        .iter()
        .enumerate()
        .filter(|(_, fp)| !surface.contains(fp, EPSILON_GENERAL))
        .map(|(idx, _)| idx)
        .collect()
}

/// Smallest clearance between two footprints along the axis that separates them.
///
/// Returns 0.0 for overlapping or touching footprints.
pub fn clearance(a: &Footprint, b: &Footprint) -> f64 {
    let gap_x = (b.min_x - a.max_x).max(a.min_x - b.max_x);
    let gap_z = (b.min_z - a.max_z).max(a.min_z - b.max_z);
    gap_x.max(gap_z).max(0.0)
}
