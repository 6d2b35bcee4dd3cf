use crate::bounds::{BoundingBox, Direction, DIRECTIONS};
use crate::error::VolumeError;
use crate::polygon::Polygon;
use crate::vector::{approx_eq, EPSILON};

use super::{Surface, SurfaceProperties};

/// Floating point slack tolerated above a proportion of one before it is
/// reported as a geometry error.
pub const PROPORTION_SLACK: f64 = 1e-6;

/// Which faces of a grid cell are obstructed by an obstacle surface, and the
/// permeability of each obstructed face where it is nonzero.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TransferRestriction {
    restricted: [bool; 6],
    permeability: [Option<f64>; 6],
}

impl TransferRestriction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `direction` as restricted. The first surface to restrict a
    /// direction decides its permeability.
    pub fn restrict(&mut self, direction: Direction, permeability: f64) {
        let i = direction.index();
        if self.restricted[i] {
            return;
        }
        self.restricted[i] = true;
        if permeability > 0.0 {
            self.permeability[i] = Some(permeability);
        }
    }

    pub fn is_restricted(&self, direction: Direction) -> bool {
        self.restricted[direction.index()]
    }

    /// Permeability of a restricted direction, `None` if unrestricted or impermeable.
    pub fn permeability(&self, direction: Direction) -> Option<f64> {
        self.permeability[direction.index()]
    }

    pub fn restricted_directions(&self) -> impl Iterator<Item = Direction> + '_ {
        DIRECTIONS.iter().copied().filter(move |d| self.restricted[d.index()])
    }

    pub fn any(&self) -> bool {
        self.restricted.iter().any(|r| *r)
    }
}

/// Result of `coincident_proportion`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coincidence {
    /// Fraction of the cell volume inside the obstacle, in `[0, 1]`.
    pub proportion: f64,
    pub restriction: TransferRestriction,
}

/// Vertical prism view of an obstacle: a convex outline extruded between two depths.
pub(crate) struct Extrusion<'a> {
    pub polygon: &'a Polygon,
    pub top: f64,
    pub bottom: f64,
    pub properties: &'a SurfaceProperties,
    /// Whether cell edges may lie along the outline. A curved wall can never be
    /// coplanar with a cell face.
    pub allow_matched: bool,
}

/// Per side classification of the four vertical cell edges against the outline.
#[derive(Debug, Default)]
struct EdgeClasses {
    /// The outline cuts the cell edge, or runs along part of it.
    intersected: [bool; 4],
    /// The cell edge lies entirely along an outline edge.
    matched: [bool; 4],
}

pub(crate) fn coincident_proportion(shape: &Extrusion, cell: &BoundingBox<3>) -> Result<Coincidence, VolumeError> {
    if !cell.is_valid() {
        return Err(VolumeError::InvalidCell);
    }

    let mut restriction = TransferRestriction::new();
    let rect = cell.cross_section();
    let overlap_area = match rect.intersection(shape.polygon) {
        Some(overlap) => overlap.area(),
        None => 0.0,
    };
    if overlap_area <= EPSILON * EPSILON {
        return Ok(Coincidence { proportion: 0.0, restriction });
    }

    let complete_xy = approx_eq(overlap_area, rect.area()) || approx_eq(overlap_area, shape.polygon.area());

    let cell_height = cell.extent(2);
    let (cell_top, cell_bottom) = (cell.min[2], cell.max[2]);
    let depth = (cell_bottom.min(shape.bottom) - cell_top.max(shape.top)).max(0.0);
    let vertical_proportion = if depth > EPSILON { depth / cell_height } else { 0.0 };

    if vertical_proportion > 0.0 {
        let classes = classify_edges(cell, shape.polygon, shape.allow_matched);
        let side_permeability = shape.properties.permeability(Surface::Curved);
        for dir in &DIRECTIONS[..4] {
            let i = dir.index();
            let o = dir.opposite().index();
            let single_side = classes.intersected[i] && !classes.intersected[o];
            let matched = complete_xy && classes.matched[i] && !classes.matched[o];
            if single_side || matched {
                restriction.restrict(*dir, side_permeability);
            }
        }
    }

    restrict_vertical(shape, cell_top, cell_bottom, complete_xy, &mut restriction);

    let clipped_volume = overlap_area * vertical_proportion * cell_height;
    let proportion = clipped_volume / cell.volume();
    if proportion > 1.0 + PROPORTION_SLACK {
        return Err(VolumeError::ProportionOverflow { proportion });
    }
    Ok(Coincidence {
        proportion: proportion.min(1.0),
        restriction,
    })
}

/// Obstructions of the top and bottom cell faces by the horizontal surfaces.
fn restrict_vertical(
    shape: &Extrusion,
    cell_top: f64,
    cell_bottom: f64,
    complete_xy: bool,
    restriction: &mut TransferRestriction,
) {
    let top_permeability = shape.properties.permeability(Surface::Top);
    let bottom_permeability = shape.properties.permeability(Surface::Bottom);
    let strictly_within = |z: f64| z > cell_top + EPSILON && z < cell_bottom - EPSILON;

    // A horizontal surface passing through the cell.
    if strictly_within(shape.top) {
        if complete_xy {
            restriction.restrict(Direction::NegZ, top_permeability);
        }
        restriction.restrict(Direction::PosZ, top_permeability);
    }
    if strictly_within(shape.bottom) {
        restriction.restrict(Direction::NegZ, bottom_permeability);
        if complete_xy {
            restriction.restrict(Direction::PosZ, bottom_permeability);
        }
    }

    // A horizontal surface lying on a cell face, seen from inside the object.
    if approx_eq(shape.top, cell_top) && shape.bottom > cell_top + EPSILON {
        restriction.restrict(Direction::NegZ, top_permeability);
    }
    if approx_eq(shape.bottom, cell_bottom) && shape.top < cell_bottom - EPSILON {
        restriction.restrict(Direction::PosZ, bottom_permeability);
    }

    // The cell sits directly on top of, or directly beneath, the object.
    if approx_eq(shape.top, cell_bottom) {
        restriction.restrict(Direction::PosZ, top_permeability);
    }
    if approx_eq(shape.bottom, cell_top) {
        restriction.restrict(Direction::NegZ, bottom_permeability);
    }
}

/// Classifies the four vertical faces of `cell` (as edges of its outline)
/// against every edge of `polygon`.
fn classify_edges(cell: &BoundingBox<3>, polygon: &Polygon, allow_matched: bool) -> EdgeClasses {
    let (x0, y0, x1, y1) = (cell.min[0], cell.min[1], cell.max[0], cell.max[1]);
    // Each face: the fixed axis, its coordinate, and the varying range on the other axis.
    let faces = [
        (Direction::NegX, 0, x0, (y0, y1)),
        (Direction::PosX, 0, x1, (y0, y1)),
        (Direction::NegY, 1, y0, (x0, x1)),
        (Direction::PosY, 1, y1, (x0, x1)),
    ];

    let mut classes = EdgeClasses::default();
    for (dir, axis, fixed, (lo, hi)) in faces {
        let other = 1 - axis;
        for (a, b) in polygon.edges() {
            let da = a[axis] - fixed;
            let db = b[axis] - fixed;

            if (b[axis] - a[axis]).abs() <= EPSILON {
                // Parallel to the face: only a colinear edge interacts.
                if da.abs() > EPSILON {
                    continue;
                }
                let e_lo = a[other].min(b[other]);
                let e_hi = a[other].max(b[other]);
                let overlap = hi.min(e_hi) - lo.max(e_lo);
                if overlap <= EPSILON {
                    continue;
                }
                let covers = e_lo <= lo + EPSILON && e_hi >= hi - EPSILON;
                if covers && allow_matched {
                    classes.matched[dir.index()] = true;
                } else {
                    classes.intersected[dir.index()] = true;
                }
                continue;
            }

            // Crossing: the edge must reach the face line...
            if da * db > 0.0 && da.abs() > EPSILON && db.abs() > EPSILON {
                continue;
            }
            let t = da / (da - db);
            let s = a[other] + t * (b[other] - a[other]);
            // ...at a point strictly inside the face.
            if s > lo + EPSILON && s < hi - EPSILON {
                classes.intersected[dir.index()] = true;
            }
        }
    }
    classes
}
