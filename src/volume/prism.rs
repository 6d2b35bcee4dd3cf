use log::debug;

use super::coincidence::{self, Coincidence, Extrusion};
use super::sampling::{clamp_with_margin, outside_range};
use super::{GeometryVisitor, Intersection, Surface, SurfaceProperties, VolumeGeometry};
use crate::bounds::{BoundingBox, Direction};
use crate::error::VolumeError;
use crate::polygon::Polygon;
use crate::vector::{length, sub, EPSILON};

/// An axis-aligned rectangular obstacle, such as a barrier plate or a box-shaped pot.
///
/// `min` holds the left, front and top coordinates, `max` the right, back and
/// bottom ones (z grows with depth).
#[derive(Debug)]
pub struct BoundingRectangularPrism {
    bounds: BoundingBox<3>,
    cross_section: Polygon,
    properties: SurfaceProperties,
}

impl BoundingRectangularPrism {
    /// Creates a new `BoundingRectangularPrism`.
    ///
    /// # Arguments
    ///
    /// * `corner_a` - One corner of the prism.
    /// * `corner_b` - The opposite corner. The corners are sorted per axis.
    /// * `properties` - Penetration probabilities and permeabilities of the faces.
    ///
    /// Fails if the corners coincide on any axis.
    pub fn new(corner_a: [f64; 3], corner_b: [f64; 3], properties: SurfaceProperties) -> Result<Self, VolumeError> {
        let bounds = BoundingBox::from_corners(corner_a, corner_b);
        for axis in 0..3 {
            let (min, max) = (bounds.min[axis], bounds.max[axis]);
            if !(min.is_finite() && max.is_finite()) || max - min <= EPSILON {
                return Err(VolumeError::DegenerateBox { axis, min, max });
            }
        }
        properties.check_ranges();
        debug!("Created rectangular prism {:?} -> {:?} ({})", bounds.min, bounds.max, properties.algorithm);
        Ok(Self {
            bounds,
            cross_section: bounds.cross_section(),
            properties,
        })
    }

    pub fn min(&self) -> [f64; 3] {
        self.bounds.min
    }

    pub fn max(&self) -> [f64; 3] {
        self.bounds.max
    }

    pub fn corners(&self) -> [[f64; 3]; 8] {
        self.bounds.corners()
    }

    fn face_surface(direction: Direction) -> Surface {
        match direction {
            Direction::NegX => Surface::Left,
            Direction::PosX => Surface::Right,
            Direction::NegY => Surface::Front,
            Direction::PosY => Surface::Back,
            Direction::NegZ => Surface::Top,
            Direction::PosZ => Surface::Bottom,
        }
    }
}

impl VolumeGeometry for BoundingRectangularPrism {
    fn contains(&self, point: &[f64; 3]) -> bool {
        (0..3).all(|i| point[i] - self.bounds.min[i] > EPSILON && self.bounds.max[i] - point[i] > EPSILON)
    }

    fn contains_cross_section(&self, polygon: &Polygon, z: f64) -> bool {
        z - self.bounds.min[2] > EPSILON
            && self.bounds.max[2] - z > EPSILON
            && self.cross_section.contains_polygon(polygon)
    }

    fn within(&self, other: &dyn VolumeGeometry) -> bool {
        // A convex prism is enclosed exactly when all of its corners are.
        self.corners().iter().all(|c| other.contains(c))
    }

    fn closest_intersection(&self, origin: &[f64; 3], destination: &[f64; 3]) -> Option<Intersection> {
        let dir = sub(destination, origin);
        let len = length(&dir);
        if len < EPSILON {
            return None;
        }
        if !self.bounds.intersects(&BoundingBox::from_segment(origin, destination)) {
            return None;
        }
        let origin_inside = self.contains(origin);
        let t_eps = EPSILON / len;

        let mut best: Option<Intersection> = None;
        for axis in 0..3 {
            for is_max in [false, true] {
                let plane = if is_max { self.bounds.max[axis] } else { self.bounds.min[axis] };
                let side_o = origin[axis] - plane;
                let side_d = destination[axis] - plane;
                // Only planes the segment reaches from one side to the other.
                if side_o * side_d > 0.0 || side_o == side_d {
                    continue;
                }
                let t = side_o / (side_o - side_d);
                if t >= 1.0 - t_eps {
                    continue;
                }
                let outward_sign = if is_max { 1.0 } else { -1.0 };
                // Leaving a face we start on is not a crossing.
                if t <= t_eps && !origin_inside && dir[axis] * outward_sign >= 0.0 {
                    continue;
                }
                if best.is_some_and(|b| b.t <= t) {
                    continue;
                }

                let mut point = [
                    origin[0] + t * dir[0],
                    origin[1] + t * dir[1],
                    origin[2] + t * dir[2],
                ];
                point[axis] = plane;
                let on_face = (0..3).filter(|&i| i != axis).all(|i| {
                    point[i] >= self.bounds.min[i] - EPSILON && point[i] <= self.bounds.max[i] + EPSILON
                });
                if !on_face {
                    continue;
                }

                let mut normal = [0.0; 3];
                normal[axis] = if origin_inside { -outward_sign } else { outward_sign };
                best = Some(Intersection {
                    point,
                    normal,
                    surface: Self::face_surface(Direction::from_axis(axis, is_max)),
                    t: t.max(0.0),
                });
            }
        }
        best
    }

    fn coincident_proportion(&self, cell: &BoundingBox<3>) -> Result<Coincidence, VolumeError> {
        let shape = Extrusion {
            polygon: &self.cross_section,
            top: self.bounds.min[2],
            bottom: self.bounds.max[2],
            properties: &self.properties,
            allow_matched: true,
        };
        coincidence::coincident_proportion(&shape, cell)
    }

    fn jitter_lock(&self, cell: &BoundingBox<3>, candidate: &[f64; 3], inside: bool) -> [f64; 3] {
        let mut point = *candidate;
        if inside {
            for i in 0..3 {
                let lo = cell.min[i].max(self.bounds.min[i]);
                let hi = cell.max[i].min(self.bounds.max[i]);
                point[i] = clamp_with_margin(point[i], lo, hi);
            }
            return point;
        }

        for i in 0..3 {
            point[i] = clamp_with_margin(point[i], cell.min[i], cell.max[i]);
        }
        if !self.contains(&point) {
            return point;
        }
        // Move along the axis offering the widest escape from the prism.
        let escape = (0..3)
            .filter_map(|i| outside_range(cell.min[i], cell.max[i], self.bounds.min[i], self.bounds.max[i]).map(|r| (i, r)))
            .max_by(|a, b| (a.1.1 - a.1.0).total_cmp(&(b.1.1 - b.1.0)));
        if let Some((axis, (lo, hi))) = escape {
            point[axis] = clamp_with_margin(point[axis], lo, hi);
        }
        point
    }

    fn surface_properties(&self) -> &SurfaceProperties {
        &self.properties
    }

    fn bounding_box(&self) -> BoundingBox<3> {
        self.bounds
    }

    fn cross_section(&self) -> &Polygon {
        &self.cross_section
    }

    fn top(&self) -> f64 {
        self.bounds.min[2]
    }

    fn bottom(&self) -> f64 {
        self.bounds.max[2]
    }

    fn accept(&self, id: usize, visitor: &mut dyn GeometryVisitor) {
        visitor.visit_prism(id, self.bounds.min, self.bounds.max);
    }
}
