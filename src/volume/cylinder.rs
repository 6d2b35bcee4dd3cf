use std::f64::consts::PI;

use log::debug;
use rand::{Rng, RngCore};

use super::coincidence::{self, Coincidence, Extrusion};
use super::deflection::planar_path;
use super::sampling::{clamp_with_margin, outside_range};
use super::{GeometryVisitor, Intersection, Surface, SurfaceProperties, VolumeGeometry};
use crate::bounds::BoundingBox;
use crate::error::VolumeError;
use crate::polygon::Polygon;
use crate::vector::{dot, invert3, length, mul_mat3, normalize, sub, EPSILON};

/// Number of vertices of the polygon approximating the circular cross-section.
///
/// Higher counts follow the circle more closely but make polygon clipping
/// less stable numerically.
pub const CYLINDER_POLYGON_SIDES: usize = 100;

/// A vertical right circular cylinder, such as a pot or a root exclusion tube.
///
/// The cylinder is described by the centre of its top face, its radius and
/// its height. z grows with depth, so the bottom face lies at `origin.z + height`.
#[derive(Debug)]
pub struct BoundingCylinder {
    origin: [f64; 3],
    radius: f64,
    height: f64,
    cross_section: Polygon,
    properties: SurfaceProperties,
}

impl BoundingCylinder {
    /// Creates a new `BoundingCylinder` with the default cross-section resolution.
    ///
    /// # Arguments
    ///
    /// * `origin` - The centre of the top face.
    /// * `radius` - The radius, must be positive.
    /// * `height` - The height, must be positive.
    /// * `properties` - Penetration probabilities and permeabilities of the surfaces.
    pub fn new(origin: [f64; 3], radius: f64, height: f64, properties: SurfaceProperties) -> Result<Self, VolumeError> {
        Self::with_resolution(origin, radius, height, properties, CYLINDER_POLYGON_SIDES)
    }

    /// Creates a new `BoundingCylinder` whose cross-section polygon has `sides` vertices.
    pub fn with_resolution(
        origin: [f64; 3],
        radius: f64,
        height: f64,
        properties: SurfaceProperties,
        sides: usize,
    ) -> Result<Self, VolumeError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(VolumeError::InvalidRadius(radius));
        }
        if !(height.is_finite() && height > 0.0) {
            return Err(VolumeError::InvalidHeight(height));
        }
        if origin.iter().any(|c| !c.is_finite()) {
            return Err(VolumeError::InvalidConfig(format!("cylinder origin {:?} is not finite", origin)));
        }
        properties.check_ranges();
        debug!(
            "Created cylinder at {:?}, r = {}, h = {} ({})",
            origin, radius, height, properties.algorithm
        );
        Ok(Self {
            origin,
            radius,
            height,
            cross_section: Polygon::regular([origin[0], origin[1]], radius, sides),
            properties,
        })
    }

    pub fn origin(&self) -> [f64; 3] {
        self.origin
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Squared horizontal distance from the axis.
    fn axis_distance_sq(&self, point: &[f64; 3]) -> f64 {
        let dx = point[0] - self.origin[0];
        let dy = point[1] - self.origin[1];
        dx * dx + dy * dy
    }

    /// Polar angle of a point around the axis.
    fn polar_angle(&self, point: &[f64; 3]) -> f64 {
        (point[1] - self.origin[1]).atan2(point[0] - self.origin[0])
    }

    /// Checks a candidate crossing parameter. Crossings at the very start of the
    /// segment only count when the segment heads into the object.
    fn accept_t(t: f64, t_eps: f64, origin_inside: bool, dir: &[f64; 3], outward: &[f64; 3]) -> bool {
        if t < -t_eps || t >= 1.0 - t_eps {
            return false;
        }
        if t <= t_eps && !origin_inside && dot(dir, outward) >= 0.0 {
            return false;
        }
        true
    }

    /// First crossing of the curved wall, from the roots of the circle equation
    /// along the horizontal projection of the segment.
    fn curved_intersection(&self, origin: &[f64; 3], dir: &[f64; 3], t_eps: f64, origin_inside: bool) -> Option<Intersection> {
        let ox = origin[0] - self.origin[0];
        let oy = origin[1] - self.origin[1];
        let a = dir[0] * dir[0] + dir[1] * dir[1];
        // A vertical segment never crosses the wall.
        if a < EPSILON * EPSILON {
            return None;
        }
        let b = 2.0 * (ox * dir[0] + oy * dir[1]);
        let c = ox * ox + oy * oy - self.radius * self.radius;
        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }
        let root = discriminant.sqrt();
        let roots = [(-b - root) / (2.0 * a), (-b + root) / (2.0 * a)];

        for t in roots {
            let point = [origin[0] + t * dir[0], origin[1] + t * dir[1], origin[2] + t * dir[2]];
            if point[2] < self.top() - EPSILON || point[2] > self.bottom() + EPSILON {
                continue;
            }
            let outward = [
                (point[0] - self.origin[0]) / self.radius,
                (point[1] - self.origin[1]) / self.radius,
                0.0,
            ];
            if !Self::accept_t(t, t_eps, origin_inside, dir, &outward) {
                continue;
            }
            let normal = normalize(&outward).unwrap_or([1.0, 0.0, 0.0]);
            return Some(Intersection {
                point,
                normal,
                surface: Surface::Curved,
                t: t.max(0.0),
            });
        }
        None
    }

    /// Crossing of a flat face at depth `z`.
    ///
    /// The plane is spanned by the face centre and two further in-plane points;
    /// inverting `[origin - destination | p1 - p0 | p2 - p0]` yields the segment
    /// parameter directly.
    fn disc_intersection(
        &self,
        origin: &[f64; 3],
        destination: &[f64; 3],
        z: f64,
        surface: Surface,
        t_eps: f64,
        origin_inside: bool,
    ) -> Option<Intersection> {
        if (origin[2] - z) * (destination[2] - z) > 0.0 {
            return None;
        }
        let p0 = [self.origin[0], self.origin[1], z];
        let e1 = [self.radius, 0.0, 0.0];
        let e2 = [0.0, self.radius, 0.0];
        let back = sub(origin, destination);
        let matrix = [
            [back[0], e1[0], e2[0]],
            [back[1], e1[1], e2[1]],
            [back[2], e1[2], e2[2]],
        ];
        let dir = sub(destination, origin);
        let t = match invert3(&matrix) {
            Some(inverse) => mul_mat3(&inverse, &sub(origin, &p0))[0],
            // Nearly level segment against a thin disc: solve along z alone.
            None if dir[2].abs() > 0.0 => (z - origin[2]) / dir[2],
            None => return None,
        };

        let outward = if surface == Surface::Top { [0.0, 0.0, -1.0] } else { [0.0, 0.0, 1.0] };
        if !Self::accept_t(t, t_eps, origin_inside, &dir, &outward) {
            return None;
        }
        let point = [origin[0] + t * dir[0], origin[1] + t * dir[1], z];
        if self.axis_distance_sq(&point).sqrt() > self.radius + EPSILON {
            return None;
        }
        Some(Intersection {
            point,
            normal: outward,
            surface,
            t: t.max(0.0),
        })
    }
}

impl VolumeGeometry for BoundingCylinder {
    fn contains(&self, point: &[f64; 3]) -> bool {
        point[2] - self.top() > EPSILON
            && self.bottom() - point[2] > EPSILON
            && self.radius - self.axis_distance_sq(point).sqrt() > EPSILON
    }

    fn contains_cross_section(&self, polygon: &Polygon, z: f64) -> bool {
        z - self.top() > EPSILON && self.bottom() - z > EPSILON && self.cross_section.contains_polygon(polygon)
    }

    fn within(&self, other: &dyn VolumeGeometry) -> bool {
        other.contains_cross_section(&self.cross_section, self.top())
            && other.contains_cross_section(&self.cross_section, self.bottom())
    }

    fn closest_intersection(&self, origin: &[f64; 3], destination: &[f64; 3]) -> Option<Intersection> {
        let dir = sub(destination, origin);
        let len = length(&dir);
        if len < EPSILON {
            return None;
        }
        if !self.bounding_box().intersects(&BoundingBox::from_segment(origin, destination)) {
            return None;
        }
        let origin_inside = self.contains(origin);
        let t_eps = EPSILON / len;

        let mut best = self.curved_intersection(origin, &dir, t_eps, origin_inside);
        for (z, surface) in [(self.top(), Surface::Top), (self.bottom(), Surface::Bottom)] {
            if let Some(disc) = self.disc_intersection(origin, destination, z, surface, t_eps, origin_inside) {
                if best.map_or(true, |b| disc.t < b.t) {
                    best = Some(disc);
                }
            }
        }

        best.map(|mut hit| {
            if origin_inside {
                hit.normal = [-hit.normal[0], -hit.normal[1], -hit.normal[2]];
            }
            hit
        })
    }

    fn coincident_proportion(&self, cell: &BoundingBox<3>) -> Result<Coincidence, VolumeError> {
        let shape = Extrusion {
            polygon: &self.cross_section,
            top: self.top(),
            bottom: self.bottom(),
            properties: &self.properties,
            allow_matched: false,
        };
        coincidence::coincident_proportion(&shape, cell)
    }

    fn jitter_lock(&self, cell: &BoundingBox<3>, candidate: &[f64; 3], inside: bool) -> [f64; 3] {
        let mut point = *candidate;
        if inside {
            point[2] = clamp_with_margin(point[2], cell.min[2].max(self.top()), cell.max[2].min(self.bottom()));
            for i in 0..2 {
                point[i] = clamp_with_margin(point[i], cell.min[i], cell.max[i]);
            }
            if !self.contains(&point) {
                // The centroid of the convex horizontal overlap lies inside both.
                if let Some(overlap) = cell.cross_section().intersection(&self.cross_section) {
                    let c = overlap.centroid();
                    point[0] = c[0];
                    point[1] = c[1];
                }
            }
            return point;
        }

        for i in 0..3 {
            point[i] = clamp_with_margin(point[i], cell.min[i], cell.max[i]);
        }
        if !self.contains(&point) {
            return point;
        }
        if let Some((lo, hi)) = outside_range(cell.min[2], cell.max[2], self.top(), self.bottom()) {
            point[2] = clamp_with_margin(point[2], lo, hi);
            return point;
        }
        // Same depth range: step to the cell corner furthest from the axis.
        let corner = [
            if (cell.min[0] - self.origin[0]).abs() > (cell.max[0] - self.origin[0]).abs() { cell.min[0] } else { cell.max[0] },
            if (cell.min[1] - self.origin[1]).abs() > (cell.max[1] - self.origin[1]).abs() { cell.min[1] } else { cell.max[1] },
        ];
        point[0] = clamp_with_margin(corner[0], cell.min[0], cell.max[0]);
        point[1] = clamp_with_margin(corner[1], cell.min[1], cell.max[1]);
        point
    }

    /// Deflection off the flat faces is planar. Off the curved wall the root
    /// follows the circle through `pushed` around the axis, turning the way
    /// that bends it least, and ends on that circle.
    fn deflected_path(
        &self,
        hit: &Intersection,
        pushed: &[f64; 3],
        end: &[f64; 3],
        heading: &[f64; 3],
        remaining: f64,
        _root_radius: f64,
        rng: &mut dyn RngCore,
    ) -> ([f64; 3], [f64; 3]) {
        if hit.surface != Surface::Curved {
            return planar_path(&hit.normal, pushed, heading, remaining, rng);
        }
        let radius = self.axis_distance_sq(pushed).sqrt();
        if radius < EPSILON {
            return planar_path(&hit.normal, pushed, heading, remaining, rng);
        }
        let radial_out = [hit.point[0] - self.origin[0], hit.point[1] - self.origin[1], 0.0];
        let from_inside = dot(&hit.normal, &radial_out) < 0.0;

        let phi = self.polar_angle(pushed);
        let mut delta = self.polar_angle(end) - phi;
        if delta > PI {
            delta -= 2.0 * PI;
        } else if delta <= -PI {
            delta += 2.0 * PI;
        }
        let sense = if delta.abs() < EPSILON {
            if rng.r#gen::<bool>() { 1.0 } else { -1.0 }
        } else {
            delta.signum()
        };

        let horizontal = (heading[0] * heading[0] + heading[1] * heading[1]).sqrt();
        let full = remaining * horizontal / radius;
        // Chords of the offset circle stay inside it. Outside, a chord dips to
        // radius * cos(alpha / 2) and must clear the wall by half the offset.
        let max_alpha = if from_inside {
            PI
        } else {
            let clearance = 0.5 * (self.radius + radius) / radius;
            2.0 * clearance.clamp(-1.0, 1.0).acos()
        };
        let alpha = full.min(max_alpha);
        let share = if full > EPSILON { alpha / full } else { 1.0 };

        let angle = phi + sense * alpha;
        let mut new_end = [
            self.origin[0] + radius * angle.cos(),
            self.origin[1] + radius * angle.sin(),
            pushed[2] + remaining * heading[2] * share,
        ];
        if from_inside {
            new_end[2] = clamp_with_margin(new_end[2], self.top(), self.bottom());
        }

        let tangent = [-phi.sin() * sense, phi.cos() * sense, 0.0];
        let new_heading = normalize(&sub(&new_end, pushed))
            .or_else(|| normalize(&[tangent[0] * horizontal, tangent[1] * horizontal, heading[2]]))
            .unwrap_or(tangent);
        (new_end, new_heading)
    }

    fn surface_properties(&self) -> &SurfaceProperties {
        &self.properties
    }

    fn bounding_box(&self) -> BoundingBox<3> {
        BoundingBox::new(
            [self.origin[0] - self.radius, self.origin[1] - self.radius, self.origin[2]],
            [self.origin[0] + self.radius, self.origin[1] + self.radius, self.origin[2] + self.height],
        )
    }

    fn cross_section(&self) -> &Polygon {
        &self.cross_section
    }

    fn top(&self) -> f64 {
        self.origin[2]
    }

    fn bottom(&self) -> f64 {
        self.origin[2] + self.height
    }

    fn accept(&self, id: usize, visitor: &mut dyn GeometryVisitor) {
        visitor.visit_cylinder(id, self.origin, self.radius, self.height);
    }
}
