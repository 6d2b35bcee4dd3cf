pub mod coincidence;
pub mod cylinder;
pub mod deflection;
pub mod prism;
pub mod sampling;

use std::fmt;

use log::warn;
use rand::RngCore;

use crate::bounds::BoundingBox;
use crate::error::VolumeError;
use crate::polygon::Polygon;
use crate::vector::EPSILON;

use self::coincidence::Coincidence;

/// A rigid obstacle embedded in the soil volume.
///
/// A `VolumeObject` is a container for a `VolumeGeometry` implementation, giving
/// it the integer index assigned by the owning registry. Geometry is immutable
/// after construction; the only mutable state is whether the object has already
/// been handed to an exporter.
pub struct VolumeObject {
    id: usize,
    exported: bool,
    inner: Box<dyn VolumeGeometry>,
}

impl VolumeObject {
    /// Creates a new `VolumeObject` from a Rust struct that implements the `VolumeGeometry` trait.
    pub fn new(id: usize, geometry: Box<dyn VolumeGeometry>) -> Self {
        Self {
            id,
            exported: false,
            inner: geometry,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn geometry(&self) -> &dyn VolumeGeometry {
        self.inner.as_ref()
    }

    pub fn contains(&self, point: &[f64; 3]) -> bool {
        self.inner.contains(point)
    }

    pub fn contains_cross_section(&self, polygon: &Polygon, z: f64) -> bool {
        self.inner.contains_cross_section(polygon, z)
    }

    /// True if this object is fully enclosed by `other`.
    pub fn within(&self, other: &VolumeObject) -> bool {
        self.inner.within(other.geometry())
    }

    pub fn closest_intersection(&self, origin: &[f64; 3], destination: &[f64; 3]) -> Option<Intersection> {
        self.inner.closest_intersection(origin, destination)
    }

    pub fn coincident_proportion(&self, cell: &BoundingBox<3>) -> Result<Coincidence, VolumeError> {
        self.inner.coincident_proportion(cell)
    }

    pub fn generate_random_point_in_box(&self, cell: &BoundingBox<3>, inside: bool, rng: &mut dyn RngCore) -> [f64; 3] {
        self.inner.generate_random_point_in_box(cell, inside, rng)
    }

    pub fn deflect_root_segment(
        &self,
        start: &[f64; 3],
        end: &[f64; 3],
        heading: &[f64; 3],
        root_radius: f64,
        branch_order: u32,
        rng: &mut dyn RngCore,
    ) -> Deflection {
        self.inner.deflect_root_segment(start, end, heading, root_radius, branch_order, rng)
    }

    pub fn root_penetration_probability(&self, surface: Surface, angle_to_normal: f64) -> f64 {
        self.inner.root_penetration_probability(surface, angle_to_normal)
    }

    pub fn permeability(&self, surface: Surface) -> f64 {
        self.inner.permeability(surface)
    }

    pub fn deflection_algorithm(&self) -> DeflectionAlgorithm {
        self.inner.deflection_algorithm()
    }

    pub fn bounding_box(&self) -> BoundingBox<3> {
        self.inner.bounding_box()
    }

    pub fn is_exported(&self) -> bool {
        self.exported
    }

    /// Hands the geometry to `visitor` the first time it is called.
    ///
    /// Returns `false` without visiting if the object was exported before.
    pub fn export(&mut self, visitor: &mut dyn GeometryVisitor) -> bool {
        if self.exported {
            return false;
        }
        self.inner.accept(self.id, visitor);
        self.exported = true;
        true
    }
}

impl fmt::Debug for VolumeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VolumeObject")
            .field("id", &self.id)
            .field("exported", &self.exported)
            .field("geometry", &self.inner)
            .finish()
    }
}

/// Trait defining the geometry and interaction logic of an obstacle.
///
/// Every operation is a pure function of the immutable geometry and its
/// arguments. Randomized operations draw from the generator they are given.
pub trait VolumeGeometry: Send + Sync + fmt::Debug {
    /// Strict interior test. Points on the boundary are outside.
    fn contains(&self, point: &[f64; 3]) -> bool;

    /// True if `polygon` lies inside this object's cross-section and `z` is
    /// strictly within its vertical extent.
    fn contains_cross_section(&self, polygon: &Polygon, z: f64) -> bool;

    /// True if this object is fully enclosed by `other`. Coincident objects are not.
    fn within(&self, other: &dyn VolumeGeometry) -> bool;

    /// Finds the first boundary crossing along `origin -> destination`.
    ///
    /// The returned normal faces the side `origin` is on: outward if the origin
    /// lies outside the object, inward if it lies inside.
    fn closest_intersection(&self, origin: &[f64; 3], destination: &[f64; 3]) -> Option<Intersection>;

    /// Fraction of `cell` occupied by this object and the cell faces it obstructs.
    fn coincident_proportion(&self, cell: &BoundingBox<3>) -> Result<Coincidence, VolumeError>;

    /// Draws a point in `cell` that is inside (or outside) this object.
    fn generate_random_point_in_box(&self, cell: &BoundingBox<3>, inside: bool, rng: &mut dyn RngCore) -> [f64; 3] {
        sampling::generate_random_point_in_box(self, cell, inside, rng)
    }

    /// Deterministic placement used once rejection sampling gives up.
    fn jitter_lock(&self, cell: &BoundingBox<3>, candidate: &[f64; 3], inside: bool) -> [f64; 3];

    /// Decides whether a root segment penetrates or is deflected by this object.
    fn deflect_root_segment(
        &self,
        start: &[f64; 3],
        end: &[f64; 3],
        heading: &[f64; 3],
        root_radius: f64,
        branch_order: u32,
        rng: &mut dyn RngCore,
    ) -> Deflection {
        deflection::deflect_root_segment(self, start, end, heading, root_radius, branch_order, rng)
    }

    /// New segment end and unit heading for a root deflected at `hit`.
    ///
    /// `pushed` is the crossing point moved `root_radius` off the surface and
    /// `remaining` the length still to grow. The returned end must stay on the
    /// side of the surface the root came from. Planar surfaces project the
    /// heading onto the surface and grow straight along it.
    fn deflected_path(
        &self,
        hit: &Intersection,
        pushed: &[f64; 3],
        _end: &[f64; 3],
        heading: &[f64; 3],
        remaining: f64,
        _root_radius: f64,
        rng: &mut dyn RngCore,
    ) -> ([f64; 3], [f64; 3]) {
        deflection::planar_path(&hit.normal, pushed, heading, remaining, rng)
    }

    fn surface_properties(&self) -> &SurfaceProperties;

    fn root_penetration_probability(&self, surface: Surface, angle_to_normal: f64) -> f64 {
        self.surface_properties().root_penetration_probability(surface, angle_to_normal)
    }

    fn permeability(&self, surface: Surface) -> f64 {
        self.surface_properties().permeability(surface)
    }

    fn deflection_algorithm(&self) -> DeflectionAlgorithm {
        self.surface_properties().algorithm
    }

    fn bounding_box(&self) -> BoundingBox<3>;

    /// The horizontal outline of the object.
    fn cross_section(&self) -> &Polygon;

    /// z of the top face (smallest depth).
    fn top(&self) -> f64;

    /// z of the bottom face (largest depth).
    fn bottom(&self) -> f64;

    /// Hands read-only geometry to an exporter.
    fn accept(&self, id: usize, visitor: &mut dyn GeometryVisitor);
}

/// Receives obstacle geometry for rendering or export.
pub trait GeometryVisitor {
    fn visit_cylinder(&mut self, id: usize, origin: [f64; 3], radius: f64, height: f64);
    fn visit_prism(&mut self, id: usize, min: [f64; 3], max: [f64; 3]);
}

/// Surface class of an obstacle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Surface {
    Top,
    Bottom,
    Left,
    Right,
    Front,
    Back,
    Curved,
    None,
}

impl Surface {
    /// True for the lateral surfaces, which share the side probabilities.
    pub fn is_side(self) -> bool {
        matches!(self, Surface::Left | Surface::Right | Surface::Front | Surface::Back | Surface::Curved)
    }
}

/// How the root penetration probability depends on the angle of incidence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeflectionAlgorithm {
    /// Probability scales with the cosine of the incidence angle.
    #[default]
    CosinProportional,
    /// Probability is the configured maximum regardless of angle.
    DirectlySpecified,
}

impl DeflectionAlgorithm {
    /// Parses an algorithm name, ignoring case and whitespace.
    ///
    /// Unknown names fall back to `CosinProportional`.
    pub fn from_name(name: &str) -> DeflectionAlgorithm {
        let key: String = name.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_lowercase();
        match key.as_str() {
            "cosinproportional" => DeflectionAlgorithm::CosinProportional,
            "directlyspecified" => DeflectionAlgorithm::DirectlySpecified,
            _ => {
                warn!("Unknown deflection algorithm {:?}, using cosin proportional", name);
                DeflectionAlgorithm::CosinProportional
            }
        }
    }
}

impl fmt::Display for DeflectionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeflectionAlgorithm::CosinProportional => write!(f, "Cosin Proportional"),
            DeflectionAlgorithm::DirectlySpecified => write!(f, "Directly Specified"),
        }
    }
}

/// Outcome of a root segment meeting an obstacle.
///
/// Inside/outside is relative to the obstacle: a root starting outside either
/// penetrates to the inside or is deflected and stays outside.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractionType {
    NoInteraction,
    PenetrationToInside,
    PenetrationToOutside,
    DeflectionToInside,
    DeflectionToOutside,
}

/// Per surface class penetration probabilities and permeabilities.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceProperties {
    pub algorithm: DeflectionAlgorithm,
    pub top_rpp: f64,
    pub bottom_rpp: f64,
    pub side_rpp: f64,
    pub top_permeability: f64,
    pub bottom_permeability: f64,
    pub side_permeability: f64,
}

impl Default for SurfaceProperties {
    /// Impenetrable and impermeable on every surface.
    fn default() -> Self {
        Self {
            algorithm: DeflectionAlgorithm::CosinProportional,
            top_rpp: 0.0,
            bottom_rpp: 0.0,
            side_rpp: 0.0,
            top_permeability: 0.0,
            bottom_permeability: 0.0,
            side_permeability: 0.0,
        }
    }
}

impl SurfaceProperties {
    /// The same probability and permeability on every surface.
    pub fn uniform(algorithm: DeflectionAlgorithm, rpp: f64, permeability: f64) -> Self {
        Self {
            algorithm,
            top_rpp: rpp,
            bottom_rpp: rpp,
            side_rpp: rpp,
            top_permeability: permeability,
            bottom_permeability: permeability,
            side_permeability: permeability,
        }
    }

    /// Warns about values outside `[0, 1]`. They are kept as given.
    pub(crate) fn check_ranges(&self) {
        let values = [
            ("top_rpp", self.top_rpp),
            ("bottom_rpp", self.bottom_rpp),
            ("side_rpp", self.side_rpp),
            ("top_permeability", self.top_permeability),
            ("bottom_permeability", self.bottom_permeability),
            ("side_permeability", self.side_permeability),
        ];
        for (name, value) in values {
            if !(0.0..=1.0).contains(&value) {
                warn!("{} = {} is outside [0, 1]", name, value);
            }
        }
    }

    /// Configured maximum root penetration probability of a surface class.
    pub fn max_root_penetration_probability(&self, surface: Surface) -> f64 {
        match surface {
            Surface::Top => self.top_rpp,
            Surface::Bottom => self.bottom_rpp,
            Surface::None => 0.0,
            _ => self.side_rpp,
        }
    }

    pub fn permeability(&self, surface: Surface) -> f64 {
        match surface {
            Surface::Top => self.top_permeability,
            Surface::Bottom => self.bottom_permeability,
            Surface::None => 0.0,
            _ => self.side_permeability,
        }
    }

    /// Probability that a root meeting `surface` at `angle_to_normal` passes through.
    pub fn root_penetration_probability(&self, surface: Surface, angle_to_normal: f64) -> f64 {
        let max = self.max_root_penetration_probability(surface);
        match self.algorithm {
            DeflectionAlgorithm::DirectlySpecified => max,
            DeflectionAlgorithm::CosinProportional => {
                if (max - 1.0).abs() < EPSILON {
                    1.0
                } else {
                    max * (std::f64::consts::PI - angle_to_normal).cos().abs()
                }
            }
        }
    }
}

/// A boundary crossing found along a segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intersection {
    /// Point on the surface.
    pub point: [f64; 3],
    /// Unit normal facing the side the segment started on.
    pub normal: [f64; 3],
    pub surface: Surface,
    /// Segment parameter of the crossing, in `[0, 1)`.
    pub t: f64,
}

/// Result of `deflect_root_segment`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Deflection {
    pub interaction: InteractionType,
    /// Where the root met the surface, pushed off the surface when deflected.
    pub intersection: Option<[f64; 3]>,
    /// New segment end.
    pub end: [f64; 3],
    /// New unit heading.
    pub heading: [f64; 3],
}
