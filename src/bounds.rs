use crate::polygon::Polygon;
use crate::vector::EPSILON;

/// One of the six faces of a grid cell, named by the axis direction it faces.
///
/// The discriminant doubles as the index into per-direction arrays, following
/// the `axis * 2 + is_max` layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// The left face (x = min).
    NegX = 0,
    /// The right face (x = max).
    PosX = 1,
    /// The front face (y = min).
    NegY = 2,
    /// The back face (y = max).
    PosY = 3,
    /// The top face (z = min, z grows with depth).
    NegZ = 4,
    /// The bottom face (z = max).
    PosZ = 5,
}

/// All six directions in index order.
pub const DIRECTIONS: [Direction; 6] = [
    Direction::NegX,
    Direction::PosX,
    Direction::NegY,
    Direction::PosY,
    Direction::NegZ,
    Direction::PosZ,
];

impl Direction {
    /// Calculates the direction for a face based on the axis and side.
    pub fn from_axis(axis: usize, is_max: bool) -> Direction {
        DIRECTIONS[axis * 2 + if is_max { 1 } else { 0 }]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn axis(self) -> usize {
        self.index() / 2
    }

    pub fn is_max(self) -> bool {
        self.index() % 2 == 1
    }

    pub fn opposite(self) -> Direction {
        Direction::from_axis(self.axis(), !self.is_max())
    }
}

/// Generic axis-aligned bounding box for N-dimensional space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox<const D: usize> {
    pub min: [f64; D],
    pub max: [f64; D],
}

impl<const D: usize> BoundingBox<D> {
    pub fn new(min: [f64; D], max: [f64; D]) -> Self {
        Self { min, max }
    }

    /// Builds the box spanned by two arbitrary opposite corners.
    pub fn from_corners(a: [f64; D], b: [f64; D]) -> Self {
        let mut min = a;
        let mut max = b;
        for i in 0..D {
            if a[i] > b[i] {
                min[i] = b[i];
                max[i] = a[i];
            }
        }
        Self { min, max }
    }

    pub fn extent(&self, axis: usize) -> f64 {
        self.max[axis] - self.min[axis]
    }

    /// Product of the extents. Zero or negative for degenerate boxes.
    pub fn volume(&self) -> f64 {
        (0..D).map(|i| self.extent(i)).product()
    }

    pub fn center(&self) -> [f64; D] {
        let mut c = self.min;
        for i in 0..D {
            c[i] = 0.5 * (self.min[i] + self.max[i]);
        }
        c
    }

    /// True if every extent is strictly positive.
    pub fn is_valid(&self) -> bool {
        (0..D).all(|i| self.extent(i) > EPSILON && self.min[i].is_finite() && self.max[i].is_finite())
    }

    /// Inclusive point test.
    pub fn contains(&self, point: &[f64; D]) -> bool {
        (0..D).all(|i| point[i] >= self.min[i] - EPSILON && point[i] <= self.max[i] + EPSILON)
    }

    /// True if the boxes share any point, touching faces included.
    pub fn intersects(&self, other: &BoundingBox<D>) -> bool {
        (0..D).all(|i| self.min[i] <= other.max[i] + EPSILON && other.min[i] <= self.max[i] + EPSILON)
    }

    /// The overlapping region of two boxes, if it has positive extent on every axis.
    pub fn intersection(&self, other: &BoundingBox<D>) -> Option<BoundingBox<D>> {
        let mut min = self.min;
        let mut max = self.max;
        for i in 0..D {
            min[i] = self.min[i].max(other.min[i]);
            max[i] = self.max[i].min(other.max[i]);
            if max[i] - min[i] <= EPSILON {
                return None;
            }
        }
        Some(BoundingBox { min, max })
    }

    /// The box enclosing a line segment.
    pub fn from_segment(a: &[f64; D], b: &[f64; D]) -> Self {
        Self::from_corners(*a, *b)
    }
}

impl BoundingBox<3> {
    /// The horizontal (x, y) outline of the box.
    pub fn cross_section(&self) -> Polygon {
        Polygon::rectangle([self.min[0], self.min[1]], [self.max[0], self.max[1]])
    }

    /// The eight corners, top face first.
    pub fn corners(&self) -> [[f64; 3]; 8] {
        let (a, b) = (self.min, self.max);
        [
            [a[0], a[1], a[2]],
            [b[0], a[1], a[2]],
            [b[0], b[1], a[2]],
            [a[0], b[1], a[2]],
            [a[0], a[1], b[2]],
            [b[0], a[1], b[2]],
            [b[0], b[1], b[2]],
            [a[0], b[1], b[2]],
        ]
    }
}
