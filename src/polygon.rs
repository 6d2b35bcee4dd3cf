use crate::bounds::BoundingBox;
use crate::vector::EPSILON;

/// A closed convex polygon in the horizontal plane.
///
/// Vertices are stored counter-clockwise without repeating the first vertex.
/// Both obstacle outlines (rectangles and regular polygons approximating
/// circles) and grid cell outlines are convex, so the intersection of two
/// polygons is again a single convex polygon or nothing.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    vertices: Vec<[f64; 2]>,
}

impl Polygon {
    /// Creates a polygon from a vertex ring in either winding order.
    ///
    /// Returns `None` for fewer than three vertices or a ring without area.
    pub fn new(mut vertices: Vec<[f64; 2]>) -> Option<Polygon> {
        if vertices.len() < 3 {
            return None;
        }
        let signed = signed_area(&vertices);
        if signed.abs() < EPSILON * EPSILON {
            return None;
        }
        if signed < 0.0 {
            vertices.reverse();
        }
        Some(Polygon { vertices })
    }

    /// Axis-aligned rectangle spanning `min` to `max`.
    pub fn rectangle(min: [f64; 2], max: [f64; 2]) -> Polygon {
        Polygon {
            vertices: vec![
                [min[0], min[1]],
                [max[0], min[1]],
                [max[0], max[1]],
                [min[0], max[1]],
            ],
        }
    }

    /// Regular polygon with `sides` vertices placed on the circle of `radius`.
    ///
    /// The first vertex lies on the positive x axis, so two regular polygons
    /// sharing a centre and side count have their vertices on the same rays.
    pub fn regular(center: [f64; 2], radius: f64, sides: usize) -> Polygon {
        let sides = sides.max(3);
        let step = std::f64::consts::TAU / sides as f64;
        let vertices = (0..sides)
            .map(|i| {
                let angle = i as f64 * step;
                [center[0] + radius * angle.cos(), center[1] + radius * angle.sin()]
            })
            .collect();
        Polygon { vertices }
    }

    pub fn vertices(&self) -> &[[f64; 2]] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Iterates over the edges as `(start, end)` pairs, closing the ring.
    pub fn edges(&self) -> impl Iterator<Item = ([f64; 2], [f64; 2])> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    pub fn area(&self) -> f64 {
        signed_area(&self.vertices).abs()
    }

    pub fn centroid(&self) -> [f64; 2] {
        let n = self.vertices.len();
        let mut cx = 0.0;
        let mut cy = 0.0;
        let mut area = 0.0;
        for i in 0..n {
            let j = (i + 1) % n;
            let [xi, yi] = self.vertices[i];
            let [xj, yj] = self.vertices[j];
            let cross = xi * yj - xj * yi;
            area += cross;
            cx += (xi + xj) * cross;
            cy += (yi + yj) * cross;
        }
        if area.abs() < EPSILON * EPSILON {
            // Degenerate ring: fall back to the vertex average.
            let count = n.max(1) as f64;
            let sx: f64 = self.vertices.iter().map(|v| v[0]).sum();
            let sy: f64 = self.vertices.iter().map(|v| v[1]).sum();
            return [sx / count, sy / count];
        }
        let factor = 1.0 / (3.0 * area);
        [cx * factor, cy * factor]
    }

    pub fn bounds(&self) -> BoundingBox<2> {
        let mut min = [f64::MAX, f64::MAX];
        let mut max = [f64::MIN, f64::MIN];
        for v in &self.vertices {
            for i in 0..2 {
                min[i] = min[i].min(v[i]);
                max[i] = max[i].max(v[i]);
            }
        }
        BoundingBox::new(min, max)
    }

    /// Strict interior test: points on (or within tolerance of) an edge are outside.
    pub fn contains_point(&self, p: &[f64; 2]) -> bool {
        self.edges().all(|(a, b)| edge_distance(&a, &b, p) > EPSILON)
    }

    /// True if every vertex of `other` lies strictly inside this polygon.
    ///
    /// Convexity makes the vertex test sufficient for the whole of `other`.
    pub fn contains_polygon(&self, other: &Polygon) -> bool {
        !other.vertices.is_empty() && other.vertices.iter().all(|v| self.contains_point(v))
    }

    /// Clips this polygon against the convex `clip` polygon.
    ///
    /// Returns `None` when the overlap has no area.
    pub fn intersection(&self, clip: &Polygon) -> Option<Polygon> {
        let mut current = self.vertices.clone();
        let mut scratch = Vec::with_capacity(current.len() + clip.len());
        let mut dists = Vec::with_capacity(current.len());

        for (a, b) in clip.edges() {
            if current.len() < 3 {
                return None;
            }
            // Signed distance, positive on the kept (left) side of a CCW edge.
            dists.clear();
            let mut all_inside = true;
            let mut all_outside = true;
            for v in &current {
                let d = edge_distance(&a, &b, v);
                dists.push(d);
                if d < -EPSILON {
                    all_inside = false;
                } else if d > EPSILON {
                    all_outside = false;
                }
            }
            if all_inside {
                continue;
            }
            if all_outside {
                return None;
            }

            scratch.clear();
            let n = current.len();
            for i in 0..n {
                let j = (i + 1) % n;
                let d_i = dists[i];
                let d_j = dists[j];
                if d_i >= -EPSILON {
                    scratch.push(current[i]);
                    if d_j < -EPSILON && d_i > EPSILON {
                        // Leaving the kept side.
                        scratch.push(lerp(&current[i], &current[j], d_i / (d_i - d_j)));
                    }
                } else if d_j > EPSILON {
                    // Entering the kept side.
                    scratch.push(lerp(&current[i], &current[j], d_i / (d_i - d_j)));
                }
            }
            std::mem::swap(&mut current, &mut scratch);
        }

        dedup_ring(&mut current);
        let result = Polygon::new(current)?;
        if result.area() <= EPSILON * EPSILON {
            return None;
        }
        Some(result)
    }

    /// Vertex-wise equality within tolerance, independent of the starting vertex.
    pub fn approx_eq(&self, other: &Polygon) -> bool {
        let n = self.vertices.len();
        if n != other.vertices.len() {
            return false;
        }
        if n == 0 {
            return true;
        }
        let close = |a: &[f64; 2], b: &[f64; 2]| (a[0] - b[0]).abs() <= EPSILON && (a[1] - b[1]).abs() <= EPSILON;
        (0..n).any(|shift| (0..n).all(|i| close(&self.vertices[i], &other.vertices[(i + shift) % n])))
    }
}

fn signed_area(vertices: &[[f64; 2]]) -> f64 {
    let n = vertices.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += vertices[i][0] * vertices[j][1] - vertices[j][0] * vertices[i][1];
    }
    area * 0.5
}

/// Signed distance of `p` from the line through `a` and `b`, positive to the left.
fn edge_distance(a: &[f64; 2], b: &[f64; 2], p: &[f64; 2]) -> f64 {
    let ex = b[0] - a[0];
    let ey = b[1] - a[1];
    let len = (ex * ex + ey * ey).sqrt();
    if len == 0.0 {
        return 0.0;
    }
    (ex * (p[1] - a[1]) - ey * (p[0] - a[0])) / len
}

fn lerp(a: &[f64; 2], b: &[f64; 2], t: f64) -> [f64; 2] {
    [a[0] + t * (b[0] - a[0]), a[1] + t * (b[1] - a[1])]
}

fn dedup_ring(vertices: &mut Vec<[f64; 2]>) {
    vertices.dedup_by(|a, b| (a[0] - b[0]).abs() <= EPSILON && (a[1] - b[1]).abs() <= EPSILON);
    while vertices.len() > 1 {
        let first = vertices[0];
        let last = vertices[vertices.len() - 1];
        if (first[0] - last[0]).abs() <= EPSILON && (first[1] - last[1]).abs() <= EPSILON {
            vertices.pop();
        } else {
            break;
        }
    }
}
