//! Small vector helpers over `[f64; 3]`.
//!
//! Points and directions are kept as plain arrays; these functions cover the
//! handful of operations the obstacle geometry needs.

/// Tolerance used for all geometric equality and ordering tests.
pub const EPSILON: f64 = 1e-9;

pub fn sub(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn scale(a: &[f64; 3], s: f64) -> [f64; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

/// `a + b * s`
pub fn add_scaled(a: &[f64; 3], b: &[f64; 3], s: f64) -> [f64; 3] {
    [a[0] + b[0] * s, a[1] + b[1] * s, a[2] + b[2] * s]
}

pub fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn length(a: &[f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

pub fn distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    length(&sub(a, b))
}

/// Returns the unit vector along `a`, or `None` for a (near) zero vector.
pub fn normalize(a: &[f64; 3]) -> Option<[f64; 3]> {
    let len = length(a);
    if len < EPSILON {
        return None;
    }
    Some(scale(a, 1.0 / len))
}

/// Angle between two vectors in radians, in `[0, PI]`.
pub fn angle_between(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let la = length(a);
    let lb = length(b);
    if la < EPSILON || lb < EPSILON {
        return 0.0;
    }
    // Clamp to guard acos against rounding just outside [-1, 1].
    (dot(a, b) / (la * lb)).clamp(-1.0, 1.0).acos()
}

/// True if the vectors are parallel or anti-parallel.
pub fn is_parallel(a: &[f64; 3], b: &[f64; 3]) -> bool {
    let la = length(a);
    let lb = length(b);
    if la < EPSILON || lb < EPSILON {
        return true;
    }
    length(&cross(a, b)) / (la * lb) < EPSILON
}

/// Two unit vectors spanning the plane perpendicular to the unit vector `n`.
pub fn orthonormal_basis(n: &[f64; 3]) -> ([f64; 3], [f64; 3]) {
    // Pick the helper axis least aligned with n.
    let helper = if n[0].abs() < 0.9 { [1.0, 0.0, 0.0] } else { [0.0, 1.0, 0.0] };
    let u = normalize(&cross(n, &helper)).unwrap_or([0.0, 0.0, 1.0]);
    let v = cross(n, &u);
    (u, v)
}

/// Inverts a 3x3 matrix given in row-major order.
///
/// Returns `None` when the matrix is singular.
pub fn invert3(m: &[[f64; 3]; 3]) -> Option<[[f64; 3]; 3]> {
    let c00 = m[1][1] * m[2][2] - m[1][2] * m[2][1];
    let c01 = m[1][2] * m[2][0] - m[1][0] * m[2][2];
    let c02 = m[1][0] * m[2][1] - m[1][1] * m[2][0];
    let det = m[0][0] * c00 + m[0][1] * c01 + m[0][2] * c02;
    if det.abs() < EPSILON {
        return None;
    }
    let inv = 1.0 / det;
    Some([
        [
            c00 * inv,
            (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv,
            (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv,
        ],
        [
            c01 * inv,
            (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv,
            (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv,
        ],
        [
            c02 * inv,
            (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv,
            (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv,
        ],
    ])
}

pub fn mul_mat3(m: &[[f64; 3]; 3], v: &[f64; 3]) -> [f64; 3] {
    [dot(&m[0], v), dot(&m[1], v), dot(&m[2], v)]
}

/// Equality within [`EPSILON`], scaled by the magnitude of the operands.
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON * a.abs().max(b.abs()).max(1.0)
}
