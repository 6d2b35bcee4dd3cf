use log::trace;
use rand::{Rng, RngCore};

use super::{Deflection, InteractionType, VolumeGeometry};
use crate::vector::{add_scaled, angle_between, distance, dot, is_parallel, length, normalize, orthonormal_basis, scale, sub, EPSILON};

/// Runs one root segment against an obstacle.
///
/// Finds the first crossing, draws against the penetration probability of the
/// surface that was hit, and either lets the root through unchanged or pushes
/// the crossing point `root_radius` off the surface and bends the remainder of
/// the segment along the new heading.
pub fn deflect_root_segment<G: VolumeGeometry + ?Sized>(
    geometry: &G,
    start: &[f64; 3],
    end: &[f64; 3],
    heading: &[f64; 3],
    root_radius: f64,
    branch_order: u32,
    rng: &mut dyn RngCore,
) -> Deflection {
    let Some(hit) = geometry.closest_intersection(start, end) else {
        return Deflection {
            interaction: InteractionType::NoInteraction,
            intersection: None,
            end: *end,
            heading: *heading,
        };
    };

    let started_inside = geometry.contains(start);
    let segment = sub(end, start);
    let angle = angle_between(&segment, &hit.normal);
    let probability = geometry.root_penetration_probability(hit.surface, angle);
    let draw: f64 = rng.r#gen();

    if probability >= 1.0 || probability > draw {
        trace!(
            "Root (order {}) penetrates {:?} at {:?}, p = {:.4}",
            branch_order, hit.surface, hit.point, probability
        );
        return Deflection {
            interaction: if started_inside {
                InteractionType::PenetrationToOutside
            } else {
                InteractionType::PenetrationToInside
            },
            intersection: Some(hit.point),
            end: *end,
            heading: *heading,
        };
    }

    let unit_heading = normalize(heading).or_else(|| normalize(&segment)).unwrap_or(scale(&hit.normal, -1.0));
    let pushed = add_scaled(&hit.point, &hit.normal, root_radius);

    // Rounding can leave the remaining length a hair above the true distance.
    let to_end = distance(&hit.point, end);
    let remaining = (length(&segment) - distance(start, &hit.point)).min(to_end).max(0.0);
    let (new_end, new_heading) =
        geometry.deflected_path(&hit, &pushed, end, &unit_heading, remaining, root_radius, rng);

    trace!(
        "Root (order {}) deflected by {:?} at {:?}, p = {:.4}, draw = {:.4}",
        branch_order, hit.surface, hit.point, probability, draw
    );

    Deflection {
        interaction: if started_inside {
            InteractionType::DeflectionToInside
        } else {
            InteractionType::DeflectionToOutside
        },
        intersection: Some(pushed),
        end: new_end,
        heading: new_heading,
    }
}

/// Grows `remaining` from `pushed` along the projection of `heading` onto
/// the plane with unit normal `normal`. Below `EPSILON` the end stays at `pushed`.
pub fn planar_path(
    normal: &[f64; 3],
    pushed: &[f64; 3],
    heading: &[f64; 3],
    remaining: f64,
    rng: &mut dyn RngCore,
) -> ([f64; 3], [f64; 3]) {
    let new_heading = tangential_heading(normal, heading, rng);
    let end = if remaining < EPSILON {
        *pushed
    } else {
        add_scaled(pushed, &new_heading, remaining)
    };
    (end, new_heading)
}

/// Projects `heading` onto the plane with unit normal `normal`.
///
/// A heading parallel to the normal has no tangential part; a random in-plane
/// direction is returned instead.
pub fn tangential_heading(normal: &[f64; 3], heading: &[f64; 3], rng: &mut dyn RngCore) -> [f64; 3] {
    if !is_parallel(heading, normal) {
        let along = dot(heading, normal);
        if let Some(h) = normalize(&add_scaled(heading, normal, -along)) {
            return h;
        }
    }
    let (u, v) = orthonormal_basis(normal);
    let theta = rng.r#gen::<f64>() * std::f64::consts::TAU;
    let h = add_scaled(&scale(&u, theta.cos()), &v, theta.sin());
    normalize(&h).unwrap_or(u)
}
