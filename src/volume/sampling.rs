use log::warn;
use rand::{Rng, RngCore};

use super::VolumeGeometry;
use crate::bounds::BoundingBox;
use crate::vector::EPSILON;

/// Failed draws after which the actual overlap is checked for degeneracy.
pub const SAMPLER_RECHECK_ATTEMPTS: usize = 100;
/// Total draws after which the jitter-lock placement is forced.
pub const SAMPLER_MAX_ATTEMPTS: usize = 1000;
/// Below this coincident proportion an inside draw is treated as degenerate.
pub const SAMPLER_INSIDE_CUTOFF: f64 = 0.001;
/// Above this coincident proportion an outside draw is treated as degenerate.
pub const SAMPLER_OUTSIDE_CUTOFF: f64 = 0.999;

/// Rejection samples a point of `cell` inside (or outside) `geometry`.
///
/// Inside draws are restricted to the overlap of the cell with the object's
/// bounding box. The loop always terminates: nearly degenerate overlaps switch
/// to `jitter_lock` after `SAMPLER_RECHECK_ATTEMPTS` draws and every search
/// ends there after `SAMPLER_MAX_ATTEMPTS` draws.
pub fn generate_random_point_in_box<G: VolumeGeometry + ?Sized>(
    geometry: &G,
    cell: &BoundingBox<3>,
    inside: bool,
    rng: &mut dyn RngCore,
) -> [f64; 3] {
    let region = if inside {
        match cell.intersection(&geometry.bounding_box()) {
            Some(region) => region,
            None => {
                warn!("No overlap between cell {:?} and {:?}, cannot place a point inside", cell, geometry);
                return cell.center();
            }
        }
    } else {
        *cell
    };

    let mut candidate = region.center();
    for attempt in 1..=SAMPLER_MAX_ATTEMPTS {
        candidate = random_point(&region, rng);
        if geometry.contains(&candidate) == inside {
            return candidate;
        }
        if attempt == SAMPLER_RECHECK_ATTEMPTS {
            let degenerate = match geometry.coincident_proportion(cell) {
                Ok(c) if inside => c.proportion < SAMPLER_INSIDE_CUTOFF,
                Ok(c) => c.proportion > SAMPLER_OUTSIDE_CUTOFF,
                Err(_) => true,
            };
            if degenerate {
                break;
            }
        }
    }

    let locked = geometry.jitter_lock(cell, &candidate, inside);
    if geometry.contains(&locked) != inside {
        warn!(
            "Jitter-lock could not place a point {} {:?} in cell {:?}",
            if inside { "inside" } else { "outside" },
            geometry,
            cell
        );
    }
    locked
}

pub(crate) fn random_point(region: &BoundingBox<3>, rng: &mut dyn RngCore) -> [f64; 3] {
    [
        region.min[0] + rng.r#gen::<f64>() * region.extent(0),
        region.min[1] + rng.r#gen::<f64>() * region.extent(1),
        region.min[2] + rng.r#gen::<f64>() * region.extent(2),
    ]
}

/// Clamps `value` into `[lo, hi]` kept a small margin away from both ends.
///
/// The margin is a thousandth of the range, but never less than ten times the
/// geometric tolerance and never more than half the range.
pub(crate) fn clamp_with_margin(value: f64, lo: f64, hi: f64) -> f64 {
    let span = hi - lo;
    if span <= 0.0 {
        return 0.5 * (lo + hi);
    }
    let margin = (1e-3 * span).max(10.0 * EPSILON).min(0.5 * span);
    value.clamp(lo + margin, hi - margin)
}

/// Of the two parts of `[cell_lo, cell_hi]` lying outside `(obj_lo, obj_hi)`,
/// the wider one, if any has room.
pub(crate) fn outside_range(cell_lo: f64, cell_hi: f64, obj_lo: f64, obj_hi: f64) -> Option<(f64, f64)> {
    let below = (cell_lo, cell_hi.min(obj_lo));
    let above = (cell_lo.max(obj_hi), cell_hi);
    let width = |r: (f64, f64)| r.1 - r.0;
    let best = if width(below) >= width(above) { below } else { above };
    if width(best) > 20.0 * EPSILON {
        Some(best)
    } else {
        None
    }
}
