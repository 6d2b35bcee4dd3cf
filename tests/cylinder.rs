use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rootvolume::vector::{dot, length, normalize};
use rootvolume::{
    BoundingBox, BoundingCylinder, DeflectionAlgorithm, Direction, InteractionType, Surface, SurfaceProperties,
    VolumeGeometry, VolumeObject,
};

const EPS: f64 = 1e-6;

fn cylinder(origin: [f64; 3], radius: f64, height: f64, properties: SurfaceProperties) -> BoundingCylinder {
    BoundingCylinder::new(origin, radius, height, properties).expect("valid cylinder")
}

fn unit_cylinder() -> BoundingCylinder {
    cylinder([0.0, 0.0, 0.0], 1.0, 1.0, SurfaceProperties::default())
}

#[test]
fn test_boundary_consistency() {
    let c = unit_cylinder();
    assert!(c.contains(&[0.0, 0.0, 0.5 + EPS]));
    assert!(c.contains(&[0.0, 0.0, EPS]));
    assert!(!c.contains(&[0.0, 0.0, -EPS]));
    assert!(c.contains(&[0.0, 0.0, 1.0 - EPS]));
    assert!(!c.contains(&[0.0, 0.0, 1.0 + EPS]));
    assert!(c.contains(&[1.0 - EPS, 0.0, 0.5]));
    assert!(!c.contains(&[1.0 + EPS, 0.0, 0.5]));
    assert!(!c.contains(&[0.0, -1.0 - EPS, 0.5]));

    // Boundary points are consistently outside.
    for _ in 0..3 {
        assert!(!c.contains(&[1.0, 0.0, 0.5]));
        assert!(!c.contains(&[0.0, 0.0, 0.0]));
    }
}

#[test]
fn test_coincident_proportion_full_and_empty() {
    let c = cylinder([0.0, 0.0, 0.0], 10.0, 10.0, SurfaceProperties::default());

    let inside = c.coincident_proportion(&BoundingBox::new([-1.0, -1.0, 2.0], [1.0, 1.0, 3.0])).unwrap();
    assert!((inside.proportion - 1.0).abs() < 1e-9, "Expected 1, got {}", inside.proportion);
    assert!(!inside.restriction.any());

    let outside = c.coincident_proportion(&BoundingBox::new([20.0, 20.0, 2.0], [21.0, 21.0, 3.0])).unwrap();
    assert_eq!(outside.proportion, 0.0);
    assert!(!outside.restriction.any());

    let above = c.coincident_proportion(&BoundingBox::new([-1.0, -1.0, -3.0], [1.0, 1.0, -2.0])).unwrap();
    assert_eq!(above.proportion, 0.0);
}

#[test]
fn test_coincident_proportion_half_depth() {
    let props = SurfaceProperties { top_permeability: 0.3, ..SurfaceProperties::default() };
    let c = cylinder([0.0, 0.0, 0.0], 10.0, 10.0, props);
    let cell = BoundingBox::new([-1.0, -1.0, -0.5], [1.0, 1.0, 0.5]);
    let coincidence = c.coincident_proportion(&cell).unwrap();
    assert!((coincidence.proportion - 0.5).abs() < 1e-9, "Expected 0.5, got {}", coincidence.proportion);
    assert!(coincidence.restriction.is_restricted(Direction::NegZ));
    assert!(coincidence.restriction.is_restricted(Direction::PosZ));
    assert_eq!(coincidence.restriction.permeability(Direction::PosZ), Some(0.3));
}

#[test]
fn test_coincident_proportion_whole_cylinder_in_cell() {
    let c = cylinder([0.0, 0.0, 1.0], 1.0, 2.0, SurfaceProperties::default());
    let cell = BoundingBox::new([-2.0, -2.0, 0.0], [2.0, 2.0, 4.0]);
    let coincidence = c.coincident_proportion(&cell).unwrap();
    let expected = c.cross_section().area() * 2.0 / cell.volume();
    assert!((coincidence.proportion - expected).abs() < 1e-9);
    // Both discs lie inside the cell and cover the whole outline.
    assert!(coincidence.restriction.is_restricted(Direction::NegZ));
    assert!(coincidence.restriction.is_restricted(Direction::PosZ));
    assert!(!coincidence.restriction.is_restricted(Direction::NegX));
}

#[test]
fn test_wall_crossing_cell_is_single_sided() {
    let props = SurfaceProperties { side_permeability: 0.1, ..SurfaceProperties::default() };
    let c = cylinder([0.0, 0.0, 0.0], 10.0, 10.0, props);
    // The wall enters through the right face and leaves through the top (+y) face.
    let cell = BoundingBox::new([6.5, 6.5, 2.0], [7.5, 7.5, 3.0]);
    let coincidence = c.coincident_proportion(&cell).unwrap();
    assert!(coincidence.proportion > 0.0 && coincidence.proportion < 1.0);
    assert!(coincidence.restriction.is_restricted(Direction::PosX));
    assert!(coincidence.restriction.is_restricted(Direction::PosY));
    assert!(!coincidence.restriction.is_restricted(Direction::NegX));
    assert!(!coincidence.restriction.is_restricted(Direction::NegY));
    assert_eq!(coincidence.restriction.permeability(Direction::PosX), Some(0.1));
}

#[test]
fn test_coincident_proportion_never_exceeds_one() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..500 {
        let c = cylinder(
            [rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0)],
            rng.gen_range(0.1..5.0),
            rng.gen_range(0.1..5.0),
            SurfaceProperties::default(),
        );
        let min = [rng.gen_range(-8.0..8.0), rng.gen_range(-8.0..8.0), rng.gen_range(-8.0..8.0)];
        let max = [
            min[0] + rng.gen_range(0.05..4.0),
            min[1] + rng.gen_range(0.05..4.0),
            min[2] + rng.gen_range(0.05..4.0),
        ];
        let cell = BoundingBox::new(min, max);
        let coincidence = c.coincident_proportion(&cell).expect("proportion within bounds");
        assert!(coincidence.proportion >= 0.0 && coincidence.proportion <= 1.0 + 1e-9);
    }
}

#[test]
fn test_no_interaction_when_boxes_disjoint() {
    let c = unit_cylinder();
    let mut rng = StdRng::seed_from_u64(1);
    let start = [5.0, 5.0, 0.5];
    let end = [6.0, 5.5, 0.7];
    let heading = normalize(&[1.0, 0.5, 0.2]).unwrap();
    let result = c.deflect_root_segment(&start, &end, &heading, 0.01, 1, &mut rng);
    assert_eq!(result.interaction, InteractionType::NoInteraction);
    assert_eq!(result.end, end);
    assert!(result.intersection.is_none());
}

#[test]
fn test_directly_specified_certain_penetration() {
    let props = SurfaceProperties::uniform(DeflectionAlgorithm::DirectlySpecified, 1.0, 0.0);
    let c = cylinder([0.0, 0.0, 0.0], 1.0, 1.0, props);
    let mut rng = StdRng::seed_from_u64(9);
    for i in 0..200 {
        let angle = i as f64 * 0.031;
        let start = [3.0 * angle.cos(), 3.0 * angle.sin(), 0.5];
        let end = [0.2 * (angle + 1.0).cos(), 0.2 * (angle + 1.0).sin(), 0.4];
        let heading = normalize(&[end[0] - start[0], end[1] - start[1], end[2] - start[2]]).unwrap();
        let result = c.deflect_root_segment(&start, &end, &heading, 0.01, 0, &mut rng);
        assert_eq!(result.interaction, InteractionType::PenetrationToInside);
        assert_eq!(result.end, end);
    }
}

#[test]
fn test_cosin_proportional_probability() {
    let props = SurfaceProperties::uniform(DeflectionAlgorithm::CosinProportional, 0.6, 0.0);
    let c = cylinder([0.0, 0.0, 0.0], 1.0, 1.0, props);
    // Head on: the heading is anti-parallel to the normal facing the root.
    assert!((c.root_penetration_probability(Surface::Curved, std::f64::consts::PI) - 0.6).abs() < 1e-12);
    assert!((c.root_penetration_probability(Surface::Top, 0.0) - 0.6).abs() < 1e-12);
    assert!(c.root_penetration_probability(Surface::Curved, std::f64::consts::FRAC_PI_2 + 1e-4) < 1e-3);

    let certain = cylinder([0.0, 0.0, 0.0], 1.0, 1.0, SurfaceProperties::uniform(DeflectionAlgorithm::CosinProportional, 1.0, 0.0));
    assert_eq!(certain.root_penetration_probability(Surface::Curved, std::f64::consts::FRAC_PI_2), 1.0);
}

#[test]
fn test_head_on_penetration_rate() {
    let props = SurfaceProperties::uniform(DeflectionAlgorithm::CosinProportional, 0.5, 0.0);
    let c = cylinder([0.0, 0.0, 0.0], 1.0, 1.0, props);
    let mut rng = StdRng::seed_from_u64(2024);
    let trials = 4000;
    let mut penetrated = 0;
    for _ in 0..trials {
        let result = c.deflect_root_segment(&[-3.0, 0.0, 0.5], &[0.0, 0.0, 0.5], &[1.0, 0.0, 0.0], 0.01, 0, &mut rng);
        match result.interaction {
            InteractionType::PenetrationToInside => penetrated += 1,
            InteractionType::DeflectionToOutside => {}
            other => panic!("unexpected interaction {:?}", other),
        }
    }
    let rate = penetrated as f64 / trials as f64;
    assert!((rate - 0.5).abs() < 0.05, "Penetration rate {} too far from 0.5", rate);
}

#[test]
fn test_curved_deflection_from_outside() {
    let c = unit_cylinder();
    let mut rng = StdRng::seed_from_u64(5);
    let start = [-3.0, 0.2, 0.5];
    let end = [0.0, 0.4, 0.6];
    let heading = normalize(&[3.0, 0.2, 0.1]).unwrap();
    let result = c.deflect_root_segment(&start, &end, &heading, 0.05, 2, &mut rng);
    assert_eq!(result.interaction, InteractionType::DeflectionToOutside);

    assert!((length(&result.heading) - 1.0).abs() < 1e-9);
    assert!(dot(&result.heading, &heading) < 1.0 - 1e-6, "Heading should change");
    // Vertical growth continues, the horizontal part turns towards +y.
    assert!(result.heading[2] > 0.0);
    assert!(result.heading[1] > 0.0);

    let hit = result.intersection.expect("deflection has an intersection");
    let r = (hit[0] * hit[0] + hit[1] * hit[1]).sqrt();
    assert!((r - 1.05).abs() < 1e-9, "Intersection should be pushed off the wall, r = {}", r);
    assert!(!c.contains(&hit));
}

#[test]
fn test_curved_deflection_from_inside() {
    let c = cylinder([0.0, 0.0, 0.0], 2.0, 2.0, SurfaceProperties::default());
    let mut rng = StdRng::seed_from_u64(11);
    let start = [0.0, 0.0, 1.0];
    let end = [3.0, 0.5, 1.0];
    let heading = normalize(&[3.0, 0.5, 0.0]).unwrap();
    let result = c.deflect_root_segment(&start, &end, &heading, 0.1, 1, &mut rng);
    assert_eq!(result.interaction, InteractionType::DeflectionToInside);
    let hit = result.intersection.unwrap();
    assert!(c.contains(&hit));
    assert!((length(&result.heading) - 1.0).abs() < 1e-9);
}

#[test]
fn test_disc_deflection_is_planar() {
    let c = cylinder([0.0, 0.0, 0.0], 2.0, 2.0, SurfaceProperties::default());
    let mut rng = StdRng::seed_from_u64(13);
    let start = [0.0, 0.0, -1.0];
    let end = [0.5, 0.0, 1.0];
    let heading = normalize(&[0.5, 0.0, 2.0]).unwrap();
    let result = c.deflect_root_segment(&start, &end, &heading, 0.02, 0, &mut rng);
    assert_eq!(result.interaction, InteractionType::DeflectionToOutside);
    assert!((result.heading[0] - 1.0).abs() < 1e-9);
    assert!(result.heading[2].abs() < 1e-9);
    assert!((result.end[2] + 0.02).abs() < 1e-9);
}

#[test]
fn test_wall_deflection_from_inside_stays_inside() {
    let c = unit_cylinder();
    let start = [0.0, 0.5, 0.5];
    let end = [0.0, 3.0, 0.5];
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let result = c.deflect_root_segment(&start, &end, &[0.0, 1.0, 0.0], 0.01, 0, &mut rng);
        assert_eq!(result.interaction, InteractionType::DeflectionToInside);
        assert!(c.contains(&result.end), "seed {}: {:?} left the cylinder", seed, result.end);
        let pushed = result.intersection.unwrap();
        assert!(c.closest_intersection(&pushed, &result.end).is_none());
    }
}

#[test]
fn test_wall_deflection_from_outside_stays_outside() {
    let c = unit_cylinder();
    let start = [-3.0, 0.05, 0.5];
    for end in [[0.0, 0.05, 0.5], [8.0, 0.05, 0.5]] {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let heading = normalize(&[end[0] - start[0], end[1] - start[1], end[2] - start[2]]).unwrap();
            let result = c.deflect_root_segment(&start, &end, &heading, 0.01, 0, &mut rng);
            assert_eq!(result.interaction, InteractionType::DeflectionToOutside);
            assert!(!c.contains(&result.end), "seed {}: {:?} entered the cylinder", seed, result.end);
            let pushed = result.intersection.unwrap();
            let mid = [
                0.5 * (pushed[0] + result.end[0]),
                0.5 * (pushed[1] + result.end[1]),
                0.5 * (pushed[2] + result.end[2]),
            ];
            assert!(!c.contains(&mid));
            assert!(c.closest_intersection(&pushed, &result.end).is_none());
        }
    }
}

#[test]
fn test_long_wall_deflections_never_cross_back() {
    let c = unit_cylinder();
    let mut rng = StdRng::seed_from_u64(64);
    let mut long_inside = 0;
    let mut long_outside = 0;
    for _ in 0..300 {
        let root_radius = rng.gen_range(0.001..0.1);
        let a = rng.gen_range(0.0..std::f64::consts::TAU);
        let b = rng.gen_range(0.0..std::f64::consts::TAU);
        let near = rng.gen_range(0.0..0.8);
        let far = rng.gen_range(2.0..6.0);
        let inner = [near * a.cos(), near * a.sin(), rng.gen_range(0.3..0.7)];
        let outer = [far * b.cos(), far * b.sin(), rng.gen_range(0.3..0.7)];

        // Inbound roots aim through the axis region and past the far wall.
        let beyond = [2.0 * inner[0] - outer[0], 2.0 * inner[1] - outer[1], 2.0 * inner[2] - outer[2]];

        for (start, end, expected) in [
            (inner, outer, InteractionType::DeflectionToInside),
            (outer, beyond, InteractionType::DeflectionToOutside),
        ] {
            let heading = normalize(&[end[0] - start[0], end[1] - start[1], end[2] - start[2]]).unwrap();
            let result = c.deflect_root_segment(&start, &end, &heading, root_radius, 0, &mut rng);
            assert_eq!(result.interaction, expected);
            let pushed = result.intersection.unwrap();
            let from_inside = expected == InteractionType::DeflectionToInside;
            assert_eq!(c.contains(&result.end), from_inside, "{:?} -> {:?} ended at {:?}", start, end, result.end);
            assert!(c.closest_intersection(&pushed, &result.end).is_none());
            assert!((length(&result.heading) - 1.0).abs() < 1e-9);

            let remaining = length(&[end[0] - pushed[0], end[1] - pushed[1], 0.0]);
            if remaining > std::f64::consts::PI {
                if from_inside {
                    long_inside += 1;
                } else {
                    long_outside += 1;
                }
            }
        }
    }
    assert!(long_inside > 0 && long_outside > 0);
}

#[test]
fn test_random_points_respect_mode() {
    let c = cylinder([0.0, 0.0, 0.0], 2.0, 2.0, SurfaceProperties::default());
    let mut rng = StdRng::seed_from_u64(77);
    let cells = [
        BoundingBox::new([1.0, 1.0, 0.5], [2.5, 2.5, 1.5]),
        BoundingBox::new([-0.5, -0.5, -0.5], [0.5, 0.5, 0.5]),
        BoundingBox::new([1.8, -0.2, 1.8], [2.3, 0.2, 2.3]),
    ];
    for cell in &cells {
        for _ in 0..50 {
            let p = c.generate_random_point_in_box(cell, true, &mut rng);
            assert!(c.contains(&p), "{:?} should be inside", p);
            assert!(cell.contains(&p));
            let q = c.generate_random_point_in_box(cell, false, &mut rng);
            assert!(!c.contains(&q), "{:?} should be outside", q);
            assert!(cell.contains(&q));
        }
    }
}

#[test]
fn test_sampler_terminates_when_no_outside_exists() {
    let c = cylinder([0.0, 0.0, 0.0], 5.0, 5.0, SurfaceProperties::default());
    let mut rng = StdRng::seed_from_u64(3);
    let cell = BoundingBox::new([-1.0, -1.0, 1.0], [1.0, 1.0, 2.0]);
    let p = c.generate_random_point_in_box(&cell, false, &mut rng);
    assert!(cell.contains(&p));
}

#[test]
fn test_sampler_sliver_overlap() {
    let c = unit_cylinder();
    let mut rng = StdRng::seed_from_u64(8);
    let cell = BoundingBox::new([0.0, 0.0, 0.999], [1.0, 1.0, 1.999]);
    for _ in 0..20 {
        let p = c.generate_random_point_in_box(&cell, true, &mut rng);
        assert!(c.contains(&p), "{:?} should be inside", p);
    }
}

#[derive(Default)]
struct Recorder {
    cylinders: Vec<(usize, [f64; 3], f64, f64)>,
}

impl rootvolume::GeometryVisitor for Recorder {
    fn visit_cylinder(&mut self, id: usize, origin: [f64; 3], radius: f64, height: f64) {
        self.cylinders.push((id, origin, radius, height));
    }

    fn visit_prism(&mut self, _id: usize, _min: [f64; 3], _max: [f64; 3]) {
        panic!("not a prism");
    }
}

#[test]
fn test_export_happens_once() {
    let mut object = VolumeObject::new(4, Box::new(cylinder([1.0, 2.0, 3.0], 0.5, 2.0, SurfaceProperties::default())));
    let mut recorder = Recorder::default();
    assert!(!object.is_exported());
    assert!(object.export(&mut recorder));
    assert!(!object.export(&mut recorder));
    assert!(object.is_exported());
    assert_eq!(recorder.cylinders, vec![(4, [1.0, 2.0, 3.0], 0.5, 2.0)]);
}
