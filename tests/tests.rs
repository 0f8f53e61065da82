use std::thread;
use std::time::{Duration, Instant};

use bangsim::simulation::engine::Engine;
use bangsim::simulation::params::{Parameters, UNIVERSE_AGE};
use bangsim::{
    big_bang, euler_advance, pair_force, parse_resolution, symplectic_euler, DrawCall, ForceSet,
    KdTree2, NVec2, NeighborGravity, Particle, ParticleSystem, ResizePrompt, Scenario,
    ScenarioConfig, ViewState,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const G: f64 = 6.67430e-11;
const MASS: f64 = 1e20;

/// Particle at `x` with no velocity and the default mass
pub fn still(x: [f64; 2]) -> Particle {
    Particle::new(NVec2::new(x[0], x[1]), NVec2::zeros(), MASS, [255, 255, 255])
}

/// Build a simple 2-particle system separated along x-axis
pub fn two_particle_system(dist: f64) -> ParticleSystem {
    ParticleSystem::new(vec![still([-dist / 2.0, 0.0]), still([dist / 2.0, 0.0])])
}

/// Gravity over all pairs, or over the `k` nearest neighbors
pub fn gravity_set(neighbors: Option<usize>) -> ForceSet {
    ForceSet::new().with(NeighborGravity { G, neighbors })
}

/// Index the current positions and compute forces, like one step does
pub fn compute_forces(sys: &mut ParticleSystem, forces: &ForceSet) {
    let index = KdTree2::build(&sys.positions());
    forces.compute_all(&index, sys);
}

/// Deterministic scattered points, no rand needed
pub fn scattered(n: usize) -> Vec<NVec2> {
    (0..n)
        .map(|i| {
            let i_f = i as f64;
            NVec2::new((i_f * 0.37).sin() * 5.0e9, (i_f * 0.13).cos() * 5.0e9 + i_f * 1.0e6)
        })
        .collect()
}

/// Reference answer for a nearest query: sort everything, keep `k`
pub fn brute_force_nearest(points: &[NVec2], q: NVec2, k: usize) -> Vec<usize> {
    let mut all: Vec<(f64, usize)> = points
        .iter()
        .enumerate()
        .map(|(i, p)| ((p - q).norm_squared(), i))
        .collect();
    all.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    all.into_iter().take(k).map(|(_, i)| i).collect()
}

pub fn scenario_from_yaml(yaml: &str) -> Scenario {
    let cfg = ScenarioConfig::from_yaml_str(yaml).expect("valid scenario");
    Scenario::build_scenario(&cfg)
}

pub fn rel_close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol * a.abs().max(b.abs())
}

// ==================================================================================
// Spatial index tests
// ==================================================================================

#[test]
fn kd_tree_matches_brute_force() {
    let points = scattered(300);
    let tree = KdTree2::build(&points);

    let queries = [points[0], points[123], NVec2::new(1.0e9, -2.0e9), NVec2::new(4.0e10, 4.0e10)];
    for q in queries {
        for k in [1, 7, 64, 300] {
            let got: Vec<usize> = tree.query_nearest(q, k).into_iter().map(|(i, _)| i).collect();
            assert_eq!(got, brute_force_nearest(&points, q, k), "mismatch for k = {k}");
        }
    }
}

#[test]
fn kd_tree_distances_are_ascending_and_exact() {
    let points = scattered(100);
    let tree = KdTree2::build(&points);
    let q = points[42];

    let found = tree.query_nearest(q, points.len());
    assert_eq!(found.len(), points.len());

    for pair in found.windows(2) {
        assert!(pair[0].1 <= pair[1].1, "distances not ascending: {:?}", pair);
    }
    for (i, d) in found {
        assert_eq!(d, (points[i] - q).norm_squared().sqrt());
    }
}

#[test]
fn kd_tree_query_point_comes_back_first() {
    let points = scattered(50);
    let tree = KdTree2::build(&points);

    let found = tree.query_nearest(points[17], 50);
    assert_eq!(found[0], (17, 0.0));
}

#[test]
fn kd_tree_rebuild_is_idempotent() {
    let points = scattered(257);
    let a = KdTree2::build(&points);
    let b = KdTree2::build(&points);

    for q in points.iter().step_by(16) {
        assert_eq!(a.query_nearest(*q, 257), b.query_nearest(*q, 257));
    }
}

#[test]
fn kd_tree_degenerate_sizes() {
    let empty = KdTree2::build(&[]);
    assert!(empty.is_empty());
    assert!(empty.query_nearest(NVec2::zeros(), 10).is_empty());

    let single = KdTree2::build(&[NVec2::new(3.0, 4.0)]);
    assert_eq!(single.query_nearest(NVec2::new(3.0, 4.0), 10), vec![(0, 0.0)]);

    let points = scattered(20);
    let tree = KdTree2::build(&points);
    assert!(tree.query_nearest(points[0], 0).is_empty());
    assert_eq!(tree.query_nearest(points[0], 1000).len(), 20);
}

#[test]
fn kd_tree_coincident_points_are_ordered_by_index() {
    let points = vec![NVec2::new(1.0, 1.0); 30];
    let tree = KdTree2::build(&points);

    let found = tree.query_nearest(NVec2::new(1.0, 1.0), 30);
    let expected: Vec<(usize, f64)> = (0..30).map(|i| (i, 0.0)).collect();
    assert_eq!(found, expected);
}

// ==================================================================================
// Gravity tests
// ==================================================================================

#[test]
fn gravity_newton_third_law() {
    let mut sys = ParticleSystem::new(vec![still([1.3e9, -2.1e9]), still([-4.0e8, 7.0e8])]);
    compute_forces(&mut sys, &gravity_set(None));

    let f_a = sys.particles[0].f;
    let f_b = sys.particles[1].f;

    assert!(f_a.norm() > 0.0);
    assert!((f_a + f_b).norm() <= 1e-12 * f_a.norm(), "net force not zero: {:?}", f_a + f_b);
}

#[test]
fn gravity_points_toward_other_particle() {
    let mut sys = two_particle_system(2.0e9);
    compute_forces(&mut sys, &gravity_set(None));

    let dx = sys.particles[1].x - sys.particles[0].x;
    assert!(sys.particles[0].f.dot(&dx) > 0.0, "force is not toward second particle");
}

#[test]
fn gravity_magnitude_matches_newton() {
    let mut sys = two_particle_system(1.0e9);
    compute_forces(&mut sys, &gravity_set(None));

    let expected = G * MASS * MASS / (1.0e9 * 1.0e9);
    assert!(rel_close(sys.particles[0].f.norm(), expected, 1e-12));
}

#[test]
fn gravity_inverse_square_law() {
    let mut sys_r = two_particle_system(1.0e9);
    let mut sys_2r = two_particle_system(2.0e9);
    let forces = gravity_set(None);

    compute_forces(&mut sys_r, &forces);
    compute_forces(&mut sys_2r, &forces);

    let ratio = sys_r.particles[0].f.norm() / sys_2r.particles[0].f.norm();
    assert!((ratio - 4.0).abs() < 1e-9, "Expected 4x, got {}", ratio);
}

#[test]
fn gravity_coincident_particles_are_guarded() {
    let mut sys = ParticleSystem::new(vec![
        still([5.0e8, 5.0e8]),
        still([5.0e8, 5.0e8]),
        still([-1.0e9, 0.0]),
    ]);
    compute_forces(&mut sys, &gravity_set(None));

    for p in &sys.particles {
        assert!(p.f.x.is_finite() && p.f.y.is_finite(), "non-finite force {:?}", p.f);
    }

    // The twins only feel the third particle
    let from_third = pair_force(sys.particles[0].x, MASS, sys.particles[2].x, MASS, G);
    assert!((sys.particles[0].f - from_third).norm() <= 1e-12 * from_third.norm());
    assert_eq!(sys.particles[0].f, sys.particles[1].f);

    assert_eq!(pair_force(NVec2::zeros(), MASS, NVec2::zeros(), MASS, G), NVec2::zeros());
}

#[test]
fn gravity_force_is_overwritten_not_accumulated() {
    let mut sys = ParticleSystem::new(scattered(40).into_iter().map(|x| still([x.x, x.y])).collect());
    let forces = gravity_set(None);

    compute_forces(&mut sys, &forces);
    let first: Vec<NVec2> = sys.particles.iter().map(|p| p.f).collect();

    sys.particles[3].f = NVec2::new(1.0e30, -1.0e30);
    compute_forces(&mut sys, &forces);
    let second: Vec<NVec2> = sys.particles.iter().map(|p| p.f).collect();

    assert_eq!(first, second);
}

#[test]
fn gravity_all_pairs_matches_direct_sum() {
    let mut sys = ParticleSystem::new(scattered(60).into_iter().map(|x| still([x.x, x.y])).collect());
    compute_forces(&mut sys, &gravity_set(None));

    for (i, pi) in sys.particles.iter().enumerate() {
        let direct = sys
            .particles
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .fold(NVec2::zeros(), |acc, (_, pj)| acc + pair_force(pi.x, pi.m, pj.x, pj.m, G));

        assert!((pi.f - direct).norm() <= 1e-9 * direct.norm(), "particle {i}: {:?} vs {:?}", pi.f, direct);
    }
}

#[test]
fn gravity_bounded_neighborhood_only_sees_nearest() {
    let mut sys = ParticleSystem::new(vec![still([0.0, 0.0]), still([1.0e9, 0.0]), still([1.0e10, 0.0])]);
    compute_forces(&mut sys, &gravity_set(Some(1)));

    let nearest_only = pair_force(sys.particles[0].x, MASS, sys.particles[1].x, MASS, G);
    assert!((sys.particles[0].f - nearest_only).norm() <= 1e-12 * nearest_only.norm());
}

// ==================================================================================
// Integrator tests
// ==================================================================================

#[test]
fn integrator_kicks_velocity_before_drifting_position() {
    let mut p = Particle::new(NVec2::new(10.0, -3.0), NVec2::new(2.0, 0.5), 4.0, [255, 255, 255]);
    p.f = NVec2::new(8.0, -12.0);
    let dt = 0.25;

    let (f, m, v0, p0) = (p.f, p.m, p.v, p.x);
    euler_advance(&mut p, dt);

    let v1 = v0 + f / m * dt;
    let p1 = p0 + v1 * dt;
    assert!((p.v - v1).norm() < 1e-12);
    assert!((p.x - p1).norm() < 1e-12);

    // Drifting with the old velocity would land somewhere else
    assert!((p.x - (p0 + v0 * dt)).norm() > 1e-3);
}

#[test]
fn integrator_advances_clock() {
    let mut sys = two_particle_system(1.0e9);
    symplectic_euler(&mut sys, 2.5);
    symplectic_euler(&mut sys, 2.5);
    assert_eq!(sys.t, 5.0);
}

// ==================================================================================
// Scenario tests
// ==================================================================================

#[test]
fn step_preserves_population() {
    let mut scenario = scenario_from_yaml("parameters:\n  particle_count: 150\n");
    assert_eq!(scenario.system.len(), 150);

    for _ in 0..3 {
        scenario.step();
        assert_eq!(scenario.system.len(), 150);
    }
}

#[test]
fn step_advances_time_by_fixed_dt() {
    let mut scenario = scenario_from_yaml("parameters:\n  particle_count: 20\n  h0: 7.5\n");
    for _ in 0..4 {
        scenario.step();
    }
    assert_eq!(scenario.system.t, 30.0);
}

#[test]
fn step_three_particles_end_to_end() {
    let mut scenario = scenario_from_yaml(
        "parameters:\n  h0: 1000.0\nbodies:\n  - x: [0.0, 0.0]\n  - x: [1.0e9, 0.0]\n  - x: [0.0, 1.0e9]\n",
    );
    let dt = scenario.parameters.h0;
    scenario.step();

    let origin = &scenario.system.particles[0];
    let f = origin.f;
    assert!(f.x > 0.0 && f.y > 0.0, "force not toward both neighbors: {:?}", f);
    assert!(rel_close(f.x, f.y, 1e-12));

    let expected_f = pair_force(NVec2::zeros(), MASS, NVec2::new(1.0e9, 0.0), MASS, G)
        + pair_force(NVec2::zeros(), MASS, NVec2::new(0.0, 1.0e9), MASS, G);
    assert!(rel_close(f.x, expected_f.x, 1e-12));

    // From rest: v1 = F/m*dt, x1 = v1*dt
    let expected_x = expected_f / MASS * dt * dt;
    assert!(rel_close(origin.x.x, expected_x.x, 1e-12));
    assert!(rel_close(origin.x.y, expected_x.y, 1e-12));
}

#[test]
fn big_bang_initial_conditions() {
    let params = Parameters {
        particle_count: 500,
        ..Default::default()
    };
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let particles = big_bang(&params, &mut rng);

    assert_eq!(particles.len(), 500);
    for p in &particles {
        assert!(p.x.norm() <= params.initial_radius * (1.0 + 1e-12));
        assert!(rel_close(p.v.norm(), params.explosion_velocity, 1e-12));
        // radial: position and velocity are parallel
        let cross = p.x.x * p.v.y - p.x.y * p.v.x;
        assert!(cross.abs() <= 1e-9 * p.x.norm() * p.v.norm() + 1e-6);
        assert!(p.x.dot(&p.v) >= 0.0);
        assert!(p.color.iter().all(|c| *c >= 100));
        assert_eq!(p.m, params.particle_mass);
        assert_eq!(p.f, NVec2::zeros());
    }
}

#[test]
fn big_bang_is_reproducible_from_seed() {
    let a = scenario_from_yaml("parameters:\n  particle_count: 30\n  seed: 9\n");
    let b = scenario_from_yaml("parameters:\n  particle_count: 30\n  seed: 9\n");
    let c = scenario_from_yaml("parameters:\n  particle_count: 30\n  seed: 10\n");

    assert_eq!(a.system.positions(), b.system.positions());
    assert_ne!(a.system.positions(), c.system.positions());
}

#[test]
fn scenario_new_registers_gravity() {
    let engine = Engine::default();
    let parameters = Parameters::default();
    let mut scenario = Scenario::new(engine, parameters, two_particle_system(1.0e9));

    scenario.step();
    assert!(scenario.system.particles[0].f.x > 0.0);
    assert!(scenario.system.particles[1].f.x < 0.0);
}

// ==================================================================================
// Render / view tests
// ==================================================================================

#[test]
fn origin_projects_to_screen_center_at_any_zoom() {
    let mut view = ViewState::new(800, 600, 1.0);
    for _ in 0..5 {
        assert_eq!(view.project(&NVec2::zeros()), Some((400, 300)));
        view.zoom_in();
    }
    for _ in 0..12 {
        view.zoom_out();
        assert_eq!(view.project(&NVec2::zeros()), Some((400, 300)));
    }
}

#[test]
fn projection_scales_with_zoom_and_culls_off_screen() {
    let view = ViewState::new(800, 600, 1.0);
    // 0.251 of the scale -> 200.8 px right of center, 150.6 px up
    assert_eq!(view.project(&NVec2::new(2.51e25, -2.51e25)), Some((600, 149)));
    assert_eq!(view.project(&NVec2::new(6.0e25, 0.0)), None);
    assert_eq!(view.project(&NVec2::new(0.0, -6.0e25)), None);
    assert_eq!(view.project(&NVec2::new(f64::NAN, 0.0)), None);

    let zoomed = ViewState::new(800, 600, 2.0);
    assert_eq!(zoomed.project(&NVec2::new(3.0e25, 0.0)), None);
    assert_eq!(zoomed.project(&NVec2::new(1.2505e25, 0.0)), Some((600, 300)));
}

#[test]
fn point_radius_rounds_and_never_drops_below_one() {
    assert_eq!(ViewState::new(800, 600, 1.0).point_radius(), 2);
    assert_eq!(ViewState::new(800, 600, 0.1).point_radius(), 1);
    assert_eq!(ViewState::new(800, 600, 1.3).point_radius(), 3);
    assert_eq!(ViewState::new(800, 600, 1.2).point_radius(), 2);
}

#[test]
fn zoom_steps_are_reversible() {
    let mut view = ViewState::default();
    view.zoom_in();
    assert!((view.zoom() - 1.1).abs() < 1e-12);
    view.zoom_out();
    assert!((view.zoom() - 1.0).abs() < 1e-12);
}

#[test]
fn render_draws_visible_particles_only() {
    let mut scenario = scenario_from_yaml(
        "bodies:\n  - x: [0.0, 0.0]\n    color: [200, 100, 150]\n  - x: [9.0e25, 0.0]\n",
    );
    let view = ViewState::new(800, 600, 1.0);
    let mut calls: Vec<DrawCall> = Vec::new();

    let drawn = scenario.render(&view, &mut calls);

    assert_eq!(drawn, 1);
    assert_eq!(calls, vec![DrawCall { x: 400, y: 300, color: [200, 100, 150], radius: 2 }]);

    // Resizing changes the projection, not the simulation
    let before = scenario.system.positions();
    let mut bigger = view.clone();
    bigger.set_resolution(1024, 768).unwrap();
    calls.clear();
    scenario.render(&bigger, &mut calls);
    assert_eq!(calls[0].x, 512);
    assert_eq!(scenario.system.positions(), before);

    scenario.step();
    assert_eq!(scenario.system.len(), 2);
}

// ==================================================================================
// Input tests
// ==================================================================================

#[test]
fn resolution_parsing_accepts_padded_numbers() {
    assert_eq!(parse_resolution(" 1024 ", "768\n").unwrap(), (1024, 768));
}

#[test]
fn resolution_parsing_rejects_bad_input() {
    assert!(parse_resolution("wide", "600").is_err());
    assert!(parse_resolution("800", "").is_err());
    assert!(parse_resolution("-800", "600").is_err());
    assert!(parse_resolution("0", "600").is_err());
    assert!(parse_resolution("800", "100000").is_err());
}

#[test]
fn invalid_resolution_keeps_previous_view() {
    let mut view = ViewState::new(800, 600, 1.0);
    assert!(view.set_resolution(0, 600).is_err());
    assert_eq!((view.width(), view.height()), (800, 600));
}

#[test]
fn resize_prompt_never_blocks_and_allows_one_at_a_time() {
    let mut prompt = ResizePrompt::new();
    assert!(prompt.poll().is_none());

    assert!(prompt.request_with(|| {
        thread::sleep(Duration::from_millis(20));
        Ok((640, 480))
    }));
    assert!(prompt.is_pending());
    assert!(!prompt.request_with(|| Ok((1, 1))), "second prompt started while one is pending");

    let deadline = Instant::now() + Duration::from_secs(5);
    let answer = loop {
        if let Some(answer) = prompt.poll() {
            break answer;
        }
        assert!(Instant::now() < deadline, "prompt never finished");
        thread::sleep(Duration::from_millis(1));
    };

    assert_eq!(answer.unwrap(), (640, 480));
    assert!(!prompt.is_pending());
    assert!(prompt.request_with(|| parse_resolution("x", "1")));
}

// ==================================================================================
// Configuration tests
// ==================================================================================

#[test]
fn config_defaults_match_startup_constants() {
    let cfg = ScenarioConfig::from_yaml_str("{}").unwrap();

    assert_eq!(cfg.parameters.G, G);
    assert_eq!(cfg.parameters.particle_mass, MASS);
    assert_eq!(cfg.parameters.explosion_velocity, 3e8);
    assert_eq!(cfg.parameters.particle_count, 1000);
    assert_eq!(cfg.parameters.initial_radius, 1e10);
    assert_eq!(cfg.engine.frame_rate, 60.0);
    assert_eq!(cfg.engine.neighbors, None);
    assert_eq!((cfg.view.width, cfg.view.height), (800, 600));
    assert!(rel_close(cfg.step_size(), UNIVERSE_AGE / 60.0 / 60.0, 1e-15));
    assert!(cfg.bodies.is_empty());
}

#[test]
fn config_step_override() {
    let cfg = ScenarioConfig::from_yaml_str("parameters:\n  h0: 0.5\n").unwrap();
    assert_eq!(cfg.step_size(), 0.5);
}

#[test]
fn config_rejects_invalid_values() {
    assert!(ScenarioConfig::from_yaml_str("parameters:\n  particle_mass: -1.0\n").is_err());
    assert!(ScenarioConfig::from_yaml_str("parameters:\n  h0: 0.0\n").is_err());
    assert!(ScenarioConfig::from_yaml_str("engine:\n  frame_rate: 0.0\n").is_err());
    assert!(ScenarioConfig::from_yaml_str("view:\n  width: 0\n").is_err());
    assert!(ScenarioConfig::from_yaml_str("bodies:\n  - x: [1.0, 2.0, 3.0]\n").is_err());
    assert!(ScenarioConfig::from_yaml_str("bodies:\n  - x: [1.0, 2.0]\n    m: 0.0\n").is_err());
    assert!(ScenarioConfig::from_yaml_str("parameters: [1, 2]\n").is_err());
}

#[test]
fn bundled_scenario_loads() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/big_bang.yaml");
    let file = std::fs::File::open(path).unwrap();
    let cfg = ScenarioConfig::from_reader(file).unwrap();

    assert_eq!(cfg.parameters.particle_count, 1000);
    assert!(rel_close(cfg.step_size(), UNIVERSE_AGE / 3600.0, 1e-6));
}
