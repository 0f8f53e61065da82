use std::time::Instant;

use crate::configuration::config::{ParametersConfig, ScenarioConfig};
use crate::simulation::scenario::Scenario;
use crate::simulation::spatial_index::KdTree2;

/// Time index build, force evaluation and a full step for a range of N
/// Paste output directly into a spreadsheet to graph
pub fn bench_step() {
    println!("N,build_ms,forces_ms,step_ms");

    for n in [250, 500, 1000, 2000] {
        let cfg = ScenarioConfig {
            parameters: ParametersConfig {
                particle_count: n,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut scenario = Scenario::build_scenario(&cfg);

        // Warm up
        scenario.step();

        let positions = scenario.system.positions();
        let t0 = Instant::now();
        let index = KdTree2::build(&positions);
        let build_ms = t0.elapsed().as_secs_f64() * 1000.0;

        let t1 = Instant::now();
        scenario.forces.compute_all(&index, &mut scenario.system);
        let forces_ms = t1.elapsed().as_secs_f64() * 1000.0;

        let t2 = Instant::now();
        scenario.step();
        let step_ms = t2.elapsed().as_secs_f64() * 1000.0;

        println!("{},{:.6},{:.6},{:.6}", n, build_ms, forces_ms, step_ms);
    }
}
