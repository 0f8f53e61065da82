pub mod simulation;
pub mod configuration;
pub mod visualization;
pub mod benchmark;

pub use simulation::states::{Particle, ParticleSystem, NVec2};
pub use simulation::spatial_index::KdTree2;
pub use simulation::forces::{ForceModel, ForceSet, NeighborGravity, pair_force};
pub use simulation::integrator::{euler_advance, symplectic_euler};
pub use simulation::scenario::{Scenario, big_bang};

pub use configuration::config::{EngineConfig, ParametersConfig, ViewConfig, BodyConfig, ScenarioConfig};

pub use visualization::view::{ViewState, RenderSink, DrawCall, parse_resolution};
pub use visualization::input::ResizePrompt;
pub use visualization::bangsim_vis2d::run_2d;

pub use benchmark::benchmark::bench_step;
