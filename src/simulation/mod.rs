pub mod states;
pub mod params;
pub mod engine;
pub mod spatial_index;
pub mod forces;
pub mod integrator;
pub mod scenario;
