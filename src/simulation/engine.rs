//! High-level runtime engine settings
//!
//! Frame cadence of the real-time loop and the neighborhood size used by
//! the force model when building and running a `Scenario`

#[derive(Debug, Clone)]
pub struct Engine {
    pub frame_rate: f64, // target steps per wall-clock second
    pub neighbors: Option<usize>, // None = all pairs, Some(k) = k nearest only
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            frame_rate: 60.0,
            neighbors: None,
        }
    }
}
