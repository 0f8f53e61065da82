//! Projection from simulation space to window pixels
//!
//! `ViewState` replaces free-floating zoom/width/height globals: it is a
//! Bevy resource, changed only through `zoom_in`, `zoom_out` and
//! `set_resolution`. Changing it never touches the simulation.
//!
//! Pixel coordinates have their origin in the top-left corner of the
//! surface; simulation origin lands in the middle.

use anyhow::{ensure, Context, Result};
use bevy::prelude::Resource;

use crate::configuration::config::ViewConfig;
use crate::simulation::states::NVec2;

/// Simulation metres mapped onto one full surface width at zoom 1
pub const SCALE: f64 = 1e26;

/// Multiplier applied per zoom key press
pub const ZOOM_STEP: f64 = 1.1;

/// Largest accepted surface side, in pixels
pub const MAX_DIMENSION: u32 = 16384;

/// Consumer of projected particles (the render boundary)
pub trait RenderSink {
    fn draw_point(&mut self, x: i32, y: i32, color: [u8; 3], radius: u32);
}

/// One recorded `draw_point` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub x: i32,
    pub y: i32,
    pub color: [u8; 3],
    pub radius: u32,
}

/// Recording sink, for headless runs and tests
impl RenderSink for Vec<DrawCall> {
    fn draw_point(&mut self, x: i32, y: i32, color: [u8; 3], radius: u32) {
        self.push(DrawCall { x, y, color, radius });
    }
}

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct ViewState {
    zoom: f64,
    width: u32,
    height: u32,
}

impl ViewState {
    pub fn new(width: u32, height: u32, zoom: f64) -> Self {
        Self { zoom, width, height }
    }

    pub fn from_config(cfg: &ViewConfig) -> Self {
        Self::new(cfg.width, cfg.height, cfg.zoom)
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn zoom_in(&mut self) {
        self.zoom *= ZOOM_STEP;
    }

    pub fn zoom_out(&mut self) {
        self.zoom /= ZOOM_STEP;
    }

    /// Change the target surface size; invalid sizes leave the view untouched
    pub fn set_resolution(&mut self, width: u32, height: u32) -> Result<()> {
        ensure!(
            (1..=MAX_DIMENSION).contains(&width) && (1..=MAX_DIMENSION).contains(&height),
            "resolution must be between 1x1 and {MAX_DIMENSION}x{MAX_DIMENSION}, got {width}x{height}"
        );
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// On-screen radius of a particle: max(1, round(2 * zoom))
    pub fn point_radius(&self) -> u32 {
        (2.0 * self.zoom).round().max(1.0) as u32
    }

    /// Pixel position of `x`, or `None` if it falls outside the surface
    pub fn project(&self, x: &NVec2) -> Option<(i32, i32)> {
        let w = self.width as f64;
        let h = self.height as f64;

        let sx = (x.x / SCALE * w * self.zoom + w / 2.0).floor();
        let sy = (x.y / SCALE * h * self.zoom + h / 2.0).floor();

        // NaN fails both comparisons and is dropped here as well
        let visible = sx >= 0.0 && sx < w && sy >= 0.0 && sy < h;
        visible.then(|| (sx as i32, sy as i32))
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::from_config(&ViewConfig::default())
    }
}

/// Parse a user-entered `width` and `height`
pub fn parse_resolution(width: &str, height: &str) -> Result<(u32, u32)> {
    let w: u32 = width
        .trim()
        .parse()
        .with_context(|| format!("width {:?} is not a whole number", width.trim()))?;
    let h: u32 = height
        .trim()
        .parse()
        .with_context(|| format!("height {:?} is not a whole number", height.trim()))?;

    ensure!(w > 0 && h > 0, "resolution must be non-zero, got {w}x{h}");
    ensure!(
        w <= MAX_DIMENSION && h <= MAX_DIMENSION,
        "resolution must not exceed {MAX_DIMENSION}x{MAX_DIMENSION}, got {w}x{h}"
    );

    Ok((w, h))
}
