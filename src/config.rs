//! Editor configuration.
//!
//! Loaded from JSON; every field is optional and falls back to
//! [`EditorConfig::default`].

use anyhow::{Context, Result, bail};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::attach::SNAP_RADIUS;
use crate::geometry::{Region, Vec2};
use crate::model::Container;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum socket distance, in canvas units, at which blocks snap.
    pub snap_radius: f32,
    /// Drop region; dropping outside it deletes the dragged subtree.
    pub canvas: Region,
    pub canvas_scale: f32,
    pub floating_scale: f32,
    pub palette_scale: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap_radius: SNAP_RADIUS,
            canvas: Region::from_corners(Vec2::new(0.0, 0.0), Vec2::new(1024.0, 768.0)),
            canvas_scale: 1.0,
            floating_scale: 1.0,
            palette_scale: 1.0,
        }
    }
}

impl EditorConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("Open {}", path))?;
        let config: EditorConfig =
            serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path))?;
        config.validate().with_context(|| format!("Invalid config {}", path))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.snap_radius > 0.0) {
            bail!("snap_radius must be positive, got {}", self.snap_radius);
        }
        if !(self.canvas.width() >= 0.0 && self.canvas.height() >= 0.0) {
            bail!(
                "canvas min ({}, {}) must not exceed max ({}, {})",
                self.canvas.min.x,
                self.canvas.min.y,
                self.canvas.max.x,
                self.canvas.max.y
            );
        }
        for (name, scale) in [
            ("canvas_scale", self.canvas_scale),
            ("floating_scale", self.floating_scale),
            ("palette_scale", self.palette_scale),
        ] {
            if !(scale > 0.0) {
                bail!("{} must be positive, got {}", name, scale);
            }
        }
        Ok(())
    }

    /// Coordinate-scale factor of a container.
    pub fn scale_for(&self, container: Container) -> f32 {
        match container {
            Container::Palette => self.palette_scale,
            Container::Floating => self.floating_scale,
            Container::Canvas => self.canvas_scale,
        }
    }
}
