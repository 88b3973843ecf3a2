//! Artwork placement on a product template.

use serde::{Deserialize, Serialize};

/// Where uploaded artwork sits on a template: offset, scale and rotation.
///
/// Missing fields deserialize to the default placement, so partial records
/// written by older clients still load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    /// Degrees, clockwise.
    pub rotation: f64,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            rotation: 0.0,
        }
    }
}
