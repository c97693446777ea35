//! Core types used throughout the viewer

use serde::{Deserialize, Serialize};

/// Dense identifier of a drawable part, assigned in mesh-then-primitive order.
///
/// Ids are only stable for a fixed asset file: every load reassigns them.
pub type PartId = usize;

/// Display information about a loaded part, for building visibility checklists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartInfo {
    pub id: PartId,
    pub name: String,
}

/// How triangles are rasterized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Filled triangles
    #[default]
    Solid,
    /// Triangle edges only
    Wireframe,
    /// Vertices only, for very large models
    Points,
}

impl RenderMode {
    /// Flip between wireframe and solid (points switch back to solid)
    pub fn toggled_wireframe(self) -> Self {
        match self {
            RenderMode::Wireframe => RenderMode::Solid,
            _ => RenderMode::Wireframe,
        }
    }

    /// Flip between point cloud and solid
    pub fn toggled_points(self) -> Self {
        match self {
            RenderMode::Points => RenderMode::Solid,
            _ => RenderMode::Points,
        }
    }
}

/// RGBA color with floating point components (0.0 to 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    /// Create a color from RGBA values
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Convert to an array [r, g, b, a]
    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}
