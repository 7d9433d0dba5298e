use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Spatial offset applied on top of a plane's base pose.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Offset {
    pub const ZERO: Offset = Offset {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Merges the set fields of `delta` over this offset.
    pub fn merged(self, delta: OffsetDelta) -> Self {
        Self {
            x: delta.x.unwrap_or(self.x),
            y: delta.y.unwrap_or(self.y),
            z: delta.z.unwrap_or(self.z),
        }
    }
}

/// Partial offset update; unset fields keep their current value.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct OffsetDelta {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    EaseInOutQuad,
}

/// Declarative time-boxed opacity transition handed to the renderer.
/// Completion is approximated by wall-clock timer, not a renderer
/// callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpacityAnimation {
    pub from: f32,
    pub to: f32,
    pub duration: Duration,
    pub easing: Easing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shader {
    Flat,
    Standard,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialSettings {
    pub shader: Shader,
    pub transparent: bool,
    pub alpha_test: f32,
}

/// Attribute-based contract of the external scene-graph renderer for one
/// textured plane.
pub trait RenderSurface: Send + Sync {
    fn set_visible(&self, visible: bool);

    fn set_opacity(&self, opacity: f32);

    fn set_position(&self, x: f32, y: f32, z: f32);

    /// Euler degrees.
    fn set_rotation(&self, pitch: f32, yaw: f32, roll: f32);

    fn set_size(&self, width: f32, height: f32);

    fn configure_material(&self, material: &MaterialSettings);

    fn set_texture_source(&self, source_id: &str);

    fn animate_opacity(&self, animation: OpacityAnimation);

    fn clear_animation(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_keeps_unset_fields() {
        let offset = Offset::new(1.0, 2.0, 3.0);
        let merged = offset.merged(OffsetDelta {
            x: Some(5.0),
            y: None,
            z: None,
        });
        assert_eq!(merged, Offset::new(5.0, 2.0, 3.0));
    }
}
