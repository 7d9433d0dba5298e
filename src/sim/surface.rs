use crate::scene::surface::{MaterialSettings, OpacityAnimation, RenderSurface};
use std::sync::Mutex;

/// Last-written attribute values of a [`SimSurface`], plus counters for
/// animation starts and clears.
#[derive(Debug, Clone, Default)]
pub struct SurfaceState {
    pub visible: bool,
    pub opacity: f32,
    pub position: (f32, f32, f32),
    pub rotation: (f32, f32, f32),
    pub size: (f32, f32),
    pub material: Option<MaterialSettings>,
    pub texture_source: Option<String>,
    pub animation: Option<OpacityAnimation>,
    pub animations_started: u32,
    pub animations_cleared: u32,
}

/// Render surface double that records every attribute write. A started
/// animation immediately reports its end value as the current opacity;
/// assertions about fades use the animation counters instead.
pub struct SimSurface {
    id: String,
    state: Mutex<SurfaceState>,
}

impl SimSurface {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: Mutex::new(SurfaceState::default()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SurfaceState {
        self.state.lock().unwrap().clone()
    }

    fn with_state(&self, mutate: impl FnOnce(&mut SurfaceState)) {
        mutate(&mut self.state.lock().unwrap());
    }
}

impl RenderSurface for SimSurface {
    fn set_visible(&self, visible: bool) {
        self.with_state(|state| state.visible = visible);
    }

    fn set_opacity(&self, opacity: f32) {
        self.with_state(|state| state.opacity = opacity);
    }

    fn set_position(&self, x: f32, y: f32, z: f32) {
        self.with_state(|state| state.position = (x, y, z));
    }

    fn set_rotation(&self, pitch: f32, yaw: f32, roll: f32) {
        self.with_state(|state| state.rotation = (pitch, yaw, roll));
    }

    fn set_size(&self, width: f32, height: f32) {
        self.with_state(|state| state.size = (width, height));
    }

    fn configure_material(&self, material: &MaterialSettings) {
        self.with_state(|state| state.material = Some(*material));
    }

    fn set_texture_source(&self, source_id: &str) {
        self.with_state(|state| state.texture_source = Some(source_id.to_string()));
    }

    fn animate_opacity(&self, animation: OpacityAnimation) {
        self.with_state(|state| {
            state.animation = Some(animation);
            state.animations_started += 1;
            state.opacity = animation.to;
        });
    }

    fn clear_animation(&self) {
        self.with_state(|state| {
            if state.animation.take().is_some() {
                state.animations_cleared += 1;
            }
        });
    }
}
