use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum CameraError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("no suitable camera available")]
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraFacing {
    Environment,
    User,
}

#[derive(Debug, Clone, Copy)]
pub struct DimensionHint {
    pub ideal: u32,
    pub min: u32,
    pub max: u32,
}

/// Capture constraints requested from the camera collaborator.
#[derive(Debug, Clone, Copy)]
pub struct CameraConstraints {
    pub facing: CameraFacing,
    pub width: DimensionHint,
    pub height: DimensionHint,
    pub aspect_ratio: f32,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            facing: CameraFacing::Environment,
            width: DimensionHint {
                ideal: 1280,
                min: 640,
                max: 1920,
            },
            height: DimensionHint {
                ideal: 960,
                min: 480,
                max: 1080,
            },
            aspect_ratio: 4.0 / 3.0,
        }
    }
}

/// Camera permission collaborator. Denial is fatal to session bring-up.
#[async_trait]
pub trait CameraAccess: Send + Sync {
    async fn request_permission(&self, constraints: &CameraConstraints) -> Result<(), CameraError>;
}

/// The host page chrome around the AR scene: the tap-to-start entry
/// overlay and the scene surface itself.
pub trait Stage: Send + Sync {
    fn hide_entry_overlay(&self);

    fn reveal_scene(&self);
}
