use crate::scene::stage::{CameraAccess, CameraConstraints, CameraError, Stage};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Stage double recording overlay/scene visibility flips.
#[derive(Default)]
pub struct SimStage {
    entry_overlay_hidden: AtomicBool,
    scene_revealed: AtomicBool,
}

impl SimStage {
    pub fn entry_overlay_hidden(&self) -> bool {
        self.entry_overlay_hidden.load(Ordering::SeqCst)
    }

    pub fn scene_revealed(&self) -> bool {
        self.scene_revealed.load(Ordering::SeqCst)
    }
}

impl Stage for SimStage {
    fn hide_entry_overlay(&self) {
        self.entry_overlay_hidden.store(true, Ordering::SeqCst);
    }

    fn reveal_scene(&self) {
        self.scene_revealed.store(true, Ordering::SeqCst);
    }
}

/// Camera double that grants or denies permission.
pub struct SimCamera {
    denial: Option<String>,
    requests: AtomicU32,
}

impl SimCamera {
    pub fn granting() -> Self {
        Self {
            denial: None,
            requests: AtomicU32::new(0),
        }
    }

    pub fn denying(reason: impl Into<String>) -> Self {
        Self {
            denial: Some(reason.into()),
            requests: AtomicU32::new(0),
        }
    }

    pub fn requests(&self) -> u32 {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CameraAccess for SimCamera {
    async fn request_permission(
        &self,
        _constraints: &CameraConstraints,
    ) -> Result<(), CameraError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match &self.denial {
            Some(reason) => Err(CameraError::PermissionDenied(reason.clone())),
            None => Ok(()),
        }
    }
}
