pub mod arbiter;
pub mod event;
pub mod manager;
pub mod marker;
pub mod plane;
pub mod stage;
pub mod surface;
pub mod timer;

pub use arbiter::{Arbiter, Arbitration};
pub use manager::{SceneHandle, SceneManager, SceneManagerBuilder, SceneSnapshot};
pub use marker::{ArMarker, DetectionState};
pub use plane::{PlaneState, VideoPlane};
pub use stage::{CameraAccess, CameraConstraints, CameraError, Stage};
pub use surface::{Easing, MaterialSettings, Offset, OffsetDelta, OpacityAnimation, RenderSurface};
