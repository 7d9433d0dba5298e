//! In-process collaborator doubles: a scripted tracker, a simulated media
//! element, an attribute-recording render surface, and panel/stage/camera
//! stand-ins. Used by the demo binary and the test suite; none of them
//! touch a real camera, renderer, or media pipeline.

pub mod media;
pub mod panels;
pub mod stage;
pub mod surface;
pub mod tracker;

pub use media::SimMediaElement;
pub use panels::{SimLoadingPanel, SimStatusPanel};
pub use stage::{SimCamera, SimStage};
pub use surface::{SimSurface, SurfaceState};
pub use tracker::{ScriptedTracker, SimTracker, TrackerFeed};
