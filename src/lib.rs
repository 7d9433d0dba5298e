pub mod config;
pub mod error;
pub mod media;
pub mod scene;
pub mod sim;
pub mod tracker;
pub mod ui;

pub use config::{Configuration, MarkerBinding};
pub use error::{MediaError, OverlayError, SessionError};
pub use media::{MediaElement, VideoPlayer};
pub use scene::{SceneHandle, SceneManager, SceneManagerBuilder};
pub use tracker::{MarkerId, Tracker, TrackerEvent};
