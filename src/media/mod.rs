pub mod element;
pub mod player;

pub use element::{MediaElement, MediaEvent, PlaybackError, ReadyState};
pub use player::{PlayerSettings, VideoPlayer};
