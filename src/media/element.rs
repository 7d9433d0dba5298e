use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;

/// How much of the media source has been buffered, mirroring the readiness
/// ladder of the native playback element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    Empty,
    MetadataLoaded,
    CurrentData,
    FutureData,
    EnoughData,
}

/// Lifecycle notifications from the native playback element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaEvent {
    LoadStart,
    MetadataLoaded,
    CanPlay,
    Playing,
    Paused,
    Ended,
    Stalled,
    Waiting,
    Error(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("autoplay blocked by the user agent")]
    AutoplayBlocked,
    #[error("media source not supported: {0}")]
    Unsupported(String),
    #[error("media element failure: {0}")]
    Element(String),
}

/// Capability contract of the native media playback collaborator.
///
/// `try_play` is a single playback attempt; retry policy lives in
/// [`crate::media::VideoPlayer`]. Everything else is expected to be cheap
/// and non-blocking.
#[async_trait]
pub trait MediaElement: Send + Sync {
    fn source_id(&self) -> &str;

    fn ready_state(&self) -> ReadyState;

    /// Forces (re)buffering of the source.
    fn load(&self);

    async fn try_play(&self) -> Result<(), PlaybackError>;

    fn pause(&self) -> Result<(), PlaybackError>;

    fn seek_to_start(&self) -> Result<(), PlaybackError>;

    fn set_volume(&self, volume: f32);

    fn current_time(&self) -> Duration;

    /// None until metadata is loaded.
    fn duration(&self) -> Option<Duration>;

    /// Arms a one-shot "start playback on the next user gesture" handler
    /// on the element. Used after autoplay was refused.
    fn arm_gesture_playback(&self);

    fn subscribe(&self) -> broadcast::Receiver<MediaEvent>;
}
