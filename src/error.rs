use crate::media::element::PlaybackError;
use crate::tracker::MarkerId;
use thiserror::Error;

// Main application error type

#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
    #[error("Media error: {0}")]
    Media(#[from] MediaError),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

// Session bring-up and lifecycle errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Camera permission denied: {0}")]
    PermissionDenied(String),
    #[error("Marker {marker} has no registered {what}")]
    IncompleteBinding {
        marker: MarkerId,
        what: &'static str,
    },
    #[error("Required collaborator not provided: {0}")]
    MissingCollaborator(&'static str),
    #[error("The scene manager has terminated")]
    Terminated,
}

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Autoplay blocked for {source_id}; armed click-to-play fallback")]
    AutoplayBlocked { source_id: String },
    #[error("Failed to start {source_id} after {attempts} attempts: {reason}")]
    StartFailed {
        source_id: String,
        attempts: u32,
        reason: PlaybackError,
    },
}
