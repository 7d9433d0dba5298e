use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;

/// Stable identity of a physical fiducial marker, as declared in the
/// marker registry (e.g. `marker-01`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(String);

impl MarkerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MarkerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Raw signals from the external AR tracking collaborator. No payload
/// guarantees beyond marker identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    /// The tracking pipeline signalled it is ready to deliver detections.
    /// Some environments never send this; the scene manager arms a
    /// fallback timer.
    Ready,
    Found(MarkerId),
    Lost(MarkerId),
    Failed(String),
}

/// Detection event source. Implementations hand over their event stream
/// exactly once; the scene manager forwards it into its own loop.
pub trait Tracker: Send {
    fn take_events(&mut self) -> mpsc::UnboundedReceiver<TrackerEvent>;
}
