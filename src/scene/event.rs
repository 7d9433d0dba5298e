use crate::tracker::{MarkerId, TrackerEvent};

/// Everything the scene manager's run loop reacts to. Timer expiries carry
/// the sequence number of the timer that scheduled them so a stale expiry
/// that already reached the channel can be discarded by its owner.
#[derive(Debug, Clone)]
pub enum SceneEvent {
    Tracker(TrackerEvent),
    /// Found-debounce expired for a marker.
    FoundSettled { id: MarkerId, seq: u64 },
    /// Lost-debounce expired for a marker.
    LostSettled { id: MarkerId, seq: u64 },
    /// Post-show settle delay expired; playback should start.
    PlaybackDue { id: MarkerId, seq: u64 },
    /// A plane's opacity fade reached its scheduled end.
    FadeFinished { id: MarkerId, seq: u64 },
    /// The tracker never signalled readiness in time.
    ReadyFallback,
    /// Revert the status line to "searching" if nothing is active.
    StatusRevert,
    /// Periodic overlap-resolution tick (optional mode).
    SeparationSweep,
}
