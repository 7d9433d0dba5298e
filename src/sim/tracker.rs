use crate::tracker::{MarkerId, Tracker, TrackerEvent};
use std::time::Duration;
use tokio::sync::mpsc;

/// Manually driven tracker double; the paired [`TrackerFeed`] injects raw
/// detection events.
pub struct SimTracker {
    receiver: Option<mpsc::UnboundedReceiver<TrackerEvent>>,
}

impl SimTracker {
    pub fn channel() -> (Self, TrackerFeed) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self { receiver: Some(rx) },
            TrackerFeed { events: tx },
        )
    }
}

impl Tracker for SimTracker {
    fn take_events(&mut self) -> mpsc::UnboundedReceiver<TrackerEvent> {
        self.receiver
            .take()
            .expect("tracker events already taken")
    }
}

#[derive(Clone)]
pub struct TrackerFeed {
    events: mpsc::UnboundedSender<TrackerEvent>,
}

impl TrackerFeed {
    pub fn ready(&self) {
        let _ = self.events.send(TrackerEvent::Ready);
    }

    pub fn found(&self, id: impl Into<MarkerId>) {
        let _ = self.events.send(TrackerEvent::Found(id.into()));
    }

    pub fn lost(&self, id: impl Into<MarkerId>) {
        let _ = self.events.send(TrackerEvent::Lost(id.into()));
    }

    pub fn fail(&self, reason: impl Into<String>) {
        let _ = self.events.send(TrackerEvent::Failed(reason.into()));
    }
}

/// Tracker double that replays a fixed script, each step delayed relative
/// to the previous one.
pub struct ScriptedTracker {
    steps: Vec<(Duration, TrackerEvent)>,
}

impl ScriptedTracker {
    pub fn new(steps: Vec<(Duration, TrackerEvent)>) -> Self {
        Self { steps }
    }
}

impl Tracker for ScriptedTracker {
    fn take_events(&mut self) -> mpsc::UnboundedReceiver<TrackerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let steps = std::mem::take(&mut self.steps);
        tokio::spawn(async move {
            for (delay, event) in steps {
                tokio::time::sleep(delay).await;
                if tx.send(event).is_err() {
                    break;
                }
            }
        });
        rx
    }
}
