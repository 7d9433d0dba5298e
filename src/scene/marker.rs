use crate::config::Configuration;
use crate::scene::event::SceneEvent;
use crate::scene::timer::{self, EventTimer};
use crate::tracker::MarkerId;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionState {
    Idle,
    PendingActivation,
    Active,
    PendingDeactivation,
}

#[derive(Debug, Clone, Copy)]
pub struct DebounceTiming {
    /// Suppresses flicker from rapid re-detection.
    pub found_debounce: Duration,
    /// Tolerates brief occlusion without disrupting playback.
    pub lost_debounce: Duration,
    /// Delay between plane show and playback start.
    pub playback_settle: Duration,
}

impl From<&Configuration> for DebounceTiming {
    fn from(config: &Configuration) -> Self {
        Self {
            found_debounce: config.found_debounce(),
            lost_debounce: config.lost_debounce(),
            playback_settle: config.playback_settle(),
        }
    }
}

/// Debounces one marker's raw found/lost signals into stable activate and
/// deactivate decisions. Cross-marker arbitration is the scene manager's
/// job; this type only runs the per-marker state machine and its timers.
///
/// Starting either debounce timer always cancels the other first, so at
/// most one of the two is pending at any instant.
pub struct ArMarker {
    id: MarkerId,
    state: DetectionState,
    last_detection: Option<Instant>,
    found_timer: Option<EventTimer>,
    lost_timer: Option<EventTimer>,
    settle_timer: Option<EventTimer>,
    next_seq: u64,
    timing: DebounceTiming,
    events: mpsc::UnboundedSender<SceneEvent>,
}

impl ArMarker {
    pub fn new(
        id: MarkerId,
        timing: DebounceTiming,
        events: mpsc::UnboundedSender<SceneEvent>,
    ) -> Self {
        debug!("ARMarker initialized for: {id}");
        Self {
            id,
            state: DetectionState::Idle,
            last_detection: None,
            found_timer: None,
            lost_timer: None,
            settle_timer: None,
            next_seq: 0,
            timing,
            events,
        }
    }

    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Raw found signal. Ignored while active; otherwise cancels any
    /// pending deactivation and (re)starts the activation debounce.
    pub fn on_found(&mut self) {
        if self.state == DetectionState::Active {
            return;
        }
        self.lost_timer = None;
        let seq = self.next_seq();
        self.found_timer = Some(EventTimer::schedule(
            self.events.clone(),
            self.timing.found_debounce,
            seq,
            SceneEvent::FoundSettled {
                id: self.id.clone(),
                seq,
            },
        ));
        self.state = DetectionState::PendingActivation;
    }

    /// Raw lost signal. Cancels any pending activation and (re)starts the
    /// deactivation debounce.
    pub fn on_lost(&mut self) {
        self.found_timer = None;
        let seq = self.next_seq();
        self.lost_timer = Some(EventTimer::schedule(
            self.events.clone(),
            self.timing.lost_debounce,
            seq,
            SceneEvent::LostSettled {
                id: self.id.clone(),
                seq,
            },
        ));
        self.state = match self.state {
            DetectionState::Active | DetectionState::PendingDeactivation => {
                DetectionState::PendingDeactivation
            }
            _ => DetectionState::Idle,
        };
    }

    /// Activation debounce expired. Returns true when the expiry is
    /// current and the marker should request arbitration.
    pub fn found_settled(&mut self, seq: u64) -> bool {
        if !timer::is_current(&self.found_timer, seq) {
            debug!("Stale found expiry for {}, ignoring", self.id);
            return false;
        }
        self.found_timer = None;
        self.state == DetectionState::PendingActivation
    }

    /// Deactivation debounce expired. Performs the local deactivation and
    /// returns true when the caller should notify arbitration and hide the
    /// plane. No-op unless a deactivation was actually pending.
    pub fn lost_settled(&mut self, seq: u64) -> bool {
        if !timer::is_current(&self.lost_timer, seq) {
            debug!("Stale lost expiry for {}, ignoring", self.id);
            return false;
        }
        self.lost_timer = None;
        if self.state != DetectionState::PendingDeactivation {
            return false;
        }
        self.settle_timer = None;
        self.state = DetectionState::Idle;
        true
    }

    /// Arbitration granted.
    pub fn mark_active(&mut self) {
        self.state = DetectionState::Active;
        self.last_detection = Some(Instant::now());
    }

    /// Schedules the post-show playback settle delay.
    pub fn schedule_playback(&mut self) {
        let seq = self.next_seq();
        self.settle_timer = Some(EventTimer::schedule(
            self.events.clone(),
            self.timing.playback_settle,
            seq,
            SceneEvent::PlaybackDue {
                id: self.id.clone(),
                seq,
            },
        ));
    }

    /// Settle delay expired. Returns true when playback should start.
    pub fn playback_due(&mut self, seq: u64) -> bool {
        if !timer::is_current(&self.settle_timer, seq) {
            return false;
        }
        self.settle_timer = None;
        self.state == DetectionState::Active
    }

    /// Arbitration preempted this marker: bypass debounce entirely. All
    /// pending timers are cancelled and the marker is idle afterwards,
    /// whatever state it was in. Does not notify arbitration; the
    /// preemption step already replaced the active record.
    pub fn force_deactivate(&mut self) {
        debug!("Force deactivating marker: {}", self.id);
        self.found_timer = None;
        self.lost_timer = None;
        self.settle_timer = None;
        self.state = DetectionState::Idle;
    }

    pub fn state(&self) -> DetectionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            DetectionState::Active | DetectionState::PendingDeactivation
        )
    }

    pub fn last_detection(&self) -> Option<Instant> {
        self.last_detection
    }

    /// Cancels all pending timers so nothing fires after destruction.
    pub fn teardown(&mut self) {
        self.found_timer = None;
        self.lost_timer = None;
        self.settle_timer = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker() -> (ArMarker, mpsc::UnboundedReceiver<SceneEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let marker = ArMarker::new(
            MarkerId::new("marker-01"),
            DebounceTiming::from(&Configuration::default()),
            tx,
        );
        (marker, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_timers_are_mutually_exclusive() {
        let (mut marker, _rx) = marker();

        marker.on_found();
        assert!(marker.found_timer.is_some());
        assert!(marker.lost_timer.is_none());

        marker.on_lost();
        assert!(marker.found_timer.is_none());
        assert!(marker.lost_timer.is_some());

        marker.on_found();
        assert!(marker.found_timer.is_some());
        assert!(marker.lost_timer.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn found_expiry_requests_activation() {
        let (mut marker, mut rx) = marker();

        marker.on_found();
        assert_eq!(marker.state(), DetectionState::PendingActivation);

        let SceneEvent::FoundSettled { seq, .. } = rx.recv().await.unwrap() else {
            panic!("expected found expiry");
        };
        assert!(marker.found_settled(seq));
        assert!(marker.found_timer.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn lost_before_settle_cancels_activation() {
        let (mut marker, mut rx) = marker();

        marker.on_found();
        tokio::time::sleep(Duration::from_millis(50)).await;
        marker.on_lost();
        assert_eq!(marker.state(), DetectionState::Idle);

        // Only the lost expiry arrives, and it deactivates nothing.
        let SceneEvent::LostSettled { seq, .. } = rx.recv().await.unwrap() else {
            panic!("expected lost expiry");
        };
        assert!(!marker.lost_settled(seq));
        assert_eq!(marker.state(), DetectionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_expiry_is_discarded() {
        let (mut marker, mut rx) = marker();

        marker.on_found();
        tokio::time::sleep(Duration::from_millis(150)).await;
        let SceneEvent::FoundSettled { seq: stale, .. } = rx.recv().await.unwrap() else {
            panic!("expected found expiry");
        };

        // A second raw found restarted the debounce after the first expiry
        // was already queued.
        marker.on_found();
        assert!(!marker.found_settled(stale));
        assert_eq!(marker.state(), DetectionState::PendingActivation);
    }

    #[tokio::test(start_paused = true)]
    async fn refound_marker_returns_to_activation_path() {
        let (mut marker, _rx) = marker();

        marker.on_found();
        marker.mark_active();
        marker.on_lost();
        assert_eq!(marker.state(), DetectionState::PendingDeactivation);

        marker.on_found();
        assert_eq!(marker.state(), DetectionState::PendingActivation);
        assert!(marker.lost_timer.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn found_is_ignored_while_active() {
        let (mut marker, _rx) = marker();

        marker.mark_active();
        marker.on_found();

        assert_eq!(marker.state(), DetectionState::Active);
        assert!(marker.found_timer.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn lost_settle_deactivates_active_marker() {
        let (mut marker, mut rx) = marker();

        marker.mark_active();
        marker.schedule_playback();
        marker.on_lost();

        let seq = loop {
            match rx.recv().await.unwrap() {
                SceneEvent::LostSettled { seq, .. } => break seq,
                _ => {}
            }
        };
        assert!(marker.lost_settled(seq));
        assert_eq!(marker.state(), DetectionState::Idle);
        assert!(marker.settle_timer.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn force_deactivate_clears_everything() {
        let (mut marker, _rx) = marker();

        marker.on_found();
        marker.mark_active();
        marker.schedule_playback();
        marker.on_lost();

        marker.force_deactivate();

        assert_eq!(marker.state(), DetectionState::Idle);
        assert!(marker.found_timer.is_none());
        assert!(marker.lost_timer.is_none());
        assert!(marker.settle_timer.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_settle_timer_suppresses_playback() {
        let (mut marker, mut rx) = marker();

        marker.mark_active();
        marker.schedule_playback();
        let seq = loop {
            match rx.recv().await.unwrap() {
                SceneEvent::PlaybackDue { seq, .. } => break seq,
                _ => {}
            }
        };
        marker.force_deactivate();
        assert!(!marker.playback_due(seq));
    }
}
