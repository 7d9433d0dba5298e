use crate::tracker::MarkerId;
use tracing::{debug, info};

/// Outcome of an activation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arbitration {
    /// The requester already holds the active slot.
    AlreadyActive,
    /// The slot was free and is now held by the requester.
    Granted,
    /// The named marker held the slot; the requester now holds it and the
    /// caller must force-deactivate the previous holder.
    Preempting(MarkerId),
}

/// Single-display arbitration state. Owned exclusively by the scene
/// manager; markers never touch the active slot directly.
#[derive(Debug, Default)]
pub struct Arbiter {
    active: Option<MarkerId>,
}

impl Arbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&MarkerId> {
        self.active.as_ref()
    }

    /// Resolves an activation request. The most recent caller always wins:
    /// a held slot is reassigned and the previous holder reported for
    /// forced deactivation. The record is updated here, so the forced
    /// deactivation path must not notify again.
    pub fn request_activation(&mut self, id: &MarkerId) -> Arbitration {
        match self.active.take() {
            Some(current) if current == *id => {
                self.active = Some(current);
                Arbitration::AlreadyActive
            }
            Some(current) => {
                info!("Single display: {current} preempted by {id}");
                self.active = Some(id.clone());
                Arbitration::Preempting(current)
            }
            None => {
                debug!("Single display: {id} activated");
                self.active = Some(id.clone());
                Arbitration::Granted
            }
        }
    }

    /// Clears the slot if `id` holds it. Returns whether it did.
    pub fn notify_deactivation(&mut self, id: &MarkerId) -> bool {
        if self.active.as_ref() == Some(id) {
            debug!("Single display: {id} deactivated");
            self.active = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> MarkerId {
        MarkerId::new(name)
    }

    #[test]
    fn grants_when_slot_free() {
        let mut arbiter = Arbiter::new();
        assert_eq!(arbiter.request_activation(&id("a")), Arbitration::Granted);
        assert_eq!(arbiter.active(), Some(&id("a")));
    }

    #[test]
    fn idempotent_for_current_holder() {
        let mut arbiter = Arbiter::new();
        arbiter.request_activation(&id("a"));
        assert_eq!(
            arbiter.request_activation(&id("a")),
            Arbitration::AlreadyActive
        );
        assert_eq!(arbiter.active(), Some(&id("a")));
    }

    #[test]
    fn latest_requester_preempts() {
        let mut arbiter = Arbiter::new();
        arbiter.request_activation(&id("a"));
        assert_eq!(
            arbiter.request_activation(&id("b")),
            Arbitration::Preempting(id("a"))
        );
        assert_eq!(arbiter.active(), Some(&id("b")));
    }

    #[test]
    fn deactivation_clears_only_the_holder() {
        let mut arbiter = Arbiter::new();
        arbiter.request_activation(&id("a"));

        assert!(!arbiter.notify_deactivation(&id("b")));
        assert_eq!(arbiter.active(), Some(&id("a")));

        assert!(arbiter.notify_deactivation(&id("a")));
        assert_eq!(arbiter.active(), None);
    }

    #[test]
    fn preempted_markers_stale_notice_does_not_clear_new_holder() {
        let mut arbiter = Arbiter::new();
        arbiter.request_activation(&id("a"));
        arbiter.request_activation(&id("b"));

        // Even if the preempted marker's own deactivation path ran, it
        // must not evict the new holder.
        assert!(!arbiter.notify_deactivation(&id("a")));
        assert_eq!(arbiter.active(), Some(&id("b")));
    }
}
