use crate::scene::event::SceneEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One-shot cancellable timer that posts a [`SceneEvent`] back into the
/// scene loop when it expires. Dropping the handle aborts the task, so
/// replacing or clearing the owning slot is cancellation.
///
/// Cancellation can race an expiry that already reached the channel;
/// owners compare the event's sequence number against [`EventTimer::seq`]
/// and discard mismatches.
#[derive(Debug)]
pub struct EventTimer {
    seq: u64,
    handle: JoinHandle<()>,
}

impl EventTimer {
    pub fn schedule(
        events: mpsc::UnboundedSender<SceneEvent>,
        delay: Duration,
        seq: u64,
        event: SceneEvent,
    ) -> Self {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(event);
        });
        Self { seq, handle }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl Drop for EventTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// True when `seq` belongs to the currently pending timer in `slot`.
pub fn is_current(slot: &Option<EventTimer>, seq: u64) -> bool {
    slot.as_ref().map(EventTimer::seq) == Some(seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::MarkerId;

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _timer = EventTimer::schedule(
            tx,
            Duration::from_millis(100),
            1,
            SceneEvent::FoundSettled {
                id: MarkerId::new("marker-01"),
                seq: 1,
            },
        );

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, SceneEvent::FoundSettled { seq: 1, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_cancels() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let timer = EventTimer::schedule(
            tx,
            Duration::from_millis(100),
            1,
            SceneEvent::ReadyFallback,
        );
        drop(timer);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn seq_matching() {
        // is_current never matches an empty slot, whatever the seq.
        assert!(!is_current(&None, 0));
        assert!(!is_current(&None, 7));
    }
}
