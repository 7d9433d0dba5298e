use crate::config::Configuration;
use crate::error::MediaError;
use crate::media::element::{MediaElement, MediaEvent, PlaybackError, ReadyState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct PlayerSettings {
    pub max_play_attempts: u32,
    pub retry_backoff: Duration,
    pub ready_poll: Duration,
}

impl From<&Configuration> for PlayerSettings {
    fn from(config: &Configuration) -> Self {
        Self {
            max_play_attempts: config.max_play_attempts,
            retry_backoff: config.play_retry_backoff(),
            ready_poll: config.ready_poll(),
        }
    }
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self::from(&Configuration::default())
    }
}

/// Playback wrapper over a [`MediaElement`] with bounded retry.
///
/// Cloning is cheap and shares the underlying element and playing flag;
/// a retry chain runs in whichever task awaits [`VideoPlayer::play`].
#[derive(Clone)]
pub struct VideoPlayer {
    element: Arc<dyn MediaElement>,
    playing: Arc<AtomicBool>,
    settings: PlayerSettings,
}

impl VideoPlayer {
    /// Wraps the element and spawns a watcher task that keeps the playing
    /// flag in sync with element events and logs each transition.
    pub fn new(element: Arc<dyn MediaElement>, settings: PlayerSettings) -> Self {
        let playing = Arc::new(AtomicBool::new(false));
        Self::spawn_event_watcher(&element, Arc::clone(&playing));
        debug!("VideoPlayer initialized: {}", element.source_id());
        Self {
            element,
            playing,
            settings,
        }
    }

    fn spawn_event_watcher(element: &Arc<dyn MediaElement>, playing: Arc<AtomicBool>) {
        let mut events = element.subscribe();
        let source_id = element.source_id().to_string();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        match &event {
                            MediaEvent::Playing => playing.store(true, Ordering::SeqCst),
                            MediaEvent::Paused | MediaEvent::Ended => {
                                playing.store(false, Ordering::SeqCst)
                            }
                            MediaEvent::Error(reason) => {
                                warn!("Video {source_id} error: {reason}");
                                playing.store(false, Ordering::SeqCst);
                            }
                            MediaEvent::Stalled | MediaEvent::Waiting => {
                                warn!("Video {source_id}: {event:?}")
                            }
                            _ => {}
                        }
                        debug!("Video {source_id}: {event:?}");
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!("Video {source_id}: watcher lagged, skipped {skipped} events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }

    /// Starts playback. No-op when already playing. Waits for the element
    /// to buffer current-frame data, then attempts playback up to the
    /// configured number of times with linearly increasing backoff. After
    /// the final autoplay-blocked failure, arms the element's one-shot
    /// user-gesture fallback instead of retrying again.
    pub async fn play(&self) -> Result<(), MediaError> {
        if self.is_playing() {
            return Ok(());
        }

        self.wait_for_data().await;

        let max_attempts = self.settings.max_play_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(
                "Attempting to play video {} (attempt {attempt}/{max_attempts})",
                self.element.source_id()
            );
            match self.element.try_play().await {
                Ok(()) => {
                    self.playing.store(true, Ordering::SeqCst);
                    info!("Playing video: {}", self.element.source_id());
                    return Ok(());
                }
                Err(reason) if attempt < max_attempts => {
                    warn!(
                        "Video play failed for {} (attempt {attempt}/{max_attempts}): {reason}",
                        self.element.source_id()
                    );
                    tokio::time::sleep(self.settings.retry_backoff * attempt).await;
                }
                Err(PlaybackError::AutoplayBlocked) => {
                    info!(
                        "Autoplay blocked for {}, arming click-to-play",
                        self.element.source_id()
                    );
                    self.element.arm_gesture_playback();
                    return Err(MediaError::AutoplayBlocked {
                        source_id: self.element.source_id().to_string(),
                    });
                }
                Err(reason) => {
                    return Err(MediaError::StartFailed {
                        source_id: self.element.source_id().to_string(),
                        attempts: max_attempts,
                        reason,
                    });
                }
            }
        }
    }

    /// Resolves once the element has buffered at least current-frame data,
    /// racing a readiness poll against the element's can-play event.
    async fn wait_for_data(&self) {
        if self.is_ready() {
            return;
        }
        debug!(
            "Waiting for {} to buffer current-frame data",
            self.element.source_id()
        );
        let mut events = self.element.subscribe();
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(MediaEvent::CanPlay) => return,
                    Ok(_) => {}
                    Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => return,
                },
                _ = tokio::time::sleep(self.settings.ready_poll) => {
                    if self.is_ready() {
                        return;
                    }
                }
            }
        }
    }

    /// No-op when not playing; element failures are logged, never raised.
    pub fn pause(&self) {
        if !self.is_playing() {
            return;
        }
        if let Err(reason) = self.element.pause() {
            warn!(
                "Video pause failed for {}: {reason}",
                self.element.source_id()
            );
        }
        self.playing.store(false, Ordering::SeqCst);
    }

    /// Seeks back to the start. Failures are logged, never raised.
    pub fn reset(&self) {
        if let Err(reason) = self.element.seek_to_start() {
            warn!(
                "Video reset failed for {}: {reason}",
                self.element.source_id()
            );
        }
    }

    pub fn set_volume(&self, volume: f32) {
        self.element.set_volume(volume.clamp(0.0, 1.0));
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    pub fn is_ready(&self) -> bool {
        self.element.ready_state() >= ReadyState::CurrentData
    }

    pub fn current_time(&self) -> Duration {
        self.element.current_time()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.element.duration()
    }

    pub fn element(&self) -> &Arc<dyn MediaElement> {
        &self.element
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimMediaElement;
    use tokio::time::Instant;

    fn player(element: &Arc<SimMediaElement>) -> VideoPlayer {
        let element: Arc<dyn MediaElement> = Arc::clone(element) as Arc<dyn MediaElement>;
        VideoPlayer::new(element, PlayerSettings::default())
    }

    #[tokio::test(start_paused = true)]
    async fn play_succeeds_first_attempt() {
        let element = Arc::new(SimMediaElement::new("video-01"));
        let player = player(&element);

        player.play().await.unwrap();

        assert!(player.is_playing());
        assert_eq!(element.play_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn play_is_noop_when_already_playing() {
        let element = Arc::new(SimMediaElement::new("video-01"));
        let player = player(&element);

        player.play().await.unwrap();
        player.play().await.unwrap();

        assert_eq!(element.play_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn play_retries_with_linear_backoff() {
        let element = Arc::new(SimMediaElement::new("video-01"));
        element.fail_plays(2, PlaybackError::Element("decoder busy".into()));
        let player = player(&element);

        let started = Instant::now();
        player.play().await.unwrap();

        // 500ms after the first failure, 1000ms after the second.
        assert_eq!(started.elapsed(), Duration::from_millis(1500));
        assert_eq!(element.play_attempts(), 3);
        assert!(player.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn autoplay_block_arms_gesture_fallback_after_three_attempts() {
        let element = Arc::new(SimMediaElement::new("video-01"));
        element.fail_plays(u32::MAX, PlaybackError::AutoplayBlocked);
        let player = player(&element);

        let result = player.play().await;

        assert!(matches!(result, Err(MediaError::AutoplayBlocked { .. })));
        assert_eq!(element.play_attempts(), 3);
        assert!(element.gesture_armed());
        assert!(!player.is_playing());

        // The armed handler starts playback on the next user gesture.
        element.click();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(player.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn play_waits_for_buffered_data() {
        let element = Arc::new(SimMediaElement::with_ready_state(
            "video-01",
            ReadyState::MetadataLoaded,
        ));
        let ready_element = Arc::clone(&element);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(350)).await;
            ready_element.set_ready_state(ReadyState::CurrentData);
        });
        let player = player(&element);

        let started = Instant::now();
        player.play().await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(350));
        assert!(player.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_is_noop_when_not_playing() {
        let element = Arc::new(SimMediaElement::new("video-01"));
        let player = player(&element);

        player.pause();
        assert_eq!(element.pause_calls(), 0);

        player.play().await.unwrap();
        player.pause();
        assert_eq!(element.pause_calls(), 1);
        assert!(!player.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn volume_is_clamped() {
        let element = Arc::new(SimMediaElement::new("video-01"));
        let player = player(&element);

        player.set_volume(2.5);
        assert_eq!(element.volume(), 1.0);
        player.set_volume(-1.0);
        assert_eq!(element.volume(), 0.0);
    }
}
