use crate::media::element::{MediaElement, MediaEvent, PlaybackError, ReadyState};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::broadcast;

struct SimMediaState {
    ready: ReadyState,
    playing: bool,
    position: Duration,
    length: Option<Duration>,
    volume: f32,
    remaining_failures: u32,
    failure: PlaybackError,
    load_failure: Option<String>,
    gesture_armed: bool,
    play_attempts: u32,
    pause_calls: u32,
}

/// Simulated media element with scriptable play failures and readiness.
pub struct SimMediaElement {
    source_id: String,
    state: Mutex<SimMediaState>,
    events: broadcast::Sender<MediaEvent>,
}

impl SimMediaElement {
    /// A source that is already buffered and plays on the first attempt.
    pub fn new(source_id: impl Into<String>) -> Self {
        Self::with_ready_state(source_id, ReadyState::CurrentData)
    }

    pub fn with_ready_state(source_id: impl Into<String>, ready: ReadyState) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            source_id: source_id.into(),
            state: Mutex::new(SimMediaState {
                ready,
                playing: false,
                position: Duration::ZERO,
                length: Some(Duration::from_secs(10)),
                volume: 1.0,
                remaining_failures: 0,
                failure: PlaybackError::Element("unset".into()),
                load_failure: None,
                gesture_armed: false,
                play_attempts: 0,
                pause_calls: 0,
            }),
            events,
        }
    }

    fn emit(&self, event: MediaEvent) {
        let _ = self.events.send(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimMediaState> {
        self.state.lock().unwrap()
    }

    /// The next `count` play attempts fail with `failure`.
    pub fn fail_plays(&self, count: u32, failure: PlaybackError) {
        let mut state = self.lock();
        state.remaining_failures = count;
        state.failure = failure;
    }

    /// Makes `load` report a source error instead of metadata.
    pub fn fail_load(&self, reason: impl Into<String>) {
        self.lock().load_failure = Some(reason.into());
    }

    pub fn set_ready_state(&self, ready: ReadyState) {
        self.lock().ready = ready;
        if ready >= ReadyState::CurrentData {
            self.emit(MediaEvent::CanPlay);
        } else if ready >= ReadyState::MetadataLoaded {
            self.emit(MediaEvent::MetadataLoaded);
        }
    }

    /// Simulates a user gesture on the element.
    pub fn click(&self) {
        let mut state = self.lock();
        if !state.gesture_armed {
            return;
        }
        state.gesture_armed = false;
        state.playing = true;
        drop(state);
        self.emit(MediaEvent::Playing);
    }

    /// Test helper: move the playhead.
    pub fn seek(&self, position: Duration) {
        self.lock().position = position;
    }

    pub fn play_attempts(&self) -> u32 {
        self.lock().play_attempts
    }

    pub fn pause_calls(&self) -> u32 {
        self.lock().pause_calls
    }

    pub fn gesture_armed(&self) -> bool {
        self.lock().gesture_armed
    }

    pub fn volume(&self) -> f32 {
        self.lock().volume
    }
}

#[async_trait]
impl MediaElement for SimMediaElement {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn ready_state(&self) -> ReadyState {
        self.lock().ready
    }

    fn load(&self) {
        let failure = self.lock().load_failure.clone();
        self.emit(MediaEvent::LoadStart);
        match failure {
            Some(reason) => self.emit(MediaEvent::Error(reason)),
            None => {
                let mut state = self.lock();
                if state.ready < ReadyState::MetadataLoaded {
                    state.ready = ReadyState::MetadataLoaded;
                }
                drop(state);
                self.emit(MediaEvent::MetadataLoaded);
            }
        }
    }

    async fn try_play(&self) -> Result<(), PlaybackError> {
        let mut state = self.lock();
        state.play_attempts += 1;
        if state.remaining_failures > 0 {
            state.remaining_failures -= 1;
            return Err(state.failure.clone());
        }
        state.playing = true;
        drop(state);
        self.emit(MediaEvent::Playing);
        Ok(())
    }

    fn pause(&self) -> Result<(), PlaybackError> {
        let mut state = self.lock();
        state.pause_calls += 1;
        state.playing = false;
        drop(state);
        self.emit(MediaEvent::Paused);
        Ok(())
    }

    fn seek_to_start(&self) -> Result<(), PlaybackError> {
        self.lock().position = Duration::ZERO;
        Ok(())
    }

    fn set_volume(&self, volume: f32) {
        self.lock().volume = volume;
    }

    fn current_time(&self) -> Duration {
        self.lock().position
    }

    fn duration(&self) -> Option<Duration> {
        self.lock().length
    }

    fn arm_gesture_playback(&self) {
        self.lock().gesture_armed = true;
    }

    fn subscribe(&self) -> broadcast::Receiver<MediaEvent> {
        self.events.subscribe()
    }
}
