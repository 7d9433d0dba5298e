use crate::config::Configuration;
use crate::media::VideoPlayer;
use crate::scene::event::SceneEvent;
use crate::scene::surface::{
    Easing, MaterialSettings, Offset, OffsetDelta, OpacityAnimation, RenderSurface, Shader,
};
use crate::scene::timer::{self, EventTimer};
use crate::tracker::MarkerId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneState {
    Hidden,
    FadingIn,
    Visible,
    FadingOut,
}

#[derive(Debug, Clone, Copy)]
pub struct PlaneGeometry {
    pub width: f32,
    pub height: f32,
    pub elevation: f32,
}

impl From<&Configuration> for PlaneGeometry {
    fn from(config: &Configuration) -> Self {
        Self {
            width: config.plane_width,
            height: config.plane_height,
            elevation: config.plane_elevation,
        }
    }
}

/// Textured video plane with a guarded show/hide animation lifecycle.
///
/// `show` and `hide` only act from the opposite terminal state; a plane
/// that is mid-animation ignores both, so no two transitions can overlap.
/// The immediate variants bypass the guards and cancel any scheduled fade
/// completion.
pub struct VideoPlane {
    id: MarkerId,
    surface: Arc<dyn RenderSurface>,
    player: VideoPlayer,
    state: PlaneState,
    offset: Offset,
    geometry: PlaneGeometry,
    fade_timer: Option<EventTimer>,
    next_seq: u64,
    events: mpsc::UnboundedSender<SceneEvent>,
}

impl VideoPlane {
    pub fn new(
        id: MarkerId,
        surface: Arc<dyn RenderSurface>,
        player: VideoPlayer,
        offset: Offset,
        geometry: PlaneGeometry,
        events: mpsc::UnboundedSender<SceneEvent>,
    ) -> Self {
        let plane = Self {
            id,
            surface,
            player,
            state: PlaneState::Hidden,
            offset,
            geometry,
            fade_timer: None,
            next_seq: 0,
            events,
        };
        plane.surface.set_visible(false);
        plane.surface.set_opacity(0.0);
        plane.apply_pose();
        debug!("VideoPlane initialized: {}", plane.id);
        plane
    }

    /// Reapplies position, rotation, size and material. Position is the
    /// base pose (slightly above the marker, facing up) plus the stored
    /// offset.
    pub fn apply_pose(&self) {
        self.surface.set_position(
            self.offset.x,
            self.offset.y,
            self.geometry.elevation + self.offset.z,
        );
        self.surface.set_rotation(-90.0, 0.0, 0.0);
        self.surface.set_size(self.geometry.width, self.geometry.height);
        self.surface.configure_material(&MaterialSettings {
            shader: Shader::Flat,
            transparent: true,
            alpha_test: 0.5,
        });
    }

    /// Fades the plane in. No-op unless currently hidden and not
    /// animating.
    pub fn show(&mut self, duration: Duration) {
        if self.state != PlaneState::Hidden {
            debug!("Show ignored for {} in state {:?}", self.id, self.state);
            return;
        }
        debug!("Showing video plane: {}", self.id);
        self.apply_pose();
        self.surface.clear_animation();
        self.surface.set_visible(true);
        self.surface.animate_opacity(OpacityAnimation {
            from: 0.0,
            to: 1.0,
            duration,
            easing: Easing::EaseInOutQuad,
        });
        self.state = PlaneState::FadingIn;
        self.schedule_fade_end(duration);
    }

    /// Fades the plane out; on completion the video is paused and rewound.
    /// No-op unless currently visible and not animating.
    pub fn hide(&mut self, duration: Duration) {
        if self.state != PlaneState::Visible {
            debug!("Hide ignored for {} in state {:?}", self.id, self.state);
            return;
        }
        debug!("Hiding video plane: {}", self.id);
        self.surface.clear_animation();
        self.surface.animate_opacity(OpacityAnimation {
            from: 1.0,
            to: 0.0,
            duration,
            easing: Easing::EaseInOutQuad,
        });
        self.state = PlaneState::FadingOut;
        self.schedule_fade_end(duration);
    }

    fn schedule_fade_end(&mut self, duration: Duration) {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.fade_timer = Some(EventTimer::schedule(
            self.events.clone(),
            duration,
            seq,
            SceneEvent::FadeFinished {
                id: self.id.clone(),
                seq,
            },
        ));
    }

    /// Completes the pending fade. Stale expiries are discarded.
    pub fn fade_finished(&mut self, seq: u64) {
        if !timer::is_current(&self.fade_timer, seq) {
            debug!("Stale fade expiry for {}, ignoring", self.id);
            return;
        }
        self.fade_timer = None;
        match self.state {
            PlaneState::FadingIn => {
                self.state = PlaneState::Visible;
                debug!("Video plane visible: {}", self.id);
            }
            PlaneState::FadingOut => {
                self.player.pause();
                self.player.reset();
                self.surface.set_visible(false);
                self.state = PlaneState::Hidden;
                debug!("Video plane hidden: {}", self.id);
            }
            PlaneState::Hidden | PlaneState::Visible => {}
        }
    }

    /// Forces the terminal visible state with no animation.
    pub fn show_immediate(&mut self) {
        self.fade_timer = None;
        self.surface.clear_animation();
        self.apply_pose();
        self.surface.set_visible(true);
        self.surface.set_opacity(1.0);
        self.state = PlaneState::Visible;
        debug!("Video plane shown immediately: {}", self.id);
    }

    /// Forces the terminal hidden state with no animation, pausing and
    /// rewinding the video synchronously.
    pub fn hide_immediate(&mut self) {
        self.fade_timer = None;
        self.surface.clear_animation();
        self.player.pause();
        self.player.reset();
        self.surface.set_visible(false);
        self.surface.set_opacity(0.0);
        self.state = PlaneState::Hidden;
        debug!("Video plane hidden immediately: {}", self.id);
    }

    /// Direct opacity setter. Syncs the terminal state when the plane is
    /// not animating.
    pub fn set_opacity(&mut self, opacity: f32) {
        let opacity = opacity.clamp(0.0, 1.0);
        self.surface.set_opacity(opacity);
        match self.state {
            PlaneState::Hidden if opacity > 0.0 => {
                self.surface.set_visible(true);
                self.state = PlaneState::Visible;
            }
            PlaneState::Visible if opacity == 0.0 => {
                self.surface.set_visible(false);
                self.state = PlaneState::Hidden;
            }
            _ => {}
        }
    }

    pub fn update_offset(&mut self, delta: OffsetDelta) {
        self.offset = self.offset.merged(delta);
        self.apply_pose();
        debug!("Offset updated for {}: {:?}", self.id, self.offset);
    }

    pub fn set_offset(&mut self, offset: Offset) {
        self.offset = offset;
        self.apply_pose();
    }

    pub fn set_size(&mut self, width: f32, height: f32) {
        self.geometry.width = width;
        self.geometry.height = height;
        self.surface.set_size(width, height);
    }

    pub fn set_rotation(&self, pitch: f32, yaw: f32, roll: f32) {
        self.surface.set_rotation(pitch, yaw, roll);
    }

    /// Points the surface texture back at the wrapped video source.
    pub fn refresh_texture(&self) {
        self.surface.set_texture_source(self.player.element().source_id());
    }

    pub fn offset(&self) -> Offset {
        self.offset
    }

    pub fn state(&self) -> PlaneState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state == PlaneState::Visible
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.state, PlaneState::FadingIn | PlaneState::FadingOut)
    }

    pub fn player(&self) -> &VideoPlayer {
        &self.player
    }

    /// Cancels any pending fade and forces the hidden state.
    pub fn teardown(&mut self) {
        self.hide_immediate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{MediaElement, PlayerSettings};
    use crate::sim::{SimMediaElement, SimSurface};

    struct Fixture {
        plane: VideoPlane,
        surface: Arc<SimSurface>,
        element: Arc<SimMediaElement>,
        events: mpsc::UnboundedReceiver<SceneEvent>,
    }

    fn fixture() -> Fixture {
        let (tx, events) = mpsc::unbounded_channel();
        let surface = Arc::new(SimSurface::new("plane-01"));
        let element = Arc::new(SimMediaElement::new("video-01"));
        let player = VideoPlayer::new(
            Arc::clone(&element) as Arc<dyn MediaElement>,
            PlayerSettings::default(),
        );
        let plane = VideoPlane::new(
            MarkerId::new("marker-01"),
            Arc::clone(&surface) as Arc<dyn RenderSurface>,
            player,
            Offset::ZERO,
            PlaneGeometry::from(&Configuration::default()),
            tx,
        );
        Fixture {
            plane,
            surface,
            element,
            events,
        }
    }

    async fn next_fade_seq(events: &mut mpsc::UnboundedReceiver<SceneEvent>) -> u64 {
        loop {
            match events.recv().await.unwrap() {
                SceneEvent::FadeFinished { seq, .. } => return seq,
                _ => {}
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn show_fades_in_and_settles_visible() {
        let mut f = fixture();

        f.plane.show(Duration::from_millis(300));

        assert_eq!(f.plane.state(), PlaneState::FadingIn);
        let state = f.surface.state();
        assert!(state.visible);
        assert_eq!(state.animations_started, 1);

        let seq = next_fade_seq(&mut f.events).await;
        f.plane.fade_finished(seq);
        assert_eq!(f.plane.state(), PlaneState::Visible);
    }

    #[tokio::test(start_paused = true)]
    async fn show_is_guarded_while_animating_or_visible() {
        let mut f = fixture();

        f.plane.show(Duration::from_millis(300));
        f.plane.show(Duration::from_millis(300));
        assert_eq!(f.surface.state().animations_started, 1);

        let seq = next_fade_seq(&mut f.events).await;
        f.plane.fade_finished(seq);
        f.plane.show(Duration::from_millis(300));
        assert_eq!(f.surface.state().animations_started, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hide_requires_visible() {
        let mut f = fixture();

        // Hidden plane: nothing to do.
        f.plane.hide(Duration::from_millis(500));
        assert_eq!(f.plane.state(), PlaneState::Hidden);

        // Mid fade-in: hide must not start a second transition.
        f.plane.show(Duration::from_millis(300));
        f.plane.hide(Duration::from_millis(500));
        assert_eq!(f.plane.state(), PlaneState::FadingIn);
    }

    #[tokio::test(start_paused = true)]
    async fn fade_out_completion_parks_the_video() {
        let mut f = fixture();
        f.plane.show(Duration::from_millis(300));
        let seq = next_fade_seq(&mut f.events).await;
        f.plane.fade_finished(seq);
        f.plane.player().play().await.unwrap();
        f.element.seek(Duration::from_secs(2));

        f.plane.hide(Duration::from_millis(500));
        let seq = next_fade_seq(&mut f.events).await;
        f.plane.fade_finished(seq);

        assert_eq!(f.plane.state(), PlaneState::Hidden);
        assert!(!f.surface.state().visible);
        assert!(!f.plane.player().is_playing());
        assert_eq!(f.element.current_time(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn hide_immediate_cancels_pending_fade() {
        let mut f = fixture();
        f.plane.show(Duration::from_millis(300));

        f.plane.hide_immediate();
        assert_eq!(f.plane.state(), PlaneState::Hidden);
        let state = f.surface.state();
        assert!(!state.visible);
        assert_eq!(state.opacity, 0.0);

        // The fade-in expiry may still arrive; it must be discarded.
        tokio::time::sleep(Duration::from_millis(400)).await;
        if let Ok(SceneEvent::FadeFinished { seq, .. }) = f.events.try_recv() {
            f.plane.fade_finished(seq);
        }
        assert_eq!(f.plane.state(), PlaneState::Hidden);
    }

    #[tokio::test(start_paused = true)]
    async fn update_offset_merges_and_reapplies_position() {
        let mut f = fixture();

        f.plane.update_offset(OffsetDelta {
            x: Some(1.5),
            y: None,
            z: None,
        });

        assert_eq!(f.plane.offset(), Offset::new(1.5, 0.0, 0.0));
        let state = f.surface.state();
        assert_eq!(state.position, (1.5, 0.0, 0.01));
    }
}
