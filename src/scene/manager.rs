use crate::config::Configuration;
use crate::error::{OverlayError, SessionError};
use crate::media::element::{MediaElement, MediaEvent, ReadyState};
use crate::media::{PlayerSettings, VideoPlayer};
use crate::scene::arbiter::{Arbiter, Arbitration};
use crate::scene::event::SceneEvent;
use crate::scene::marker::{ArMarker, DebounceTiming, DetectionState};
use crate::scene::plane::{PlaneGeometry, PlaneState, VideoPlane};
use crate::scene::stage::{CameraAccess, CameraConstraints, Stage};
use crate::scene::surface::{Offset, OffsetDelta, RenderSurface};
use crate::scene::timer::EventTimer;
use crate::tracker::{MarkerId, Tracker, TrackerEvent};
use crate::ui::{LoadingManager, LoadingPanel, StatusDisplay, StatusPanel};
use futures::stream::{FuturesUnordered, StreamExt};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const SEARCHING_STATUS: &str = "Searching for markers...";

/// One marker's bundle of detection state machine, video plane and the
/// offset it was declared with.
struct MarkerInstance {
    id: MarkerId,
    marker: ArMarker,
    plane: VideoPlane,
    home_offset: Offset,
}

#[derive(Debug, Clone)]
pub struct MarkerSnapshot {
    pub id: MarkerId,
    pub detection: DetectionState,
    pub plane: PlaneState,
    pub offset: Offset,
}

#[derive(Debug, Clone)]
pub struct SceneSnapshot {
    pub active_marker: Option<MarkerId>,
    pub ar_ready: bool,
    pub markers: Vec<MarkerSnapshot>,
}

enum SceneCommand {
    Snapshot {
        responder: oneshot::Sender<SceneSnapshot>,
    },
    AdjustOffset {
        id: MarkerId,
        delta: OffsetDelta,
        responder: oneshot::Sender<bool>,
    },
    ResetPositions {
        responder: oneshot::Sender<()>,
    },
}

/// Control handle for a running [`SceneManager`].
pub struct SceneHandle {
    commands: mpsc::Sender<SceneCommand>,
    cancel: CancellationToken,
}

impl SceneHandle {
    pub async fn snapshot(&self) -> Result<SceneSnapshot, SessionError> {
        let (responder, response) = oneshot::channel();
        self.commands
            .send(SceneCommand::Snapshot { responder })
            .await
            .map_err(|_| SessionError::Terminated)?;
        response.await.map_err(|_| SessionError::Terminated)
    }

    /// Manual offset adjustment for one marker's plane. Returns false for
    /// an unknown marker.
    pub async fn adjust_offset(
        &self,
        id: MarkerId,
        delta: OffsetDelta,
    ) -> Result<bool, SessionError> {
        let (responder, response) = oneshot::channel();
        self.commands
            .send(SceneCommand::AdjustOffset {
                id,
                delta,
                responder,
            })
            .await
            .map_err(|_| SessionError::Terminated)?;
        response.await.map_err(|_| SessionError::Terminated)
    }

    /// Moves every plane back to its declared offset.
    pub async fn reset_positions(&self) -> Result<(), SessionError> {
        let (responder, response) = oneshot::channel();
        self.commands
            .send(SceneCommand::ResetPositions { responder })
            .await
            .map_err(|_| SessionError::Terminated)?;
        response.await.map_err(|_| SessionError::Terminated)
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

pub struct SceneManagerBuilder {
    config: Configuration,
    camera: Option<Arc<dyn CameraAccess>>,
    stage: Option<Arc<dyn Stage>>,
    tracker: Option<Box<dyn Tracker>>,
    status_panel: Option<Arc<dyn StatusPanel>>,
    loading_panel: Option<Arc<dyn LoadingPanel>>,
    media: HashMap<String, Arc<dyn MediaElement>>,
    surfaces: HashMap<String, Arc<dyn RenderSurface>>,
}

impl SceneManagerBuilder {
    pub fn new(config: Configuration) -> Self {
        Self {
            config,
            camera: None,
            stage: None,
            tracker: None,
            status_panel: None,
            loading_panel: None,
            media: HashMap::new(),
            surfaces: HashMap::new(),
        }
    }

    pub fn camera(mut self, camera: Arc<dyn CameraAccess>) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn tracker(mut self, tracker: Box<dyn Tracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn status_panel(mut self, panel: Arc<dyn StatusPanel>) -> Self {
        self.status_panel = Some(panel);
        self
    }

    pub fn loading_panel(mut self, panel: Arc<dyn LoadingPanel>) -> Self {
        self.loading_panel = Some(panel);
        self
    }

    /// Registers the media element backing a `video` id from the marker
    /// registry.
    pub fn add_media(mut self, id: impl Into<String>, element: Arc<dyn MediaElement>) -> Self {
        self.media.insert(id.into(), element);
        self
    }

    /// Registers the render surface backing a `plane` id from the marker
    /// registry.
    pub fn add_surface(mut self, id: impl Into<String>, surface: Arc<dyn RenderSurface>) -> Self {
        self.surfaces.insert(id.into(), surface);
        self
    }

    pub fn build(self) -> Result<(SceneManager, SceneHandle), OverlayError> {
        let camera = self
            .camera
            .ok_or(SessionError::MissingCollaborator("camera"))?;
        let stage = self
            .stage
            .ok_or(SessionError::MissingCollaborator("stage"))?;
        let tracker = self
            .tracker
            .ok_or(SessionError::MissingCollaborator("tracker"))?;
        let status_panel = self
            .status_panel
            .ok_or(SessionError::MissingCollaborator("status panel"))?;
        let loading_panel = self
            .loading_panel
            .ok_or(SessionError::MissingCollaborator("loading panel"))?;

        for (id, binding) in &self.config.markers {
            if !self.media.contains_key(&binding.video) {
                return Err(SessionError::IncompleteBinding {
                    marker: id.clone(),
                    what: "media element",
                }
                .into());
            }
            if !self.surfaces.contains_key(&binding.plane) {
                return Err(SessionError::IncompleteBinding {
                    marker: id.clone(),
                    what: "render surface",
                }
                .into());
            }
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (commands_tx, commands_rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();

        let manager = SceneManager {
            config: self.config,
            camera,
            stage,
            tracker: Some(tracker),
            status: StatusDisplay::new(status_panel),
            loading: LoadingManager::new(loading_panel),
            media: self.media,
            surfaces: self.surfaces,
            instances: Vec::new(),
            arbiter: Arbiter::new(),
            ar_ready: false,
            ready_fallback: None,
            revert_timer: None,
            sweep_timer: None,
            events_tx,
            events_rx,
            commands_rx,
            cancel: cancel.clone(),
        };
        let handle = SceneHandle {
            commands: commands_tx,
            cancel,
        };
        Ok((manager, handle))
    }
}

/// Owns every marker instance and serializes all scene state changes
/// through one event loop, so arbitration (including forced preemption of
/// a rival marker) fully resolves before the next event is looked at.
pub struct SceneManager {
    config: Configuration,
    camera: Arc<dyn CameraAccess>,
    stage: Arc<dyn Stage>,
    tracker: Option<Box<dyn Tracker>>,
    status: StatusDisplay,
    loading: LoadingManager,
    media: HashMap<String, Arc<dyn MediaElement>>,
    surfaces: HashMap<String, Arc<dyn RenderSurface>>,
    instances: Vec<MarkerInstance>,
    arbiter: Arbiter,
    ar_ready: bool,
    ready_fallback: Option<EventTimer>,
    revert_timer: Option<EventTimer>,
    sweep_timer: Option<EventTimer>,
    events_tx: mpsc::UnboundedSender<SceneEvent>,
    events_rx: mpsc::UnboundedReceiver<SceneEvent>,
    commands_rx: mpsc::Receiver<SceneCommand>,
    cancel: CancellationToken,
}

impl SceneManager {
    pub fn builder(config: Configuration) -> SceneManagerBuilder {
        SceneManagerBuilder::new(config)
    }

    /// Brings the session up and runs the scene loop until shutdown.
    pub async fn run(mut self) -> Result<(), OverlayError> {
        self.start_session().await?;
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                command = self.commands_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(event) = self.events_rx.recv() => self.handle_event(event),
            }
        }
        self.teardown();
        Ok(())
    }

    /// Session bring-up. The order is deliberate: permission first (denial
    /// aborts before anything is revealed), then chrome, then media, then
    /// instances, then tracker readiness.
    async fn start_session(&mut self) -> Result<(), OverlayError> {
        info!("Starting AR session");

        if let Err(reason) = self
            .camera
            .request_permission(&CameraConstraints::default())
            .await
        {
            error!("Camera permission denied: {reason}");
            self.status.show_error("Camera access is required");
            return Err(SessionError::PermissionDenied(reason.to_string()).into());
        }
        debug!("Camera permission granted");

        self.stage.hide_entry_overlay();
        self.loading.show();
        self.status.update("Initializing AR scene...");
        self.stage.reveal_scene();

        self.prepare_media().await;
        self.build_instances();

        if let Some(mut tracker) = self.tracker.take() {
            let mut raw_events = tracker.take_events();
            let events = self.events_tx.clone();
            tokio::spawn(async move {
                while let Some(event) = raw_events.recv().await {
                    if events.send(SceneEvent::Tracker(event)).is_err() {
                        break;
                    }
                }
            });
        }
        self.ready_fallback = Some(EventTimer::schedule(
            self.events_tx.clone(),
            self.config.ready_fallback(),
            0,
            SceneEvent::ReadyFallback,
        ));
        Ok(())
    }

    /// Waits for every media source to reach metadata-ready. Individual
    /// load errors are logged and tolerated so one broken source cannot
    /// stall the session.
    async fn prepare_media(&mut self) {
        let total = self.config.markers.len();
        if total == 0 {
            return;
        }
        let mut loads = FuturesUnordered::new();
        for binding in self.config.markers.values() {
            let element = Arc::clone(&self.media[&binding.video]);
            loads.push(async move {
                if element.ready_state() >= ReadyState::MetadataLoaded {
                    return;
                }
                let mut events = element.subscribe();
                element.load();
                loop {
                    match events.recv().await {
                        Ok(MediaEvent::MetadataLoaded) => break,
                        Ok(MediaEvent::Error(reason)) => {
                            warn!("Video load failed: {} ({reason})", element.source_id());
                            break;
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(_)) => {}
                        Err(RecvError::Closed) => break,
                    }
                }
            });
        }
        let mut loaded = 0usize;
        while loads.next().await.is_some() {
            loaded += 1;
            self.loading
                .update_progress(loaded as f32 * 100.0 / total as f32);
        }
        info!("All video metadata loaded");
    }

    fn build_instances(&mut self) {
        let settings = PlayerSettings::from(&self.config);
        let geometry = PlaneGeometry::from(&self.config);
        let timing = DebounceTiming::from(&self.config);
        for (id, binding) in &self.config.markers {
            let element = Arc::clone(&self.media[&binding.video]);
            let surface = Arc::clone(&self.surfaces[&binding.plane]);
            let player = VideoPlayer::new(element, settings);
            let plane = VideoPlane::new(
                id.clone(),
                surface,
                player,
                binding.offset,
                geometry,
                self.events_tx.clone(),
            );
            let marker = ArMarker::new(id.clone(), timing, self.events_tx.clone());
            info!("Instance initialized: {id} with offset {:?}", binding.offset);
            self.instances.push(MarkerInstance {
                id: id.clone(),
                marker,
                plane,
                home_offset: binding.offset,
            });
        }
    }

    fn handle_event(&mut self, event: SceneEvent) {
        match event {
            SceneEvent::Tracker(TrackerEvent::Ready) => self.on_ar_ready(false),
            SceneEvent::ReadyFallback => self.on_ar_ready(true),
            SceneEvent::Tracker(TrackerEvent::Found(id)) => {
                if self.ar_ready {
                    debug!("Marker found: {id}");
                    if let Some(index) = self.instance_index(&id) {
                        self.instances[index].marker.on_found();
                    }
                }
            }
            SceneEvent::Tracker(TrackerEvent::Lost(id)) => {
                if self.ar_ready {
                    debug!("Marker lost: {id}");
                    if let Some(index) = self.instance_index(&id) {
                        self.instances[index].marker.on_lost();
                    }
                }
            }
            SceneEvent::Tracker(TrackerEvent::Failed(reason)) => {
                error!("Tracker error: {reason}");
                self.status.show_error("Camera access failed");
            }
            SceneEvent::FoundSettled { id, seq } => self.on_found_settled(id, seq),
            SceneEvent::LostSettled { id, seq } => self.on_lost_settled(id, seq),
            SceneEvent::PlaybackDue { id, seq } => self.on_playback_due(id, seq),
            SceneEvent::FadeFinished { id, seq } => {
                if let Some(index) = self.instance_index(&id) {
                    self.instances[index].plane.fade_finished(seq);
                }
            }
            SceneEvent::StatusRevert => {
                if self.arbiter.active().is_none() {
                    self.status.update(SEARCHING_STATUS);
                }
            }
            SceneEvent::SeparationSweep => self.resolve_overlaps(),
        }
    }

    /// Idempotent: duplicate ready signals (or the fallback firing after a
    /// real one) bind marker handling exactly once.
    fn on_ar_ready(&mut self, forced: bool) {
        if self.ar_ready {
            return;
        }
        if forced {
            info!("No tracker ready signal, forcing AR ready after timeout");
        }
        self.ar_ready = true;
        self.ready_fallback = None;
        info!("AR ready, binding marker events (single display mode)");
        self.loading.hide();
        self.status.update(SEARCHING_STATUS);
        if self.config.dynamic_separation {
            self.schedule_separation_sweep();
        }
    }

    fn on_found_settled(&mut self, id: MarkerId, seq: u64) {
        let Some(index) = self.instance_index(&id) else {
            return;
        };
        if !self.instances[index].marker.found_settled(seq) {
            return;
        }
        match self.arbiter.request_activation(&id) {
            Arbitration::Granted | Arbitration::AlreadyActive => self.activate(index),
            Arbitration::Preempting(previous) => {
                info!("Deactivating current marker {previous} to show {id}");
                if let Some(rival) = self.instance_index(&previous) {
                    // Hard visual cut: a fade on the loser would misread
                    // as both markers being live.
                    self.instances[rival].marker.force_deactivate();
                    self.instances[rival].plane.hide_immediate();
                }
                self.activate(index);
            }
        }
    }

    fn activate(&mut self, index: usize) {
        let id = self.instances[index].id.clone();
        info!("Activating marker (single display mode): {id}");
        self.status
            .update(&format!("Displaying {id} (single display mode)"));
        let fade_in = self.config.fade_in();
        let instance = &mut self.instances[index];
        instance.marker.mark_active();
        instance.plane.show(fade_in);
        instance.marker.schedule_playback();
    }

    fn on_lost_settled(&mut self, id: MarkerId, seq: u64) {
        let Some(index) = self.instance_index(&id) else {
            return;
        };
        if !self.instances[index].marker.lost_settled(seq) {
            return;
        }
        info!("Deactivating marker (single display mode): {id}");
        self.arbiter.notify_deactivation(&id);
        let fade_out = self.config.fade_out();
        self.instances[index].plane.hide(fade_out);
        self.revert_timer = Some(EventTimer::schedule(
            self.events_tx.clone(),
            self.config.status_revert(),
            0,
            SceneEvent::StatusRevert,
        ));
    }

    fn on_playback_due(&mut self, id: MarkerId, seq: u64) {
        let Some(index) = self.instance_index(&id) else {
            return;
        };
        if !self.instances[index].marker.playback_due(seq) {
            return;
        }
        let player = self.instances[index].plane.player().clone();
        tokio::spawn(async move {
            match player.play().await {
                Ok(()) => info!("Video started for marker (single display mode): {id}"),
                Err(reason) => warn!("Failed to start video for marker {id}: {reason}"),
            }
        });
    }

    /// Best-effort nudge of overlapping planes (optional mode, off by
    /// default; single-display mode supersedes it). No invariant holds
    /// under this: it only perturbs offsets so concurrent planes separate.
    fn resolve_overlaps(&mut self) {
        let detected: Vec<usize> = self
            .instances
            .iter()
            .enumerate()
            .filter(|(_, instance)| instance.marker.is_active())
            .map(|(index, _)| index)
            .collect();
        if detected.len() > 1 {
            warn!("Potential conflict: {} markers active", detected.len());
            let mut rng = rand::rng();
            for &index in &detected[1..] {
                let offset = self.instances[index].plane.offset();
                let delta = OffsetDelta {
                    x: Some(offset.x + rng.random_range(-1.0..1.0)),
                    y: None,
                    z: Some(offset.z + rng.random_range(-0.5..0.5)),
                };
                self.instances[index].plane.update_offset(delta);
            }
            self.status.update("Multiple markers detected - adjusting positions");
        }
        self.schedule_separation_sweep();
    }

    fn schedule_separation_sweep(&mut self) {
        self.sweep_timer = Some(EventTimer::schedule(
            self.events_tx.clone(),
            self.config.separation_sweep(),
            0,
            SceneEvent::SeparationSweep,
        ));
    }

    fn handle_command(&mut self, command: SceneCommand) {
        match command {
            SceneCommand::Snapshot { responder } => {
                let _ = responder.send(self.snapshot());
            }
            SceneCommand::AdjustOffset {
                id,
                delta,
                responder,
            } => {
                let adjusted = match self.instance_index(&id) {
                    Some(index) => {
                        self.instances[index].plane.update_offset(delta);
                        info!("Manual offset adjustment: {id}");
                        true
                    }
                    None => false,
                };
                let _ = responder.send(adjusted);
            }
            SceneCommand::ResetPositions { responder } => {
                for instance in &mut self.instances {
                    let home = instance.home_offset;
                    instance.plane.set_offset(home);
                }
                info!("All marker positions reset to declared offsets");
                self.status.update("Marker positions reset");
                let _ = responder.send(());
            }
        }
    }

    fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            active_marker: self.arbiter.active().cloned(),
            ar_ready: self.ar_ready,
            markers: self
                .instances
                .iter()
                .map(|instance| MarkerSnapshot {
                    id: instance.id.clone(),
                    detection: instance.marker.state(),
                    plane: instance.plane.state(),
                    offset: instance.plane.offset(),
                })
                .collect(),
        }
    }

    fn instance_index(&self, id: &MarkerId) -> Option<usize> {
        let index = self.instances.iter().position(|instance| instance.id == *id);
        if index.is_none() {
            warn!("No instance for marker: {id}");
        }
        index
    }

    /// Cancels every pending timer and parks all planes so nothing fires
    /// after the scene is gone.
    fn teardown(&mut self) {
        info!("Shutting down AR scene");
        self.ready_fallback = None;
        self.revert_timer = None;
        self.sweep_timer = None;
        for instance in &mut self.instances {
            instance.marker.teardown();
            instance.plane.teardown();
        }
        self.instances.clear();
        self.loading.hide();
        self.status.teardown();
    }
}
