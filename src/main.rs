use ar_overlay::config::Configuration;
use ar_overlay::error::OverlayError;
use ar_overlay::media::MediaElement;
use ar_overlay::scene::stage::Stage;
use ar_overlay::scene::surface::RenderSurface;
use ar_overlay::scene::SceneManager;
use ar_overlay::sim::{
    ScriptedTracker, SimCamera, SimLoadingPanel, SimMediaElement, SimStage, SimStatusPanel,
    SimSurface,
};
use ar_overlay::tracker::TrackerEvent;
use ar_overlay::ui::{LoadingPanel, StatusPanel};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};

fn init_logging() {
    tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();
}

/// Runs the scene loop against simulated collaborators, replaying a short
/// detection script: marker-01 appears, flickers, and is then preempted
/// by marker-02.
#[tokio::main]
async fn main() -> Result<(), OverlayError> {
    init_logging();
    let config = Configuration::load(None)?;

    let script = vec![
        (Duration::from_millis(200), TrackerEvent::Ready),
        (
            Duration::from_millis(300),
            TrackerEvent::Found("marker-01".into()),
        ),
        (
            Duration::from_millis(700),
            TrackerEvent::Lost("marker-01".into()),
        ),
        (
            Duration::from_millis(200),
            TrackerEvent::Found("marker-01".into()),
        ),
        (
            Duration::from_millis(600),
            TrackerEvent::Found("marker-02".into()),
        ),
        (
            Duration::from_millis(1200),
            TrackerEvent::Lost("marker-02".into()),
        ),
    ];

    let mut builder = SceneManager::builder(config.clone())
        .camera(Arc::new(SimCamera::granting()))
        .stage(Arc::new(SimStage::default()) as Arc<dyn Stage>)
        .tracker(Box::new(ScriptedTracker::new(script)))
        .status_panel(Arc::new(SimStatusPanel::default()) as Arc<dyn StatusPanel>)
        .loading_panel(Arc::new(SimLoadingPanel::default()) as Arc<dyn LoadingPanel>);
    for binding in config.markers.values() {
        builder = builder
            .add_media(
                binding.video.clone(),
                Arc::new(SimMediaElement::new(binding.video.clone())) as Arc<dyn MediaElement>,
            )
            .add_surface(
                binding.plane.clone(),
                Arc::new(SimSurface::new(binding.plane.clone())) as Arc<dyn RenderSurface>,
            );
    }

    let (manager, handle) = builder.build()?;
    let scene = tokio::spawn(manager.run());

    tokio::time::sleep(Duration::from_secs(5)).await;
    let snapshot = handle.snapshot().await?;
    info!("Final scene state: {snapshot:#?}");

    handle.shutdown();
    scene.await.expect("scene task panicked")?;
    Ok(())
}
