use std::sync::Arc;
use tracing::debug;

/// Presentation sink for the loading screen.
pub trait LoadingPanel: Send + Sync {
    fn set_visible(&self, visible: bool);

    fn set_progress(&self, percent: f32);

    fn set_text(&self, text: &str);
}

/// Loading screen widget with a clamped 0-100 progress readout.
pub struct LoadingManager {
    panel: Arc<dyn LoadingPanel>,
    visible: bool,
    progress: f32,
}

impl LoadingManager {
    pub fn new(panel: Arc<dyn LoadingPanel>) -> Self {
        Self {
            panel,
            visible: false,
            progress: 0.0,
        }
    }

    pub fn show(&mut self) {
        self.visible = true;
        self.panel.set_visible(true);
        debug!("Loading screen shown");
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.panel.set_visible(false);
        debug!("Loading screen hidden");
    }

    pub fn update_progress(&mut self, percent: f32) {
        self.progress = percent.clamp(0.0, 100.0);
        self.panel.set_progress(self.progress);
        self.panel
            .set_text(&format!("Loading: {}%", self.progress.round()));
    }

    pub fn update_text(&self, text: &str) {
        self.panel.set_text(text);
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimLoadingPanel;

    #[test]
    fn progress_is_clamped() {
        let panel = Arc::new(SimLoadingPanel::default());
        let mut loading = LoadingManager::new(Arc::clone(&panel) as Arc<dyn LoadingPanel>);

        loading.update_progress(150.0);
        assert_eq!(loading.progress(), 100.0);
        loading.update_progress(-5.0);
        assert_eq!(loading.progress(), 0.0);
    }

    #[test]
    fn visibility_tracks_show_hide() {
        let panel = Arc::new(SimLoadingPanel::default());
        let mut loading = LoadingManager::new(Arc::clone(&panel) as Arc<dyn LoadingPanel>);

        loading.show();
        assert!(loading.is_visible());
        assert!(panel.visible());

        loading.hide();
        assert!(!loading.is_visible());
        assert!(!panel.visible());
    }
}
