use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Info,
    Success,
    Warning,
    Error,
}

/// Presentation sink for the status line.
pub trait StatusPanel: Send + Sync {
    fn set_text(&self, text: &str);

    fn set_visible(&self, visible: bool);

    fn set_tone(&self, tone: StatusTone);
}

const SUCCESS_EXPIRY: Duration = Duration::from_secs(3);
const WARNING_EXPIRY: Duration = Duration::from_secs(4);
const ERROR_EXPIRY: Duration = Duration::from_secs(5);

/// Status text widget. Messages are persistent by default; temporary
/// messages hide themselves (and reset the tone) after their expiry.
/// Every update replaces any pending expiry timer.
pub struct StatusDisplay {
    panel: Arc<dyn StatusPanel>,
    expiry: Option<JoinHandle<()>>,
}

impl StatusDisplay {
    pub fn new(panel: Arc<dyn StatusPanel>) -> Self {
        Self {
            panel,
            expiry: None,
        }
    }

    /// Persistent status update.
    pub fn update(&mut self, text: &str) {
        self.set(text, StatusTone::Info, None);
    }

    /// Status update that hides itself after `expiry`.
    pub fn update_temporary(&mut self, text: &str, expiry: Duration) {
        self.set(text, StatusTone::Info, Some(expiry));
    }

    pub fn show_error(&mut self, message: &str) {
        self.set(&format!("Error: {message}"), StatusTone::Error, Some(ERROR_EXPIRY));
    }

    pub fn show_success(&mut self, message: &str) {
        self.set(
            &format!("Success: {message}"),
            StatusTone::Success,
            Some(SUCCESS_EXPIRY),
        );
    }

    pub fn show_warning(&mut self, message: &str) {
        self.set(
            &format!("Warning: {message}"),
            StatusTone::Warning,
            Some(WARNING_EXPIRY),
        );
    }

    fn set(&mut self, text: &str, tone: StatusTone, expiry: Option<Duration>) {
        if let Some(pending) = self.expiry.take() {
            pending.abort();
        }
        debug!("Status updated: {text}");
        self.panel.set_tone(tone);
        self.panel.set_text(text);
        self.panel.set_visible(true);
        if let Some(after) = expiry {
            let panel = Arc::clone(&self.panel);
            self.expiry = Some(tokio::spawn(async move {
                tokio::time::sleep(after).await;
                panel.set_visible(false);
                panel.set_tone(StatusTone::Info);
            }));
        }
    }

    pub fn teardown(&mut self) {
        if let Some(pending) = self.expiry.take() {
            pending.abort();
        }
    }
}

impl Drop for StatusDisplay {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimStatusPanel;

    #[tokio::test(start_paused = true)]
    async fn temporary_message_expires() {
        let panel = Arc::new(SimStatusPanel::default());
        let mut status = StatusDisplay::new(Arc::clone(&panel) as Arc<dyn StatusPanel>);

        status.update_temporary("detected", Duration::from_secs(3));
        assert!(panel.visible());
        assert_eq!(panel.text(), "detected");

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(!panel.visible());
        assert_eq!(panel.tone(), StatusTone::Info);
    }

    #[tokio::test(start_paused = true)]
    async fn update_replaces_pending_expiry() {
        let panel = Arc::new(SimStatusPanel::default());
        let mut status = StatusDisplay::new(Arc::clone(&panel) as Arc<dyn StatusPanel>);

        status.show_error("camera failed");
        assert_eq!(panel.tone(), StatusTone::Error);

        status.update("Searching for markers...");
        tokio::time::sleep(Duration::from_secs(10)).await;

        // The persistent update outlives the aborted error expiry.
        assert!(panel.visible());
        assert_eq!(panel.text(), "Searching for markers...");
        assert_eq!(panel.tone(), StatusTone::Info);
    }
}
