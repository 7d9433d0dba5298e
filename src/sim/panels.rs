use crate::ui::loading::LoadingPanel;
use crate::ui::status::{StatusPanel, StatusTone};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Status panel double.
pub struct SimStatusPanel {
    text: Mutex<String>,
    tone: Mutex<StatusTone>,
    visible: AtomicBool,
}

impl Default for SimStatusPanel {
    fn default() -> Self {
        Self {
            text: Mutex::new(String::new()),
            tone: Mutex::new(StatusTone::Info),
            visible: AtomicBool::new(false),
        }
    }
}

impl SimStatusPanel {
    pub fn text(&self) -> String {
        self.text.lock().unwrap().clone()
    }

    pub fn tone(&self) -> StatusTone {
        *self.tone.lock().unwrap()
    }

    pub fn visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}

impl StatusPanel for SimStatusPanel {
    fn set_text(&self, text: &str) {
        *self.text.lock().unwrap() = text.to_string();
    }

    fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
    }

    fn set_tone(&self, tone: StatusTone) {
        *self.tone.lock().unwrap() = tone;
    }
}

/// Loading panel double. Records whether it was ever shown, which the
/// permission-denied tests assert against.
pub struct SimLoadingPanel {
    visible: AtomicBool,
    ever_shown: AtomicBool,
    progress: Mutex<f32>,
    text: Mutex<String>,
}

impl Default for SimLoadingPanel {
    fn default() -> Self {
        Self {
            visible: AtomicBool::new(false),
            ever_shown: AtomicBool::new(false),
            progress: Mutex::new(0.0),
            text: Mutex::new(String::new()),
        }
    }
}

impl SimLoadingPanel {
    pub fn visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    pub fn ever_shown(&self) -> bool {
        self.ever_shown.load(Ordering::SeqCst)
    }

    pub fn progress(&self) -> f32 {
        *self.progress.lock().unwrap()
    }

    pub fn text(&self) -> String {
        self.text.lock().unwrap().clone()
    }
}

impl LoadingPanel for SimLoadingPanel {
    fn set_visible(&self, visible: bool) {
        if visible {
            self.ever_shown.store(true, Ordering::SeqCst);
        }
        self.visible.store(visible, Ordering::SeqCst);
    }

    fn set_progress(&self, percent: f32) {
        *self.progress.lock().unwrap() = percent;
    }

    fn set_text(&self, text: &str) {
        *self.text.lock().unwrap() = text.to_string();
    }
}
