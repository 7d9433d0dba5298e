use crate::scene::surface::Offset;
use crate::tracker::MarkerId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Binding of one marker to its media source and render surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerBinding {
    /// Media source id, e.g. "video-01".
    pub video: String,
    /// Render surface id, e.g. "plane-01".
    pub plane: String,
    #[serde(default)]
    pub offset: Offset,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Debounce before a raw found signal becomes an activation attempt.
    pub found_debounce_ms: u64,
    /// Debounce before a raw lost signal becomes a deactivation. Longer
    /// than the found debounce so brief occlusion does not stop playback.
    pub lost_debounce_ms: u64,
    /// Delay between showing a plane and starting its video.
    pub playback_settle_ms: u64,
    pub fade_in_ms: u64,
    pub fade_out_ms: u64,
    /// Forces AR-ready when the tracker never signals it.
    pub ready_fallback_ms: u64,
    /// Delay before the status text reverts to "searching" after the
    /// last marker deactivates.
    pub status_revert_ms: u64,
    pub max_play_attempts: u32,
    pub play_retry_backoff_ms: u64,
    pub ready_poll_ms: u64,
    pub plane_width: f32,
    pub plane_height: f32,
    pub plane_elevation: f32,
    /// Periodic random-nudge separation of overlapping planes. Superseded
    /// by single-display mode and off by default.
    pub dynamic_separation: bool,
    pub separation_sweep_ms: u64,
    pub markers: IndexMap<MarkerId, MarkerBinding>,
}

impl Default for Configuration {
    fn default() -> Self {
        let mut markers = IndexMap::new();
        for n in 1..=3 {
            markers.insert(
                MarkerId::new(format!("marker-{n:02}")),
                MarkerBinding {
                    video: format!("video-{n:02}"),
                    plane: format!("plane-{n:02}"),
                    offset: Offset::ZERO,
                },
            );
        }
        Self {
            found_debounce_ms: 100,
            lost_debounce_ms: 500,
            playback_settle_ms: 200,
            fade_in_ms: 300,
            fade_out_ms: 500,
            ready_fallback_ms: 3000,
            status_revert_ms: 500,
            max_play_attempts: 3,
            play_retry_backoff_ms: 500,
            ready_poll_ms: 100,
            plane_width: 1.8,
            plane_height: 1.0125,
            plane_elevation: 0.01,
            dynamic_separation: false,
            separation_sweep_ms: 2000,
            markers,
        }
    }
}

impl Configuration {
    /// Loads configuration from an optional file (any format the config
    /// crate understands) with `AROVERLAY_*` environment overrides on top.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name(path.unwrap_or("aroverlay")).required(false))
            .add_source(config::Environment::with_prefix("AROVERLAY").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn found_debounce(&self) -> Duration {
        Duration::from_millis(self.found_debounce_ms)
    }

    pub fn lost_debounce(&self) -> Duration {
        Duration::from_millis(self.lost_debounce_ms)
    }

    pub fn playback_settle(&self) -> Duration {
        Duration::from_millis(self.playback_settle_ms)
    }

    pub fn fade_in(&self) -> Duration {
        Duration::from_millis(self.fade_in_ms)
    }

    pub fn fade_out(&self) -> Duration {
        Duration::from_millis(self.fade_out_ms)
    }

    pub fn ready_fallback(&self) -> Duration {
        Duration::from_millis(self.ready_fallback_ms)
    }

    pub fn status_revert(&self) -> Duration {
        Duration::from_millis(self.status_revert_ms)
    }

    pub fn play_retry_backoff(&self) -> Duration {
        Duration::from_millis(self.play_retry_backoff_ms)
    }

    pub fn ready_poll(&self) -> Duration {
        Duration::from_millis(self.ready_poll_ms)
    }

    pub fn separation_sweep(&self) -> Duration {
        Duration::from_millis(self.separation_sweep_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_timings() {
        let config = Configuration::default();
        assert_eq!(config.found_debounce(), Duration::from_millis(100));
        assert_eq!(config.lost_debounce(), Duration::from_millis(500));
        assert_eq!(config.playback_settle(), Duration::from_millis(200));
        assert_eq!(config.max_play_attempts, 3);
        assert!(!config.dynamic_separation);
        assert_eq!(config.markers.len(), 3);
    }

    #[test]
    fn marker_registry_preserves_declaration_order() {
        let raw = r#"{
            "markers": {
                "marker-b": { "video": "video-b", "plane": "plane-b" },
                "marker-a": { "video": "video-a", "plane": "plane-a", "offset": { "x": 1.0, "y": 0.0, "z": 0.0 } }
            }
        }"#;
        let config: Configuration = serde_json::from_str(raw).unwrap();
        let ids: Vec<_> = config.markers.keys().map(MarkerId::as_str).collect();
        assert_eq!(ids, vec!["marker-b", "marker-a"]);
        assert_eq!(config.markers[&MarkerId::new("marker-a")].offset.x, 1.0);
    }
}
