//! Player settings and preferences
//!
//! Persisted separately from saved programs in LocalStorage.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::QueueConfig;

/// Playback speed presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PlaybackSpeed {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl PlaybackSpeed {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackSpeed::Slow => "Slow",
            PlaybackSpeed::Normal => "Normal",
            PlaybackSpeed::Fast => "Fast",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "slow" => Some(PlaybackSpeed::Slow),
            "normal" => Some(PlaybackSpeed::Normal),
            "fast" => Some(PlaybackSpeed::Fast),
            _ => None,
        }
    }

    /// Duration of one atomic action at this speed
    pub fn action_duration_ms(&self) -> f32 {
        match self {
            PlaybackSpeed::Slow => DEFAULT_ACTION_DURATION_MS * 2.0,
            PlaybackSpeed::Normal => DEFAULT_ACTION_DURATION_MS,
            PlaybackSpeed::Fast => DEFAULT_ACTION_DURATION_MS / 2.0,
        }
    }
}

/// Player settings/preferences
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Playback speed preset
    #[serde(default)]
    pub speed: PlaybackSpeed,
}

impl Settings {
    pub fn from_speed(speed: PlaybackSpeed) -> Self {
        Self { speed }
    }

    /// Queue configuration for a level allowing `max_size` items
    pub fn queue_config(&self, max_size: usize) -> QueueConfig {
        QueueConfig {
            max_size,
            action_duration_ms: self.speed.action_duration_ms(),
        }
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "codeball_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_durations() {
        assert!(PlaybackSpeed::Slow.action_duration_ms() > PlaybackSpeed::Normal.action_duration_ms());
        assert!(PlaybackSpeed::Fast.action_duration_ms() < PlaybackSpeed::Normal.action_duration_ms());
        assert_eq!(PlaybackSpeed::from_str("FAST"), Some(PlaybackSpeed::Fast));
        assert_eq!(PlaybackSpeed::from_str("warp"), None);
    }

    #[test]
    fn test_queue_config_follows_speed() {
        let settings = Settings::from_speed(PlaybackSpeed::Fast);
        let config = settings.queue_config(8);
        assert_eq!(config.max_size, 8);
        assert_eq!(config.action_duration_ms, DEFAULT_ACTION_DURATION_MS / 2.0);
    }

    #[test]
    fn test_normal_has_no_aliases() {
        assert_eq!(PlaybackSpeed::from_str("Normal"), Some(PlaybackSpeed::Normal));
        assert_eq!(PlaybackSpeed::from_str("med"), None);
    }

    #[test]
    fn test_settings_json_ignores_unknown_fields() {
        let json = r#"{"speed":"Slow","sound":true,"sfx_volume":0.5}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.speed, PlaybackSpeed::Slow);

        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.speed, PlaybackSpeed::Normal);
    }
}
