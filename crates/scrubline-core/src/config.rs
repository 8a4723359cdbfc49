use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub trigger: TriggerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// How the virtual scroll position approaches its target
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DecayCurve {
    /// `1 - 2^(-10 * dt / duration)`, reaching ~99.9% after `duration_ms`
    #[default]
    Exponential,
    /// Share of the remaining distance covered per 60Hz frame
    Lerp { factor: f64 },
}

/// Smooth scrolling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// Enable inertial smoothing; when disabled every input jumps instantly
    #[serde(default = "default_true")]
    pub smooth_enabled: bool,
    /// Decay duration in milliseconds
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,
    /// Multiplier applied to wheel deltas
    #[serde(default = "default_multiplier")]
    pub wheel_multiplier: f64,
    /// Multiplier applied to touch deltas
    #[serde(default = "default_multiplier")]
    pub touch_multiplier: f64,
    /// Distance below which the scroll counts as settled
    #[serde(default = "default_stop_epsilon")]
    pub stop_epsilon: f64,
    /// Largest frame step fed to the decay, in milliseconds
    #[serde(default = "default_max_frame_ms")]
    pub max_frame_ms: u64,
    /// Host frame rate
    #[serde(default = "default_animation_fps")]
    pub animation_fps: u32,
    /// Decay curve
    #[serde(default)]
    pub decay: DecayCurve,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            smooth_enabled: default_true(),
            duration_ms: default_duration_ms(),
            wheel_multiplier: default_multiplier(),
            touch_multiplier: default_multiplier(),
            stop_epsilon: default_stop_epsilon(),
            max_frame_ms: default_max_frame_ms(),
            animation_fps: default_animation_fps(),
            decay: DecayCurve::default(),
        }
    }
}

impl ScrollConfig {
    /// Decay duration in seconds
    #[inline]
    pub fn decay_secs(&self) -> f64 {
        Duration::from_millis(self.duration_ms).as_secs_f64()
    }

    /// Largest frame step in seconds
    #[inline]
    pub fn max_frame_secs(&self) -> f64 {
        Duration::from_millis(self.max_frame_ms).as_secs_f64()
    }

    /// Get tick duration for the host frame loop
    #[inline]
    pub fn frame_duration(&self) -> Duration {
        if self.animation_fps == 0 {
            Duration::from_millis(16) // ~60fps fallback
        } else {
            Duration::from_millis(1000 / self.animation_fps as u64)
        }
    }

    /// Check if smooth scrolling is effectively enabled
    #[inline]
    pub fn is_smooth(&self) -> bool {
        self.smooth_enabled && self.duration_ms > 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Progress changes smaller than this do not notify timelines
    #[serde(default = "default_progress_epsilon")]
    pub progress_epsilon: f64,
    /// Extra scroll distance added to horizontal track triggers (pixels)
    #[serde(default = "default_horizontal_margin")]
    pub horizontal_margin: f64,
    /// Playhead lag used by triggers authored with `scrub = true`
    #[serde(default = "default_scrub_ms")]
    pub scrub_ms: u64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            progress_epsilon: default_progress_epsilon(),
            horizontal_margin: default_horizontal_margin(),
            scrub_ms: default_scrub_ms(),
        }
    }
}

impl TriggerConfig {
    /// Default scrub lag in seconds
    #[inline]
    pub fn scrub_secs(&self) -> f64 {
        Duration::from_millis(self.scrub_ms).as_secs_f64()
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_duration_ms() -> u64 {
    1400
}

fn default_multiplier() -> f64 {
    1.0
}

fn default_stop_epsilon() -> f64 {
    0.01
}

fn default_max_frame_ms() -> u64 {
    100 // clamp after stalls such as a backgrounded tab
}

fn default_animation_fps() -> u32 {
    60
}

fn default_progress_epsilon() -> f64 {
    1e-6
}

fn default_horizontal_margin() -> f64 {
    200.0
}

fn default_scrub_ms() -> u64 {
    500
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl EngineConfig {
    /// Load configuration from the default path or return defaults
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific file, falling back to defaults when absent
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let path = expand_tilde(path);

        let config: Self = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?
        } else {
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default path
    pub fn save(&self) -> crate::Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        let path = expand_tilde(path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Get the configuration file path
    /// Always uses ~/.config/scrubline/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("scrubline")
            .join("config.toml")
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        let scroll = &self.scroll;
        let finite_positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(crate::Error::Config(format!("{} must be a positive number, got {}", name, v)))
            }
        };

        finite_positive("scroll.wheel_multiplier", scroll.wheel_multiplier)?;
        finite_positive("scroll.touch_multiplier", scroll.touch_multiplier)?;
        finite_positive("scroll.stop_epsilon", scroll.stop_epsilon)?;
        finite_positive("trigger.progress_epsilon", self.trigger.progress_epsilon)?;

        if scroll.animation_fps > 1000 {
            return Err(crate::Error::Config(format!(
                "scroll.animation_fps must be at most 1000, got {}",
                scroll.animation_fps
            )));
        }
        if scroll.max_frame_ms == 0 {
            return Err(crate::Error::Config("scroll.max_frame_ms must be greater than 0".into()));
        }
        if let DecayCurve::Lerp { factor } = scroll.decay {
            if !(factor > 0.0 && factor <= 1.0) {
                return Err(crate::Error::Config(format!(
                    "scroll.decay.factor must be in (0, 1], got {}",
                    factor
                )));
            }
        }
        if !self.trigger.horizontal_margin.is_finite() {
            return Err(crate::Error::Config("trigger.horizontal_margin must be finite".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.scroll.smooth_enabled);
        assert_eq!(config.scroll.duration_ms, 1400);
        assert_eq!(config.scroll.decay, DecayCurve::Exponential);
        assert_eq!(config.scroll.animation_fps, 60);
        assert_eq!(config.trigger.horizontal_margin, 200.0);
        assert_eq!(config.general.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_decay_secs() {
        let config = ScrollConfig {
            duration_ms: 200,
            ..Default::default()
        };
        assert!((config.decay_secs() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_is_smooth() {
        let mut config = ScrollConfig::default();
        assert!(config.is_smooth());

        config.smooth_enabled = false;
        assert!(!config.is_smooth());

        config.smooth_enabled = true;
        config.duration_ms = 0;
        assert!(!config.is_smooth());
    }

    #[test]
    fn test_frame_duration_fallback() {
        let config = ScrollConfig {
            animation_fps: 0,
            ..Default::default()
        };
        assert_eq!(config.frame_duration(), Duration::from_millis(16));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            [scroll]
            duration_ms = 800
            decay = { kind = "lerp", factor = 0.1 }

            [trigger]
            horizontal_margin = 120.0
            "#,
        )
        .unwrap();
        assert_eq!(config.scroll.duration_ms, 800);
        assert_eq!(config.scroll.decay, DecayCurve::Lerp { factor: 0.1 });
        assert_eq!(config.scroll.stop_epsilon, 0.01);
        assert_eq!(config.trigger.horizontal_margin, 120.0);
        assert_eq!(config.trigger.scrub_ms, 500);
    }

    #[test]
    fn test_validate_rejects_bad_lerp_factor() {
        let mut config = EngineConfig::default();
        config.scroll.decay = DecayCurve::Lerp { factor: 1.5 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = EngineConfig::default();
        config.scroll.duration_ms = 900;
        config.save_to(&path).unwrap();

        let loaded = EngineConfig::load_from(&path).unwrap();
        assert_eq!(loaded.scroll.duration_ms, 900);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = EngineConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded.scroll.duration_ms, 1400);
    }
}
