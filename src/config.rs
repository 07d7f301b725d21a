//! Tunables for the hub. Every field has a default so the page can pass a
//! partial JSON object (or nothing) to `start_hub`.

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct HubConfig {
    /// `tracing` level name for the console log.
    pub log_level: String,
    pub progression: ProgressionConfig,
    pub visualizer: VisualizerConfig,
    pub audio: AudioConfig,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            progression: ProgressionConfig::default(),
            visualizer: VisualizerConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

impl HubConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// XP curve and reward amounts.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProgressionConfig {
    /// XP needed to leave level 1.
    pub base_xp: u64,
    /// Extra XP needed per level above 1.
    pub xp_increment: u64,
    pub max_level: u32,
    pub idle_reward: u64,
    pub idle_interval_ms: u32,
    pub click_reward: u64,
    pub social_reward: u64,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            base_xp: 100,
            xp_increment: 20,
            max_level: 100,
            idle_reward: 1,
            idle_interval_ms: 1000,
            click_reward: 5,
            social_reward: 100,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct VisualizerConfig {
    /// Analyzer transform size, rounded to a power of two in 32..=32768.
    pub fft_size: u32,
    pub max_bars: usize,
    /// Number of low bins averaged into the bass energy.
    pub bass_bins: usize,
    /// Hue degrees per millisecond.
    pub hue_speed: f64,
    /// Max extra button scale at full bass.
    pub button_pulse: f64,
    /// Logo rotation speed at silence, degrees per second.
    pub logo_base_speed: f64,
    /// Extra logo rotation speed at full bass, degrees per second.
    pub logo_bass_speed: f64,
    /// Rotation speed multiplier while the start burst is active.
    pub burst_multiplier: f64,
    pub burst_ms: f64,
    /// Max pointer tilt of a button, degrees per axis.
    pub tilt_max_deg: f64,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            fft_size: 256,
            max_bars: 128,
            bass_bins: 8,
            hue_speed: 0.05,
            button_pulse: 0.08,
            logo_base_speed: 24.0,
            logo_bass_speed: 240.0,
            burst_multiplier: 6.0,
            burst_ms: 1200.0,
            tilt_max_deg: 8.0,
        }
    }
}

impl VisualizerConfig {
    /// `fft_size` snapped to what an analyser node accepts.
    pub fn window_size(&self) -> u32 {
        self.fft_size.clamp(32, 32768).next_power_of_two().min(32768)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub default_volume: f64,
    pub fade_ms: f64,
    pub visibility_fade_ms: f64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            default_volume: 0.28,
            fade_ms: 600.0,
            visibility_fade_ms: 300.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = HubConfig::from_json(r#"{"progression":{"max_level":10}}"#).unwrap();
        assert_eq!(cfg.progression.max_level, 10);
        assert_eq!(cfg.progression.base_xp, 100);
        assert_eq!(cfg.visualizer, VisualizerConfig::default());
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(HubConfig::from_json("{}").unwrap(), HubConfig::default());
        assert!(HubConfig::from_json("[1,2]").is_err());
    }

    #[test]
    fn window_size_is_power_of_two() {
        let mut v = VisualizerConfig::default();
        assert_eq!(v.window_size(), 256);
        v.fft_size = 300;
        assert_eq!(v.window_size(), 512);
        v.fft_size = 1;
        assert_eq!(v.window_size(), 32);
        v.fft_size = 1 << 20;
        assert_eq!(v.window_size(), 32768);
    }
}
