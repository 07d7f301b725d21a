//! Persisted volume and theme preferences.

use serde::{Deserialize, Serialize};

use crate::storage::{self, KeyValueStore, KEY_THEME, KEY_VOLUME};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn as_attr(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

pub struct Preferences<S: KeyValueStore> {
    volume: f64,
    theme: Theme,
    store: S,
}

impl<S: KeyValueStore> Preferences<S> {
    pub fn load(store: S, default_volume: f64) -> Self {
        // volume is stored as an integer percentage
        let volume = storage::read_or_none(&store, KEY_VOLUME)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .map(|pct| f64::from(pct.min(100)) / 100.0)
            .unwrap_or_else(|| default_volume.clamp(0.0, 1.0));
        let theme = storage::read_or_none(&store, KEY_THEME)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self { volume, theme, store }
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Store a new volume; non-finite input is ignored.
    pub fn set_volume(&mut self, volume: f64) {
        if !volume.is_finite() {
            return;
        }
        self.volume = volume.clamp(0.0, 1.0);
        let pct = (self.volume * 100.0).round() as u32;
        storage::write_or_log(&self.store, KEY_VOLUME, &pct.to_string());
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        match serde_json::to_string(&theme) {
            Ok(raw) => storage::write_or_log(&self.store, KEY_THEME, &raw),
            Err(e) => tracing::error!("could not encode theme: {e}"),
        }
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.set_theme(self.theme.toggled());
        self.theme
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn defaults_when_empty() {
        let p = Preferences::load(MemoryStore::new(), 0.28);
        assert!((p.volume() - 0.28).abs() < 1e-12);
        assert_eq!(p.theme(), Theme::Dark);
    }

    #[test]
    fn volume_round_trips_as_percent() {
        let store = MemoryStore::new();
        let mut p = Preferences::load(store.clone(), 0.28);
        p.set_volume(0.456);
        assert_eq!(store.get(KEY_VOLUME).unwrap().as_deref(), Some("46"));
        p.set_volume(f64::NAN);
        assert!((p.volume() - 0.456).abs() < 1e-12);
        let again = Preferences::load(store, 0.28);
        assert!((again.volume() - 0.46).abs() < 1e-12);
    }

    #[test]
    fn theme_toggle_persists() {
        let store = MemoryStore::new();
        let mut p = Preferences::load(store.clone(), 0.5);
        assert_eq!(p.toggle_theme(), Theme::Light);
        assert_eq!(store.get(KEY_THEME).unwrap().as_deref(), Some("\"light\""));
        assert_eq!(Preferences::load(store, 0.5).theme(), Theme::Light);
    }

    #[test]
    fn out_of_range_volume_is_clamped() {
        let store = MemoryStore::new();
        store.set(KEY_VOLUME, "250").unwrap();
        assert_eq!(Preferences::load(store, 0.28).volume(), 1.0);
    }
}
