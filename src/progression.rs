//! XP / level meta-game.
//!
//! `ProgressState` is the plain (experience, level) pair with the level-up
//! rollover rule; `Progression` wraps it with persistence, reward entry points
//! and the HUD view. Every mutation writes both keys back before returning.

use crate::config::ProgressionConfig;
use crate::error::ProgressError;
use crate::storage::{self, KeyValueStore, KEY_LEVEL, KEY_XP};

/// XP needed to go from `level` to `level + 1`. Saturates at `u64::MAX` for
/// configs large enough to overflow.
pub fn xp_needed_for_level(cfg: &ProgressionConfig, level: u32) -> u64 {
    let steps = u64::from(level.saturating_sub(1));
    cfg.base_xp.saturating_add(steps.saturating_mul(cfg.xp_increment))
}

/// Validate an XP grant coming from script land. NaN, infinities and anything
/// below one whole point are rejected; fractions are truncated.
pub fn parse_reward(raw: f64) -> Result<i64, ProgressError> {
    if !raw.is_finite() || raw.trunc() < 1.0 {
        return Err(ProgressError::InvalidRewardAmount(raw));
    }
    Ok(raw.trunc().min(i64::MAX as f64) as i64)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressState {
    pub experience: u64,
    pub level: u32,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self { experience: 0, level: 1 }
    }
}

impl ProgressState {
    pub fn at_cap(&self, cfg: &ProgressionConfig) -> bool {
        self.level >= cfg.max_level.max(1)
    }

    /// Roll surplus experience into levels. Returns how many levels were gained.
    ///
    /// Below the cap this leaves `experience < xp_needed_for_level(level)`;
    /// at the cap experience is clamped to the cap threshold instead.
    pub fn normalize(&mut self, cfg: &ProgressionConfig) -> u32 {
        let max_level = cfg.max_level.max(1);
        self.level = self.level.clamp(1, max_level);
        let mut gained = 0;
        while self.level < max_level {
            let need = xp_needed_for_level(cfg, self.level);
            if self.experience < need {
                break;
            }
            self.experience -= need;
            self.level += 1;
            gained += 1;
        }
        if self.level == max_level {
            self.experience = self.experience.min(xp_needed_for_level(cfg, max_level));
        }
        gained
    }

    /// Total XP represented by this state: every threshold already passed plus
    /// the experience carried in the current level.
    pub fn effective_xp(&self, cfg: &ProgressionConfig) -> u64 {
        (1..self.level)
            .map(|l| xp_needed_for_level(cfg, l))
            .fold(self.experience, u64::saturating_add)
    }
}

/// Text the page shows in the XP HUD.
#[derive(Clone, Debug, PartialEq)]
pub struct HudView {
    pub level_label: String,
    pub xp_label: String,
    /// 0..=100
    pub fill_percent: f64,
}

impl HudView {
    pub fn of(state: &ProgressState, cfg: &ProgressionConfig) -> Self {
        let need = xp_needed_for_level(cfg, state.level);
        if state.at_cap(cfg) {
            return Self {
                level_label: format!("Lv. {} (MAX)", state.level),
                xp_label: "MAX".to_string(),
                fill_percent: 100.0,
            };
        }
        let fill = if need == 0 {
            100.0
        } else {
            (state.experience as f64 / need as f64 * 100.0).clamp(0.0, 100.0)
        };
        Self {
            level_label: format!("Lv. {}", state.level),
            xp_label: format!("{} / {} XP", state.experience, need),
            fill_percent: fill,
        }
    }
}

pub struct Progression<S: KeyValueStore> {
    state: ProgressState,
    config: ProgressionConfig,
    store: S,
}

impl<S: KeyValueStore> Progression<S> {
    /// Load from storage. Missing or garbled values fall back to the defaults,
    /// out-of-range levels are clamped and surplus experience is rolled over.
    pub fn load(store: S, config: ProgressionConfig) -> Self {
        let experience = storage::read_or_none(&store, KEY_XP)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0);
        let level = storage::read_or_none(&store, KEY_LEVEL)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(1);
        let mut state = ProgressState { experience, level };
        state.normalize(&config);
        Self { state, config, store }
    }

    pub fn state(&self) -> ProgressState {
        self.state
    }

    pub fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    pub fn hud(&self) -> HudView {
        HudView::of(&self.state, &self.config)
    }

    /// Add experience and roll over levels. Non-positive amounts are ignored.
    /// Returns the number of levels gained.
    pub fn add_experience(&mut self, amount: i64) -> u32 {
        if amount <= 0 {
            return 0;
        }
        self.state.experience = self.state.experience.saturating_add(amount as u64);
        let gained = self.state.normalize(&self.config);
        self.persist();
        gained
    }

    /// `add_experience` for untyped input (JS numbers).
    pub fn grant(&mut self, raw: f64) -> u32 {
        match parse_reward(raw) {
            Ok(amount) => self.add_experience(amount),
            Err(_) => 0,
        }
    }

    pub fn idle_tick(&mut self) -> u32 {
        self.add_experience(i64::try_from(self.config.idle_reward).unwrap_or(i64::MAX))
    }

    pub fn click(&mut self, social: bool) -> u32 {
        let reward = if social {
            self.config.social_reward
        } else {
            self.config.click_reward
        };
        self.add_experience(i64::try_from(reward).unwrap_or(i64::MAX))
    }

    /// Raise the level to at least `floor` (clamped to the cap). Experience is
    /// reset only when the level actually went up.
    pub fn raise_level_floor(&mut self, floor: u32) -> bool {
        let target = floor.clamp(1, self.config.max_level.max(1));
        if target <= self.state.level {
            return false;
        }
        self.state.level = target;
        self.state.experience = 0;
        self.persist();
        true
    }

    fn persist(&self) {
        storage::write_or_log(&self.store, KEY_XP, &self.state.experience.to_string());
        storage::write_or_log(&self.store, KEY_LEVEL, &self.state.level.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn cfg() -> ProgressionConfig {
        ProgressionConfig::default()
    }

    #[test]
    fn thresholds_follow_linear_curve() {
        let c = cfg();
        assert_eq!(xp_needed_for_level(&c, 1), 100);
        assert_eq!(xp_needed_for_level(&c, 2), 120);
        assert_eq!(xp_needed_for_level(&c, 5), 180);
        // level 0 never happens but must not underflow
        assert_eq!(xp_needed_for_level(&c, 0), 100);
    }

    #[test]
    fn huge_curve_saturates_instead_of_overflowing() {
        let c = ProgressionConfig { xp_increment: u64::MAX, max_level: 5, ..cfg() };
        assert_eq!(xp_needed_for_level(&c, 1), 100);
        assert_eq!(xp_needed_for_level(&c, 2), u64::MAX);
        assert_eq!(xp_needed_for_level(&c, u32::MAX), u64::MAX);

        let mut s = ProgressState { experience: u64::MAX, level: 1 };
        assert_eq!(s.normalize(&c), 1);
        assert_eq!(s, ProgressState { experience: u64::MAX - 100, level: 2 });
        assert_eq!(s.effective_xp(&c), u64::MAX);
    }

    #[test]
    fn parse_reward_rejects_garbage() {
        assert!(parse_reward(f64::NAN).is_err());
        assert!(parse_reward(f64::INFINITY).is_err());
        assert!(parse_reward(0.0).is_err());
        assert!(parse_reward(-4.0).is_err());
        assert!(parse_reward(0.9).is_err());
        assert_eq!(parse_reward(5.7).unwrap(), 5);
    }

    #[test]
    fn normalize_clamps_at_cap() {
        let c = ProgressionConfig { max_level: 3, ..cfg() };
        let mut s = ProgressState { experience: 10_000, level: 1 };
        assert_eq!(s.normalize(&c), 2);
        assert_eq!(s.level, 3);
        assert_eq!(s.experience, xp_needed_for_level(&c, 3));
    }

    #[test]
    fn normalize_clamps_level_range() {
        let c = ProgressionConfig { max_level: 4, ..cfg() };
        let mut s = ProgressState { experience: 0, level: 0 };
        s.normalize(&c);
        assert_eq!(s.level, 1);
        let mut s = ProgressState { experience: 0, level: 99 };
        s.normalize(&c);
        assert_eq!(s.level, 4);
    }

    #[test]
    fn load_falls_back_on_garbage() {
        let store = MemoryStore::new();
        store.set(KEY_XP, "abc").unwrap();
        store.set(KEY_LEVEL, "-2").unwrap();
        let p = Progression::load(store, cfg());
        assert_eq!(p.state(), ProgressState::default());
    }

    #[test]
    fn load_rolls_over_stored_surplus() {
        let store = MemoryStore::new();
        store.set(KEY_XP, "130").unwrap();
        store.set(KEY_LEVEL, "2").unwrap();
        let p = Progression::load(store, cfg());
        assert_eq!(p.state(), ProgressState { experience: 10, level: 3 });
    }

    #[test]
    fn every_mutation_persists() {
        let store = MemoryStore::new();
        let mut p = Progression::load(store.clone(), cfg());
        p.idle_tick();
        assert_eq!(store.get(KEY_XP).unwrap().as_deref(), Some("1"));
        assert_eq!(store.get(KEY_LEVEL).unwrap().as_deref(), Some("1"));
        p.click(true);
        assert_eq!(store.get(KEY_XP).unwrap().as_deref(), Some("1"));
        assert_eq!(store.get(KEY_LEVEL).unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn invalid_grants_are_noops() {
        let store = MemoryStore::new();
        let mut p = Progression::load(store.clone(), cfg());
        assert_eq!(p.add_experience(0), 0);
        assert_eq!(p.add_experience(-50), 0);
        assert_eq!(p.grant(f64::NAN), 0);
        assert_eq!(p.state(), ProgressState::default());
        assert!(store.is_empty());
    }

    #[test]
    fn storage_failure_keeps_memory_state() {
        let store = MemoryStore::new();
        let mut p = Progression::load(store.clone(), cfg());
        store.set_available(false);
        p.click(false);
        p.click(false);
        assert_eq!(p.state().experience, 10);
        store.set_available(true);
        assert!(store.is_empty());
    }

    #[test]
    fn level_floor_only_raises() {
        let mut p = Progression::load(MemoryStore::new(), cfg());
        p.add_experience(40);
        assert!(p.raise_level_floor(3));
        assert_eq!(p.state(), ProgressState { experience: 0, level: 3 });
        p.add_experience(7);
        assert!(!p.raise_level_floor(2));
        assert_eq!(p.state(), ProgressState { experience: 7, level: 3 });
    }

    #[test]
    fn hud_shows_progress_and_cap() {
        let c = ProgressionConfig { max_level: 2, ..cfg() };
        let mut p = Progression::load(MemoryStore::new(), c);
        p.add_experience(25);
        let hud = p.hud();
        assert_eq!(hud.level_label, "Lv. 1");
        assert_eq!(hud.xp_label, "25 / 100 XP");
        assert!((hud.fill_percent - 25.0).abs() < 1e-9);
        p.add_experience(1_000);
        let hud = p.hud();
        assert_eq!(hud.xp_label, "MAX");
        assert_eq!(hud.fill_percent, 100.0);
    }
}
