//! Link Hub core crate.
//!
//! A single-page link hub compiled to wasm: a Start gate, background music
//! with a canvas spectrum visualizer, an audio-reactive pulse on the logo and
//! button grid, and a persisted XP / level meta-game with one-time redeem
//! codes. `start_hub()` wires everything onto the page; apart from `app` and
//! `dom`, the modules are plain Rust and run natively under `cargo test`.

use wasm_bindgen::prelude::*;

pub mod analyzer;
mod app;
pub mod config;
pub mod dom;
pub mod error;
pub mod effects;
pub mod fade;
pub mod logging;
pub mod prefs;
pub mod progression;
pub mod redeem;
pub mod renderer;
pub mod spectrum;
pub mod storage;
pub mod visualizer;

pub use config::HubConfig;
pub use error::{AudioError, ProgressError, RedeemError, StorageError};
pub use progression::{xp_needed_for_level, ProgressState, Progression};
pub use redeem::{RedeemLedger, RedeemSuccess, Reward};
pub use storage::{KeyValueStore, LocalStorage, MemoryStore};
pub use visualizer::AudioVisualizerService;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Wire the hub onto the current page. `config_json` is an optional, possibly
/// partial, `HubConfig` object.
#[wasm_bindgen]
pub fn start_hub(config_json: Option<String>) -> Result<(), JsValue> {
    app::start_hub(config_json)
}

/// Report a page action button activation (`social` buttons pay more XP).
#[wasm_bindgen]
pub fn hub_button_activated(social: bool) {
    app::button_activated(social)
}

/// Redeem a code and get back the message to show.
#[wasm_bindgen]
pub fn hub_redeem(code: &str) -> String {
    app::redeem(code)
}

/// Grant XP from script. Non-positive or non-numeric amounts are ignored;
/// returns the number of levels gained.
#[wasm_bindgen]
pub fn hub_grant_experience(amount: f64) -> u32 {
    app::grant_experience(amount)
}
