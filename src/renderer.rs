//! Visual renderer: spectrum bars on a canvas plus the ambient pulse written
//! onto the logo, the button grid and the background glow.
//!
//! The renderer only sees the `Surface` and `AmbientTargets` traits; `dom.rs`
//! implements them over web-sys, tests implement them over plain vectors.

use crate::config::VisualizerConfig;
use crate::effects::Tilt;
use crate::spectrum::{self, Bar};

/// Transform the press handler puts on a held button.
pub const PRESS_TRANSFORM: &str = "scale(0.94)";

pub trait Surface {
    /// Drawable size in pixels.
    fn size(&self) -> (f64, f64);
    fn clear(&mut self);
    /// Draw one bar standing on the bottom edge.
    fn fill_bar(&mut self, bar: &Bar);
}

pub trait AmbientTargets {
    fn button_count(&self) -> usize;
    /// True while the user is holding button `index` down.
    fn is_pressed(&self, index: usize) -> bool;
    /// Pointer tilt to compose with the pulse on button `index`.
    fn tilt(&self, _index: usize) -> Tilt {
        Tilt::default()
    }
    fn set_button_style(&mut self, index: usize, transform: &str, filter: &str);
    fn set_logo_style(&mut self, transform: &str, filter: &str);
    fn set_glow_opacity(&mut self, opacity: f64);
}

/// Ambient values derived from one frame's bass energy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientFrame {
    pub bass: f64,
    pub glow_opacity: f64,
    pub button_scale: f64,
    pub button_brightness: f64,
    /// Degrees per second.
    pub logo_speed: f64,
    pub logo_scale: f64,
    pub logo_glow_px: f64,
}

impl AmbientFrame {
    pub fn from_bass(bass: f64, cfg: &VisualizerConfig) -> Self {
        let bass = if bass.is_finite() { bass.clamp(0.0, 1.0) } else { 0.0 };
        let pulse = cfg.button_pulse.max(0.0);
        Self {
            bass,
            glow_opacity: (0.2 + bass * 0.8).clamp(0.0, 1.0),
            button_scale: (1.0 + bass * pulse).clamp(1.0, 1.0 + pulse),
            button_brightness: 1.0 + bass * 0.35,
            logo_speed: cfg.logo_base_speed + bass * cfg.logo_bass_speed,
            logo_scale: 1.0 + bass * 0.12,
            logo_glow_px: 6.0 + bass * 30.0,
        }
    }

    pub fn button_filter(&self) -> String {
        format!("brightness({:.3})", self.button_brightness)
    }
}

pub struct Renderer {
    cfg: VisualizerConfig,
    logo_angle: f64,
    last_ms: Option<f64>,
    burst_until_ms: f64,
    reduced_motion: bool,
}

impl Renderer {
    pub fn new(cfg: VisualizerConfig) -> Self {
        Self {
            cfg,
            logo_angle: 0.0,
            last_ms: None,
            burst_until_ms: f64::NEG_INFINITY,
            reduced_motion: false,
        }
    }

    pub fn set_reduced_motion(&mut self, reduced: bool) {
        self.reduced_motion = reduced;
    }

    /// Spin the logo faster for `burst_ms` starting at `now_ms`.
    pub fn burst(&mut self, now_ms: f64) {
        self.burst_until_ms = now_ms + self.cfg.burst_ms;
    }

    pub fn logo_angle(&self) -> f64 {
        self.logo_angle
    }

    /// Render one frame. Without a snapshot or a surface this is a no-op:
    /// nothing is drawn or written and the logo does not advance.
    pub fn step<S, T>(
        &mut self,
        now_ms: f64,
        snapshot: Option<&[u8]>,
        surface: Option<&mut S>,
        targets: &mut T,
    ) -> Option<AmbientFrame>
    where
        S: Surface + ?Sized,
        T: AmbientTargets + ?Sized,
    {
        let (snapshot, surface) = (snapshot?, surface?);
        // Long gaps (background tab) must not fling the logo around.
        let dt_ms = self
            .last_ms
            .map(|last| (now_ms - last).clamp(0.0, 100.0))
            .unwrap_or(0.0);
        self.last_ms = Some(now_ms);

        let (w, h) = surface.size();
        surface.clear();
        for bar in spectrum::layout_bars(snapshot, self.cfg.max_bars, w, h, now_ms, self.cfg.hue_speed) {
            surface.fill_bar(&bar);
        }

        let frame = AmbientFrame::from_bass(spectrum::bass_energy(snapshot, self.cfg.bass_bins), &self.cfg);
        let mut speed = frame.logo_speed;
        if now_ms < self.burst_until_ms {
            speed *= self.cfg.burst_multiplier;
        }
        self.logo_angle = (self.logo_angle + speed * dt_ms / 1000.0).rem_euclid(360.0);

        if self.reduced_motion {
            return Some(frame);
        }

        targets.set_glow_opacity(frame.glow_opacity);
        targets.set_logo_style(
            &format!("rotate({:.2}deg) scale({:.3})", self.logo_angle, frame.logo_scale),
            &format!(
                "drop-shadow(0 0 {:.1}px rgba(255, 255, 255, {:.2}))",
                frame.logo_glow_px,
                0.35 + frame.bass * 0.5
            ),
        );
        let filter = frame.button_filter();
        for i in 0..targets.button_count() {
            if targets.is_pressed(i) {
                continue;
            }
            let transform = targets.tilt(i).transform(frame.button_scale);
            targets.set_button_style(i, &transform, &filter);
        }
        Some(frame)
    }
}
