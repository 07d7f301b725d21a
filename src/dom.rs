//! web-sys implementations of the renderer traits, plus the XP HUD writer and
//! the button click ripple.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, HtmlElement};

use crate::effects::{Ripple, Tilt, TiltBoard};
use crate::progression::HudView;
use crate::renderer::{AmbientTargets, PRESS_TRANSFORM, Surface};
use crate::spectrum::Bar;

/// Ripple spans are removed after this long.
pub const RIPPLE_MS: i32 = 600;

/// 2D canvas. The backing-store size is cached and only re-read by
/// `fit_to_layout`, so a frame never queries the canvas per bar.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    width: f64,
    height: f64,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context"))?
            .dyn_into()?;
        let (width, height) = (canvas.width() as f64, canvas.height() as f64);
        Ok(Self { canvas, ctx, width, height })
    }

    /// Keep the backing store in step with the CSS size of the canvas. Called
    /// on start and on every window resize.
    pub fn fit_to_layout(&mut self) {
        let w = self.canvas.client_width().max(1) as u32;
        let h = self.canvas.client_height().max(1) as u32;
        if self.canvas.width() != w || self.canvas.height() != h {
            self.canvas.set_width(w);
            self.canvas.set_height(h);
        }
        self.width = f64::from(w);
        self.height = f64::from(h);
    }
}

impl Surface for CanvasSurface {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.ctx.clear_rect(0.0, 0.0, self.width, self.height);
    }

    fn fill_bar(&mut self, bar: &Bar) {
        self.ctx
            .set_fill_style(&JsValue::from_str(&format!("hsl({:.0}, 100%, 60%)", bar.hue)));
        // 1px gap between bars
        self.ctx
            .fill_rect(bar.x, self.height - bar.height, (bar.width - 1.0).max(1.0), bar.height);
    }
}

fn set_style(el: &HtmlElement, prop: &str, value: &str) {
    let _ = el.style().set_property(prop, value);
}

/// Logo, button grid and background glow of the page.
pub struct DomTargets {
    buttons: Vec<HtmlElement>,
    pressed: Vec<bool>,
    tilt: TiltBoard,
    logo: Option<HtmlElement>,
    glow: Option<HtmlElement>,
}

impl DomTargets {
    pub fn new(buttons: Vec<HtmlElement>, logo: Option<HtmlElement>, glow: Option<HtmlElement>) -> Self {
        let pressed = vec![false; buttons.len()];
        let tilt = TiltBoard::new(buttons.len());
        Self { buttons, pressed, tilt, logo, glow }
    }

    /// Record the pointer tilt of button `index`. Written on the next frame.
    pub fn set_tilt(&mut self, index: usize, tilt: Tilt) {
        self.tilt.set(index, tilt);
    }

    /// Write pending tilts on a frame where the renderer did not run.
    /// Held buttons keep their press transform and stay pending.
    pub fn flush_tilt(&mut self) {
        let pressed = &self.pressed;
        let pending = self.tilt.take_pending(|i| !pressed.get(i).copied().unwrap_or(false));
        for i in pending {
            if let Some(el) = self.buttons.get(i) {
                set_style(el, "transform", &self.tilt.get(i).transform(1.0));
            }
        }
    }

    /// The renderer just wrote every button that is not held.
    pub fn tilt_written(&mut self) {
        let pressed = &self.pressed;
        self.tilt.take_pending(|i| !pressed.get(i).copied().unwrap_or(false));
    }

    /// Hand button `index` to the press handler: flag it and show the press
    /// transform until `release`.
    pub fn press(&mut self, index: usize) {
        if let (Some(flag), Some(el)) = (self.pressed.get_mut(index), self.buttons.get(index)) {
            *flag = true;
            set_style(el, "transform", PRESS_TRANSFORM);
        }
    }

    pub fn release(&mut self, index: usize) {
        if let (Some(flag), Some(el)) = (self.pressed.get_mut(index), self.buttons.get(index)) {
            if *flag {
                *flag = false;
                let _ = el.style().remove_property("transform");
            }
        }
    }
}

impl AmbientTargets for DomTargets {
    fn button_count(&self) -> usize {
        self.buttons.len()
    }

    fn is_pressed(&self, index: usize) -> bool {
        self.pressed.get(index).copied().unwrap_or(false)
    }

    fn tilt(&self, index: usize) -> Tilt {
        self.tilt.get(index)
    }

    fn set_button_style(&mut self, index: usize, transform: &str, filter: &str) {
        if let Some(el) = self.buttons.get(index) {
            set_style(el, "transform", transform);
            set_style(el, "filter", filter);
        }
    }

    fn set_logo_style(&mut self, transform: &str, filter: &str) {
        if let Some(el) = &self.logo {
            set_style(el, "transform", transform);
            set_style(el, "filter", filter);
        }
    }

    fn set_glow_opacity(&mut self, opacity: f64) {
        if let Some(el) = &self.glow {
            set_style(el, "opacity", &format!("{opacity:.3}"));
        }
    }
}

/// `#xp-level`, `#xp-text`, `#xp-fill`. Any of them may be missing.
pub struct HudElements {
    level: Option<Element>,
    text: Option<Element>,
    fill: Option<HtmlElement>,
}

impl HudElements {
    pub fn find(doc: &Document) -> Self {
        Self {
            level: doc.get_element_by_id("xp-level"),
            text: doc.get_element_by_id("xp-text"),
            fill: doc
                .get_element_by_id("xp-fill")
                .and_then(|e| e.dyn_into::<HtmlElement>().ok()),
        }
    }

    pub fn render(&self, view: &HudView) {
        if let Some(el) = &self.level {
            el.set_text_content(Some(&view.level_label));
        }
        if let Some(el) = &self.text {
            el.set_text_content(Some(&view.xp_label));
        }
        if let Some(el) = &self.fill {
            set_style(el, "width", &format!("{:.1}%", view.fill_percent));
        }
    }
}

/// Add a `span.ripple` centred on the click at (`client_x`, `client_y`) and
/// remove it after `RIPPLE_MS`.
pub fn spawn_ripple(button: &HtmlElement, client_x: f64, client_y: f64) -> Result<(), JsValue> {
    let doc = button
        .owner_document()
        .ok_or_else(|| JsValue::from_str("button is not in a document"))?;
    let rect = button.get_bounding_client_rect();
    let ripple = Ripple::at(
        client_x - rect.left(),
        client_y - rect.top(),
        rect.width(),
        rect.height(),
    );

    let span: HtmlElement = doc.create_element("span")?.dyn_into()?;
    span.set_class_name("ripple");
    for (prop, px) in [
        ("left", ripple.left),
        ("top", ripple.top),
        ("width", ripple.size),
        ("height", ripple.size),
    ] {
        set_style(&span, prop, &format!("{px:.1}px"));
    }
    button.append_child(&span)?;

    let cleanup = Closure::once_into_js(move || span.remove());
    web_sys::window()
        .ok_or_else(|| JsValue::from_str("no window"))?
        .set_timeout_with_callback_and_timeout_and_arguments_0(cleanup.unchecked_ref(), RIPPLE_MS)?;
    Ok(())
}
