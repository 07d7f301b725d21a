//! Page wiring: DOM lookup, event listeners, the animation-frame loop and the
//! idle XP interval. All hub state lives in one thread-local `Hub` and is
//! only touched from browser callbacks.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    window, Document, EventTarget, HtmlAudioElement, HtmlCanvasElement, HtmlElement,
    HtmlInputElement, KeyboardEvent, MouseEvent, PointerEvent,
};

use crate::analyzer::WebAudioGraph;
use crate::config::HubConfig;
use crate::dom::{self, CanvasSurface, DomTargets, HudElements};
use crate::effects::Tilt;
use crate::error::AudioError;
use crate::fade::VolumeFade;
use crate::prefs::{Preferences, Theme};
use crate::progression::Progression;
use crate::redeem::RedeemLedger;
use crate::storage::LocalStorage;
use crate::visualizer::AudioVisualizerService;
use tracing::{info, warn};

const OVERLAY_HIDE_MS: i32 = 360;

struct Hub {
    config: HubConfig,
    progress: Progression<LocalStorage>,
    ledger: RedeemLedger<LocalStorage>,
    prefs: Preferences<LocalStorage>,
    visualizer: AudioVisualizerService<WebAudioGraph>,
    surface: Option<CanvasSurface>,
    targets: DomTargets,
    hud: HudElements,
    overlay: HtmlElement,
    redeem_msg: Option<web_sys::Element>,
    reduced_motion: bool,
    music: Option<HtmlAudioElement>,
    music_playing: bool,
    retry_playback: bool,
    fade: Option<VolumeFade>,
    started: bool,
}

thread_local! {
    static HUB: RefCell<Option<Hub>> = RefCell::new(None);
}

fn with_hub<R>(f: impl FnOnce(&mut Hub) -> R) -> Option<R> {
    HUB.with(|cell| cell.borrow_mut().as_mut().map(f))
}

fn now_ms() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

fn listen(
    target: &EventTarget,
    event: &str,
    handler: impl FnMut(web_sys::Event) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(web_sys::Event)>);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn apply_theme(doc: &Document, theme: Theme) {
    if let Some(root) = doc.document_element() {
        let _ = root.set_attribute("data-theme", theme.as_attr());
    }
}

pub fn start_hub(config_json: Option<String>) -> Result<(), JsValue> {
    if HUB.with(|cell| cell.borrow().is_some()) {
        warn!("start_hub called twice; ignoring");
        return Ok(());
    }
    let config = match config_json.as_deref() {
        Some(raw) if !raw.trim().is_empty() => {
            HubConfig::from_json(raw).map_err(|e| JsValue::from_str(&e.to_string()))?
        }
        _ => HubConfig::default(),
    };
    crate::logging::init(&config.log_level);

    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let (Some(overlay), Some(start_btn)) = (
        doc.get_element_by_id("start-overlay"),
        doc.get_element_by_id("start-btn"),
    ) else {
        warn!("start overlay or button not found");
        return Ok(());
    };
    let overlay: HtmlElement = overlay.dyn_into()?;

    let surface = match doc.get_element_by_id("visualizer") {
        Some(el) => match el.dyn_into::<HtmlCanvasElement>() {
            Ok(canvas) => CanvasSurface::new(canvas).ok(),
            Err(_) => None,
        },
        None => None,
    };

    let list = doc.query_selector_all(".buttons .btn")?;
    let mut buttons = Vec::with_capacity(list.length() as usize);
    for i in 0..list.length() {
        if let Some(el) = list.item(i).and_then(|n| n.dyn_into::<HtmlElement>().ok()) {
            buttons.push(el);
        }
    }
    let logo = doc
        .query_selector(".logo img")?
        .and_then(|e| e.dyn_into::<HtmlElement>().ok());
    let glow = doc
        .query_selector(".bg-glow")?
        .and_then(|e| e.dyn_into::<HtmlElement>().ok());
    let music = doc
        .get_element_by_id("bg-music")
        .and_then(|e| e.dyn_into::<HtmlAudioElement>().ok());
    if let Some(m) = &music {
        m.set_loop(true);
    }

    let prefs = Preferences::load(LocalStorage, config.audio.default_volume);
    apply_theme(&doc, prefs.theme());
    if let Some(input) = doc
        .get_element_by_id("volume")
        .and_then(|e| e.dyn_into::<HtmlInputElement>().ok())
    {
        input.set_value(&format!("{:.2}", prefs.volume()));
    }

    let reduced_motion = win
        .match_media("(prefers-reduced-motion: reduce)")
        .ok()
        .flatten()
        .map(|m| m.matches())
        .unwrap_or(false);

    let mut visualizer = AudioVisualizerService::new(WebAudioGraph::default(), config.visualizer.clone());
    visualizer.renderer_mut().set_reduced_motion(reduced_motion);

    let social: Vec<bool> = buttons
        .iter()
        .map(|b| b.get_attribute("data-social").as_deref() == Some("true"))
        .collect();
    let button_els = buttons.clone();
    // touch screens get no tilt; the ripple still plays
    let touch = win.navigator().max_touch_points() > 0;
    let tilt_max_deg = config.visualizer.tilt_max_deg;

    let hub = Hub {
        progress: Progression::load(LocalStorage, config.progression.clone()),
        ledger: RedeemLedger::load(LocalStorage),
        prefs,
        visualizer,
        surface,
        targets: DomTargets::new(buttons, logo, glow),
        hud: HudElements::find(&doc),
        overlay,
        redeem_msg: doc.get_element_by_id("redeem-msg"),
        reduced_motion,
        music,
        music_playing: false,
        retry_playback: false,
        fade: None,
        started: false,
        config,
    };
    hub.render_hud();
    HUB.with(|cell| cell.replace(Some(hub)));

    listen(&start_btn, "click", |_| {
        with_hub(|h| h.start(now_ms()));
    })?;

    listen(&doc, "keydown", |evt| {
        let Some(key) = evt.dyn_ref::<KeyboardEvent>().map(|k| k.key()) else {
            return;
        };
        if key == "Enter" || key == " " {
            with_hub(|h| {
                if !h.started {
                    h.start(now_ms());
                }
            });
        }
    })?;

    for (index, button) in button_els.iter().enumerate() {
        let is_social = social[index];
        let el = button.clone();
        listen(button, "click", move |evt| {
            let animate = with_hub(|h| {
                h.on_button(is_social);
                !h.reduced_motion
            });
            if animate == Some(true) {
                if let Some(m) = evt.dyn_ref::<MouseEvent>() {
                    if let Err(e) = dom::spawn_ripple(&el, f64::from(m.client_x()), f64::from(m.client_y())) {
                        warn!("ripple: {e:?}");
                    }
                }
            }
        })?;
        listen(button, "pointerdown", move |_| {
            with_hub(|h| h.targets.press(index));
        })?;
        if !touch && !reduced_motion {
            let el = button.clone();
            listen(button, "pointermove", move |evt| {
                let Some(p) = evt.dyn_ref::<PointerEvent>() else {
                    return;
                };
                if p.pointer_type() == "touch" {
                    return;
                }
                let rect = el.get_bounding_client_rect();
                let tilt = Tilt::from_pointer(
                    f64::from(p.client_x()) - rect.left(),
                    f64::from(p.client_y()) - rect.top(),
                    rect.width(),
                    rect.height(),
                    tilt_max_deg,
                );
                with_hub(|h| h.targets.set_tilt(index, tilt));
            })?;
        }
        listen(button, "pointerleave", move |_| {
            with_hub(|h| {
                h.targets.release(index);
                h.targets.set_tilt(index, Tilt::default());
            });
        })?;
        for ev in ["pointerup", "pointercancel"] {
            listen(button, ev, move |_| {
                with_hub(|h| h.targets.release(index));
            })?;
        }
    }

    wire_redeem(&doc)?;
    wire_preferences(&doc)?;

    let doc_vis = doc.clone();
    listen(&doc, "visibilitychange", move |_| {
        let hidden = doc_vis.hidden();
        with_hub(|h| h.on_visibility(hidden, now_ms()));
    })?;

    listen(&win, "resize", |_| {
        with_hub(|h| {
            if let Some(surface) = &mut h.surface {
                surface.fit_to_layout();
            }
        });
    })?;

    info!("hub ready");
    Ok(())
}

fn wire_redeem(doc: &Document) -> Result<(), JsValue> {
    let Some(input) = doc
        .get_element_by_id("redeem-input")
        .and_then(|e| e.dyn_into::<HtmlInputElement>().ok())
    else {
        return Ok(());
    };

    let submit: Rc<dyn Fn()> = {
        let input = input.clone();
        Rc::new(move || {
            let code = input.value();
            if code.trim().is_empty() {
                return;
            }
            if let Some((_, true)) = with_hub(|h| h.on_redeem(&code)) {
                input.set_value("");
            }
        })
    };

    if let Some(btn) = doc.get_element_by_id("redeem-btn") {
        let submit = submit.clone();
        listen(&btn, "click", move |_| submit())?;
    }
    listen(&input, "keydown", move |evt| {
        if evt.dyn_ref::<KeyboardEvent>().map(|k| k.key()).as_deref() == Some("Enter") {
            // keep the document handler from treating this Enter as "start"
            evt.stop_propagation();
            submit();
        }
    })
}

fn wire_preferences(doc: &Document) -> Result<(), JsValue> {
    if let Some(input) = doc
        .get_element_by_id("volume")
        .and_then(|e| e.dyn_into::<HtmlInputElement>().ok())
    {
        let reader = input.clone();
        listen(&input, "input", move |_| {
            if let Ok(v) = reader.value().trim().parse::<f64>() {
                with_hub(|h| h.on_volume(v));
            }
        })?;
    }
    if let Some(btn) = doc.get_element_by_id("theme-toggle") {
        let doc = doc.clone();
        listen(&btn, "click", move |_| {
            if let Some(theme) = with_hub(|h| h.prefs.toggle_theme()) {
                apply_theme(&doc, theme);
            }
        })?;
    }
    Ok(())
}

impl Hub {
    fn render_hud(&self) {
        self.hud.render(&self.progress.hud());
    }

    fn start(&mut self, now: f64) {
        if self.started {
            return;
        }
        self.started = true;
        info!("start");

        let _ = self.overlay.class_list().add_1("hidden");
        let overlay = self.overlay.clone();
        let hide = Closure::once_into_js(move || {
            let _ = overlay.style().set_property("display", "none");
        });
        if let Some(w) = window() {
            let _ = w.set_timeout_with_callback_and_timeout_and_arguments_0(
                hide.unchecked_ref(),
                OVERLAY_HIDE_MS,
            );
        }

        self.visualizer.renderer_mut().burst(now);
        self.play_music(now);
        if let Some(music) = &self.music {
            // failure already logged by the bridge; page carries on dark
            let _ = self.visualizer.connect(music);
            self.visualizer.bridge().graph().resume();
        }
        if let Some(surface) = &mut self.surface {
            surface.fit_to_layout();
        }

        start_frame_loop();
        start_idle_timer(self.config.progression.idle_interval_ms);
    }

    fn play_music(&mut self, now: f64) {
        let Some(music) = self.music.clone() else {
            return;
        };
        self.retry_playback = false;
        let start_volume = if self.music_playing { music.volume() } else { 0.0 };
        music.set_volume(start_volume);
        self.fade = Some(VolumeFade::new(
            start_volume,
            self.prefs.volume(),
            now,
            self.config.audio.fade_ms,
        ));
        match music.play() {
            Ok(promise) => wasm_bindgen_futures::spawn_local(async move {
                let result = JsFuture::from(promise).await;
                with_hub(|h| match result {
                    Ok(_) => h.music_playing = true,
                    Err(e) => h.playback_blocked(AudioError::PlaybackBlocked(format!("{e:?}"))),
                });
            }),
            Err(e) => self.playback_blocked(AudioError::PlaybackBlocked(format!("{e:?}"))),
        }
    }

    fn playback_blocked(&mut self, err: AudioError) {
        warn!("{err}; retrying on next interaction");
        self.music_playing = false;
        self.retry_playback = true;
    }

    fn on_button(&mut self, social: bool) {
        self.progress.click(social);
        self.render_hud();
        if self.started && self.retry_playback {
            self.play_music(now_ms());
            self.visualizer.bridge().graph().resume();
        }
    }

    /// The message shown to the user, and whether the code paid out.
    fn on_redeem(&mut self, code: &str) -> (String, bool) {
        let (msg, ok) = match self.ledger.redeem(code, &mut self.progress) {
            Ok(success) => (success.description, true),
            Err(e) => (e.to_string(), false),
        };
        if let Some(el) = &self.redeem_msg {
            el.set_text_content(Some(&msg));
        }
        self.render_hud();
        (msg, ok)
    }

    fn on_volume(&mut self, volume: f64) {
        self.prefs.set_volume(volume);
        self.fade = None;
        if let Some(m) = &self.music {
            m.set_volume(self.prefs.volume());
        }
    }

    fn on_visibility(&mut self, hidden: bool, now: f64) {
        let Some(music) = &self.music else {
            return;
        };
        let ms = self.config.audio.visibility_fade_ms;
        if hidden {
            self.fade = Some(VolumeFade::new(music.volume(), 0.0, now, ms));
        } else if self.music_playing {
            self.fade = Some(VolumeFade::new(music.volume(), self.prefs.volume(), now, ms));
        }
    }

    fn on_idle_tick(&mut self) {
        self.progress.idle_tick();
        self.render_hud();
    }

    fn frame(&mut self, ts: f64) {
        if let (Some(fade), Some(music)) = (self.fade, &self.music) {
            music.set_volume(fade.value_at(ts));
            if fade.is_done(ts) {
                self.fade = None;
            }
        }
        let rendered = self
            .visualizer
            .frame(ts, self.surface.as_mut(), &mut self.targets)
            .is_some();
        if rendered && !self.reduced_motion {
            self.targets.tilt_written();
        } else {
            self.targets.flush_tilt();
        }
    }
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn start_frame_loop() {
    let f: FrameCallback = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        with_hub(|h| h.frame(ts));
        if let (Some(w), Some(cb)) = (window(), f.borrow().as_ref()) {
            let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut(f64)>));
    if let (Some(w), Some(cb)) = (window(), g.borrow().as_ref()) {
        let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}

fn start_idle_timer(interval_ms: u32) {
    let Some(w) = window() else {
        return;
    };
    let tick = Closure::wrap(Box::new(move || {
        with_hub(|h| h.on_idle_tick());
    }) as Box<dyn FnMut()>);
    let ms = interval_ms.clamp(1, i32::MAX as u32) as i32;
    if let Err(e) = w.set_interval_with_callback_and_timeout_and_arguments_0(tick.as_ref().unchecked_ref(), ms) {
        warn!("idle timer not started: {e:?}");
    }
    tick.forget();
}

/// Button activation coming from script instead of a wired `.btn`.
pub fn button_activated(social: bool) {
    with_hub(|h| h.on_button(social));
}

/// Redeem a code; returns the message shown to the user.
pub fn redeem(code: &str) -> String {
    with_hub(|h| h.on_redeem(code).0).unwrap_or_else(|| "Hub not started".to_string())
}

pub fn grant_experience(amount: f64) -> u32 {
    with_hub(|h| {
        let gained = h.progress.grant(amount);
        h.render_hud();
        gained
    })
    .unwrap_or(0)
}
