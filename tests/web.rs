// Browser tests, run with `wasm-pack test --headless --chrome`.
#![cfg(target_arch = "wasm32")]

use link_hub::{KeyValueStore, LocalStorage};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn local_storage_round_trip() {
    let s = LocalStorage;
    s.set("linkhub.test", "42").unwrap();
    assert_eq!(s.get("linkhub.test").unwrap().as_deref(), Some("42"));
    s.remove("linkhub.test").unwrap();
    assert_eq!(s.get("linkhub.test").unwrap(), None);
}

#[wasm_bindgen_test]
fn progression_persists_to_local_storage() {
    use link_hub::config::ProgressionConfig;
    use link_hub::Progression;

    let s = LocalStorage;
    s.remove("linkhub.xp").unwrap();
    s.remove("linkhub.level").unwrap();
    let mut p = Progression::load(s, ProgressionConfig::default());
    p.add_experience(250);
    assert_eq!(s.get("linkhub.level").unwrap().as_deref(), Some("3"));
    assert_eq!(s.get("linkhub.xp").unwrap().as_deref(), Some("30"));
}

fn attached_canvas(css: &str) -> web_sys::HtmlCanvasElement {
    use wasm_bindgen::JsCast;

    let doc = web_sys::window().unwrap().document().unwrap();
    let canvas: web_sys::HtmlCanvasElement = doc.create_element("canvas").unwrap().dyn_into().unwrap();
    canvas.set_attribute("style", css).unwrap();
    doc.body().unwrap().append_child(&canvas).unwrap();
    canvas
}

#[wasm_bindgen_test]
fn canvas_size_follows_layout_after_refit() {
    use link_hub::dom::CanvasSurface;
    use link_hub::renderer::Surface;

    let canvas = attached_canvas("display:block;width:40px;height:20px");
    let mut surface = CanvasSurface::new(canvas.clone()).unwrap();
    surface.fit_to_layout();
    assert_eq!(surface.size(), (40.0, 20.0));

    canvas.set_attribute("style", "display:block;width:90px;height:30px").unwrap();
    // cached until the next refit
    assert_eq!(surface.size(), (40.0, 20.0));
    surface.fit_to_layout();
    assert_eq!(surface.size(), (90.0, 30.0));
    assert_eq!((canvas.width(), canvas.height()), (90, 30));
    canvas.remove();
}

#[wasm_bindgen_test]
fn click_ripple_is_added_to_the_button() {
    use wasm_bindgen::JsCast;

    let doc = web_sys::window().unwrap().document().unwrap();
    let button: web_sys::HtmlElement = doc.create_element("a").unwrap().dyn_into().unwrap();
    button.set_attribute("style", "display:block;position:absolute;left:0;top:0;width:100px;height:40px").unwrap();
    doc.body().unwrap().append_child(&button).unwrap();

    link_hub::dom::spawn_ripple(&button, 10.0, 20.0).unwrap();
    let ripple: web_sys::HtmlElement = button.query_selector(".ripple").unwrap().unwrap().dyn_into().unwrap();
    assert_eq!(ripple.style().get_property_value("width").unwrap(), "100px");
    assert_eq!(ripple.style().get_property_value("left").unwrap(), "-40px");
    button.remove();
}
