// Browser tests for the DOM bindings. Run with `wasm-pack test --headless --firefox`.
#![cfg(target_arch = "wasm32")]

use rose_garden::audio::{PlayIndicator, PlayState, ToggleIcon};
use rose_garden::{FocusTarget, MESSAGES, classify_target, start_page};
use rose_garden::hearts::{HEART_CLASS, Heart, HeartElement};
use rose_garden::messages::{DomMessageDisplay, FADE_OUT_CLASS, MessageDisplay, MessageRotator};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{Document, Element, EventTarget, HtmlElement, KeyboardEvent, KeyboardEventInit};

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> Document {
    web_sys::window().unwrap().document().unwrap()
}

fn attached(tag: &str) -> Element {
    let doc = document();
    let el = doc.create_element(tag).unwrap();
    doc.body().unwrap().append_child(&el).unwrap();
    el
}

#[wasm_bindgen_test]
fn heart_detach_is_idempotent() {
    let doc = document();
    let container = attached("div");
    let heart = Heart { left_px: 12.0, size_px: 20.0, duration_s: 6.0, delay_s: 1.5 };
    let el = HeartElement::insert(&doc, &container, &heart).unwrap();
    assert_eq!(container.child_element_count(), 1);
    assert!(el.is_attached());

    let node = container.first_element_child().unwrap();
    assert_eq!(node.class_name(), HEART_CLASS);
    let style = node.dyn_into::<HtmlElement>().unwrap().style();
    assert_eq!(style.get_property_value("font-size").unwrap(), "20px");
    assert_eq!(style.get_property_value("animation-duration").unwrap(), "6s");

    assert!(el.detach());
    assert!(!el.detach());
    assert_eq!(container.child_element_count(), 0);
}

#[wasm_bindgen_test]
fn message_tick_fades_then_swaps() {
    let el = attached("p");
    let display = DomMessageDisplay::try_from(el.clone()).unwrap();
    let mut rotator = MessageRotator::new(&["A", "B", "C"]).unwrap();
    display.set_text(rotator.current());

    let swap = rotator.tick(&display);
    assert!(el.class_list().contains(FADE_OUT_CLASS));
    assert_eq!(el.text_content().as_deref(), Some("A"));

    swap.apply(&display);
    assert!(!el.class_list().contains(FADE_OUT_CLASS));
    assert_eq!(el.text_content().as_deref(), Some("B"));
}

#[wasm_bindgen_test]
fn toggle_icon_tracks_state() {
    let icon = attached("i");
    let indicator = ToggleIcon::new(icon.clone());
    indicator.show(PlayState::Playing);
    assert_eq!(icon.class_name(), "fas fa-pause");
    assert_eq!(icon.get_attribute("aria-label").as_deref(), Some("Pause Music"));
    indicator.show(PlayState::Paused);
    assert_eq!(icon.class_name(), "fas fa-play");
    assert_eq!(icon.get_attribute("aria-label").as_deref(), Some("Play Music"));
}

fn space_down(target: &EventTarget) -> KeyboardEvent {
    let init = KeyboardEventInit::new();
    init.set_code("Space");
    init.set_key(" ");
    init.set_bubbles(true);
    init.set_cancelable(true);
    let evt = KeyboardEvent::new_with_keyboard_event_init_dict("keydown", &init).unwrap();
    target.dispatch_event(&evt).unwrap();
    evt
}

#[wasm_bindgen_test]
fn focus_targets_are_classified() {
    let doc = document();
    let body: EventTarget = doc.body().unwrap().into();
    assert_eq!(classify_target(Some(body)), FocusTarget::Body);
    for tag in ["input", "textarea"] {
        let el: EventTarget = attached(tag).into();
        assert_eq!(classify_target(Some(el)), FocusTarget::TextField, "{tag}");
    }
    let editable = attached("div");
    editable.set_attribute("contenteditable", "true").unwrap();
    assert_eq!(classify_target(Some(editable.into())), FocusTarget::TextField);
    let button: EventTarget = attached("button").into();
    assert_eq!(classify_target(Some(button)), FocusTarget::Other);
    assert_eq!(classify_target(None), FocusTarget::Other);
}

#[wasm_bindgen_test]
fn start_page_shows_first_message_then_fades_and_keeps_timers() {
    let doc = document();
    let toggle = attached("button");
    toggle.set_id("musicToggle");
    toggle.append_child(&doc.create_element("i").unwrap()).unwrap();
    let message = attached("p");
    message.set_id("loveMessage");
    attached("div").set_id("heartsContainer");

    let handle = start_page().unwrap();

    // Message 0 is written, then the immediate tick starts fading it out.
    assert_eq!(message.text_content().as_deref(), Some(MESSAGES[0]));
    assert!(message.class_list().contains(FADE_OUT_CLASS));

    // Space at the body or a text field is left to the browser.
    assert!(!space_down(&doc.body().unwrap()).default_prevented());
    assert!(!space_down(&attached("input")).default_prevented());
    // Anywhere else it is taken as the music shortcut.
    assert!(space_down(&toggle).default_prevented());
    // Nothing is loaded yet, so the shortcut cannot start playback.
    assert!(!handle.is_playing());

    // Letting go of the handle leaves both routines running.
    let (messages, hearts) = handle.intervals();
    drop(handle);
    assert!(messages.is_running());
    assert!(hearts.is_running());

    messages.stop();
    hearts.stop();
    assert!(!messages.is_running());
    assert!(!hearts.is_running());
}
