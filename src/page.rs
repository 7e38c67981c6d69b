//! Page wiring: finds the DOM hooks, starts the three routines and binds input.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, ErrorEvent, EventTarget, HtmlElement, HtmlInputElement,
    HtmlTextAreaElement, KeyboardEvent, MouseEvent, window,
};

use crate::MESSAGES;
use crate::PageError;
use crate::audio::{
    AudioAction, AudioController, AudioEvent, AudioTiming, DomAudioSink, Generation,
    RecoveryTrigger, ToggleIcon, describe_js, media_error_message,
};
use crate::config::PageConfig;
use crate::hearts::{Entropy, HeartElement, HeartSpawner};
use crate::messages::{DomMessageDisplay, MessageDisplay, MessageRotator};
use crate::timer::{self, Interval};

type Audio = AudioController<DomAudioSink, ToggleIcon>;
type SharedAudio = Rc<RefCell<Audio>>;

/// What currently holds keyboard focus, as far as the space shortcut cares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusTarget {
    Body,
    TextField,
    Other,
}

/// Whether a keydown should toggle the music instead of doing its default.
pub fn is_space_toggle(code: &str, target: FocusTarget) -> bool {
    code == "Space" && target == FocusTarget::Other
}

/// Classify a keydown target: `<input>`, `<textarea>` and contenteditable are text fields.
pub fn classify_target(target: Option<EventTarget>) -> FocusTarget {
    let Some(target) = target else {
        return FocusTarget::Other;
    };
    if target.dyn_ref::<HtmlInputElement>().is_some()
        || target.dyn_ref::<HtmlTextAreaElement>().is_some()
    {
        return FocusTarget::TextField;
    }
    match target.dyn_ref::<HtmlElement>() {
        Some(el) if el.tag_name().eq_ignore_ascii_case("body") => FocusTarget::Body,
        Some(el) if el.is_content_editable() => FocusTarget::TextField,
        _ => FocusTarget::Other,
    }
}

/// Running page. Rotation and hearts run until `stop` is called; dropping or
/// collecting the handle leaves them running. The music session is left alone.
#[wasm_bindgen]
pub struct PageHandle {
    messages: Interval,
    hearts: Interval,
    audio: SharedAudio,
}

#[wasm_bindgen]
impl PageHandle {
    pub fn stop(&self) {
        self.messages.stop();
        self.hearts.stop();
        log::info!("page timers stopped");
    }

    pub fn is_running(&self) -> bool {
        self.messages.is_running() && self.hearts.is_running()
    }

    pub fn toggle_music(&self) {
        self.audio.borrow_mut().toggle();
    }

    pub fn is_playing(&self) -> bool {
        self.audio.borrow().is_playing()
    }
}

impl PageHandle {
    /// The message and heart intervals, in that order.
    pub fn intervals(&self) -> (Interval, Interval) {
        (self.messages.clone(), self.hearts.clone())
    }
}

fn element(doc: &Document, id: &str) -> Result<Element, PageError> {
    doc.get_element_by_id(id)
        .ok_or_else(|| PageError::MissingElement(id.to_string()))
}

/// Equivalent of the page's `DOMContentLoaded` handler.
pub fn start(cfg: PageConfig) -> Result<PageHandle, PageError> {
    cfg.validate()?;
    let cfg = Rc::new(cfg);
    let win = window().ok_or(PageError::NoWindow)?;
    let doc = win.document().ok_or(PageError::NoDocument)?;

    let toggle = element(&doc, &cfg.toggle_id)?;
    let icon = toggle
        .query_selector("i")?
        .ok_or_else(|| PageError::MissingElement(format!("{} i", cfg.toggle_id)))?;
    let display = Rc::new(DomMessageDisplay::try_from(element(&doc, &cfg.message_id)?)?);
    let container = element(&doc, &cfg.hearts_id)?;

    // Audio
    let audio: SharedAudio = Rc::new(RefCell::new(AudioController::new(
        ToggleIcon::new(icon),
        AudioTiming::from(&*cfg),
    )));
    init_audio(&audio, &cfg);

    // Messages: show the first one, tick once now, then on the period.
    let rotator = Rc::new(RefCell::new(MessageRotator::new(MESSAGES)?));
    display.set_text(rotator.borrow().current());
    rotate_message(&rotator, &display, cfg.fade_ms);
    let messages = {
        let (rotator, display, fade_ms) = (rotator.clone(), display.clone(), cfg.fade_ms);
        Interval::start(cfg.rotate_period_ms, move || {
            rotate_message(&rotator, &display, fade_ms)
        })?
    };

    // Hearts
    let spawner = Rc::new(RefCell::new(HeartSpawner::new(Entropy, &cfg)));
    let hearts = {
        let (doc, container) = (doc.clone(), container.clone());
        Interval::start(cfg.heart_period_ms, move || {
            spawn_batch(&spawner, &doc, &container)
        })?
    };

    // Toggle button
    {
        let audio = audio.clone();
        listen(&toggle, "click", move |_evt: MouseEvent| audio.borrow_mut().toggle())?;
    }

    // Engines without `scroll-behavior` drop the declaration.
    if let Some(root) = doc.document_element().and_then(|e| e.dyn_into::<HtmlElement>().ok()) {
        root.style().set_property("scroll-behavior", "smooth").ok();
    }

    // Visibility changes are observed but intentionally leave timers running.
    {
        let doc_vis = doc.clone();
        listen(&doc, "visibilitychange", move |_evt: web_sys::Event| {
            log::debug!("page hidden: {}", doc_vis.hidden());
        })?;
    }

    // Space toggles music unless typing or nothing is focused.
    {
        let audio = audio.clone();
        listen(&doc, "keydown", move |evt: KeyboardEvent| {
            if is_space_toggle(&evt.code(), classify_target(evt.target())) {
                evt.prevent_default();
                audio.borrow_mut().toggle();
            }
        })?;
    }

    // Audio recovery on script errors (capture phase) and when the network returns.
    {
        let (audio, cfg) = (audio.clone(), cfg.clone());
        let closure = Closure::wrap(Box::new(move |evt: web_sys::Event| {
            let Some(err) = evt.dyn_ref::<ErrorEvent>() else {
                return;
            };
            let message = err.message();
            let recovery = audio.borrow().recovery_for(RecoveryTrigger::ScriptError(&message));
            if let Some(r) = recovery {
                log::warn!("audio error ({message}), attempting recovery");
                let (audio, cfg) = (audio.clone(), cfg.clone());
                timer::delay_or_log(r.delay_ms, move || init_audio(&audio, &cfg));
            }
        }) as Box<dyn FnMut(_)>);
        win.add_event_listener_with_callback_and_bool("error", closure.as_ref().unchecked_ref(), true)?;
        closure.forget();
    }
    {
        let (audio, cfg) = (audio.clone(), cfg.clone());
        listen(&win, "online", move |_evt: web_sys::Event| {
            log::info!("connection restored");
            let recovery = audio.borrow().recovery_for(RecoveryTrigger::Online);
            if let Some(r) = recovery {
                log::info!("reloading audio");
                let (audio, cfg) = (audio.clone(), cfg.clone());
                timer::delay_or_log(r.delay_ms, move || init_audio(&audio, &cfg));
            }
        })?;
    }

    log::info!("page started with {} messages", MESSAGES.len());
    Ok(PageHandle { messages, hearts, audio })
}

/// Page-lifetime listener; the closure is leaked on purpose.
fn listen<E, F>(target: &EventTarget, kind: &str, f: F) -> Result<(), PageError>
where
    E: wasm_bindgen::convert::FromWasmAbi + 'static,
    F: FnMut(E) + 'static,
{
    let closure = Closure::wrap(Box::new(f) as Box<dyn FnMut(E)>);
    target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

/// Build (or rebuild) the audio session and hook the element's callbacks.
fn init_audio(audio: &SharedAudio, cfg: &PageConfig) {
    let generation = audio.borrow().generation().wrapping_add(1);
    let weak = Rc::downgrade(audio);

    let on_reject: Rc<dyn Fn(String)> = {
        let weak = weak.clone();
        Rc::new(move |msg| dispatch(&weak, generation, AudioEvent::PlayFailed(msg)))
    };
    let mut sink = match DomAudioSink::new(cfg, on_reject) {
        Ok(sink) => sink,
        Err(e) => {
            log::error!("error initializing audio: {}", describe_js(&e));
            return;
        }
    };

    let loaded = {
        let weak = weak.clone();
        move |_evt: web_sys::Event| dispatch(&weak, generation, AudioEvent::Loaded)
    };
    let failed = {
        let weak = weak.clone();
        let el = sink.element().clone();
        move |_evt: web_sys::Event| {
            dispatch(&weak, generation, AudioEvent::LoadFailed(media_error_message(&el)))
        }
    };
    let hooked = sink
        .listen("canplaythrough", loaded)
        .and_then(|()| sink.listen("error", failed));
    if let Err(e) = hooked {
        log::error!("error wiring audio callbacks: {}", describe_js(&e));
        return;
    }

    let assigned = audio.borrow_mut().initialize(sink);
    debug_assert_eq!(assigned, generation);
    if let Some(sink) = audio.borrow().sink() {
        sink.load();
    }
}

fn dispatch(audio: &Weak<RefCell<Audio>>, generation: Generation, event: AudioEvent) {
    let Some(audio) = audio.upgrade() else {
        return;
    };
    let actions = audio.borrow_mut().handle(generation, event);
    for action in actions {
        match action {
            AudioAction::SchedulePlay { delay_ms } => {
                let audio = audio.clone();
                timer::delay_or_log(delay_ms, move || audio.borrow_mut().play());
            }
        }
    }
}

fn rotate_message(rotator: &RefCell<MessageRotator>, display: &Rc<DomMessageDisplay>, fade_ms: i32) {
    let swap = rotator.borrow_mut().tick(&**display);
    let display = display.clone();
    timer::delay_or_log(fade_ms, move || swap.apply(&*display));
}

fn spawn_batch(spawner: &Rc<RefCell<HeartSpawner<Entropy>>>, doc: &Document, container: &Element) {
    let plan = spawner.borrow_mut().plan_batch();
    for stagger in plan.delays() {
        let (spawner, doc, container) = (spawner.clone(), doc.clone(), container.clone());
        timer::delay_or_log(stagger, move || {
            let width = window()
                .and_then(|w| w.inner_width().ok())
                .and_then(|w| w.as_f64())
                .unwrap_or(0.0);
            let heart = spawner.borrow_mut().spawn(width);
            match HeartElement::insert(&doc, &container, &heart) {
                Ok(el) => timer::delay_or_log(heart.lifetime_ms(), move || {
                    el.detach();
                }),
                Err(e) => log::warn!("could not add heart: {e}"),
            }
        });
    }
}
