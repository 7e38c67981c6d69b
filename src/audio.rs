//! Background music as an explicit state machine.
//!
//! ```text
//! Uninitialized --initialize--> Loading --Loaded--> Paused <--toggle--> Playing
//!        ^                         |                   ^                   |
//!        +-------LoadFailed--------+                   +----PlayFailed-----+
//! ```
//!
//! The controller never touches the browser directly. Playback goes through an
//! [`AudioSink`], the play/pause button through a [`PlayIndicator`], and timed
//! follow-ups come back to the caller as [`AudioAction`]s so the page decides
//! how to schedule them.

use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{DomException, Element, HtmlAudioElement};

use crate::config::PageConfig;
use crate::error::AudioFault;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioState {
    Uninitialized,
    Loading,
    Paused,
    Playing,
}

/// What the toggle control shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayState {
    Playing,
    Paused,
}

impl PlayState {
    pub fn icon_class(self) -> &'static str {
        match self {
            PlayState::Playing => "fas fa-pause",
            PlayState::Paused => "fas fa-play",
        }
    }

    pub fn aria_label(self) -> &'static str {
        match self {
            PlayState::Playing => "Pause Music",
            PlayState::Paused => "Play Music",
        }
    }
}

pub trait AudioSink {
    fn play(&mut self) -> Result<(), AudioFault>;
    fn pause(&mut self);
}

pub trait PlayIndicator {
    fn show(&self, state: PlayState);
}

/// Callbacks reported by the playable resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AudioEvent {
    Loaded,
    LoadFailed(String),
    PlayFailed(String),
}

/// Follow-up work for the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioAction {
    /// Call [`AudioController::play`] after the delay.
    SchedulePlay { delay_ms: i32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecoveryTrigger<'a> {
    /// Uncaught window error carrying this message.
    ScriptError(&'a str),
    /// Network came back.
    Online,
}

/// Rebuild the audio session from scratch after `delay_ms`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Recovery {
    pub delay_ms: i32,
}

#[derive(Clone, Debug)]
pub struct AudioTiming {
    pub autoplay_delay_ms: i32,
    pub error_retry_delay_ms: i32,
    pub online_retry_delay_ms: i32,
    pub fault_markers: Vec<String>,
}

impl From<&PageConfig> for AudioTiming {
    fn from(cfg: &PageConfig) -> Self {
        Self {
            autoplay_delay_ms: cfg.autoplay_delay_ms,
            error_retry_delay_ms: cfg.error_retry_delay_ms,
            online_retry_delay_ms: cfg.online_retry_delay_ms,
            fault_markers: cfg.fault_markers.iter().map(|m| m.to_lowercase()).collect(),
        }
    }
}

/// Identifies one `initialize` call; events from older sinks are dropped.
pub type Generation = u32;

pub struct AudioController<S: AudioSink, I: PlayIndicator> {
    sink: Option<S>,
    indicator: I,
    state: AudioState,
    generation: Generation,
    retry_on_load: bool,
    timing: AudioTiming,
}

impl<S: AudioSink, I: PlayIndicator> AudioController<S, I> {
    pub fn new(indicator: I, timing: AudioTiming) -> Self {
        Self {
            sink: None,
            indicator,
            state: AudioState::Uninitialized,
            generation: 0,
            retry_on_load: false,
            timing,
        }
    }

    pub fn state(&self) -> AudioState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == AudioState::Playing
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    pub fn sink(&self) -> Option<&S> {
        self.sink.as_ref()
    }

    /// Install a freshly built sink. Any previous one is silenced and dropped;
    /// the session restarts in `Loading` and not playing.
    pub fn initialize(&mut self, sink: S) -> Generation {
        let was_playing = self.is_playing();
        if let Some(mut old) = self.sink.replace(sink) {
            if was_playing {
                old.pause();
            }
        }
        self.state = AudioState::Loading;
        self.retry_on_load = false;
        self.generation = self.generation.wrapping_add(1);
        if was_playing {
            self.indicator.show(PlayState::Paused);
        }
        log::info!("audio session {} loading", self.generation);
        self.generation
    }

    /// Feed a resource callback. Events tagged with a stale generation are ignored.
    pub fn handle(&mut self, generation: Generation, event: AudioEvent) -> Vec<AudioAction> {
        if generation != self.generation || self.sink.is_none() {
            log::debug!("dropping {event:?} from stale audio session {generation}");
            return Vec::new();
        }
        match event {
            AudioEvent::Loaded => {
                let first_load = self.state == AudioState::Loading;
                if first_load {
                    log::info!("music loaded");
                    self.state = AudioState::Paused;
                }
                if self.retry_on_load {
                    self.retry_on_load = false;
                    self.play();
                }
                if first_load {
                    vec![AudioAction::SchedulePlay { delay_ms: self.timing.autoplay_delay_ms }]
                } else {
                    Vec::new()
                }
            }
            AudioEvent::LoadFailed(msg) => {
                log::error!("error loading music: {msg}");
                self.state = AudioState::Uninitialized;
                Vec::new()
            }
            AudioEvent::PlayFailed(msg) => {
                self.play_failed(&msg);
                Vec::new()
            }
        }
    }

    /// Start playback. No-op without a loaded sink or when already playing.
    pub fn play(&mut self) {
        if self.state != AudioState::Paused {
            return;
        }
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        match sink.play() {
            Ok(()) => {
                self.state = AudioState::Playing;
                self.indicator.show(PlayState::Playing);
            }
            Err(fault) => self.play_failed(&fault.to_string()),
        }
    }

    pub fn pause(&mut self) {
        if !self.is_playing() {
            return;
        }
        if let Some(sink) = self.sink.as_mut() {
            sink.pause();
        }
        self.state = AudioState::Paused;
        self.indicator.show(PlayState::Paused);
    }

    pub fn toggle(&mut self) {
        if self.is_playing() { self.pause() } else { self.play() }
    }

    /// Decide whether a page-level event warrants rebuilding the session.
    pub fn recovery_for(&self, trigger: RecoveryTrigger<'_>) -> Option<Recovery> {
        match trigger {
            RecoveryTrigger::ScriptError(message) => {
                let message = message.to_lowercase();
                self.timing
                    .fault_markers
                    .iter()
                    .any(|m| message.contains(m.as_str()))
                    .then_some(Recovery { delay_ms: self.timing.error_retry_delay_ms })
            }
            RecoveryTrigger::Online => self
                .has_sink()
                .then_some(Recovery { delay_ms: self.timing.online_retry_delay_ms }),
        }
    }

    fn play_failed(&mut self, msg: &str) {
        log::error!("error playing music: {msg}");
        self.retry_on_load = true;
        if self.is_playing() {
            self.state = AudioState::Paused;
            self.indicator.show(PlayState::Paused);
        }
    }
}

// --- Browser bindings -------------------------------------------------------

type Listener = Closure<dyn FnMut(web_sys::Event)>;

/// `<audio>` element standing in for the track.
pub struct DomAudioSink {
    el: HtmlAudioElement,
    on_reject: Rc<dyn Fn(String)>,
    listeners: Vec<(&'static str, Listener)>,
}

impl DomAudioSink {
    /// Build the element; fetching starts with [`DomAudioSink::load`]. `on_reject`
    /// receives async play rejections (autoplay policy, decode errors).
    pub fn new(cfg: &PageConfig, on_reject: Rc<dyn Fn(String)>) -> Result<Self, JsValue> {
        let el = HtmlAudioElement::new_with_src(&cfg.track_url)?;
        el.set_volume(cfg.volume);
        el.set_loop(cfg.looping);
        el.set_preload("auto");
        Ok(Self { el, on_reject, listeners: Vec::new() })
    }

    /// Attach a media event listener that lives as long as the sink.
    pub fn listen<F>(&mut self, kind: &'static str, f: F) -> Result<(), JsValue>
    where
        F: FnMut(web_sys::Event) + 'static,
    {
        let cb: Listener = Closure::wrap(Box::new(f) as Box<dyn FnMut(web_sys::Event)>);
        self.el.add_event_listener_with_callback(kind, cb.as_ref().unchecked_ref())?;
        self.listeners.push((kind, cb));
        Ok(())
    }

    /// Kick off the fetch once listeners are in place.
    pub fn load(&self) {
        self.el.load();
    }

    pub fn element(&self) -> &HtmlAudioElement {
        &self.el
    }
}

impl Drop for DomAudioSink {
    fn drop(&mut self) {
        self.el.pause().ok();
        for (kind, cb) in self.listeners.drain(..) {
            self.el
                .remove_event_listener_with_callback(kind, cb.as_ref().unchecked_ref())
                .ok();
        }
    }
}

impl AudioSink for DomAudioSink {
    fn play(&mut self) -> Result<(), AudioFault> {
        let promise = self
            .el
            .play()
            .map_err(|e| AudioFault::Play(describe_js(&e)))?;
        let on_reject = self.on_reject.clone();
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = JsFuture::from(promise).await {
                let name = err.dyn_ref::<DomException>().map(|e| e.name());
                if !is_interrupted_play(name.as_deref()) {
                    on_reject(describe_js(&err));
                }
            }
        });
        Ok(())
    }

    fn pause(&mut self) {
        self.el.pause().ok();
    }
}

/// Icon inside `#musicToggle`.
pub struct ToggleIcon {
    icon: Element,
}

impl ToggleIcon {
    pub fn new(icon: Element) -> Self {
        Self { icon }
    }
}

impl PlayIndicator for ToggleIcon {
    fn show(&self, state: PlayState) {
        self.icon.set_class_name(state.icon_class());
        self.icon.set_attribute("aria-label", state.aria_label()).ok();
    }
}

/// Human-readable reason for the element's current `error`.
pub fn media_error_message(el: &HtmlAudioElement) -> String {
    match el.error() {
        Some(err) => format!("media error code {}", err.code()),
        None => "unknown media error".to_string(),
    }
}

/// A `play()` cut short by a later `pause()` or source change rejects with
/// `AbortError`; the controller already knows about that transition.
pub fn is_interrupted_play(exception_name: Option<&str>) -> bool {
    exception_name == Some("AbortError")
}

pub(crate) fn describe_js(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}
