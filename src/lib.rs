//! Rose Garden core crate.
//!
//! A love-note page driven from WASM: a message that fades between a fixed set
//! of notes, a looping background track with a play/pause control, and a field
//! of floating hearts. The JS loader calls `start_page()` once the DOM is ready.
//! The timing and state logic lives in plain Rust types so it can be tested on
//! the host; the browser bindings sit next to them behind small traits.

use wasm_bindgen::prelude::*;

pub mod audio;
pub mod config;
mod error;
pub mod hearts;
pub mod messages;
mod page;
pub mod timer;

pub use config::PageConfig;
pub use error::{AudioFault, PageError};
pub use page::{FocusTarget, PageHandle, classify_target, is_space_toggle};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    // A second init (hot reload) keeps the first logger.
    console_log::init_with_level(log::Level::Info).ok();
}

// -----------------------------------------------------------------------------
// Notes shown by the message rotator, in display order.
// -----------------------------------------------------------------------------

pub const MESSAGES: &[&str] = &[
    "You're my favorite notification",
    "My heart does a little dance when I think of you",
    "You're the WiFi to my internet",
    "You make my soul sparkle",
    "I fall for you more every single day",
    "You're my favorite hello and hardest goodbye",
    "Life is better in rose-colored glasses... especially when I'm looking at you",
    "You're the cheese to my macaroni",
    "My heart is yours, Rose",
    "You're my favorite adventure",
    "I love you more than coffee... and that's saying something",
    "You make every day feel like Valentine's Day",
    "You're the melody in my La Vie en Rose",
    "My love for you grows like a wildflower",
    "You're my favorite dream come true",
    "You're sweeter than dessert",
    "I'm so lucky to have you, Rose",
    "You're my sunshine on cloudy days",
    "My world is better with you in it",
    "You're the rose in my garden of life",
];

// -----------------------------------------------------------------------------
// Entrypoints
// -----------------------------------------------------------------------------

#[wasm_bindgen]
pub fn start_page() -> Result<PageHandle, JsValue> {
    Ok(page::start(PageConfig::default())?)
}

/// Start with JSON overrides on top of the defaults, e.g. `{"volume": 0.5}`.
#[cfg(feature = "serde_json")]
#[wasm_bindgen]
pub fn start_page_with_config(json: &str) -> Result<PageHandle, JsValue> {
    Ok(page::start(PageConfig::from_json(json)?)?)
}
