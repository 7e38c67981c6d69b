//! Error types shared by the page glue and the audio state machine.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Failures while wiring the page. Everything after startup is best-effort.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("no window")]
    NoWindow,
    #[error("no document")]
    NoDocument,
    #[error("missing element #{0}")]
    MissingElement(String),
    #[error("message list is empty")]
    EmptyMessages,
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("js error: {0}")]
    Js(String),
}

impl From<JsValue> for PageError {
    fn from(value: JsValue) -> Self {
        PageError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

impl From<PageError> for JsValue {
    fn from(err: PageError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// Fault reported by an audio sink when playback cannot start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioFault {
    #[error("audio load failed: {0}")]
    Load(String),
    #[error("audio play failed: {0}")]
    Play(String),
}
