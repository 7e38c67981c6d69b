//! `setTimeout` / `setInterval` wrappers.

use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::window;

use crate::PageError;

/// Run `f` once after `delay_ms`. The closure frees itself after it fires.
pub fn delay<F: FnOnce() + 'static>(delay_ms: i32, f: F) -> Result<i32, PageError> {
    let win = window().ok_or(PageError::NoWindow)?;
    let cb = Closure::once_into_js(f);
    Ok(win.set_timeout_with_callback_and_timeout_and_arguments_0(
        cb.unchecked_ref(),
        delay_ms,
    )?)
}

/// Like [`delay`] but only logs scheduling failures; for fire-and-forget callers.
pub fn delay_or_log<F: FnOnce() + 'static>(delay_ms: i32, f: F) {
    if let Err(e) = delay(delay_ms, f) {
        log::warn!("could not schedule timeout: {e}");
    }
}

/// A running `setInterval`. It keeps firing for the page lifetime unless
/// [`Interval::stop`] is called; dropping handles never clears it.
#[derive(Clone, Debug)]
pub struct Interval {
    id: Rc<Cell<Option<i32>>>,
}

impl Interval {
    pub fn start<F: FnMut() + 'static>(period_ms: i32, f: F) -> Result<Self, PageError> {
        let win = window().ok_or(PageError::NoWindow)?;
        let callback = Closure::wrap(Box::new(f) as Box<dyn FnMut()>);
        let id = win.set_interval_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            period_ms,
        )?;
        // The browser owns the callback from here on.
        callback.forget();
        Ok(Self::from_id(id))
    }

    fn from_id(id: i32) -> Self {
        Self { id: Rc::new(Cell::new(Some(id))) }
    }

    pub fn is_running(&self) -> bool {
        self.id.get().is_some()
    }

    /// Clear the interval. Shared by every clone; later calls are no-ops.
    pub fn stop(&self) {
        if let Some(id) = self.id.take() {
            if let Some(win) = window() {
                win.clear_interval_with_handle(id);
            }
        }
    }
}
