//! Message rotation with a two-phase fade.
//!
//! The rotator owns the cursor only. Rendering goes through [`MessageDisplay`]
//! so the cycle can be driven by the DOM element in the browser and by a
//! recording fake in tests. A tick is split in two halves: [`MessageRotator::tick`]
//! starts the fade-out and hands back a [`PendingSwap`]; the page applies that
//! swap once the fade-out animation has had time to finish.

use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

use crate::PageError;

pub const FADE_OUT_CLASS: &str = "fade-out";
pub const FADE_IN_ANIMATION: &str = "fadeInOut 2s ease-in-out";

/// Surface the rotator writes to.
pub trait MessageDisplay {
    fn begin_fade_out(&self);
    fn set_text(&self, text: &str);
    /// Drop the fade-out state and replay the fade-in animation from the start.
    fn restart_fade_in(&self);
}

pub struct MessageRotator {
    messages: &'static [&'static str],
    index: usize,
}

impl MessageRotator {
    pub fn new(messages: &'static [&'static str]) -> Result<Self, PageError> {
        if messages.is_empty() {
            return Err(PageError::EmptyMessages);
        }
        Ok(Self { messages, index: 0 })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &'static str {
        self.messages[self.index]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Move the cursor one step (wrapping) and return the text swap to apply
    /// after the fade-out.
    pub fn advance(&mut self) -> PendingSwap {
        self.index = (self.index + 1) % self.messages.len();
        PendingSwap { text: self.current() }
    }

    /// First half of a visual tick: fade the old text and advance.
    pub fn tick<D: MessageDisplay>(&mut self, display: &D) -> PendingSwap {
        display.begin_fade_out();
        self.advance()
    }
}

/// Text waiting for the fade-out to end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct PendingSwap {
    pub text: &'static str,
}

impl PendingSwap {
    pub fn apply<D: MessageDisplay>(self, display: &D) {
        display.set_text(self.text);
        display.restart_fade_in();
    }
}

/// The `#loveMessage` element.
pub struct DomMessageDisplay {
    el: HtmlElement,
}

impl DomMessageDisplay {
    pub fn new(el: HtmlElement) -> Self {
        Self { el }
    }
}

impl MessageDisplay for DomMessageDisplay {
    fn begin_fade_out(&self) {
        self.el.class_list().add_1(FADE_OUT_CLASS).ok();
    }

    fn set_text(&self, text: &str) {
        self.el.set_text_content(Some(text));
    }

    fn restart_fade_in(&self) {
        self.el.class_list().remove_1(FADE_OUT_CLASS).ok();
        let style = self.el.style();
        // Reading offset_width forces a reflow so the browser sees the
        // animation reset before it is reassigned.
        let _ = self.el.offset_width();
        style.set_property("animation", "none").ok();
        let _ = self.el.offset_width();
        style.set_property("animation", FADE_IN_ANIMATION).ok();
    }
}

impl TryFrom<web_sys::Element> for DomMessageDisplay {
    type Error = PageError;

    fn try_from(el: web_sys::Element) -> Result<Self, Self::Error> {
        el.dyn_into::<HtmlElement>()
            .map(Self::new)
            .map_err(|_| PageError::Js("message element is not an HtmlElement".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        log: RefCell<Vec<String>>,
    }

    impl MessageDisplay for Recorder {
        fn begin_fade_out(&self) {
            self.log.borrow_mut().push("fade-out".into());
        }
        fn set_text(&self, text: &str) {
            self.log.borrow_mut().push(format!("text:{text}"));
        }
        fn restart_fade_in(&self) {
            self.log.borrow_mut().push("fade-in".into());
        }
    }

    const ABC: &[&str] = &["A", "B", "C"];

    #[test]
    fn starts_on_first_message() {
        let r = MessageRotator::new(ABC).unwrap();
        assert_eq!(r.index(), 0);
        assert_eq!(r.current(), "A");
    }

    #[test]
    fn empty_list_is_rejected() {
        assert!(matches!(MessageRotator::new(&[]), Err(PageError::EmptyMessages)));
    }

    #[test]
    fn advance_wraps_modulo_len() {
        let mut r = MessageRotator::new(ABC).unwrap();
        for n in 1..=10 {
            r.advance();
            assert_eq!(r.index(), n % ABC.len());
        }
    }

    #[test]
    fn one_then_three_more_lands_on_b() {
        let mut r = MessageRotator::new(ABC).unwrap();
        assert_eq!(r.advance().text, "B");
        for _ in 0..3 {
            let _ = r.advance();
        }
        assert_eq!(r.current(), "B");
        assert_eq!(r.index(), 1);
    }

    #[test]
    fn tick_fades_before_swapping_text() {
        let mut r = MessageRotator::new(ABC).unwrap();
        let d = Recorder::default();
        let swap = r.tick(&d);
        assert_eq!(*d.log.borrow(), vec!["fade-out".to_string()]);
        swap.apply(&d);
        assert_eq!(*d.log.borrow(), vec!["fade-out", "text:B", "fade-in"]);
    }
}
