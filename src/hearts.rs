//! Floating heart field.
//!
//! Each interval tick plans a small batch; every heart in the batch is created
//! after its own stagger, draws its look at creation time and removes itself
//! once its float animation has run out.

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

use crate::PageError;
use crate::config::{PageConfig, Span};

pub const HEART_CLASS: &str = "heart";
pub const HEART_GLYPH: &str = "❤️";

/// Uniform samples in `[0, 1)`.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

/// Browser crypto (or OS entropy natively) via `getrandom`.
#[derive(Default)]
pub struct Entropy;

impl RandomSource for Entropy {
    fn next_unit(&mut self) -> f64 {
        let mut buf = [0u8; 8];
        // Falling back to the midpoint keeps hearts on screen if entropy is unavailable.
        if getrandom::getrandom(&mut buf).is_err() {
            return 0.5;
        }
        // 53 high bits -> exactly representable f64 in [0, 1).
        (u64::from_le_bytes(buf) >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Visual parameters of one heart.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Heart {
    pub left_px: f64,
    pub size_px: f64,
    pub duration_s: f64,
    pub delay_s: f64,
}

impl Heart {
    /// How long the element stays in the container.
    pub fn lifetime_ms(&self) -> i32 {
        (self.duration_s * 1000.0).round() as i32
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchPlan {
    pub count: u32,
    stagger_ms: i32,
}

impl BatchPlan {
    /// Delay before the `i`th heart of the batch is created.
    pub fn stagger_ms(&self, i: u32) -> i32 {
        i as i32 * self.stagger_ms
    }

    pub fn delays(&self) -> impl Iterator<Item = i32> + '_ {
        (0..self.count).map(|i| self.stagger_ms(i))
    }
}

pub struct HeartSpawner<R: RandomSource> {
    rng: R,
    max_batch: u32,
    stagger_ms: i32,
    size_px: Span,
    duration_s: Span,
    delay_s: Span,
}

impl<R: RandomSource> HeartSpawner<R> {
    pub fn new(rng: R, cfg: &PageConfig) -> Self {
        Self {
            rng,
            max_batch: cfg.max_batch.max(1),
            stagger_ms: cfg.heart_stagger_ms,
            size_px: cfg.heart_size_px,
            duration_s: cfg.heart_duration_s,
            delay_s: cfg.heart_delay_s,
        }
    }

    /// Pick how many hearts the next tick releases, in `1..=max_batch`.
    pub fn plan_batch(&mut self) -> BatchPlan {
        let pick = (self.rng.next_unit() * self.max_batch as f64).floor() as u32;
        BatchPlan { count: pick.min(self.max_batch - 1) + 1, stagger_ms: self.stagger_ms }
    }

    /// Draw one heart for a viewport `viewport_width` pixels wide.
    pub fn spawn(&mut self, viewport_width: f64) -> Heart {
        let left = Span::new(0.0, viewport_width.max(0.0));
        Heart {
            left_px: left.lerp(self.rng.next_unit()),
            size_px: self.size_px.lerp(self.rng.next_unit()),
            duration_s: self.duration_s.lerp(self.rng.next_unit()),
            delay_s: self.delay_s.lerp(self.rng.next_unit()),
        }
    }
}

/// A heart node living in the container.
pub struct HeartElement {
    el: HtmlElement,
}

impl HeartElement {
    /// Create the node for `heart` and append it to `container`.
    pub fn insert(doc: &Document, container: &Element, heart: &Heart) -> Result<Self, PageError> {
        let el: HtmlElement = doc
            .create_element("div")?
            .dyn_into()
            .map_err(|_| PageError::Js("div is not an HtmlElement".into()))?;
        el.set_class_name(HEART_CLASS);
        el.set_text_content(Some(HEART_GLYPH));
        let style = el.style();
        style.set_property("left", &format!("{}px", heart.left_px))?;
        style.set_property("font-size", &format!("{}px", heart.size_px))?;
        style.set_property("animation-duration", &format!("{}s", heart.duration_s))?;
        style.set_property("animation-delay", &format!("{}s", heart.delay_s))?;
        container.append_child(&el)?;
        Ok(Self { el })
    }

    pub fn is_attached(&self) -> bool {
        self.el.parent_node().is_some()
    }

    /// Remove the node from whatever parent it has. Returns `false` when it was
    /// already detached.
    pub fn detach(&self) -> bool {
        match self.el.parent_node() {
            Some(parent) => parent.remove_child(&self.el).is_ok(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays a fixed cycle of samples.
    struct Cycle(Vec<f64>, usize);

    impl RandomSource for Cycle {
        fn next_unit(&mut self) -> f64 {
            let v = self.0[self.1 % self.0.len()];
            self.1 += 1;
            v
        }
    }

    fn spawner(samples: Vec<f64>) -> HeartSpawner<Cycle> {
        HeartSpawner::new(Cycle(samples, 0), &PageConfig::default())
    }

    #[test]
    fn batch_count_covers_one_to_three() {
        let mut s = spawner(vec![0.0, 0.34, 0.67, 0.999_999]);
        let counts: Vec<u32> = (0..4).map(|_| s.plan_batch().count).collect();
        assert_eq!(counts, vec![1, 2, 3, 3]);
    }

    #[test]
    fn stagger_is_300ms_per_heart() {
        let mut s = spawner(vec![0.9]);
        let plan = s.plan_batch();
        assert_eq!(plan.delays().collect::<Vec<_>>(), vec![0, 300, 600]);
    }

    #[test]
    fn extremes_map_to_range_ends() {
        let mut low = spawner(vec![0.0]);
        let h = low.spawn(1280.0);
        assert_eq!(h, Heart { left_px: 0.0, size_px: 15.0, duration_s: 5.0, delay_s: 0.0 });

        let mut high = spawner(vec![1.0]);
        let h = high.spawn(1280.0);
        assert_eq!(h, Heart { left_px: 1280.0, size_px: 30.0, duration_s: 15.0, delay_s: 5.0 });
        assert_eq!(h.lifetime_ms(), 15_000);
    }

    #[test]
    fn entropy_samples_stay_in_unit_interval() {
        let mut e = Entropy;
        for _ in 0..1_000 {
            let v = e.next_unit();
            assert!((0.0..1.0).contains(&v), "{v}");
        }
    }
}
