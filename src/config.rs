//! Page tunables. Defaults reproduce the shipped page; a JSON override can be
//! passed to `start_page_with_config` when the `serde_json` feature is on.

#[cfg(feature = "serde")]
use serde::Deserialize;

/// Inclusive `[min, max]` range a heart attribute is drawn from.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct Span {
    pub min: f64,
    pub max: f64,
}

impl Span {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Map a unit sample in `[0, 1]` onto the span.
    pub fn lerp(&self, unit: f64) -> f64 {
        self.min + (self.max - self.min) * unit
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PageConfig {
    // DOM hooks
    pub toggle_id: String,
    pub message_id: String,
    pub hearts_id: String,

    // Audio
    pub track_url: String,
    pub volume: f64,
    pub looping: bool,
    pub autoplay_delay_ms: i32,
    pub error_retry_delay_ms: i32,
    pub online_retry_delay_ms: i32,
    /// Lower-case substrings marking a window error as an audio fault.
    pub fault_markers: Vec<String>,

    // Messages
    pub rotate_period_ms: i32,
    pub fade_ms: i32,

    // Hearts
    pub heart_period_ms: i32,
    pub heart_stagger_ms: i32,
    pub max_batch: u32,
    pub heart_size_px: Span,
    pub heart_duration_s: Span,
    pub heart_delay_s: Span,
}

pub const DEFAULT_TRACK_URL: &str = "https://archive.org/download/78_la-vie-en-rose-orchestre-dir-luypaerts-edith-piaf-edith-piaf/17251%20La%20vie%20en%20rose.mp3";

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            toggle_id: "musicToggle".into(),
            message_id: "loveMessage".into(),
            hearts_id: "heartsContainer".into(),
            track_url: DEFAULT_TRACK_URL.into(),
            volume: 0.3,
            looping: true,
            autoplay_delay_ms: 1_000,
            error_retry_delay_ms: 2_000,
            online_retry_delay_ms: 1_000,
            // Playback-library and media-element failures only; a bare "audio"
            // would also match unrelated script errors.
            fault_markers: vec![
                "howler".into(),
                "mediaerror".into(),
                "notsupportederror".into(),
            ],
            rotate_period_ms: 5_000,
            fade_ms: 2_000,
            heart_period_ms: 2_000,
            heart_stagger_ms: 300,
            max_batch: 3,
            heart_size_px: Span::new(15.0, 30.0),
            heart_duration_s: Span::new(5.0, 15.0),
            heart_delay_s: Span::new(0.0, 5.0),
        }
    }
}

impl PageConfig {
    #[cfg(feature = "serde_json")]
    pub fn from_json(json: &str) -> Result<Self, crate::PageError> {
        let cfg: PageConfig =
            serde_json::from_str(json).map_err(|e| crate::PageError::InvalidConfig(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the timers and spawner cannot work with.
    pub fn validate(&self) -> Result<(), crate::PageError> {
        use crate::PageError::InvalidConfig;
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(InvalidConfig(format!("volume {} outside [0, 1]", self.volume)));
        }
        if self.max_batch == 0 {
            return Err(InvalidConfig("max_batch must be at least 1".into()));
        }
        if self.rotate_period_ms <= 0 || self.heart_period_ms <= 0 {
            return Err(InvalidConfig("periods must be positive".into()));
        }
        for (name, span) in [
            ("heart_size_px", self.heart_size_px),
            ("heart_duration_s", self.heart_duration_s),
            ("heart_delay_s", self.heart_delay_s),
        ] {
            if span.min > span.max || span.min < 0.0 {
                return Err(InvalidConfig(format!("{name}: bad range {}..{}", span.min, span.max)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = PageConfig::default();
        assert!(cfg.validate().is_ok());
        assert!((cfg.volume - 0.3).abs() < 1e-9);
        assert!(cfg.looping);
    }

    #[test]
    fn inverted_span_is_rejected() {
        let cfg = PageConfig { heart_delay_s: Span::new(5.0, 1.0), ..PageConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn span_lerp_hits_both_ends() {
        let s = Span::new(15.0, 30.0);
        assert_eq!(s.lerp(0.0), 15.0);
        assert_eq!(s.lerp(1.0), 30.0);
        assert!(s.contains(22.5));
    }

    #[cfg(feature = "serde_json")]
    #[test]
    fn json_overrides_merge_with_defaults() {
        let cfg = PageConfig::from_json(r#"{"volume":0.5,"max_batch":2}"#).unwrap();
        assert_eq!(cfg.max_batch, 2);
        assert_eq!(cfg.toggle_id, "musicToggle");
    }
}
