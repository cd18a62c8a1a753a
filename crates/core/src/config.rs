use crate::Millis;
use serde::{Deserialize, Serialize};

/// Timing profile of the reveal animation. None of these values carry
/// correctness; they only shape what the user sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealTiming {
    pub spin_ms: Millis,
    pub decelerate_ms: Millis,
    pub motion_tick_ms: Millis,
    /// Track rows advanced per motion tick.
    pub motion_step: usize,
    pub track_repeats: usize,
    pub particle_count: usize,
    pub particle_stagger_ms: Millis,
}

impl Default for RevealTiming {
    fn default() -> Self {
        Self {
            spin_ms: 1_200,
            decelerate_ms: 1_100,
            motion_tick_ms: 50,
            motion_step: 1,
            track_repeats: 15,
            particle_count: 30,
            particle_stagger_ms: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickerConfig {
    pub search_debounce_ms: Millis,
    pub notification_ms: Millis,
    pub page_size: usize,
    /// Seed for the pseudorandom source. `None` uses the strong source.
    #[serde(default)]
    pub seed: Option<u64>,
    pub reveal: RevealTiming,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            search_debounce_ms: 200,
            notification_ms: 3_000,
            page_size: 60,
            seed: None,
            reveal: RevealTiming::default(),
        }
    }
}
