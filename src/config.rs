use log::warn;
use serde::{Deserialize, Serialize};

pub const MIN_COUNTDOWN_MS: u32 = 3000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub countdown_from: u32,
    pub tick_ms: u32,
    pub settle_ms: u32,
    pub shuffle_in_ms: u32,
    pub shuffle_ms: u32,
    pub fade_out_ms: u32,
    pub flip_stagger_ms: u32,
    pub shuffle_stagger_ms: u32,
    pub fade_stagger_ms: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            countdown_from: 3,
            tick_ms: 1000,
            settle_ms: 500,
            shuffle_in_ms: 2000,
            shuffle_ms: 3000,
            fade_out_ms: 800,
            flip_stagger_ms: 200,
            shuffle_stagger_ms: 50,
            fade_stagger_ms: 50,
        }
    }
}

impl Timing {
    // A decision never draws before MIN_COUNTDOWN_MS, whatever was configured.
    pub fn sanitized(self) -> Self {
        let countdown_from = self.countdown_from.max(1);
        let tick_ms = self.tick_ms.max(MIN_COUNTDOWN_MS.div_ceil(countdown_from));
        if countdown_from != self.countdown_from || tick_ms != self.tick_ms {
            warn!(
                "Countdown of {} x {}ms is too short, using {} x {}ms",
                self.countdown_from, self.tick_ms, countdown_from, tick_ms
            );
        }
        Self {
            countdown_from,
            tick_ms,
            ..self
        }
    }

    pub fn until_selection_ms(&self) -> u64 {
        u64::from(self.countdown_from) * u64::from(self.tick_ms) + u64::from(self.settle_ms)
    }

    pub fn reveal_ms(&self) -> u64 {
        u64::from(self.shuffle_in_ms) + u64::from(self.shuffle_ms) + u64::from(self.fade_out_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticeDurations {
    pub default_ms: u32,
    pub verdict_ms: u32,
}

impl Default for NoticeDurations {
    fn default() -> Self {
        Self {
            default_ms: 3000,
            verdict_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    pub timing: Timing,
    pub notices: NoticeDurations,
}

impl PickerConfig {
    pub fn sanitized(self) -> Self {
        Self {
            timing: self.timing.sanitized(),
            ..self
        }
    }
}
