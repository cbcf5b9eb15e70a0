//! Decision sequencing: countdown, draw, reveal, reset.
//!
//! A decision is laid out up front as a [`PhasePlan`], an ordered queue of
//! steps each due at an absolute time. Whoever owns the sequencer sleeps
//! until [`Sequencer::next_due`] and then calls [`Sequencer::poll`] with the
//! current time; every step that has come due fires in order. Nothing here
//! reads a clock, so tests drive it with plain numbers.

use log::{debug, error};
use std::collections::VecDeque;

use crate::config::Timing;
use crate::error::PickerError;
use crate::events::PhaseEvent;
use crate::mode::Mode;
use crate::selector::Pick;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RevealPhase {
    ShuffleIn,
    Shuffle,
    FadeOut,
    Envelope,
    Opened,
}

impl RevealPhase {
    pub fn name(self) -> &'static str {
        match self {
            RevealPhase::ShuffleIn => "shuffle-in",
            RevealPhase::Shuffle => "shuffle",
            RevealPhase::FadeOut => "fade-out",
            RevealPhase::Envelope => "envelope",
            RevealPhase::Opened => "opened",
        }
    }

    pub fn caption(self) -> Option<&'static str> {
        match self {
            RevealPhase::ShuffleIn => Some("Shuffling the cards..."),
            RevealPhase::Shuffle => Some("Mixing the cards!"),
            RevealPhase::FadeOut => Some("Preparing the envelope!"),
            RevealPhase::Envelope | RevealPhase::Opened => None,
        }
    }

    pub fn stagger_ms(self, timing: &Timing) -> u32 {
        match self {
            RevealPhase::ShuffleIn => timing.flip_stagger_ms,
            RevealPhase::Shuffle => timing.shuffle_stagger_ms,
            RevealPhase::FadeOut => timing.fade_stagger_ms,
            RevealPhase::Envelope | RevealPhase::Opened => 0,
        }
    }

    pub fn shows_cards(self) -> bool {
        matches!(
            self,
            RevealPhase::ShuffleIn | RevealPhase::Shuffle | RevealPhase::FadeOut
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Countdown(u32),
    Draw,
    Reveal(RevealPhase),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledStep {
    pub due_at: u64,
    pub step: Step,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhasePlan {
    steps: VecDeque<ScheduledStep>,
}

impl PhasePlan {
    // The first countdown number is shown by `start` and is not planned.
    pub fn decision(start_ms: u64, timing: &Timing) -> Self {
        let mut plan = Self::default();
        let mut at = start_ms;

        for remaining in (0..timing.countdown_from).rev() {
            at += u64::from(timing.tick_ms);
            plan.push(at, Step::Countdown(remaining));
        }

        at += u64::from(timing.settle_ms);
        plan.push(at, Step::Draw);

        at += u64::from(timing.shuffle_in_ms);
        plan.push(at, Step::Reveal(RevealPhase::Shuffle));
        at += u64::from(timing.shuffle_ms);
        plan.push(at, Step::Reveal(RevealPhase::FadeOut));
        at += u64::from(timing.fade_out_ms);
        plan.push(at, Step::Reveal(RevealPhase::Envelope));

        plan
    }

    fn push(&mut self, due_at: u64, step: Step) {
        self.steps.push_back(ScheduledStep { due_at, step });
    }

    pub fn next_due(&self) -> Option<u64> {
        self.steps.front().map(|scheduled| scheduled.due_at)
    }

    pub fn pop_due(&mut self, now_ms: u64) -> Option<Step> {
        if self.next_due().is_some_and(|due| due <= now_ms) {
            self.steps.pop_front().map(|scheduled| scheduled.step)
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScheduledStep> + '_ {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn clear(&mut self) {
        self.steps.clear();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SequencerState {
    #[default]
    Idle,
    CountingDown {
        remaining: u32,
    },
    Revealing {
        pick: Pick,
        phase: RevealPhase,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    state: SequencerState,
    plan: PhasePlan,
    timing: Timing,
}

impl Sequencer {
    pub fn new(timing: Timing) -> Self {
        Self {
            state: SequencerState::Idle,
            plan: PhasePlan::default(),
            timing: timing.sanitized(),
        }
    }

    pub fn state(&self) -> &SequencerState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SequencerState::Idle
    }

    pub fn ensure_idle(&self) -> Result<(), PickerError> {
        if self.is_idle() {
            Ok(())
        } else {
            Err(PickerError::Busy)
        }
    }

    pub fn winner(&self) -> Option<&Pick> {
        match &self.state {
            SequencerState::Revealing { pick, .. } => Some(pick),
            _ => None,
        }
    }

    pub fn start(
        &mut self,
        now_ms: u64,
        mode: Mode,
        count: usize,
    ) -> Result<PhaseEvent, PickerError> {
        self.ensure_idle()?;
        if count == 0 {
            return Err(PickerError::EmptyList);
        }
        mode.validate_for_decision(count)?;

        let remaining = self.timing.countdown_from;
        self.plan = PhasePlan::decision(now_ms, &self.timing);
        self.state = SequencerState::CountingDown { remaining };
        debug!("Countdown started at {now_ms} with {} steps queued", self.plan.len());
        Ok(PhaseEvent::Countdown { remaining })
    }

    pub fn next_due(&self) -> Option<u64> {
        self.plan.next_due()
    }

    pub fn poll<F>(&mut self, now_ms: u64, mut draw: F) -> Vec<PhaseEvent>
    where
        F: FnMut() -> Result<Pick, PickerError>,
    {
        let mut events = Vec::new();

        while let Some(step) = self.plan.pop_due(now_ms) {
            match step {
                Step::Countdown(remaining) => {
                    self.state = SequencerState::CountingDown { remaining };
                    events.push(PhaseEvent::Countdown { remaining });
                }
                Step::Draw => match draw() {
                    Ok(pick) => {
                        self.state = SequencerState::Revealing {
                            pick: pick.clone(),
                            phase: RevealPhase::ShuffleIn,
                        };
                        events.push(PhaseEvent::Reveal {
                            phase: RevealPhase::ShuffleIn,
                            pick,
                        });
                    }
                    Err(err) => {
                        error!("Draw failed, abandoning decision: {err}");
                        self.plan.clear();
                        self.state = SequencerState::Idle;
                        events.push(PhaseEvent::Idle);
                    }
                },
                Step::Reveal(next) => {
                    if let SequencerState::Revealing { pick, phase } = &mut self.state {
                        *phase = next;
                        events.push(PhaseEvent::Reveal {
                            phase: next,
                            pick: pick.clone(),
                        });
                    }
                }
            }
        }

        for event in &events {
            debug!("Phase -> {}", event.name());
        }
        events
    }

    pub fn acknowledge(&mut self) -> Result<PhaseEvent, PickerError> {
        match &mut self.state {
            SequencerState::Idle => Err(PickerError::NotRevealed),
            SequencerState::CountingDown { .. } => Err(PickerError::Busy),
            SequencerState::Revealing { pick, phase } => match *phase {
                RevealPhase::Envelope | RevealPhase::Opened => {
                    *phase = RevealPhase::Opened;
                    Ok(PhaseEvent::Reveal {
                        phase: RevealPhase::Opened,
                        pick: pick.clone(),
                    })
                }
                _ => Err(PickerError::Busy),
            },
        }
    }

    pub fn reset(&mut self) -> Result<PhaseEvent, PickerError> {
        match self.state {
            SequencerState::Idle => Err(PickerError::NotRevealed),
            SequencerState::Revealing {
                phase: RevealPhase::Opened,
                ..
            } => {
                self.plan.clear();
                self.state = SequencerState::Idle;
                Ok(PhaseEvent::Idle)
            }
            _ => Err(PickerError::Busy),
        }
    }
}
