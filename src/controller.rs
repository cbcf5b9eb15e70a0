use log::{info, warn};
use rand::Rng;

use crate::config::{NoticeDurations, PickerConfig};
use crate::error::PickerError;
use crate::events::{Notice, NoticeLevel, Notifier, PhaseEvent, Renderer};
use crate::mode::Mode;
use crate::options::OptionList;
use crate::selector::{self, Pick};
use crate::sequencer::{RevealPhase, Sequencer, SequencerState};
use crate::storage::Persistence;
use crate::theme::Theme;

pub struct DecisionController<P, R> {
    options: OptionList,
    mode: Mode,
    theme: Theme,
    sequencer: Sequencer,
    notices: NoticeDurations,
    persistence: P,
    rng: R,
    renderer: Box<dyn Renderer>,
    notifier: Box<dyn Notifier>,
}

impl<P: Persistence, R: Rng> DecisionController<P, R> {
    pub fn load(persistence: P, rng: R, config: PickerConfig) -> Self {
        let options = persistence.load_options();
        let mode = persistence.load_mode();
        let theme = persistence.load_theme();
        info!(
            "Loaded {} options in {} mode ({} theme)",
            options.len(),
            mode,
            theme.as_attr()
        );
        Self {
            options,
            mode,
            theme,
            sequencer: Sequencer::new(config.timing),
            notices: config.notices,
            persistence,
            rng,
            renderer: Box::new(()),
            notifier: Box::new(()),
        }
    }

    pub fn with_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self.renderer.options_changed(&self.options, self.mode);
        self.renderer.theme_changed(self.theme);
        self
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn options(&self) -> &OptionList {
        &self.options
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn state(&self) -> &SequencerState {
        self.sequencer.state()
    }

    pub fn is_busy(&self) -> bool {
        !self.sequencer.is_idle()
    }

    pub fn max_options(&self) -> usize {
        self.mode.max_options()
    }

    pub fn winner(&self) -> Option<&Pick> {
        self.sequencer.winner()
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn add_option(&mut self, text: &str) -> Result<(), PickerError> {
        let result = self.try_add(text);
        self.report(result, |_| "Option added".to_string())
    }

    fn try_add(&mut self, text: &str) -> Result<(), PickerError> {
        self.sequencer.ensure_idle()?;
        let max = self.mode.max_options();
        self.options.add(text, max)?;
        self.options_changed();
        Ok(())
    }

    pub fn remove_option(&mut self, index: usize) -> Result<String, PickerError> {
        let result = self.try_remove(index);
        self.report(result, |removed| format!("Removed \"{removed}\""))
    }

    fn try_remove(&mut self, index: usize) -> Result<String, PickerError> {
        self.sequencer.ensure_idle()?;
        let removed = self.options.remove(index)?;
        self.options_changed();
        Ok(removed)
    }

    pub fn clear_options(&mut self) -> Result<usize, PickerError> {
        let result = self.try_clear();
        self.report(result, |count| format!("Removed {count} options"))
    }

    fn try_clear(&mut self) -> Result<usize, PickerError> {
        self.sequencer.ensure_idle()?;
        let removed = self.options.clear()?;
        self.options_changed();
        Ok(removed)
    }

    pub fn toggle_mode(&mut self) -> Result<Mode, PickerError> {
        let result = self.try_toggle_mode();
        self.report(result, |mode| format!("Switched to {} mode", mode.label()))
    }

    fn try_toggle_mode(&mut self) -> Result<Mode, PickerError> {
        self.sequencer.ensure_idle()?;
        self.mode = self.mode.toggled();
        self.persistence.save_mode(self.mode);
        self.renderer.options_changed(&self.options, self.mode);
        Ok(self.mode)
    }

    pub fn toggle_theme(&mut self) -> Result<Theme, PickerError> {
        self.sequencer.ensure_idle()?;
        self.theme = self.theme.toggle();
        self.persistence.save_theme(self.theme);
        self.renderer.theme_changed(self.theme);
        Ok(self.theme)
    }

    pub fn start(&mut self, now_ms: u64) -> Result<(), PickerError> {
        match self.sequencer.start(now_ms, self.mode, self.options.len()) {
            Ok(event) => {
                info!(
                    "Deciding between {} options in {} mode",
                    self.options.len(),
                    self.mode
                );
                self.renderer.phase_changed(&event);
                Ok(())
            }
            Err(err) => self.report(Err(err), |_: &()| String::new()),
        }
    }

    pub fn next_due(&self) -> Option<u64> {
        self.sequencer.next_due()
    }

    pub fn poll(&mut self, now_ms: u64) -> usize {
        let mode = self.mode;
        let options = &self.options;
        let rng = &mut self.rng;
        let events = self
            .sequencer
            .poll(now_ms, || selector::pick(mode, options.as_slice(), &mut *rng));

        for event in &events {
            if let PhaseEvent::Reveal {
                phase: RevealPhase::ShuffleIn,
                pick,
            } = event
            {
                info!(
                    "Drew \"{}\" (#{}) after {} rounds",
                    pick.winner,
                    pick.index + 1,
                    pick.rounds
                );
            }
            self.renderer.phase_changed(event);
        }
        events.len()
    }

    pub fn acknowledge(&mut self) -> Result<Pick, PickerError> {
        match self.sequencer.acknowledge() {
            Ok(event) => {
                self.renderer.phase_changed(&event);
                let pick = match event {
                    PhaseEvent::Reveal { pick, .. } => pick,
                    _ => return Err(PickerError::NotRevealed),
                };
                self.notifier.notify(Notice {
                    level: NoticeLevel::Success,
                    message: format!("{}: {}", self.mode.verdict(), pick.winner),
                    duration_ms: self.notices.verdict_ms,
                });
                Ok(pick)
            }
            Err(err) => self.report(Err(err), |_: &Pick| String::new()),
        }
    }

    pub fn reset(&mut self) -> Result<(), PickerError> {
        match self.sequencer.reset() {
            Ok(event) => {
                self.renderer.phase_changed(&event);
                self.renderer.options_changed(&self.options, self.mode);
                Ok(())
            }
            Err(err) => self.report(Err(err), |_: &()| String::new()),
        }
    }

    fn options_changed(&mut self) {
        self.persistence.save_options(&self.options);
        self.renderer.options_changed(&self.options, self.mode);
    }

    fn report<T, F>(&mut self, result: Result<T, PickerError>, success: F) -> Result<T, PickerError>
    where
        F: FnOnce(&T) -> String,
    {
        let notice = match &result {
            Ok(value) => {
                let message = success(value);
                if message.is_empty() {
                    None
                } else {
                    Some(Notice {
                        level: NoticeLevel::Success,
                        message,
                        duration_ms: self.notices.default_ms,
                    })
                }
            }
            Err(err) => {
                if *err == PickerError::Busy {
                    warn!("Refused while a decision is running");
                }
                Some(Notice {
                    level: err.level(),
                    message: err.to_string(),
                    duration_ms: self.notices.default_ms,
                })
            }
        };
        if let Some(notice) = notice {
            self.notifier.notify(notice);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, VirtualClock};
    use crate::config::Timing;
    use crate::events::testing::{RecordingNotifier, RecordingRenderer, Rendered};
    use crate::storage::{MemoryStore, MODE_KEY, OPTIONS_KEY};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    type Controller = DecisionController<MemoryStore, StdRng>;

    struct Harness {
        controller: Controller,
        renderer: RecordingRenderer,
        notifier: RecordingNotifier,
        clock: VirtualClock,
    }

    impl Harness {
        fn new(store: MemoryStore) -> Self {
            let renderer = RecordingRenderer::default();
            let notifier = RecordingNotifier::default();
            let controller = Controller::load(store, StdRng::seed_from_u64(17), PickerConfig::default())
                .with_renderer(Box::new(renderer.clone()))
                .with_notifier(Box::new(notifier.clone()));
            renderer.take();
            Self {
                controller,
                renderer,
                notifier,
                clock: VirtualClock::new(0),
            }
        }

        fn with_options(mode: Mode, items: &[&str]) -> Self {
            let json = serde_json::to_string(items).unwrap();
            Self::new(
                MemoryStore::new()
                    .with_entry(OPTIONS_KEY, &json)
                    .with_entry(MODE_KEY, mode.as_str()),
            )
        }

        fn start(&mut self) -> Result<(), PickerError> {
            let now = self.clock.now_ms();
            self.controller.start(now)
        }

        fn run_until_envelope(&mut self) {
            while let Some(due) = self.controller.next_due() {
                self.clock.set(due);
                self.controller.poll(self.clock.now_ms());
            }
        }
    }

    #[test]
    fn restores_persisted_state() {
        let harness = Harness::with_options(Mode::Multiple, &["A1", "B2", "C3", "D4"]);
        assert_eq!(harness.controller.mode(), Mode::Multiple);
        assert_eq!(harness.controller.options().len(), 4);
        assert_eq!(harness.controller.max_options(), 10);
    }

    #[test]
    fn add_persists_renders_and_notifies() {
        let mut harness = Harness::new(MemoryStore::new());
        harness.controller.add_option("  Pizza ").unwrap();

        assert_eq!(
            harness.controller.persistence().raw(OPTIONS_KEY),
            Some(r#"["Pizza"]"#)
        );
        assert_eq!(
            harness.renderer.take(),
            vec![Rendered::Options(vec!["Pizza".into()], Mode::Simple)]
        );
        assert_eq!(
            harness.notifier.last().map(|n| n.level),
            Some(NoticeLevel::Success)
        );

        assert_eq!(
            harness.controller.add_option("pizza "),
            Err(PickerError::Duplicate("pizza".into()))
        );
        let notice = harness.notifier.last().unwrap();
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert_eq!(notice.message, "\"pizza\" is already in the list");
        assert!(harness.renderer.take().is_empty());
    }

    #[test]
    fn simple_mode_caps_entries_at_three() {
        let mut harness = Harness::with_options(Mode::Simple, &["Tacos", "Pasta", "Ramen"]);
        assert_eq!(
            harness.controller.add_option("ok"),
            Err(PickerError::LimitReached { max: 3 })
        );
        assert_eq!(harness.controller.options().len(), 3);
    }

    #[test]
    fn remove_then_clear_on_empty_list() {
        let mut harness = Harness::with_options(Mode::Simple, &["Tacos"]);
        assert_eq!(harness.controller.remove_option(0), Ok("Tacos".to_string()));
        assert!(harness.controller.remove_option(0).is_err());
        assert_eq!(harness.controller.clear_options(), Err(PickerError::Empty));
        assert_eq!(
            harness.notifier.last().map(|n| n.level),
            Some(NoticeLevel::Info)
        );
        assert_eq!(
            harness.controller.persistence().raw(OPTIONS_KEY),
            Some("[]")
        );
    }

    #[test]
    fn toggle_keeps_an_oversized_list() {
        let mut harness =
            Harness::with_options(Mode::Multiple, &["A1", "B2", "C3", "D4", "E5"]);
        assert_eq!(harness.controller.toggle_mode(), Ok(Mode::Simple));
        assert_eq!(harness.controller.options().len(), 5);
        assert_eq!(
            harness.controller.persistence().raw(MODE_KEY),
            Some("simple")
        );
        assert_eq!(
            harness.start(),
            Err(PickerError::InvalidCount {
                mode: Mode::Simple,
                count: 5
            })
        );
        assert!(!harness.controller.is_busy());
    }

    #[test]
    fn start_rejects_empty_and_undersized_lists() {
        let mut harness = Harness::new(MemoryStore::new());
        assert_eq!(harness.start(), Err(PickerError::EmptyList));

        harness.controller.add_option("Tea").unwrap();
        assert_eq!(
            harness.start(),
            Err(PickerError::InvalidCount {
                mode: Mode::Simple,
                count: 1
            })
        );
        assert!(harness.renderer.phases().is_empty());
    }

    #[test]
    fn simple_decision_draws_one_of_two() {
        let mut harness = Harness::with_options(Mode::Simple, &["Tea", "Coffee"]);
        harness.start().unwrap();
        assert!(harness.controller.is_busy());

        harness.clock.advance(2_999);
        harness.controller.poll(harness.clock.now_ms());
        assert!(harness.controller.winner().is_none());

        harness.run_until_envelope();
        let pick = harness.controller.winner().cloned().unwrap();
        assert!(pick.winner == "Tea" || pick.winner == "Coffee");
        assert_eq!(
            harness.controller.options().get(pick.index),
            Some(pick.winner.as_str())
        );
    }

    #[test]
    fn mutations_are_refused_while_busy() {
        let mut harness = Harness::with_options(Mode::Simple, &["Tea", "Coffee"]);
        harness.start().unwrap();

        let check = |harness: &mut Harness| {
            assert_eq!(harness.controller.add_option("Juice"), Err(PickerError::Busy));
            assert_eq!(harness.controller.remove_option(0), Err(PickerError::Busy));
            assert_eq!(harness.controller.clear_options(), Err(PickerError::Busy));
            assert_eq!(harness.controller.toggle_mode(), Err(PickerError::Busy));
            assert_eq!(harness.controller.toggle_theme(), Err(PickerError::Busy));
            assert_eq!(harness.start(), Err(PickerError::Busy));
            assert_eq!(
                harness.controller.options().as_slice(),
                ["Tea", "Coffee"]
            );
            assert_eq!(harness.controller.mode(), Mode::Simple);
        };

        check(&mut harness);
        let mut seen = Vec::new();
        while let Some(due) = harness.controller.next_due() {
            harness.clock.set(due);
            harness.controller.poll(due);
            if let SequencerState::Revealing { phase, .. } = harness.controller.state() {
                seen.push(*phase);
            }
            check(&mut harness);
        }
        assert_eq!(
            seen,
            [
                RevealPhase::ShuffleIn,
                RevealPhase::Shuffle,
                RevealPhase::FadeOut,
                RevealPhase::Envelope
            ]
        );
        harness.controller.acknowledge().unwrap();
        check(&mut harness);
    }

    #[test]
    fn bracket_decision_end_to_end() {
        let mut harness = Harness::with_options(Mode::Multiple, &["A", "B", "C", "D"]);
        harness.start().unwrap();
        assert_eq!(harness.controller.reset(), Err(PickerError::Busy));
        harness.run_until_envelope();

        let pick = harness.controller.winner().cloned().unwrap();
        assert!(["A", "B", "C", "D"].contains(&pick.winner.as_str()));
        assert_eq!(
            harness.controller.options().position(&pick.winner),
            Some(pick.index)
        );
        assert_eq!(pick.rounds, 2);

        let names: Vec<_> = harness
            .renderer
            .phases()
            .iter()
            .map(PhaseEvent::name)
            .collect();
        assert_eq!(
            names,
            [
                "countdown",
                "countdown",
                "countdown",
                "countdown",
                "shuffle-in",
                "shuffle",
                "fade-out",
                "envelope"
            ]
        );

        assert_eq!(harness.controller.reset(), Err(PickerError::Busy));
        assert_eq!(harness.controller.acknowledge(), Ok(pick.clone()));
        let verdict = harness.notifier.last().unwrap();
        assert_eq!(verdict.message, format!("Winner: {}", pick.winner));
        assert_eq!(verdict.duration_ms, 5_000);

        harness.controller.reset().unwrap();
        assert!(!harness.controller.is_busy());
        assert!(harness.controller.winner().is_none());
        assert_eq!(
            harness.controller.options().as_slice(),
            ["A", "B", "C", "D"]
        );
        assert_eq!(harness.renderer.phases().last(), Some(&PhaseEvent::Idle));

        harness.controller.add_option("Eel").unwrap();
    }

    #[test]
    fn same_seed_same_decision() {
        let decide = || {
            let mut harness =
                Harness::with_options(Mode::Multiple, &["AA", "BB", "CC", "DD", "EE", "FF"]);
            harness.start().unwrap();
            harness.run_until_envelope();
            harness.controller.winner().cloned().unwrap()
        };
        assert_eq!(decide(), decide());
    }

    #[test]
    fn countdown_takes_at_least_three_seconds() {
        let mut harness = Harness::with_options(Mode::Simple, &["Tea", "Coffee"]);
        harness.start().unwrap();
        let mut drawn_at = None;
        while let Some(due) = harness.controller.next_due() {
            harness.clock.set(due);
            harness.controller.poll(due);
            if drawn_at.is_none() && harness.controller.winner().is_some() {
                drawn_at = Some(due);
            }
        }
        assert_eq!(drawn_at, Some(Timing::default().until_selection_ms()));
        assert!(drawn_at.unwrap() >= 3_000);
    }

    #[test]
    fn theme_toggle_persists() {
        let mut harness = Harness::new(MemoryStore::new());
        assert_eq!(harness.controller.toggle_theme(), Ok(Theme::Dark));
        assert_eq!(harness.controller.persistence().load_theme(), Theme::Dark);
        assert_eq!(harness.renderer.take(), vec![Rendered::Theme(Theme::Dark)]);
    }
}
