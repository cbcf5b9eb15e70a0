use crate::mode::Mode;
use crate::options::OptionList;
use crate::selector::Pick;
use crate::sequencer::RevealPhase;
use crate::theme::Theme;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseEvent {
    Countdown { remaining: u32 },
    Reveal { phase: RevealPhase, pick: Pick },
    Idle,
}

impl PhaseEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PhaseEvent::Countdown { .. } => "countdown",
            PhaseEvent::Reveal { phase, .. } => phase.name(),
            PhaseEvent::Idle => "idle",
        }
    }
}

pub trait Renderer {
    fn options_changed(&mut self, options: &OptionList, mode: Mode);
    fn phase_changed(&mut self, event: &PhaseEvent);
    fn theme_changed(&mut self, _theme: Theme) {}
}

impl Renderer for () {
    fn options_changed(&mut self, _options: &OptionList, _mode: Mode) {}
    fn phase_changed(&mut self, _event: &PhaseEvent) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn class(self) -> &'static str {
        match self {
            NoticeLevel::Info => "notification-info",
            NoticeLevel::Success => "notification-success",
            NoticeLevel::Warning => "notification-warning",
            NoticeLevel::Error => "notification-error",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            NoticeLevel::Info => "💡",
            NoticeLevel::Success => "✅",
            NoticeLevel::Warning | NoticeLevel::Error => "⚠️",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub duration_ms: u32,
}

pub trait Notifier {
    fn notify(&mut self, notice: Notice);
}

impl Notifier for () {
    fn notify(&mut self, _notice: Notice) {}
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Rendered {
        Options(Vec<String>, Mode),
        Phase(PhaseEvent),
        Theme(Theme),
    }

    #[derive(Clone, Default)]
    pub struct RecordingRenderer(pub Rc<RefCell<Vec<Rendered>>>);

    impl RecordingRenderer {
        pub fn phases(&self) -> Vec<PhaseEvent> {
            self.0
                .borrow()
                .iter()
                .filter_map(|entry| match entry {
                    Rendered::Phase(event) => Some(event.clone()),
                    _ => None,
                })
                .collect()
        }

        pub fn take(&self) -> Vec<Rendered> {
            std::mem::take(&mut *self.0.borrow_mut())
        }
    }

    impl Renderer for RecordingRenderer {
        fn options_changed(&mut self, options: &OptionList, mode: Mode) {
            self.0
                .borrow_mut()
                .push(Rendered::Options(options.as_slice().to_vec(), mode));
        }

        fn phase_changed(&mut self, event: &PhaseEvent) {
            self.0.borrow_mut().push(Rendered::Phase(event.clone()));
        }

        fn theme_changed(&mut self, theme: Theme) {
            self.0.borrow_mut().push(Rendered::Theme(theme));
        }
    }

    #[derive(Clone, Default)]
    pub struct RecordingNotifier(pub Rc<RefCell<Vec<Notice>>>);

    impl RecordingNotifier {
        pub fn last(&self) -> Option<Notice> {
            self.0.borrow().last().cloned()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&mut self, notice: Notice) {
            self.0.borrow_mut().push(notice);
        }
    }
}
