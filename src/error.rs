use thiserror::Error;

use crate::events::NoticeLevel;
use crate::mode::Mode;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PickerError {
    #[error("Please type an option")]
    EmptyInput,
    #[error("Options need at least {min} characters")]
    TooShort { min: usize },
    #[error("\"{0}\" is already in the list")]
    Duplicate(String),
    #[error("Limit of {max} options reached")]
    LimitReached { max: usize },
    #[error("There is no option #{} (the list has {len})", .index + 1)]
    OutOfRange { index: usize, len: usize },
    #[error("There are no options to clear")]
    Empty,
    #[error("Wait for the current decision to finish")]
    Busy,
    #[error("Add at least one option")]
    EmptyList,
    #[error("{} mode needs {}, found {count}", .mode.label(), .mode.requirement())]
    InvalidCount { mode: Mode, count: usize },
    #[error("There is no revealed decision")]
    NotRevealed,
}

impl PickerError {
    pub fn level(&self) -> NoticeLevel {
        match self {
            PickerError::Duplicate(_) => NoticeLevel::Warning,
            PickerError::Empty => NoticeLevel::Info,
            _ => NoticeLevel::Error,
        }
    }
}
