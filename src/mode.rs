use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PickerError;

pub const SIMPLE_MIN_OPTIONS: usize = 2;
pub const SIMPLE_MAX_OPTIONS: usize = 3;
pub const MULTIPLE_MIN_OPTIONS: usize = 4;
pub const MULTIPLE_MAX_OPTIONS: usize = 10;

// The entry cap and the decision bounds are separate: a list can be valid
// to hold but invalid to decide on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Simple,
    Multiple,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::Simple => Mode::Multiple,
            Mode::Multiple => Mode::Simple,
        }
    }

    pub fn min_options(self) -> usize {
        match self {
            Mode::Simple => SIMPLE_MIN_OPTIONS,
            Mode::Multiple => MULTIPLE_MIN_OPTIONS,
        }
    }

    pub fn max_options(self) -> usize {
        match self {
            Mode::Simple => SIMPLE_MAX_OPTIONS,
            Mode::Multiple => MULTIPLE_MAX_OPTIONS,
        }
    }

    pub fn validate_for_decision(self, count: usize) -> Result<(), PickerError> {
        let valid = match self {
            Mode::Simple => (self.min_options()..=self.max_options()).contains(&count),
            Mode::Multiple => count >= self.min_options(),
        };
        if valid {
            Ok(())
        } else {
            Err(PickerError::InvalidCount { mode: self, count })
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Simple => "simple",
            Mode::Multiple => "multiple",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Simple => "Simple",
            Mode::Multiple => "Multiple",
        }
    }

    pub fn requirement(self) -> String {
        match self {
            Mode::Simple => format!(
                "between {} and {} options",
                self.min_options(),
                self.max_options()
            ),
            Mode::Multiple => format!("at least {} options", self.min_options()),
        }
    }

    pub fn verdict(self) -> &'static str {
        match self {
            Mode::Simple => "Decided",
            Mode::Multiple => "Winner",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMode(pub String);

impl fmt::Display for UnknownMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown mode '{}'", self.0)
    }
}

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "simple" => Ok(Mode::Simple),
            "multiple" => Ok(Mode::Multiple),
            other => Err(UnknownMode(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_between_modes() {
        assert_eq!(Mode::Simple.toggled(), Mode::Multiple);
        assert_eq!(Mode::Multiple.toggled(), Mode::Simple);
        assert_eq!(Mode::default(), Mode::Simple);
    }

    #[test]
    fn entry_caps() {
        assert_eq!(Mode::Simple.max_options(), 3);
        assert_eq!(Mode::Multiple.max_options(), 10);
        assert_eq!(Mode::Simple.min_options(), 2);
        assert_eq!(Mode::Multiple.min_options(), 4);
        assert_eq!(Mode::Multiple.requirement(), "at least 4 options");
    }

    #[test]
    fn simple_decides_on_two_or_three() {
        for count in [0, 1, 4, 10] {
            assert_eq!(
                Mode::Simple.validate_for_decision(count),
                Err(PickerError::InvalidCount {
                    mode: Mode::Simple,
                    count
                })
            );
        }
        assert!(Mode::Simple.validate_for_decision(2).is_ok());
        assert!(Mode::Simple.validate_for_decision(3).is_ok());
    }

    #[test]
    fn multiple_decides_on_four_or_more() {
        assert!(Mode::Multiple.validate_for_decision(3).is_err());
        assert!(Mode::Multiple.validate_for_decision(4).is_ok());
        // The entry cap does not bound decisions.
        assert!(Mode::Multiple.validate_for_decision(11).is_ok());
    }

    #[test]
    fn parses_storage_strings() {
        assert_eq!("simple".parse::<Mode>(), Ok(Mode::Simple));
        assert_eq!("multiple".parse::<Mode>(), Ok(Mode::Multiple));
        assert!("Multiple".parse::<Mode>().is_err());
        assert_eq!(Mode::Multiple.to_string(), "multiple");
    }
}
