use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::PickerError;

pub const MIN_OPTION_CHARS: usize = 2;

pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionList {
    items: Vec<String>,
}

impl OptionList {
    pub fn new() -> Self {
        Self::default()
    }

    // The minimum length is an input rule; stored entries keep theirs.
    pub fn restore(raw_items: Vec<String>) -> Self {
        let mut seen = HashSet::new();
        let mut items = Vec::with_capacity(raw_items.len());

        for (index, raw) in raw_items.into_iter().enumerate() {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                warn!("Dropping stored option {}: blank", index);
                continue;
            }
            if !seen.insert(normalize(trimmed)) {
                warn!("Dropping stored option {} ({:?}): duplicate", index, raw);
                continue;
            }
            items.push(trimmed.to_string());
        }

        Self { items }
    }

    pub fn add(&mut self, text: &str, max: usize) -> Result<&str, PickerError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(PickerError::EmptyInput);
        }
        if trimmed.chars().count() < MIN_OPTION_CHARS {
            return Err(PickerError::TooShort {
                min: MIN_OPTION_CHARS,
            });
        }
        if self.contains(trimmed) {
            return Err(PickerError::Duplicate(trimmed.to_string()));
        }
        if self.items.len() >= max {
            return Err(PickerError::LimitReached { max });
        }

        self.items.push(trimmed.to_string());
        Ok(self.items.last().map(String::as_str).unwrap_or_default())
    }

    pub fn remove(&mut self, index: usize) -> Result<String, PickerError> {
        if index >= self.items.len() {
            return Err(PickerError::OutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    pub fn clear(&mut self) -> Result<usize, PickerError> {
        if self.items.is_empty() {
            return Err(PickerError::Empty);
        }
        let removed = self.items.len();
        self.items.clear();
        Ok(removed)
    }

    pub fn contains(&self, text: &str) -> bool {
        self.position(text).is_some()
    }

    pub fn position(&self, text: &str) -> Option<usize> {
        let needle = normalize(text);
        self.items.iter().position(|item| normalize(item) == needle)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self, max: usize) -> bool {
        self.items.len() >= max
    }

    pub fn remaining(&self, max: usize) -> usize {
        max.saturating_sub(self.items.len())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.items.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }
}
