use gloo_storage::errors::StorageError;
use gloo_storage::{LocalStorage, Storage};
use log::warn;
use std::collections::HashMap;

use crate::mode::Mode;
use crate::options::OptionList;
use crate::theme::Theme;

pub const OPTIONS_KEY: &str = "opta_options";
pub const MODE_KEY: &str = "opta_mode";
pub const THEME_KEY: &str = "opta_theme";

pub trait Persistence {
    fn load_options(&self) -> OptionList;
    fn load_mode(&self) -> Mode;
    fn load_theme(&self) -> Theme;
    fn save_options(&mut self, options: &OptionList);
    fn save_mode(&mut self, mode: Mode);
    fn save_theme(&mut self, theme: Theme);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStore;

impl Persistence for LocalStore {
    fn load_options(&self) -> OptionList {
        match LocalStorage::get::<Vec<String>>(OPTIONS_KEY) {
            Ok(items) => OptionList::restore(items),
            Err(StorageError::KeyNotFound(_)) => OptionList::new(),
            Err(err) => {
                warn!("Falling back to an empty option list: {}", err);
                OptionList::new()
            }
        }
    }

    fn load_mode(&self) -> Mode {
        parse_or_default(MODE_KEY, read_raw(MODE_KEY))
    }

    fn load_theme(&self) -> Theme {
        parse_or_default(THEME_KEY, read_raw(THEME_KEY))
    }

    fn save_options(&mut self, options: &OptionList) {
        if let Err(err) = LocalStorage::set(OPTIONS_KEY, options) {
            warn!("Failed to persist options: {}", err);
        }
    }

    fn save_mode(&mut self, mode: Mode) {
        write_raw(MODE_KEY, mode.as_str());
    }

    fn save_theme(&mut self, theme: Theme) {
        write_raw(THEME_KEY, theme.as_attr());
    }
}

fn read_raw(key: &str) -> Option<String> {
    match LocalStorage::raw().get_item(key) {
        Ok(value) => value,
        Err(err) => {
            warn!("Could not read {}: {:?}", key, err);
            None
        }
    }
}

fn write_raw(key: &str, value: &str) {
    if let Err(err) = LocalStorage::raw().set_item(key, value) {
        warn!("Failed to persist {}: {:?}", key, err);
    }
}

fn parse_or_default<T>(key: &str, raw: Option<String>) -> T
where
    T: std::str::FromStr + Default,
{
    let Some(raw) = raw else {
        return T::default();
    };
    match raw.parse() {
        Ok(value) => value,
        Err(_) => {
            warn!("Ignoring unexpected {} value {:?}", key, raw);
            T::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl Persistence for MemoryStore {
    fn load_options(&self) -> OptionList {
        let Some(raw) = self.raw(OPTIONS_KEY) else {
            return OptionList::new();
        };
        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(items) => OptionList::restore(items),
            Err(err) => {
                warn!("Falling back to an empty option list: {}", err);
                OptionList::new()
            }
        }
    }

    fn load_mode(&self) -> Mode {
        parse_or_default(MODE_KEY, self.raw(MODE_KEY).map(str::to_string))
    }

    fn load_theme(&self) -> Theme {
        parse_or_default(THEME_KEY, self.raw(THEME_KEY).map(str::to_string))
    }

    fn save_options(&mut self, options: &OptionList) {
        match serde_json::to_string(options) {
            Ok(json) => {
                self.entries.insert(OPTIONS_KEY.to_string(), json);
            }
            Err(err) => warn!("Failed to persist options: {}", err),
        }
    }

    fn save_mode(&mut self, mode: Mode) {
        self.entries
            .insert(MODE_KEY.to_string(), mode.as_str().to_string());
    }

    fn save_theme(&mut self, theme: Theme) {
        self.entries
            .insert(THEME_KEY.to_string(), theme.as_attr().to_string());
    }
}
