//! Persistent key-value settings.
//!
//! Values are strings, booleans or integers. Every read names its own default,
//! so a missing file, a missing key or a value of the wrong type all fall back
//! to that default. `FileSettings` keeps the whole map in memory and rewrites the
//! JSON file on each put.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use ticker_common::Result;

/// Keys used by the application.
pub mod keys {
    /// Last displayed symbol.
    pub const SYMBOL: &str = "symbol";
    /// Last displayed price, pre-formatted for a cold start.
    pub const PRICE: &str = "price";
    /// Provider credential.
    pub const API_KEY: &str = "apikey";
    /// Rotation enabled flag.
    pub const ROTATE_ON: &str = "rotate_on";
    /// Comma-delimited rotation list.
    pub const ROTATE_LIST: &str = "rotate_list";
    /// Rotation interval in minutes.
    pub const ROTATE_INTERVAL: &str = "rotate_int";
}

/// Stored value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Text value.
    Text(String),
}

/// Synchronous key-value store.
pub trait SettingsStore {
    /// Raw value for `key`.
    fn get(&self, key: &str) -> Option<SettingValue>;

    /// Store `value` under `key`.
    fn put(&mut self, key: &str, value: SettingValue) -> Result<()>;

    /// String value or `default`.
    fn get_string(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Some(SettingValue::Text(text)) => text,
            _ => default.to_string(),
        }
    }

    /// Boolean value or `default`.
    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(SettingValue::Bool(flag)) => flag,
            _ => default,
        }
    }

    /// Integer value or `default`.
    fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.get(key) {
            Some(SettingValue::Int(value)) => value,
            _ => default,
        }
    }

    /// Store a string.
    fn put_string(&mut self, key: &str, value: &str) -> Result<()> {
        self.put(key, SettingValue::Text(value.to_string()))
    }

    /// Store a boolean.
    fn put_bool(&mut self, key: &str, value: bool) -> Result<()> {
        self.put(key, SettingValue::Bool(value))
    }

    /// Store an integer.
    fn put_int(&mut self, key: &str, value: i64) -> Result<()> {
        self.put(key, SettingValue::Int(value))
    }
}

/// In-memory store.
#[derive(Debug, Default, Clone)]
pub struct MemorySettings {
    values: BTreeMap<String, SettingValue>,
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<SettingValue> {
        self.values.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: SettingValue) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// JSON file backed store.
#[derive(Debug)]
pub struct FileSettings {
    path: PathBuf,
    values: BTreeMap<String, SettingValue>,
}

impl FileSettings {
    /// Load `path`. A missing or unreadable file starts an empty store.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!("Ignoring unreadable settings file {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No settings file at {}, using defaults", path.display());
                BTreeMap::new()
            }
            Err(e) => {
                warn!("Failed to read settings file {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };
        Self { path, values }
    }

    fn flush(&self) -> Result<()> {
        let json = serde_json::to_vec_pretty(&self.values)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl SettingsStore for FileSettings {
    fn get(&self, key: &str) -> Option<SettingValue> {
        self.values.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: SettingValue) -> Result<()> {
        self.values.insert(key.to_string(), value);
        self.flush()
    }
}
