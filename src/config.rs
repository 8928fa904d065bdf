// ⚙️ Configuration - storage location, calendar, export file
//
// Sources, later wins:
//   1. built-in defaults (SQLite at meal-tracker.db under the default key, Fall 2024 calendar)
//   2. JSON config file: $MEAL_TRACKER_CONFIG, else ./meal-tracker.json if present
//   3. environment: MEAL_TRACKER_DB, MEAL_TRACKER_TODAY

use crate::calendar::Calendar;
use crate::error::{TrackerError, TrackerResult};
use crate::storage::{JsonFileStorage, LedgerStorage, MemoryStorage, SqliteStorage, STORAGE_KEY};
use anyhow::Result;
use chrono::NaiveDate;
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "MEAL_TRACKER_CONFIG";
pub const DB_ENV: &str = "MEAL_TRACKER_DB";
pub const TODAY_ENV: &str = "MEAL_TRACKER_TODAY";

pub const DEFAULT_CONFIG_FILE: &str = "meal-tracker.json";
pub const DEFAULT_DB_FILE: &str = "meal-tracker.db";
pub const DEFAULT_EXPORT_FILE: &str = "meal_plan_data.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Sqlite,
    JsonFile,
    Memory,
}

impl StorageBackend {
    /// `.json` paths get the JSON file backend, anything else SQLite
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => StorageBackend::JsonFile,
            _ => StorageBackend::Sqlite,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerConfig {
    pub storage: StorageBackend,
    pub storage_path: PathBuf,

    /// Key the ledger is persisted under
    pub storage_key: String,
    pub export_file: PathBuf,
    pub calendar: Calendar,

    /// Pin "today" for reports instead of the local date
    pub today: Option<NaiveDate>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            storage: StorageBackend::Sqlite,
            storage_path: PathBuf::from(DEFAULT_DB_FILE),
            storage_key: STORAGE_KEY.to_string(),
            export_file: PathBuf::from(DEFAULT_EXPORT_FILE),
            calendar: Calendar::fall_2024(),
            today: None,
        }
    }
}

impl TrackerConfig {
    /// Load from the process environment and working directory
    pub fn load() -> TrackerResult<Self> {
        let path = std::env::var(CONFIG_ENV).ok().map(PathBuf::from).or_else(|| {
            let local = PathBuf::from(DEFAULT_CONFIG_FILE);
            local.exists().then_some(local)
        });

        let contents = match &path {
            Some(p) => {
                debug!("reading config from {}", p.display());
                Some(fs::read_to_string(p).map_err(|e| {
                    TrackerError::Config(format!("cannot read {}: {}", p.display(), e))
                })?)
            }
            None => None,
        };

        Self::from_sources(contents.as_deref(), |key| std::env::var(key).ok())
    }

    /// Build from optional config file contents plus an environment lookup
    pub fn from_sources<F>(file_contents: Option<&str>, env: F) -> TrackerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match file_contents {
            Some(json) => serde_json::from_str::<TrackerConfig>(json)
                .map_err(|e| TrackerError::Config(e.to_string()))?,
            None => TrackerConfig::default(),
        };

        if let Some(db) = env(DB_ENV).filter(|v| !v.trim().is_empty()) {
            let path = PathBuf::from(db.trim());
            config.storage = StorageBackend::for_path(&path);
            config.storage_path = path;
        }

        if let Some(today) = env(TODAY_ENV).filter(|v| !v.trim().is_empty()) {
            let date = NaiveDate::parse_from_str(today.trim(), "%Y-%m-%d").map_err(|e| {
                TrackerError::Config(format!("{} must be YYYY-MM-DD, got '{}': {}", TODAY_ENV, today, e))
            })?;
            config.today = Some(date);
        }

        if config.storage_key.trim().is_empty() {
            return Err(TrackerError::Config("storage_key must not be empty".to_string()));
        }

        Ok(config)
    }

    /// Pinned date, or the local calendar date
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    pub fn open_storage(&self) -> Result<Box<dyn LedgerStorage>> {
        let storage: Box<dyn LedgerStorage> = match self.storage {
            StorageBackend::Sqlite => Box::new(SqliteStorage::open(&self.storage_path, &self.storage_key)?),
            StorageBackend::JsonFile => {
                Box::new(JsonFileStorage::new(&self.storage_path).with_key(&self.storage_key))
            }
            StorageBackend::Memory => Box::new(MemoryStorage::new()),
        };
        Ok(storage)
    }
}
