// 💾 Ledger Storage - where the ledger lives between runs
//
// The tracker only ever calls two things: load once at startup, save after
// every mutation. Backends:
//   - MemoryStorage:   tests / embedding, nothing touches disk
//   - JsonFileStorage: single JSON document with a {key, state, version} envelope
//   - SqliteStorage:   key/value table, WAL mode

use crate::model::Ledger;
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default key the ledger is stored under
pub const STORAGE_KEY: &str = "cmu-meal-tracker-storage";

/// Schema version written alongside the persisted state
pub const STATE_VERSION: u32 = 0;

pub trait LedgerStorage {
    /// None when nothing has been persisted yet
    fn load(&self) -> Result<Option<Ledger>>;

    fn save(&mut self, ledger: &Ledger) -> Result<()>;

    /// Short description for logs
    fn describe(&self) -> String;

    /// When the stored ledger was last written (RFC 3339), if the backend tracks it
    fn last_saved_at(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

impl<S: LedgerStorage + ?Sized> LedgerStorage for Box<S> {
    fn load(&self) -> Result<Option<Ledger>> {
        (**self).load()
    }

    fn save(&mut self, ledger: &Ledger) -> Result<()> {
        (**self).save(ledger)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }

    fn last_saved_at(&self) -> Result<Option<String>> {
        (**self).last_saved_at()
    }
}

/// Persisted document: `{ "key": <storage key>, "state": <ledger>, "version": 0 }`
#[derive(Debug, Serialize, Deserialize)]
struct PersistedState {
    /// Absent in documents written before keys were recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    state: Ledger,
    #[serde(default)]
    version: u32,
}

fn encode(key: &str, ledger: &Ledger) -> Result<String> {
    let doc = PersistedState {
        key: Some(key.to_string()),
        state: ledger.clone(),
        version: STATE_VERSION,
    };
    serde_json::to_string(&doc).context("Failed to serialize ledger")
}

fn decode(key: &str, json: &str) -> Result<Ledger> {
    let doc: PersistedState =
        serde_json::from_str(json).context("Failed to deserialize persisted ledger")?;
    if let Some(stored) = doc.key.as_deref().filter(|k| *k != key) {
        return Err(anyhow!(
            "persisted ledger belongs to storage key '{}', expected '{}'",
            stored,
            key
        ));
    }
    if doc.version > STATE_VERSION {
        return Err(anyhow!(
            "persisted ledger version {} is newer than supported version {}",
            doc.version,
            STATE_VERSION
        ));
    }
    Ok(doc.state)
}

// ============================================================================
// MEMORY
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryStorage {
    stored: Option<String>,
    saves: usize,
    fail_saves: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }

    /// Pre-populated, as if a previous run had saved `ledger`
    pub fn with_ledger(ledger: &Ledger) -> Result<Self> {
        Ok(MemoryStorage {
            stored: Some(encode(STORAGE_KEY, ledger)?),
            ..MemoryStorage::default()
        })
    }

    /// Every save returns an error; for exercising failure paths
    pub fn failing() -> Self {
        MemoryStorage {
            fail_saves: true,
            ..MemoryStorage::default()
        }
    }

    pub fn save_count(&self) -> usize {
        self.saves
    }

    pub fn raw(&self) -> Option<&str> {
        self.stored.as_deref()
    }
}

impl LedgerStorage for MemoryStorage {
    fn load(&self) -> Result<Option<Ledger>> {
        self.stored
            .as_deref()
            .map(|json| decode(STORAGE_KEY, json))
            .transpose()
    }

    fn save(&mut self, ledger: &Ledger) -> Result<()> {
        if self.fail_saves {
            return Err(anyhow!("memory storage is configured to fail"));
        }
        self.stored = Some(encode(STORAGE_KEY, ledger)?);
        self.saves += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

// ============================================================================
// JSON FILE
// ============================================================================

#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
    key: String,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStorage {
            path: path.into(),
            key: STORAGE_KEY.to_string(),
        }
    }

    pub fn with_key(mut self, key: &str) -> Self {
        self.key = key.to_string();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<Ledger>> {
        if !self.path.exists() {
            debug!("no ledger file at {}", self.path.display());
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read ledger file: {}", self.path.display()))?;
        decode(&self.key, &json)
            .with_context(|| format!("Corrupt ledger file: {}", self.path.display()))
            .map(Some)
    }

    fn save(&mut self, ledger: &Ledger) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        // Write-then-rename so a crash never leaves a half-written ledger
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, encode(&self.key, ledger)?)
            .with_context(|| format!("Failed to write ledger file: {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace ledger file: {}", self.path.display()))?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("json file {} [{}]", self.path.display(), self.key)
    }
}

// ============================================================================
// SQLITE
// ============================================================================

pub struct SqliteStorage {
    conn: Connection,
    key: String,
    label: String,
}

impl SqliteStorage {
    pub fn open(path: &Path, key: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        // Enable WAL mode for crash recovery
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;

        Self::with_connection(conn, key, format!("sqlite {} [{}]", path.display(), key))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, STORAGE_KEY, "sqlite :memory:".to_string())
    }

    pub fn with_connection(conn: Connection, key: &str, label: String) -> Result<Self> {
        setup_database(&conn)?;
        Ok(SqliteStorage {
            conn,
            key: key.to_string(),
            label,
        })
    }

}

pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

impl LedgerStorage for SqliteStorage {
    fn load(&self) -> Result<Option<Ledger>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![self.key],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to read ledger row")?;

        value.as_deref().map(|json| decode(&self.key, json)).transpose()
    }

    fn save(&mut self, ledger: &Ledger) -> Result<()> {
        let json = encode(&self.key, ledger)?;
        self.conn
            .execute(
                "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![self.key, json, Utc::now().to_rfc3339()],
            )
            .context("Failed to write ledger row")?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.label.clone()
    }

    fn last_saved_at(&self) -> Result<Option<String>> {
        let ts = self
            .conn
            .query_row(
                "SELECT updated_at FROM kv_store WHERE key = ?1",
                params![self.key],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to read ledger timestamp")?;
        Ok(ts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MealOption, MealPlan, Transaction};

    fn sample_ledger() -> Ledger {
        Ledger {
            dark_mode: true,
            meal_plans: vec![MealPlan::new("08/20/2024", "Red Meal Plan", "190 Meals")
                .with_transactions(vec![Transaction::new("Schatz", "09/01/2024", "1", "1")])],
            current_meal_option: Some(MealOption::Red),
        }
    }

    #[test]
    fn test_memory_round_trip() {
        let mut storage = MemoryStorage::new();
        assert!(storage.load().unwrap().is_none());

        storage.save(&sample_ledger()).unwrap();
        assert_eq!(storage.load().unwrap(), Some(sample_ledger()));
        assert_eq!(storage.save_count(), 1);
        assert!(storage.raw().unwrap().contains("\"version\":0"));
        assert!(storage.raw().unwrap().contains("\"key\":\"cmu-meal-tracker-storage\""));
    }

    #[test]
    fn test_sqlite_round_trip_and_overwrite() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        assert!(storage.load().unwrap().is_none());
        assert!(storage.last_saved_at().unwrap().is_none());

        storage.save(&Ledger::new()).unwrap();
        storage.save(&sample_ledger()).unwrap();

        assert_eq!(storage.load().unwrap(), Some(sample_ledger()));
        assert!(storage.last_saved_at().unwrap().is_some());

        let rows: i64 = storage
            .conn
            .query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);

        println!("✅ SQLite storage round trip passed");
    }

    #[test]
    fn test_json_file_round_trip() {
        let dir = std::env::temp_dir().join(format!("meal-tracker-test-{}", std::process::id()));
        let path = dir.join("ledger.json");
        let _ = fs::remove_file(&path);

        let mut storage = JsonFileStorage::new(&path);
        assert!(storage.load().unwrap().is_none());

        storage.save(&sample_ledger()).unwrap();
        assert_eq!(storage.load().unwrap(), Some(sample_ledger()));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_corrupt_or_future_state_is_an_error() {
        assert!(decode(STORAGE_KEY, "{not json").is_err());
        assert!(decode(STORAGE_KEY, r#"{"state": {}, "version": 99}"#).is_err());
        assert_eq!(decode(STORAGE_KEY, r#"{"state": {}}"#).unwrap(), Ledger::new());
    }

    #[test]
    fn test_json_file_envelope_records_key() {
        let dir = std::env::temp_dir().join(format!("meal-tracker-key-test-{}", std::process::id()));
        let path = dir.join("ledger.json");
        let _ = fs::remove_file(&path);

        let mut storage = JsonFileStorage::new(&path).with_key("spring-2025");
        storage.save(&sample_ledger()).unwrap();

        let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["key"], "spring-2025");
        assert_eq!(doc["version"], 0);
        assert_eq!(storage.load().unwrap(), Some(sample_ledger()));

        // Same file read under another key is refused
        assert!(JsonFileStorage::new(&path).load().is_err());

        let _ = fs::remove_dir_all(&dir);
        println!("✅ JSON envelope carries its storage key");
    }

    #[test]
    fn test_sqlite_keys_are_independent() {
        let conn = Connection::open_in_memory().unwrap();
        let mut storage = SqliteStorage::with_connection(conn, "spring-2025", "sqlite test".to_string()).unwrap();
        storage.save(&sample_ledger()).unwrap();

        let stored_under: String = storage
            .conn
            .query_row("SELECT key FROM kv_store", [], |row| row.get(0))
            .unwrap();
        assert_eq!(stored_under, "spring-2025");

        let value: String = storage
            .conn
            .query_row("SELECT value FROM kv_store", [], |row| row.get(0))
            .unwrap();
        assert!(value.contains("\"key\":\"spring-2025\""));

        assert!(MemoryStorage::new().last_saved_at().unwrap().is_none());
    }

    #[test]
    fn test_failing_storage() {
        let mut storage = MemoryStorage::failing();
        assert!(storage.save(&Ledger::new()).is_err());
        assert_eq!(storage.save_count(), 0);
    }
}
