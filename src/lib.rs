// Meal Tracker - Core Library
// Ledger merge engine + pacing analytics, used by the CLI and tests

pub mod error;
pub mod model;
pub mod currency;
pub mod parser;          // Statement HTML → MealPlans
pub mod deduplication;   // Transaction identity + dedup
pub mod reconciliation;  // Merge Engine: snapshot/import/clear
pub mod calendar;        // Enrollment periods, day counting
pub mod pacing;          // Pacing Analytics Engine
pub mod series;          // Chart series
pub mod storage;         // Persisted state backends
pub mod config;
pub mod tracker;         // State container

// Re-export commonly used types
pub use error::{TrackerError, TrackerResult};
pub use model::{
    Ledger, LedgerExport, MealOption, MealPlan, PlanKind, PlanTag, Transaction,
    ORIENTATION_BLOCKS,
};
pub use currency::parse_currency;
pub use parser::{StatementHtmlParser, StatementParser};
pub use deduplication::{dedup_transactions, find_duplicates, DedupResult, TransactionKey};
pub use reconciliation::{
    clear_all, export_ledger, import_ledger, merge_snapshot, reconcile, toggle_dark_mode,
    MergeSummary,
};
pub use calendar::{current_day_index, total_days, Calendar, EnrollmentPeriod};
pub use pacing::{compute_pacing, select_plan, PaceStatus, PacingReport, PlanSelection, ResourcePacing};
pub use series::{build_usage_series, SeriesKind, SeriesPoint, UsageSeries};
pub use storage::{JsonFileStorage, LedgerStorage, MemoryStorage, SqliteStorage, STORAGE_KEY};
pub use config::{StorageBackend, TrackerConfig};
pub use tracker::MealTracker;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
