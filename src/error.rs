// ⚠️ Error Types - what can go wrong between a snapshot and the ledger
//
// Nothing here is fatal: every variant leaves the ledger as it was.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    /// Snapshot could not be read or scraped at all
    #[error("failed to parse statement snapshot: {0}")]
    Parse(String),

    /// Well-formed snapshot, but no meal plan rows in it
    #[error("no meal plan data found in snapshot")]
    NoData,

    /// Imported ledger JSON was malformed
    #[error("failed to import ledger: {0}")]
    Import(#[from] serde_json::Error),

    /// Enrollment periods are out of order, overlapping or inverted
    #[error("invalid calendar: {0}")]
    Calendar(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// Load/save through the storage backend failed
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl TrackerError {
    /// Short status code for callers that only need to tell outcomes apart
    pub fn status(&self) -> &'static str {
        match self {
            TrackerError::Parse(_) => "error",
            TrackerError::NoData => "noData",
            TrackerError::Import(_) => "error",
            TrackerError::Calendar(_) => "error",
            TrackerError::Config(_) => "error",
            TrackerError::Storage(_) => "error",
        }
    }
}

pub type TrackerResult<T> = std::result::Result<T, TrackerError>;
