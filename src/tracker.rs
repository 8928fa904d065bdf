// 🧭 Meal Tracker - the state container the presentation layer talks to
//
// Lifecycle: load from storage on open, then every mutation computes the next
// ledger with the pure functions in `reconciliation`, persists it, and only
// then swaps it in. A failed save leaves the in-memory ledger untouched.

use crate::calendar::Calendar;
use crate::error::{TrackerError, TrackerResult};
use crate::model::{Ledger, LedgerExport, MealOption, MealPlan};
use crate::pacing::{compute_pacing, select_plan, PacingReport};
use crate::parser::{StatementHtmlParser, StatementParser};
use crate::reconciliation::{self, MergeSummary};
use crate::series::{build_usage_series, SeriesKind, UsageSeries};
use crate::storage::LedgerStorage;
use chrono::NaiveDate;
use log::{info, warn};

pub struct MealTracker<S: LedgerStorage> {
    storage: S,
    ledger: Ledger,
    calendar: Calendar,
    parser: StatementHtmlParser,
}

impl<S: LedgerStorage> MealTracker<S> {
    /// Hydrate from storage; an empty store starts an empty ledger
    pub fn open(storage: S, calendar: Calendar) -> TrackerResult<Self> {
        let ledger = match storage.load()? {
            Some(ledger) => {
                info!(
                    "loaded ledger from {}: {} plans, {} transactions",
                    storage.describe(),
                    ledger.meal_plans.len(),
                    ledger.transaction_count()
                );
                ledger
            }
            None => {
                info!("no saved ledger in {}, starting empty", storage.describe());
                Ledger::new()
            }
        };

        Ok(MealTracker {
            storage,
            ledger,
            calendar,
            parser: StatementHtmlParser::new()?,
        })
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn commit(&mut self, next: Ledger) -> TrackerResult<()> {
        if let Err(e) = self.storage.save(&next) {
            warn!("failed to persist ledger to {}: {:#}", self.storage.describe(), e);
            return Err(e.into());
        }
        self.ledger = next;
        Ok(())
    }

    // ========================================================================
    // MUTATORS
    // ========================================================================

    /// Scrape a statement page and merge it in.
    ///
    /// `TrackerError::NoData` when the page has no plan rows; the ledger is
    /// left as it was in every error case.
    pub fn merge_snapshot(&mut self, html: &str) -> TrackerResult<MergeSummary> {
        let plans = self.parser.parse(html)?;
        self.merge_plans(plans)
    }

    /// Same as `merge_snapshot`, for raw file contents
    pub fn merge_snapshot_bytes(&mut self, bytes: &[u8]) -> TrackerResult<MergeSummary> {
        let plans = self.parser.parse_bytes(bytes)?;
        self.merge_plans(plans)
    }

    fn merge_plans(&mut self, plans: Vec<MealPlan>) -> TrackerResult<MergeSummary> {
        if plans.is_empty() {
            return Err(TrackerError::NoData);
        }
        let (next, summary) = reconciliation::reconcile(self.ledger.clone(), plans);
        self.commit(next)?;
        Ok(summary)
    }

    /// Merge a previously exported `{ "mealPlans": [...] }` document
    pub fn import_ledger(&mut self, json: &str) -> TrackerResult<MergeSummary> {
        let external: LedgerExport = serde_json::from_str(json)?;
        let (next, summary) = reconciliation::reconcile(self.ledger.clone(), external.meal_plans);
        self.commit(next)?;
        Ok(summary)
    }

    pub fn clear_all(&mut self) -> TrackerResult<()> {
        let next = reconciliation::clear_all(self.ledger.clone());
        self.commit(next)
    }

    /// Returns the new setting
    pub fn toggle_dark_mode(&mut self) -> TrackerResult<bool> {
        let next = reconciliation::toggle_dark_mode(self.ledger.clone());
        self.commit(next)?;
        Ok(self.ledger.dark_mode)
    }

    // ========================================================================
    // READ ACCESSORS
    // ========================================================================

    pub fn export_ledger(&self) -> TrackerResult<String> {
        Ok(reconciliation::export_ledger(&self.ledger)?)
    }

    pub fn current_meal_option(&self) -> Option<MealOption> {
        self.ledger.current_meal_option
    }

    pub fn day_index(&self, today: NaiveDate) -> u32 {
        self.calendar.current_day_index(today)
    }

    /// None until a meal option has been inferred
    pub fn pacing_report(&self, today: NaiveDate) -> Option<PacingReport> {
        let option = self.ledger.current_meal_option?;
        Some(compute_pacing(
            option,
            &self.ledger.meal_plans,
            self.day_index(today),
            self.calendar.total_days(),
        ))
    }

    /// None until a meal option has been inferred
    pub fn usage_series(&self, kind: SeriesKind, today: NaiveDate) -> Option<UsageSeries> {
        let option = self.ledger.current_meal_option?;
        let plan = select_plan(&self.ledger.meal_plans, option, kind.plan_kind()).plan;
        Some(build_usage_series(
            plan,
            kind.budget(option),
            kind,
            self.day_index(today),
            self.calendar.total_days(),
        ))
    }
}
