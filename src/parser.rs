// 🏗️ Statement Parser - scrape a meal plan statement page into MealPlans
//
// A statement page carries:
//   - a plans table, one data row per sub-account (start date, name, balance)
//   - a transactions table for ONE plan only: whichever is selected in the
//     plan picker (`<option selected>`)
//
// Extraction is best effort: missing cells become "", never errors.

use crate::error::{TrackerError, TrackerResult};
use crate::model::{MealPlan, Transaction};
use log::debug;
use scraper::{ElementRef, Html, Selector};

// ============================================================================
// PARSER TRAIT
// ============================================================================

/// StatementParser - turns raw snapshot text into meal plans
///
/// An empty Vec means "no recognizable data"; callers must not treat it as
/// a successful import.
pub trait StatementParser {
    fn parse(&self, html: &str) -> TrackerResult<Vec<MealPlan>>;

    /// Human-readable name for logs
    fn name(&self) -> &str;

    /// Parser version (for provenance in logs)
    fn version(&self) -> &str {
        "1.0.0"
    }

    /// Decode raw bytes first; invalid UTF-8 is a hard parse failure
    fn parse_bytes(&self, bytes: &[u8]) -> TrackerResult<Vec<MealPlan>> {
        let html = std::str::from_utf8(bytes)
            .map_err(|e| TrackerError::Parse(format!("snapshot is not valid UTF-8: {}", e)))?;
        self.parse(html)
    }
}

// ============================================================================
// PAGE LAYOUT
// ============================================================================

/// CSS selectors locating each field on the statement page
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StatementLayout {
    pub plan_rows: String,
    pub plan_start_date: String,
    pub plan_name: String,
    pub plan_balance: String,
    pub transaction_rows: String,
    pub transaction_location: String,
    pub transaction_date_time: String,
    pub transaction_requested: String,
    pub transaction_approved: String,
    pub selected_plan: String,
}

impl Default for StatementLayout {
    fn default() -> Self {
        StatementLayout {
            plan_rows: "#tbl-plans tr:not(.header-row)".to_string(),
            plan_start_date: ".column0".to_string(),
            plan_name: ".column1".to_string(),
            plan_balance: ".column2".to_string(),
            transaction_rows: "#tbl-trx tr:not(.header-row)".to_string(),
            transaction_location: "th".to_string(),
            transaction_date_time: "td:nth-child(2)".to_string(),
            transaction_requested: "td:nth-child(3)".to_string(),
            transaction_approved: "td:nth-child(4)".to_string(),
            selected_plan: "#select-plan option[selected]".to_string(),
        }
    }
}

// ============================================================================
// HTML PARSER
// ============================================================================

/// Statement parser for the campus dining account page
#[derive(Debug, Clone)]
pub struct StatementHtmlParser {
    plan_rows: Selector,
    plan_start_date: Selector,
    plan_name: Selector,
    plan_balance: Selector,
    transaction_rows: Selector,
    transaction_location: Selector,
    transaction_date_time: Selector,
    transaction_requested: Selector,
    transaction_approved: Selector,
    selected_plan: Selector,
}

fn compile(selector: &str) -> TrackerResult<Selector> {
    Selector::parse(selector)
        .map_err(|e| TrackerError::Parse(format!("invalid selector '{}': {:?}", selector, e)))
}

/// Trimmed text of the first match under `scope`, or "" when absent
fn cell_text(scope: ElementRef<'_>, selector: &Selector) -> String {
    scope
        .select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

impl StatementHtmlParser {
    pub fn new() -> TrackerResult<Self> {
        Self::with_layout(&StatementLayout::default())
    }

    pub(crate) fn with_layout(layout: &StatementLayout) -> TrackerResult<Self> {
        Ok(StatementHtmlParser {
            plan_rows: compile(&layout.plan_rows)?,
            plan_start_date: compile(&layout.plan_start_date)?,
            plan_name: compile(&layout.plan_name)?,
            plan_balance: compile(&layout.plan_balance)?,
            transaction_rows: compile(&layout.transaction_rows)?,
            transaction_location: compile(&layout.transaction_location)?,
            transaction_date_time: compile(&layout.transaction_date_time)?,
            transaction_requested: compile(&layout.transaction_requested)?,
            transaction_approved: compile(&layout.transaction_approved)?,
            selected_plan: compile(&layout.selected_plan)?,
        })
    }

    /// Extract plans from an already-parsed document.
    ///
    /// Every plan starts with no transactions. The transaction table is then
    /// attached in full to the first plan whose name equals the selected
    /// option's text; if nothing is selected, nothing is attached.
    pub fn extract_snapshot(&self, document: &Html) -> Vec<MealPlan> {
        let mut plans: Vec<MealPlan> = document
            .select(&self.plan_rows)
            .map(|row| {
                MealPlan::new(
                    &cell_text(row, &self.plan_start_date),
                    &cell_text(row, &self.plan_name),
                    &cell_text(row, &self.plan_balance),
                )
            })
            .collect();

        let transactions: Vec<Transaction> = document
            .select(&self.transaction_rows)
            .map(|row| Transaction {
                location: cell_text(row, &self.transaction_location),
                date_time: cell_text(row, &self.transaction_date_time),
                requested_amount: cell_text(row, &self.transaction_requested),
                approved_amount: cell_text(row, &self.transaction_approved),
            })
            .collect();

        let selected = document
            .select(&self.selected_plan)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string());

        match selected {
            Some(name) => match plans.iter_mut().find(|p| p.plan_name() == name) {
                Some(plan) => {
                    debug!(
                        "attaching {} transactions to selected plan '{}'",
                        transactions.len(),
                        name
                    );
                    plan.transactions = transactions;
                }
                None => debug!(
                    "selected plan '{}' not in plans table, dropping {} transactions",
                    name,
                    transactions.len()
                ),
            },
            None => debug!(
                "no selected plan, dropping {} transactions",
                transactions.len()
            ),
        }

        plans
    }
}

impl StatementParser for StatementHtmlParser {
    fn parse(&self, html: &str) -> TrackerResult<Vec<MealPlan>> {
        let document = Html::parse_document(html);
        let plans = self.extract_snapshot(&document);
        debug!("{} v{}: extracted {} plans", self.name(), self.version(), plans.len());
        Ok(plans)
    }

    fn name(&self) -> &str {
        "Statement HTML"
    }
}
