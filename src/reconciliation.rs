// ⚖️ Ledger Reconciliation - fold statement snapshots into the ledger
//
// Every operation here takes the current ledger by value and returns the next
// one. No I/O: persistence is the tracker's job.
//
// Merge rule, per incoming plan:
//   known (start date, name) → take the new balance, append transactions, dedup
//   unknown                  → insert (deduped)
// Then the meal option is re-inferred from the incoming plan names: the last
// plan naming a tier wins, no match keeps the previous option.

use crate::deduplication::dedup_transactions;
use crate::model::{Ledger, LedgerExport, MealOption, MealPlan};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

// ============================================================================
// MERGE SUMMARY
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeSummary {
    pub plans_added: usize,
    pub plans_updated: usize,
    pub transactions_added: usize,
    pub duplicates_skipped: usize,

    /// Tier inferred from this batch, if any plan named one
    pub detected_option: Option<MealOption>,
}

impl MergeSummary {
    pub fn summary(&self) -> String {
        let detected = self
            .detected_option
            .map(|o| o.name().to_string())
            .unwrap_or_else(|| "none".to_string());
        format!(
            "{} plans added, {} updated, {} new transactions, {} duplicates skipped, detected option: {}",
            self.plans_added,
            self.plans_updated,
            self.transactions_added,
            self.duplicates_skipped,
            detected
        )
    }
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// Merge a batch of plans into the ledger and report what changed
pub fn reconcile(mut ledger: Ledger, incoming: Vec<MealPlan>) -> (Ledger, MergeSummary) {
    let mut summary = MergeSummary::default();

    for plan in incoming {
        if let Some(tier) = plan.tag().tier {
            summary.detected_option = Some(tier);
        }

        match ledger.meal_plans.iter_mut().find(|p| p.same_identity(&plan)) {
            Some(existing) => {
                // A loaded ledger may already hold repeats; collapse them first
                let stored = dedup_transactions(std::mem::take(&mut existing.transactions));
                if stored.removed > 0 {
                    warn!(
                        "plan '{}' ({}) held {} duplicate transactions, collapsed",
                        existing.plan_name(),
                        existing.start_date(),
                        stored.removed
                    );
                }
                let before = stored.transactions.len();
                let incoming_count = plan.transactions.len();

                existing.current_balance = plan.current_balance;
                let mut combined = stored.transactions;
                combined.extend(plan.transactions);
                let deduped = dedup_transactions(combined);
                existing.transactions = deduped.transactions;

                let added = existing.transactions.len().saturating_sub(before);
                summary.transactions_added += added;
                summary.duplicates_skipped += incoming_count - added;
                summary.plans_updated += 1;

                debug!(
                    "updated plan '{}' ({}): +{} transactions",
                    existing.plan_name(),
                    existing.start_date(),
                    added
                );
            }
            None => {
                let mut plan = plan;
                let deduped = dedup_transactions(std::mem::take(&mut plan.transactions));
                plan.transactions = deduped.transactions;

                summary.transactions_added += plan.transactions.len();
                summary.duplicates_skipped += deduped.removed;
                summary.plans_added += 1;

                debug!(
                    "added plan '{}' ({}) with {} transactions",
                    plan.plan_name(),
                    plan.start_date(),
                    plan.transactions.len()
                );
                ledger.meal_plans.push(plan);
            }
        }
    }

    if let Some(option) = summary.detected_option {
        ledger.current_meal_option = Some(option);
    }

    info!("merged snapshot: {}", summary.summary());
    (ledger, summary)
}

/// Apply one scraped snapshot to the ledger
pub fn merge_snapshot(ledger: Ledger, incoming: Vec<MealPlan>) -> Ledger {
    reconcile(ledger, incoming).0
}

/// Merge an exported ledger back in, through the same rule as snapshots
pub fn import_ledger(ledger: Ledger, external: LedgerExport) -> Ledger {
    reconcile(ledger, external.meal_plans).0
}

/// Forget every plan and the inferred option; display preference survives
pub fn clear_all(ledger: Ledger) -> Ledger {
    info!(
        "clearing {} plans ({} transactions)",
        ledger.meal_plans.len(),
        ledger.transaction_count()
    );
    Ledger {
        dark_mode: ledger.dark_mode,
        meal_plans: Vec::new(),
        current_meal_option: None,
    }
}

pub fn toggle_dark_mode(mut ledger: Ledger) -> Ledger {
    ledger.dark_mode = !ledger.dark_mode;
    ledger
}

/// Indented `{ "mealPlans": [...] }` document
pub fn export_ledger(ledger: &Ledger) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&LedgerExport::from(ledger))
}

// ============================================================================
// TESTS
// ============================================================================
