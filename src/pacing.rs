// 📈 Pacing Analytics - actual consumption vs. a flat linear depletion
//
// Ideal model: the whole budget drains evenly over the calendar's counted
// days. Blocks are counted from the block plan's transactions (one swipe each);
// flex dollars come straight from the flex plan's reported balance.
//
// Every ratio with a possibly-zero denominator is an Option: None means
// "not applicable yet", never NaN or infinity.

use crate::currency::parse_currency;
use crate::model::{MealOption, MealPlan, PlanKind};
use log::warn;
use serde::{Deserialize, Serialize};

// ============================================================================
// STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaceStatus {
    /// Used less than the ideal line allows by now
    Ahead,
    Behind,
}

impl PaceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PaceStatus::Ahead => "Ahead",
            PaceStatus::Behind => "Behind",
        }
    }
}

/// Division that refuses zero and non-finite results
fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let value = numerator / denominator;
    value.is_finite().then_some(value)
}

// ============================================================================
// PER-RESOURCE PACING
// ============================================================================

/// Pacing numbers for one resource (blocks or flex dollars), full precision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcePacing {
    pub budget: f64,
    pub remaining: f64,
    pub used: f64,
    pub ideal_per_day: Option<f64>,
    pub actual_per_day: Option<f64>,
    pub ideal_used_so_far: f64,
    pub status: PaceStatus,
    /// |used − ideal_used_so_far|
    pub delta: f64,
    pub projected_per_day_from_now: Option<f64>,
}

impl ResourcePacing {
    pub fn compute(budget: f64, remaining: f64, day_index: u32, total_days: u32) -> Self {
        let day = day_index as f64;
        let total = total_days as f64;
        let used = budget - remaining;

        let ideal_used_so_far = match ratio(total - day, total) {
            Some(share_left) => budget - budget * share_left,
            None => 0.0,
        };

        let status = if used < ideal_used_so_far {
            PaceStatus::Ahead
        } else {
            PaceStatus::Behind
        };

        ResourcePacing {
            budget,
            remaining,
            used,
            ideal_per_day: ratio(budget, total),
            actual_per_day: ratio(used, day),
            ideal_used_so_far,
            status,
            delta: (used - ideal_used_so_far).abs(),
            projected_per_day_from_now: ratio(remaining, total - day),
        }
    }
}

// ============================================================================
// PLAN SELECTION
// ============================================================================

/// First plan matching a tier/kind, plus how many plans matched
#[derive(Debug, Clone, Copy)]
pub struct PlanSelection<'a> {
    pub plan: Option<&'a MealPlan>,
    pub candidates: usize,
}

impl PlanSelection<'_> {
    pub fn is_ambiguous(&self) -> bool {
        self.candidates > 1
    }
}

pub fn select_plan(plans: &[MealPlan], tier: MealOption, kind: PlanKind) -> PlanSelection<'_> {
    let mut matching = plans.iter().filter(|p| p.tag().matches(tier, kind));
    let plan = matching.next();
    PlanSelection {
        plan,
        candidates: plan.map_or(0, |_| 1 + matching.count()),
    }
}

/// Mean approved amount across the block plan's swipes
pub fn average_value_per_block(block_plan: &MealPlan) -> Option<f64> {
    let total: f64 = block_plan
        .transactions
        .iter()
        .map(|t| parse_currency(&t.approved_amount))
        .sum();
    ratio(total, block_plan.transactions.len() as f64)
}

// ============================================================================
// PACING REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacingReport {
    pub option: MealOption,
    pub day_index: u32,
    pub total_days: u32,

    /// None when the ledger has no block plan for this tier
    pub blocks: Option<ResourcePacing>,

    /// None when the ledger has no flex plan for this tier
    pub flex: Option<ResourcePacing>,

    pub average_value_per_block: Option<f64>,

    /// More than one plan fit the block/flex selection; the first was used
    pub ambiguous_block_plan: bool,
    pub ambiguous_flex_plan: bool,
}

impl PacingReport {
    /// "Ahead by 8.4 blocks"
    pub fn blocks_status(&self) -> Option<String> {
        self.blocks
            .as_ref()
            .map(|b| format!("{} by {:.1} blocks", b.status.label(), b.delta))
    }

    /// "Behind by $12.34"
    pub fn flex_status(&self) -> Option<String> {
        self.flex
            .as_ref()
            .map(|f| format!("{} by ${:.2}", f.status.label(), f.delta))
    }

    pub fn remaining_days(&self) -> u32 {
        self.total_days.saturating_sub(self.day_index)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} plan, day {} of {}: blocks {}, flex {}",
            self.option,
            self.day_index,
            self.total_days,
            self.blocks_status().unwrap_or_else(|| "n/a".to_string()),
            self.flex_status().unwrap_or_else(|| "n/a".to_string()),
        )
    }
}

/// Pace the given tier's block and flex plans against the calendar position
pub fn compute_pacing(
    option: MealOption,
    plans: &[MealPlan],
    day_index: u32,
    total_days: u32,
) -> PacingReport {
    let block_sel = select_plan(plans, option, PlanKind::Block);
    let flex_sel = select_plan(plans, option, PlanKind::Flex);

    if block_sel.is_ambiguous() {
        warn!(
            "{} {} block plans match, using '{}'",
            block_sel.candidates,
            option,
            block_sel.plan.map(|p| p.plan_name()).unwrap_or_default()
        );
    }
    if flex_sel.is_ambiguous() {
        warn!(
            "{} {} flex plans match, using '{}'",
            flex_sel.candidates,
            option,
            flex_sel.plan.map(|p| p.plan_name()).unwrap_or_default()
        );
    }

    let blocks = block_sel.plan.map(|plan| {
        let budget = option.total_blocks() as f64;
        let remaining = budget - plan.transactions.len() as f64;
        ResourcePacing::compute(budget, remaining, day_index, total_days)
    });

    let flex = flex_sel.plan.map(|plan| {
        let remaining = parse_currency(&plan.current_balance);
        ResourcePacing::compute(option.total_flex_dollars(), remaining, day_index, total_days)
    });

    PacingReport {
        option,
        day_index,
        total_days,
        blocks,
        flex,
        average_value_per_block: block_sel.plan.and_then(average_value_per_block),
        ambiguous_block_plan: block_sel.is_ambiguous(),
        ambiguous_flex_plan: flex_sel.is_ambiguous(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Transaction;

    fn block_plan(name: &str, swipes: usize) -> MealPlan {
        let transactions = (0..swipes)
            .map(|i| Transaction::new("Schatz", &format!("swipe {}", i), "1", "$9.00"))
            .collect();
        MealPlan::new("08/20/2024", name, "").with_transactions(transactions)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_ahead_of_pace_blocks() {
        // 286 budget, 136 used by day 50 of 99
        let plans = vec![block_plan("Green Meal Plan", 136)];
        let report = compute_pacing(MealOption::Green, &plans, 50, 99);
        let blocks = report.blocks.clone().unwrap();

        assert_eq!(blocks.remaining, 150.0);
        assert_eq!(blocks.used, 136.0);
        assert!(close(blocks.ideal_used_so_far, 286.0 * 50.0 / 99.0));
        assert_eq!(blocks.status, PaceStatus::Ahead);
        assert!((blocks.delta - 8.4444).abs() < 1e-3);
        assert!(close(blocks.ideal_per_day.unwrap(), 286.0 / 99.0));
        assert!(close(blocks.actual_per_day.unwrap(), 136.0 / 50.0));
        assert!(close(blocks.projected_per_day_from_now.unwrap(), 150.0 / 49.0));
        assert_eq!(report.blocks_status().unwrap(), "Ahead by 8.4 blocks");

        println!("✅ {}", report.summary());
    }

    #[test]
    fn test_behind_on_flex_uses_reported_balance() {
        // Transactions are ignored for flex; only the balance counts
        let plans = vec![MealPlan::new("08/20/2024", "Blue Flex Dollars", "$100.00")
            .with_transactions(vec![Transaction::new("Entropy", "t", "$3.00", "$3.00")])];

        let report = compute_pacing(MealOption::Blue, &plans, 10, 100);
        let flex = report.flex.clone().unwrap();

        // 520 budget, 420 used, ideal 52 by day 10
        assert_eq!(flex.remaining, 100.0);
        assert_eq!(flex.status, PaceStatus::Behind);
        assert!(close(flex.delta, 368.0));
        assert_eq!(report.flex_status().unwrap(), "Behind by $368.00");
        assert!(report.blocks.is_none());
    }

    #[test]
    fn test_day_zero_has_no_actual_rate() {
        let plans = vec![block_plan("Red Meal Plan", 0)];
        let report = compute_pacing(MealOption::Red, &plans, 0, 99);
        let blocks = report.blocks.unwrap();

        assert_eq!(blocks.actual_per_day, None);
        assert_eq!(blocks.ideal_used_so_far, 0.0);
        assert_eq!(blocks.status, PaceStatus::Behind);
        assert_eq!(blocks.delta, 0.0);
    }

    #[test]
    fn test_fully_elapsed_has_no_projection() {
        let plans = vec![block_plan("Red Meal Plan", 10)];
        let report = compute_pacing(MealOption::Red, &plans, 99, 99);
        let blocks = report.blocks.unwrap();

        assert_eq!(blocks.projected_per_day_from_now, None);
        assert!(close(blocks.ideal_used_so_far, 199.0));
        assert_eq!(blocks.status, PaceStatus::Ahead);
    }

    #[test]
    fn test_empty_calendar_is_not_a_crash() {
        let plans = vec![block_plan("Green Meal Plan", 3)];
        let blocks = compute_pacing(MealOption::Green, &plans, 0, 0).blocks.unwrap();

        assert_eq!(blocks.ideal_per_day, None);
        assert_eq!(blocks.actual_per_day, None);
        assert_eq!(blocks.projected_per_day_from_now, None);
    }

    #[test]
    fn test_guest_and_other_tiers_are_excluded() {
        let plans = vec![
            block_plan("Green Guest Meals", 4),
            block_plan("Blue Meal Plan", 7),
            block_plan("Green Meal Plan", 2),
        ];
        let report = compute_pacing(MealOption::Green, &plans, 10, 99);

        assert_eq!(report.blocks.unwrap().used, 2.0);
        assert!(!report.ambiguous_block_plan);
    }

    #[test]
    fn test_ambiguous_block_plan_uses_first_and_flags() {
        let plans = vec![
            block_plan("Green Meal Plan", 5),
            block_plan("Green Meal Plan 2", 9),
        ];
        let report = compute_pacing(MealOption::Green, &plans, 10, 99);

        assert!(report.ambiguous_block_plan);
        assert_eq!(report.blocks.unwrap().used, 5.0);
    }

    #[test]
    fn test_average_value_per_block_skips_bad_amounts() {
        let plan = MealPlan::new("d", "Green Meal Plan", "").with_transactions(vec![
            Transaction::new("a", "1", "", "$10.00"),
            Transaction::new("b", "2", "", "n/a"),
            Transaction::new("c", "3", "", "$8.00"),
        ]);

        assert!(close(average_value_per_block(&plan).unwrap(), 6.0));
        assert_eq!(average_value_per_block(&MealPlan::new("d", "Green Meal Plan", "")), None);
    }
}
