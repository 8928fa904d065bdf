// 📉 Usage Series - chart data for remaining blocks / flex dollars
//
// Two lines per chart:
//   ideal  - straight ramp from the full budget on day 0 to zero on the last day
//   actual - one step per transaction, in transaction order (statement dates
//            are not reliably parseable, so steps are not date-aligned)

use crate::currency::parse_currency;
use crate::model::{MealOption, MealPlan, PlanKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesKind {
    Blocks,
    Flex,
}

impl SeriesKind {
    pub fn plan_kind(&self) -> PlanKind {
        match self {
            SeriesKind::Blocks => PlanKind::Block,
            SeriesKind::Flex => PlanKind::Flex,
        }
    }

    pub fn budget(&self, option: MealOption) -> f64 {
        match self {
            SeriesKind::Blocks => option.total_blocks() as f64,
            SeriesKind::Flex => option.total_flex_dollars(),
        }
    }

    /// Amount one transaction takes off the remaining budget
    fn step(&self, approved_amount: &str) -> f64 {
        match self {
            SeriesKind::Blocks => 1.0,
            SeriesKind::Flex => parse_currency(approved_amount),
        }
    }
}

impl FromStr for SeriesKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "blocks" | "block" => Ok(SeriesKind::Blocks),
            "flex" => Ok(SeriesKind::Flex),
            other => Err(format!("unknown series '{}' (expected blocks or flex)", other)),
        }
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesKind::Blocks => f.write_str("blocks"),
            SeriesKind::Flex => f.write_str("flex"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub x: u32,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSeries {
    pub kind: SeriesKind,
    pub ideal: Vec<SeriesPoint>,
    pub actual: Vec<SeriesPoint>,
    /// Calendar position, for a "today" marker
    pub current_day: u32,
}

/// Ideal ramp sampled at every day 0..=total_days; empty for an empty calendar
pub fn ideal_series(budget: f64, total_days: u32) -> Vec<SeriesPoint> {
    if total_days == 0 {
        return Vec::new();
    }
    let per_day = budget / total_days as f64;
    (0..=total_days)
        .map(|day| SeriesPoint {
            x: day,
            y: budget - day as f64 * per_day,
        })
        .collect()
}

/// Remaining budget after each transaction, starting from (0, budget)
pub fn actual_series(plan: &MealPlan, budget: f64, kind: SeriesKind) -> Vec<SeriesPoint> {
    let mut points = Vec::with_capacity(plan.transactions.len() + 1);
    points.push(SeriesPoint { x: 0, y: budget });

    let mut remaining = budget;
    for (i, tx) in plan.transactions.iter().enumerate() {
        remaining -= kind.step(&tx.approved_amount);
        points.push(SeriesPoint {
            x: i as u32 + 1,
            y: remaining,
        });
    }
    points
}

/// Both chart lines. Without a plan the actual line is empty.
pub fn build_usage_series(
    plan: Option<&MealPlan>,
    budget: f64,
    kind: SeriesKind,
    day_index: u32,
    total_days: u32,
) -> UsageSeries {
    UsageSeries {
        kind,
        ideal: ideal_series(budget, total_days),
        actual: plan
            .map(|p| actual_series(p, budget, kind))
            .unwrap_or_default(),
        current_day: day_index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Transaction;

    #[test]
    fn test_ideal_ramp_endpoints() {
        let ideal = ideal_series(286.0, 99);

        assert_eq!(ideal.len(), 100);
        assert_eq!(ideal[0], SeriesPoint { x: 0, y: 286.0 });
        assert_eq!(ideal[99].x, 99);
        assert!(ideal[99].y.abs() < 1e-9);
        assert!(ideal.windows(2).all(|w| w[1].y < w[0].y));
    }

    #[test]
    fn test_empty_calendar_has_no_ideal_line() {
        assert!(ideal_series(100.0, 0).is_empty());
    }

    #[test]
    fn test_block_steps_by_one_per_transaction() {
        let plan = MealPlan::new("d", "Green Meal Plan", "").with_transactions(vec![
            Transaction::new("a", "1", "1", "1"),
            Transaction::new("b", "2", "1", "1"),
        ]);
        let series = build_usage_series(Some(&plan), 286.0, SeriesKind::Blocks, 5, 99);

        let ys: Vec<f64> = series.actual.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![286.0, 285.0, 284.0]);
        assert_eq!(series.actual[2].x, 2);
        assert_eq!(series.current_day, 5);

        println!("✅ Block series test passed");
    }

    #[test]
    fn test_flex_steps_by_approved_amount() {
        let plan = MealPlan::new("d", "Green Flex Dollars", "").with_transactions(vec![
            Transaction::new("a", "1", "$5.00", "$4.50"),
            Transaction::new("b", "2", "", "garbled"),
            Transaction::new("c", "3", "$10.00", "$10.00"),
        ]);
        let series = build_usage_series(Some(&plan), 270.0, SeriesKind::Flex, 5, 99);

        let ys: Vec<f64> = series.actual.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![270.0, 265.5, 265.5, 255.5]);
    }

    #[test]
    fn test_missing_plan_yields_only_ideal() {
        let series = build_usage_series(None, 270.0, SeriesKind::Flex, 5, 99);
        assert!(series.actual.is_empty());
        assert_eq!(series.ideal.len(), 100);
    }

    #[test]
    fn test_series_kind_from_str() {
        assert_eq!("Blocks".parse::<SeriesKind>(), Ok(SeriesKind::Blocks));
        assert_eq!("flex".parse::<SeriesKind>(), Ok(SeriesKind::Flex));
        assert!("guest".parse::<SeriesKind>().is_err());
    }
}
