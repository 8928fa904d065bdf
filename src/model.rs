// 🍽️ Ledger Model - meal plans, their transactions, and the persisted ledger
//
// Wire format mirrors the statement export: camelCase keys, amounts kept as
// the strings the statement printed. Plan tier/kind is parsed once from the
// plan name into a PlanTag and never serialized.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// TRANSACTION
// ============================================================================

/// One charge event against a meal plan. Immutable once scraped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default)]
    pub location: String,

    /// Statement-native timestamp, not guaranteed to be parseable
    #[serde(default)]
    pub date_time: String,

    #[serde(default)]
    pub requested_amount: String,

    #[serde(default)]
    pub approved_amount: String,
}

impl Transaction {
    pub fn new(location: &str, date_time: &str, requested_amount: &str, approved_amount: &str) -> Self {
        Transaction {
            location: location.to_string(),
            date_time: date_time.to_string(),
            requested_amount: requested_amount.to_string(),
            approved_amount: approved_amount.to_string(),
        }
    }
}

// ============================================================================
// MEAL OPTION (tier)
// ============================================================================

/// Blocks handed out during orientation, before the tracked calendar starts
pub const ORIENTATION_BLOCKS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MealOption {
    Green,
    Blue,
    Red,
}

impl MealOption {
    /// Detection order when a plan name mentions several tiers
    pub const ALL: [MealOption; 3] = [MealOption::Green, MealOption::Blue, MealOption::Red];

    pub fn name(&self) -> &'static str {
        match self {
            MealOption::Green => "Green",
            MealOption::Blue => "Blue",
            MealOption::Red => "Red",
        }
    }

    /// Semester block allowance, orientation blocks already taken out
    pub fn total_blocks(&self) -> u32 {
        let issued = match self {
            MealOption::Green => 292,
            MealOption::Blue => 252,
            MealOption::Red => 205,
        };
        issued - ORIENTATION_BLOCKS
    }

    pub fn total_flex_dollars(&self) -> f64 {
        match self {
            MealOption::Green => 270.0,
            MealOption::Blue => 520.0,
            MealOption::Red => 850.0,
        }
    }

    /// First tier whose name appears in `text`
    pub fn detect(text: &str) -> Option<MealOption> {
        MealOption::ALL.into_iter().find(|opt| text.contains(opt.name()))
    }
}

impl fmt::Display for MealOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// PLAN TAG
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanKind {
    /// Meal swipes, one per transaction
    Block,
    /// Dollar balance
    Flex,
    /// Guest swipes, never counted toward pacing
    Guest,
}

/// Tier and sub-account kind, parsed from the plan name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlanTag {
    pub tier: Option<MealOption>,
    pub kind: PlanKind,
}

impl PlanTag {
    pub fn parse(plan_name: &str) -> Self {
        let kind = if plan_name.contains("Flex") {
            PlanKind::Flex
        } else if plan_name.contains("Guest") {
            PlanKind::Guest
        } else {
            PlanKind::Block
        };

        PlanTag {
            tier: MealOption::detect(plan_name),
            kind,
        }
    }

    pub fn matches(&self, tier: MealOption, kind: PlanKind) -> bool {
        self.tier == Some(tier) && self.kind == kind
    }
}

// ============================================================================
// MEAL PLAN
// ============================================================================

/// One named sub-account of the statement, identified by (start date, name).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MealPlanRecord", into = "MealPlanRecord")]
pub struct MealPlan {
    start_date: String,
    plan_name: String,
    tag: PlanTag,

    pub current_balance: String,

    /// Append-only, in discovery order across merges
    pub transactions: Vec<Transaction>,
}

impl MealPlan {
    pub fn new(start_date: &str, plan_name: &str, current_balance: &str) -> Self {
        MealPlan {
            start_date: start_date.to_string(),
            plan_name: plan_name.to_string(),
            tag: PlanTag::parse(plan_name),
            current_balance: current_balance.to_string(),
            transactions: Vec::new(),
        }
    }

    /// Builder pattern: attach transactions
    pub fn with_transactions(mut self, transactions: Vec<Transaction>) -> Self {
        self.transactions = transactions;
        self
    }

    pub fn start_date(&self) -> &str {
        &self.start_date
    }

    pub fn plan_name(&self) -> &str {
        &self.plan_name
    }

    pub fn tag(&self) -> PlanTag {
        self.tag
    }

    /// True when both plans denote the same sub-account
    pub fn same_identity(&self, other: &MealPlan) -> bool {
        self.start_date == other.start_date && self.plan_name == other.plan_name
    }
}

/// Serialized shape of a MealPlan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MealPlanRecord {
    #[serde(default)]
    start_date: String,
    #[serde(default)]
    plan_name: String,
    #[serde(default)]
    current_balance: String,
    #[serde(default)]
    transactions: Vec<Transaction>,
}

impl From<MealPlanRecord> for MealPlan {
    fn from(record: MealPlanRecord) -> Self {
        MealPlan::new(&record.start_date, &record.plan_name, &record.current_balance)
            .with_transactions(record.transactions)
    }
}

impl From<MealPlan> for MealPlanRecord {
    fn from(plan: MealPlan) -> Self {
        MealPlanRecord {
            start_date: plan.start_date,
            plan_name: plan.plan_name,
            current_balance: plan.current_balance,
            transactions: plan.transactions,
        }
    }
}

// ============================================================================
// LEDGER
// ============================================================================

/// Process-wide persisted state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    #[serde(default)]
    pub dark_mode: bool,

    /// Unique by (start date, plan name), in insertion order
    #[serde(default)]
    pub meal_plans: Vec<MealPlan>,

    #[serde(default)]
    pub current_meal_option: Option<MealOption>,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger::default()
    }

    pub fn find_plan(&self, start_date: &str, plan_name: &str) -> Option<&MealPlan> {
        self.meal_plans
            .iter()
            .find(|p| p.start_date == start_date && p.plan_name == plan_name)
    }

    pub fn transaction_count(&self) -> usize {
        self.meal_plans.iter().map(|p| p.transactions.len()).sum()
    }
}

/// Import/export document: `{ "mealPlans": [...] }`
///
/// Unknown keys are ignored, so a full persisted ledger also imports cleanly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerExport {
    #[serde(default)]
    pub meal_plans: Vec<MealPlan>,
}

impl From<&Ledger> for LedgerExport {
    fn from(ledger: &Ledger) -> Self {
        LedgerExport {
            meal_plans: ledger.meal_plans.clone(),
        }
    }
}
