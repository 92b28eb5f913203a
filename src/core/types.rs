use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PayoffStrategy {
    Avalanche,
    Snowball,
}

#[derive(Debug, Clone)]
pub struct DebtAccount {
    pub id: String,
    pub name: String,
    pub balance: f64,
    pub annual_rate_pct: f64,
    pub minimum_payment: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPeriod {
    pub account_id: String,
    pub interest_accrued: f64,
    pub payment_applied: f64,
    pub ending_balance: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSnapshot {
    pub period: u32,
    pub accounts: Vec<AccountPeriod>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub account_id: String,
    pub months_to_payoff: Option<u32>,
    pub interest_paid: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoffPlan {
    pub periods: Vec<PeriodSnapshot>,
    pub account_summaries: Vec<AccountSummary>,
    pub months_to_payoff: Option<u32>,
    pub total_interest_paid: f64,
    pub total_paid: f64,
    pub horizon_exceeded: bool,
}

#[derive(Debug, Clone)]
pub struct PointsAccount {
    pub id: String,
    pub name: String,
    pub program: String,
    pub points: u64,
}

/// Program -> cents-per-point conversion table. Supplied as configuration,
/// immutable for the duration of a calculation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ProgramRates {
    rates: BTreeMap<String, f64>,
}

impl ProgramRates {
    pub fn new(rates: BTreeMap<String, f64>) -> Self {
        Self { rates }
    }

    pub fn cents_per_point(&self, program: &str) -> Option<f64> {
        self.rates.get(program).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rates.iter().map(|(program, rate)| (program.as_str(), *rate))
    }
}

impl FromIterator<(String, f64)> for ProgramRates {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            rates: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationLine {
    pub account_id: String,
    pub program: String,
    pub points: u64,
    pub cents_per_point: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationResult {
    pub total_points: u64,
    pub estimated_value: f64,
    pub lines: Vec<ValuationLine>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpendCategory {
    Dining,
    Groceries,
    Travel,
    Gas,
    Drugstores,
    Online,
    Other,
}

pub const ALL_CATEGORIES: [SpendCategory; 7] = [
    SpendCategory::Dining,
    SpendCategory::Groceries,
    SpendCategory::Travel,
    SpendCategory::Gas,
    SpendCategory::Drugstores,
    SpendCategory::Online,
    SpendCategory::Other,
];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct SpendingProfile {
    monthly: BTreeMap<SpendCategory, f64>,
}

impl SpendingProfile {
    pub fn new(monthly: BTreeMap<SpendCategory, f64>) -> Self {
        Self { monthly }
    }

    pub fn monthly_spend(&self, category: SpendCategory) -> f64 {
        self.monthly.get(&category).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SpendCategory, f64)> + '_ {
        self.monthly.iter().map(|(category, spend)| (*category, *spend))
    }
}

impl FromIterator<(SpendCategory, f64)> for SpendingProfile {
    fn from_iter<I: IntoIterator<Item = (SpendCategory, f64)>>(iter: I) -> Self {
        Self {
            monthly: iter.into_iter().collect(),
        }
    }
}

/// Static catalog entry. `base_multiplier` applies to categories the card has
/// no dedicated multiplier for; `welcome_bonus` is reference data and not part
/// of the recurring-value score.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardProfile {
    pub id: String,
    pub name: String,
    pub annual_fee: f64,
    #[serde(default)]
    pub welcome_bonus: f64,
    #[serde(default = "default_base_multiplier")]
    pub base_multiplier: f64,
    #[serde(default)]
    pub multipliers: BTreeMap<SpendCategory, f64>,
}

fn default_base_multiplier() -> f64 {
    0.01
}

impl CardProfile {
    pub fn multiplier_for(&self, category: SpendCategory) -> f64 {
        self.multipliers
            .get(&category)
            .copied()
            .unwrap_or(self.base_multiplier)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCard {
    pub rank: u32,
    pub card: CardProfile,
    pub score: f64,
}
