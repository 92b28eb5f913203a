mod error;
mod payoff;
mod rewards;
mod types;

pub use error::EngineError;
pub use payoff::{HORIZON_CAP, compute_plan};
pub use rewards::{card_score, rank_cards, valuate};
pub use types::{
    ALL_CATEGORIES, AccountPeriod, AccountSummary, CardProfile, DebtAccount, PayoffPlan,
    PayoffStrategy, PeriodSnapshot, PointsAccount, ProgramRates, RankedCard, SpendCategory,
    SpendingProfile, ValuationLine, ValuationResult,
};
