use std::collections::HashSet;

use super::error::EngineError;
use super::types::{
    AccountPeriod, AccountSummary, DebtAccount, PayoffPlan, PayoffStrategy, PeriodSnapshot,
};

/// Maximum number of simulated periods before a plan is declared
/// non-convergent under the given budget.
pub const HORIZON_CAP: u32 = 600;

pub fn compute_plan(
    accounts: &[DebtAccount],
    monthly_budget: f64,
    strategy: PayoffStrategy,
) -> Result<PayoffPlan, EngineError> {
    validate_accounts(accounts)?;

    if !monthly_budget.is_finite() || monthly_budget <= 0.0 {
        return Err(EngineError::invalid_input(
            "monthlyBudget",
            "must be a finite amount > 0",
        ));
    }

    // Minimums capped at the starting balance; a budget that cannot cover
    // them is a precondition failure, not a simulation outcome.
    let minimum_due: f64 = accounts
        .iter()
        .map(|a| a.minimum_payment.min(a.balance))
        .sum();
    if monthly_budget < minimum_due {
        return Err(EngineError::InsufficientPayment {
            budget: monthly_budget,
            minimum_due,
            shortfall: minimum_due - monthly_budget,
        });
    }

    let mut balances: Vec<f64> = accounts.iter().map(|a| a.balance).collect();
    let mut interest_paid = vec![0.0_f64; accounts.len()];
    let mut payoff_period: Vec<Option<u32>> = balances
        .iter()
        .map(|b| if *b > 0.0 { None } else { Some(0) })
        .collect();

    let mut periods = Vec::new();
    let mut total_interest_paid = 0.0;
    let mut total_paid = 0.0;
    let mut months_to_payoff = if balances.iter().all(|b| *b <= 0.0) {
        Some(0)
    } else {
        None
    };

    for period in 1..=HORIZON_CAP {
        if months_to_payoff.is_some() {
            break;
        }

        let mut interest = vec![0.0_f64; accounts.len()];
        let mut payments = vec![0.0_f64; accounts.len()];
        let mut remaining = monthly_budget;

        for (idx, account) in accounts.iter().enumerate() {
            if balances[idx] <= 0.0 {
                continue;
            }
            let accrued = balances[idx] * (account.annual_rate_pct / 100.0) / 12.0;
            balances[idx] += accrued;
            interest[idx] = accrued;
            interest_paid[idx] += accrued;

            let due = account.minimum_payment.min(balances[idx]).min(remaining);
            balances[idx] -= due;
            payments[idx] = due;
            remaining -= due;
        }

        for idx in allocation_order(accounts, &balances, strategy) {
            if remaining <= 0.0 {
                break;
            }
            let extra = remaining.min(balances[idx]);
            balances[idx] -= extra;
            payments[idx] += extra;
            remaining -= extra;
        }

        for idx in 0..accounts.len() {
            if payoff_period[idx].is_none() && balances[idx] <= 0.0 {
                payoff_period[idx] = Some(period);
            }
        }

        total_interest_paid += interest.iter().sum::<f64>();
        total_paid += payments.iter().sum::<f64>();

        periods.push(PeriodSnapshot {
            period,
            accounts: accounts
                .iter()
                .enumerate()
                .map(|(idx, account)| AccountPeriod {
                    account_id: account.id.clone(),
                    interest_accrued: interest[idx],
                    payment_applied: payments[idx],
                    ending_balance: balances[idx],
                })
                .collect(),
        });

        if balances.iter().all(|b| *b <= 0.0) {
            months_to_payoff = Some(period);
        }
    }

    let horizon_exceeded = months_to_payoff.is_none();
    let account_summaries = accounts
        .iter()
        .enumerate()
        .map(|(idx, account)| AccountSummary {
            account_id: account.id.clone(),
            months_to_payoff: payoff_period[idx],
            interest_paid: interest_paid[idx],
        })
        .collect();

    Ok(PayoffPlan {
        periods,
        account_summaries,
        months_to_payoff,
        total_interest_paid,
        total_paid,
        horizon_exceeded,
    })
}

/// Surplus allocation order among accounts that still carry a balance.
/// Avalanche: highest rate first, ties by larger balance, then input order.
/// Snowball: smallest balance first, ties by input order.
fn allocation_order(
    accounts: &[DebtAccount],
    balances: &[f64],
    strategy: PayoffStrategy,
) -> Vec<usize> {
    let mut order: Vec<usize> = (0..accounts.len())
        .filter(|idx| balances[*idx] > 0.0)
        .collect();

    match strategy {
        PayoffStrategy::Avalanche => order.sort_by(|a, b| {
            accounts[*b]
                .annual_rate_pct
                .total_cmp(&accounts[*a].annual_rate_pct)
                .then(balances[*b].total_cmp(&balances[*a]))
                .then(a.cmp(b))
        }),
        PayoffStrategy::Snowball => {
            order.sort_by(|a, b| balances[*a].total_cmp(&balances[*b]).then(a.cmp(b)))
        }
    }

    order
}

fn validate_accounts(accounts: &[DebtAccount]) -> Result<(), EngineError> {
    if accounts.is_empty() {
        return Err(EngineError::invalid_input(
            "accounts",
            "at least one debt account is required",
        ));
    }

    let mut seen = HashSet::new();
    for account in accounts {
        if account.id.is_empty() {
            return Err(EngineError::invalid_input("id", "must not be empty"));
        }
        if !seen.insert(account.id.as_str()) {
            return Err(EngineError::invalid_input(
                "id",
                format!("duplicate account id `{}`", account.id),
            ));
        }
        if !account.balance.is_finite() || account.balance < 0.0 {
            return Err(EngineError::invalid_input(
                "balance",
                format!("account `{}` must have a finite balance >= 0", account.id),
            ));
        }
        if !account.annual_rate_pct.is_finite() || account.annual_rate_pct < 0.0 {
            return Err(EngineError::invalid_input(
                "annualRatePct",
                format!("account `{}` must have a finite rate >= 0", account.id),
            ));
        }
        if !account.minimum_payment.is_finite() || account.minimum_payment < 0.0 {
            return Err(EngineError::invalid_input(
                "minimumPayment",
                format!(
                    "account `{}` must have a finite minimum payment >= 0",
                    account.id
                ),
            ));
        }
    }

    Ok(())
}
