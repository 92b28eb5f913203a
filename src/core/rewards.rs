use super::error::EngineError;
use super::types::{
    CardProfile, PointsAccount, ProgramRates, RankedCard, SpendingProfile, ValuationLine,
    ValuationResult,
};

pub fn valuate(
    accounts: &[PointsAccount],
    rates: &ProgramRates,
) -> Result<ValuationResult, EngineError> {
    for (program, cents_per_point) in rates.iter() {
        if !cents_per_point.is_finite() || cents_per_point < 0.0 {
            return Err(EngineError::invalid_input(
                "rateTable",
                format!("program `{program}` must have a finite rate >= 0"),
            ));
        }
    }

    let mut lines = Vec::with_capacity(accounts.len());
    let mut total_points = 0_u64;
    let mut estimated_value = 0.0;

    for account in accounts {
        let cents_per_point =
            rates
                .cents_per_point(&account.program)
                .ok_or_else(|| EngineError::UnknownProgram {
                    program: account.program.clone(),
                })?;

        let value = account.points as f64 * cents_per_point / 100.0;
        total_points += account.points;
        estimated_value += value;
        lines.push(ValuationLine {
            account_id: account.id.clone(),
            program: account.program.clone(),
            points: account.points,
            cents_per_point,
            value,
        });
    }

    Ok(ValuationResult {
        total_points,
        estimated_value,
        lines,
    })
}

/// Annual value of a card against the profile: twelve months of category
/// spend at the card's multipliers, less the annual fee.
pub fn card_score(profile: &SpendingProfile, card: &CardProfile) -> f64 {
    let rewards: f64 = profile
        .iter()
        .map(|(category, monthly_spend)| monthly_spend * 12.0 * card.multiplier_for(category))
        .sum();
    rewards - card.annual_fee
}

pub fn rank_cards(
    profile: &SpendingProfile,
    catalog: &[CardProfile],
) -> Result<impl Iterator<Item = RankedCard> + Clone + std::fmt::Debug + use<>, EngineError> {
    for (category, monthly_spend) in profile.iter() {
        if !monthly_spend.is_finite() || monthly_spend < 0.0 {
            return Err(EngineError::invalid_input(
                "profile",
                format!("spend for {category:?} must be finite and >= 0"),
            ));
        }
    }

    let mut scored: Vec<(usize, f64)> = catalog
        .iter()
        .enumerate()
        .map(|(idx, card)| (idx, card_score(profile, card)))
        .collect();

    // Descending score; ties by lower annual fee, then catalog order (the
    // stable sort preserves it).
    scored.sort_by(|(a_idx, a_score), (b_idx, b_score)| {
        b_score
            .total_cmp(a_score)
            .then(catalog[*a_idx].annual_fee.total_cmp(&catalog[*b_idx].annual_fee))
    });

    let ranked: Vec<RankedCard> = scored
        .into_iter()
        .enumerate()
        .map(|(position, (idx, score))| RankedCard {
            rank: position as u32 + 1,
            card: catalog[idx].clone(),
            score,
        })
        .collect();

    Ok(ranked.into_iter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SpendCategory;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn points_account(id: &str, program: &str, points: u64) -> PointsAccount {
        PointsAccount {
            id: id.to_string(),
            name: id.to_uppercase(),
            program: program.to_string(),
            points,
        }
    }

    fn sample_rates() -> ProgramRates {
        [
            ("ChaseUR".to_string(), 1.25),
            ("AmexMR".to_string(), 1.1),
            ("Skymiles".to_string(), 0.9),
        ]
        .into_iter()
        .collect()
    }

    fn card(id: &str, fee: f64, multipliers: &[(SpendCategory, f64)]) -> CardProfile {
        CardProfile {
            id: id.to_string(),
            name: id.to_uppercase(),
            annual_fee: fee,
            welcome_bonus: 0.0,
            base_multiplier: 0.01,
            multipliers: multipliers.iter().copied().collect(),
        }
    }

    #[test]
    fn oracle_chase_ur_balance_values_at_exactly_125_dollars() {
        let accounts = vec![points_account("ur", "ChaseUR", 10_000)];
        let result = valuate(&accounts, &sample_rates()).expect("known program");

        assert_eq!(result.total_points, 10_000);
        assert_approx(result.estimated_value, 125.0);
        assert_eq!(result.lines.len(), 1);
        assert_approx(result.lines[0].cents_per_point, 1.25);
    }

    #[test]
    fn valuate_sums_across_programs() {
        let accounts = vec![
            points_account("ur", "ChaseUR", 10_000),
            points_account("mr", "AmexMR", 20_000),
        ];
        let result = valuate(&accounts, &sample_rates()).expect("known programs");

        assert_eq!(result.total_points, 30_000);
        assert_approx(result.estimated_value, 125.0 + 220.0);
    }

    #[test]
    fn valuate_rejects_unknown_program_instead_of_guessing_a_rate() {
        let accounts = vec![points_account("x", "MysteryMiles", 5_000)];
        let err = valuate(&accounts, &sample_rates()).expect_err("unknown program");
        assert!(matches!(err, EngineError::UnknownProgram { ref program } if program == "MysteryMiles"));
    }

    #[test]
    fn valuate_of_no_accounts_is_zero() {
        let result = valuate(&[], &sample_rates()).expect("empty input is fine");
        assert_eq!(result.total_points, 0);
        assert_approx(result.estimated_value, 0.0);
        assert!(result.lines.is_empty());
    }

    #[test]
    fn rank_on_empty_catalog_is_an_empty_sequence() {
        let profile = SpendingProfile::default();
        let ranked: Vec<RankedCard> = rank_cards(&profile, &[]).expect("valid profile").collect();
        assert!(ranked.is_empty());
    }

    #[test]
    fn rank_on_single_card_returns_it_with_its_score() {
        let profile: SpendingProfile = [(SpendCategory::Dining, 400.0)].into_iter().collect();
        let catalog = vec![card("gold", 95.0, &[(SpendCategory::Dining, 0.04)])];

        let ranked: Vec<RankedCard> = rank_cards(&profile, &catalog)
            .expect("valid profile")
            .collect();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[0].card.id, "gold");
        // 400 * 12 * 0.04 - 95 = 97
        assert_approx(ranked[0].score, 97.0);
    }

    #[test]
    fn rank_orders_by_score_then_fee_then_catalog_position() {
        // Power-of-two multipliers on $256/month keep scores exact, so the
        // three tied cards land on the same score bit-for-bit:
        // pricey-tie: 3072 * 1/16 - 96 = 96, cheap-tie: 3072 * 3/64 - 48 = 96.
        let profile: SpendingProfile = [(SpendCategory::Travel, 256.0)].into_iter().collect();
        let catalog = vec![
            card("pricey-tie", 96.0, &[(SpendCategory::Travel, 0.0625)]),
            card("winner", 0.0, &[(SpendCategory::Travel, 0.125)]),
            card("cheap-tie", 48.0, &[(SpendCategory::Travel, 0.046875)]),
            card("duplicate-tie", 96.0, &[(SpendCategory::Travel, 0.0625)]),
        ];

        let ids: Vec<String> = rank_cards(&profile, &catalog)
            .expect("valid profile")
            .map(|r| r.card.id)
            .collect();
        assert_eq!(ids[0], "winner");
        assert_eq!(ids[1], "cheap-tie");
        assert_eq!(ids[2], "pricey-tie");
        assert_eq!(ids[3], "duplicate-tie");
    }

    #[test]
    fn rank_sequence_supports_top_n_capping() {
        let profile: SpendingProfile = [(SpendCategory::Groceries, 500.0)].into_iter().collect();
        let catalog: Vec<CardProfile> = (0..10)
            .map(|i| {
                card(
                    &format!("card-{i}"),
                    0.0,
                    &[(SpendCategory::Groceries, 0.01 + i as f64 * 0.002)],
                )
            })
            .collect();

        let top: Vec<RankedCard> = rank_cards(&profile, &catalog)
            .expect("valid profile")
            .take(3)
            .collect();
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].card.id, "card-9");
        assert_eq!(top[2].card.id, "card-7");
    }

    #[test]
    fn uncovered_categories_fall_back_to_the_base_multiplier() {
        let profile: SpendingProfile = [
            (SpendCategory::Dining, 100.0),
            (SpendCategory::Other, 1_000.0),
        ]
        .into_iter()
        .collect();
        let flat = card("flat", 0.0, &[(SpendCategory::Dining, 0.03)]);

        // 100*12*0.03 + 1000*12*0.01 = 36 + 120
        assert_approx(card_score(&profile, &flat), 156.0);
    }

    #[test]
    fn rank_rejects_negative_spend() {
        let profile: SpendingProfile = [(SpendCategory::Gas, -1.0)].into_iter().collect();
        let err = rank_cards(&profile, &[]).expect_err("negative spend");
        assert!(matches!(err, EngineError::InvalidInput { ref field, .. } if field == "profile"));
    }

    #[test]
    fn valuate_rejects_malformed_rate_table() {
        let rates: ProgramRates = [("Broken".to_string(), f64::NAN)].into_iter().collect();
        let err = valuate(&[], &rates).expect_err("NaN rate");
        assert!(matches!(err, EngineError::InvalidInput { ref field, .. } if field == "rateTable"));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_valuation_total_is_permutation_independent(
            points in proptest::collection::vec(0u64..2_000_000, 1..8),
            rotation in 0usize..8,
        ) {
            let programs = ["ChaseUR", "AmexMR", "Skymiles"];
            let accounts: Vec<PointsAccount> = points
                .iter()
                .enumerate()
                .map(|(idx, p)| points_account(&format!("acct-{idx}"), programs[idx % 3], *p))
                .collect();

            let mut rotated = accounts.clone();
            rotated.rotate_left(rotation % accounts.len());

            let original = valuate(&accounts, &sample_rates()).expect("known programs");
            let permuted = valuate(&rotated, &sample_rates()).expect("known programs");

            prop_assert!(original.total_points == permuted.total_points);
            prop_assert!((original.estimated_value - permuted.estimated_value).abs() <= 1e-6);
            prop_assert!(original.estimated_value >= 0.0);
        }

        #[test]
        fn prop_ranking_scores_are_monotonically_non_increasing(
            fees in proptest::collection::vec(0u32..600, 0..12),
            spend in 0u32..5_000,
        ) {
            let profile: SpendingProfile =
                [(SpendCategory::Online, spend as f64)].into_iter().collect();
            let catalog: Vec<CardProfile> = fees
                .iter()
                .enumerate()
                .map(|(idx, fee)| {
                    card(
                        &format!("card-{idx}"),
                        *fee as f64,
                        &[(SpendCategory::Online, 0.005 + (idx % 7) as f64 * 0.004)],
                    )
                })
                .collect();

            let ranked: Vec<RankedCard> =
                rank_cards(&profile, &catalog).expect("valid profile").collect();
            prop_assert!(ranked.len() == catalog.len());

            for pair in ranked.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score - 1e-9);
            }
            for (idx, entry) in ranked.iter().enumerate() {
                prop_assert!(entry.rank as usize == idx + 1);
            }
        }
    }
}
