//! Property-based tests for settlement and parsing

use crate::{Contributions, compute_settlement, format_contributions, parse_expenses};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::HashMap;

// ============================================================================
// Generators
// ============================================================================

/// Whole amounts, as the parser produces them
fn arb_amounts() -> impl Strategy<Value = Vec<u32>> {
    proptest::collection::vec(0u32..100_000, 2..12)
}

/// Many participants with tiny amounts, so most shares are under a cent
fn arb_large_group() -> impl Strategy<Value = Vec<u32>> {
    proptest::collection::vec(0u32..3, 100..400)
}

fn arb_name() -> impl Strategy<Value = String> {
    prop_oneof!["[A-Za-z]{1,8}", "[А-Яа-я]{1,8}"]
}

fn contributions_from(amounts: &[u32]) -> Contributions {
    amounts
        .iter()
        .enumerate()
        .map(|(i, amount)| (format!("P{}", i), f64::from(*amount)))
        .collect()
}

/// Float noise allowed on top of the per-transfer rounding tolerance
const SLACK: f64 = 1e-6;

/// Per participant: transfers paid or received stay within 0.02 per transfer
/// of the participant's net, and applying every transfer lands each
/// participant within 0.01 per transfer of the average.
fn assert_balanced(amounts: &[u32]) -> Result<(), TestCaseError> {
    let contributions = contributions_from(amounts);
    let settlement = compute_settlement(&contributions).unwrap();

    // name -> (sum of amounts moved, transfer count)
    let mut paid: HashMap<&str, (f64, usize)> = HashMap::new();
    let mut received: HashMap<&str, (f64, usize)> = HashMap::new();
    for t in &settlement.transfers {
        let entry = paid.entry(t.debtor.as_str()).or_default();
        entry.0 += t.amount;
        entry.1 += 1;
        let entry = received.entry(t.creditor.as_str()).or_default();
        entry.0 += t.amount;
        entry.1 += 1;
    }

    for c in &contributions {
        let net = c.amount - settlement.average;
        let name = c.name.as_str();
        if net > 0.0 {
            let (sum, count) = received.get(name).copied().unwrap_or_default();
            prop_assert!(
                (sum - net).abs() <= 0.02 * count as f64 + SLACK,
                "{} is owed {} but receives {} over {} transfers", name, net, sum, count
            );
        } else if net < 0.0 {
            let (sum, count) = paid.get(name).copied().unwrap_or_default();
            prop_assert!(
                (sum + net).abs() <= 0.02 * count as f64 + SLACK,
                "{} owes {} but pays {} over {} transfers", name, -net, sum, count
            );
        }
    }

    let tolerance = 0.01 * settlement.transfers.len() as f64 + SLACK;
    for c in &contributions {
        let name = c.name.as_str();
        let out = paid.get(name).map_or(0.0, |(sum, _)| *sum);
        let back = received.get(name).map_or(0.0, |(sum, _)| *sum);
        let adjusted = c.amount + out - back;
        prop_assert!(
            (adjusted - settlement.average).abs() <= tolerance,
            "{} ends at {} instead of {}", name, adjusted, settlement.average
        );
    }

    Ok(())
}

// ============================================================================
// Settlement
// ============================================================================

proptest! {
    #[test]
    fn transfers_balance_nets(amounts in arb_amounts()) {
        assert_balanced(&amounts)?;
    }

    #[test]
    fn transfers_are_non_negative_and_never_to_self(amounts in arb_amounts()) {
        let settlement = compute_settlement(&contributions_from(&amounts)).unwrap();

        for t in &settlement.transfers {
            prop_assert!(t.amount >= 0.0);
            prop_assert_ne!(&t.debtor, &t.creditor);
        }
    }

    #[test]
    fn equal_amounts_need_no_transfers(amount in 0u32..100_000, count in 2usize..12) {
        let settlement = compute_settlement(&contributions_from(&vec![amount; count])).unwrap();

        prop_assert!(settlement.is_even());
        prop_assert_eq!(settlement.average, f64::from(amount));
    }

    #[test]
    fn totals_ignore_input_order(
        (original, shuffled) in arb_amounts().prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
    ) {
        let a = compute_settlement(&contributions_from(&original)).unwrap();
        let b = compute_settlement(&contributions_from(&shuffled)).unwrap();

        prop_assert_eq!(a.total, b.total);
        prop_assert!((a.average - b.average).abs() < 1e-9);
        prop_assert_eq!(a.transfers.len(), b.transfers.len());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn large_groups_balance_despite_sub_cent_shares(amounts in arb_large_group()) {
        assert_balanced(&amounts)?;
    }

    #[test]
    fn uneven_large_groups_are_never_reported_even(amounts in arb_large_group()) {
        let settlement = compute_settlement(&contributions_from(&amounts)).unwrap();
        let all_equal = amounts.iter().all(|a| *a == amounts[0]);

        prop_assert_eq!(settlement.is_even(), all_equal);
    }
}

// ============================================================================
// Parsing
// ============================================================================

proptest! {
    #[test]
    fn canonical_text_reparses_identically(
        entries in proptest::collection::vec((arb_name(), 0u32..1_000_000), 0..10)
    ) {
        let contributions: Contributions = entries
            .into_iter()
            .map(|(name, amount)| (name, f64::from(amount)))
            .collect();

        let canonical = format_contributions(&contributions);
        prop_assert_eq!(parse_expenses(&canonical), contributions);
    }

    #[test]
    fn parsing_never_panics(text in "\\PC{0,200}") {
        let parsed = parse_expenses(&text);
        prop_assert!(parsed.len() <= text.lines().count());
    }
}
