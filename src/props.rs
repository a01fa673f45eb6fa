//! Property-based tests for the ledger engine.
//!
//! - Balances add up to zero, up to the documented share-rounding residue
//! - Single-expense balances follow the equal-split formula
//! - Executing every transfer settles the group
//! - The member view is a filter of the full debt list

use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::balance::{compute_balance_from_ledger, Balances, SplitPolicy};
use crate::config::LedgerConfig;
use crate::debts::{resolve_debts, Debt, MatchOrder};
use crate::schemas::{round_to_2_decimals, Ledger, NewExpense};
use crate::summary::member_summary;

/// Strategy to generate positive amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a group size and a list of (payer, amount) pairs.
fn group() -> impl Strategy<Value = (usize, Vec<(usize, Decimal)>)> {
    (1usize..8).prop_flat_map(|members| {
        (
            Just(members),
            prop::collection::vec((0..members, positive_amount()), 0..20),
        )
    })
}

fn split_policy() -> impl Strategy<Value = SplitPolicy> {
    prop_oneof![
        Just(SplitPolicy::RoundedShare),
        Just(SplitPolicy::ExactAllocation)
    ]
}

fn match_order() -> impl Strategy<Value = MatchOrder> {
    prop_oneof![Just(MatchOrder::Encounter), Just(MatchOrder::LargestFirst)]
}

fn build_ledger(members: usize, expenses: &[(usize, Decimal)]) -> Ledger {
    let mut ledger = Ledger::default();
    for i in 0..members {
        ledger.add_member(&format!("M{i}")).unwrap();
    }
    for (payer, amount) in expenses {
        ledger
            .add_expense(NewExpense::new(&format!("M{payer}"), *amount, "shared"))
            .unwrap();
    }
    ledger
}

/// Balances after every debtor has paid what the debt list says.
fn settle(balances: &Balances, debts: &[Debt]) -> Vec<Decimal> {
    balances
        .iter()
        .map(|person| {
            let paid: Decimal = debts
                .iter()
                .filter(|debt| debt.from == person.id)
                .map(|debt| debt.amount)
                .sum();
            let received: Decimal = debts
                .iter()
                .filter(|debt| debt.to == person.id)
                .map(|debt| debt.amount)
                .sum();
            person.balance + paid - received
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Each rounded share is off by at most half a cent, so one expense can
    /// leave at most N half-cents behind.
    #[test]
    fn prop_rounded_share_residue_is_bounded((members, expenses) in group()) {
        let ledger = build_ledger(members, &expenses);
        let balances = compute_balance_from_ledger(&ledger, SplitPolicy::RoundedShare).unwrap();

        let bound = Decimal::new(5, 3) * Decimal::from(members * expenses.len().max(1));
        prop_assert!(
            balances.total().abs() <= bound,
            "total {} exceeds {}",
            balances.total(),
            bound
        );
        if members <= 2 && expenses.len() <= 1 {
            prop_assert!(balances.total().abs() <= Decimal::new(1, 2));
        }
    }

    #[test]
    fn prop_exact_allocation_sums_to_zero((members, expenses) in group()) {
        let ledger = build_ledger(members, &expenses);
        let balances =
            compute_balance_from_ledger(&ledger, SplitPolicy::ExactAllocation).unwrap();
        prop_assert_eq!(balances.total(), Decimal::ZERO);
    }

    #[test]
    fn prop_single_expense_split(
        members in 1usize..10,
        payer in 0usize..10,
        amount in positive_amount(),
    ) {
        let payer = payer % members;
        let ledger = build_ledger(members, &[(payer, amount)]);
        let balances = compute_balance_from_ledger(&ledger, SplitPolicy::RoundedShare).unwrap();
        let share = round_to_2_decimals(amount / Decimal::from(members));

        for (i, person) in balances.iter().enumerate() {
            if i == payer {
                prop_assert_eq!(person.balance, amount - share);
            } else {
                prop_assert_eq!(person.balance, -share);
            }
        }
    }

    /// Executing the transfers zeroes every balance, except for a residue
    /// no larger than what the balances were off by to begin with.
    #[test]
    fn prop_transfers_settle_the_group(
        (members, expenses) in group(),
        policy in split_policy(),
        order in match_order(),
    ) {
        let ledger = build_ledger(members, &expenses);
        let balances = compute_balance_from_ledger(&ledger, policy).unwrap();
        let settlement = resolve_debts(&balances, order);
        let residue = balances.total().abs();

        for left in settle(&balances, settlement.debts()) {
            prop_assert!(left.abs() <= residue, "{} left over, residue {}", left, residue);
        }
        for debt in settlement.debts() {
            prop_assert!(debt.amount > Decimal::ZERO);
            prop_assert_ne!(&debt.from, &debt.to);
        }

        let nonzero = balances.iter().filter(|p| !p.balance.is_zero()).count();
        prop_assert!(settlement.debts().len() <= nonzero.saturating_sub(1));
        let owed = balances.iter().any(|p| p.balance > Decimal::ZERO);
        let owing = balances.iter().any(|p| p.balance < Decimal::ZERO);
        prop_assert_eq!(settlement.is_settled(), !(owed && owing));
    }

    #[test]
    fn prop_member_view_filters_full_debts(
        (members, expenses) in group(),
        pick in 0usize..8,
        order in match_order(),
    ) {
        let ledger = build_ledger(members, &expenses);
        let settings = LedgerConfig { split_policy: SplitPolicy::RoundedShare, match_order: order };
        let name = format!("M{}", pick % members);

        let balances = compute_balance_from_ledger(&ledger, settings.split_policy).unwrap();
        let expected: Vec<Debt> = resolve_debts(&balances, order)
            .into_debts()
            .into_iter()
            .filter(|debt| debt.from == name || debt.to == name)
            .collect();

        let summary = member_summary(&ledger, &name, settings).unwrap();
        prop_assert_eq!(summary.balance, balances.get(&name).unwrap());
        prop_assert_eq!(summary.debts, expected);
    }
}
