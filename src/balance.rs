use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::LedgerError;
use crate::schemas::{round_to_2_decimals, Expense, Ledger, MemberName};

/// How a single expense is divided between the members.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPolicy {
    /// Everyone is charged `round(amount / N, 2)`. The shares of one expense
    /// may miss its amount by a few cents.
    #[default]
    RoundedShare,
    /// Largest-remainder allocation: the shares of one expense always add up
    /// to its amount, leftover cents going to the earliest members.
    ExactAllocation,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PersonalBalance {
    pub id: MemberName,
    pub balance: Decimal,
}

/// Net balance per member, in member order. Positive means the group owes
/// the member money.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Balances(Vec<PersonalBalance>);

impl Balances {
    pub fn get(&self, name: &str) -> Option<Decimal> {
        self.0
            .iter()
            .find(|person| person.id == name)
            .map(|person| person.balance)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PersonalBalance> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of every balance. Zero unless rounded shares left a residue.
    pub fn total(&self) -> Decimal {
        self.0.iter().map(|person| person.balance).sum()
    }
}

impl FromIterator<(MemberName, Decimal)> for Balances {
    fn from_iter<I: IntoIterator<Item = (MemberName, Decimal)>>(iter: I) -> Self {
        Balances(
            iter.into_iter()
                .map(|(id, balance)| PersonalBalance { id, balance })
                .collect(),
        )
    }
}

struct AsFloat<'a>(&'a Decimal);

impl Serialize for AsFloat<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(self.0, serializer)
    }
}

impl Serialize for Balances {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for person in &self.0 {
            map.serialize_entry(&person.id, &AsFloat(&person.balance))?;
        }
        map.end()
    }
}

/// Splits `total` into `count` two-decimal shares that add up to exactly the
/// rounded total.
fn allocate_equal(total: Decimal, count: usize) -> Vec<Decimal> {
    let total = round_to_2_decimals(total);
    let count_dec = Decimal::from(count as u64);
    let cent = Decimal::new(1, 2);
    let base = (total / count_dec).round_dp_with_strategy(2, RoundingStrategy::ToZero);
    let mut remainder = total - base * count_dec;

    (0..count)
        .map(|_| {
            if remainder >= cent {
                remainder -= cent;
                base + cent
            } else {
                base
            }
        })
        .collect()
}

/// Computes every member's net balance. Each expense is split across the
/// members as they are now, so adding a member also changes how past
/// expenses are shared.
pub fn compute_balances(
    members: &[MemberName],
    expenses: &[Expense],
    policy: SplitPolicy,
) -> Result<Balances, LedgerError> {
    if members.is_empty() {
        if expenses.is_empty() {
            return Ok(Balances::default());
        }
        return Err(LedgerError::NoMembers);
    }

    let positions: HashMap<&str, usize> = members
        .iter()
        .enumerate()
        .map(|(position, member)| (member.as_str(), position))
        .collect();
    let mut balances = vec![Decimal::ZERO; members.len()];
    let num_members = Decimal::from(members.len() as u64);
    // Snapshots read from storage never went through the amount cap.
    let overflow = |position: usize| LedgerError::BalanceOverflow(members[position].clone());

    for expense in expenses {
        let payer = *positions.get(expense.paid_by.as_str()).ok_or_else(|| {
            LedgerError::UnknownPayer {
                expense_id: expense.id.clone(),
                paid_by: expense.paid_by.clone(),
            }
        })?;
        balances[payer] = balances[payer]
            .checked_add(expense.amount)
            .ok_or_else(|| overflow(payer))?;

        let shares = match policy {
            SplitPolicy::RoundedShare => {
                vec![round_to_2_decimals(expense.amount / num_members); members.len()]
            }
            SplitPolicy::ExactAllocation => allocate_equal(expense.amount, members.len()),
        };
        for (position, (balance, share)) in balances.iter_mut().zip(shares).enumerate() {
            *balance = balance
                .checked_sub(share)
                .ok_or_else(|| overflow(position))?;
        }
    }

    Ok(members
        .iter()
        .cloned()
        .zip(balances.into_iter().map(round_to_2_decimals))
        .collect())
}

pub fn compute_balance_from_ledger(
    ledger: &Ledger,
    policy: SplitPolicy,
) -> Result<Balances, LedgerError> {
    compute_balances(&ledger.members, &ledger.expenses, policy)
}
