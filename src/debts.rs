use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::balance::{Balances, PersonalBalance};
use crate::schemas::{round_to_2_decimals, MemberName};

pub const ALL_SETTLED_MESSAGE: &str = "All settled up! 🎉";

/// Order in which creditors and debtors are paired off.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOrder {
    /// Members are matched in the order they joined the group.
    #[default]
    Encounter,
    /// Both sides are sorted by amount, largest first, before matching. This
    /// never needs more than one transfer less than the number of members
    /// with a non-zero balance.
    LargestFirst,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Debt {
    pub from: MemberName,
    pub to: MemberName,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub amount: Decimal,
}

/// Outcome of settling a set of balances.
#[derive(Clone, Debug, PartialEq)]
pub enum Settlement {
    /// Every balance was already zero, nothing has to move.
    AllSettled,
    Transfers(Vec<Debt>),
}

impl Settlement {
    pub fn debts(&self) -> &[Debt] {
        match self {
            Settlement::AllSettled => &[],
            Settlement::Transfers(debts) => debts,
        }
    }

    pub fn into_debts(self) -> Vec<Debt> {
        match self {
            Settlement::AllSettled => Vec::new(),
            Settlement::Transfers(debts) => debts,
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, Settlement::AllSettled)
    }
}

impl Serialize for Settlement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Settlement::AllSettled => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("message", ALL_SETTLED_MESSAGE)?;
                map.end()
            }
            Settlement::Transfers(debts) => debts.serialize(serializer),
        }
    }
}

// Pairs the current debtor with the current creditor until one side runs
// out. Whatever is left on the other side is rounding residue.
fn sweep(debtors: &mut [PersonalBalance], creditors: &mut [PersonalBalance]) -> Vec<Debt> {
    let mut debts = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < debtors.len() && j < creditors.len() {
        let debtor = &mut debtors[i];
        let creditor = &mut creditors[j];
        let amount = debtor.balance.min(creditor.balance);

        debts.push(Debt {
            from: debtor.id.clone(),
            to: creditor.id.clone(),
            amount: round_to_2_decimals(amount),
        });

        debtor.balance -= amount;
        creditor.balance -= amount;
        if debtor.balance.is_zero() {
            i += 1;
        }
        if creditor.balance.is_zero() {
            j += 1;
        }
    }
    debts
}

/// Produces the transfers that bring every balance back to zero.
///
/// Balances that do not add up to exactly zero are tolerated: the sweep stops
/// as soon as either side is used up.
pub fn resolve_debts(balances: &Balances, order: MatchOrder) -> Settlement {
    // Divide people into debtors and creditors, both holding positive amounts
    let mut debtors = Vec::new();
    let mut creditors = Vec::new();

    for person in balances.iter() {
        if person.balance < Decimal::ZERO {
            debtors.push(PersonalBalance {
                id: person.id.clone(),
                balance: -person.balance,
            });
        } else if person.balance > Decimal::ZERO {
            creditors.push(person.clone());
        }
    }

    if order == MatchOrder::LargestFirst {
        // Stable sorts, so equal amounts keep member order
        debtors.sort_by(|a, b| b.balance.cmp(&a.balance));
        creditors.sort_by(|a, b| b.balance.cmp(&a.balance));
    }

    let debts = sweep(&mut debtors, &mut creditors);
    tracing::debug!(
        debtors = debtors.len(),
        creditors = creditors.len(),
        transfers = debts.len(),
        "resolved debts"
    );

    if debts.is_empty() {
        Settlement::AllSettled
    } else {
        Settlement::Transfers(debts)
    }
}
