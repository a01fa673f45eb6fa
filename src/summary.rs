use rust_decimal::Decimal;
use serde::Serialize;

use crate::balance::compute_balance_from_ledger;
use crate::config::LedgerConfig;
use crate::debts::{resolve_debts, Debt};
use crate::error::LedgerError;
use crate::schemas::{Ledger, MemberName};

/// One member's balance together with every transfer they take part in.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MemberSummary {
    pub name: MemberName,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub balance: Decimal,
    pub debts: Vec<Debt>,
}

pub fn member_summary(
    ledger: &Ledger,
    name: &str,
    settings: LedgerConfig,
) -> Result<MemberSummary, LedgerError> {
    if !ledger.has_member(name) {
        return Err(LedgerError::MemberNotFound(name.to_string()));
    }

    let balances = compute_balance_from_ledger(ledger, settings.split_policy)?;
    let balance = balances
        .get(name)
        .ok_or_else(|| LedgerError::MemberNotFound(name.to_string()))?;
    let debts = resolve_debts(&balances, settings.match_order)
        .into_debts()
        .into_iter()
        .filter(|debt| debt.from == name || debt.to == name)
        .collect();

    Ok(MemberSummary {
        name: name.to_string(),
        balance,
        debts,
    })
}
