use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;

pub type MemberName = String;

/// Largest amount a single expense may carry: one trillion.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// Every amount the ledger stores or reports is kept at two decimal places,
/// with midpoints rounded away from zero.
pub fn round_to_2_decimals(n: Decimal) -> Decimal {
    n.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// The member/expense snapshot the engine computes over.
///
/// `transactions` is the history view of `expenses`; both are kept in step by
/// the mutation methods below.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Ledger {
    #[serde(default)]
    pub members: Vec<MemberName>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub transactions: Vec<Expense>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub paid_by: MemberName,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub amount: Decimal,
    pub description: String,
    pub date: DateTime<Utc>,
}

/// Request body for a new expense. Every field is optional on the wire so a
/// missing one is reported as a validation error instead of a parse error.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub paid_by: Option<MemberName>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
}

impl NewExpense {
    pub fn new(paid_by: &str, amount: Decimal, description: &str) -> Self {
        NewExpense {
            paid_by: Some(paid_by.to_string()),
            amount: Some(amount),
            description: Some(description.to_string()),
        }
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

impl Ledger {
    pub fn has_member(&self, name: &str) -> bool {
        self.members.iter().any(|member| member == name)
    }

    pub fn add_member(&mut self, name: &str) -> Result<&[MemberName], LedgerError> {
        if name.trim().is_empty() {
            return Err(LedgerError::MissingName);
        }
        if self.has_member(name) {
            return Err(LedgerError::DuplicateMember(name.to_string()));
        }
        self.members.push(name.to_string());
        Ok(&self.members)
    }

    /// Validates `new`, stamps it with a fresh id and the current time and
    /// records it.
    pub fn add_expense(&mut self, new: NewExpense) -> Result<Expense, LedgerError> {
        if is_blank(new.paid_by.as_deref()) || is_blank(new.description.as_deref()) {
            return Err(LedgerError::MissingFields);
        }
        let (Some(paid_by), Some(amount), Some(description)) =
            (new.paid_by, new.amount, new.description)
        else {
            return Err(LedgerError::MissingFields);
        };
        let amount = round_to_2_decimals(amount);
        if amount <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAmount);
        }
        if amount > MAX_AMOUNT {
            return Err(LedgerError::AmountTooLarge { max: MAX_AMOUNT });
        }
        if !self.has_member(&paid_by) {
            return Err(LedgerError::UnknownMember(paid_by));
        }

        let expense = Expense {
            id: Uuid::now_v7().to_string(),
            paid_by,
            amount,
            description,
            date: Utc::now(),
        };
        self.expenses.push(expense.clone());
        self.transactions.push(expense.clone());
        Ok(expense)
    }

    pub fn delete_expense(&mut self, id: &str) -> Result<Expense, LedgerError> {
        let position = self
            .expenses
            .iter()
            .position(|expense| expense.id == id)
            .ok_or_else(|| LedgerError::ExpenseNotFound(id.to_string()))?;
        let removed = self.expenses.remove(position);
        self.transactions.retain(|expense| expense.id != id);
        Ok(removed)
    }
}
