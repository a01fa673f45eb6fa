use thiserror::Error;

use crate::schemas::MemberName;

/// Errors raised by the ledger engine and by snapshot mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Name is required")]
    MissingName,

    #[error("All fields are required")]
    MissingFields,

    #[error("Amount must be greater than 0")]
    NonPositiveAmount,

    #[error("Amount must not exceed {max}")]
    AmountTooLarge { max: rust_decimal::Decimal },

    /// The payer named by a new expense is not a member.
    #[error("Member does not exist: {0}")]
    UnknownMember(MemberName),

    #[error("Member already exists: {0}")]
    DuplicateMember(MemberName),

    #[error("Member not found: {0}")]
    MemberNotFound(MemberName),

    #[error("Expense not found: {0}")]
    ExpenseNotFound(String),

    /// Shares cannot be computed when there is nobody to split between.
    #[error("Cannot compute shares with no members")]
    NoMembers,

    /// A stored expense points at a payer that is not in the member list.
    #[error("Expense {expense_id} was paid by {paid_by}, who is not a member")]
    UnknownPayer {
        expense_id: String,
        paid_by: MemberName,
    },

    /// The expenses add up to more than a decimal can hold.
    #[error("Balance of {0} is out of range")]
    BalanceOverflow(MemberName),
}

impl LedgerError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingName => "MISSING_NAME",
            Self::MissingFields => "MISSING_FIELDS",
            Self::NonPositiveAmount => "NON_POSITIVE_AMOUNT",
            Self::AmountTooLarge { .. } => "AMOUNT_TOO_LARGE",
            Self::UnknownMember(_) => "UNKNOWN_MEMBER",
            Self::DuplicateMember(_) => "DUPLICATE_MEMBER",
            Self::MemberNotFound(_) => "MEMBER_NOT_FOUND",
            Self::ExpenseNotFound(_) => "EXPENSE_NOT_FOUND",
            Self::NoMembers => "INVALID_STATE",
            Self::UnknownPayer { .. } | Self::BalanceOverflow(_) => "DATA_INTEGRITY",
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::MissingName
            | Self::MissingFields
            | Self::NonPositiveAmount
            | Self::AmountTooLarge { .. }
            | Self::UnknownMember(_) => 400,

            Self::MemberNotFound(_) | Self::ExpenseNotFound(_) => 404,

            Self::DuplicateMember(_) => 409,

            Self::NoMembers | Self::UnknownPayer { .. } | Self::BalanceOverflow(_) => 422,
        }
    }
}

/// Top-level error for everything outside the pure engine.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The request body is not valid JSON for the endpoint.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed ledger data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("BSON encoding error: {0}")]
    Bson(#[from] bson::ser::Error),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Ledger(err) => err.error_code(),
            Self::InvalidBody(_) => "INVALID_BODY",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Io(_) | Self::Json(_) | Self::Bson(_) => "STORAGE_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Ledger(err) => err.http_status_code(),
            Self::InvalidBody(_) => 400,
            _ => 500,
        }
    }
}
