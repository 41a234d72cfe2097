use rust_decimal::Decimal;
use thiserror::Error;

use crate::programs::ProgramId;

/// User-facing validation failures.
///
/// Every command either applies in full or is rejected with one of these
/// before any state is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoyaltyError {
    #[error("program name must not be empty")]
    EmptyName,

    #[error("token symbol must not be empty")]
    EmptyTokenSymbol,

    /// Purchase amounts and redeemed points must be strictly positive.
    #[error("amount must be greater than zero (got {amount})")]
    InvalidAmount { amount: Decimal },

    /// The amount is positive but the arithmetic on it would overflow.
    #[error("amount {amount} is out of range")]
    AmountOutOfRange { amount: Decimal },

    #[error("insufficient balance in {program}: requested {requested} pts, available {available} pts")]
    InsufficientBalance {
        program: ProgramId,
        requested: Decimal,
        available: Decimal,
    },

    #[error("connect a wallet first")]
    WalletNotConnected,

    #[error("unknown program {0}")]
    UnknownProgram(ProgramId),

    #[error("no program selected")]
    NoProgramSelected,
}

/// Failures of the host side channel (file save, session file).
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
