use shared::error::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid account id '{0}'")]
    InvalidAccountId(String),
    #[error("invalid secret seed")]
    InvalidSecretSeed,
    #[error("invalid asset code '{0}': expected 1-12 ASCII letters or digits")]
    InvalidAssetCode(String),
    #[error("invalid amount '{input}': {reason}")]
    InvalidAmount { input: String, reason: &'static str },
    #[error("invalid price '{0}': expected a positive fraction n/d")]
    InvalidPrice(String),
    #[error("invalid liquidity pool id '{0}'")]
    InvalidPoolId(String),
    #[error("invalid liquidity pool asset: {0}")]
    InvalidPoolAsset(&'static str),
    #[error("transaction has no operations")]
    EmptyTransaction,
    #[error("transaction timeout must be set before building")]
    MissingTimeout,
    #[error("transaction timeout of {0}s puts the deadline out of range")]
    TimeoutOutOfRange(u64),
    #[error("account sequence {0} cannot be incremented")]
    SequenceExhausted(i64),
    #[error("xdr encoding failed: {0}")]
    Xdr(#[from] stellar_xdr::curr::Error),
    #[error("account {0} not found on the ledger")]
    AccountNotFound(String),
    #[error("transaction rejected: {0}")]
    Rejected(String),
    #[error("unexpected response from {endpoint}: {detail}")]
    UnexpectedResponse { endpoint: String, detail: String },
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl LedgerError {
    pub fn code(&self) -> ErrorCode {
        match self {
            LedgerError::InvalidAccountId(_)
            | LedgerError::InvalidSecretSeed
            | LedgerError::InvalidAssetCode(_)
            | LedgerError::InvalidAmount { .. }
            | LedgerError::InvalidPrice(_)
            | LedgerError::InvalidPoolId(_)
            | LedgerError::InvalidPoolAsset(_)
            | LedgerError::EmptyTransaction
            | LedgerError::MissingTimeout
            | LedgerError::TimeoutOutOfRange(_) => ErrorCode::Validation,
            LedgerError::AccountNotFound(_) => ErrorCode::NotFound,
            LedgerError::Rejected(_) => ErrorCode::Rejected,
            LedgerError::SequenceExhausted(_)
            | LedgerError::UnexpectedResponse { .. }
            | LedgerError::Xdr(_) => ErrorCode::Internal,
            LedgerError::Http(_) => ErrorCode::Network,
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
