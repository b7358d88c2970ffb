use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    GenerateKeypair,
    FundAccount,
    CreateLiquidityPool,
    WithdrawFromPool,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::GenerateKeypair,
        ActionKind::FundAccount,
        ActionKind::CreateLiquidityPool,
        ActionKind::WithdrawFromPool,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::GenerateKeypair => "generate_keypair",
            ActionKind::FundAccount => "fund_account",
            ActionKind::CreateLiquidityPool => "create_liquidity_pool",
            ActionKind::WithdrawFromPool => "withdraw_from_pool",
        }
    }

    pub fn index(self) -> usize {
        match self {
            ActionKind::GenerateKeypair => 0,
            ActionKind::FundAccount => 1,
            ActionKind::CreateLiquidityPool => 2,
            ActionKind::WithdrawFromPool => 3,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Info,
    Success,
    Guidance,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub action: ActionKind,
    pub kind: LogKind,
    pub message: String,
}

impl LogEntry {
    pub fn new(action: ActionKind, kind: LogKind, message: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            action,
            kind,
            message: message.into(),
        }
    }
}
