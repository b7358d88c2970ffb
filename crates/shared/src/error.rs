use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    NotFound,
    Network,
    Rejected,
    Internal,
}

/// Reason a user-triggered action did not reach the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{action}: {message}")]
pub struct PreconditionError {
    pub action: crate::domain::ActionKind,
    pub message: String,
}

impl PreconditionError {
    pub fn new(action: crate::domain::ActionKind, message: impl Into<String>) -> Self {
        Self {
            action,
            message: message.into(),
        }
    }
}
